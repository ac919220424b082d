/// Variable-speed app clock.
pub mod clock;
pub mod engine;
/// Event records and their state types.
pub mod event;
pub mod kpi;
pub mod replay;
pub mod simulation;
/// Time-bucketed event store.
pub mod store;
pub mod thermal;
pub mod tracker;
pub mod types;
