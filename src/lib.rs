//! Smart home simulator: a variable-speed virtual clock replaying household
//! events into indoor-temperature and utility-usage snapshots.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
/// Device registry and usage rates.
pub mod home;
pub mod io;
pub mod publish;
pub mod scheduler;
/// Simulation clock, event store, aggregation, and replay.
pub mod sim;
