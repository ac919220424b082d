//! Event sources and result sinks around the simulation core.

/// CSV export for derived snapshots.
pub mod export;
pub mod generator;
pub mod loader;
