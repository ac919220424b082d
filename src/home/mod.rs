//! Static description of the simulated home: its devices and what they draw.

/// Electricity and water draw per state type.
pub mod rates;
pub mod registry;

pub use rates::{ElectricityRate, WaterRate, electricity_rate, water_rate};
pub use registry::{
    DEVICES, Device, OUTDOOR_TEMP, THERMOSTAT_TEMP, device, human_readable_key, message_for,
    value_label,
};
