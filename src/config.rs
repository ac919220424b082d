//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::sim::clock::SpeedBounds;
use crate::sim::store::DEFAULT_BUCKET_SECS;
use crate::sim::thermal::{DEFAULT_ELECTRICITY_USD_PER_KWH, DEFAULT_WATER_USD_PER_GALLON};
use crate::sim::types::Rates;

const SECONDS_PER_DAY: u64 = 86_400;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Clock and store parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Publisher cadences.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Thermostat range and starting temperatures.
    #[serde(default)]
    pub thermostat: ThermostatConfig,
    /// Utility prices.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Synthetic event generator parameters.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Clock and store parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulation length in app seconds (must be > 0).
    pub horizon_secs: u64,
    /// Speed multiplier at startup (app seconds per real second).
    pub start_speed: f64,
    /// Lowest accepted speed multiplier.
    pub min_speed: f64,
    /// Highest accepted speed multiplier.
    pub max_speed: f64,
    /// Real milliseconds between clock driver ticks.
    pub tick_ms: u64,
    /// Width of one event store bucket in app seconds.
    pub bucket_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_secs: 60 * SECONDS_PER_DAY,
            start_speed: 60.0,
            min_speed: 1.0,
            max_speed: 3600.0,
            tick_ms: 100,
            bucket_secs: DEFAULT_BUCKET_SECS,
        }
    }
}

/// Publisher cadences.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Real seconds between time publications.
    pub time_publish_real_secs: f64,
    /// App seconds between event publications.
    pub event_publish_app_secs: u64,
    /// App seconds per analysis interval.
    pub analysis_app_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time_publish_real_secs: 1.0,
            event_publish_app_secs: 30,
            analysis_app_secs: 1800,
        }
    }
}

/// Thermostat range and starting temperatures.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThermostatConfig {
    /// Lowest accepted setpoint (°F).
    pub min_f: i64,
    /// Highest accepted setpoint (°F).
    pub max_f: i64,
    /// Setpoint used when no thermostat event exists at load.
    pub default_f: i64,
    /// Outdoor temperature used when no outdoor event exists at load.
    pub default_outdoor_f: i64,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            min_f: 55,
            max_f: 85,
            default_f: 70,
            default_outdoor_f: 50,
        }
    }
}

/// Utility prices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatesConfig {
    /// Electricity price ($/kWh).
    pub electricity_usd_per_kwh: f64,
    /// Water price ($/gallon).
    pub water_usd_per_gallon: f64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            electricity_usd_per_kwh: DEFAULT_ELECTRICITY_USD_PER_KWH,
            water_usd_per_gallon: DEFAULT_WATER_USD_PER_GALLON,
        }
    }
}

/// Synthetic event generator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Master random seed.
    pub seed: u64,
    /// Number of days of household activity to generate (must be > 0).
    pub days: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { seed: 42, days: 60 }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.horizon_secs"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario: 60 days at one app minute per real second.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the fast-forward preset: maximum speed with a finer tick.
    pub fn fast_forward() -> Self {
        Self {
            simulation: SimulationConfig {
                start_speed: 3600.0,
                tick_ms: 50,
                ..SimulationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the short-run preset: one week of generated activity.
    pub fn short_run() -> Self {
        Self {
            simulation: SimulationConfig {
                horizon_secs: 7 * SECONDS_PER_DAY,
                start_speed: 600.0,
                ..SimulationConfig::default()
            },
            generator: GeneratorConfig {
                days: 7,
                ..GeneratorConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "fast_forward", "short_run"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "fast_forward" => Ok(Self::fast_forward()),
            "short_run" => Ok(Self::short_run()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Speed bounds for the clock.
    pub fn speed_bounds(&self) -> SpeedBounds {
        SpeedBounds {
            min: self.simulation.min_speed,
            max: self.simulation.max_speed,
        }
    }

    /// Utility prices for the aggregation engine.
    pub fn rates(&self) -> Rates {
        Rates {
            electricity_usd_per_kwh: self.rates.electricity_usd_per_kwh,
            water_usd_per_gallon: self.rates.water_usd_per_gallon,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ConfigError {
                field: field.into(),
                message,
            })
        };

        let s = &self.simulation;
        if s.horizon_secs == 0 {
            push("simulation.horizon_secs", "must be > 0".into());
        }
        if !(s.min_speed.is_finite() && s.min_speed > 0.0) {
            push("simulation.min_speed", "must be > 0".into());
        }
        if !(s.max_speed.is_finite() && s.max_speed >= s.min_speed) {
            push("simulation.max_speed", "must be >= simulation.min_speed".into());
        }
        if !(s.min_speed..=s.max_speed).contains(&s.start_speed) {
            push(
                "simulation.start_speed",
                format!("must be in [{}, {}]", s.min_speed, s.max_speed),
            );
        }
        if s.tick_ms == 0 {
            push("simulation.tick_ms", "must be > 0".into());
        }
        if s.bucket_secs == 0 {
            push("simulation.bucket_secs", "must be > 0".into());
        }

        let sch = &self.schedule;
        if !(sch.time_publish_real_secs.is_finite() && sch.time_publish_real_secs > 0.0) {
            push("schedule.time_publish_real_secs", "must be > 0".into());
        }
        if sch.event_publish_app_secs == 0 {
            push("schedule.event_publish_app_secs", "must be > 0".into());
        }
        if sch.analysis_app_secs == 0 {
            push("schedule.analysis_app_secs", "must be > 0".into());
        }

        let th = &self.thermostat;
        if th.min_f > th.max_f {
            push("thermostat.min_f", "must be <= thermostat.max_f".into());
        }
        if !(th.min_f..=th.max_f).contains(&th.default_f) {
            push(
                "thermostat.default_f",
                format!("must be in [{}, {}]", th.min_f, th.max_f),
            );
        }

        let r = &self.rates;
        if r.electricity_usd_per_kwh.is_nan() || r.electricity_usd_per_kwh < 0.0 {
            push("rates.electricity_usd_per_kwh", "must be >= 0".into());
        }
        if r.water_usd_per_gallon.is_nan() || r.water_usd_per_gallon < 0.0 {
            push("rates.water_usd_per_gallon", "must be >= 0".into());
        }

        let g = &self.generator;
        if g.days == 0 {
            push("generator.days", "must be > 0".into());
        } else if g.days.saturating_mul(SECONDS_PER_DAY) > s.horizon_secs {
            push(
                "generator.days",
                "must fit within simulation.horizon_secs".into(),
            );
        }

        errors
    }
}
