//! Core simulation types: pricing, snapshots, and time reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::thermal::{DEFAULT_ELECTRICITY_USD_PER_KWH, DEFAULT_WATER_USD_PER_GALLON};

/// Utility prices applied when costing a snapshot.
///
/// # Examples
///
/// ```
/// use smart_home_sim::sim::types::Rates;
///
/// let rates = Rates::default();
/// assert_eq!(rates.electricity_usd_per_kwh, 0.12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    /// Electricity price in dollars per kWh.
    pub electricity_usd_per_kwh: f64,
    /// Water price in dollars per gallon.
    pub water_usd_per_gallon: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            electricity_usd_per_kwh: DEFAULT_ELECTRICITY_USD_PER_KWH,
            water_usd_per_gallon: DEFAULT_WATER_USD_PER_GALLON,
        }
    }
}

/// Derived state and utility usage for one analysis interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Exclusive start of the interval (app seconds), absent for the first one.
    pub window_start: Option<u64>,
    /// Inclusive end of the interval (app seconds).
    pub window_end: u64,
    /// `window_end` in fractional days.
    pub days: f64,
    /// Indoor temperature at `window_end` (°F).
    pub indoor_temp_f: f64,
    /// Electricity used in the interval, HVAC and water heater included (Wh).
    pub electricity_wh: f64,
    pub electricity_usd: f64,
    /// Water used in the interval (gallons).
    pub water_gal: f64,
    pub water_usd: f64,
    /// `electricity_usd + water_usd`.
    pub total_usd: f64,
    /// Summed open time of all doors in the interval (s).
    pub door_open_secs: u64,
    /// Summed open time of all windows in the interval (s).
    pub window_open_secs: u64,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>7}s ({:>6.2}d) | indoor={:>5.1}F | elec={:>8.1} Wh (${:.4}) \
             water={:>6.2} gal (${:.4}) | total=${:.4}",
            self.window_end,
            self.days,
            self.indoor_temp_f,
            self.electricity_wh,
            self.electricity_usd,
            self.water_gal,
            self.water_usd,
            self.total_usd,
        )
    }
}

/// Clock reading handed to the time publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeReport {
    /// App seconds since simulation start.
    pub elapsed_secs: u64,
    /// App seconds per real second.
    pub speed: f64,
    /// Elapsed time in fractional days.
    pub days: f64,
    /// Calendar label, e.g. `"08:30:00 AM\nMonday\nDay 1"`.
    pub label: String,
    /// `true` once the horizon has been reached.
    pub finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rates_match_utility_prices() {
        let rates = Rates::default();
        assert_eq!(rates.electricity_usd_per_kwh, 0.12);
        assert!((rates.water_usd_per_gallon * 7.48 * 100.0 - 2.52).abs() < 1e-12);
    }

    #[test]
    fn snapshot_display_does_not_panic() {
        let s = Snapshot {
            window_start: Some(0),
            window_end: 1800,
            days: 1800.0 / 86_400.0,
            indoor_temp_f: 69.5,
            electricity_wh: 1200.0,
            electricity_usd: 0.144,
            water_gal: 3.0,
            water_usd: 0.01,
            total_usd: 0.154,
            door_open_secs: 30,
            window_open_secs: 0,
        };
        assert!(format!("{s}").contains("1800"));
    }
}
