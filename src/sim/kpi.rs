//! Post-hoc usage summary computed from a run's snapshots.

use std::fmt;

use serde::Serialize;

use super::types::Snapshot;

/// Aggregate utility and comfort figures for a complete (or partial) run.
///
/// Computed post-hoc from `&[Snapshot]` so the report always agrees with
/// the snapshots that were published.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    /// Number of snapshots summarized.
    pub snapshot_count: usize,
    /// App time covered, from zero to the last snapshot end (s).
    pub covered_secs: u64,
    /// Total electricity (Wh).
    pub electricity_wh: f64,
    pub electricity_usd: f64,
    /// Total water (gallons).
    pub water_gal: f64,
    pub water_usd: f64,
    pub total_usd: f64,
    /// Mean indoor temperature over snapshot ends (°F).
    pub mean_indoor_f: f64,
    pub min_indoor_f: f64,
    pub max_indoor_f: f64,
    /// Most expensive single interval ($).
    pub peak_interval_usd: f64,
    /// Total door open time (s).
    pub door_open_secs: u64,
    /// Total window open time (s).
    pub window_open_secs: u64,
}

impl UsageReport {
    /// Summarizes a run.
    ///
    /// # Arguments
    ///
    /// * `snapshots` - Snapshots in the order they were produced
    ///
    /// # Returns
    ///
    /// A `UsageReport`; all figures are zero for an empty slice.
    pub fn from_snapshots(snapshots: &[Snapshot]) -> Self {
        let Some(last) = snapshots.last() else {
            return Self {
                snapshot_count: 0,
                covered_secs: 0,
                electricity_wh: 0.0,
                electricity_usd: 0.0,
                water_gal: 0.0,
                water_usd: 0.0,
                total_usd: 0.0,
                mean_indoor_f: 0.0,
                min_indoor_f: 0.0,
                max_indoor_f: 0.0,
                peak_interval_usd: 0.0,
                door_open_secs: 0,
                window_open_secs: 0,
            };
        };

        let n = snapshots.len() as f64;
        let mut report = Self {
            snapshot_count: snapshots.len(),
            covered_secs: last.window_end,
            electricity_wh: 0.0,
            electricity_usd: 0.0,
            water_gal: 0.0,
            water_usd: 0.0,
            total_usd: 0.0,
            mean_indoor_f: 0.0,
            min_indoor_f: f64::INFINITY,
            max_indoor_f: f64::NEG_INFINITY,
            peak_interval_usd: 0.0,
            door_open_secs: 0,
            window_open_secs: 0,
        };

        for s in snapshots {
            report.electricity_wh += s.electricity_wh;
            report.electricity_usd += s.electricity_usd;
            report.water_gal += s.water_gal;
            report.water_usd += s.water_usd;
            report.total_usd += s.total_usd;
            report.mean_indoor_f += s.indoor_temp_f / n;
            report.min_indoor_f = report.min_indoor_f.min(s.indoor_temp_f);
            report.max_indoor_f = report.max_indoor_f.max(s.indoor_temp_f);
            report.peak_interval_usd = report.peak_interval_usd.max(s.total_usd);
            report.door_open_secs += s.door_open_secs;
            report.window_open_secs += s.window_open_secs;
        }
        report
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Usage Report ---")?;
        writeln!(
            f,
            "Snapshots:             {} ({:.2} days)",
            self.snapshot_count,
            self.covered_secs as f64 / 86_400.0
        )?;
        writeln!(
            f,
            "Electricity:           {:.2} kWh (${:.2})",
            self.electricity_wh / 1000.0,
            self.electricity_usd
        )?;
        writeln!(
            f,
            "Water:                 {:.1} gal (${:.2})",
            self.water_gal, self.water_usd
        )?;
        writeln!(f, "Total cost:            ${:.2}", self.total_usd)?;
        writeln!(f, "Peak interval cost:    ${:.4}", self.peak_interval_usd)?;
        writeln!(
            f,
            "Indoor temperature:    mean {:.1}F, min {:.1}F, max {:.1}F",
            self.mean_indoor_f, self.min_indoor_f, self.max_indoor_f
        )?;
        write!(
            f,
            "Open time:             doors {} s, windows {} s",
            self.door_open_secs, self.window_open_secs
        )
    }
}
