//! Per-key on/off duration tracking for boolean state.

use std::collections::BTreeMap;

use crate::home::{electricity_rate, water_rate};

use super::event::{Event, StateType};
use super::thermal::{water_heater_wh, watt_hours};

/// Open/on duration and usage accumulated for one boolean key.
///
/// Durations are kept at three horizons, each reset independently:
/// the current thermal sub-interval, the current snapshot interval, and
/// the whole run. An open span is only folded into the counters when it
/// is *settled*, either by a closing event or by an explicit boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanTracker {
    state_type: StateType,
    on: bool,
    /// Start of the unsettled open span. Meaningless while off.
    on_since: u64,
    thermal_secs: u64,
    interval_secs: u64,
    lifetime_secs: u64,
    interval_wh: f64,
    interval_gal: f64,
}

impl BooleanTracker {
    /// Starts tracking from the first event seen for a key.
    pub fn from_event(event: &Event) -> Self {
        Self {
            state_type: event.state_type,
            on: event.new_value.as_bool().unwrap_or(false),
            on_since: event.time,
            thermal_secs: 0,
            interval_secs: 0,
            lifetime_secs: 0,
            interval_wh: 0.0,
            interval_gal: 0.0,
        }
    }

    /// Applies an open/close transition. Repeated values are no-ops.
    pub fn process(&mut self, event: &Event) {
        let Some(value) = event.new_value.as_bool() else {
            return;
        };
        match (self.on, value) {
            (true, false) => {
                self.settle(event.time);
                self.on = false;
            }
            (false, true) => {
                self.on = true;
                self.on_since = event.time;
                // Faucets switch between bath and shower; the opening event decides.
                self.state_type = event.state_type;
            }
            _ => {}
        }
    }

    /// Folds the open span up to `at` into every counter and restarts the
    /// span at `at`. The key stays open.
    pub fn settle(&mut self, at: u64) {
        if !self.on || at <= self.on_since {
            return;
        }
        let secs = at - self.on_since;
        self.thermal_secs += secs;
        self.interval_secs += secs;
        self.lifetime_secs += secs;

        let secs = secs as f64;
        if let Some(rate) = electricity_rate(self.state_type) {
            self.interval_wh += watt_hours(rate.watts, secs);
        }
        if let Some(rate) = water_rate(self.state_type) {
            let gallons = rate.gallons_per_second * secs;
            self.interval_gal += gallons;
            self.interval_wh += water_heater_wh(gallons * rate.hot_fraction);
        }
        self.on_since = at;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn state_type(&self) -> StateType {
        self.state_type
    }

    /// Settled open time since the last thermal reset.
    pub fn thermal_secs(&self) -> u64 {
        self.thermal_secs
    }

    /// Settled open time since the last snapshot.
    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// Settled open time over the whole run.
    pub fn lifetime_secs(&self) -> u64 {
        self.lifetime_secs
    }

    fn reset_thermal(&mut self) {
        self.thermal_secs = 0;
    }

    fn reset_interval(&mut self) {
        self.interval_secs = 0;
        self.interval_wh = 0.0;
        self.interval_gal = 0.0;
    }
}

/// All boolean trackers, keyed by state key.
///
/// Ordered so that floating-point sums are reproducible between runs.
#[derive(Debug, Clone, Default)]
pub struct TrackerSet {
    trackers: BTreeMap<String, BooleanTracker>,
}

impl TrackerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes a boolean event to its key's tracker, creating it on first sight.
    pub fn process(&mut self, event: &Event) {
        match self.trackers.get_mut(&event.state_key) {
            Some(tracker) => tracker.process(event),
            None => {
                self.trackers
                    .insert(event.state_key.clone(), BooleanTracker::from_event(event));
            }
        }
    }

    pub fn settle_all(&mut self, at: u64) {
        self.trackers.values_mut().for_each(|t| t.settle(at));
    }

    pub fn get(&self, key: &str) -> Option<&BooleanTracker> {
        self.trackers.get(key)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Settled open time of every tracker whose current type matches, since the last thermal reset.
    pub fn thermal_secs(&self, state_type: StateType) -> u64 {
        self.of_type(state_type).map(BooleanTracker::thermal_secs).sum()
    }

    /// Settled open time of every tracker whose current type matches, since the last snapshot.
    pub fn interval_secs(&self, state_type: StateType) -> u64 {
        self.of_type(state_type).map(BooleanTracker::interval_secs).sum()
    }

    /// Appliance and water heater electricity since the last snapshot (Wh).
    pub fn interval_wh(&self) -> f64 {
        self.trackers.values().map(|t| t.interval_wh).sum()
    }

    /// Water drawn since the last snapshot (gallons).
    pub fn interval_gal(&self) -> f64 {
        self.trackers.values().map(|t| t.interval_gal).sum()
    }

    pub fn reset_thermal(&mut self) {
        self.trackers.values_mut().for_each(BooleanTracker::reset_thermal);
    }

    pub fn reset_interval(&mut self) {
        self.trackers.values_mut().for_each(BooleanTracker::reset_interval);
    }

    fn of_type(&self, state_type: StateType) -> impl Iterator<Item = &BooleanTracker> {
        self.trackers
            .values()
            .filter(move |t| t.state_type == state_type)
    }
}
