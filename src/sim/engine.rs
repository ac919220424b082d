//! Aggregation engine that turns event windows into derived snapshots.

use tracing::{debug, warn};

use crate::home::{OUTDOOR_TEMP, THERMOSTAT_TEMP};

use super::event::{Event, StateType, StateValue};
use super::store::EventStore;
use super::thermal::{self, electricity_cost, water_cost};
use super::tracker::TrackerSet;
use super::types::{Rates, Snapshot};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Stateful, incremental indoor temperature and utility usage model.
///
/// Each call to [`AggregationEngine::process_window`] consumes the events
/// of one analysis interval in time order and returns one [`Snapshot`].
/// Boolean trackers and the indoor temperature carry over between
/// intervals; usage accumulators are reset after every snapshot.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    indoor_f: f64,
    outdoor_f: f64,
    thermostat_f: f64,
    /// Start of the current thermal sub-interval.
    last_thermal: u64,
    /// Inclusive end of the last processed window.
    last_end: Option<u64>,
    /// HVAC electricity in the current interval (Wh).
    hvac_wh: f64,
    trackers: TrackerSet,
    rates: Rates,
}

impl AggregationEngine {
    /// Creates an engine at app time zero. Indoor temperature starts at
    /// the thermostat setpoint.
    ///
    /// # Arguments
    ///
    /// * `outdoor_f` - Outdoor temperature at time zero (°F)
    /// * `thermostat_f` - Thermostat setpoint at time zero (°F)
    /// * `rates` - Utility prices used for costing
    pub fn new(outdoor_f: f64, thermostat_f: f64, rates: Rates) -> Self {
        Self {
            indoor_f: thermostat_f,
            outdoor_f,
            thermostat_f,
            last_thermal: 0,
            last_end: None,
            hvac_wh: 0.0,
            trackers: TrackerSet::new(),
            rates,
        }
    }

    /// Creates an engine whose starting temperatures are the earliest
    /// outdoor and thermostat events in `store`, falling back to the given
    /// defaults for keys with no events.
    pub fn seeded(
        store: &EventStore,
        default_outdoor_f: f64,
        default_thermostat_f: f64,
        rates: Rates,
    ) -> Self {
        let first = |key: &str, fallback: f64| {
            store
                .first(key)
                .and_then(|e| e.new_value.as_int())
                .map_or(fallback, |v| v as f64)
        };
        Self::new(
            first(OUTDOOR_TEMP, default_outdoor_f),
            first(THERMOSTAT_TEMP, default_thermostat_f),
            rates,
        )
    }

    /// Processes the events of one interval and emits its snapshot.
    ///
    /// `events` must be the time-ordered contents of
    /// `(last_end, end]`, where `last_end` is the end of the previous call
    /// (or nothing, for the first interval, which then starts at time zero
    /// inclusive).
    ///
    /// # Arguments
    ///
    /// * `events` - Events of the interval, in time order
    /// * `end` - Inclusive end of the interval (app seconds)
    ///
    /// # Returns
    ///
    /// The interval's [`Snapshot`]. An interval with no events still
    /// advances the thermal model to `end`.
    pub fn process_window(&mut self, events: &[Event], end: u64) -> Snapshot {
        let start = self.last_end;

        // 1. Walk the interval; an integer event sets its value and closes a thermal sub-interval
        for event in events {
            match event.new_value {
                StateValue::Bool(_) => self.trackers.process(event),
                StateValue::Int(value) => self.apply_integer(event, value),
            }
        }

        // 2. Forced thermal recomputation up to the interval end
        self.thermal_boundary(end);

        // 3. Appliance usage and costs
        let electricity_wh = self.hvac_wh + self.trackers.interval_wh();
        let water_gal = self.trackers.interval_gal();
        let electricity_usd = electricity_cost(electricity_wh, self.rates.electricity_usd_per_kwh);
        let water_usd = water_cost(water_gal, self.rates.water_usd_per_gallon);

        let snapshot = Snapshot {
            window_start: start,
            window_end: end,
            days: end as f64 / SECONDS_PER_DAY,
            indoor_temp_f: self.indoor_f,
            electricity_wh,
            electricity_usd,
            water_gal,
            water_usd,
            total_usd: electricity_usd + water_usd,
            door_open_secs: self.trackers.interval_secs(StateType::Door),
            window_open_secs: self.trackers.interval_secs(StateType::Window),
        };
        debug!(
            window_end = end,
            events = events.len(),
            indoor_f = snapshot.indoor_temp_f,
            electricity_wh,
            water_gal,
            "computed snapshot"
        );

        // 4. Reset interval accumulators; open trackers carry over
        self.hvac_wh = 0.0;
        self.trackers.reset_interval();
        self.last_end = Some(end);
        snapshot
    }

    fn apply_integer(&mut self, event: &Event, value: i64) {
        let outdoor = match event.state_key.as_str() {
            OUTDOOR_TEMP => true,
            THERMOSTAT_TEMP => false,
            other => {
                warn!(key = other, time = event.time, "ignoring integer event for unmodeled key");
                return;
            }
        };
        // The sub-interval ending at this event is computed with the new value.
        if outdoor {
            self.outdoor_f = value as f64;
        } else {
            self.thermostat_f = value as f64;
        }
        self.thermal_boundary(event.time);
    }

    /// Closes the thermal sub-interval `[last_thermal, at]`.
    fn thermal_boundary(&mut self, at: u64) {
        self.trackers.settle_all(at);
        let step = thermal::step(
            self.indoor_f,
            self.outdoor_f,
            self.thermostat_f,
            at.saturating_sub(self.last_thermal) as f64,
            self.trackers.thermal_secs(StateType::Door) as f64,
            self.trackers.thermal_secs(StateType::Window) as f64,
        );
        self.indoor_f = step.indoor_f;
        self.hvac_wh += step.hvac_wh;
        self.trackers.reset_thermal();
        self.last_thermal = self.last_thermal.max(at);
    }

    /// Current indoor temperature (°F).
    pub fn indoor_f(&self) -> f64 {
        self.indoor_f
    }

    pub fn outdoor_f(&self) -> f64 {
        self.outdoor_f
    }

    pub fn thermostat_f(&self) -> f64 {
        self.thermostat_f
    }

    /// Inclusive end of the last processed interval.
    pub fn last_end(&self) -> Option<u64> {
        self.last_end
    }

    pub fn trackers(&self) -> &TrackerSet {
        &self.trackers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::store::DEFAULT_BUCKET_SECS;

    fn boolean(time: u64, state_type: StateType, key: &str, on: bool) -> Event {
        Event::pregenerated(time, state_type, key, StateValue::Bool(on), "")
    }

    fn temp(time: u64, key: &str, value: i64) -> Event {
        Event::pregenerated(time, StateType::Temp, key, StateValue::Int(value), "")
    }

    #[test]
    fn first_interval_starts_at_thermostat() {
        let mut engine = AggregationEngine::new(70.0, 70.0, Rates::default());
        let s = engine.process_window(&[], 1800);
        assert_eq!(s.window_start, None);
        assert_eq!(s.indoor_temp_f, 70.0);
        assert_eq!(s.electricity_wh, 0.0);
        assert_eq!(s.total_usd, 0.0);
    }

    #[test]
    fn empty_interval_still_drifts_toward_outdoor() {
        // 10 °F gap drifts 1 °F in 30 minutes; HVAC stays within its deadband.
        let mut engine = AggregationEngine::new(60.0, 70.0, Rates::default());
        let s = engine.process_window(&[], 1800);
        assert!((s.indoor_temp_f - 69.0).abs() < 1e-9);
        assert_eq!(s.electricity_wh, 0.0);
        let s = engine.process_window(&[], 3600);
        assert_eq!(s.window_start, Some(1800));
        assert!(s.indoor_temp_f < 69.0);
    }

    #[test]
    fn door_open_whole_interval() {
        let events = [
            temp(0, OUTDOOR_TEMP, 30),
            temp(0, THERMOSTAT_TEMP, 70),
            boolean(0, StateType::Door, "frontDoor", true),
            boolean(1800, StateType::Door, "frontDoor", false),
        ];
        let mut engine = AggregationEngine::new(30.0, 70.0, Rates::default());
        let s = engine.process_window(&events, 1800);
        assert_eq!(s.door_open_secs, 1800);

        // Door drift saturates at the outdoor gap; HVAC then runs all 30 minutes.
        assert!((s.indoor_temp_f - 60.0).abs() < 1e-9);
        assert!((s.electricity_wh - 1750.0).abs() < 1e-6);

        let mut closed = AggregationEngine::new(30.0, 70.0, Rates::default());
        let baseline = closed.process_window(&events[..2], 1800);
        assert!(s.electricity_wh > baseline.electricity_wh);
    }

    #[test]
    fn open_span_carries_across_snapshots() {
        let mut engine = AggregationEngine::new(70.0, 70.0, Rates::default());
        let first = engine.process_window(&[boolean(900, StateType::Door, "backDoor", true)], 1800);
        let second = engine.process_window(&[], 3600);
        let third = engine.process_window(&[boolean(4000, StateType::Door, "backDoor", false)], 5400);
        assert_eq!(first.door_open_secs, 900);
        assert_eq!(second.door_open_secs, 1800);
        assert_eq!(third.door_open_secs, 400);
        let tracker = engine.trackers().get("backDoor").expect("tracked");
        assert_eq!(tracker.lifetime_secs(), 4000 - 900);
    }

    #[test]
    fn integer_event_splits_thermal_sub_interval() {
        // Outdoor drops to 50 at 900 and that value already applies to [0, 900].
        let mut engine = AggregationEngine::new(70.0, 70.0, Rates::default());
        let s = engine.process_window(&[temp(900, OUTDOOR_TEMP, 50)], 1800);
        assert_eq!(engine.outdoor_f(), 50.0);
        // 20 °F gap for 15 minutes drifts 1 °F, then a 19 °F gap drifts 0.95 °F.
        assert!((s.indoor_temp_f - 68.05).abs() < 1e-9);
        assert_eq!(s.electricity_wh, 0.0);
    }

    #[test]
    fn setpoint_applies_to_the_sub_interval_it_closes() {
        let mut engine = AggregationEngine::new(50.0, 70.0, Rates::default());
        let s = engine.process_window(&[temp(900, THERMOSTAT_TEMP, 73)], 1800);
        // [0, 900]: drift to 69, then 4 minutes of HVAC up to 73.
        // [900, 1800]: drift 1.15 °F, back inside the deadband.
        assert!((s.indoor_temp_f - 71.85).abs() < 1e-9);
        assert!((s.electricity_wh - 3500.0 * 240.0 / 3600.0).abs() < 1e-6);
    }

    #[test]
    fn thermostat_change_drives_hvac() {
        let mut engine = AggregationEngine::new(70.0, 70.0, Rates::default());
        let s = engine.process_window(&[temp(0, THERMOSTAT_TEMP, 80)], 1800);
        assert_eq!(engine.thermostat_f(), 80.0);
        assert!((s.indoor_temp_f - 80.0).abs() < 1e-9);
        // 10 minutes of HVAC at 3500 W.
        assert!((s.electricity_wh - 3500.0 / 6.0).abs() < 1e-6);
        assert!((s.electricity_usd - s.electricity_wh / 1000.0 * 0.12).abs() < 1e-12);
    }

    #[test]
    fn unmodeled_integer_keys_are_ignored() {
        let mut engine = AggregationEngine::new(70.0, 70.0, Rates::default());
        let s = engine.process_window(&[temp(10, "atticTemp", 120)], 1800);
        assert_eq!(s.indoor_temp_f, 70.0);
    }

    #[test]
    fn water_usage_is_costed() {
        let events = [
            boolean(0, StateType::Shower, "bathroom1Faucet", true),
            boolean(900, StateType::Shower, "bathroom1Faucet", false),
        ];
        let mut engine = AggregationEngine::new(70.0, 70.0, Rates::default());
        let s = engine.process_window(&events, 1800);
        assert!((s.water_gal - 25.0).abs() < 1e-9);
        assert!((s.total_usd - (s.electricity_usd + s.water_usd)).abs() < 1e-12);
        assert!(s.water_usd > 0.0 && s.electricity_wh > 0.0);
    }

    #[test]
    fn seeded_reads_first_temperatures() {
        let mut store = EventStore::new(10_000, DEFAULT_BUCKET_SECS);
        store
            .insert_pregenerated([temp(0, OUTDOOR_TEMP, 41), temp(0, THERMOSTAT_TEMP, 68)])
            .expect("load");
        let engine = AggregationEngine::seeded(&store, 50.0, 70.0, Rates::default());
        assert_eq!(engine.outdoor_f(), 41.0);
        assert_eq!(engine.indoor_f(), 68.0);

        let empty = EventStore::new(10_000, DEFAULT_BUCKET_SECS);
        let engine = AggregationEngine::seeded(&empty, 50.0, 72.0, Rates::default());
        assert_eq!(engine.thermostat_f(), 72.0);
    }
}
