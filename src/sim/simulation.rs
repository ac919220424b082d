//! Top-level simulation context shared by every periodic task.
//!
//! [`Simulation`] owns the clock, the event store, and the aggregation
//! engine behind one coarse lock. Every operation, including publication,
//! runs entirely under that lock, so a restart can never interleave with
//! delivery of output computed for the previous run.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScenarioConfig;
use crate::error::{SimError, ValidationError};
use crate::home::{self, THERMOSTAT_TEMP};
use crate::publish::{Channel, Publisher};

use super::clock::{Advance, Clock, default_start};
use super::engine::AggregationEngine;
use super::event::{Event, StateValue};
use super::store::EventStore;
use super::types::{Rates, Snapshot, TimeReport};

/// Fixed parameters exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constants {
    pub min_app_time: u64,
    pub max_app_time: u64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub min_thermostat_f: i64,
    pub max_thermostat_f: i64,
    pub event_publish_app_secs: u64,
    pub analysis_app_secs: u64,
    /// Calendar anchor of app time zero, `YYYY-MM-DDTHH:MM:SS`.
    pub start: String,
}

#[derive(Debug, Clone)]
struct Settings {
    analysis_secs: u64,
    event_secs: u64,
    thermostat_min: i64,
    thermostat_max: i64,
    default_outdoor_f: f64,
    default_thermostat_f: f64,
    rates: Rates,
    start: NaiveDateTime,
}

#[derive(Debug)]
struct RunState {
    clock: Clock,
    store: EventStore,
    engine: AggregationEngine,
    /// Last app time delivered by [`Simulation::publish_events`].
    event_cursor: Option<u64>,
    /// Bumped by every restart.
    generation: u64,
    horizon_logged: bool,
}

impl RunState {
    /// Earliest app time not yet covered by any delivered window.
    fn next_open_time(&self) -> u64 {
        let now = self.clock.now();
        match self.event_cursor.max(self.engine.last_end()) {
            Some(delivered) if delivered >= now => delivered + 1,
            _ => now,
        }
    }
}

/// The single simulation timeline.
///
/// Shared between tasks as `Arc<Simulation>`; all methods take `&self`.
#[derive(Debug)]
pub struct Simulation {
    settings: Settings,
    state: Mutex<RunState>,
}

impl Simulation {
    /// Builds a simulation at app time zero with `events` pre-loaded.
    ///
    /// # Errors
    ///
    /// - [`SimError::DuplicateKey`] if the pre-generated events repeat a
    ///   `(time, state_key)` pair; nothing is loaded.
    /// - [`SimError::Validation`] if the start speed is out of range or an
    ///   event is malformed.
    pub fn new(
        config: &ScenarioConfig,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<Self, SimError> {
        let sim = &config.simulation;
        let clock = Clock::new(sim.horizon_secs, sim.start_speed, config.speed_bounds())?;
        let mut store = EventStore::new(sim.horizon_secs, sim.bucket_secs);
        store.insert_pregenerated(events)?;

        let settings = Settings {
            analysis_secs: config.schedule.analysis_app_secs.max(1),
            event_secs: config.schedule.event_publish_app_secs.max(1),
            thermostat_min: config.thermostat.min_f,
            thermostat_max: config.thermostat.max_f,
            default_outdoor_f: config.thermostat.default_outdoor_f as f64,
            default_thermostat_f: config.thermostat.default_f as f64,
            rates: config.rates(),
            start: default_start(),
        };
        let engine = seeded_engine(&store, &settings);

        info!(
            horizon_secs = sim.horizon_secs,
            events = store.pregenerated_len(),
            speed = clock.speed(),
            "simulation ready"
        );
        Ok(Self {
            settings,
            state: Mutex::new(RunState {
                clock,
                store,
                engine,
                event_cursor: None,
                generation: 0,
                horizon_logged: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Client-facing constants.
    pub fn constants(&self) -> Constants {
        let state = self.lock();
        let bounds = state.clock.bounds();
        Constants {
            min_app_time: 0,
            max_app_time: state.clock.horizon(),
            min_speed: bounds.min,
            max_speed: bounds.max,
            min_thermostat_f: self.settings.thermostat_min,
            max_thermostat_f: self.settings.thermostat_max,
            event_publish_app_secs: self.settings.event_secs,
            analysis_app_secs: self.settings.analysis_secs,
            start: self.settings.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Current clock reading. Side-effect free.
    pub fn current_time(&self) -> TimeReport {
        time_report(&self.lock(), &self.settings)
    }

    pub fn now(&self) -> u64 {
        self.lock().clock.now()
    }

    pub fn speed(&self) -> f64 {
        self.lock().clock.speed()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().clock.is_finished()
    }

    /// Run generation; starts at zero and increments on every restart.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// App seconds between event publications.
    pub fn event_interval_secs(&self) -> u64 {
        self.settings.event_secs
    }

    /// App seconds per snapshot interval.
    pub fn analysis_interval_secs(&self) -> u64 {
        self.settings.analysis_secs
    }

    /// Real time that `app_secs` of app time takes at the current speed.
    pub fn real_interval(&self, app_secs: u64) -> Duration {
        self.lock().clock.real_interval(app_secs)
    }

    /// Advances the clock by `real_elapsed` of wall-clock time.
    pub fn advance(&self, real_elapsed: Duration) -> Advance {
        let mut state = self.lock();
        let advance = state.clock.advance(real_elapsed);
        if let Advance::HorizonReached(at) = advance {
            if !state.horizon_logged {
                state.horizon_logged = true;
                info!(at, generation = state.generation, "simulation horizon reached");
            }
        }
        advance
    }

    /// Resolved events with `after < time <= now`, in time order.
    ///
    /// `after = None` includes events at time zero. Calling this twice
    /// with the same argument and no insert in between returns the same
    /// sequence.
    pub fn events_since(&self, after: Option<u64>) -> Vec<Event> {
        let state = self.lock();
        let now = state.clock.now();
        state.store.events_in_window(after, now, None)
    }

    /// The resolved value of `key` at the current app time.
    pub fn current_value(&self, key: &str) -> Option<StateValue> {
        let state = self.lock();
        state
            .store
            .current(key, state.clock.now())
            .map(|e| e.new_value)
    }

    /// Number of `(pre-generated, user)` events in the store.
    pub fn event_counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.store.pregenerated_len(), state.store.user_len())
    }

    /// Computes a snapshot for every analysis interval that has fully
    /// elapsed and not been computed yet.
    ///
    /// Intervals end at multiples of the analysis length; the last one is
    /// cut short at the horizon. Nothing past the current app time is read.
    pub fn derived_snapshots(&self) -> Vec<Snapshot> {
        let mut state = self.lock();
        drain_snapshots(&mut state, self.settings.analysis_secs)
    }

    /// Sets the thermostat, effective at the next undelivered app second.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ThermostatOutOfRange`] outside the
    /// configured range.
    pub fn set_thermostat(&self, value: i64) -> Result<Event, SimError> {
        self.submit(THERMOSTAT_TEMP, StateValue::Int(value), None)
    }

    /// Opens/closes or switches on/off a user-changeable boolean key.
    ///
    /// `time = None` schedules the change at the next undelivered app second.
    ///
    /// # Errors
    ///
    /// See [`Simulation::submit`].
    pub fn set_boolean_state(
        &self,
        key: &str,
        value: bool,
        time: Option<u64>,
    ) -> Result<Event, SimError> {
        self.submit(key, StateValue::Bool(value), time)
    }

    /// Validates and stores one user event.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::UnknownKey`] / [`ValidationError::NotUserChangeable`]
    ///   for keys outside the user-facing registry.
    /// - [`ValidationError::ValueTypeMismatch`] for a boolean sent to an
    ///   integer key or vice versa.
    /// - [`ValidationError::ThermostatOutOfRange`] for bad setpoints.
    /// - [`ValidationError::CausalityViolation`] if `time` is before now, or
    ///   falls in a second already delivered by [`Simulation::publish_events`]
    ///   or covered by a computed snapshot.
    /// - [`ValidationError::BeyondHorizon`] past the end of the run.
    pub fn submit(
        &self,
        key: &str,
        value: StateValue,
        time: Option<u64>,
    ) -> Result<Event, SimError> {
        let device =
            home::device(key).ok_or_else(|| ValidationError::UnknownKey(key.to_string()))?;
        if !device.user_changeable {
            return Err(ValidationError::NotUserChangeable(key.to_string()).into());
        }
        match value {
            StateValue::Int(v) if device.state_type.is_integer() => {
                let (min, max) = (self.settings.thermostat_min, self.settings.thermostat_max);
                if !(min..=max).contains(&v) {
                    return Err(ValidationError::ThermostatOutOfRange { value: v, min, max }.into());
                }
            }
            StateValue::Bool(_) if !device.state_type.is_integer() => {}
            _ => {
                return Err(ValidationError::ValueTypeMismatch {
                    state_type: device.state_type,
                    found: value.kind(),
                }
                .into());
            }
        }

        let mut state = self.lock();
        let now = state.clock.now();
        // Seconds already delivered to publishers or folded into a snapshot
        // are closed to new events.
        let open = state.next_open_time();
        let time = time.unwrap_or(open);
        let message = home::message_for(key, device.state_type, value);
        let event = Event::user(time, device.state_type, key, value, message);
        state.store.insert_user(event.clone(), open)?;
        info!(key, time, now, value = ?value, "user event accepted");
        Ok(event)
    }

    /// Changes the speed multiplier without moving app time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SpeedOutOfRange`] outside the bounds.
    pub fn set_speed(&self, speed: f64) -> Result<(), ValidationError> {
        let mut state = self.lock();
        state.clock.set_speed(speed)?;
        info!(speed, now = state.clock.now(), "speed changed");
        Ok(())
    }

    /// Starts a new run: app time back to zero, user events purged,
    /// aggregation state rebuilt from the pre-generated events. Speed is
    /// kept. Returns the new run generation.
    pub fn restart(&self) -> u64 {
        let mut state = self.lock();
        state.clock.restart();
        let removed = state.store.clear_user();
        state.engine = seeded_engine(&state.store, &self.settings);
        state.event_cursor = None;
        state.horizon_logged = false;
        state.generation += 1;
        info!(
            generation = state.generation,
            removed_user_events = removed,
            "simulation restarted"
        );
        state.generation
    }

    /// Publishes the current clock reading on [`Channel::Time`].
    pub fn publish_time(&self, publisher: &dyn Publisher) {
        let state = self.lock();
        publish_json(publisher, Channel::Time, &time_report(&state, &self.settings));
    }

    /// Publishes every event since the last delivery on [`Channel::Event`]
    /// as one batch. Returns the number of events delivered.
    pub fn publish_events(&self, publisher: &dyn Publisher) -> usize {
        let mut state = self.lock();
        let now = state.clock.now();
        if state.event_cursor.is_some_and(|c| c >= now) {
            return 0;
        }
        let after = state.event_cursor;
        let events = state.store.events_in_window(after, now, None);
        state.event_cursor = Some(now);
        debug!(?after, now, count = events.len(), "event window");
        if !events.is_empty() {
            publish_json(publisher, Channel::Event, &events);
        }
        events.len()
    }

    /// Publishes every newly elapsed snapshot on [`Channel::Analysis`].
    /// Returns the number of snapshots delivered.
    pub fn publish_snapshots(&self, publisher: &dyn Publisher) -> usize {
        let mut state = self.lock();
        let snapshots = drain_snapshots(&mut state, self.settings.analysis_secs);
        for snapshot in &snapshots {
            publish_json(publisher, Channel::Analysis, snapshot);
        }
        snapshots.len()
    }
}

fn seeded_engine(store: &EventStore, settings: &Settings) -> AggregationEngine {
    AggregationEngine::seeded(
        store,
        settings.default_outdoor_f,
        settings.default_thermostat_f,
        settings.rates,
    )
}

fn time_report(state: &RunState, settings: &Settings) -> TimeReport {
    TimeReport {
        elapsed_secs: state.clock.now(),
        speed: state.clock.speed(),
        days: state.clock.days_elapsed(),
        label: state.clock.label(settings.start),
        finished: state.clock.is_finished(),
    }
}

fn drain_snapshots(state: &mut RunState, analysis_secs: u64) -> Vec<Snapshot> {
    let now = state.clock.now();
    let horizon = state.clock.horizon();
    let mut snapshots = Vec::new();
    loop {
        let last_end = state.engine.last_end();
        let end = match last_end {
            Some(end) if end >= horizon => break,
            Some(end) => end.saturating_add(analysis_secs),
            None => analysis_secs,
        }
        .min(horizon);
        if end > now {
            break;
        }
        let events = state.store.events_in_window(last_end, end, None);
        snapshots.push(state.engine.process_window(&events, end));
    }
    snapshots
}

fn publish_json<T: Serialize + ?Sized>(publisher: &dyn Publisher, channel: Channel, value: &T) {
    match serde_json::to_value(value) {
        Ok(payload) => publisher.publish(channel, payload),
        Err(e) => warn!(channel = channel.as_str(), "failed to serialize payload: {e}"),
    }
}
