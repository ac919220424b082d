//! Time-indexed event store.
//!
//! Events live in an array of fixed-width time buckets covering
//! `[0, horizon]`. Each bucket keeps its entries sorted by time (ties in
//! insertion order), and each entry is a two-slot record holding at most
//! one pre-generated and one user event for a `(time, state_key)` pair.
//! Window scans touch only the buckets that overlap the window. A per-key
//! set of occupied times answers latest-value lookups without scanning.
//!
//! The store itself is not synchronized; [`crate::sim::simulation::Simulation`]
//! guards it with the same lock as the clock.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::error::{SimError, ValidationError};

use super::event::{Event, Origin, StateType, StateValue};

/// Default bucket width in app seconds.
pub const DEFAULT_BUCKET_SECS: u64 = 60;

/// Pre-generated and user events for one `(time, state_key)` pair.
#[derive(Debug, Clone, Default)]
struct Slot {
    pregenerated: Option<Event>,
    user: Option<Event>,
}

impl Slot {
    fn get(&self, origin: Origin) -> Option<&Event> {
        match origin {
            Origin::Pregenerated => self.pregenerated.as_ref(),
            Origin::User => self.user.as_ref(),
        }
    }

    fn get_mut(&mut self, origin: Origin) -> &mut Option<Event> {
        match origin {
            Origin::Pregenerated => &mut self.pregenerated,
            Origin::User => &mut self.user,
        }
    }

    /// The single effective event: user over pre-generated.
    fn resolved(&self) -> Option<&Event> {
        match (&self.user, &self.pregenerated) {
            (Some(user), _) => Some(user),
            (None, Some(pregenerated)) => Some(pregenerated),
            (None, None) => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.pregenerated.is_none() && self.user.is_none()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    time: u64,
    key: String,
    slot: Slot,
}

/// Event store indexed by time bucket, state key, and origin.
#[derive(Debug, Clone)]
pub struct EventStore {
    buckets: Vec<Vec<Entry>>,
    bucket_secs: u64,
    horizon: u64,
    /// `(time, key)` of every stored user event, so clearing is O(user events).
    user_index: Vec<(u64, String)>,
    /// Times holding at least one event, per key.
    key_times: HashMap<String, BTreeSet<u64>>,
    pregenerated_len: usize,
}

impl EventStore {
    /// Creates an empty store covering app times `0..=horizon`.
    ///
    /// A `bucket_secs` of zero is treated as one second.
    pub fn new(horizon: u64, bucket_secs: u64) -> Self {
        let bucket_secs = bucket_secs.max(1);
        let bucket_count = (horizon / bucket_secs + 1) as usize;
        Self {
            buckets: vec![Vec::new(); bucket_count],
            bucket_secs,
            horizon,
            user_index: Vec::new(),
            key_times: HashMap::new(),
            pregenerated_len: 0,
        }
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    /// Number of pre-generated events.
    pub fn pregenerated_len(&self) -> usize {
        self.pregenerated_len
    }

    /// Number of user events.
    pub fn user_len(&self) -> usize {
        self.user_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pregenerated_len == 0 && self.user_index.is_empty()
    }

    /// Bulk-loads pre-generated events. The batch is applied entirely or not at all.
    ///
    /// Events are re-indexed, so input order does not matter. Each event's
    /// origin is set to [`Origin::Pregenerated`].
    ///
    /// # Errors
    ///
    /// - [`SimError::DuplicateKey`] if two events (in the batch, or already
    ///   loaded) share a `(time, state_key)` pair.
    /// - [`SimError::Validation`] if an event lies past the horizon or its
    ///   value kind does not match its state type.
    pub fn insert_pregenerated(
        &mut self,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<usize, SimError> {
        let events: Vec<Event> = events.into_iter().collect();

        let mut seen: HashSet<(u64, &str)> = HashSet::with_capacity(events.len());
        for event in &events {
            self.check_event(event)?;
            let duplicate = !seen.insert((event.time, event.state_key.as_str()))
                || self.get(event.time, &event.state_key, Origin::Pregenerated).is_some();
            if duplicate {
                return Err(SimError::DuplicateKey {
                    time: event.time,
                    key: event.state_key.clone(),
                });
            }
        }

        let count = events.len();
        for mut event in events {
            event.origin = Origin::Pregenerated;
            self.put(event);
        }
        self.pregenerated_len += count;
        debug!(count, total = self.pregenerated_len, "loaded pre-generated events");
        Ok(count)
    }

    /// Inserts one user event. A user event already stored at the same
    /// `(time, state_key)` is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CausalityViolation`] when `event.time < now`,
    /// and the other [`ValidationError`]s for out-of-horizon or mistyped events.
    pub fn insert_user(&mut self, mut event: Event, now: u64) -> Result<(), SimError> {
        if event.time < now {
            return Err(ValidationError::CausalityViolation {
                time: event.time,
                now,
            }
            .into());
        }
        self.check_event(&event)?;

        event.origin = Origin::User;
        let (time, key) = (event.time, event.state_key.clone());
        if self.put(event) {
            self.user_index.push((time, key));
        }
        Ok(())
    }

    /// Removes every user event and returns how many were removed.
    pub fn clear_user(&mut self) -> usize {
        let removed = self.user_index.len();
        for (time, key) in std::mem::take(&mut self.user_index) {
            let bucket = &mut self.buckets[(time / self.bucket_secs) as usize];
            if let Some(pos) = bucket.iter().position(|e| e.time == time && e.key == key) {
                bucket[pos].slot.user = None;
                if bucket[pos].slot.is_empty() {
                    bucket.remove(pos);
                    if let Some(times) = self.key_times.get_mut(&key) {
                        times.remove(&time);
                        if times.is_empty() {
                            self.key_times.remove(&key);
                        }
                    }
                }
            }
        }
        removed
    }

    /// Returns the event of `origin` stored at exactly `(time, key)`.
    pub fn get(&self, time: u64, key: &str, origin: Origin) -> Option<&Event> {
        self.entry(time, key).and_then(|e| e.slot.get(origin))
    }

    /// Returns the effective event at exactly `(time, key)`: user over pre-generated.
    pub fn resolve(&self, time: u64, key: &str) -> Option<&Event> {
        self.entry(time, key).and_then(|e| e.slot.resolved())
    }

    /// Returns the event that defines `key`'s value at app time `at`:
    /// the latest event at or before `at`, with a user event taking
    /// precedence over a pre-generated one at the same time.
    pub fn current(&self, key: &str, at: u64) -> Option<&Event> {
        let time = *self.key_times.get(key)?.range(..=at).next_back()?;
        self.resolve(time, key)
    }

    /// Returns the earliest effective event for `key`.
    pub fn first(&self, key: &str) -> Option<&Event> {
        let time = *self.key_times.get(key)?.first()?;
        self.resolve(time, key)
    }

    /// Returns effective events with `after < time <= through`, in time order.
    ///
    /// `after = None` starts the window at time zero inclusive. Within one
    /// app second, events keep the order in which their `(time, key)` pair
    /// was first stored; a user event sits in the position of the
    /// pre-generated event it overrides.
    pub fn events_in_window(
        &self,
        after: Option<u64>,
        through: u64,
        state_type: Option<StateType>,
    ) -> Vec<Event> {
        self.scan(after, through, |slot| slot.resolved())
            .filter(|e| state_type.is_none_or(|t| e.state_type == t))
            .cloned()
            .collect()
    }

    /// Like [`EventStore::events_in_window`] but restricted to one origin,
    /// without precedence resolution.
    pub fn origin_events_in_window(
        &self,
        origin: Origin,
        after: Option<u64>,
        through: u64,
    ) -> Vec<Event> {
        self.scan(after, through, |slot| slot.get(origin))
            .cloned()
            .collect()
    }

    fn scan<'a>(
        &'a self,
        after: Option<u64>,
        through: u64,
        pick: impl Fn(&'a Slot) -> Option<&'a Event> + 'a,
    ) -> impl Iterator<Item = &'a Event> + 'a {
        let start = after.map_or(0, |a| a.saturating_add(1));
        let through = through.min(self.horizon);
        let buckets: &'a [Vec<Entry>] = if start > through {
            &[]
        } else {
            let first = (start / self.bucket_secs) as usize;
            let last = (through / self.bucket_secs) as usize;
            &self.buckets[first..=last]
        };
        buckets
            .iter()
            .flatten()
            .filter(move |e| e.time >= start && e.time <= through)
            .filter_map(move |e| pick(&e.slot))
    }

    fn entry(&self, time: u64, key: &str) -> Option<&Entry> {
        if time > self.horizon {
            return None;
        }
        self.buckets[(time / self.bucket_secs) as usize]
            .iter()
            .find(|e| e.time == time && e.key == key)
    }

    /// Stores `event` in its slot. Returns `true` if the slot for its
    /// origin was previously empty.
    fn put(&mut self, event: Event) -> bool {
        let bucket = &mut self.buckets[(event.time / self.bucket_secs) as usize];
        let origin = event.origin;
        let entry = match bucket
            .iter()
            .position(|e| e.time == event.time && e.key == event.state_key)
        {
            Some(pos) => &mut bucket[pos],
            None => {
                self.key_times
                    .entry(event.state_key.clone())
                    .or_default()
                    .insert(event.time);
                let pos = bucket.partition_point(|e| e.time <= event.time);
                bucket.insert(
                    pos,
                    Entry {
                        time: event.time,
                        key: event.state_key.clone(),
                        slot: Slot::default(),
                    },
                );
                &mut bucket[pos]
            }
        };
        entry.slot.get_mut(origin).replace(event).is_none()
    }

    fn check_event(&self, event: &Event) -> Result<(), ValidationError> {
        if event.time > self.horizon {
            return Err(ValidationError::BeyondHorizon {
                time: event.time,
                horizon: self.horizon,
            });
        }
        let fits = match event.new_value {
            StateValue::Int(_) => event.state_type.is_integer(),
            StateValue::Bool(_) => !event.state_type.is_integer(),
        };
        if fits {
            Ok(())
        } else {
            Err(ValidationError::ValueTypeMismatch {
                state_type: event.state_type,
                found: event.new_value.kind(),
            })
        }
    }
}
