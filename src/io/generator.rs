//! Synthetic pre-generated events for a family of four.
//!
//! App time zero is midnight on a Monday. The generator writes an initial
//! state for every key, an hourly outdoor temperature, and a weekday or
//! weekend routine per day. Writing the same `(time, key)` twice keeps the
//! last value, so the output is always loadable.

use std::collections::HashMap;

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::home::{DEVICES, OUTDOOR_TEMP, THERMOSTAT_TEMP, device, message_for};
use crate::sim::event::{Event, StateType, StateValue};

const MINUTE: u64 = 60;
const HOUR: u64 = 3600;
const DAY: u64 = 86_400;
const WEEK: u64 = 7 * DAY;

/// Mean outdoor temperature (°F).
const OUTDOOR_MEAN_F: f64 = 48.0;
/// Half the day/night swing (°F).
const OUTDOOR_DIURNAL_AMP_F: f64 = 10.0;
/// Half the multi-day weather swing (°F).
const OUTDOOR_WEATHER_AMP_F: f64 = 6.0;
/// Period of the weather swing (days).
const OUTDOOR_WEATHER_PERIOD_DAYS: f64 = 7.3;
const OUTDOOR_NOISE_STD_F: f64 = 1.5;
const DEFAULT_THERMOSTAT_F: i64 = 70;

const ADULT_LIGHTS: &[&str] = &[
    "bedroom1OverheadLight",
    "bedroom1Lamp1",
    "bedroom1Lamp2",
    "bathroom1OverheadLight",
];
const KID_LIGHTS: &[&str] = &[
    "bedroom2OverheadLight",
    "bedroom2Lamp1",
    "bedroom2Lamp2",
    "bedroom3OverheadLight",
    "bedroom3Lamp1",
    "bedroom3Lamp2",
    "bathroom2OverheadLight",
];
const SHARED_LIGHTS: &[&str] = &[
    "livingRoomOverheadLight",
    "livingRoomLamp1",
    "livingRoomLamp2",
    "kitchenOverheadLight",
];

/// Which bedroom/bathroom lights a routine step touches.
#[derive(Debug, Clone, Copy)]
enum Occupants {
    Adults,
    Kids,
    All,
}

impl Occupants {
    fn lights(self) -> Vec<&'static str> {
        match self {
            Self::Adults => ADULT_LIGHTS.to_vec(),
            Self::Kids => KID_LIGHTS.to_vec(),
            Self::All => ADULT_LIGHTS.iter().chain(KID_LIGHTS).copied().collect(),
        }
    }
}

/// Seeded household routine generator.
///
/// # Examples
///
/// ```
/// use smart_home_sim::io::generator::HouseholdGenerator;
///
/// let events = HouseholdGenerator::new(42, 1, 86_400).generate();
/// assert!(events.iter().any(|e| e.state_key == "frontDoor"));
/// assert!(events.iter().all(|e| e.time <= 86_400));
/// ```
#[derive(Debug, Clone)]
pub struct HouseholdGenerator {
    rng: StdRng,
    days: u64,
    horizon: u64,
    events: Vec<Event>,
    index: HashMap<(u64, &'static str), usize>,
}

impl HouseholdGenerator {
    /// # Arguments
    ///
    /// * `seed` - Random seed for reproducible output
    /// * `days` - Number of days of activity to generate
    /// * `horizon` - Latest app time an event may carry; later events are dropped
    pub fn new(seed: u64, days: u64, horizon: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            days,
            horizon,
            events: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Generates the full event set, sorted by time.
    pub fn generate(mut self) -> Vec<Event> {
        self.outdoor_temps();
        self.initial_state();
        for day in 0..self.days {
            let start = day * DAY;
            let weekend = day % 7 >= 5;
            self.doors(start, weekend);
            self.cooking(start, weekend);
            self.microwave(start, weekend);
            self.tvs(start, weekend);
            self.bathing(start, weekend);
            self.lights(start, weekend);
        }
        for week in 0..self.days.div_ceil(7) {
            self.dishwasher(week * WEEK);
            self.laundry(week * WEEK);
        }

        let mut events = self.events;
        events.sort_by_key(|e| e.time);
        debug!(count = events.len(), days = self.days, "generated events");
        events
    }

    fn initial_state(&mut self) {
        for d in DEVICES.iter().filter(|d| !d.state_type.is_integer()) {
            let on = d.key == "kitchenRefrigerator";
            self.write(0, d.key, d.state_type, StateValue::Bool(on));
        }
        self.write(
            0,
            THERMOSTAT_TEMP,
            StateType::Temp,
            StateValue::Int(DEFAULT_THERMOSTAT_F),
        );
    }

    fn outdoor_temps(&mut self) {
        let hours = self.days * 24;
        for h in 0..hours.max(1) {
            let hour_of_day = (h % 24) as f64;
            let day = h as f64 / 24.0;
            let diurnal =
                (2.0 * std::f64::consts::PI * (hour_of_day - 9.0) / 24.0).sin() * OUTDOOR_DIURNAL_AMP_F;
            let weather = (2.0 * std::f64::consts::PI * day / OUTDOOR_WEATHER_PERIOD_DAYS).sin()
                * OUTDOOR_WEATHER_AMP_F;
            let noise = self.gaussian() * OUTDOOR_NOISE_STD_F;
            let f = (OUTDOOR_MEAN_F + diurnal + weather + noise).round() as i64;
            self.write(h * HOUR, OUTDOOR_TEMP, StateType::Temp, StateValue::Int(f));
        }
    }

    fn doors(&mut self, day: u64, weekend: bool) {
        if weekend {
            self.door_trips(day + 7 * HOUR, day + 22 * HOUR, 32, None);
        } else {
            let morning = day + 7 * HOUR + 15 * MINUTE;
            self.door_trips(morning, morning + 30 * MINUTE, 2, Some(false));
            self.door_trips(morning, morning + 30 * MINUTE, 2, Some(true));
            let kids = day + 15 * HOUR + 45 * MINUTE;
            self.door_trips(kids, kids + 30 * MINUTE, 2, Some(false));
            let adults = day + 17 * HOUR + 15 * MINUTE;
            self.door_trips(adults, adults + 30 * MINUTE, 2, Some(true));
            self.door_trips(day + 18 * HOUR, day + 20 * HOUR, 8, None);
        }
    }

    /// `count` 30-second door openings. `garage = None` picks the garage
    /// one time in five.
    fn door_trips(&mut self, t0: u64, t1: u64, count: usize, garage: Option<bool>) {
        for _ in 0..count {
            let garage = garage.unwrap_or_else(|| self.rng.random::<f64>() < 0.2);
            if garage {
                let car_door = self.pick(&["garageCarDoor1", "garageCarDoor2"]);
                self.span(t0, t1, 30, car_door, None, Some("garageHouseDoor"));
            } else {
                let door = self.pick(&["frontDoor", "backDoor"]);
                self.span(t0, t1, 30, door, None, None);
            }
        }
    }

    fn cooking(&mut self, day: u64, weekend: bool) {
        if weekend {
            self.span(day + 17 * HOUR, day + 19 * HOUR, 30 * MINUTE, "kitchenStove", None, None);
            self.span(day + 16 * HOUR, day + 19 * HOUR, HOUR, "kitchenOven", None, None);
        } else {
            let t0 = day + 17 * HOUR + 45 * MINUTE;
            self.span(t0, day + 19 * HOUR, 15 * MINUTE, "kitchenStove", None, None);
            self.span(t0, day + 19 * HOUR, 45 * MINUTE, "kitchenOven", None, None);
        }
    }

    fn microwave(&mut self, day: u64, weekend: bool) {
        let windows: Vec<(u64, u64)> = if weekend {
            vec![(7 * HOUR, 22 * HOUR); 6]
        } else {
            vec![
                (5 * HOUR, 6 * HOUR),
                (6 * HOUR, 7 * HOUR + 15 * MINUTE),
                (16 * HOUR + 15 * MINUTE, 16 * HOUR + 45 * MINUTE),
                (16 * HOUR + 45 * MINUTE, 17 * HOUR + 15 * MINUTE),
            ]
        };
        for (t0, t1) in windows {
            self.span(day + t0, day + t1, 5 * MINUTE, "kitchenMicrowave", None, None);
        }
    }

    fn tvs(&mut self, day: u64, weekend: bool) {
        if weekend {
            self.span(day + 7 * HOUR, day + 22 * HOUR, 8 * HOUR, "livingRoomTv", None, None);
            self.span(day + 6 * HOUR, day + 10 * HOUR, 2 * HOUR, "bedroom1Tv", None, None);
        } else {
            let t0 = day + 16 * HOUR + 45 * MINUTE;
            self.span(t0, day + 22 * HOUR, 4 * HOUR, "livingRoomTv", None, None);
        }
        self.span(day + 19 * HOUR, day + 22 * HOUR, 2 * HOUR, "bedroom1Tv", None, None);
    }

    fn bathing(&mut self, day: u64, weekend: bool) {
        const BATH1: (&str, &str) = ("bathroom1Faucet", "bathroom1ExhaustFan");
        const BATH2: (&str, &str) = ("bathroom2Faucet", "bathroom2ExhaustFan");
        let wash = |this: &mut Self,
                    t0: u64,
                    t1: u64,
                    (faucet, fan): (&'static str, &'static str),
                    kind: StateType| {
            this.span(day + t0, day + t1, 15 * MINUTE, faucet, Some(kind), Some(fan));
        };
        if weekend {
            wash(self, 6 * HOUR, 7 * HOUR, BATH1, StateType::Shower);
            wash(self, 7 * HOUR, 8 * HOUR, BATH2, StateType::Shower);
            wash(self, 11 * HOUR, 12 * HOUR, BATH1, StateType::Shower);
            wash(self, 12 * HOUR, 13 * HOUR, BATH1, StateType::Bath);
        } else {
            wash(self, 5 * HOUR + 30 * MINUTE, 6 * HOUR + 15 * MINUTE, BATH1, StateType::Shower);
            wash(self, 6 * HOUR + 15 * MINUTE, 7 * HOUR, BATH2, StateType::Shower);
        }
        wash(self, 18 * HOUR, 19 * HOUR, BATH1, StateType::Bath);
        wash(self, 19 * HOUR, 20 * HOUR, BATH2, StateType::Bath);
    }

    fn dishwasher(&mut self, week: u64) {
        for day in self.run_days() {
            let start = week + day * DAY;
            self.span(
                start + 19 * HOUR,
                start + 22 * HOUR,
                45 * MINUTE,
                "kitchenDishWasher",
                None,
                None,
            );
        }
    }

    /// Washer runs 30 minutes; the dryer follows 30 minutes later.
    fn laundry(&mut self, week: u64) {
        for day in self.run_days() {
            let start = week + day * DAY;
            let from = if day < 5 { 19 * HOUR } else { 8 * HOUR };
            self.span(
                start + from,
                start + 22 * HOUR,
                30 * MINUTE,
                "clothesWasher",
                None,
                Some("clothesDryer"),
            );
        }
    }

    fn lights(&mut self, day: u64, weekend: bool) {
        if weekend {
            self.room_lights(day + 6 * HOUR, 15 * MINUTE, Occupants::All, true);
            self.shared_lights(day + 8 * HOUR, 15 * MINUTE, true);
            self.random_light_changes(day + 8 * HOUR + 15 * MINUTE, day + 17 * HOUR);
            self.shared_lights(day + 17 * HOUR, 30 * MINUTE, true);
            self.room_lights(day + 20 * HOUR, 30 * MINUTE, Occupants::All, true);
            self.all_lights_off(day + 22 * HOUR, 30 * MINUTE);
        } else {
            self.room_lights(day + 5 * HOUR, 15 * MINUTE, Occupants::Adults, true);
            let t = day + 5 * HOUR + 15 * MINUTE;
            self.shared_lights(t, 15 * MINUTE, true);
            self.room_lights(t, 15 * MINUTE, Occupants::Adults, false);
            self.room_lights(day + 6 * HOUR, 15 * MINUTE, Occupants::Kids, true);
            self.all_lights_off(day + 7 * HOUR + 15 * MINUTE, 15 * MINUTE);
            self.shared_lights(day + 16 * HOUR, 15 * MINUTE, true);
            self.random_light_changes(day + 16 * HOUR + 15 * MINUTE, day + 20 * HOUR);
            self.room_lights(day + 20 * HOUR, 15 * MINUTE, Occupants::All, true);
            let t = day + 20 * HOUR + 30 * MINUTE;
            self.room_lights(t, 15 * MINUTE, Occupants::Kids, false);
            self.shared_lights(t, 15 * MINUTE, false);
            self.room_lights(day + 22 * HOUR + 30 * MINUTE, 15 * MINUTE, Occupants::Adults, false);
        }
    }

    fn room_lights(&mut self, t0: u64, within: u64, who: Occupants, on: bool) {
        for key in who.lights() {
            let t = self.rng.random_range(t0..=t0 + within);
            self.boolean(t, key, on);
        }
    }

    fn shared_lights(&mut self, t0: u64, within: u64, on: bool) {
        for &key in SHARED_LIGHTS {
            let t = self.rng.random_range(t0..=t0 + within);
            self.boolean(t, key, on);
        }
    }

    fn all_lights_off(&mut self, t0: u64, within: u64) {
        self.room_lights(t0, within, Occupants::All, false);
        self.shared_lights(t0, within, false);
    }

    /// Every 15 minutes each light has a 20% chance of a random switch.
    fn random_light_changes(&mut self, t0: u64, t1: u64) {
        let mut lights = Occupants::All.lights();
        lights.extend_from_slice(SHARED_LIGHTS);
        for t in (t0..t1).step_by((15 * MINUTE) as usize) {
            for &key in &lights {
                if self.rng.random::<f64>() < 0.2 {
                    let on = self.rng.random::<bool>();
                    self.boolean(t, key, on);
                }
            }
        }
    }

    /// An on/off pair of `duration` starting at a random time in `[t0, t1]`.
    /// A `follower` key runs alongside; the clothes dryer starts 30 minutes late.
    fn span(
        &mut self,
        t0: u64,
        t1: u64,
        duration: u64,
        key: &'static str,
        state_type: Option<StateType>,
        follower: Option<&'static str>,
    ) {
        let start = self.rng.random_range(t0..=t1);
        let stop = start + duration;
        let Some(state_type) = state_type.or_else(|| device(key).map(|d| d.state_type)) else {
            return;
        };
        self.write(start, key, state_type, StateValue::Bool(true));
        self.write(stop, key, state_type, StateValue::Bool(false));

        if let Some(follower) = follower {
            let offset = if follower == "clothesDryer" { 30 * MINUTE } else { 0 };
            self.boolean(start + offset, follower, true);
            self.boolean(stop + offset, follower, false);
        }
    }

    /// Four distinct days of the week.
    fn run_days(&mut self) -> Vec<u64> {
        let mut days: Vec<u64> = (0..7).collect();
        for i in 0..4 {
            let j = self.rng.random_range(i..7);
            days.swap(i, j);
        }
        days.truncate(4);
        days
    }

    fn pick(&mut self, keys: &[&'static str]) -> &'static str {
        keys[self.rng.random_range(0..keys.len())]
    }

    fn boolean(&mut self, time: u64, key: &'static str, on: bool) {
        if let Some(d) = device(key) {
            self.write(time, key, d.state_type, StateValue::Bool(on));
        }
    }

    fn write(&mut self, time: u64, key: &'static str, state_type: StateType, value: StateValue) {
        if time > self.horizon {
            return;
        }
        let message = message_for(key, state_type, value);
        let event = Event::pregenerated(time, state_type, key, value, message);
        match self.index.get(&(time, key)) {
            Some(&i) => self.events[i] = event,
            None => {
                self.index.insert((time, key), self.events.len());
                self.events.push(event);
            }
        }
    }

    /// Box-Muller standard normal sample.
    fn gaussian(&mut self) -> f64 {
        let u1: f64 = self.rng.random::<f64>().clamp(1e-12, 1.0);
        let u2: f64 = self.rng.random::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}
