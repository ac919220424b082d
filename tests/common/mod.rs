//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use smart_home_sim::config::ScenarioConfig;
use smart_home_sim::home::{OUTDOOR_TEMP, THERMOSTAT_TEMP};
use smart_home_sim::io::generator::HouseholdGenerator;
use smart_home_sim::publish::{Channel, Envelope, Publisher};
use smart_home_sim::sim::event::{Event, StateType, StateValue};
use smart_home_sim::sim::simulation::Simulation;

pub const DAY: u64 = 86_400;

/// Baseline scenario cut down to `days` days (horizon and generator).
pub fn config_for_days(days: u64) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.simulation.horizon_secs = days * DAY;
    cfg.generator.days = days;
    cfg
}

/// Outdoor 30 °F, thermostat 70 °F, front door open over `[0, 1800]`.
pub fn door_scenario() -> Vec<Event> {
    vec![
        temp(0, OUTDOOR_TEMP, 30),
        temp(0, THERMOSTAT_TEMP, 70),
        door(0, "frontDoor", true),
        door(1800, "frontDoor", false),
    ]
}

pub fn temp(time: u64, key: &str, value: i64) -> Event {
    Event::pregenerated(time, StateType::Temp, key, StateValue::Int(value), "")
}

pub fn door(time: u64, key: &str, open: bool) -> Event {
    Event::pregenerated(time, StateType::Door, key, StateValue::Bool(open), "")
}

/// Generated household events for `days` days.
pub fn household(days: u64, seed: u64) -> Vec<Event> {
    HouseholdGenerator::new(seed, days, days * DAY).generate()
}

/// A simulation over `days` generated days.
pub fn household_sim(days: u64, seed: u64) -> Simulation {
    Simulation::new(&config_for_days(days), household(days, seed))
        .expect("generated events load")
}

/// Publisher that records every envelope.
#[derive(Default)]
pub struct Collect(pub Mutex<Vec<Envelope>>);

impl Collect {
    pub fn on(&self, channel: Channel) -> Vec<serde_json::Value> {
        self.0
            .lock()
            .expect("collector lock")
            .iter()
            .filter(|e| e.channel == channel)
            .map(|e| e.payload.clone())
            .collect()
    }
}

impl Publisher for Collect {
    fn publish(&self, channel: Channel, payload: serde_json::Value) {
        self.0
            .lock()
            .expect("collector lock")
            .push(Envelope { channel, payload });
    }
}
