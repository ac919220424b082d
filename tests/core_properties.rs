//! Clock, store, and aggregation properties over the public API.

mod common;

use std::time::Duration;

use smart_home_sim::error::{SimError, ValidationError};
use smart_home_sim::sim::clock::{Advance, Clock, SpeedBounds};
use smart_home_sim::sim::engine::AggregationEngine;
use smart_home_sim::sim::event::{Event, Origin, StateType, StateValue};
use smart_home_sim::sim::simulation::Simulation;
use smart_home_sim::sim::store::EventStore;
use smart_home_sim::sim::types::Rates;

use common::{DAY, config_for_days, door, door_scenario};

#[test]
fn speed_changes_never_move_time() {
    let mut clock = Clock::new(DAY, 60.0, SpeedBounds::default()).expect("valid clock");
    clock.advance(Duration::from_millis(1234));
    let before = clock.now();
    for speed in [1.0, 2.5, 60.0, 599.9, 3600.0] {
        clock.set_speed(speed).expect("in range");
        assert_eq!(clock.now(), before, "speed {speed}");
    }
    for bad in [0.0, -1.0, 3600.5, f64::NAN] {
        assert!(clock.set_speed(bad).is_err(), "speed {bad}");
    }
    assert_eq!(clock.speed(), 3600.0);
}

#[test]
fn clock_clamps_at_horizon() {
    let mut clock = Clock::new(1000, 3600.0, SpeedBounds::default()).expect("valid clock");
    assert_eq!(clock.advance(Duration::from_secs(1)), Advance::HorizonReached(1000));
    assert_eq!(clock.advance(Duration::from_secs(1)), Advance::HorizonReached(1000));
    clock.restart();
    assert_eq!(clock.now(), 0);
    assert_eq!(clock.speed(), 3600.0);
}

#[test]
fn restart_purges_user_events() {
    let sim = Simulation::new(&config_for_days(1), door_scenario()).expect("valid");
    sim.advance(Duration::from_secs(10)); // now = 600
    sim.set_boolean_state("backDoor", true, Some(700)).expect("accepted");
    sim.set_boolean_state("kitchenWindow1", true, None).expect("accepted");
    sim.set_thermostat(72).expect("accepted");
    assert_eq!(sim.event_counts().1, 3);

    sim.restart();
    assert_eq!(sim.now(), 0);
    assert_eq!(sim.event_counts().1, 0);
    sim.advance(Duration::from_secs(20));
    assert!(sim.events_since(None).iter().all(|e| e.origin == Origin::Pregenerated));
}

#[test]
fn user_event_wins_over_pregenerated_at_same_time() {
    let mut store = EventStore::new(DAY, 60);
    store
        .insert_pregenerated([door(100, "frontDoor", true)])
        .expect("loads");
    let user = Event::user(100, StateType::Door, "frontDoor", StateValue::Bool(false), "");
    store.insert_user(user, 50).expect("accepted");

    for at in [100, 101, 5000] {
        let current = store.current("frontDoor", at).expect("resolved");
        assert_eq!(current.origin, Origin::User);
        assert_eq!(current.new_value, StateValue::Bool(false));
    }
    let window = store.events_in_window(Some(99), 100, None);
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].origin, Origin::User);
}

#[test]
fn events_since_is_idempotent() {
    let sim = Simulation::new(&config_for_days(1), door_scenario()).expect("valid");
    sim.advance(Duration::from_secs(40)); // now = 2400
    let a = sim.events_since(Some(0));
    let b = sim.events_since(Some(0));
    assert_eq!(a, b);
    assert_eq!(a.len(), 1);
    assert!(a.windows(2).all(|w| w[0].time <= w[1].time));
}

#[test]
fn open_duration_sums_across_snapshot_boundaries() {
    let mut store = EventStore::new(DAY, 60);
    store
        .insert_pregenerated([door(100, "backDoor", true), door(5500, "backDoor", false)])
        .expect("loads");
    let mut engine = AggregationEngine::new(50.0, 70.0, Rates::default());

    let mut last = None;
    let mut total = 0;
    for end in [1800, 3600, 5400, 7200] {
        let events = store.events_in_window(last, end, None);
        total += engine.process_window(&events, end).door_open_secs;
        last = Some(end);
    }
    assert_eq!(total, 5400);
    let tracker = engine.trackers().get("backDoor").expect("tracked");
    assert_eq!(tracker.lifetime_secs(), 5400);
    assert!(!tracker.is_on());
}

#[test]
fn door_open_for_one_full_interval() {
    let mut store = EventStore::new(DAY, 60);
    store.insert_pregenerated(door_scenario()).expect("loads");
    let mut engine = AggregationEngine::seeded(&store, 50.0, 70.0, Rates::default());

    let snapshot = engine.process_window(&store.events_in_window(None, 1800, None), 1800);
    assert_eq!(snapshot.door_open_secs, 1800);
    // Outdoor air pulls the house down to 30 °F; the HVAC runs the whole
    // interval and recovers 30 °F of it.
    assert!((snapshot.indoor_temp_f - 60.0).abs() < 1e-9);
    assert!((snapshot.electricity_wh - 1750.0).abs() < 1e-6);
    assert!((snapshot.electricity_usd - 0.21).abs() < 1e-9);
}

#[test]
fn user_event_in_the_past_is_rejected() {
    let mut store = EventStore::new(DAY, 60);
    let event = Event::user(100, StateType::Door, "frontDoor", StateValue::Bool(true), "");
    assert_eq!(
        store.insert_user(event, 200),
        Err(SimError::Validation(ValidationError::CausalityViolation {
            time: 100,
            now: 200
        }))
    );
    assert_eq!(store.user_len(), 0);
}

#[test]
fn duplicate_pregenerated_key_aborts_load() {
    let mut store = EventStore::new(DAY, 60);
    let result = store.insert_pregenerated([
        door(10, "frontDoor", true),
        door(10, "frontDoor", false),
    ]);
    assert!(matches!(result, Err(SimError::DuplicateKey { time: 10, .. })));
    assert!(store.is_empty());
}

#[test]
fn user_correction_overwrites_previous_user_event() {
    let sim = Simulation::new(&config_for_days(1), door_scenario()).expect("valid");
    sim.set_boolean_state("garageCarDoor1", true, Some(300)).expect("accepted");
    sim.set_boolean_state("garageCarDoor1", false, Some(300)).expect("accepted");
    assert_eq!(sim.event_counts().1, 1);
    sim.advance(Duration::from_secs(5));
    assert_eq!(
        sim.current_value("garageCarDoor1"),
        Some(StateValue::Bool(false))
    );
}
