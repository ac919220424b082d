//! End-to-end runs over generated household data.

mod common;

use std::time::Duration;

use smart_home_sim::io::export::write_snapshots;
use smart_home_sim::io::loader::{read_events, write_events};
use smart_home_sim::publish::Channel;
use smart_home_sim::sim::kpi::UsageReport;
use smart_home_sim::sim::replay::replay;
use smart_home_sim::sim::simulation::Simulation;

use common::{Collect, DAY, config_for_days, household, household_sim};

#[test]
fn three_day_replay_produces_plausible_usage() {
    let snapshots = replay(&household_sim(3, 42), None);
    assert_eq!(snapshots.len(), 3 * 48);

    let report = UsageReport::from_snapshots(&snapshots);
    assert_eq!(report.covered_secs, 3 * DAY);
    // The refrigerator alone draws 3.6 kWh a day.
    assert!(report.electricity_wh > 3.0 * 3600.0);
    assert!(report.water_gal > 0.0);
    assert!(report.door_open_secs > 0);
    assert!(report.min_indoor_f > 20.0 && report.max_indoor_f < 100.0);
    assert!((report.total_usd - (report.electricity_usd + report.water_usd)).abs() < 1e-9);
}

#[test]
fn csv_round_trip_reproduces_the_run() {
    let events = household(2, 5);
    let mut csv = Vec::new();
    write_events(&events, &mut csv).expect("write to vec");
    let reloaded = read_events(csv.as_slice()).expect("reload");
    assert_eq!(reloaded, events);

    let cfg = config_for_days(2);
    let a = replay(&Simulation::new(&cfg, events).expect("valid"), None);
    let b = replay(&Simulation::new(&cfg, reloaded).expect("valid"), None);
    assert_eq!(a, b);

    let mut out = Vec::new();
    write_snapshots(&a, &mut out).expect("write to vec");
    assert_eq!(String::from_utf8(out).expect("utf-8").lines().count(), 97);
}

#[test]
fn user_events_change_the_outcome_and_restart_forgets_them() {
    let sim = household_sim(1, 9);
    let baseline = replay(&sim, None);

    sim.restart();
    sim.set_boolean_state("bedroom1Window1", true, Some(3600)).expect("accepted");
    sim.set_boolean_state("bedroom1Window1", false, Some(7200)).expect("accepted");
    let windowed = replay(&sim, None);
    assert_eq!(windowed[2].window_open_secs + windowed[3].window_open_secs, 3600);
    assert_ne!(windowed, baseline);

    sim.restart();
    assert_eq!(replay(&sim, None), baseline);
}

#[test]
fn publishers_deliver_each_window_once() {
    let sim = household_sim(1, 3);
    let out = Collect::default();
    for _ in 0..120 {
        sim.advance(Duration::from_secs(10)); // 600 app s per step
        sim.publish_time(&out);
        sim.publish_events(&out);
        sim.publish_snapshots(&out);
    }

    let batches = out.on(Channel::Event);
    let delivered: usize = batches
        .iter()
        .map(|b| b.as_array().map_or(0, Vec::len))
        .sum();
    assert_eq!(delivered, sim.events_since(None).len());

    let ends: Vec<u64> = out
        .on(Channel::Analysis)
        .iter()
        .filter_map(|s| s["window_end"].as_u64())
        .collect();
    assert_eq!(ends.len(), 40);
    assert!(ends.windows(2).all(|w| w[1] == w[0] + 1800));
    assert_eq!(out.on(Channel::Time).len(), 120);
}
