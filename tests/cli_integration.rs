//! Runs the binary the way a user would.

use std::path::PathBuf;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_smart-home-sim"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("smart-home-sim process should run")
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("smart-home-sim-{}-{name}", std::process::id()))
}

fn parse_metric(stdout: &str, label: &str) -> String {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing line `{label}` in output: {stdout}"));
    line.split_once(':')
        .map(|(_, right)| right.trim().to_string())
        .unwrap_or_else(|| panic!("invalid format for line `{line}`"))
}

#[test]
fn replay_prints_report_and_exports_snapshots() {
    let csv = temp_path("snapshots.csv");
    let csv_arg = csv.to_string_lossy().to_string();
    let output = run(&[
        "--preset",
        "short_run",
        "--replay",
        "--until",
        "86400",
        "--snapshots-out",
        &csv_arg,
    ]);
    assert!(
        output.status.success(),
        "replay failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("--- Usage Report ---"));
    let total = parse_metric(&stdout, "Total cost:");
    let dollars: f64 = total
        .trim_start_matches('$')
        .parse()
        .unwrap_or_else(|_| panic!("bad total `{total}`"));
    assert!(dollars > 0.0);

    let exported = std::fs::read_to_string(&csv).expect("snapshot CSV written");
    assert_eq!(exported.lines().count(), 49);
    let _ = std::fs::remove_file(&csv);
}

#[test]
fn same_seed_same_report_different_seed_different_report() {
    let args = ["--preset", "short_run", "--replay", "--until", "172800", "--seed"];
    let report = |seed: &str| {
        let mut all = args.to_vec();
        all.push(seed);
        let output = run(&all);
        assert!(output.status.success());
        String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
    };
    let a = report("1");
    assert_eq!(a, report("1"));
    assert_ne!(
        parse_metric(&a, "Electricity:"),
        parse_metric(&report("2"), "Electricity:")
    );
}

#[test]
fn events_written_by_one_run_load_into_another() {
    let events = temp_path("events.csv");
    let events_arg = events.to_string_lossy().to_string();
    let first = run(&[
        "--preset",
        "short_run",
        "--replay",
        "--until",
        "3600",
        "--events-out",
        &events_arg,
    ]);
    assert!(first.status.success());

    let second = run(&[
        "--preset",
        "short_run",
        "--replay",
        "--until",
        "3600",
        "--events",
        &events_arg,
    ]);
    assert!(
        second.status.success(),
        "reload failed: stderr={}",
        String::from_utf8_lossy(&second.stderr)
    );
    assert_eq!(first.stdout, second.stdout);
    let _ = std::fs::remove_file(&events);
}

#[test]
fn scenario_file_is_loaded_and_validated() {
    let good = temp_path("good.toml");
    std::fs::write(
        &good,
        "[simulation]\nhorizon_secs = 86400\n\n[generator]\ndays = 1\nseed = 3\n",
    )
    .expect("write scenario");
    let output = run(&["--scenario", &good.to_string_lossy(), "--replay"]);
    assert!(
        output.status.success(),
        "scenario run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(parse_metric(&stdout, "Snapshots:").starts_with("48 "));

    let bad = temp_path("bad.toml");
    std::fs::write(&bad, "[simulation]\nstart_speed = 0.0\n").expect("write scenario");
    let output = run(&["--scenario", &bad.to_string_lossy(), "--replay"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("simulation.start_speed"));

    let _ = std::fs::remove_file(&good);
    let _ = std::fs::remove_file(&bad);
}

#[test]
fn unknown_arguments_and_presets_fail() {
    assert!(!run(&["--bogus"]).status.success());
    let output = run(&["--preset", "nope", "--replay"]);
    assert!(!output.status.success());
}
