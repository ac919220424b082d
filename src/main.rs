//! Smart home simulator entry point: CLI wiring, offline replay, and the
//! live scheduler.

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use smart_home_sim::config::ScenarioConfig;
use smart_home_sim::io::export::export_snapshots;
use smart_home_sim::io::generator::HouseholdGenerator;
use smart_home_sim::io::loader::{load_events, save_events};
use smart_home_sim::publish::{LogPublisher, Publisher};
use smart_home_sim::scheduler::{Cadence, Scheduler};
use smart_home_sim::sim::event::Event;
use smart_home_sim::sim::kpi::UsageReport;
use smart_home_sim::sim::replay::replay;
use smart_home_sim::sim::simulation::Simulation;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    events_path: Option<String>,
    events_out: Option<String>,
    seed_override: Option<u64>,
    speed_override: Option<f64>,
    replay: bool,
    until: Option<u64>,
    snapshots_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("smart-home-sim - smart home state and utility usage simulator");
    eprintln!();
    eprintln!("Usage: smart-home-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, fast_forward, short_run)");
    eprintln!("  --events <path>          Load pre-generated events from CSV instead of generating");
    eprintln!("  --events-out <path>      Write the pre-generated events to CSV");
    eprintln!("  --seed <u64>             Override the generator seed");
    eprintln!("  --speed <f64>            Override the start speed (app s per real s)");
    eprintln!("  --replay                 Run offline as fast as possible and print a usage report");
    eprintln!("  --until <secs>           Stop the replay at this app time");
    eprintln!("  --snapshots-out <path>   Export replay snapshots to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Serve the HTTP/WebSocket API while running live");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Without --replay the simulation runs live until the horizon or Ctrl-C.");
}

/// Returns the value following flag `args[*i]`, or exits with an error.
fn flag_value<'a>(args: &'a [String], i: &mut usize, what: &str) -> &'a str {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i) {
        Some(v) => v,
        None => {
            eprintln!("error: {flag} requires {what}");
            process::exit(1);
        }
    }
}

/// Parses the value following a flag, or exits with an error.
fn parsed_value<T: std::str::FromStr>(args: &[String], i: &mut usize, what: &str) -> T {
    let flag = args[*i].clone();
    let raw = flag_value(args, i, what);
    raw.parse().unwrap_or_else(|_| {
        eprintln!("error: {flag} value \"{raw}\" is not {what}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        events_path: None,
        events_out: None,
        seed_override: None,
        speed_override: None,
        replay: false,
        until: None,
        snapshots_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path = Some(flag_value(&args, &mut i, "a path argument").into());
            }
            "--preset" => {
                cli.preset = Some(flag_value(&args, &mut i, "a name argument").into());
            }
            "--events" => {
                cli.events_path = Some(flag_value(&args, &mut i, "a path argument").into());
            }
            "--events-out" => {
                cli.events_out = Some(flag_value(&args, &mut i, "a path argument").into());
            }
            "--seed" => cli.seed_override = Some(parsed_value(&args, &mut i, "a valid u64")),
            "--speed" => cli.speed_override = Some(parsed_value(&args, &mut i, "a valid number")),
            "--replay" => cli.replay = true,
            "--until" => cli.until = Some(parsed_value(&args, &mut i, "a valid u64")),
            "--snapshots-out" => {
                cli.snapshots_out = Some(flag_value(&args, &mut i, "a path argument").into());
            }
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => cli.port = parsed_value(&args, &mut i, "a valid u16"),
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Loads the scenario: `--scenario` takes priority, then `--preset`, then baseline.
fn load_scenario(cli: &CliArgs) -> ScenarioConfig {
    let loaded = if let Some(ref path) = cli.scenario_path {
        ScenarioConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed_override {
        scenario.generator.seed = seed;
    }
    if let Some(speed) = cli.speed_override {
        scenario.simulation.start_speed = speed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    scenario
}

/// Pre-generated events from `--events`, or from the seeded generator.
fn pregenerated_events(cli: &CliArgs, scenario: &ScenarioConfig) -> Vec<Event> {
    let events = match cli.events_path {
        Some(ref path) => load_events(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            process::exit(1);
        }),
        None => HouseholdGenerator::new(
            scenario.generator.seed,
            scenario.generator.days,
            scenario.simulation.horizon_secs,
        )
        .generate(),
    };

    if let Some(ref path) = cli.events_out {
        if let Err(e) = save_events(&events, Path::new(path)) {
            eprintln!("error: failed to write events CSV: {e}");
            process::exit(1);
        }
        eprintln!("Events written to {path}");
    }
    events
}

fn run_replay(cli: &CliArgs, sim: &Simulation) {
    let snapshots = replay(sim, cli.until);
    for s in &snapshots {
        println!("{s}");
    }
    println!("\n{}", UsageReport::from_snapshots(&snapshots));

    if let Some(ref path) = cli.snapshots_out {
        if let Err(e) = export_snapshots(&snapshots, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Snapshots written to {path}");
    }
}

/// Resolves once the simulation reaches its horizon.
async fn finished(sim: Arc<Simulation>) {
    let mut poll = tokio::time::interval(Duration::from_secs(1));
    while !sim.is_finished() {
        poll.tick().await;
    }
}

async fn run_live(cli: CliArgs, scenario: ScenarioConfig, sim: Arc<Simulation>) {
    let cadence = Cadence::from_config(&scenario);

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;

        use smart_home_sim::api::{AppState, serve};
        use smart_home_sim::publish::BroadcastPublisher;

        let publisher = BroadcastPublisher::new();
        let scheduler = Scheduler::spawn(
            Arc::clone(&sim),
            Arc::new(publisher.clone()),
            cadence,
        );
        let state = Arc::new(AppState { sim, publisher });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        tokio::select! {
            result = serve(state, addr) => {
                if let Err(e) = result {
                    tracing::error!("API server failed: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => info!("interrupted"),
        }
        scheduler.shutdown().await;
        return;
    }
    #[cfg(not(feature = "api"))]
    let _ = cli;

    let publisher: Arc<dyn Publisher> = Arc::new(LogPublisher);
    let scheduler = Scheduler::spawn(Arc::clone(&sim), publisher, cadence);
    tokio::select! {
        _ = finished(Arc::clone(&sim)) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }
    scheduler.shutdown().await;
    info!(now = sim.now(), finished = sim.is_finished(), "live run ended");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let scenario = load_scenario(&cli);
    let events = pregenerated_events(&cli, &scenario);

    let sim = Simulation::new(&scenario, events).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    if cli.replay {
        run_replay(&cli, &sim);
        return;
    }

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });
    rt.block_on(run_live(cli, scenario, Arc::new(sim)));
}
