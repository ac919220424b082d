//! Periodic tasks that drive a live simulation.
//!
//! Four independent tokio tasks share one [`Simulation`]:
//!
//! 1. the clock driver advances app time on every wall-clock tick,
//! 2. the time publisher reports the clock every real second,
//! 3. the event publisher delivers raw events every 30 app seconds,
//! 4. the analysis publisher delivers snapshots every analysis interval.
//!
//! The publishers recompute their real delay from the current speed on
//! every cycle, so speed changes take effect after at most one wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ScenarioConfig;
use crate::publish::Publisher;
use crate::sim::simulation::Simulation;

/// Wall-clock cadences of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    /// Clock driver tick.
    pub tick: Duration,
    /// Time publication period.
    pub time_publish: Duration,
}

impl Cadence {
    pub fn from_config(config: &ScenarioConfig) -> Self {
        Self {
            tick: Duration::from_millis(config.simulation.tick_ms.max(1)),
            time_publish: Duration::from_secs_f64(
                config.schedule.time_publish_real_secs.max(0.001),
            ),
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::from_config(&ScenarioConfig::default())
    }
}

/// Handle to the running tasks.
#[derive(Debug)]
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns the four periodic tasks on the current tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `sim` - Shared simulation
    /// * `publisher` - Destination of every published payload
    /// * `cadence` - Wall-clock tick and time publication periods
    pub fn spawn(sim: Arc<Simulation>, publisher: Arc<dyn Publisher>, cadence: Cadence) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let handles = vec![
            tokio::spawn(drive_clock(Arc::clone(&sim), cadence.tick, rx.clone())),
            tokio::spawn(publish_time(
                Arc::clone(&sim),
                Arc::clone(&publisher),
                cadence.time_publish,
                rx.clone(),
            )),
            tokio::spawn(publish_events(
                Arc::clone(&sim),
                Arc::clone(&publisher),
                rx.clone(),
            )),
            tokio::spawn(publish_snapshots(sim, publisher, rx)),
        ];
        info!(tick_ms = cadence.tick.as_millis() as u64, "scheduler started");
        Self { shutdown, handles }
    }

    /// Stops every task and waits for them to finish.
    pub async fn shutdown(self) {
        // Receivers also stop when the sender is dropped.
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("scheduler task failed: {e}");
            }
        }
        info!("scheduler stopped");
    }
}

async fn drive_clock(sim: Arc<Simulation>, tick: Duration, mut stop: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                sim.advance(now - last);
                last = now;
            }
            _ = stop.changed() => break,
        }
    }
    debug!("clock driver stopped");
}

async fn publish_time(
    sim: Arc<Simulation>,
    publisher: Arc<dyn Publisher>,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => sim.publish_time(publisher.as_ref()),
            _ = stop.changed() => break,
        }
    }
    debug!("time publisher stopped");
}

async fn publish_events(
    sim: Arc<Simulation>,
    publisher: Arc<dyn Publisher>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let delay = sim.real_interval(sim.event_interval_secs());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                sim.publish_events(publisher.as_ref());
            }
            _ = stop.changed() => break,
        }
    }
    debug!("event publisher stopped");
}

async fn publish_snapshots(
    sim: Arc<Simulation>,
    publisher: Arc<dyn Publisher>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let delay = sim.real_interval(sim.analysis_interval_secs());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                sim.publish_snapshots(publisher.as_ref());
            }
            _ = stop.changed() => break,
        }
    }
    debug!("analysis publisher stopped");
}
