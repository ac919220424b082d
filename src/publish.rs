//! Push boundary between the simulation and its clients.
//!
//! The simulation only knows the [`Publisher`] capability:
//! `publish(channel, payload)`. [`BroadcastPublisher`] fans envelopes out
//! to every subscriber over a [`tokio::sync::broadcast`] channel (the API
//! server's WebSocket clients); [`LogPublisher`] writes them to the log
//! for headless runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

/// Capacity of the broadcast channel.
///
/// A subscriber that falls more than this many envelopes behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
const BROADCAST_CAPACITY: usize = 1024;

/// Stream a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Clock readings, every real second.
    Time,
    /// Raw state-change events, every 30 app seconds.
    Event,
    /// Derived snapshots, every analysis interval.
    Analysis,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Event => "event",
            Self::Analysis => "analysis",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One published message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub channel: Channel,
    pub payload: serde_json::Value,
}

/// Fire-and-forget publication. Implementations must not block.
pub trait Publisher: Send + Sync {
    fn publish(&self, channel: Channel, payload: serde_json::Value);
}

/// Publishes to every subscriber of a broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<Envelope>,
}

impl BroadcastPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Subscribes to all envelopes published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for BroadcastPublisher {
    fn publish(&self, channel: Channel, payload: serde_json::Value) {
        // send only fails when nobody is subscribed.
        let _ = self.tx.send(Envelope { channel, payload });
    }
}

/// Writes every envelope to the log at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&self, channel: Channel, payload: serde_json::Value) {
        info!(channel = channel.as_str(), %payload, "publish");
    }
}
