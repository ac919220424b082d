//! HTTP and WebSocket API over a live simulation.
//!
//! Routes:
//! - `GET /constants` - fixed ranges and cadences
//! - `POST /start` - restart the run
//! - `GET|POST /speed` - read or change the speed multiplier
//! - `POST /user-generated-event` - submit a user event
//! - `GET /time` - current clock reading
//! - `GET /events?since=N` - resolved events with `N < time <= now`
//! - `GET /ws` - stream of published envelopes

mod error;
mod handlers;
mod types;
mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::publish::BroadcastPublisher;
use crate::sim::simulation::Simulation;

pub use error::ApiError;
pub use types::{EventsQuery, RestartResponse, SpeedBody, UserEventRequest};

/// Application state shared across all request handlers.
pub struct AppState {
    /// The live simulation, also driven by the scheduler.
    pub sim: Arc<Simulation>,
    /// Hub the scheduler publishes into; WebSocket clients subscribe here.
    pub publisher: BroadcastPublisher,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/constants", get(handlers::get_constants))
        .route("/start", post(handlers::post_start))
        .route("/speed", get(handlers::get_speed).post(handlers::post_speed))
        .route("/user-generated-event", post(handlers::post_user_event))
        .route("/time", get(handlers::get_time))
        .route("/events", get(handlers::get_events))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or serving fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
