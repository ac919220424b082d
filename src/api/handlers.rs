//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};

use super::AppState;
use super::error::ApiError;
use super::types::{EventsQuery, RestartResponse, SpeedBody, UserEventRequest};
use crate::sim::event::Event;
use crate::sim::simulation::Constants;
use crate::sim::types::TimeReport;

/// `GET /constants` → 200 + `Constants` JSON
pub async fn get_constants(State(state): State<Arc<AppState>>) -> Json<Constants> {
    Json(state.sim.constants())
}

/// Restarts the run: app time to zero, user events purged, speed kept.
///
/// `POST /start` → 200 + `RestartResponse` JSON
pub async fn post_start(State(state): State<Arc<AppState>>) -> Json<RestartResponse> {
    let generation = state.sim.restart();
    Json(RestartResponse {
        generation,
        elapsed_secs: state.sim.now(),
    })
}

/// `GET /speed` → 200 + `SpeedBody` JSON
pub async fn get_speed(State(state): State<Arc<AppState>>) -> Json<SpeedBody> {
    Json(SpeedBody {
        speed: state.sim.speed(),
    })
}

/// `POST /speed` with `{"speed": s}` → 200 + `SpeedBody`, or 400 if out of range
pub async fn post_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeedBody>,
) -> Result<Json<SpeedBody>, ApiError> {
    state.sim.set_speed(body.speed)?;
    Ok(Json(SpeedBody {
        speed: state.sim.speed(),
    }))
}

/// Validates and stores one user event.
///
/// `POST /user-generated-event` → 200 + the stored `Event`, or 400 with the
/// validation failure
pub async fn post_user_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UserEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .sim
        .submit(&body.state_key, body.new_value, body.time)?;
    Ok(Json(event))
}

/// `GET /time` → 200 + `TimeReport` JSON
pub async fn get_time(State(state): State<Arc<AppState>>) -> Json<TimeReport> {
    Json(state.sim.current_time())
}

/// `GET /events?since=N` → 200 + `Vec<Event>` with `N < time <= now`
/// `GET /events?since=N` with `N` ahead of the clock → 400
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let now = state.sim.now();
    match query.since {
        Some(since) if since > now => {
            return Err(ApiError::BadRequest(format!(
                "`since` ({since}) is ahead of the current app time ({now})"
            )));
        }
        _ => {}
    }
    Ok(Json(state.sim.events_since(query.since)))
}
