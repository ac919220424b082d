//! API flow against a live simulation, driven through the router.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt;

use smart_home_sim::api::{AppState, router};
use smart_home_sim::publish::{BroadcastPublisher, Channel};

use common::household_sim;

fn state() -> Arc<AppState> {
    Arc::new(AppState {
        sim: Arc::new(household_sim(1, 42)),
        publisher: BroadcastPublisher::new(),
    })
}

async fn call(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router(Arc::clone(state)).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn user_event_flows_to_events_and_broadcast() {
    let state = state();
    let mut rx = state.publisher.subscribe();
    state.sim.advance(Duration::from_secs(60)); // now = 3600

    let (status, event) = call(
        &state,
        post(
            "/user-generated-event",
            r#"{"state_key": "frontDoor", "new_value": true, "time": 3660}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["message"], "Front Door is OPEN");

    state.sim.advance(Duration::from_secs(2)); // now = 3720
    let (status, events) = call(&state, get("/events?since=3600")).await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().cloned().unwrap_or_default();
    assert!(
        events
            .iter()
            .any(|e| e["origin"] == "user" && e["state_key"] == "frontDoor" && e["time"] == 3660)
    );

    state.sim.publish_events(&state.publisher);
    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.channel, Channel::Event);
    assert!(envelope.payload.as_array().is_some_and(|a| !a.is_empty()));
}

#[tokio::test]
async fn restart_resets_clock_but_keeps_speed() {
    let state = state();
    let (status, _) = call(&state, post("/speed", r#"{"speed": 1200}"#)).await;
    assert_eq!(status, StatusCode::OK);
    state.sim.advance(Duration::from_secs(3));

    let (_, time) = call(&state, get("/time")).await;
    assert_eq!(time["elapsed_secs"], 3600);

    let (status, restarted) = call(&state, post("/start", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restarted["generation"], 1);

    let (_, speed) = call(&state, get("/speed")).await;
    assert_eq!(speed["speed"], 1200.0);
    let (_, time) = call(&state, get("/time")).await;
    assert_eq!(time["elapsed_secs"], 0);
    assert!(time["label"].as_str().is_some_and(|l| l.contains("Day 1")));
}

#[tokio::test]
async fn invalid_input_is_a_400_with_json_error() {
    let state = state();
    for (req, needle) in [
        (post("/speed", r#"{"speed": 7200}"#), "speed"),
        (
            post(
                "/user-generated-event",
                r#"{"state_key": "kitchenStove", "new_value": true}"#,
            ),
            "kitchenStove",
        ),
        (
            post(
                "/user-generated-event",
                r#"{"state_key": "thermostatTemp", "new_value": 40}"#,
            ),
            "thermostat",
        ),
    ] {
        let (status, body) = call(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap_or_default();
        assert!(message.contains(needle), "{message}");
    }
}
