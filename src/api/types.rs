//! API request, query, and response bodies.

use serde::{Deserialize, Serialize};

use crate::sim::event::StateValue;

/// Body of `POST /speed` and response of `GET /speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBody {
    /// App seconds per real second.
    pub speed: f64,
}

/// Body of `POST /user-generated-event`.
///
/// `new_value` is `true`/`false` for doors, windows, and lights, and an
/// integer for `thermostatTemp`. Without `time` the event lands on the
/// next app second not yet delivered to clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserEventRequest {
    pub state_key: String,
    pub new_value: StateValue,
    #[serde(default)]
    pub time: Option<u64>,
}

/// Query of `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Exclusive lower bound; omitted means from the start of the run.
    pub since: Option<u64>,
}

/// Response of `POST /start`.
#[derive(Debug, Serialize)]
pub struct RestartResponse {
    /// Run generation after the restart.
    pub generation: u64,
    /// App time after the restart (always zero).
    pub elapsed_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_event_accepts_bool_and_int_values() {
        let door: UserEventRequest =
            serde_json::from_str(r#"{"state_key":"frontDoor","new_value":true,"time":90}"#)
                .expect("bool body");
        assert_eq!(door.new_value, StateValue::Bool(true));
        assert_eq!(door.time, Some(90));

        let thermo: UserEventRequest =
            serde_json::from_str(r#"{"state_key":"thermostatTemp","new_value":72}"#)
                .expect("int body");
        assert_eq!(thermo.new_value, StateValue::Int(72));
        assert_eq!(thermo.time, None);
    }
}
