//! Error taxonomy for the simulation core.
//!
//! Validation failures are returned synchronously to the caller, who is
//! expected to correct the input and retry. A duplicate pre-generated key
//! means the seed data is inconsistent and aborts startup.

use crate::sim::event::StateType;

/// Top-level error for core simulation operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// Input rejected before any state changed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Two pre-generated events share the same `(time, state_key)`.
    #[error("duplicate pre-generated event at t={time} for \"{key}\"")]
    DuplicateKey {
        /// App time of the colliding events.
        time: u64,
        /// State key of the colliding events.
        key: String,
    },
}

impl SimError {
    /// Returns `true` for errors the caller can fix by re-issuing corrected input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Reasons a command or user event is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Speed multiplier outside the configured range (or not finite).
    #[error("speed {speed} must be within [{min}, {max}]")]
    SpeedOutOfRange {
        /// Requested multiplier.
        speed: f64,
        /// Lowest accepted multiplier.
        min: f64,
        /// Highest accepted multiplier.
        max: f64,
    },

    /// User event scheduled before the earliest open app time.
    #[error("event time {time} is before the current app time {now}")]
    CausalityViolation {
        /// Requested event time.
        time: u64,
        /// Earliest app time open to new events when the request was made.
        now: u64,
    },

    /// Event time past the end of the simulation.
    #[error("event time {time} is past the simulation horizon {horizon}")]
    BeyondHorizon {
        /// Requested event time.
        time: u64,
        /// Last valid app second.
        horizon: u64,
    },

    /// Thermostat setpoint outside the allowed band.
    #[error("thermostat {value}°F must be within [{min}, {max}]")]
    ThermostatOutOfRange {
        /// Requested setpoint.
        value: i64,
        /// Lowest accepted setpoint.
        min: i64,
        /// Highest accepted setpoint.
        max: i64,
    },

    /// State key not present in the home.
    #[error("unknown state key \"{0}\"")]
    UnknownKey(String),

    /// State key exists but users may not change it.
    #[error("state key \"{0}\" cannot be changed by the user")]
    NotUserChangeable(String),

    /// Value kind does not fit the state type.
    #[error("state type {state_type} does not accept {found} values")]
    ValueTypeMismatch {
        /// State type of the target key.
        state_type: StateType,
        /// Kind of value supplied (`"boolean"` or `"integer"`).
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_convert_and_classify() {
        let err: SimError = ValidationError::CausalityViolation { time: 100, now: 200 }.into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("before the current app time 200"));
    }

    #[test]
    fn duplicate_key_is_not_validation() {
        let err = SimError::DuplicateKey {
            time: 5,
            key: "frontDoor".to_string(),
        };
        assert!(!err.is_validation());
        assert!(err.to_string().contains("frontDoor"));
    }
}
