//! Smart home state-change events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Subsystem an event belongs to.
///
/// Integer state lives under [`StateType::Temp`]; every other variant
/// carries boolean (open/closed or on/off) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateType {
    Temp,
    Door,
    Window,
    Light,
    BedroomTv,
    LivingRoomTv,
    Stove,
    Oven,
    Microwave,
    Refrigerator,
    DishWasher,
    Shower,
    Bath,
    BathExhaustFan,
    ClothesWasher,
    ClothesDryer,
}

impl StateType {
    /// All state types, in declaration order.
    pub const ALL: [StateType; 16] = [
        StateType::Temp,
        StateType::Door,
        StateType::Window,
        StateType::Light,
        StateType::BedroomTv,
        StateType::LivingRoomTv,
        StateType::Stove,
        StateType::Oven,
        StateType::Microwave,
        StateType::Refrigerator,
        StateType::DishWasher,
        StateType::Shower,
        StateType::Bath,
        StateType::BathExhaustFan,
        StateType::ClothesWasher,
        StateType::ClothesDryer,
    ];

    /// Wire name, e.g. `"livingRoomTv"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::Door => "door",
            Self::Window => "window",
            Self::Light => "light",
            Self::BedroomTv => "bedroomTv",
            Self::LivingRoomTv => "livingRoomTv",
            Self::Stove => "stove",
            Self::Oven => "oven",
            Self::Microwave => "microwave",
            Self::Refrigerator => "refrigerator",
            Self::DishWasher => "dishWasher",
            Self::Shower => "shower",
            Self::Bath => "bath",
            Self::BathExhaustFan => "bathExhaustFan",
            Self::ClothesWasher => "clothesWasher",
            Self::ClothesDryer => "clothesDryer",
        }
    }

    /// Parses a wire name back into a state type.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Returns `true` when events of this type carry integer values.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Temp)
    }

    /// Doors and windows let outdoor air in while open.
    pub fn is_opening(&self) -> bool {
        matches!(self, Self::Door | Self::Window)
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// New value carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
}

impl StateValue {
    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(_) => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Bool(_) => None,
        }
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
        }
    }
}

/// Where an event came from.
///
/// When both origins hold an event for the same `(time, state_key)`,
/// [`Origin::User`] wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    Pregenerated,
    User,
}

/// Immutable record of one state change at an app time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// App seconds since simulation start.
    pub time: u64,
    pub state_type: StateType,
    pub state_key: String,
    pub new_value: StateValue,
    /// Display string, e.g. `"Front Door is OPEN"`.
    pub message: String,
    pub origin: Origin,
}

impl Event {
    /// Creates a pre-generated event.
    pub fn pregenerated(
        time: u64,
        state_type: StateType,
        state_key: impl Into<String>,
        new_value: StateValue,
        message: impl Into<String>,
    ) -> Self {
        Self {
            time,
            state_type,
            state_key: state_key.into(),
            new_value,
            message: message.into(),
            origin: Origin::Pregenerated,
        }
    }

    /// Creates a user-generated event.
    pub fn user(
        time: u64,
        state_type: StateType,
        state_key: impl Into<String>,
        new_value: StateValue,
        message: impl Into<String>,
    ) -> Self {
        Self {
            origin: Origin::User,
            ..Self::pregenerated(time, state_type, state_key, new_value, message)
        }
    }

    /// Returns `true` when the value is a boolean.
    pub fn is_boolean(&self) -> bool {
        matches!(self.new_value, StateValue::Bool(_))
    }
}
