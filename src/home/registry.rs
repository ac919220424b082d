//! Registry of every state key in the home.

use crate::sim::event::{StateType, StateValue};

/// State key of the outdoor temperature sensor.
pub const OUTDOOR_TEMP: &str = "outdoorTemp";
/// State key of the thermostat setpoint.
pub const THERMOSTAT_TEMP: &str = "thermostatTemp";

/// One addressable piece of smart home state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub key: &'static str,
    /// Default state type. Faucets switch between bath and shower per event.
    pub state_type: StateType,
    /// Whether the user-action layer may submit events for this key.
    pub user_changeable: bool,
}

const fn dev(key: &'static str, state_type: StateType, user_changeable: bool) -> Device {
    Device {
        key,
        state_type,
        user_changeable,
    }
}

/// All devices in the home.
pub const DEVICES: &[Device] = &[
    dev(OUTDOOR_TEMP, StateType::Temp, false),
    dev(THERMOSTAT_TEMP, StateType::Temp, true),
    dev("bedroom1OverheadLight", StateType::Light, true),
    dev("bedroom1Lamp1", StateType::Light, true),
    dev("bedroom1Lamp2", StateType::Light, true),
    dev("bedroom1Window1", StateType::Window, true),
    dev("bedroom1Window2", StateType::Window, true),
    dev("bedroom1Tv", StateType::BedroomTv, false),
    dev("bedroom2OverheadLight", StateType::Light, true),
    dev("bedroom2Lamp1", StateType::Light, true),
    dev("bedroom2Lamp2", StateType::Light, true),
    dev("bedroom2Window1", StateType::Window, true),
    dev("bedroom2Window2", StateType::Window, true),
    dev("bedroom3OverheadLight", StateType::Light, true),
    dev("bedroom3Lamp1", StateType::Light, true),
    dev("bedroom3Lamp2", StateType::Light, true),
    dev("bedroom3Window1", StateType::Window, true),
    dev("bedroom3Window2", StateType::Window, true),
    dev("bathroom1OverheadLight", StateType::Light, true),
    dev("bathroom1ExhaustFan", StateType::BathExhaustFan, false),
    dev("bathroom1Window", StateType::Window, true),
    dev("bathroom1Faucet", StateType::Shower, false),
    dev("bathroom2OverheadLight", StateType::Light, true),
    dev("bathroom2ExhaustFan", StateType::BathExhaustFan, false),
    dev("bathroom2Window", StateType::Window, true),
    dev("bathroom2Faucet", StateType::Shower, false),
    dev("clothesWasher", StateType::ClothesWasher, false),
    dev("clothesDryer", StateType::ClothesDryer, false),
    dev("frontDoor", StateType::Door, true),
    dev("backDoor", StateType::Door, true),
    dev("garageHouseDoor", StateType::Door, true),
    dev("garageCarDoor1", StateType::Door, true),
    dev("garageCarDoor2", StateType::Door, true),
    dev("livingRoomOverheadLight", StateType::Light, true),
    dev("livingRoomLamp1", StateType::Light, true),
    dev("livingRoomLamp2", StateType::Light, true),
    dev("livingRoomTv", StateType::LivingRoomTv, false),
    dev("livingRoomWindow1", StateType::Window, true),
    dev("livingRoomWindow2", StateType::Window, true),
    dev("livingRoomWindow3", StateType::Window, true),
    dev("kitchenOverheadLight", StateType::Light, true),
    dev("kitchenStove", StateType::Stove, false),
    dev("kitchenOven", StateType::Oven, false),
    dev("kitchenMicrowave", StateType::Microwave, false),
    dev("kitchenRefrigerator", StateType::Refrigerator, false),
    dev("kitchenDishWasher", StateType::DishWasher, false),
    dev("kitchenWindow1", StateType::Window, true),
    dev("kitchenWindow2", StateType::Window, true),
];

/// Looks up a device by state key.
pub fn device(key: &str) -> Option<&'static Device> {
    DEVICES.iter().find(|d| d.key == key)
}

/// Splits a camelCase key into title-cased words: `"bedroom1Lamp2"` → `"Bedroom 1 Lamp 2"`.
pub fn human_readable_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_digit = false;
    for c in key.chars() {
        let digit = c.is_ascii_digit();
        let boundary = c.is_ascii_uppercase() || (digit && !prev_digit);
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev_digit = digit;
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display label for a value: OPEN/CLOSED for openings, ON/OFF for appliances.
pub fn value_label(state_type: StateType, value: StateValue) -> String {
    match value {
        StateValue::Int(v) => v.to_string(),
        StateValue::Bool(on) => {
            let (on_label, off_label) = if state_type.is_opening() {
                ("OPEN", "CLOSED")
            } else {
                ("ON", "OFF")
            };
            let label = if on { on_label } else { off_label };
            label.to_string()
        }
    }
}

/// Builds the standard event message, e.g. `"Front Door is OPEN"`.
pub fn message_for(key: &str, state_type: StateType, value: StateValue) -> String {
    format!(
        "{} is {}",
        human_readable_key(key),
        value_label(state_type, value)
    )
}
