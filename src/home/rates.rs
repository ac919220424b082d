use crate::sim::event::StateType;

/// Electrical draw of an appliance while on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectricityRate {
    pub watts: f64,
}

/// Water draw of a fixture while on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterRate {
    pub gallons_per_second: f64,
    /// Share of the water that passes through the water heater (0.0 to 1.0).
    pub hot_fraction: f64,
}

/// Returns the electrical draw for a state type, if it uses electricity directly.
pub fn electricity_rate(state_type: StateType) -> Option<ElectricityRate> {
    let watts = match state_type {
        StateType::Light => 60.0,
        StateType::BathExhaustFan => 30.0,
        StateType::Refrigerator => 150.0,
        StateType::Microwave => 1100.0,
        StateType::Stove => 3500.0,
        StateType::Oven => 4000.0,
        StateType::LivingRoomTv => 636.0,
        StateType::BedroomTv => 100.0,
        StateType::DishWasher => 1800.0,
        StateType::ClothesWasher => 500.0,
        StateType::ClothesDryer => 3000.0,
        _ => return None,
    };
    Some(ElectricityRate { watts })
}

/// Returns the water draw for a state type, if it uses water.
pub fn water_rate(state_type: StateType) -> Option<WaterRate> {
    let (gallons, over_secs, hot_fraction) = match state_type {
        StateType::Shower => (25.0, 15.0 * 60.0, 0.65),
        StateType::Bath => (30.0, 30.0 * 60.0, 0.65),
        StateType::DishWasher => (6.0, 45.0 * 60.0, 1.0),
        StateType::ClothesWasher => (20.0, 30.0 * 60.0, 0.85),
        _ => return None,
    };
    Some(WaterRate {
        gallons_per_second: gallons / over_secs,
        hot_fraction,
    })
}
