//! Indoor temperature and utility formulas.
//!
//! Units: seconds of app time, °F, watt-hours, gallons, dollars.

/// Natural drift per second per °F of outdoor/indoor gap (2 °F/hour per 10 °F).
const BASE_DRIFT_PER_SEC_PER_F: f64 = 2.0 / (3600.0 * 10.0);
/// Extra drift per second of open-door time (2 °F per 5 min per 10 °F).
const DOOR_DRIFT_PER_SEC_PER_F: f64 = 2.0 / (300.0 * 10.0);
/// Extra drift per second of open-window time (1 °F per 5 min per 10 °F).
const WINDOW_DRIFT_PER_SEC_PER_F: f64 = 1.0 / (300.0 * 10.0);

/// HVAC holds the setpoint within this band before it starts running.
pub const HVAC_DEADBAND_F: f64 = 2.0;
/// HVAC correction speed (1 °F per minute).
const HVAC_F_PER_SEC: f64 = 1.0 / 60.0;
/// HVAC draw while running.
pub const HVAC_WATTS: f64 = 3500.0;

/// Water heater throughput (1/4 gallon per minute).
const WATER_HEATER_GAL_PER_SEC: f64 = 0.25 / 60.0;
/// Water heater draw while running.
pub const WATER_HEATER_WATTS: f64 = 4500.0;

/// Default electricity price ($0.12 per kWh).
pub const DEFAULT_ELECTRICITY_USD_PER_KWH: f64 = 0.12;
/// Default water price ($2.52 per 100 ft³, 7.48 gallons per ft³).
pub const DEFAULT_WATER_USD_PER_GALLON: f64 = 2.52 / 100.0 / 7.48;

/// Result of one thermal sub-interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalStep {
    /// Indoor temperature at the end of the sub-interval (°F).
    pub indoor_f: f64,
    /// Electricity the HVAC drew during the sub-interval (Wh).
    pub hvac_wh: f64,
}

/// Signed change in indoor temperature from heat exchange with the outdoors.
///
/// The magnitude never exceeds the outdoor/indoor gap, so the indoor
/// temperature cannot overshoot the outdoor temperature.
///
/// # Arguments
///
/// * `indoor_f` - Indoor temperature at the start of the sub-interval
/// * `outdoor_f` - Outdoor temperature during the sub-interval
/// * `total_secs` - Sub-interval length
/// * `door_secs` - Summed open time of all doors in the sub-interval
/// * `window_secs` - Summed open time of all windows in the sub-interval
pub fn natural_change(
    indoor_f: f64,
    outdoor_f: f64,
    total_secs: f64,
    door_secs: f64,
    window_secs: f64,
) -> f64 {
    let gap = (outdoor_f - indoor_f).abs();
    let direction = if outdoor_f > indoor_f { 1.0 } else { -1.0 };
    let unclipped = gap
        * (BASE_DRIFT_PER_SEC_PER_F * total_secs
            + DOOR_DRIFT_PER_SEC_PER_F * door_secs
            + WINDOW_DRIFT_PER_SEC_PER_F * window_secs);
    direction * unclipped.min(gap)
}

/// Returns `true` when the indoor temperature has left the HVAC deadband.
pub fn hvac_running(indoor_f: f64, thermostat_f: f64) -> bool {
    (thermostat_f - indoor_f).abs() > HVAC_DEADBAND_F
}

/// Signed HVAC correction over `total_secs` and the electricity it used.
///
/// Returns `(0.0, 0.0)` inside the deadband.
pub fn hvac_change(indoor_f: f64, thermostat_f: f64, total_secs: f64) -> (f64, f64) {
    if !hvac_running(indoor_f, thermostat_f) {
        return (0.0, 0.0);
    }
    let gap = (thermostat_f - indoor_f).abs();
    let direction = if thermostat_f > indoor_f { 1.0 } else { -1.0 };
    let change = gap.min(HVAC_F_PER_SEC * total_secs.max(0.0));
    let running_secs = change / HVAC_F_PER_SEC;
    (direction * change, watt_hours(HVAC_WATTS, running_secs))
}

/// Advances indoor temperature through one sub-interval: natural drift
/// first, then HVAC correction from the drifted temperature.
pub fn step(
    indoor_f: f64,
    outdoor_f: f64,
    thermostat_f: f64,
    total_secs: f64,
    door_secs: f64,
    window_secs: f64,
) -> ThermalStep {
    let drifted = indoor_f + natural_change(indoor_f, outdoor_f, total_secs, door_secs, window_secs);
    let (hvac, hvac_wh) = hvac_change(drifted, thermostat_f, total_secs);
    ThermalStep {
        indoor_f: drifted + hvac,
        hvac_wh,
    }
}

/// Energy drawn by a constant load.
pub fn watt_hours(watts: f64, secs: f64) -> f64 {
    watts * secs / 3600.0
}

/// Electricity the water heater needs to heat `hot_gallons`.
pub fn water_heater_wh(hot_gallons: f64) -> f64 {
    watt_hours(WATER_HEATER_WATTS, hot_gallons / WATER_HEATER_GAL_PER_SEC)
}

/// Cost of `wh` watt-hours at a per-kWh price.
pub fn electricity_cost(wh: f64, usd_per_kwh: f64) -> f64 {
    wh / 1000.0 * usd_per_kwh
}

/// Cost of `gallons` at a per-gallon price.
pub fn water_cost(gallons: f64, usd_per_gallon: f64) -> f64 {
    gallons * usd_per_gallon
}
