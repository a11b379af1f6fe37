use serde_json::Value;

/// Bit in `systemConfigBits` that flags a fan-coil capable indoor unit.
pub const FAN_COIL_CONFIG_BIT: u64 = 0x2000;

const FAN_LCD_FIELDS: [&str; 2] = ["fan1LcdControl", "fan2LcdControl"];
const FAN_SPEED_FIELDS: [&str; 2] = ["fanSpeed1Setting", "fanSpeed2Setting"];

/// Whether the unit drives a fan coil, decided from the raw heating status
/// and heating setting maps of one device.
///
/// Checks in order: the config bit, either "fan controlled on LCD" field
/// taking a value in 1..=3, and as a fallback for firmware that predates the
/// config bit, either fan-speed setting field being a non-negative integer.
/// Malformed or absent inputs never match.
pub fn has_fan_coil_support(heating_status: &Value, heating_setting: &Value) -> bool {
    if let Some(bits) = heating_status.get("systemConfigBits").and_then(Value::as_u64)
        && bits & FAN_COIL_CONFIG_BIT != 0
    {
        return true;
    }

    for field in FAN_LCD_FIELDS {
        if let Some(value) = heating_status.get(field).and_then(Value::as_i64)
            && (1..=3).contains(&value)
        {
            return true;
        }
    }

    for field in FAN_SPEED_FIELDS {
        if let Some(value) = heating_setting.get(field).and_then(Value::as_i64)
            && value >= 0
        {
            return true;
        }
    }

    false
}
