use csnet_manager::{has_fan_coil_support, EcoComfort, Error, OtcType, RoomMode, ZoneKind};
use serde_json::json;

#[test]
fn air_zones_map_to_air_suffix() {
    for zone_id in [1u8, 2] {
        let zone = ZoneKind::from_zone_id(zone_id).unwrap();
        let field = zone.run_stop_field();
        assert!(field.ends_with("Air"), "zone {zone_id} -> {field}");
        assert_eq!(field, format!("runStopC{zone_id}Air"));
    }
}

#[test]
fn water_zones_map_to_bare_suffix_with_circuit_offset() {
    for zone_id in [5u8, 6] {
        let zone = ZoneKind::from_zone_id(zone_id).unwrap();
        let circuit = zone_id - 4;
        let field = zone.run_stop_field();
        assert!(!field.ends_with("Air"), "zone {zone_id} -> {field}");
        assert_eq!(field, format!("runStopC{circuit}"));
        assert_eq!(zone.circuit(), Some(circuit));
    }
}

#[test]
fn dhw_and_pool_have_dedicated_fields() {
    assert_eq!(
        ZoneKind::from_zone_id(3).unwrap().setting_temp_field(),
        "settingTempDHW"
    );
    assert_eq!(
        ZoneKind::from_zone_id(4).unwrap().setting_temp_field(),
        "settingTempSWP"
    );
}

#[test]
fn ambiguous_zone_ids_are_rejected_not_guessed() {
    for zone_id in [0u8, 7, 8, 100, 255] {
        assert!(
            matches!(
                ZoneKind::from_zone_id(zone_id),
                Err(Error::InvalidZone(id)) if id == zone_id
            ),
            "zone {zone_id} must be rejected"
        );
    }
}

#[test]
fn room_mode_roundtrip() {
    for mode in [RoomMode::Cool, RoomMode::Heat, RoomMode::Auto] {
        let code = mode.as_vendor_code();
        assert_eq!(RoomMode::from_vendor_code(code as i64), Some(mode));
    }
    assert_eq!(RoomMode::from_vendor_code(3), None);
    assert_eq!(RoomMode::from_vendor_code(-1), None);
}

#[test]
fn eco_comfort_roundtrip() {
    for value in [EcoComfort::Eco, EcoComfort::Comfort] {
        let code = value.as_vendor_code();
        assert_eq!(EcoComfort::from_vendor_code(code as i64), Some(value));
    }
    assert_eq!(EcoComfort::from_vendor_code(2), None);
}

#[test]
fn otc_type_roundtrip() {
    for value in [
        OtcType::Disabled,
        OtcType::Points,
        OtcType::Gradient,
        OtcType::Fixed,
    ] {
        let code = value.as_vendor_code();
        assert_eq!(OtcType::from_vendor_code(code as i64), Some(value));
    }
    assert_eq!(OtcType::from_vendor_code(4), None);
}

#[test]
fn fan_coil_config_bit_wins_regardless_of_other_fields() {
    let status = json!({
        "systemConfigBits": 0x2000,
        "fan1LcdControl": 0,
        "fan2LcdControl": 0
    });
    let setting = json!({ "fanSpeed1Setting": -1 });
    assert!(has_fan_coil_support(&status, &setting));
}

#[test]
fn fan_speed_setting_covers_older_firmware() {
    let status = json!({ "systemConfigBits": 0 });
    let setting = json!({ "fanSpeed2Setting": 0 });
    assert!(has_fan_coil_support(&status, &setting));
}

#[test]
fn no_signal_means_no_fan_coil() {
    assert!(!has_fan_coil_support(&json!({}), &json!({})));
}
