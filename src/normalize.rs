use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::capability::has_fan_coil_support;
use crate::types::{Alarm, CommonData, DeviceStatus, EcoComfort, OtcType, RoomMode, SensorRecord};

/// Element types that report whole degrees instead of tenths. Their values
/// are multiplied up to the tenths scale the other types use.
const WHOLE_DEGREE_ELEMENT_TYPE: u8 = 5;

/// Envelope the data endpoints wrap their payloads in.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ElementsResponse {
    pub status: i64,
    pub data: ElementsData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementsData {
    pub common: RawCommon,
    pub elements: Vec<RawElement>,
    #[serde(rename = "device_status")]
    pub device_status: Vec<RawDeviceStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCommon {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One entry of the vendor `elements` array. Every field is optional; the
/// portal omits whatever a given installation does not have.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawElement {
    pub device_id: Option<i64>,
    pub device_name: Option<String>,
    pub parent_id: Option<i64>,
    pub parent_name: Option<String>,
    pub room_id: Option<i64>,
    pub room_name: Option<String>,
    pub zone_id: Option<u8>,
    pub element_type: Option<u8>,
    pub mode: Option<i64>,
    pub on_off: Option<i64>,
    pub current_temperature: Option<f64>,
    pub setting_temperature: Option<f64>,
    pub ecocomfort: Option<i64>,
    pub silent_mode: Option<i64>,
    pub alarm_code: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawDeviceStatus {
    pub device_id: Option<i64>,
    pub device_name: Option<String>,
    pub firm_version: Option<String>,
    pub connection: Option<i64>,
    pub heating_status: Value,
    pub heating_setting: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InstallationDevicesResponse {
    pub status: i64,
    pub data: Vec<RawInstallationDevice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInstallationDevice {
    pub device_id: Option<i64>,
    pub device_name: Option<String>,
    pub firm_version: Option<String>,
    pub connection: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlarmsResponse {
    pub status: i64,
    pub data: Vec<RawAlarm>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAlarm {
    pub device_id: Option<i64>,
    pub alarm_code: Option<i64>,
    pub origin: Option<String>,
    pub date: Option<String>,
}

/// Rebuild the full record set from one elements payload. Previous-cycle
/// records are meant to be discarded by the caller; nothing is diffed.
pub fn normalize_elements(data: &ElementsData) -> (Vec<SensorRecord>, CommonData) {
    let records: Vec<SensorRecord> = data
        .elements
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_element(raw, index))
        .collect();

    let common = CommonData {
        installation_name: data.common.name.clone().unwrap_or_default(),
        latitude: data.common.latitude,
        longitude: data.common.longitude,
        devices: data.device_status.iter().map(normalize_device_status).collect(),
    };

    trace!(
        records = records.len(),
        devices = common.devices.len(),
        "normalized elements payload"
    );
    (records, common)
}

fn normalize_element(raw: &RawElement, index: usize) -> SensorRecord {
    let device_id = raw.device_id.unwrap_or_default();
    let element_type = raw.element_type.unwrap_or_default();
    let scale = temperature_scale(element_type);

    SensorRecord {
        device_id,
        room_name: element_name(raw, index),
        parent_id: raw.parent_id,
        room_id: raw.room_id,
        zone_id: raw.zone_id.unwrap_or_default(),
        element_type,
        mode: raw.mode.and_then(RoomMode::from_vendor_code),
        on_off: raw.on_off.map(|v| v != 0),
        current_temperature: raw.current_temperature.map(|t| t * scale),
        setting_temperature: raw.setting_temperature.map(|t| t * scale),
        ecocomfort: raw.ecocomfort.and_then(EcoComfort::from_vendor_code),
        silent_mode: raw.silent_mode.map(|v| v != 0),
        // code 0 means "no alarm" on the wire
        alarm_code: raw.alarm_code.filter(|code| *code != 0),
    }
}

/// Fixed per-type lookup, not a formula.
pub(crate) fn temperature_scale(element_type: u8) -> f64 {
    if element_type == WHOLE_DEGREE_ELEMENT_TYPE {
        10.0
    } else {
        1.0
    }
}

fn element_name(raw: &RawElement, index: usize) -> String {
    for name in [&raw.room_name, &raw.device_name, &raw.parent_name] {
        if let Some(name) = name
            && !name.is_empty()
        {
            return name.clone();
        }
    }
    placeholder_name(raw.device_id.unwrap_or_default(), index)
}

/// Deterministic in device id and element index so entity ids stay stable
/// across polls for installations that never named their rooms.
pub(crate) fn placeholder_name(device_id: i64, index: usize) -> String {
    format!("zone-{device_id}-{index}")
}

fn normalize_device_status(raw: &RawDeviceStatus) -> DeviceStatus {
    DeviceStatus {
        device_id: raw.device_id.unwrap_or_default(),
        name: raw.device_name.clone().unwrap_or_default(),
        firmware: raw.firm_version.clone().unwrap_or_default(),
        online: raw.connection == Some(1),
        fan_coil_support: has_fan_coil_support(&raw.heating_status, &raw.heating_setting),
        otc_heating: raw
            .heating_setting
            .get("otcHeatingType")
            .and_then(Value::as_i64)
            .and_then(OtcType::from_vendor_code),
    }
}

/// Fold the installation-devices payload into the common data. Entries match
/// on device id; unseen devices are appended.
pub fn merge_installation_devices(common: &mut CommonData, devices: &[RawInstallationDevice]) {
    for raw in devices {
        let Some(device_id) = raw.device_id else {
            continue;
        };
        match common.devices.iter_mut().find(|d| d.device_id == device_id) {
            Some(device) => {
                if let Some(name) = &raw.device_name
                    && !name.is_empty()
                {
                    device.name = name.clone();
                }
                if let Some(firmware) = &raw.firm_version
                    && !firmware.is_empty()
                {
                    device.firmware = firmware.clone();
                }
                if let Some(connection) = raw.connection {
                    device.online = connection == 1;
                }
            }
            None => common.devices.push(DeviceStatus {
                device_id,
                name: raw.device_name.clone().unwrap_or_default(),
                firmware: raw.firm_version.clone().unwrap_or_default(),
                online: raw.connection == Some(1),
                ..Default::default()
            }),
        }
    }
}

pub fn normalize_alarms(raw: &[RawAlarm]) -> Vec<Alarm> {
    raw.iter()
        .filter_map(|alarm| {
            let code = alarm.alarm_code?;
            Some(Alarm {
                device_id: alarm.device_id,
                code,
                origin: alarm.origin.clone(),
                raised_at: alarm.date.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_elements(body: serde_json::Value) -> ElementsData {
        serde_json::from_value::<ElementsResponse>(body).unwrap().data
    }

    #[test]
    fn whole_degree_type_scaled_to_tenths() {
        let data = parse_elements(json!({
            "status": 0,
            "data": {
                "elements": [
                    { "deviceId": 1, "zoneId": 3, "elementType": 5, "settingTemperature": 25, "currentTemperature": 48 },
                    { "deviceId": 1, "zoneId": 1, "elementType": 1, "settingTemperature": 19.5, "currentTemperature": 20.5 }
                ]
            }
        }));
        let (records, _) = normalize_elements(&data);
        assert_eq!(records[0].setting_temperature, Some(250.0));
        assert_eq!(records[0].current_temperature, Some(480.0));
        assert_eq!(records[1].setting_temperature, Some(19.5));
        assert_eq!(records[1].current_temperature, Some(20.5));
    }

    #[test]
    fn missing_names_get_deterministic_placeholder() {
        let data = parse_elements(json!({
            "status": 0,
            "data": {
                "elements": [
                    { "deviceId": 77, "zoneId": 1, "deviceName": "", "parentName": "" },
                    { "deviceId": 77, "zoneId": 2 }
                ]
            }
        }));
        let (records, _) = normalize_elements(&data);
        assert_eq!(records[0].room_name, "zone-77-0");
        assert_eq!(records[1].room_name, "zone-77-1");

        // same input, same names
        let (again, _) = normalize_elements(&data);
        assert_eq!(records[0].room_name, again[0].room_name);
    }

    #[test]
    fn name_preference_room_then_device_then_parent() {
        let data = parse_elements(json!({
            "status": 0,
            "data": {
                "elements": [
                    { "deviceId": 1, "roomName": "Living room", "deviceName": "Yutaki", "parentName": "Home" },
                    { "deviceId": 1, "deviceName": "Yutaki", "parentName": "Home" },
                    { "deviceId": 1, "parentName": "Home" }
                ]
            }
        }));
        let (records, _) = normalize_elements(&data);
        assert_eq!(records[0].room_name, "Living room");
        assert_eq!(records[1].room_name, "Yutaki");
        assert_eq!(records[2].room_name, "Home");
    }

    #[test]
    fn vocabulary_fields_decoded() {
        let data = parse_elements(json!({
            "status": 0,
            "data": {
                "elements": [{
                    "deviceId": 5, "parentId": 2, "roomId": 11, "zoneId": 1,
                    "elementType": 1, "mode": 1, "onOff": 1,
                    "ecocomfort": 0, "silentMode": 0, "alarmCode": 0
                }]
            }
        }));
        let (records, _) = normalize_elements(&data);
        let record = &records[0];
        assert_eq!(record.mode, Some(RoomMode::Heat));
        assert_eq!(record.on_off, Some(true));
        assert_eq!(record.ecocomfort, Some(EcoComfort::Eco));
        assert_eq!(record.silent_mode, Some(false));
        assert_eq!(record.alarm_code, None, "alarm code 0 means no alarm");
        assert_eq!(record.parent_id, Some(2));
        assert_eq!(record.room_id, Some(11));
    }

    #[test]
    fn unknown_mode_code_is_absent() {
        let data = parse_elements(json!({
            "status": 0,
            "data": { "elements": [{ "deviceId": 1, "zoneId": 1, "mode": 9 }] }
        }));
        let (records, _) = normalize_elements(&data);
        assert_eq!(records[0].mode, None);
    }

    #[test]
    fn common_data_from_payload() {
        let data = parse_elements(json!({
            "status": 0,
            "data": {
                "common": { "name": "Holiday house", "latitude": 43.2, "longitude": 5.4 },
                "elements": [],
                "device_status": [{
                    "deviceId": 9, "deviceName": "Yutaki S", "firmVersion": "S80",
                    "connection": 1,
                    "heatingStatus": { "systemConfigBits": 0x2000 },
                    "heatingSetting": { "otcHeatingType": 2 }
                }]
            }
        }));
        let (_, common) = normalize_elements(&data);
        assert_eq!(common.installation_name, "Holiday house");
        assert_eq!(common.latitude, Some(43.2));
        let device = &common.devices[0];
        assert!(device.online);
        assert!(device.fan_coil_support);
        assert_eq!(device.otc_heating, Some(OtcType::Gradient));
    }

    #[test]
    fn merge_updates_matching_device_and_appends_unknown() {
        let mut common = CommonData {
            devices: vec![DeviceStatus {
                device_id: 9,
                name: "old".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let incoming: InstallationDevicesResponse = serde_json::from_value(json!({
            "status": 0,
            "data": [
                { "deviceId": 9, "deviceName": "Yutaki S", "firmVersion": "0512", "connection": 1 },
                { "deviceId": 10, "deviceName": "Yutaki M", "connection": 0 },
                { "deviceName": "no id, skipped" }
            ]
        }))
        .unwrap();

        merge_installation_devices(&mut common, &incoming.data);

        assert_eq!(common.devices.len(), 2);
        assert_eq!(common.devices[0].name, "Yutaki S");
        assert_eq!(common.devices[0].firmware, "0512");
        assert!(common.devices[0].online);
        assert_eq!(common.devices[1].device_id, 10);
        assert!(!common.devices[1].online);
    }

    #[test]
    fn alarms_skip_entries_without_code() {
        let incoming: AlarmsResponse = serde_json::from_value(json!({
            "status": 0,
            "data": [
                { "deviceId": 9, "alarmCode": 73, "origin": "outdoor unit", "date": "2025-11-02 10:15" },
                { "deviceId": 9 }
            ]
        }))
        .unwrap();
        let alarms = normalize_alarms(&incoming.data);
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].code, 73);
        assert_eq!(alarms[0].origin.as_deref(), Some("outdoor unit"));
    }

    #[test]
    fn empty_payload_normalizes_to_empty() {
        let data = parse_elements(json!({ "status": 0, "data": {} }));
        let (records, common) = normalize_elements(&data);
        assert!(records.is_empty());
        assert!(common.devices.is_empty());
        assert_eq!(common.installation_name, "");
    }
}
