use crate::types::{EcoComfort, RoomMode};
use crate::{Error, Result};

pub const LOGIN_PATH: &str = "/login";
pub const ELEMENTS_PATH: &str = "/data/elements";
pub const INSTALLATION_DEVICES_PATH: &str = "/data/installationdevices";
pub const INSTALLATION_ALARMS_PATH: &str = "/data/installationalarms";
pub const HEAT_SETTING_PATH: &str = "/data/indoor/heat_setting";

/// A failed login is re-rendered with HTTP 200; this marker in the body is
/// the only reliable signal that the portal served the login page again.
pub const LOGIN_PAGE_MARKER: &str = "loadContent(\"login\")";

pub fn is_login_page(body: &str) -> bool {
    body.contains(LOGIN_PAGE_MARKER)
}

/// The six control points the portal exposes, keyed by zone id.
///
/// Air and water distribution for the same physical circuit share a circuit
/// number but use different parameter suffixes. The mapping is a fixed table;
/// unknown zone ids are rejected, never guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    /// Zones 1 and 2: air circuits C1/C2, `...C1Air` / `...C2Air` fields.
    AirCircuit(u8),
    /// Zones 5 and 6: water circuits C1/C2, bare `...C1` / `...C2` fields.
    WaterCircuit(u8),
    /// Zone 3: domestic hot water, `...DHW` fields.
    DomesticHotWater,
    /// Zone 4: swimming pool, `...SWP` fields.
    SwimmingPool,
}

impl ZoneKind {
    pub fn from_zone_id(zone_id: u8) -> Result<Self> {
        match zone_id {
            1 => Ok(ZoneKind::AirCircuit(1)),
            2 => Ok(ZoneKind::AirCircuit(2)),
            3 => Ok(ZoneKind::DomesticHotWater),
            4 => Ok(ZoneKind::SwimmingPool),
            5 => Ok(ZoneKind::WaterCircuit(1)),
            6 => Ok(ZoneKind::WaterCircuit(2)),
            other => Err(Error::InvalidZone(other)),
        }
    }

    /// Physical circuit number for circuit-bound zones.
    pub fn circuit(&self) -> Option<u8> {
        match self {
            ZoneKind::AirCircuit(c) | ZoneKind::WaterCircuit(c) => Some(*c),
            ZoneKind::DomesticHotWater | ZoneKind::SwimmingPool => None,
        }
    }

    fn field(&self, prefix: &str) -> String {
        match self {
            ZoneKind::AirCircuit(c) => format!("{prefix}C{c}Air"),
            ZoneKind::WaterCircuit(c) => format!("{prefix}C{c}"),
            ZoneKind::DomesticHotWater => format!("{prefix}DHW"),
            ZoneKind::SwimmingPool => format!("{prefix}SWP"),
        }
    }

    pub fn run_stop_field(&self) -> String {
        self.field("runStop")
    }

    pub fn setting_temp_field(&self) -> String {
        self.field("settingTemp")
    }

    pub fn eco_mode_field(&self) -> String {
        self.field("ecoMode")
    }

    pub fn silent_mode_field(&self) -> String {
        self.field("silentMode")
    }
}

pub type Form = Vec<(String, String)>;

fn base_form(indoor_id: i64) -> Form {
    vec![("indoorId".to_string(), indoor_id.to_string())]
}

/// Run/stop form. The portal rejects mode+off combinations, so `mode` is
/// only ever included when turning the zone on.
pub fn run_stop_form(indoor_id: i64, zone: ZoneKind, on: bool, mode: Option<RoomMode>) -> Form {
    let mut form = base_form(indoor_id);
    form.push((zone.run_stop_field(), if on { "1" } else { "0" }.to_string()));
    if on && let Some(mode) = mode {
        form.push(("mode".to_string(), mode.as_vendor_code().to_string()));
    }
    form
}

pub fn setting_temp_form(indoor_id: i64, zone: ZoneKind, temperature: f64) -> Form {
    let mut form = base_form(indoor_id);
    form.push((zone.setting_temp_field(), format!("{temperature:.1}")));
    form
}

pub fn eco_mode_form(indoor_id: i64, zone: ZoneKind, eco: EcoComfort) -> Form {
    let mut form = base_form(indoor_id);
    form.push((zone.eco_mode_field(), eco.as_vendor_code().to_string()));
    form
}

pub fn silent_mode_form(indoor_id: i64, zone: ZoneKind, silent: bool) -> Form {
    let mut form = base_form(indoor_id);
    form.push((zone.silent_mode_field(), if silent { "1" } else { "0" }.to_string()));
    form
}

pub fn installation_devices_query(installation_id: i64) -> String {
    format!("{INSTALLATION_DEVICES_PATH}?installationId={installation_id}")
}

/// The alarms endpoint is the only GET that wants the CSRF token.
pub fn installation_alarms_query(installation_id: i64, csrf_token: &str) -> String {
    format!("{INSTALLATION_ALARMS_PATH}?installationId={installation_id}&_csrf={csrf_token}")
}
