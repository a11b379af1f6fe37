/// Operating mode of a room or circuit as encoded by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomMode {
    Cool,
    Heat,
    Auto,
}

impl RoomMode {
    pub fn as_vendor_code(&self) -> u8 {
        match self {
            RoomMode::Cool => 0,
            RoomMode::Heat => 1,
            RoomMode::Auto => 2,
        }
    }

    pub fn from_vendor_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RoomMode::Cool),
            1 => Some(RoomMode::Heat),
            2 => Some(RoomMode::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcoComfort {
    Eco,
    Comfort,
}

impl EcoComfort {
    pub fn as_vendor_code(&self) -> u8 {
        match self {
            EcoComfort::Eco => 0,
            EcoComfort::Comfort => 1,
        }
    }

    pub fn from_vendor_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(EcoComfort::Eco),
            1 => Some(EcoComfort::Comfort),
            _ => None,
        }
    }
}

/// Outdoor temperature compensation heating-curve type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtcType {
    Disabled,
    Points,
    Gradient,
    Fixed,
}

impl OtcType {
    pub fn as_vendor_code(&self) -> u8 {
        match self {
            OtcType::Disabled => 0,
            OtcType::Points => 1,
            OtcType::Gradient => 2,
            OtcType::Fixed => 3,
        }
    }

    pub fn from_vendor_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(OtcType::Disabled),
            1 => Some(OtcType::Points),
            2 => Some(OtcType::Gradient),
            3 => Some(OtcType::Fixed),
            _ => None,
        }
    }
}

/// One normalized portal element (a heating/cooling zone, DHW tank or pool).
/// Rebuilt wholesale on every refresh; never patched incrementally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorRecord {
    pub device_id: i64,
    pub room_name: String,
    pub parent_id: Option<i64>,
    pub room_id: Option<i64>,
    pub zone_id: u8,
    pub element_type: u8,
    pub mode: Option<RoomMode>,
    pub on_off: Option<bool>,
    pub current_temperature: Option<f64>,
    pub setting_temperature: Option<f64>,
    pub ecocomfort: Option<EcoComfort>,
    pub silent_mode: Option<bool>,
    pub alarm_code: Option<i64>,
}

/// Installation-wide metadata, rebuilt alongside the sensor records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonData {
    pub installation_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub devices: Vec<DeviceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceStatus {
    pub device_id: i64,
    pub name: String,
    pub firmware: String,
    pub online: bool,
    pub fan_coil_support: bool,
    pub otc_heating: Option<OtcType>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alarm {
    pub device_id: Option<i64>,
    pub code: i64,
    pub origin: Option<String>,
    pub raised_at: Option<String>,
}
