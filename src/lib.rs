mod capability;
mod client;
mod error;
mod logger;
mod normalize;
mod protocol;
mod session;
mod types;

pub use capability::{has_fan_coil_support, FAN_COIL_CONFIG_BIT};
pub use client::{CsnetClient, CsnetClientBuilder};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use normalize::{normalize_elements, ElementsData, ElementsResponse};
pub use protocol::ZoneKind;
pub use session::Session;
pub use types::*;
