//! Display peripheral (BLE GATT server) settings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_device_name() -> String {
    "EiE 6248 Hardware Monitor".to_string()
}

pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;

fn default_scan_timeout_secs() -> u64 {
    DEFAULT_SCAN_TIMEOUT_SECS
}

fn default_service_uuid() -> Uuid {
    Uuid::from_u128(0x01928374_1234_5678_1234_56789abcdef0)
}

fn default_scalar_uuid() -> Uuid {
    Uuid::from_u128(0x01928374_1234_5678_1234_56789abcdef1)
}

fn default_network_uuid() -> Uuid {
    Uuid::from_u128(0x01928374_1234_5678_1234_56789abcdef2)
}

fn default_percent_uuid() -> Uuid {
    Uuid::from_u128(0x01928374_1234_5678_1234_56789abcdef3)
}

/// Peripheral settings
///
/// The UUIDs must match the GATT table compiled into the display firmware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeripheralSettings {
    /// Advertised local name to search for
    #[serde(default = "default_device_name")]
    pub name: String,
    /// How long discovery may run before giving up
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,
    #[serde(default = "default_service_uuid")]
    pub service_uuid: Uuid,
    #[serde(default = "default_scalar_uuid")]
    pub scalar_uuid: Uuid,
    #[serde(default = "default_network_uuid")]
    pub network_uuid: Uuid,
    #[serde(default = "default_percent_uuid")]
    pub percent_uuid: Uuid,
}

impl Default for PeripheralSettings {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            scan_timeout_secs: default_scan_timeout_secs(),
            service_uuid: default_service_uuid(),
            scalar_uuid: default_scalar_uuid(),
            network_uuid: default_network_uuid(),
            percent_uuid: default_percent_uuid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uuids_match_firmware() {
        let settings = PeripheralSettings::default();
        assert_eq!(
            settings.service_uuid.to_string(),
            "01928374-1234-5678-1234-56789abcdef0"
        );
        assert_eq!(
            settings.scalar_uuid.to_string(),
            "01928374-1234-5678-1234-56789abcdef1"
        );
        assert_eq!(
            settings.network_uuid.to_string(),
            "01928374-1234-5678-1234-56789abcdef2"
        );
        assert_eq!(
            settings.percent_uuid.to_string(),
            "01928374-1234-5678-1234-56789abcdef3"
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: PeripheralSettings =
            serde_json::from_str(r#"{"name":"Bench Display"}"#).unwrap();
        assert_eq!(settings.name, "Bench Display");
        assert_eq!(settings.scan_timeout_secs, 10);
        assert_eq!(settings.scalar_uuid, PeripheralSettings::default().scalar_uuid);
    }
}
