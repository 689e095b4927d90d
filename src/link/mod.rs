//! Wireless link to the display peripheral
//!
//! The transmission loop only needs two capabilities: find and connect to
//! the named peripheral, then write payloads to characteristics without
//! waiting for an acknowledgement. [`Discovery`] and [`Session`] capture
//! exactly that, so the loop can run against BLE, the console, or a test fake.

#[cfg(feature = "ble")]
mod ble;
mod console;

#[cfg(feature = "ble")]
pub use ble::{BleDiscovery, BleSession};
pub use console::{ConsoleDiscovery, ConsoleSession};

use hwmon_link_core::LinkError;
use hwmon_link_types::{MetricKind, PeripheralSettings};
use std::time::Duration;
use uuid::Uuid;

/// Characteristic each metric group is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characteristics {
    pub scalar: Uuid,
    pub network: Uuid,
    pub percent: Uuid,
}

impl Characteristics {
    pub fn for_kind(&self, kind: MetricKind) -> Uuid {
        match kind {
            MetricKind::Scalar => self.scalar,
            MetricKind::Network => self.network,
            MetricKind::Percent => self.percent,
        }
    }

    /// Reverse lookup, for log messages
    pub fn kind_of(&self, uuid: Uuid) -> Option<MetricKind> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| self.for_kind(*kind) == uuid)
    }
}

impl From<&PeripheralSettings> for Characteristics {
    fn from(settings: &PeripheralSettings) -> Self {
        Self {
            scalar: settings.scalar_uuid,
            network: settings.network_uuid,
            percent: settings.percent_uuid,
        }
    }
}

/// An open session with the peripheral
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Write a payload without waiting for an acknowledgement
    async fn write_without_response(
        &mut self,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), LinkError>;

    async fn disconnect(&mut self) -> Result<(), LinkError>;
}

/// Finds and connects to the peripheral
#[allow(async_fn_in_trait)]
pub trait Discovery {
    type Peripheral;
    type Session: Session;

    /// Search for a peripheral advertising `name`
    ///
    /// Returns `Ok(None)` if nothing matched before `timeout` elapsed.
    async fn discover(
        &mut self,
        name: &str,
        timeout: Duration,
    ) -> Result<Option<Self::Peripheral>, LinkError>;

    async fn connect(&mut self, peripheral: Self::Peripheral) -> Result<Self::Session, LinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristics_lookup() {
        let chars = Characteristics::from(&PeripheralSettings::default());
        assert_eq!(chars.for_kind(MetricKind::Network), chars.network);
        assert_eq!(chars.kind_of(chars.percent), Some(MetricKind::Percent));
        assert_eq!(chars.kind_of(Uuid::nil()), None);
    }
}
