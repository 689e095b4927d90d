//! Bluetooth LE link using btleplug

use super::{Discovery, Session};
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use hwmon_link_core::LinkError;
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

/// How often the adapter's peripheral list is re-checked while scanning
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn transport(e: btleplug::Error) -> LinkError {
    match e {
        btleplug::Error::NotConnected => LinkError::Disconnected,
        other => LinkError::Transport(other.to_string()),
    }
}

/// Scans with the first Bluetooth adapter
pub struct BleDiscovery {
    adapter: Adapter,
    service: Uuid,
}

impl BleDiscovery {
    /// Open the first adapter; scans only report peripherals advertising `service`
    pub async fn new(service: Uuid) -> Result<Self, LinkError> {
        let manager = Manager::new().await.map_err(transport)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(transport)?
            .into_iter()
            .next()
            .ok_or_else(|| LinkError::Transport("no Bluetooth adapter found".to_string()))?;
        if let Ok(info) = adapter.adapter_info().await {
            log::info!("Using Bluetooth adapter {}", info);
        }
        Ok(Self { adapter, service })
    }
}

fn scan_filter(service: Uuid) -> ScanFilter {
    ScanFilter {
        services: vec![service],
    }
}

async fn find_named(adapter: &Adapter, name: &str) -> btleplug::Result<Peripheral> {
    loop {
        for peripheral in adapter.peripherals().await? {
            if let Some(props) = peripheral.properties().await? {
                if props.local_name.as_deref() == Some(name) {
                    return Ok(peripheral);
                }
            }
        }
        tokio::time::sleep(SCAN_POLL_INTERVAL).await;
    }
}

impl Discovery for BleDiscovery {
    type Peripheral = Peripheral;
    type Session = BleSession;

    async fn discover(
        &mut self,
        name: &str,
        timeout: Duration,
    ) -> Result<Option<Peripheral>, LinkError> {
        self.adapter
            .start_scan(scan_filter(self.service))
            .await
            .map_err(transport)?;
        let found = tokio::time::timeout(timeout, find_named(&self.adapter, name)).await;
        if let Err(e) = self.adapter.stop_scan().await {
            log::debug!("Failed to stop scan: {}", e);
        }

        match found {
            Ok(Ok(peripheral)) => Ok(Some(peripheral)),
            Ok(Err(e)) => Err(transport(e)),
            Err(_elapsed) => Ok(None),
        }
    }

    async fn connect(&mut self, peripheral: Peripheral) -> Result<BleSession, LinkError> {
        peripheral.connect().await.map_err(transport)?;
        peripheral.discover_services().await.map_err(transport)?;
        let characteristics = peripheral.characteristics();
        log::debug!("Peripheral exposes {} characteristics", characteristics.len());
        Ok(BleSession {
            peripheral,
            characteristics,
        })
    }
}

/// A connected GATT client session
pub struct BleSession {
    peripheral: Peripheral,
    characteristics: BTreeSet<Characteristic>,
}

impl Session for BleSession {
    async fn write_without_response(
        &mut self,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), LinkError> {
        let target = self
            .characteristics
            .iter()
            .find(|c| c.uuid == characteristic)
            .ok_or(LinkError::MissingCharacteristic {
                uuid: characteristic,
            })?;
        self.peripheral
            .write(target, payload, WriteType::WithoutResponse)
            .await
            .map_err(transport)
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        self.peripheral.disconnect().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwmon_link_types::PeripheralSettings;

    #[test]
    fn test_scan_filter_uses_configured_service() {
        let settings = PeripheralSettings::default();
        let filter = scan_filter(settings.service_uuid);
        assert_eq!(filter.services, vec![settings.service_uuid]);
    }
}
