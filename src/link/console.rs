//! Dry-run link that logs payloads instead of transmitting them

use super::{Characteristics, Discovery, Session};
use hwmon_link_core::LinkError;
use std::time::Duration;
use uuid::Uuid;

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Discovers" a virtual peripheral immediately
pub struct ConsoleDiscovery {
    characteristics: Characteristics,
}

impl ConsoleDiscovery {
    pub fn new(characteristics: Characteristics) -> Self {
        Self { characteristics }
    }
}

impl Discovery for ConsoleDiscovery {
    type Peripheral = String;
    type Session = ConsoleSession;

    async fn discover(
        &mut self,
        name: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, LinkError> {
        log::info!("Dry run: pretending to find '{}'", name);
        Ok(Some(name.to_string()))
    }

    async fn connect(&mut self, peripheral: String) -> Result<ConsoleSession, LinkError> {
        Ok(ConsoleSession {
            name: peripheral,
            characteristics: self.characteristics,
            writes: 0,
        })
    }
}

/// Logs each write as hex
pub struct ConsoleSession {
    name: String,
    characteristics: Characteristics,
    writes: u64,
}

impl ConsoleSession {
    /// Number of payloads written so far
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl Session for ConsoleSession {
    async fn write_without_response(
        &mut self,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), LinkError> {
        let role = self
            .characteristics
            .kind_of(characteristic)
            .map(|k| k.as_str())
            .unwrap_or("?");
        log::info!(
            "[{}] {} {} <- {}",
            self.name,
            role,
            characteristic,
            hex(payload)
        );
        self.writes += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        log::info!("[{}] dry run finished after {} writes", self.name, self.writes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwmon_link_types::PeripheralSettings;

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x01, 0xab, 0x00]), "01 ab 00");
        assert_eq!(hex(&[]), "");
    }

    #[tokio::test]
    async fn test_console_link_counts_writes() {
        let chars = Characteristics::from(&PeripheralSettings::default());
        let mut discovery = ConsoleDiscovery::new(chars);
        let peripheral = discovery
            .discover("Bench", Duration::from_millis(1))
            .await
            .unwrap()
            .unwrap();
        let mut session = discovery.connect(peripheral).await.unwrap();
        session
            .write_without_response(chars.scalar, &[0u8; 16])
            .await
            .unwrap();
        session
            .write_without_response(chars.network, &[0u8; 8])
            .await
            .unwrap();
        assert_eq!(session.writes(), 2);
        session.disconnect().await.unwrap();
    }
}
