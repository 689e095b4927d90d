//! HWiNFO shared memory settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the region HWiNFO64 publishes when shared memory support is enabled
pub const DEFAULT_REGION_NAME: &str = "Global\\HWiNFO_SENS_SM2";

fn default_region_name() -> String {
    DEFAULT_REGION_NAME.to_string()
}

/// Where the sensor snapshot is read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// Name of the producer's shared memory region
    #[serde(default = "default_region_name")]
    pub region_name: String,
    /// Read a dumped snapshot file instead of the live region
    #[serde(default)]
    pub dump_file: Option<PathBuf>,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            region_name: default_region_name(),
            dump_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reads_live_region() {
        let settings = SnapshotSettings::default();
        assert_eq!(settings.region_name, DEFAULT_REGION_NAME);
        assert!(settings.dump_file.is_none());

        let parsed: SnapshotSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, settings);
    }
}
