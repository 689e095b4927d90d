//! GPU collaborator settings.

use serde::{Deserialize, Serialize};

/// GPU settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GpuSettings {
    /// NVML device index to query
    #[serde(default)]
    pub index: u32,
}
