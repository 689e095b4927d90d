//! GPU collaborator
//!
//! Only NVIDIA devices are queried (through NVML). When NVML is not compiled
//! in or no device exists at the configured index, an [`UnavailableGpu`]
//! stands in and every query fails, which the aggregator reports as zero.

mod nvidia;

pub use nvidia::NvidiaGpu;

use hwmon_link_core::{CollaboratorError, GpuStats};
use hwmon_link_types::GpuSettings;

/// Placeholder for a GPU that could not be opened
#[derive(Debug, Clone)]
pub struct UnavailableGpu {
    reason: String,
}

impl UnavailableGpu {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl GpuStats for UnavailableGpu {
    fn temperature(&mut self) -> Result<f64, CollaboratorError> {
        Err(CollaboratorError::Query(self.reason.clone()))
    }

    fn utilization(&mut self) -> Result<f64, CollaboratorError> {
        Err(CollaboratorError::Query(self.reason.clone()))
    }
}

/// Open the configured GPU, falling back to [`UnavailableGpu`]
pub fn open_gpu(settings: &GpuSettings) -> Box<dyn GpuStats + Send> {
    log::warn!("=== Opening GPU {} ===", settings.index);
    match NvidiaGpu::new(settings.index) {
        Ok(gpu) => {
            log::info!("  NVIDIA GPU {}: {}", settings.index, gpu.name());
            Box::new(gpu)
        }
        Err(e) => {
            log::warn!("  GPU {} unavailable, reporting zero: {}", settings.index, e);
            Box::new(UnavailableGpu::new(e.to_string()))
        }
    }
}
