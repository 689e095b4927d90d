//! NVIDIA GPU backend using NVML

use hwmon_link_core::{CollaboratorError, GpuStats};

#[cfg(feature = "nvidia")]
use nvml_wrapper::{enum_wrappers::device::TemperatureSensor, Nvml};
#[cfg(feature = "nvidia")]
use once_cell::sync::Lazy;

/// NVML is initialised once per process and shared
#[cfg(feature = "nvidia")]
static NVML: Lazy<Result<Nvml, String>> = Lazy::new(|| {
    log::info!("Initialising NVML");
    Nvml::init().map_err(|e| e.to_string())
});

/// NVIDIA GPU at a fixed device index
pub struct NvidiaGpu {
    #[cfg_attr(not(feature = "nvidia"), allow(dead_code))]
    device_index: u32,
    name: String,
}

impl NvidiaGpu {
    /// Open the NVIDIA GPU at `index`
    #[cfg(feature = "nvidia")]
    pub fn new(index: u32) -> Result<Self, CollaboratorError> {
        let nvml = nvml()?;
        let device = nvml
            .device_by_index(index)
            .map_err(|_| CollaboratorError::NoDevice(index))?;
        let name = device
            .name()
            .unwrap_or_else(|_| format!("NVIDIA GPU {}", index));

        Ok(Self {
            device_index: index,
            name,
        })
    }

    /// Open the NVIDIA GPU (disabled when nvidia feature is off)
    #[cfg(not(feature = "nvidia"))]
    pub fn new(_index: u32) -> Result<Self, CollaboratorError> {
        Err(CollaboratorError::NotCompiled("NVIDIA"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(feature = "nvidia")]
fn nvml() -> Result<&'static Nvml, CollaboratorError> {
    NVML.as_ref().map_err(|e| CollaboratorError::Query(e.clone()))
}

impl GpuStats for NvidiaGpu {
    fn temperature(&mut self) -> Result<f64, CollaboratorError> {
        #[cfg(feature = "nvidia")]
        {
            let device = nvml()?
                .device_by_index(self.device_index)
                .map_err(|e| CollaboratorError::Query(e.to_string()))?;
            device
                .temperature(TemperatureSensor::Gpu)
                .map(f64::from)
                .map_err(|e| CollaboratorError::Query(e.to_string()))
        }

        #[cfg(not(feature = "nvidia"))]
        Err(CollaboratorError::NotCompiled("NVIDIA"))
    }

    fn utilization(&mut self) -> Result<f64, CollaboratorError> {
        #[cfg(feature = "nvidia")]
        {
            let device = nvml()?
                .device_by_index(self.device_index)
                .map_err(|e| CollaboratorError::Query(e.to_string()))?;
            device
                .utilization_rates()
                .map(|u| f64::from(u.gpu))
                .map_err(|e| CollaboratorError::Query(e.to_string()))
        }

        #[cfg(not(feature = "nvidia"))]
        Err(CollaboratorError::NotCompiled("NVIDIA"))
    }
}
