//! Traits for the OS and GPU collaborators
//!
//! The aggregator only needs synchronous "current value" calls. Real
//! implementations live in `hwmon-link-sources`; tests use small fakes.

use crate::error::CollaboratorError;
use hwmon_link_types::NetSample;

/// Host operating system counters
pub trait HostStats {
    /// Instantaneous CPU utilization (0-100)
    fn cpu_percent(&mut self) -> f64;

    /// RAM utilization (0-100)
    fn ram_percent(&mut self) -> f64;

    /// Cumulative network byte counters with the current wall-clock time
    fn network_sample(&mut self) -> NetSample;
}

/// Vendor GPU query interface for a single fixed device
pub trait GpuStats {
    /// GPU core temperature in °C
    fn temperature(&mut self) -> Result<f64, CollaboratorError>;

    /// GPU utilization (0-100)
    fn utilization(&mut self) -> Result<f64, CollaboratorError>;
}

impl<T: HostStats + ?Sized> HostStats for Box<T> {
    fn cpu_percent(&mut self) -> f64 {
        (**self).cpu_percent()
    }

    fn ram_percent(&mut self) -> f64 {
        (**self).ram_percent()
    }

    fn network_sample(&mut self) -> NetSample {
        (**self).network_sample()
    }
}

impl<T: GpuStats + ?Sized> GpuStats for Box<T> {
    fn temperature(&mut self) -> Result<f64, CollaboratorError> {
        (**self).temperature()
    }

    fn utilization(&mut self) -> Result<f64, CollaboratorError> {
        (**self).utilization()
    }
}
