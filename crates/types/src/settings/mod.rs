//! Configuration sections shared between the application and the sources.

pub mod gpu;
pub mod peripheral;
pub mod snapshot;

// Re-export all settings types for convenience
pub use gpu::GpuSettings;
pub use peripheral::PeripheralSettings;
pub use snapshot::SnapshotSettings;
