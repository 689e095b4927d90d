//! hwmon-link-types: Shared data types for the hwmon-link telemetry pipeline.
//!
//! This crate contains pure data types (decoded sensor readings, metric
//! tuples, collaborator samples and configuration sections) that are shared
//! across all hwmon-link crates. It has no platform dependencies.

pub mod metrics;
pub mod reading;
pub mod sample;
pub mod settings;

// Re-export commonly used types at the crate root for convenience
pub use metrics::{MetricFrame, MetricKind, NetworkMetrics, PercentMetrics, ScalarMetrics};
pub use reading::{DecodedReading, ReadingKind};
pub use sample::NetSample;
pub use settings::{GpuSettings, PeripheralSettings, SnapshotSettings};
