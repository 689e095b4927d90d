//! hwmon-link-core: Core traits, constants and the wire codec for hwmon-link.
//!
//! This crate contains the collaborator traits (HostStats, GpuStats), the
//! error taxonomy, the fixed layout constants of the HWiNFO snapshot and the
//! little-endian payload codec shared with the display firmware.

pub mod constants;
mod collaborator;
pub mod error;
pub mod wire;

pub use collaborator::{GpuStats, HostStats};
pub use constants::{
    DEFAULT_CYCLE_INTERVAL, KILO, MAX_PAYLOAD_LEN, READING_ELEMENT_SIZE, SNAPSHOT_HEADER_SIZE,
};
pub use error::{CollaboratorError, DecodeError, EncodeError, LinkError, SnapshotError};
pub use wire::{decode, encode, encode_tagged, payload_len};

// Re-export types used in trait signatures for convenience
pub use hwmon_link_types::{MetricFrame, MetricKind, NetSample};
