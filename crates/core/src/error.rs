//! Error types for the telemetry pipeline.

use hwmon_link_types::MetricKind;

/// The sensor snapshot could not be obtained for this poll.
///
/// Every variant is recoverable: the scalar metric group degrades to zero
/// and the cycle continues.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The shared memory region does not exist (producer not running).
    #[error("shared memory region '{name}' not found")]
    NotFound { name: String },

    /// Named shared memory is not available on this platform.
    #[error("shared memory region '{name}' cannot be opened on this platform")]
    Unsupported { name: String },

    /// Opening or mapping the region failed.
    #[error("failed to map {what}: {source}")]
    Io {
        what: String,
        source: std::io::Error,
    },

    /// Fewer bytes than the fixed header were available.
    #[error("snapshot truncated: {len} bytes, header needs {needed}")]
    Truncated { len: usize, needed: usize },

    /// The producer has not written any data yet (zero signature).
    #[error("shared memory region is empty (producer has not populated it yet)")]
    NotPopulated,
}

/// An encoder contract violation. These are programmer errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("unsupported metric kind '{0}'")]
    UnsupportedKind(String),

    #[error("{kind} payload takes {expected} fields, got {actual}")]
    FieldCount {
        kind: MetricKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind}.{field} = {value} does not fit an unsigned 32-bit field")]
    ValueOutOfRange {
        kind: MetricKind,
        field: &'static str,
        value: i64,
    },
}

/// A received payload does not match the schema.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{kind} payload must be {expected} bytes, got {actual}")]
    Length {
        kind: MetricKind,
        expected: usize,
        actual: usize,
    },
}

/// Failures of the wireless link. All of them end the session.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Discovery finished without seeing the named peripheral.
    #[error("device '{name}' not found")]
    NotFound { name: String },

    /// The peripheral does not expose an expected characteristic.
    #[error("characteristic {uuid} not found on peripheral")]
    MissingCharacteristic { uuid: uuid::Uuid },

    /// The connection dropped.
    #[error("peripheral disconnected")]
    Disconnected,

    /// Any other transport failure (adapter, write, connect).
    #[error("transport error: {0}")]
    Transport(String),
}

/// A GPU or OS collaborator query failed.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{0} support not enabled at compile time")]
    NotCompiled(&'static str),

    #[error("no device at index {0}")]
    NoDevice(u32),

    #[error("query failed: {0}")]
    Query(String),
}
