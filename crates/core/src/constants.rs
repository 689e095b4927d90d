//! Shared constants for the telemetry pipeline

use std::time::Duration;

/// Size of the packed `HWiNFO_SENSORS_SHARED_MEM2` header (`<LLLQLLLLLL`)
pub const SNAPSHOT_HEADER_SIZE: usize = 44;

/// Length of each label string in a reading record
pub const LABEL_LEN: usize = 128;

/// Length of the unit string in a reading record
pub const UNIT_LEN: usize = 16;

/// Size of the packed `HWiNFO_SENSORS_READING_ELEMENT` record (`<III128s128s16sdddd`)
///
/// The header's element stride may be larger on newer producer revisions;
/// only this many leading bytes are interpreted.
pub const READING_ELEMENT_SIZE: usize = 3 * 4 + 2 * LABEL_LEN + UNIT_LEN + 4 * 8;

/// Legacy rate divisor: bytes/s are reported divided by 1000, not 1024
pub const KILO: f64 = 1e3;

/// Largest payload the peripheral's characteristics accept
pub const MAX_PAYLOAD_LEN: usize = 20;

/// Delay appended after each cycle's sends
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(2000);

const _: () = assert!(READING_ELEMENT_SIZE == 316);
