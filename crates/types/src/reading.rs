//! Decoded HWiNFO sensor readings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a sensor reading (HWiNFO `SENSOR_READING_TYPE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadingKind {
    None,
    Temperature,
    Voltage,
    Fan,
    Current,
    Power,
    Clock,
    Usage,
    Other,
    /// A kind id this build does not know about (newer producer revision)
    Unknown(u32),
}

impl ReadingKind {
    /// Map the raw enum value stored in a reading record
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => ReadingKind::None,
            1 => ReadingKind::Temperature,
            2 => ReadingKind::Voltage,
            3 => ReadingKind::Fan,
            4 => ReadingKind::Current,
            5 => ReadingKind::Power,
            6 => ReadingKind::Clock,
            7 => ReadingKind::Usage,
            8 => ReadingKind::Other,
            n => ReadingKind::Unknown(n),
        }
    }

    /// Raw enum value as written by the producer
    pub fn as_raw(&self) -> u32 {
        match self {
            ReadingKind::None => 0,
            ReadingKind::Temperature => 1,
            ReadingKind::Voltage => 2,
            ReadingKind::Fan => 3,
            ReadingKind::Current => 4,
            ReadingKind::Power => 5,
            ReadingKind::Clock => 6,
            ReadingKind::Usage => 7,
            ReadingKind::Other => 8,
            ReadingKind::Unknown(n) => *n,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingKind::None => "none",
            ReadingKind::Temperature => "temperature",
            ReadingKind::Voltage => "voltage",
            ReadingKind::Fan => "fan",
            ReadingKind::Current => "current",
            ReadingKind::Power => "power",
            ReadingKind::Clock => "clock",
            ReadingKind::Usage => "usage",
            ReadingKind::Other => "other",
            ReadingKind::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingKind::Unknown(n) => write!(f, "unknown({})", n),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One reading record copied out of a snapshot
///
/// The record's position in the reading array is its only identity; nothing
/// here survives past the poll that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedReading {
    pub kind: ReadingKind,
    /// Index of the owning sensor block
    pub sensor_index: u32,
    pub reading_id: u32,
    /// Original label, e.g. "CPU Package"
    pub label: String,
    /// Label as renamed by the user (often identical to `label`)
    pub user_label: String,
    pub unit: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl DecodedReading {
    /// Convenience constructor used by aggregation code and tests
    pub fn new(kind: ReadingKind, label: impl Into<String>, value: f64) -> Self {
        let label = label.into();
        Self {
            kind,
            sensor_index: 0,
            reading_id: 0,
            user_label: label.clone(),
            label,
            unit: String::new(),
            value,
            min: value,
            max: value,
            avg: value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_kind_raw_mapping() {
        for raw in 0..=8 {
            assert_eq!(ReadingKind::from_raw(raw).as_raw(), raw);
        }
        assert_eq!(ReadingKind::from_raw(1), ReadingKind::Temperature);
        assert_eq!(ReadingKind::from_raw(5), ReadingKind::Power);
        assert_eq!(ReadingKind::from_raw(6), ReadingKind::Clock);
        assert_eq!(ReadingKind::from_raw(42), ReadingKind::Unknown(42));
        assert_eq!(ReadingKind::Unknown(42).to_string(), "unknown(42)");
    }
}
