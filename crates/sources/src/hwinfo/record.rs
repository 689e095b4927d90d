//! `HWiNFO_SENSORS_READING_ELEMENT` records
//!
//! Decoding is a two-stage transform: every in-bounds record is unpacked
//! into a [`RawRecord`] borrowing the region, then [`decodable_records`]
//! drops the records whose label cannot be decoded and copies the rest out
//! as owned [`DecodedReading`]s.

use super::cursor::ByteCursor;
use hwmon_link_core::constants::{LABEL_LEN, READING_ELEMENT_SIZE, UNIT_LEN};
use hwmon_link_types::{DecodedReading, ReadingKind};

/// One reading record unpacked in place
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    pub kind: u32,
    pub sensor_index: u32,
    pub reading_id: u32,
    pub label_orig: &'a [u8],
    pub label_user: &'a [u8],
    pub unit: &'a [u8],
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl<'a> RawRecord<'a> {
    /// Unpack the leading [`READING_ELEMENT_SIZE`] bytes of a record
    ///
    /// Returns `None` if the slice is shorter than the record layout.
    pub fn unpack(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < READING_ELEMENT_SIZE {
            return None;
        }
        let mut cur = ByteCursor::new(&bytes[..READING_ELEMENT_SIZE]);
        Some(Self {
            kind: cur.u32(),
            sensor_index: cur.u32(),
            reading_id: cur.u32(),
            label_orig: cur.bytes(LABEL_LEN),
            label_user: cur.bytes(LABEL_LEN),
            unit: cur.bytes(UNIT_LEN),
            value: cur.f64(),
            min: cur.f64(),
            max: cur.f64(),
            avg: cur.f64(),
        })
    }

    /// Copy the record out, or `None` if its original label is undecodable
    pub fn decode(&self) -> Option<DecodedReading> {
        let label = decode_label(self.label_orig)?;
        Some(DecodedReading {
            kind: ReadingKind::from_raw(self.kind),
            sensor_index: self.sensor_index,
            reading_id: self.reading_id,
            label,
            user_label: decode_label(self.label_user).unwrap_or_default(),
            unit: decode_label(self.unit).unwrap_or_default(),
            value: self.value,
            min: self.min,
            max: self.max,
            avg: self.avg,
        })
    }
}

/// Decode a NUL-padded C string, dropping invalid UTF-8 sequences
///
/// Returns `None` when the string has content but none of it is valid UTF-8.
/// An empty string (leading NUL) decodes to `Some("")`.
pub fn decode_label(raw: &[u8]) -> Option<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let raw = &raw[..end];

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                // error_len() is None for a sequence cut off by the end of input
                let skip = e.error_len().unwrap_or(after.len());
                rest = &after[skip..];
            }
        }
    }

    if out.is_empty() && !raw.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Slice out the `count` records of the reading section
///
/// Records that would extend past the end of the region (or whose stride is
/// smaller than the record layout) are skipped. The walk never goes further
/// than the region can hold, whatever `count` claims.
pub fn raw_records(
    region: &[u8],
    offset: usize,
    stride: usize,
    count: usize,
) -> impl Iterator<Item = RawRecord<'_>> {
    let capacity = match stride {
        0 => 0,
        stride => region.len().saturating_sub(offset) / stride,
    };
    if count > capacity {
        log::debug!(
            "Header claims {} readings but the region holds at most {}",
            count,
            capacity
        );
    }
    (0..count.min(capacity)).filter_map(move |i| {
        let start = i.checked_mul(stride)?.checked_add(offset)?;
        let end = start.checked_add(stride)?;
        let bytes = region.get(start..end);
        if bytes.is_none() {
            log::trace!("Reading record {} at {}..{} is outside the region", i, start, end);
        }
        RawRecord::unpack(bytes?)
    })
}

/// Filter stage: keep records with a decodable label, copied out as owned readings
pub fn decodable_records<'a>(
    records: impl Iterator<Item = RawRecord<'a>> + 'a,
) -> impl Iterator<Item = DecodedReading> + 'a {
    records.filter_map(|record| {
        let decoded = record.decode();
        if decoded.is_none() {
            log::trace!("Skipping reading {} with undecodable label", record.reading_id);
        }
        decoded
    })
}

/// Decode every reading record in the region
///
/// The result is an owned, one-shot list so the region can be released
/// immediately afterwards.
pub fn decode_all(region: &[u8], offset: usize, stride: usize, count: usize) -> Vec<DecodedReading> {
    decodable_records(raw_records(region, offset, stride, count)).collect()
}

/// Build a packed record (used for test and replay dumps)
pub fn encode_record(reading: &DecodedReading) -> Vec<u8> {
    fn padded(text: &str, len: usize) -> Vec<u8> {
        let mut field = vec![0u8; len];
        let bytes = text.as_bytes();
        let n = bytes.len().min(len - 1);
        field[..n].copy_from_slice(&bytes[..n]);
        field
    }

    let mut out = Vec::with_capacity(READING_ELEMENT_SIZE);
    out.extend_from_slice(&reading.kind.as_raw().to_le_bytes());
    out.extend_from_slice(&reading.sensor_index.to_le_bytes());
    out.extend_from_slice(&reading.reading_id.to_le_bytes());
    out.extend_from_slice(&padded(&reading.label, LABEL_LEN));
    out.extend_from_slice(&padded(&reading.user_label, LABEL_LEN));
    out.extend_from_slice(&padded(&reading.unit, UNIT_LEN));
    out.extend_from_slice(&reading.value.to_le_bytes());
    out.extend_from_slice(&reading.min.to_le_bytes());
    out.extend_from_slice(&reading.max.to_le_bytes());
    out.extend_from_slice(&reading.avg.to_le_bytes());
    out
}
