//! `HWiNFO_SENSORS_SHARED_MEM2` header

use super::cursor::ByteCursor;
use hwmon_link_core::constants::SNAPSHOT_HEADER_SIZE;
use hwmon_link_core::SnapshotError;

/// Header at offset 0 of the shared region
///
/// Packed, little-endian, in this field order. Only the reading section
/// fields are used to walk the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic number; zero until the producer has written data
    pub signature: u32,
    pub version: u32,
    pub revision: u32,
    /// Timestamp of the producer's last poll
    pub poll_time: i64,
    pub sensor_offset: u32,
    pub sensor_size: u32,
    pub sensor_count: u32,
    /// Offset of the first reading record
    pub reading_offset: u32,
    /// Size of one reading record (stride between records)
    pub reading_size: u32,
    pub reading_count: u32,
}

impl SnapshotHeader {
    /// Parse the header from the start of a region
    pub fn parse(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.len() < SNAPSHOT_HEADER_SIZE {
            return Err(SnapshotError::Truncated {
                len: bytes.len(),
                needed: SNAPSHOT_HEADER_SIZE,
            });
        }

        let mut cur = ByteCursor::new(&bytes[..SNAPSHOT_HEADER_SIZE]);
        let header = Self {
            signature: cur.u32(),
            version: cur.u32(),
            revision: cur.u32(),
            poll_time: cur.i64(),
            sensor_offset: cur.u32(),
            sensor_size: cur.u32(),
            sensor_count: cur.u32(),
            reading_offset: cur.u32(),
            reading_size: cur.u32(),
            reading_count: cur.u32(),
        };

        if header.signature == 0 {
            return Err(SnapshotError::NotPopulated);
        }
        Ok(header)
    }

    /// Serialize back to the packed layout (used to build test and replay dumps)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SNAPSHOT_HEADER_SIZE);
        out.extend_from_slice(&self.signature.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.revision.to_le_bytes());
        out.extend_from_slice(&self.poll_time.to_le_bytes());
        out.extend_from_slice(&self.sensor_offset.to_le_bytes());
        out.extend_from_slice(&self.sensor_size.to_le_bytes());
        out.extend_from_slice(&self.sensor_count.to_le_bytes());
        out.extend_from_slice(&self.reading_offset.to_le_bytes());
        out.extend_from_slice(&self.reading_size.to_le_bytes());
        out.extend_from_slice(&self.reading_count.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal_header() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[0x53, 0x69, 0x57, 0x48]); // "HWiS"
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        buf.extend_from_slice(&44u32.to_le_bytes());
        buf.extend_from_slice(&264u32.to_le_bytes());
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&836u32.to_le_bytes());
        buf.extend_from_slice(&316u32.to_le_bytes());
        buf.extend_from_slice(&57u32.to_le_bytes());
        buf
    }

    #[test]
    fn test_parse_literal_header() {
        let buf = literal_header();
        assert_eq!(buf.len(), SNAPSHOT_HEADER_SIZE);

        let header = SnapshotHeader::parse(&buf).unwrap();
        assert_eq!(header.signature, 0x4857_6953);
        assert_eq!(header.version, 2);
        assert_eq!(header.revision, 1);
        assert_eq!(header.poll_time, 1_700_000_000);
        assert_eq!(header.sensor_count, 3);
        assert_eq!(
            (header.reading_offset, header.reading_size, header.reading_count),
            (836, 316, 57)
        );
        assert_eq!(header.to_bytes(), buf);
    }

    #[test]
    fn test_zero_signature_is_not_populated() {
        let mut buf = literal_header();
        buf[..4].copy_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            SnapshotHeader::parse(&buf),
            Err(SnapshotError::NotPopulated)
        ));
    }

    #[test]
    fn test_short_buffer_is_truncated() {
        let buf = literal_header();
        let err = SnapshotHeader::parse(&buf[..SNAPSHOT_HEADER_SIZE - 1]).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Truncated { len: 43, needed: 44 }
        ));
        assert!(SnapshotHeader::parse(&[]).is_err());
    }
}
