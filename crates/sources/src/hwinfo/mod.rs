//! HWiNFO64 shared memory ("SM2") snapshot reader
//!
//! Each poll opens the region, validates the header, copies every
//! decodable reading record out, and releases the region again. A missing
//! producer, an empty region or a truncated header all degrade to "no
//! snapshot" for this poll.

mod cursor;
mod header;
mod record;
mod region;

pub use header::SnapshotHeader;
pub use record::{decodable_records, decode_all, decode_label, encode_record, raw_records, RawRecord};
pub use region::{FileProvider, MemoryProvider, NamedRegionProvider, Region, RegionProvider};

use hwmon_link_core::constants::{READING_ELEMENT_SIZE, SNAPSHOT_HEADER_SIZE};
use hwmon_link_core::SnapshotError;
use hwmon_link_types::{DecodedReading, SnapshotSettings};

/// A validated snapshot: parsed header plus the still-mapped region
///
/// Dropping the snapshot releases the mapping.
pub struct Snapshot {
    header: SnapshotHeader,
    region: Box<dyn Region>,
}

impl Snapshot {
    /// Validate the header at the start of `region`
    pub fn parse(region: Box<dyn Region>) -> Result<Self, SnapshotError> {
        let header = SnapshotHeader::parse(region.bytes())?;
        Ok(Self { header, region })
    }

    pub fn header(&self) -> &SnapshotHeader {
        &self.header
    }

    pub fn reading_offset(&self) -> usize {
        self.header.reading_offset as usize
    }

    pub fn element_stride(&self) -> usize {
        self.header.reading_size as usize
    }

    pub fn element_count(&self) -> usize {
        self.header.reading_count as usize
    }

    pub fn region(&self) -> &[u8] {
        self.region.bytes()
    }

    /// Decode all reading records, consuming the snapshot
    pub fn into_readings(self) -> Vec<DecodedReading> {
        decode_all(
            self.region(),
            self.reading_offset(),
            self.element_stride(),
            self.element_count(),
        )
    }
}

/// Open the provider's region and validate its header
pub fn read_snapshot(provider: &dyn RegionProvider) -> Result<Snapshot, SnapshotError> {
    Snapshot::parse(provider.open()?)
}

/// Build a complete snapshot image from readings (replay dumps and tests)
pub fn build_snapshot(readings: &[DecodedReading]) -> Vec<u8> {
    let header = SnapshotHeader {
        signature: u32::from_le_bytes(*b"SiWH"),
        version: 2,
        revision: 1,
        poll_time: 0,
        sensor_offset: SNAPSHOT_HEADER_SIZE as u32,
        sensor_size: 0,
        sensor_count: 0,
        reading_offset: SNAPSHOT_HEADER_SIZE as u32,
        reading_size: READING_ELEMENT_SIZE as u32,
        reading_count: readings.len() as u32,
    };
    let mut out = header.to_bytes();
    for reading in readings {
        out.extend_from_slice(&encode_record(reading));
    }
    out
}

/// Polls the HWiNFO snapshot once per cycle
pub struct HwinfoSource {
    provider: Box<dyn RegionProvider>,
}

impl HwinfoSource {
    pub fn new(provider: Box<dyn RegionProvider>) -> Self {
        Self { provider }
    }

    /// Select the provider from settings: a dump file if configured,
    /// otherwise the named region
    pub fn from_settings(settings: &SnapshotSettings) -> Self {
        let provider: Box<dyn RegionProvider> = match &settings.dump_file {
            Some(path) => Box::new(FileProvider::new(path)),
            None => Box::new(NamedRegionProvider::new(settings.region_name.clone())),
        };
        log::info!("HWiNFO snapshot source: {}", provider.describe());
        Self::new(provider)
    }

    /// Read and decode one snapshot
    ///
    /// Returns `None` (after logging why) when no snapshot is available.
    pub fn poll(&self) -> Option<Vec<DecodedReading>> {
        match read_snapshot(self.provider.as_ref()) {
            Ok(snapshot) => {
                log::trace!(
                    "Snapshot v{}.{}: {} readings of {} bytes at offset {}",
                    snapshot.header().version,
                    snapshot.header().revision,
                    snapshot.element_count(),
                    snapshot.element_stride(),
                    snapshot.reading_offset()
                );
                Some(snapshot.into_readings())
            }
            Err(SnapshotError::NotFound { name }) => {
                log::warn!("HWiNFO shared memory not found ({})", name);
                log::warn!(
                    "Please ensure HWiNFO64 is running and 'Shared Memory Support' is enabled"
                );
                None
            }
            Err(SnapshotError::NotPopulated) => {
                log::warn!("Cannot read HWiNFO shared memory region as it is empty");
                None
            }
            Err(e) => {
                log::warn!("HWiNFO snapshot unavailable: {}", e);
                None
            }
        }
    }

    pub fn describe(&self) -> String {
        self.provider.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwmon_link_types::ReadingKind;

    #[test]
    fn test_read_snapshot_returns_layout() {
        let image = build_snapshot(&[
            DecodedReading::new(ReadingKind::Temperature, "CPU Package", 62.5),
            DecodedReading::new(ReadingKind::Power, "CPU Package Power", 88.0),
        ]);
        let snapshot = read_snapshot(&MemoryProvider::new(image)).unwrap();
        assert_eq!(snapshot.reading_offset(), 44);
        assert_eq!(snapshot.element_stride(), 316);
        assert_eq!(snapshot.element_count(), 2);
        assert_eq!(snapshot.region().len(), 44 + 2 * 316);

        let readings = snapshot.into_readings();
        assert_eq!(readings[0].label, "CPU Package");
        assert_eq!(readings[1].value, 88.0);
    }

    #[test]
    fn test_corrupt_reading_count_only_walks_the_region() {
        let mut image = build_snapshot(&[DecodedReading::new(
            ReadingKind::Temperature,
            "CPU Package",
            62.5,
        )]);
        image[40..44].copy_from_slice(&u32::MAX.to_le_bytes());

        let started = std::time::Instant::now();
        let readings = HwinfoSource::new(Box::new(MemoryProvider::new(image)))
            .poll()
            .unwrap();
        assert_eq!(readings.len(), 1);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_zero_signature_is_absent() {
        let mut image = build_snapshot(&[DecodedReading::new(
            ReadingKind::Temperature,
            "CPU Package",
            62.5,
        )]);
        image[..4].fill(0);
        let source = HwinfoSource::new(Box::new(MemoryProvider::new(image)));
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_missing_and_truncated_are_absent() {
        assert!(HwinfoSource::new(Box::new(MemoryProvider::missing()))
            .poll()
            .is_none());
        assert!(HwinfoSource::new(Box::new(MemoryProvider::new(vec![1u8; 20])))
            .poll()
            .is_none());
    }

    #[test]
    fn test_empty_reading_section_is_present() {
        let source = HwinfoSource::new(Box::new(MemoryProvider::new(build_snapshot(&[]))));
        assert_eq!(source.poll(), Some(Vec::new()));
    }

    #[test]
    fn test_from_settings_prefers_dump_file() {
        let settings = SnapshotSettings {
            dump_file: Some("/tmp/hwinfo.bin".into()),
            ..SnapshotSettings::default()
        };
        assert!(HwinfoSource::from_settings(&settings)
            .describe()
            .contains("/tmp/hwinfo.bin"));
        assert!(HwinfoSource::from_settings(&SnapshotSettings::default())
            .describe()
            .contains("HWiNFO_SENS_SM2"));
    }
}
