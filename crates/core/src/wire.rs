//! Fixed-width payload codec shared with the display firmware
//!
//! Every metric group travels as a bare sequence of little-endian `u32`
//! fields in declaration order. There is no tag or version byte: the
//! receiver knows the group from the characteristic it was written to and
//! checks the length.
//!
//! | group   | bytes | fields                          |
//! |---------|-------|---------------------------------|
//! | scalar  | 16    | clock, power, temp, gpu_temp    |
//! | network | 8     | down_kbps, up_kbps              |
//! | percent | 12    | cpu_pct, gpu_pct, ram_pct       |

use crate::constants::MAX_PAYLOAD_LEN;
use crate::error::{DecodeError, EncodeError};
use hwmon_link_types::{MetricFrame, MetricKind};

const FIELD_LEN: usize = 4;

/// Payload length in bytes for a metric group
pub const fn payload_len(kind: MetricKind) -> usize {
    kind.field_count() * FIELD_LEN
}

const _: () = assert!(payload_len(MetricKind::Scalar) <= MAX_PAYLOAD_LEN);
const _: () = assert!(payload_len(MetricKind::Network) <= MAX_PAYLOAD_LEN);
const _: () = assert!(payload_len(MetricKind::Percent) <= MAX_PAYLOAD_LEN);

/// Encode a metric frame
///
/// Values outside `0..=u32::MAX` are rejected, never clamped or wrapped.
pub fn encode(frame: &MetricFrame) -> Result<Vec<u8>, EncodeError> {
    pack(frame.kind(), &frame.values())
}

/// Encode wire-ordered values for a group named by its tag
/// (`"scalar"`, `"network"` or `"percent"`)
pub fn encode_tagged(tag: &str, values: &[i64]) -> Result<Vec<u8>, EncodeError> {
    let kind = tag
        .parse::<MetricKind>()
        .map_err(EncodeError::UnsupportedKind)?;
    pack(kind, values)
}

fn pack(kind: MetricKind, values: &[i64]) -> Result<Vec<u8>, EncodeError> {
    if values.len() != kind.field_count() {
        return Err(EncodeError::FieldCount {
            kind,
            expected: kind.field_count(),
            actual: values.len(),
        });
    }

    let mut buf = Vec::with_capacity(payload_len(kind));
    for (&value, &field) in values.iter().zip(kind.field_names()) {
        let word = u32::try_from(value).map_err(|_| EncodeError::ValueOutOfRange {
            kind,
            field,
            value,
        })?;
        buf.extend_from_slice(&word.to_le_bytes());
    }
    Ok(buf)
}

/// Decode a payload received on the characteristic for `kind`
pub fn decode(kind: MetricKind, bytes: &[u8]) -> Result<MetricFrame, DecodeError> {
    let expected = payload_len(kind);
    if bytes.len() != expected {
        return Err(DecodeError::Length {
            kind,
            expected,
            actual: bytes.len(),
        });
    }

    let values: Vec<i64> = bytes
        .chunks_exact(FIELD_LEN)
        .map(|c| i64::from(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect();

    // Length was checked above, so the field count always matches
    MetricFrame::from_values(kind, &values).ok_or(DecodeError::Length {
        kind,
        expected,
        actual: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwmon_link_types::{NetworkMetrics, PercentMetrics, ScalarMetrics};

    #[test]
    fn test_scalar_layout() {
        let frame = MetricFrame::Scalar(ScalarMetrics {
            clock: 1,
            power: 2,
            temp: 3,
            gpu_temp: 4,
        });
        let bytes = encode(&frame).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x04,
                0x00, 0x00, 0x00
            ]
        );
    }

    #[test]
    fn test_payload_lengths() {
        assert_eq!(payload_len(MetricKind::Scalar), 16);
        assert_eq!(payload_len(MetricKind::Network), 8);
        assert_eq!(payload_len(MetricKind::Percent), 12);

        let network = encode(&MetricFrame::Network(NetworkMetrics {
            down_kbps: 0x0102_0304,
            up_kbps: 7,
        }))
        .unwrap();
        assert_eq!(network, vec![0x04, 0x03, 0x02, 0x01, 0x07, 0x00, 0x00, 0x00]);

        let percent = encode(&MetricFrame::Percent(PercentMetrics {
            cpu_pct: 12,
            gpu_pct: 99,
            ram_pct: 100,
        }))
        .unwrap();
        assert_eq!(percent.len(), 12);
        assert_eq!(&percent[8..], &[100, 0, 0, 0]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let frame = MetricFrame::Scalar(ScalarMetrics {
            clock: 4100,
            power: 65,
            temp: 62,
            gpu_temp: 48,
        });
        assert_eq!(encode(&frame).unwrap(), encode(&frame).unwrap());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert_eq!(
            encode_tagged("voltage", &[1, 2]),
            Err(EncodeError::UnsupportedKind("voltage".to_string()))
        );
        assert_eq!(encode_tagged("network", &[1, 2]).unwrap().len(), 8);
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        assert_eq!(
            encode_tagged("percent", &[1, 2]),
            Err(EncodeError::FieldCount {
                kind: MetricKind::Percent,
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let negative = MetricFrame::Network(NetworkMetrics {
            down_kbps: -5,
            up_kbps: 3,
        });
        assert_eq!(
            encode(&negative),
            Err(EncodeError::ValueOutOfRange {
                kind: MetricKind::Network,
                field: "down_kbps",
                value: -5,
            })
        );

        let too_large = encode_tagged("scalar", &[0, 0, 0, i64::from(u32::MAX) + 1]);
        assert!(matches!(
            too_large,
            Err(EncodeError::ValueOutOfRange { field: "gpu_temp", .. })
        ));
        assert!(encode_tagged("scalar", &[0, 0, 0, i64::from(u32::MAX)]).is_ok());
    }

    #[test]
    fn test_decode_matches_encode() {
        let frame = MetricFrame::Percent(PercentMetrics {
            cpu_pct: 7,
            gpu_pct: 31,
            ram_pct: 58,
        });
        let bytes = encode(&frame).unwrap();
        assert_eq!(decode(MetricKind::Percent, &bytes), Ok(frame));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(
            decode(MetricKind::Scalar, &[0u8; 12]),
            Err(DecodeError::Length {
                kind: MetricKind::Scalar,
                expected: 16,
                actual: 12,
            })
        );
    }
}
