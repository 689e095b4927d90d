//! Derived metric tuples produced once per transmission cycle

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CPU clock (MHz), CPU package power (W), CPU temperature and GPU temperature (°C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScalarMetrics {
    pub clock: i64,
    pub power: i64,
    pub temp: i64,
    pub gpu_temp: i64,
}

/// Average download/upload rate since the previous cycle
///
/// Units are bytes/s divided by 1000, kept for compatibility with the
/// display firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub down_kbps: i64,
    pub up_kbps: i64,
}

impl NetworkMetrics {
    /// Replace negative rates (counter resets) with zero
    pub fn clamped(self) -> Self {
        Self {
            down_kbps: self.down_kbps.max(0),
            up_kbps: self.up_kbps.max(0),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.down_kbps < 0 || self.up_kbps < 0
    }
}

/// Instantaneous CPU, GPU and RAM utilization in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PercentMetrics {
    pub cpu_pct: i64,
    pub gpu_pct: i64,
    pub ram_pct: i64,
}

/// Tag identifying one of the three metric groups on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Scalar,
    Network,
    Percent,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Scalar, MetricKind::Network, MetricKind::Percent];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Scalar => "scalar",
            MetricKind::Network => "network",
            MetricKind::Percent => "percent",
        }
    }

    /// Number of u32 fields in this group's payload
    pub const fn field_count(&self) -> usize {
        match self {
            MetricKind::Scalar => 4,
            MetricKind::Network => 2,
            MetricKind::Percent => 3,
        }
    }

    /// Field names in wire order
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            MetricKind::Scalar => &["clock", "power", "temp", "gpu_temp"],
            MetricKind::Network => &["down_kbps", "up_kbps"],
            MetricKind::Percent => &["cpu_pct", "gpu_pct", "ram_pct"],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scalar" => Ok(MetricKind::Scalar),
            "network" => Ok(MetricKind::Network),
            "percent" => Ok(MetricKind::Percent),
            other => Err(other.to_string()),
        }
    }
}

/// One metric group ready for encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricFrame {
    Scalar(ScalarMetrics),
    Network(NetworkMetrics),
    Percent(PercentMetrics),
}

impl MetricFrame {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricFrame::Scalar(_) => MetricKind::Scalar,
            MetricFrame::Network(_) => MetricKind::Network,
            MetricFrame::Percent(_) => MetricKind::Percent,
        }
    }

    /// Field values in wire order
    pub fn values(&self) -> Vec<i64> {
        match self {
            MetricFrame::Scalar(m) => vec![m.clock, m.power, m.temp, m.gpu_temp],
            MetricFrame::Network(m) => vec![m.down_kbps, m.up_kbps],
            MetricFrame::Percent(m) => vec![m.cpu_pct, m.gpu_pct, m.ram_pct],
        }
    }

    /// Rebuild a frame from wire-ordered values
    ///
    /// Returns `None` when the number of values does not match the kind.
    pub fn from_values(kind: MetricKind, values: &[i64]) -> Option<Self> {
        match (kind, values) {
            (MetricKind::Scalar, &[clock, power, temp, gpu_temp]) => {
                Some(MetricFrame::Scalar(ScalarMetrics { clock, power, temp, gpu_temp }))
            }
            (MetricKind::Network, &[down_kbps, up_kbps]) => {
                Some(MetricFrame::Network(NetworkMetrics { down_kbps, up_kbps }))
            }
            (MetricKind::Percent, &[cpu_pct, gpu_pct, ram_pct]) => {
                Some(MetricFrame::Percent(PercentMetrics { cpu_pct, gpu_pct, ram_pct }))
            }
            _ => None,
        }
    }
}

impl From<ScalarMetrics> for MetricFrame {
    fn from(m: ScalarMetrics) -> Self {
        MetricFrame::Scalar(m)
    }
}

impl From<NetworkMetrics> for MetricFrame {
    fn from(m: NetworkMetrics) -> Self {
        MetricFrame::Network(m)
    }
}

impl From<PercentMetrics> for MetricFrame {
    fn from(m: PercentMetrics) -> Self {
        MetricFrame::Percent(m)
    }
}

impl fmt::Display for ScalarMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU Clock ({} MHz), CPU Power ({} W), CPU Temp ({}°C), GPU Temp ({}°C)",
            self.clock, self.power, self.temp, self.gpu_temp
        )
    }
}

impl fmt::Display for NetworkMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Network Download ({} Kb/s), Network Upload ({} Kb/s)",
            self.down_kbps, self.up_kbps
        )
    }
}

impl fmt::Display for PercentMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU Percent ({}%), GPU Percent ({}%), RAM Percent ({}%)",
            self.cpu_pct, self.gpu_pct, self.ram_pct
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_parse() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.as_str().parse::<MetricKind>(), Ok(kind));
            assert_eq!(kind.field_names().len(), kind.field_count());
        }
        assert_eq!("voltage".parse::<MetricKind>(), Err("voltage".to_string()));
    }

    #[test]
    fn test_frame_values_in_wire_order() {
        let frame = MetricFrame::from(ScalarMetrics {
            clock: 1,
            power: 2,
            temp: 3,
            gpu_temp: 4,
        });
        assert_eq!(frame.values(), vec![1, 2, 3, 4]);
        assert_eq!(MetricFrame::from_values(MetricKind::Scalar, &[1, 2, 3, 4]), Some(frame));
        assert_eq!(MetricFrame::from_values(MetricKind::Network, &[1, 2, 3]), None);
    }

    #[test]
    fn test_network_clamp() {
        let rates = NetworkMetrics {
            down_kbps: -12,
            up_kbps: 40,
        };
        assert!(rates.is_negative());
        let clamped = rates.clamped();
        assert_eq!(clamped.down_kbps, 0);
        assert_eq!(clamped.up_kbps, 40);
        assert!(!clamped.is_negative());
    }
}
