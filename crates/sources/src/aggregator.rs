//! Reduces sensor readings and collaborator values into the three metric tuples
//!
//! All three sampling calls are total: anything that cannot be read
//! degrades to zero and is logged, never propagated.

use crate::hwinfo::HwinfoSource;
use hwmon_link_core::constants::KILO;
use hwmon_link_core::{GpuStats, HostStats};
use hwmon_link_types::{
    DecodedReading, NetSample, NetworkMetrics, PercentMetrics, ReadingKind, ScalarMetrics,
};

/// Temperature labels used for the CPU package (Intel, AMD)
pub const CPU_TEMP_LABELS: [&str; 2] = ["CPU Package", "CPU (Tctl/Tdie)"];

/// Power label used for the CPU package
pub const CPU_POWER_LABEL: &str = "CPU Package Power";

/// Truncate toward zero, like an integer cast (NaN becomes 0)
fn truncate(value: f64) -> i64 {
    value as i64
}

/// CPU values picked out of one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuReadings {
    pub temp: Option<f64>,
    pub power: Option<f64>,
    /// Per-core clocks (P-cores and E-cores, effective clocks excluded)
    pub core_clocks: Vec<f64>,
}

impl CpuReadings {
    /// Classify readings by kind and label (case-sensitive)
    ///
    /// If both CPU temperature labels appear, the one later in the reading
    /// array wins.
    pub fn classify(readings: &[DecodedReading]) -> Self {
        let mut out = Self::default();
        for reading in readings {
            let label = reading.label.as_str();
            match reading.kind {
                ReadingKind::Temperature if CPU_TEMP_LABELS.contains(&label) => {
                    out.temp = Some(reading.value);
                }
                ReadingKind::Power if label == CPU_POWER_LABEL => {
                    out.power = Some(reading.value);
                }
                ReadingKind::Clock if is_core_clock(label) => {
                    out.core_clocks.push(reading.value);
                }
                _ => {}
            }
        }
        out
    }

    /// Mean of the per-core clocks, 0 when none were found
    pub fn mean_clock(&self) -> f64 {
        if self.core_clocks.is_empty() {
            return 0.0;
        }
        self.core_clocks.iter().sum::<f64>() / self.core_clocks.len() as f64
    }
}

fn is_core_clock(label: &str) -> bool {
    label.contains("Clock")
        && (label.contains("P-core") || label.contains("E-core"))
        && !label.contains("Effective")
}

/// Build the scalar tuple from an optional snapshot and the GPU temperature
///
/// A missing snapshot zeroes clock, power and temperature together.
pub fn scalars_from_readings(readings: Option<&[DecodedReading]>, gpu_temp: f64) -> ScalarMetrics {
    let (clock, power, temp) = match readings {
        Some(readings) => {
            let cpu = CpuReadings::classify(readings);
            (
                cpu.mean_clock(),
                cpu.power.unwrap_or(0.0),
                cpu.temp.unwrap_or(0.0),
            )
        }
        None => (0.0, 0.0, 0.0),
    };

    ScalarMetrics {
        clock: truncate(clock),
        power: truncate(power),
        temp: truncate(temp),
        gpu_temp: truncate(gpu_temp),
    }
}

/// Network totals as of the previous sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkRateState {
    pub bytes_recv: u64,
    pub bytes_sent: u64,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
}

impl NetworkRateState {
    pub fn from_sample(sample: NetSample) -> Self {
        Self {
            bytes_recv: sample.bytes_recv,
            bytes_sent: sample.bytes_sent,
            timestamp: sample.timestamp,
        }
    }

    /// Compute rates since this state and return the state to use next time
    ///
    /// The returned state is always exactly `current`, even when no time has
    /// passed, so no byte range is ever counted twice. Rates are bytes/s
    /// divided by 1000 and may be negative after a counter reset.
    pub fn advance(self, current: NetSample) -> (NetworkMetrics, Self) {
        let elapsed = current.timestamp - self.timestamp;
        let delta_recv = current.bytes_recv as i128 - self.bytes_recv as i128;
        let delta_sent = current.bytes_sent as i128 - self.bytes_sent as i128;

        let rates = if elapsed > 0.0 {
            NetworkMetrics {
                down_kbps: truncate(delta_recv as f64 / elapsed / KILO),
                up_kbps: truncate(delta_sent as f64 / elapsed / KILO),
            }
        } else {
            NetworkMetrics::default()
        };

        (rates, Self::from_sample(current))
    }
}

/// Samples all three metric groups for one cycle
pub struct MetricAggregator<H, G> {
    hwinfo: HwinfoSource,
    host: H,
    gpu: G,
    rate: NetworkRateState,
}

impl<H: HostStats, G: GpuStats> MetricAggregator<H, G> {
    /// Create the aggregator, taking the network baseline from `host` now
    pub fn new(hwinfo: HwinfoSource, mut host: H, gpu: G) -> Self {
        let rate = NetworkRateState::from_sample(host.network_sample());
        Self {
            hwinfo,
            host,
            gpu,
            rate,
        }
    }

    /// CPU clock/power/temperature from the snapshot plus GPU temperature
    pub fn sample_scalars(&mut self) -> ScalarMetrics {
        let readings = self.hwinfo.poll();
        if readings.is_none() {
            log::warn!("Failed to access HWiNFO shared memory, CPU scalars reported as 0");
        }

        let gpu_temp = self.gpu.temperature().unwrap_or_else(|e| {
            log::warn!("GPU temperature unavailable: {}", e);
            0.0
        });

        let metrics = scalars_from_readings(readings.as_deref(), gpu_temp);
        log::info!("Retrieved scalar metrics: {}", metrics);
        metrics
    }

    /// Average download/upload rate since the previous call
    pub fn sample_network(&mut self) -> NetworkMetrics {
        let (metrics, next) = self.rate.advance(self.host.network_sample());
        self.rate = next;
        log::info!("Retrieved network metrics: {}", metrics);
        metrics
    }

    /// CPU, GPU and RAM utilization
    pub fn sample_percentages(&mut self) -> PercentMetrics {
        let cpu = self.host.cpu_percent();
        let gpu = self.gpu.utilization().unwrap_or_else(|e| {
            log::warn!("GPU utilization unavailable: {}", e);
            0.0
        });
        let ram = self.host.ram_percent();

        let metrics = PercentMetrics {
            cpu_pct: truncate(cpu),
            gpu_pct: truncate(gpu),
            ram_pct: truncate(ram),
        };
        log::info!("Retrieved percentage metrics: {}", metrics);
        metrics
    }

    /// Current network baseline
    pub fn rate_state(&self) -> NetworkRateState {
        self.rate
    }

    /// Decoded readings of one fresh snapshot, for listing
    pub fn readings(&self) -> Option<Vec<DecodedReading>> {
        self.hwinfo.poll()
    }
}
