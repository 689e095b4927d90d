//! hwmon-link-sources: Sensor sources for the hwmon-link telemetry pipeline.
//!
//! - `hwinfo`: HWiNFO64 shared memory snapshot reader and record decoder
//! - `system`: CPU/RAM/network counters via sysinfo
//! - `gpu`: GPU temperature and utilization via NVML
//! - `aggregator`: reduces all of the above into the three metric tuples

pub mod aggregator;
pub mod gpu;
pub mod hwinfo;
mod system;

pub use aggregator::{CpuReadings, MetricAggregator, NetworkRateState};
pub use gpu::{open_gpu, NvidiaGpu, UnavailableGpu};
pub use hwinfo::{
    build_snapshot, decode_all, read_snapshot, FileProvider, HwinfoSource, MemoryProvider, NamedRegionProvider,
    RegionProvider, Snapshot, SnapshotHeader,
};
pub use system::SysinfoHost;
