//! Host CPU, RAM and network counters via sysinfo

use chrono::Utc;
use hwmon_link_core::HostStats;
use hwmon_link_types::NetSample;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};

/// sysinfo-backed [`HostStats`]
///
/// Holds one `System` and one `Networks` instance for the life of the
/// process; each call refreshes only what it reads.
pub struct SysinfoHost {
    system: System,
    networks: Networks,
}

impl SysinfoHost {
    pub fn new() -> Self {
        log::info!("Creating sysinfo host collaborator");
        let mut system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new().with_cpu_usage())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );
        // CPU usage is a delta between refreshes; prime the first one
        system.refresh_cpu_usage();

        Self {
            system,
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostStats for SysinfoHost {
    fn cpu_percent(&mut self) -> f64 {
        self.system.refresh_cpu_usage();
        f64::from(self.system.global_cpu_usage())
    }

    fn ram_percent(&mut self) -> f64 {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }
        let used = total.saturating_sub(self.system.available_memory());
        used as f64 / total as f64 * 100.0
    }

    fn network_sample(&mut self) -> NetSample {
        self.networks.refresh();

        // Counters are summed over every interface, loopback included
        let (bytes_recv, bytes_sent) = self
            .networks
            .iter()
            .fold((0u64, 0u64), |(recv, sent), (_, data)| {
                (
                    recv.saturating_add(data.total_received()),
                    sent.saturating_add(data.total_transmitted()),
                )
            });

        NetSample {
            bytes_recv,
            bytes_sent,
            timestamp: Utc::now().timestamp_micros() as f64 / 1e6,
        }
    }
}
