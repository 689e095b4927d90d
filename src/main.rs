use anyhow::{bail, Context, Result};
use clap::Parser;
use hwmon_link::link::{Characteristics, ConsoleDiscovery};
use hwmon_link::{AppConfig, LinkOutcome, Transmitter};
use hwmon_link_sources::{open_gpu, HwinfoSource, MetricAggregator, SysinfoHost};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

/// Streams CPU/GPU/RAM/network telemetry to a BLE hardware monitor display
#[derive(Parser, Debug, Clone)]
#[command(name = "hwmon-link")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the default location
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Advertised name of the display peripheral
    #[arg(long = "device", value_name = "NAME")]
    device: Option<String>,

    /// Delay between cycles in milliseconds
    #[arg(short = 'i', long = "interval-ms", value_name = "MS")]
    interval_ms: Option<u64>,

    /// How long to scan for the peripheral
    #[arg(long = "scan-timeout-secs", value_name = "SECS")]
    scan_timeout_secs: Option<u64>,

    /// Read the HWiNFO snapshot from a dump file instead of shared memory
    #[arg(long = "snapshot-file", value_name = "FILE")]
    snapshot_file: Option<PathBuf>,

    /// Index of the GPU to query
    #[arg(long = "gpu-index", value_name = "INDEX")]
    gpu_index: Option<u32>,

    /// Stop after this many cycles
    #[arg(short = 'n', long = "cycles", value_name = "N")]
    cycles: Option<u64>,

    /// Log payloads instead of sending them over Bluetooth
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Print the decoded HWiNFO readings and exit
    #[arg(short = 'l', long = "list-sensors")]
    list_sensors: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long = "write-default-config")]
    write_default_config: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "1")]
    debug: u8,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    fn apply(&self, config: &mut AppConfig) {
        if let Some(name) = &self.device {
            config.peripheral.name = name.clone();
        }
        if let Some(ms) = self.interval_ms {
            config.cycle_interval_ms = ms;
        }
        if let Some(secs) = self.scan_timeout_secs {
            config.peripheral.scan_timeout_secs = secs;
        }
        if let Some(path) = &self.snapshot_file {
            config.snapshot.dump_file = Some(path.clone());
        }
        if let Some(index) = self.gpu_index {
            config.gpu.index = index;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Level 0: warn only (shows only important === messages)
    // Level 1 (default): info, one status line per metric group per cycle
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    warn!("Starting hwmon-link v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {:#}", e);
            AppConfig::default()
        }),
    };
    cli.apply(&mut config);

    if cli.write_default_config {
        let path = match &cli.config {
            Some(path) => {
                config.save_to_path(path)?;
                path.clone()
            }
            None => config.save()?,
        };
        println!("Wrote configuration to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let hwinfo = HwinfoSource::from_settings(&config.snapshot);

    if cli.list_sensors {
        return list_sensors(&hwinfo);
    }

    let host = SysinfoHost::new();
    let gpu = open_gpu(&config.gpu);
    let aggregator = MetricAggregator::new(hwinfo, host, gpu);
    let characteristics = Characteristics::from(&config.peripheral);
    let mut transmitter = Transmitter::new(aggregator, characteristics, config.cycle_interval())
        .with_max_cycles(cli.cycles);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let name = config.peripheral.name.as_str();
    let scan_timeout = config.scan_timeout();

    let outcome = if cli.dry_run {
        let mut discovery = ConsoleDiscovery::new(characteristics);
        transmitter
            .run(&mut discovery, name, scan_timeout, shutdown)
            .await
            .context("Failed to encode metrics")?
    } else {
        let service = config.peripheral.service_uuid;
        run_ble(&mut transmitter, service, name, scan_timeout, shutdown).await?
    };

    Ok(report(outcome))
}

#[cfg(feature = "ble")]
async fn run_ble<H, G>(
    transmitter: &mut Transmitter<H, G>,
    service: uuid::Uuid,
    name: &str,
    scan_timeout: std::time::Duration,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<LinkOutcome>
where
    H: hwmon_link_core::HostStats,
    G: hwmon_link_core::GpuStats,
{
    let mut discovery = hwmon_link::link::BleDiscovery::new(service)
        .await
        .context("Failed to open Bluetooth adapter")?;
    transmitter
        .run(&mut discovery, name, scan_timeout, shutdown)
        .await
        .context("Failed to encode metrics")
}

#[cfg(not(feature = "ble"))]
async fn run_ble<H, G>(
    _transmitter: &mut Transmitter<H, G>,
    _service: uuid::Uuid,
    _name: &str,
    _scan_timeout: std::time::Duration,
    _shutdown: impl std::future::Future<Output = ()>,
) -> Result<LinkOutcome> {
    bail!("BLE support not enabled at compile time; rebuild with --features ble or use --dry-run")
}

/// Map the session outcome to a process exit code
fn report(outcome: LinkOutcome) -> ExitCode {
    match outcome {
        LinkOutcome::Terminated { cycles } => {
            warn!("=== Terminated after {} cycles ===", cycles);
            ExitCode::SUCCESS
        }
        LinkOutcome::NotFound => {
            error!("Display peripheral not found; is it powered on and advertising?");
            ExitCode::from(2)
        }
        LinkOutcome::Disconnected(e) => {
            error!("Disconnected: {}", e);
            ExitCode::from(3)
        }
    }
}

fn list_sensors(hwinfo: &HwinfoSource) -> Result<ExitCode> {
    let Some(readings) = hwinfo.poll() else {
        bail!("No HWiNFO snapshot available from {}", hwinfo.describe());
    };

    println!("HWiNFO readings from {}:", hwinfo.describe());
    println!();
    for reading in &readings {
        println!(
            "  [{:>11}] {:<40} {:>12.3} {}",
            reading.kind.as_str(),
            reading.label,
            reading.value,
            reading.unit
        );
    }
    println!();
    println!("{} readings", readings.len());
    info!("Listed {} readings", readings.len());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "hwmon-link",
            "--device",
            "Desk Display",
            "--interval-ms",
            "500",
            "--scan-timeout-secs",
            "3",
            "--gpu-index",
            "1",
            "--snapshot-file",
            "sm2.bin",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.peripheral.name, "Desk Display");
        assert_eq!(config.cycle_interval_ms, 500);
        assert_eq!(config.peripheral.scan_timeout_secs, 3);
        assert_eq!(config.gpu.index, 1);
        assert_eq!(config.snapshot.dump_file, Some(PathBuf::from("sm2.bin")));
    }

    #[test]
    fn test_cli_defaults_leave_config_untouched() {
        let cli = Cli::parse_from(["hwmon-link"]);
        assert_eq!(cli.debug, 1);
        assert!(!cli.dry_run);

        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, AppConfig::default());
    }
}
