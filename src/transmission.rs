//! Transmission loop
//!
//! Drives one peripheral session from discovery to a terminal outcome:
//!
//! ```text
//! Discovering -> Connected -> (Sampling -> Encoding -> Sending)* -> NotFound | Disconnected | Terminated
//! ```
//!
//! There is no reconnect. The caller decides what to do with the returned
//! [`LinkOutcome`].

use crate::link::{Characteristics, Discovery, Session};
use hwmon_link_core::{encode, EncodeError, GpuStats, HostStats, LinkError, MetricFrame};
use hwmon_link_sources::MetricAggregator;
use log::{debug, info, warn};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Current position in the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Discovering,
    Connected,
    Sampling,
    Encoding,
    Sending,
    NotFound,
    Disconnected,
    Terminated,
}

impl LinkState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LinkState::NotFound | LinkState::Disconnected | LinkState::Terminated
        )
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Idle => "idle",
            LinkState::Discovering => "discovering",
            LinkState::Connected => "connected",
            LinkState::Sampling => "sampling",
            LinkState::Encoding => "encoding",
            LinkState::Sending => "sending",
            LinkState::NotFound => "not found",
            LinkState::Disconnected => "disconnected",
            LinkState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// How a session ended
#[derive(Debug)]
pub enum LinkOutcome {
    /// Discovery timed out without seeing the peripheral
    NotFound,
    /// Discovery, connection or a write failed
    Disconnected(LinkError),
    /// Shutdown was requested or the cycle limit was reached
    Terminated { cycles: u64 },
}

impl LinkOutcome {
    pub fn state(&self) -> LinkState {
        match self {
            LinkOutcome::NotFound => LinkState::NotFound,
            LinkOutcome::Disconnected(_) => LinkState::Disconnected,
            LinkOutcome::Terminated { .. } => LinkState::Terminated,
        }
    }
}

#[derive(Debug, Error)]
enum CycleError {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Samples, encodes and sends the three metric groups once per cycle
pub struct Transmitter<H, G> {
    aggregator: MetricAggregator<H, G>,
    characteristics: Characteristics,
    interval: Duration,
    max_cycles: Option<u64>,
    state: LinkState,
    cycles: u64,
}

impl<H: HostStats, G: GpuStats> Transmitter<H, G> {
    pub fn new(
        aggregator: MetricAggregator<H, G>,
        characteristics: Characteristics,
        interval: Duration,
    ) -> Self {
        Self {
            aggregator,
            characteristics,
            interval,
            max_cycles: None,
            state: LinkState::Idle,
            cycles: 0,
        }
    }

    /// Stop in `Terminated` after `limit` completed cycles
    pub fn with_max_cycles(mut self, limit: Option<u64>) -> Self {
        self.max_cycles = limit;
        self
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Completed cycles in the current session
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn set_state(&mut self, state: LinkState) {
        if self.state != state {
            debug!("Link state: {} -> {}", self.state, state);
            self.state = state;
        }
    }

    fn limit_reached(&self) -> bool {
        self.max_cycles.is_some_and(|max| self.cycles >= max)
    }

    /// Run one session to completion
    ///
    /// Only an encode failure is returned as `Err`; every link-level ending
    /// is a [`LinkOutcome`].
    pub async fn run<D: Discovery>(
        &mut self,
        discovery: &mut D,
        name: &str,
        scan_timeout: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> Result<LinkOutcome, EncodeError> {
        tokio::pin!(shutdown);
        self.cycles = 0;

        self.set_state(LinkState::Discovering);
        info!("Scanning for '{}' ({:?})", name, scan_timeout);
        let found = tokio::select! {
            found = discovery.discover(name, scan_timeout) => found,
            _ = &mut shutdown => return Ok(self.finish(LinkOutcome::Terminated { cycles: 0 })),
        };
        let peripheral = match found {
            Ok(Some(peripheral)) => peripheral,
            Ok(None) => {
                warn!("Device '{}' not found", name);
                return Ok(self.finish(LinkOutcome::NotFound));
            }
            Err(e) => {
                warn!("Discovery failed: {}", e);
                return Ok(self.finish(LinkOutcome::Disconnected(e)));
            }
        };

        let connected = tokio::select! {
            session = discovery.connect(peripheral) => session,
            _ = &mut shutdown => return Ok(self.finish(LinkOutcome::Terminated { cycles: 0 })),
        };
        let mut session = match connected {
            Ok(session) => session,
            Err(e) => {
                warn!("Failed to connect to '{}': {}", name, e);
                return Ok(self.finish(LinkOutcome::Disconnected(e)));
            }
        };
        self.set_state(LinkState::Connected);
        warn!("=== Connected to '{}' ===", name);

        loop {
            let cycle = tokio::select! {
                result = self.cycle(&mut session) => result,
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    return Ok(self.terminate(&mut session).await);
                }
            };

            match cycle {
                Ok(()) => self.cycles += 1,
                Err(CycleError::Encode(e)) => {
                    if let Err(err) = session.disconnect().await {
                        debug!("Disconnect after encode failure: {}", err);
                    }
                    return Err(e);
                }
                Err(CycleError::Link(e)) => {
                    warn!("Lost connection to '{}': {}", name, e);
                    return Ok(self.finish(LinkOutcome::Disconnected(e)));
                }
            }

            if self.limit_reached() {
                info!("Cycle limit reached after {} cycles", self.cycles);
                return Ok(self.terminate(&mut session).await);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    return Ok(self.terminate(&mut session).await);
                }
            }
        }
    }

    /// Sample, encode and send the three groups once
    async fn cycle<S: Session>(&mut self, session: &mut S) -> Result<(), CycleError> {
        self.set_state(LinkState::Sampling);
        let scalar = self.aggregator.sample_scalars();
        let mut network = self.aggregator.sample_network();
        let percent = self.aggregator.sample_percentages();

        if network.is_negative() {
            warn!(
                "Negative network rate ({}), counters were probably reset; sending 0",
                network
            );
            network = network.clamped();
        }

        self.set_state(LinkState::Encoding);
        let scalar = encode(&MetricFrame::Scalar(scalar))?;
        let network = encode(&MetricFrame::Network(network))?;
        let percent = encode(&MetricFrame::Percent(percent))?;

        self.set_state(LinkState::Sending);
        let chars = self.characteristics;
        session
            .write_without_response(chars.scalar, &scalar)
            .await?;
        session
            .write_without_response(chars.percent, &percent)
            .await?;
        session
            .write_without_response(chars.network, &network)
            .await?;
        Ok(())
    }

    async fn terminate<S: Session>(&mut self, session: &mut S) -> LinkOutcome {
        if let Err(e) = session.disconnect().await {
            debug!("Disconnect failed: {}", e);
        }
        self.finish(LinkOutcome::Terminated {
            cycles: self.cycles,
        })
    }

    fn finish(&mut self, outcome: LinkOutcome) -> LinkOutcome {
        self.set_state(outcome.state());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwmon_link_core::{decode, CollaboratorError, MetricKind, NetSample};
    use hwmon_link_sources::{HwinfoSource, MemoryProvider};
    use hwmon_link_types::{NetworkMetrics, PercentMetrics, PeripheralSettings, ScalarMetrics};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use uuid::Uuid;

    type WriteLog = Rc<RefCell<Vec<(Uuid, Vec<u8>)>>>;

    struct FakeHost {
        samples: VecDeque<NetSample>,
    }

    impl HostStats for FakeHost {
        fn cpu_percent(&mut self) -> f64 {
            12.5
        }

        fn ram_percent(&mut self) -> f64 {
            48.0
        }

        fn network_sample(&mut self) -> NetSample {
            self.samples.pop_front().unwrap_or_default()
        }
    }

    struct FakeGpu;

    impl GpuStats for FakeGpu {
        fn temperature(&mut self) -> Result<f64, CollaboratorError> {
            Ok(55.0)
        }

        fn utilization(&mut self) -> Result<f64, CollaboratorError> {
            Ok(30.0)
        }
    }

    #[derive(Default)]
    struct FakeDiscovery {
        present: bool,
        /// Writes accepted before the session starts failing
        fail_after: Option<usize>,
        writes: WriteLog,
        disconnected: Rc<RefCell<bool>>,
    }

    struct FakeSession {
        fail_after: Option<usize>,
        writes: WriteLog,
        disconnected: Rc<RefCell<bool>>,
    }

    impl Discovery for FakeDiscovery {
        type Peripheral = ();
        type Session = FakeSession;

        async fn discover(
            &mut self,
            _name: &str,
            _timeout: Duration,
        ) -> Result<Option<()>, LinkError> {
            Ok(self.present.then_some(()))
        }

        async fn connect(&mut self, _peripheral: ()) -> Result<FakeSession, LinkError> {
            Ok(FakeSession {
                fail_after: self.fail_after,
                writes: Rc::clone(&self.writes),
                disconnected: Rc::clone(&self.disconnected),
            })
        }
    }

    impl Session for FakeSession {
        async fn write_without_response(
            &mut self,
            characteristic: Uuid,
            payload: &[u8],
        ) -> Result<(), LinkError> {
            let mut writes = self.writes.borrow_mut();
            if self.fail_after.is_some_and(|n| writes.len() >= n) {
                return Err(LinkError::Disconnected);
            }
            writes.push((characteristic, payload.to_vec()));
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), LinkError> {
            *self.disconnected.borrow_mut() = true;
            Ok(())
        }
    }

    fn chars() -> Characteristics {
        Characteristics::from(&PeripheralSettings::default())
    }

    fn sample(recv: u64, sent: u64, t: f64) -> NetSample {
        NetSample {
            bytes_recv: recv,
            bytes_sent: sent,
            timestamp: t,
        }
    }

    fn transmitter(samples: Vec<NetSample>) -> Transmitter<FakeHost, FakeGpu> {
        let hwinfo = HwinfoSource::new(Box::new(MemoryProvider::missing()));
        let host = FakeHost {
            samples: samples.into(),
        };
        let aggregator = MetricAggregator::new(hwinfo, host, FakeGpu);
        Transmitter::new(aggregator, chars(), Duration::from_millis(1))
    }

    #[test]
    fn test_terminal_states() {
        assert!(LinkState::NotFound.is_terminal());
        assert!(LinkState::Terminated.is_terminal());
        assert!(!LinkState::Sending.is_terminal());
        assert_eq!(
            LinkOutcome::Terminated { cycles: 3 }.state(),
            LinkState::Terminated
        );
    }

    #[tokio::test]
    async fn test_empty_scan_is_not_found() {
        let mut tx = transmitter(vec![]);
        let mut discovery = FakeDiscovery::default();

        let outcome = tx
            .run(&mut discovery, "Bench", Duration::from_millis(5), std::future::pending())
            .await
            .unwrap();

        assert!(matches!(outcome, LinkOutcome::NotFound));
        assert_eq!(tx.state(), LinkState::NotFound);
        assert!(discovery.writes.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_is_disconnected() {
        let mut tx = transmitter(vec![]);
        let mut discovery = FakeDiscovery {
            present: true,
            fail_after: Some(1),
            ..Default::default()
        };

        let outcome = tx
            .run(&mut discovery, "Bench", Duration::from_millis(5), std::future::pending())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            LinkOutcome::Disconnected(LinkError::Disconnected)
        ));
        assert_eq!(tx.state(), LinkState::Disconnected);
        assert_eq!(tx.cycles(), 0);
        // Scalar went out before the percent write failed
        let writes = discovery.writes.borrow();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, chars().scalar);
    }

    #[tokio::test]
    async fn test_cycle_limit_terminates_with_ordered_payloads() {
        let mut tx = transmitter(vec![
            sample(1000, 500, 100.0),
            sample(901_000, 1_000_500, 101.0),
            sample(1_901_000, 2_000_500, 102.0),
        ])
        .with_max_cycles(Some(2));
        let mut discovery = FakeDiscovery {
            present: true,
            ..Default::default()
        };

        let outcome = tx
            .run(&mut discovery, "Bench", Duration::from_millis(5), std::future::pending())
            .await
            .unwrap();

        assert!(matches!(outcome, LinkOutcome::Terminated { cycles: 2 }));
        assert!(*discovery.disconnected.borrow());

        let writes = discovery.writes.borrow();
        let c = chars();
        let order: Vec<Uuid> = writes.iter().map(|(uuid, _)| *uuid).collect();
        assert_eq!(
            order,
            vec![c.scalar, c.percent, c.network, c.scalar, c.percent, c.network]
        );

        // No snapshot: CPU scalars are zero, GPU temperature still reported
        assert_eq!(
            decode(MetricKind::Scalar, &writes[0].1).unwrap(),
            MetricFrame::Scalar(ScalarMetrics {
                clock: 0,
                power: 0,
                temp: 0,
                gpu_temp: 55,
            })
        );
        assert_eq!(
            decode(MetricKind::Percent, &writes[1].1).unwrap(),
            MetricFrame::Percent(PercentMetrics {
                cpu_pct: 12,
                gpu_pct: 30,
                ram_pct: 48,
            })
        );
        assert_eq!(
            decode(MetricKind::Network, &writes[2].1).unwrap(),
            MetricFrame::Network(NetworkMetrics {
                down_kbps: 900,
                up_kbps: 1000,
            })
        );
        assert_eq!(
            decode(MetricKind::Network, &writes[5].1).unwrap(),
            MetricFrame::Network(NetworkMetrics {
                down_kbps: 1000,
                up_kbps: 1000,
            })
        );
    }

    #[tokio::test]
    async fn test_counter_reset_sends_zero_rates() {
        let mut tx = transmitter(vec![
            sample(5_000_000, 5_000_000, 10.0),
            sample(1_000, 6_000_000, 11.0),
        ])
        .with_max_cycles(Some(1));
        let mut discovery = FakeDiscovery {
            present: true,
            ..Default::default()
        };

        let outcome = tx
            .run(&mut discovery, "Bench", Duration::from_millis(5), std::future::pending())
            .await
            .unwrap();

        assert!(matches!(outcome, LinkOutcome::Terminated { cycles: 1 }));
        let writes = discovery.writes.borrow();
        assert_eq!(
            decode(MetricKind::Network, &writes[2].1).unwrap(),
            MetricFrame::Network(NetworkMetrics {
                down_kbps: 0,
                up_kbps: 1000,
            })
        );
    }

    #[tokio::test]
    async fn test_shutdown_terminates() {
        let mut tx = transmitter(vec![]);
        let mut discovery = FakeDiscovery {
            present: true,
            ..Default::default()
        };

        let outcome = tx
            .run(&mut discovery, "Bench", Duration::from_millis(5), async {})
            .await
            .unwrap();

        assert!(matches!(outcome, LinkOutcome::Terminated { .. }));
        assert_eq!(tx.state(), LinkState::Terminated);
    }
}
