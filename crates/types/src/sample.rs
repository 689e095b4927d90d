//! Raw samples returned by the OS collaborator

use serde::{Deserialize, Serialize};

/// Cumulative network byte counters at a wall-clock instant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetSample {
    /// Total bytes received since an arbitrary epoch
    pub bytes_recv: u64,
    /// Total bytes sent since an arbitrary epoch
    pub bytes_sent: u64,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
}
