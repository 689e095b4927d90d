//! hwmon-link: streams hardware telemetry to a BLE hardware monitor display
//!
//! This library provides the application side of hwmon-link:
//! - Configuration management
//! - The wireless link abstraction (BLE and a console dry-run link)
//! - The transmission loop state machine

pub mod config;
pub mod link;
pub mod transmission;

// Re-export commonly used types
pub use config::AppConfig;
pub use link::{Characteristics, ConsoleDiscovery, Discovery, Session};
pub use transmission::{LinkOutcome, LinkState, Transmitter};
