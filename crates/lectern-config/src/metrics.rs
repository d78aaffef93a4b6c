//! Telemetry sampling configuration.

use std::time::Duration;

use crate::env;

pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_DISK_PATH: &str = "storage/media";
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;
pub const MAX_SAMPLE_INTERVAL_SECS: u64 = 3_600;
pub const MAX_QUEUE_CAPACITY: usize = 65_536;

#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Seconds between samples (`METRICS_SAMPLE_INTERVAL`, 1 to 3600).
    pub sample_interval_secs: u64,
    /// Path whose filesystem is reported as disk usage (`METRICS_DISK_PATH`).
    pub disk_path: String,
    /// Hub inbound queue; samples beyond this are dropped (`METRICS_QUEUE_CAPACITY`).
    /// Both queue sizes are capped at 65536.
    pub queue_capacity: usize,
    /// Per-subscriber outbound buffer (`METRICS_SUBSCRIBER_BUFFER`).
    pub subscriber_buffer: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: DEFAULT_SAMPLE_INTERVAL_SECS,
            disk_path: DEFAULT_DISK_PATH.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl MetricsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env::process_env)
    }

    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            sample_interval_secs: env::parse_or(
                &get,
                "METRICS_SAMPLE_INTERVAL",
                DEFAULT_SAMPLE_INTERVAL_SECS,
            )
            .clamp(1, MAX_SAMPLE_INTERVAL_SECS),
            disk_path: env::lookup(&get, "METRICS_DISK_PATH")
                .unwrap_or_else(|| DEFAULT_DISK_PATH.to_string()),
            queue_capacity: env::parse_or(&get, "METRICS_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)
                .clamp(1, MAX_QUEUE_CAPACITY),
            subscriber_buffer: env::parse_or(
                &get,
                "METRICS_SUBSCRIBER_BUFFER",
                DEFAULT_SUBSCRIBER_BUFFER,
            )
            .clamp(1, MAX_QUEUE_CAPACITY),
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs.clamp(1, MAX_SAMPLE_INTERVAL_SECS))
    }
}
