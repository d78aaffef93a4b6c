use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use lectern_models::MetricSample;
use lectern_observability::track_sample;
use tracing::instrument;

use crate::error::SamplerError;
use crate::probe::{ResourceProbe, ResourceReading};
use crate::store::SampleStore;

/// Captures one [`MetricSample`] per call and appends it to the store.
///
/// The probe read walks mounted filesystems, so it runs on the blocking
/// pool. Disk usage is `total - available`: `sysinfo` reports no free-block
/// count, so root-reserved blocks count as used.
pub struct MetricsSampler {
    probe: Arc<Mutex<Box<dyn ResourceProbe>>>,
    store: Arc<dyn SampleStore>,
    disk_path: PathBuf,
}

impl MetricsSampler {
    pub fn new(
        probe: Box<dyn ResourceProbe>,
        store: Arc<dyn SampleStore>,
        disk_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probe: Arc::new(Mutex::new(probe)),
            store,
            disk_path: disk_path.into(),
        }
    }

    #[instrument(skip(self), fields(disk_path = %self.disk_path.display()))]
    pub async fn capture(&mut self) -> Result<MetricSample, SamplerError> {
        let result = self.capture_inner().await;
        track_sample(result.is_ok());
        result
    }

    async fn capture_inner(&mut self) -> Result<MetricSample, SamplerError> {
        let reading = self.read_probe().await?;
        let sample = build_sample(&reading, Utc::now());
        self.store.append(&sample).await?;
        Ok(sample)
    }

    async fn read_probe(&self) -> Result<ResourceReading, SamplerError> {
        let probe = Arc::clone(&self.probe);
        let disk_path = self.disk_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut probe = probe
                .lock()
                .map_err(|_| SamplerError::Probe("probe lock poisoned".to_string()))?;
            probe.read(&disk_path)
        })
        .await?
    }
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn fraction(percent: f32, divisor: usize) -> f64 {
    let value = f64::from(percent) / 100.0 / divisor.max(1) as f64;
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub(crate) fn build_sample(reading: &ResourceReading, captured_at: DateTime<Utc>) -> MetricSample {
    MetricSample {
        captured_at,
        heap_used_bytes: to_i64(reading.process_rss_bytes),
        heap_max_bytes: to_i64(reading.memory_total_bytes),
        system_memory_total_bytes: to_i64(reading.memory_total_bytes),
        system_memory_used_bytes: to_i64(
            reading
                .memory_total_bytes
                .saturating_sub(reading.memory_available_bytes),
        ),
        disk_total_bytes: to_i64(reading.disk_total_bytes),
        disk_used_bytes: to_i64(
            reading
                .disk_total_bytes
                .saturating_sub(reading.disk_available_bytes),
        ),
        process_cpu_load: fraction(reading.process_cpu_percent, reading.cpu_count),
        system_cpu_load: fraction(reading.system_cpu_percent, 1),
    }
}
