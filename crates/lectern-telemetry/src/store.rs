use async_trait::async_trait;
use lectern_models::MetricSample;
use sqlx::PgPool;

use crate::error::SamplerError;

/// Append-only storage for samples.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn append(&self, sample: &MetricSample) -> Result<(), SamplerError>;

    /// The `limit` most recent samples, oldest first.
    async fn latest(&self, limit: i64) -> Result<Vec<MetricSample>, SamplerError>;
}

/// `server_metric_samples` table.
#[derive(Clone)]
pub struct PgSampleStore {
    pool: PgPool,
}

impl PgSampleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SampleStore for PgSampleStore {
    async fn append(&self, sample: &MetricSample) -> Result<(), SamplerError> {
        sqlx::query(
            r#"
            INSERT INTO server_metric_samples (
                captured_at, heap_used_bytes, heap_max_bytes,
                system_memory_total_bytes, system_memory_used_bytes,
                disk_total_bytes, disk_used_bytes,
                process_cpu_load, system_cpu_load
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(sample.captured_at)
        .bind(sample.heap_used_bytes)
        .bind(sample.heap_max_bytes)
        .bind(sample.system_memory_total_bytes)
        .bind(sample.system_memory_used_bytes)
        .bind(sample.disk_total_bytes)
        .bind(sample.disk_used_bytes)
        .bind(sample.process_cpu_load)
        .bind(sample.system_cpu_load)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest(&self, limit: i64) -> Result<Vec<MetricSample>, SamplerError> {
        let mut rows = sqlx::query_as::<_, MetricSample>(
            r#"
            SELECT captured_at, heap_used_bytes, heap_max_bytes,
                   system_memory_total_bytes, system_memory_used_bytes,
                   disk_total_bytes, disk_used_bytes,
                   process_cpu_load, system_cpu_load
            FROM server_metric_samples
            ORDER BY captured_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.reverse();
        Ok(rows)
    }
}
