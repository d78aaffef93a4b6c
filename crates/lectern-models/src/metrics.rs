//! Server telemetry samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_HISTORY_LIMIT: i64 = 120;
pub const MAX_HISTORY_LIMIT: i64 = 500;

/// One point-in-time reading of process and host resources.
///
/// Loads are fractions in `0.0..=1.0`. "Heap" is the process resident set
/// and the host's total memory, which is the closest a native process has
/// to a managed heap and its ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub captured_at: DateTime<Utc>,
    pub heap_used_bytes: i64,
    pub heap_max_bytes: i64,
    pub system_memory_total_bytes: i64,
    pub system_memory_used_bytes: i64,
    pub disk_total_bytes: i64,
    pub disk_used_bytes: i64,
    pub process_cpu_load: f64,
    pub system_cpu_load: f64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MetricsHistoryParams {
    /// Number of most recent samples, 1 to 500. Defaults to 120.
    pub limit: Option<i64>,
}

impl MetricsHistoryParams {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

/// Samples in ascending capture order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricsHistoryResponse {
    pub items: Vec<MetricSample>,
}
