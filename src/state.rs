use std::sync::Arc;

use lectern_auth::TokenService;
use lectern_config::CorsConfig;
use lectern_telemetry::MetricsHub;
use sqlx::PgPool;

/// Shared by every handler. Cloning is cheap: the pool, the token service
/// and the hub are all handles.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenService>,
    pub hub: MetricsHub,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(db: PgPool, tokens: TokenService, hub: MetricsHub, cors_config: CorsConfig) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
            hub,
            cors_config,
        }
    }
}
