use std::sync::Arc;

use dotenvy::dotenv;
use lectern::modules::role_groups::RoleGroupService;
use lectern::router::init_router;
use lectern::state::AppState;
use lectern_auth::TokenService;
use lectern_config::{
    CorsConfig, JwtConfig, LoggingConfig, MetricsConfig, ServerConfig, database_url,
};
use lectern_db::{init_db_pool, run_migrations};
use lectern_observability::{init_logging, init_metrics, metrics_app};
use lectern_telemetry::{MetricsHub, MetricsSampler, PgSampleStore, SystemProbe, spawn_sampler};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let _log_guard = init_logging(&LoggingConfig::from_env());

    if let Err(e) = run().await {
        error!(error = ?e, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let server_config = ServerConfig::from_env();
    let jwt_config = JwtConfig::from_env()?;
    let metrics_config = MetricsConfig::from_env();
    let cors_config = CorsConfig::from_env();

    let pool = init_db_pool(&database_url()?).await?;
    run_migrations(&pool).await?;
    RoleGroupService::ensure_role_groups(&pool)
        .await
        .map_err(|e| e.error)?;

    let shutdown = CancellationToken::new();

    let (hub, hub_task) = MetricsHub::spawn(&metrics_config, shutdown.child_token());
    let sampler = MetricsSampler::new(
        Box::new(SystemProbe::new()),
        Arc::new(PgSampleStore::new(pool.clone())),
        &metrics_config.disk_path,
    );
    let sampler_task = spawn_sampler(
        sampler,
        hub.clone(),
        metrics_config.sample_interval(),
        shutdown.child_token(),
    );

    let state = AppState::new(pool, TokenService::new(&jwt_config), hub, cors_config);

    // Installs the recorder, which `init_router` checks before adding the metrics layer.
    let prometheus = if server_config.observability_enabled {
        init_metrics()
            .inspect_err(|e| warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled"))
            .ok()
    } else {
        None
    };

    let mut app = init_router(state);
    if let Some(handle) = prometheus {
        app = app.merge(metrics_app(handle));
    }

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "Server listening");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    shutdown_signal().await;
    info!("Shutdown signal received");
    shutdown.cancel();

    let grace = server_config.shutdown_grace();
    match tokio::time::timeout(grace, &mut server).await {
        Ok(Ok(Ok(()))) => info!("Server stopped"),
        Ok(Ok(Err(e))) => error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "Server task failed"),
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Grace period elapsed, dropping connections");
            server.abort();
        }
    }

    let _ = tokio::time::timeout(grace, async {
        let _ = sampler_task.await;
        let _ = hub_task.await;
    })
    .await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
