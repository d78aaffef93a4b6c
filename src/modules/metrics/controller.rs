use anyhow::anyhow;
use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use lectern_core::{AppError, ErrorResponse};
use lectern_models::{MetricsHistoryParams, MetricsHistoryResponse, RoleCode};
use lectern_telemetry::{PgSampleStore, SampleStore, Subscription};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::middleware::auth::{Identity, authenticate};
use crate::middleware::role::{check_roles, require_role};
use crate::state::AppState;

/// Recent samples, oldest first
#[utoipa::path(
    get,
    path = "/api/admin/metrics/history",
    params(MetricsHistoryParams),
    responses(
        (status = 200, description = "Samples in capture order", body = MetricsHistoryResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Metrics"
)]
#[instrument(skip(state))]
pub async fn metrics_history(
    State(state): State<AppState>,
    Query(params): Query<MetricsHistoryParams>,
) -> Result<Json<MetricsHistoryResponse>, AppError> {
    let store = PgSampleStore::new(state.db.clone());
    let items = store.latest(params.effective_limit()).await?;
    Ok(Json(MetricsHistoryResponse { items }))
}

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// `GET /ws/metrics?token=<access token>`
///
/// Browsers cannot set headers on a WebSocket handshake, so the token rides
/// in the query. It is checked before the upgrade: a bad token is a 401 and a
/// non-admin a 403, and neither ever gets a socket.
#[instrument(skip_all)]
pub async fn metrics_socket(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let token = query
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized(anyhow!("Missing token query parameter")))?;

    let identity = authenticate(&state.tokens, token)?;
    check_roles(&identity, &require_role(RoleCode::Admin.as_str()))?;

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let subscription = state.hub.subscribe().await?;
    Ok(upgrade.on_upgrade(move |socket| stream_samples(state, identity, subscription, socket)))
}

async fn stream_samples(
    state: AppState,
    identity: Identity,
    subscription: Subscription,
    socket: WebSocket,
) {
    let Subscription {
        id,
        receiver: mut samples,
    } = subscription;
    let (mut sink, mut stream) = socket.split();

    info!(subscriber_id = id, user_id = %identity.user_id, "Metrics stream opened");

    loop {
        tokio::select! {
            sample = samples.recv() => {
                // None: the hub dropped us or is shutting down.
                let Some(sample) = sample else { break };
                let payload = match serde_json::to_string(&sample) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode sample");
                        continue;
                    }
                };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(subscriber_id = id, error = %e, "Metrics stream read failed");
                    break;
                }
            },
        }
    }

    if let Err(e) = state.hub.unsubscribe(id).await {
        debug!(subscriber_id = id, error = %e, "Unsubscribe after close");
    }
    let _ = sink.close().await;

    info!(subscriber_id = id, "Metrics stream closed");
}
