//! HTTP facade over the rclone gateway
//!
//! Routes:
//! - `GET /rclone/remotes`
//! - `GET /rclone/list?remote=&path=`
//! - `POST /rclone/transfer?src_remote=&src_path=&dest_remote=&dest_path=`
//! - `GET /health`
//!
//! Gateway failures answer 502 with `{"error": ".."}`. A missing required
//! query parameter is rejected by the extractor with 400.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use cx_core::{Error, Result};

use crate::error::GatewayError;
use crate::gateway::RcloneGateway;

#[derive(Clone)]
pub struct AppState {
    pub gateway: RcloneGateway,
}

impl AppState {
    pub fn new(gateway: RcloneGateway) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    remote: String,
    #[serde(default)]
    path: String,
}

#[derive(Debug, Deserialize)]
struct TransferQuery {
    src_remote: String,
    #[serde(default)]
    src_path: String,
    dest_remote: String,
    #[serde(default)]
    dest_path: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_remotes(
    State(state): State<AppState>,
) -> std::result::Result<Response, GatewayError> {
    let remotes = state.gateway.list_remotes().await?;
    Ok(Json(json!({ "remotes": remotes })).into_response())
}

async fn list_path(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> std::result::Result<Response, GatewayError> {
    let entries = state.gateway.list_path(&query.remote, &query.path).await?;
    Ok(Json(entries).into_response())
}

async fn transfer(
    State(state): State<AppState>,
    Query(query): Query<TransferQuery>,
) -> std::result::Result<Response, GatewayError> {
    let summary = state
        .gateway
        .copy(
            &query.src_remote,
            &query.src_path,
            &query.dest_remote,
            &query.dest_path,
        )
        .await?;
    Ok(Json(summary).into_response())
}

/// CORS policy allowing exactly `origins`, with credentials
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).map_err(|_| Error::Config(format!("invalid CORS origin: {o}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rclone/remotes", get(list_remotes))
        .route("/rclone/list", get(list_path))
        .route("/rclone/transfer", post(transfer))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves
///
/// `on_listening` receives the bound address once the socket is open, so
/// nothing is announced when the bind fails.
pub async fn serve<L, F>(
    addr: &str,
    gateway: RcloneGateway,
    origins: &[String],
    on_listening: L,
    shutdown: F,
) -> Result<()>
where
    L: FnOnce(SocketAddr),
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(AppState::new(gateway), cors_layer(origins)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "rclone facade listening");
    on_listening(local);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
