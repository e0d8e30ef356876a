//! Gateway HTTP server (single port).

use crate::config::Config;
use crate::dialog::{DialogEngine, HttpDialogEngine};
use crate::format::{ResponseFormatter, SsmlFormatter};
use crate::gateway::protocol::{ErrorBody, InboundRequest};
use crate::turn::{self, TurnError};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared, read-only state for the gateway (config, dialog engine, formatter).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub engine: Arc<dyn DialogEngine>,
    pub formatter: Arc<dyn ResponseFormatter>,
}

/// Run the gateway against the configured dialog engine; binds to config.gateway.bind:config.gateway.port.
/// Fails at startup when the bot identity or start intent is missing.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let missing = config.dialog.missing_fields();
    if !missing.is_empty() {
        anyhow::bail!(
            "dialog engine is not configured (missing {}); set them in the config file or via LEXBOT_ID, LEXBOT_ALIAS_ID, WELCOME_INTENT",
            missing.join(", ")
        );
    }
    log::info!(
        "dialog engine {} ({:?}), bot {} alias {} locale {}",
        config.dialog.endpoint,
        config.dialog.api_generation,
        config.dialog.bot_id,
        config.dialog.bot_alias_id,
        config.dialog.locale_id
    );
    let engine = Arc::new(HttpDialogEngine::new(&config.dialog));
    serve(config, engine).await
}

/// Serve turns with the given dialog engine and the default SSML formatter.
pub async fn serve(config: Config, engine: Arc<dyn DialogEngine>) -> Result<()> {
    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let state = GatewayState {
        config: Arc::new(config),
        engine,
        formatter: Arc::new(SsmlFormatter),
    };

    let app = Router::new()
        .route("/", get(health_http).post(turn_http))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON.
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

/// POST / runs one turn. Bad requests are 400; decode and upstream failures are 502.
async fn turn_http(State(state): State<GatewayState>, body: Bytes) -> Response {
    let request: InboundRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {}", e))
        }
    };
    match turn::run_turn(
        &state.config.dialog,
        state.engine.as_ref(),
        state.formatter.as_ref(),
        &request,
    )
    .await
    {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => {
            log::warn!("turn failed: {}", e);
            error_response(status_for(&e), e.to_string())
        }
    }
}

fn status_for(err: &TurnError) -> StatusCode {
    match err {
        TurnError::BadRequest(_) => StatusCode::BAD_REQUEST,
        TurnError::Decode(_) | TurnError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}
