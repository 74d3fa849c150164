use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::RelayError;
use crate::platform::SessionNotice;
use crate::relay::{Relay, SessionStatus};

// ── Request / response types ───────────────────────────────────────────────────

// Absent and `null` fields both land as `None`, so a missing target is
// reported by address validation rather than by the JSON extractor.

#[derive(Debug, Deserialize)]
struct SendTextRequest {
    telefone: Option<String>,
    texto: Option<String>,
    is_group: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SendMediaRequest {
    number: Option<String>,
    base64: Option<String>,
    filename: Option<String>,
    caption: Option<String>,
}

#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
}

const OK: Json<OkResponse> = Json(OkResponse { ok: true });

// ── Handlers ───────────────────────────────────────────────────────────────────

async fn send_text(
    State(relay): State<Arc<Relay>>,
    body: Result<Json<SendTextRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, RelayError> {
    let Json(body) = body?;
    relay
        .dispatcher
        .send_text(
            body.telefone.as_deref().unwrap_or_default(),
            body.texto.as_deref().unwrap_or_default(),
            body.is_group.unwrap_or_default(),
        )
        .await?;
    Ok(OK)
}

async fn send_image(
    State(relay): State<Arc<Relay>>,
    body: Result<Json<SendMediaRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, RelayError> {
    let Json(body) = body?;
    relay
        .dispatcher
        .send_image(
            body.number.as_deref().unwrap_or_default(),
            body.base64.as_deref().unwrap_or_default(),
            body.filename.as_deref(),
            body.caption.as_deref(),
        )
        .await?;
    Ok(OK)
}

async fn send_audio(
    State(relay): State<Arc<Relay>>,
    body: Result<Json<SendMediaRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, RelayError> {
    let Json(body) = body?;
    relay
        .dispatcher
        .send_audio(
            body.number.as_deref().unwrap_or_default(),
            body.base64.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(OK)
}

async fn send_file(
    State(relay): State<Arc<Relay>>,
    body: Result<Json<SendMediaRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, RelayError> {
    let Json(body) = body?;
    relay
        .dispatcher
        .send_file(
            body.number.as_deref().unwrap_or_default(),
            body.base64.as_deref().unwrap_or_default(),
            body.filename.as_deref().unwrap_or_default(),
            body.caption.as_deref(),
        )
        .await?;
    Ok(OK)
}

async fn session_event(
    State(relay): State<Arc<Relay>>,
    Json(notice): Json<SessionNotice>,
) -> (StatusCode, Json<OkResponse>) {
    relay.handle_notice(notice).await;
    (StatusCode::ACCEPTED, OK)
}

async fn status(State(relay): State<Arc<Relay>>) -> Json<SessionStatus> {
    Json(relay.status().await)
}

pub fn router(relay: Arc<Relay>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/enviar", post(send_text))
        .route("/enviar_imagem", post(send_image))
        .route("/enviar_audio", post(send_audio))
        .route("/enviar_arquivo", post(send_file))
        .route("/session/events", post(session_event))
        .route("/status", get(status))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(relay)
}

pub async fn serve(relay: Arc<Relay>, config: &ServerConfig) -> Result<()> {
    let app = router(relay, config.body_limit_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!("Relay API listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
