//! Adapter webhook server.
//!
//! Each adapter POSTs its events to `/adapters/{platform}/{kind}`, where
//! `kind` is `message` or `command`. Deliveries are acknowledged right away
//! and handled on their own task. Events whose shape belongs to a different
//! platform than the route are ignored.
//!
//! Adapters deliver events already split and flattened:
//! - Yunhu posts every event to one webhook URL; the relay must send
//!   instruction events (`message.receive.instruction`) to `.../command`
//!   and normal messages to `.../message`.
//! - A raw Telegram `Update` nests `chat` inside `message`; the relay must
//!   lift `chat` (and optionally `text`) to the top level.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::platform::Platform;
use crate::plugin::{EventKind, StatusMonitor};

pub fn router(monitor: Arc<StatusMonitor>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/adapters/{platform}/{kind}", post(receive_event))
        .with_state(monitor)
}

async fn receive_event(
    State(monitor): State<Arc<StatusMonitor>>,
    Path((platform, kind)): Path<(String, String)>,
    Json(event): Json<Value>,
) -> StatusCode {
    let (Ok(platform), Ok(kind)) = (platform.parse::<Platform>(), kind.parse::<EventKind>())
    else {
        return StatusCode::NOT_FOUND;
    };
    if !monitor.is_subscribed(platform, kind) {
        return StatusCode::NOT_FOUND;
    }

    debug!("Received {} event from {} adapter", kind, platform);
    tokio::spawn(async move {
        monitor.handle_from(platform, kind, &event).await;
    });

    StatusCode::ACCEPTED
}

/// Serve the webhook router until the process receives Ctrl-C
pub async fn run(monitor: Arc<StatusMonitor>, listen: SocketAddr) -> Result<()> {
    for (platform, kind) in monitor.subscriptions() {
        info!("Subscribed to {} events on /adapters/{}/{}", kind, platform, kind);
    }

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!("Listening for adapter events on http://{}", listen);

    axum::serve(listener, router(monitor))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
