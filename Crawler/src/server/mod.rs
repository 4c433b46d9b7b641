// src/server/mod.rs

//! HTTP trigger for crawl passes.
//!
//! An external scheduler calls `POST /cron/crawl`; the pass runs in the
//! background and the request is acknowledged immediately.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{error, info, instrument, warn};

use crate::pipeline::{PassLock, WatchCrawler};

/// Shared-secret check for the trigger endpoint.
#[derive(Debug, Clone)]
pub struct TriggerAuth {
    secret: Option<Arc<str>>,
}

impl TriggerAuth {
    /// Require `Authorization: Bearer <secret>`; `None` allows every caller.
    pub fn new(secret: Option<&str>) -> Self {
        let secret = secret.map(str::trim).filter(|s| !s.is_empty()).map(Arc::from);
        if secret.is_none() {
            warn!("CRON_SECRET not set; trigger endpoint is open to anyone");
        }
        Self { secret }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    fn allows(&self, header: Option<&HeaderValue>) -> bool {
        let Some(secret) = &self.secret else {
            warn!("CRON_SECRET not set, allowing request (unsafe in production)");
            return true;
        };
        extract_bearer_token(header)
            .is_some_and(|token| bool::from(token.as_bytes().ct_eq(secret.as_bytes())))
    }
}

/// State shared by the trigger handlers.
#[derive(Clone)]
pub struct AppState {
    pub crawler: Arc<WatchCrawler>,
    pub auth: TriggerAuth,
    pub lock: PassLock,
}

impl AppState {
    pub fn new(crawler: Arc<WatchCrawler>, auth: TriggerAuth) -> Self {
        Self {
            crawler,
            auth,
            lock: PassLock::new(),
        }
    }
}

/// Build the router with the health and trigger routes.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cron/crawl", post(trigger_crawl))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip_all)]
async fn trigger_crawl(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.auth.allows(headers.get(AUTHORIZATION)) {
        warn!("Rejected crawl trigger with missing or invalid bearer token");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Unauthorized" })))
            .into_response();
    }

    let Some(guard) = state.lock.try_begin() else {
        info!("Crawl trigger ignored; a pass is already running");
        return (StatusCode::CONFLICT, Json(json!({ "status": "busy" }))).into_response();
    };

    let crawler = Arc::clone(&state.crawler);
    tokio::spawn(async move {
        let _guard = guard;
        match crawler.run_crawl_pass().await {
            Ok(summary) => info!(
                watches = summary.watches,
                notified = summary.notified,
                failed = summary.failed,
                "crawl pass finished"
            ),
            Err(e) => error!(error = %e, "crawl pass aborted"),
        }
    });

    (
        StatusCode::OK,
        Json(json!({ "status": "accepted", "message": "Crawl task started" })),
    )
        .into_response()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

/// Resolve when Ctrl-C or SIGTERM arrives.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("received shutdown signal, starting graceful shutdown");
}
