//! HTTP review server
//!
//! Routes:
//!
//! | Method | Path          | Purpose                                   |
//! |--------|---------------|-------------------------------------------|
//! | GET    | `/`           | Endpoint listing                          |
//! | GET    | `/health`     | Version, uptime and connected clients     |
//! | GET    | `/sse`        | Live event stream                         |
//! | POST   | `/api/review` | Review one source file                    |
//! | POST   | `/api/a11y`   | Accessibility check for one HTML document |
//! | POST   | `/webhook`    | GitHub webhook deliveries                 |

pub mod github;
mod handlers;
pub mod webhook;

pub use github::{ChangedFile, CodeHost, GitHubClient, RepoRef};
pub use handlers::{A11yRequest, A11yResponse, ApiError, ReviewRequest, ReviewResponse};
pub use webhook::{handle_event, render_review_comment, sign, verify_signature, WebhookOutcome};

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

use crate::broadcast::BroadcastHub;
use crate::config::{Config, ServerConfig, WebhookAuth};
use crate::core::{MarkupDocument, SourceFile};
use crate::engine::RuleEngine;
use crate::error::Result;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub source_engine: Arc<RuleEngine<SourceFile>>,
    pub markup_engine: Arc<RuleEngine<MarkupDocument>>,
    pub hub: BroadcastHub,
    pub config: Arc<Config>,
    pub code_host: Arc<dyn CodeHost>,
    pub webhook_auth: WebhookAuth,
    pub default_branch: String,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        webhook_auth: WebhookAuth,
        default_branch: impl Into<String>,
        code_host: Arc<dyn CodeHost>,
    ) -> Self {
        Self {
            source_engine: Arc::new(RuleEngine::source().filtered(&config)),
            markup_engine: Arc::new(RuleEngine::markup().filtered(&config)),
            hub: BroadcastHub::new(),
            config: Arc::new(config),
            code_host,
            webhook_auth,
            default_branch: default_branch.into(),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/sse", get(handlers::sse))
        .route("/api/review", post(handlers::review))
        .route("/api/a11y", post(handlers::a11y))
        .route("/webhook", post(handlers::webhook))
        .with_state(state)
}

/// Bind and serve until Ctrl-C / SIGTERM
pub async fn run(config: Config, server: ServerConfig) -> Result<()> {
    let client = GitHubClient::new(&server.api_url, server.github_token.as_deref())?;
    if !client.is_authenticated() {
        tracing::warn!("GITHUB_TOKEN is not set; review comments and issues will be rejected");
    }
    if server.webhook_auth == WebhookAuth::Unsigned {
        tracing::warn!("webhook signature verification is disabled");
    }

    let state = AppState::new(
        config,
        server.webhook_auth.clone(),
        server.default_branch.clone(),
        Arc::new(client),
    );

    let listener = TcpListener::bind(server.addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "review server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("review server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!("cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown signal received");
}
