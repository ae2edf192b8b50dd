//! HTTP request handlers

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use tokio_stream::{Stream, StreamExt};

use super::webhook::{self, WebhookOutcome, EVENT_HEADER, SIGNATURE_HEADER};
use super::AppState;
use crate::config::WebhookAuth;
use crate::core::{MarkupDocument, RuleResult, SourceFile};
use crate::error::AnalyzerError;
use crate::output::{render_text_feedback, SeverityBuckets, Summary};

/// Error body: `{success: false, message, error}`
#[derive(Debug)]
pub struct ApiError {
    message: String,
    error: AnalyzerError,
}

impl ApiError {
    pub fn new(message: impl Into<String>, error: AnalyzerError) -> Self {
        Self {
            message: message.into(),
            error,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            AnalyzerError::Validation(_) => StatusCode::BAD_REQUEST,
            AnalyzerError::Signature(_) => StatusCode::UNAUTHORIZED,
            AnalyzerError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyzerError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AnalyzerError> for ApiError {
    fn from(error: AnalyzerError) -> Self {
        Self::new("Request failed", error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "message": self.message,
            "error": self.error.to_string(),
            "kind": self.error.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}

// =============================================================================
// Info
// =============================================================================

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Code review server is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            {"method": "GET", "path": "/health", "description": "Server health"},
            {"method": "GET", "path": "/sse", "description": "Live review events"},
            {"method": "POST", "path": "/api/review", "description": "Review one source file: {file, content}"},
            {"method": "POST", "path": "/api/a11y", "description": "Accessibility check: {file, html}"},
            {"method": "POST", "path": "/webhook", "description": "GitHub webhook deliveries"},
        ],
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub clients: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        clients: state.hub.client_count(),
    })
}

pub async fn sse(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let (_, events) = state.hub.connect()?;
    let frames = events.map(|event| Ok(Event::default().event(event.name).data(event.data)));
    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}

// =============================================================================
// Review API
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    pub file: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub file: String,
    pub feedback: String,
    pub issues: SeverityBuckets,
}

pub async fn review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let (file, content) = match (request.file, request.content) {
        (Some(file), Some(content)) if !file.trim().is_empty() && !content.is_empty() => (file, content),
        _ => {
            return Err(ApiError::new(
                "File path and content are required",
                AnalyzerError::Validation("missing file or content".into()),
            ))
        }
    };

    match run_review(&state, &file, content) {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!(file = file.as_str(), error = %e, "review failed");
            let _ = state
                .hub
                .broadcast("review_error", &json!({ "file": file, "error": e.to_string() }));
            Err(ApiError::new("Error while reviewing code", e))
        }
    }
}

fn run_review(state: &AppState, file: &str, content: String) -> crate::Result<ReviewResponse> {
    state.hub.broadcast("review_started", &json!({ "file": file }))?;

    let source = SourceFile::new(file, content);
    let result = state.source_engine.evaluate(&source);
    tracing::info!(
        file,
        findings = result.findings.len(),
        "reviewed source file"
    );

    let response = ReviewResponse {
        success: true,
        file: file.to_string(),
        feedback: render_text_feedback(&result, file),
        issues: SeverityBuckets::from_result(&result),
    };
    state.hub.broadcast("review_completed", &response)?;
    Ok(response)
}

#[derive(Debug, Default, Deserialize)]
pub struct A11yRequest {
    pub file: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct A11yResponse {
    pub success: bool,
    pub file: String,
    pub summary: Summary,
    pub result: RuleResult,
}

pub async fn a11y(
    State(state): State<AppState>,
    Json(request): Json<A11yRequest>,
) -> Result<Json<A11yResponse>, ApiError> {
    let (Some(file), Some(html)) = (request.file, request.html) else {
        return Err(ApiError::new(
            "File name and HTML are required",
            AnalyzerError::Validation("missing file or html".into()),
        ));
    };

    let result = check_markup(&state, &file, &html);
    Ok(Json(A11yResponse {
        success: true,
        summary: Summary::from_result(&result),
        file,
        result,
    }))
}

fn check_markup(state: &AppState, file: &str, html: &str) -> RuleResult {
    let document = MarkupDocument::parse(html, file);
    state.markup_engine.evaluate(&document)
}

// =============================================================================
// Webhook
// =============================================================================

pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let event = header_str(&headers, EVENT_HEADER).unwrap_or_default().to_string();

    match &state.webhook_auth {
        WebhookAuth::Secret(secret) => {
            if let Err(e) = webhook::verify_signature(secret, &body, header_str(&headers, SIGNATURE_HEADER)) {
                tracing::warn!(event = event.as_str(), error = %e, "rejected webhook delivery");
                return Err(ApiError::new("Invalid webhook signature", e));
            }
        }
        WebhookAuth::Unsigned => {
            tracing::warn!(event = event.as_str(), "accepting unsigned webhook delivery");
        }
    }

    match webhook::handle_event(&state, &event, &body).await {
        Ok(outcome) => Ok(Json(webhook_body(&event, &outcome))),
        Err(e) => {
            tracing::error!(event = event.as_str(), error = %e, "webhook processing failed");
            let _ = state
                .hub
                .broadcast("webhook_error", &json!({ "event": event, "error": e.to_string() }));
            Err(ApiError::new("Error while processing webhook", e))
        }
    }
}

fn webhook_body(event: &str, outcome: &WebhookOutcome) -> Value {
    json!({ "success": true, "event": event, "result": outcome })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let status = |e: AnalyzerError| ApiError::from(e).status();
        assert_eq!(status(AnalyzerError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AnalyzerError::Signature("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AnalyzerError::parse("a.html", "bad")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(AnalyzerError::external("GitHub", "500")), StatusCode::BAD_GATEWAY);
        assert_eq!(status(AnalyzerError::Config("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_webhook_body_shape() {
        let body = webhook_body("ping", &WebhookOutcome::Pong);
        assert_eq!(body["success"], true);
        assert_eq!(body["event"], "ping");
        assert_eq!(body["result"]["outcome"], "pong");
    }
}
