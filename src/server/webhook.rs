//! GitHub webhook verification and event processing

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;

use super::github::RepoRef;
use super::AppState;
use crate::core::{RuleResult, SourceFile};
use crate::error::{AnalyzerError, Result};
use crate::output::render_text_feedback;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";

const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

/// `sha256=<hex>` signature of `body`, as sent in `X-Hub-Signature-256`
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes())))
}

/// Check an `X-Hub-Signature-256` header against the raw body
///
/// The digest comparison is constant-time.
pub fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> Result<()> {
    let header = header.ok_or_else(|| AnalyzerError::Signature("missing X-Hub-Signature-256 header".into()))?;
    let digest = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| AnalyzerError::Signature("signature must start with sha256=".into()))?;
    let expected =
        hex::decode(digest).map_err(|_| AnalyzerError::Signature("signature is not valid hex".into()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AnalyzerError::Signature(e.to_string()))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| AnalyzerError::Signature("signature mismatch".into()))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    action: String,
    number: u64,
    pull_request: PullRequest,
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    head: Head,
}

#[derive(Debug, Deserialize)]
struct Head {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PushEvent {
    #[serde(rename = "ref")]
    git_ref: String,
    after: String,
    #[serde(default)]
    commits: Vec<Commit>,
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct Commit {
    #[serde(default)]
    added: Vec<String>,
    #[serde(default)]
    modified: Vec<String>,
}

/// What a delivery resulted in; returned as the response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Pong,
    Ignored {
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    PullRequestReviewed {
        repository: String,
        number: u64,
        files_reviewed: usize,
        issue_count: usize,
        errors: usize,
    },
    #[serde(rename_all = "camelCase")]
    PushAnalyzed {
        repository: String,
        branch: String,
        files_reviewed: usize,
        issue_count: usize,
        errors: usize,
        issue_number: Option<u64>,
    },
}

/// Review result for one file in a batch
#[derive(Debug, Clone)]
pub struct FileReview {
    pub path: String,
    pub result: RuleResult,
}

impl FileReview {
    pub fn issue_count(&self) -> usize {
        self.result.occurrence_count()
    }
}

/// Reviews of one batch plus the number of files that could not be fetched
#[derive(Debug, Default)]
struct Batch {
    reviews: Vec<FileReview>,
    errors: usize,
}

impl Batch {
    fn issue_count(&self) -> usize {
        self.reviews.iter().map(FileReview::issue_count).sum()
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Process one verified delivery
pub async fn handle_event(state: &AppState, event: &str, body: &[u8]) -> Result<WebhookOutcome> {
    match event {
        "ping" => Ok(WebhookOutcome::Pong),
        "pull_request" => {
            let payload: PullRequestEvent = parse_payload(event, body)?;
            if !matches!(payload.action.as_str(), "opened" | "synchronize") {
                return Ok(WebhookOutcome::Ignored {
                    reason: format!("pull_request action '{}' is not reviewed", payload.action),
                });
            }
            review_pull_request(state, payload).await
        }
        "push" => {
            let payload: PushEvent = parse_payload(event, body)?;
            analyze_push(state, payload).await
        }
        "" => Err(AnalyzerError::Validation("missing X-GitHub-Event header".into())),
        other => Ok(WebhookOutcome::Ignored {
            reason: format!("event '{}' is not handled", other),
        }),
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(event: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| AnalyzerError::Validation(format!("invalid {} payload: {}", event, e)))
}

async fn review_pull_request(state: &AppState, payload: PullRequestEvent) -> Result<WebhookOutcome> {
    let repo = RepoRef::parse(&payload.repository.full_name)?;
    let number = payload.number;
    tracing::info!(repository = %repo, number, "reviewing pull request");
    state.hub.broadcast(
        "pr_review_started",
        &json!({ "repository": repo.to_string(), "number": number }),
    )?;

    let files = state.code_host.pull_request_files(&repo, number).await?;
    let paths: Vec<String> = files
        .into_iter()
        .filter(|file| !file.is_removed())
        .map(|file| file.filename)
        .collect();

    let batch = review_files(state, &repo, &paths, &payload.pull_request.head.sha).await;
    let comment = render_review_comment(&batch.reviews);
    state
        .code_host
        .create_issue_comment(&repo, number, &comment)
        .await?;

    let outcome = WebhookOutcome::PullRequestReviewed {
        repository: repo.to_string(),
        number,
        files_reviewed: batch.reviews.len(),
        issue_count: batch.issue_count(),
        errors: batch.errors,
    };
    state.hub.broadcast("pr_review_completed", &outcome)?;
    Ok(outcome)
}

async fn analyze_push(state: &AppState, payload: PushEvent) -> Result<WebhookOutcome> {
    let branch = payload
        .git_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(&payload.git_ref)
        .to_string();
    if branch != state.default_branch {
        return Ok(WebhookOutcome::Ignored {
            reason: format!("push to '{}' is not the default branch", branch),
        });
    }

    let repo = RepoRef::parse(&payload.repository.full_name)?;
    tracing::info!(repository = %repo, %branch, commits = payload.commits.len(), "analyzing push");
    state.hub.broadcast(
        "push_detected",
        &json!({
            "repository": repo.to_string(),
            "branch": branch,
            "commits": payload.commits.len(),
        }),
    )?;

    let mut paths: Vec<String> = Vec::new();
    for commit in &payload.commits {
        for path in commit.added.iter().chain(&commit.modified) {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
    }

    let batch = review_files(state, &repo, &paths, &payload.after).await;
    let issue_count = batch.issue_count();

    let issue_number = if issue_count > 0 {
        let title = format!("Code review: {} issue(s) found on {}", issue_count, branch);
        let number = state
            .code_host
            .create_issue(&repo, &title, &render_review_comment(&batch.reviews))
            .await?;
        state.hub.broadcast(
            "issue_created",
            &json!({ "repository": repo.to_string(), "issueNumber": number, "title": title }),
        )?;
        Some(number)
    } else {
        None
    };

    let outcome = WebhookOutcome::PushAnalyzed {
        repository: repo.to_string(),
        branch,
        files_reviewed: batch.reviews.len(),
        issue_count,
        errors: batch.errors,
        issue_number,
    };
    state.hub.broadcast("push_analyzed", &outcome)?;
    Ok(outcome)
}

/// Fetch and review each path; a failed fetch is logged, counted and skipped
async fn review_files(state: &AppState, repo: &RepoRef, paths: &[String], git_ref: &str) -> Batch {
    let mut batch = Batch::default();
    for path in paths {
        if state.config.is_excluded(path) {
            tracing::debug!(path = path.as_str(), "skipping excluded file");
            continue;
        }
        match fetch_and_review(state, repo, path, git_ref).await {
            Ok(review) => batch.reviews.push(review),
            Err(e) => {
                tracing::warn!(path = path.as_str(), error = %e, "failed to review file");
                batch.errors += 1;
            }
        }
    }
    batch
}

async fn fetch_and_review(state: &AppState, repo: &RepoRef, path: &str, git_ref: &str) -> Result<FileReview> {
    let content = state.code_host.file_content(repo, path, git_ref).await?;
    let file = SourceFile::new(path, content);
    Ok(FileReview {
        path: path.to_string(),
        result: state.source_engine.evaluate(&file),
    })
}

/// Markdown body for a review comment or tracking issue
pub fn render_review_comment(reviews: &[FileReview]) -> String {
    let flagged: Vec<&FileReview> = reviews.iter().filter(|r| !r.result.is_clean()).collect();
    let mut body = String::from("## Automated code review\n\n");

    if flagged.is_empty() {
        body.push_str(&format!(
            "No issues were found in {} changed file(s). Great work!\n",
            reviews.len()
        ));
        return body;
    }

    let total: usize = flagged.iter().map(|r| r.issue_count()).sum();
    body.push_str(&format!(
        "Found {} issue(s) in {} of {} file(s).\n",
        total,
        flagged.len(),
        reviews.len()
    ));
    for review in flagged {
        body.push_str(&format!("\n### `{}`\n\n", review.path));
        body.push_str(render_text_feedback(&review.result, &review.path).trim_end());
        body.push('\n');
    }
    body
}
