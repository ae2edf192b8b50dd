//! Code-hosting API client
//!
//! The webhook flow only needs four calls, so they sit behind the
//! [`CodeHost`] trait; [`GitHubClient`] implements it over the REST API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalyzerError, Result};

const SERVICE: &str = "GitHub";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// Label attached to issues opened for push reviews
pub const ISSUE_LABEL: &str = "code-review";

/// `owner/name` of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(AnalyzerError::Validation(format!(
                "repository name must be owner/name, got '{}'",
                full_name
            ))),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A file touched by a pull request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    /// `added`, `modified`, `removed`, `renamed`, ...
    pub status: String,
}

impl ChangedFile {
    pub fn is_removed(&self) -> bool {
        self.status == "removed"
    }
}

#[async_trait]
pub trait CodeHost: Send + Sync {
    async fn pull_request_files(&self, repo: &RepoRef, number: u64) -> Result<Vec<ChangedFile>>;

    /// Raw file text at `git_ref`
    async fn file_content(&self, repo: &RepoRef, path: &str, git_ref: &str) -> Result<String>;

    async fn create_issue_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()>;

    /// Open an issue and return its number
    async fn create_issue(&self, repo: &RepoRef, title: &str, body: &str) -> Result<u64>;
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct IssueRequest<'a> {
    title: &'a str,
    body: &'a str,
    labels: [&'a str; 1],
}

#[derive(Deserialize)]
struct IssueResponse {
    number: u64,
}

/// REST client for api.github.com (or a GitHub Enterprise base URL)
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    authenticated: bool,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AnalyzerError::Config("GitHub token contains invalid characters".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("web-analyzer/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(external)?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            authenticated: token.is_some(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn url(&self, repo: &RepoRef, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, repo.owner, repo.name, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(external)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AnalyzerError::external(
            SERVICE,
            format!("{} {}", status, body.trim()),
        ))
    }
}

fn external(err: reqwest::Error) -> AnalyzerError {
    AnalyzerError::external(SERVICE, err.to_string())
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn pull_request_files(&self, repo: &RepoRef, number: u64) -> Result<Vec<ChangedFile>> {
        let request = self
            .http
            .get(self.url(repo, &format!("pulls/{}/files", number)))
            .query(&[("per_page", "100")]);
        self.send(request).await?.json().await.map_err(external)
    }

    async fn file_content(&self, repo: &RepoRef, path: &str, git_ref: &str) -> Result<String> {
        let request = self
            .http
            .get(self.url(repo, &format!("contents/{}", path)))
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .query(&[("ref", git_ref)]);
        self.send(request).await?.text().await.map_err(external)
    }

    async fn create_issue_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        let request = self
            .http
            .post(self.url(repo, &format!("issues/{}/comments", number)))
            .json(&CommentRequest { body });
        self.send(request).await?;
        Ok(())
    }

    async fn create_issue(&self, repo: &RepoRef, title: &str, body: &str) -> Result<u64> {
        let request = self.http.post(self.url(repo, "issues")).json(&IssueRequest {
            title,
            body,
            labels: [ISSUE_LABEL],
        });
        let issue: IssueResponse = self.send(request).await?.json().await.map_err(external)?;
        Ok(issue.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_parse() {
        let repo = RepoRef::parse("octo/site").unwrap();
        assert_eq!(repo.owner, "octo");
        assert_eq!(repo.name, "site");
        assert_eq!(repo.to_string(), "octo/site");

        assert!(RepoRef::parse("site").is_err());
        assert!(RepoRef::parse("/site").is_err());
    }

    #[test]
    fn test_client_urls() {
        let client = GitHubClient::new("https://github.example.com/api/v3/", Some("t0ken")).unwrap();
        let repo = RepoRef::parse("octo/site").unwrap();
        assert_eq!(
            client.url(&repo, "pulls/7/files"),
            "https://github.example.com/api/v3/repos/octo/site/pulls/7/files"
        );
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_changed_file_status() {
        let files: Vec<ChangedFile> = serde_json::from_str(
            r#"[{"filename": "a.js", "status": "modified", "additions": 3},
                {"filename": "b.js", "status": "removed"}]"#,
        )
        .unwrap();
        assert!(!files[0].is_removed());
        assert!(files[1].is_removed());
    }
}
