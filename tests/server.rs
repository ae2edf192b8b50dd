//! End-to-end tests for the review server over a real socket

use async_trait::async_trait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use web_analyzer::server::{build_router, sign, AppState, ChangedFile, CodeHost, RepoRef};
use web_analyzer::{AnalyzerError, Config, Result, WebhookAuth};

const SECRET: &str = "integration-secret";

#[derive(Default)]
struct RecordingHost {
    comments: Mutex<Vec<String>>,
}

#[async_trait]
impl CodeHost for RecordingHost {
    async fn pull_request_files(&self, _repo: &RepoRef, _number: u64) -> Result<Vec<ChangedFile>> {
        Ok(vec![ChangedFile {
            filename: "src/widget.js".to_string(),
            status: "added".to_string(),
        }])
    }

    async fn file_content(&self, _repo: &RepoRef, path: &str, _git_ref: &str) -> Result<String> {
        match path {
            "src/widget.js" => Ok("const el = document.body;\nel.innerHTML = input;\n".to_string()),
            other => Err(AnalyzerError::external("GitHub", format!("404 {}", other))),
        }
    }

    async fn create_issue_comment(&self, _repo: &RepoRef, _number: u64, body: &str) -> Result<()> {
        self.comments.lock().unwrap().push(body.to_string());
        Ok(())
    }

    async fn create_issue(&self, _repo: &RepoRef, _title: &str, _body: &str) -> Result<u64> {
        Ok(1)
    }
}

async fn start_server(host: Arc<RecordingHost>) -> (SocketAddr, AppState) {
    let state = AppState::new(
        Config::default(),
        WebhookAuth::Secret(SECRET.to_string()),
        "main",
        host,
    );
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    (addr, state)
}

async fn send_raw(addr: SocketAddr, method: &str, path: &str, headers: &[(&str, &str)], body: &str) -> (u16, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n",
        body.len()
    );
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    request.push_str(body);
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    let json = serde_json::from_str(body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_index_and_health() {
    let (addr, _) = start_server(Arc::new(RecordingHost::default())).await;

    let (status, body) = send_raw(addr, "GET", "/", &[], "").await;
    assert_eq!(status, 200);
    assert!(body["endpoints"].as_array().unwrap().len() >= 5);

    let (status, body) = send_raw(addr, "GET", "/health", &[], "").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["clients"], 0);
}

#[tokio::test]
async fn test_review_api() {
    let (addr, state) = start_server(Arc::new(RecordingHost::default())).await;
    let (_, mut events) = state.hub.connect().unwrap();

    let request = r#"{"file": "app.js", "content": "console.log('x');\neval(code);\n"}"#;
    let (status, body) = send_raw(
        addr,
        "POST",
        "/api/review",
        &[("Content-Type", "application/json")],
        request,
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["file"], "app.js");
    assert!(body["feedback"].as_str().unwrap().starts_with("Review results for app.js:"));
    assert_eq!(body["issues"]["critical"][0]["type"], "security_eval");
    assert_eq!(body["issues"]["critical"][0]["line"], 2);
    assert_eq!(body["issues"]["warning"][0]["type"], "console_log");

    let mut names = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(200), events.recv()).await {
        names.push(event.name);
    }
    assert_eq!(names, ["connected", "review_started", "review_completed"]);
}

#[tokio::test]
async fn test_review_api_requires_fields() {
    let (addr, _) = start_server(Arc::new(RecordingHost::default())).await;

    let (status, body) = send_raw(
        addr,
        "POST",
        "/api/review",
        &[("Content-Type", "application/json")],
        r#"{"file": "app.js"}"#,
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "File path and content are required");
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_review_api_rejects_empty_content() {
    let (addr, state) = start_server(Arc::new(RecordingHost::default())).await;
    let (_, mut events) = state.hub.connect().unwrap();

    let (status, body) = send_raw(
        addr,
        "POST",
        "/api/review",
        &[("Content-Type", "application/json")],
        r#"{"file": "a.js", "content": ""}"#,
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "File path and content are required");

    assert_eq!(events.recv().await.unwrap().name, "connected");
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn test_a11y_api() {
    let (addr, _) = start_server(Arc::new(RecordingHost::default())).await;

    let request = r#"{"file": "index.html", "html": "<img src=\"a.png\"><h1>Hi</h1>"}"#;
    let (status, body) = send_raw(
        addr,
        "POST",
        "/api/a11y",
        &[("Content-Type", "application/json")],
        request,
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["summary"]["totalViolations"], 1);
    assert_eq!(body["result"]["findings"][0]["ruleId"], "image-alt");
}

#[tokio::test]
async fn test_signed_pull_request_webhook() {
    let host = Arc::new(RecordingHost::default());
    let (addr, _) = start_server(host.clone()).await;

    let payload = r#"{"action":"opened","number":12,"pull_request":{"head":{"sha":"abc"}},"repository":{"full_name":"octo/site"}}"#;
    let signature = sign(SECRET, payload.as_bytes()).unwrap();
    let (status, body) = send_raw(
        addr,
        "POST",
        "/webhook",
        &[
            ("Content-Type", "application/json"),
            ("X-GitHub-Event", "pull_request"),
            ("X-Hub-Signature-256", &signature),
        ],
        payload,
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["result"]["outcome"], "pull_request_reviewed");
    assert_eq!(body["result"]["filesReviewed"], 1);

    let comments = host.comments.lock().unwrap();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("`src/widget.js`"));
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let host = Arc::new(RecordingHost::default());
    let (addr, _) = start_server(host.clone()).await;

    let payload = r#"{"zen":"Keep it simple."}"#;
    let signature = sign("wrong-secret", payload.as_bytes()).unwrap();
    let (status, body) = send_raw(
        addr,
        "POST",
        "/webhook",
        &[("X-GitHub-Event", "ping"), ("X-Hub-Signature-256", &signature)],
        payload,
    )
    .await;

    assert_eq!(status, 401);
    assert_eq!(body["success"], false);
    assert!(host.comments.lock().unwrap().is_empty());

    let (status, _) = send_raw(addr, "POST", "/webhook", &[("X-GitHub-Event", "ping")], payload).await;
    assert_eq!(status, 401);
}
