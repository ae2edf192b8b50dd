//! Web Analyzer - accessibility checks and heuristic code review
//!
//! This library provides:
//! - Accessibility: DOM-based checks for static HTML with HTML and MDX reports
//! - Code review: substring/regex heuristics over source files
//! - Review server: GitHub webhooks, a direct review API and live SSE updates
//!
//! # Example
//!
//! ```no_run
//! use web_analyzer::{MarkupDocument, RuleEngine};
//!
//! let doc = MarkupDocument::parse(r#"<img src="logo.png">"#, "index.html");
//! let result = RuleEngine::markup().evaluate(&doc);
//!
//! for finding in &result.findings {
//!     println!("{}: {}", finding.rule_id, finding.summary);
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod output;
pub mod rules;
pub mod server;
pub mod storage;
pub mod storybook;

pub use crate::broadcast::{BroadcastEvent, BroadcastHub, ClientId, EventStream};
pub use crate::config::{Config, ServerConfig, ServerOverrides, WebhookAuth};
pub use crate::core::{
    FeedbackBucket, Finding, Location, MarkupDocument, Pass, RuleResult, Severity, SourceFile,
    SourceKind, Target,
};
pub use crate::engine::{Rule, RuleEngine, RuleMeta, Violation};
pub use crate::error::{AnalyzerError, Result};
pub use crate::output::{OutputFormat, SeverityBuckets, Summary};
pub use crate::storage::{ReportPaths, ReportStore};

use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// File extensions checked by the accessibility command
pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];

/// Read and check one HTML file
pub fn check_markup_file(path: &Path, engine: &RuleEngine<MarkupDocument>) -> Result<RuleResult> {
    let bytes = std::fs::read(path).map_err(|e| AnalyzerError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let doc = MarkupDocument::from_bytes(&bytes, path.display().to_string())?;
    Ok(engine.evaluate(&doc))
}

/// Check many HTML files in parallel; output order follows `paths`
pub fn check_markup_files(
    paths: &[PathBuf],
    engine: &RuleEngine<MarkupDocument>,
) -> Vec<(PathBuf, Result<RuleResult>)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), check_markup_file(path, engine)))
        .collect()
}

/// Read and review one source file
pub fn review_source_file(path: &Path, engine: &RuleEngine<SourceFile>) -> Result<RuleResult> {
    let bytes = std::fs::read(path).map_err(|e| AnalyzerError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file = SourceFile::from_bytes(path.display().to_string(), &bytes)?;
    Ok(engine.evaluate(&file))
}

/// Whether `path` has one of `extensions` (case-insensitive)
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_markup_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.html");
        std::fs::write(&path, r#"<html><body><img src="a.png"><h1>Title</h1></body></html>"#).unwrap();

        let result = check_markup_file(&path, &RuleEngine::markup()).unwrap();
        assert!(result.has_finding("image-alt"));
        assert!(result.has_pass("heading-order"));
    }

    #[test]
    fn test_check_markup_file_rejects_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.html");
        std::fs::write(&path, [0x3c, 0x70, 0xff, 0xfe]).unwrap();

        let err = check_markup_file(&path, &RuleEngine::markup()).unwrap_err();
        assert!(matches!(err, AnalyzerError::Parse { .. }));
    }

    #[test]
    fn test_check_markup_files_keeps_order() {
        let temp = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = temp.path().join(format!("page{}.html", i));
                std::fs::write(&path, "<a href=\"/\"></a>").unwrap();
                path
            })
            .collect();

        let results = check_markup_files(&paths, &RuleEngine::markup());
        let order: Vec<_> = results.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(order, paths);
        assert!(results.iter().all(|(_, r)| r.as_ref().unwrap().has_finding("link-name")));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = review_source_file(Path::new("/nonexistent/app.js"), &RuleEngine::source()).unwrap_err();
        assert!(matches!(err, AnalyzerError::FileRead { .. }));
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/index.HTML"), MARKUP_EXTENSIONS));
        assert!(!has_extension(Path::new("a/index.js"), MARKUP_EXTENSIONS));
        assert!(!has_extension(Path::new("Makefile"), MARKUP_EXTENSIONS));
    }
}
