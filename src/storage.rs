//! Report persistence next to the checked file

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::RuleResult;
use crate::error::Result;
use crate::output::{render_html_report, render_markdown_report};

/// Directory created beside the checked file
pub const REPORT_DIR: &str = "a11y";
pub const HTML_REPORT: &str = "report.html";
pub const MDX_REPORT: &str = "report.mdx";

/// Where the two report artifacts live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub html: PathBuf,
    pub mdx: PathBuf,
}

/// Writes `<dir>/a11y/report.html` and `<dir>/a11y/report.mdx`
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    /// Store for reports about `input`
    pub fn beside(input: &Path) -> Self {
        let parent = input.parent().unwrap_or_else(|| Path::new(""));
        Self {
            dir: parent.join(REPORT_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> ReportPaths {
        ReportPaths {
            html: self.dir.join(HTML_REPORT),
            mdx: self.dir.join(MDX_REPORT),
        }
    }

    /// Render both reports and write them, creating the directory if needed
    pub fn write(&self, result: &RuleResult, source: &str, timestamp: DateTime<Utc>) -> Result<ReportPaths> {
        fs::create_dir_all(&self.dir)?;

        let paths = self.paths();
        fs::write(&paths.html, render_html_report(result, source, timestamp))?;
        fs::write(&paths.mdx, render_markdown_report(result, source, timestamp))?;

        tracing::info!(
            html = %paths.html.display(),
            mdx = %paths.mdx.display(),
            "wrote accessibility reports"
        );
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Finding, Location, Severity, Target};
    use crate::error::AnalyzerError;
    use tempfile::TempDir;

    #[test]
    fn test_paths_beside_input() {
        let store = ReportStore::beside(Path::new("src/stories/Button/button.html"));
        let paths = store.paths();
        assert_eq!(paths.html, PathBuf::from("src/stories/Button/a11y/report.html"));
        assert_eq!(paths.mdx, PathBuf::from("src/stories/Button/a11y/report.mdx"));
    }

    #[test]
    fn test_paths_for_bare_file_name() {
        let store = ReportStore::beside(Path::new("index.html"));
        assert_eq!(store.dir(), Path::new("a11y"));
    }

    #[test]
    fn test_write_creates_directory() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("pages").join("home.html");
        let result = RuleResult {
            findings: vec![Finding::new(
                "image-alt",
                Severity::Serious,
                "Images must have alternate text",
                "d",
                Location::new("<img>", Target::Selector("img".into()), "add alt"),
            )],
            passes: vec![],
        };

        let paths = ReportStore::beside(&input)
            .write(&result, "pages/home.html", Utc::now())
            .unwrap();

        assert!(paths.html.exists());
        assert!(paths.mdx.exists());
        assert!(paths.html.starts_with(temp.path().join("pages").join("a11y")));
        let mdx = fs::read_to_string(&paths.mdx).unwrap();
        assert!(mdx.contains("image-alt"));
    }

    #[test]
    fn test_write_overwrites_previous_reports() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("page.html");
        let store = ReportStore::beside(&input);

        store.write(&RuleResult::new(), "first.html", Utc::now()).unwrap();
        let paths = store.write(&RuleResult::new(), "second.html", Utc::now()).unwrap();

        let html = fs::read_to_string(paths.html).unwrap();
        assert!(html.contains("second.html"));
        assert!(!html.contains("first.html"));
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("page.html");
        // A plain file where the report directory should go
        fs::write(temp.path().join(REPORT_DIR), "").unwrap();

        let err = ReportStore::beside(&input)
            .write(&RuleResult::new(), "page.html", Utc::now())
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Io(_)));
        assert!(!err.to_string().contains("read"));
    }
}
