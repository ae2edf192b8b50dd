//! Report rendering
//!
//! All renderers are pure: they take a `RuleResult` (and a timestamp where the
//! output shows one) and return a string.

mod html;
mod markdown;
mod summary;
mod text;

pub use html::render_html_report;
pub use markdown::{render_markdown_report, severity_color};
pub use summary::{review_issues, ReviewIssue, SeverityBuckets, SeverityCounts, Summary};
pub use text::{render_console_summary, render_text_feedback};

/// Output format for the `check` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("sarif".parse::<OutputFormat>().is_err());
    }
}
