//! Error taxonomy shared by the engine, the CLI and the HTTP server

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Input that cannot be read as the expected category
    #[error("Parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// A call to an external code-hosting API failed
    #[error("{service} request failed: {message}")]
    ExternalService { service: String, message: String },

    /// A request is missing required fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Webhook signature missing or mismatched
    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::ExternalService { .. } => "external_service",
            Self::Validation(_) => "validation",
            Self::Signature(_) => "signature",
            Self::Config(_) => "config",
            Self::FileRead { .. } | Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = AnalyzerError::parse("page.html", "invalid UTF-8 at byte 3");
        assert_eq!(
            err.to_string(),
            "Parse error in page.html: invalid UTF-8 at byte 3"
        );
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_external_error_display() {
        let err = AnalyzerError::external("GitHub", "404 Not Found");
        assert!(err.to_string().contains("GitHub request failed"));
        assert_eq!(err.kind(), "external_service");
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AnalyzerError = io.into();
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_file_read_has_source() {
        use std::error::Error as _;
        let err = AnalyzerError::FileRead {
            path: PathBuf::from("missing.html"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("missing.html"));
        assert!(err.source().is_some());
    }
}
