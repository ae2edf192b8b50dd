//! Source files submitted for review

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};

/// Category of a source file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Plain scripts: js, mjs, cjs, ts
    Script,
    /// UI components and pages: jsx, tsx, vue, svelte, html
    Component,
    Python,
    Other,
}

impl SourceKind {
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "js" | "mjs" | "cjs" | "ts" => SourceKind::Script,
            "jsx" | "tsx" | "vue" | "svelte" | "html" | "htm" => SourceKind::Component,
            "py" => SourceKind::Python,
            _ => SourceKind::Other,
        }
    }

    /// Scripts and components both run JavaScript
    pub fn is_javascript(&self) -> bool {
        matches!(self, SourceKind::Script | SourceKind::Component)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Script => "script",
            SourceKind::Component => "component",
            SourceKind::Python => "python",
            SourceKind::Other => "other",
        }
    }
}

/// A file path together with its full text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub kind: SourceKind,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let kind = SourceKind::from_path(&path);
        Self {
            path,
            content: content.into(),
            kind,
        }
    }

    /// Build from raw bytes, rejecting anything that is not UTF-8
    pub fn from_bytes(path: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let path = path.into();
        let content = std::str::from_utf8(bytes)
            .map_err(|e| AnalyzerError::parse(path.clone(), e.to_string()))?
            .to_string();
        Ok(Self::new(path, content))
    }

    /// Lines split on `\n`; a trailing newline yields a final empty line
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    /// 1-based line of the first occurrence of `needle`, or 1 if absent
    pub fn line_of(&self, needle: &str) -> usize {
        self.lines()
            .position(|line| line.contains(needle))
            .map(|i| i + 1)
            .unwrap_or(1)
    }

    /// 1-based line containing byte offset `offset`
    pub fn line_at_offset(&self, offset: usize) -> usize {
        let end = offset.min(self.content.len());
        self.content.as_bytes()[..end]
            .iter()
            .filter(|b| **b == b'\n')
            .count()
            + 1
    }

    /// Text of a 1-based line, trimmed; empty when out of range
    pub fn line_text(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|i| self.lines().nth(i))
            .map(str::trim)
            .unwrap_or("")
    }

    /// Span for the first line containing `needle`
    pub fn span_of(&self, needle: &str) -> SourceSpan<'_> {
        let line = self.line_of(needle);
        SourceSpan::new(line, self.line_text(line))
    }

    /// Span covering the entire file, reported at line 1
    pub fn whole(&self) -> SourceSpan<'_> {
        SourceSpan::new(1, &self.content)
    }
}

/// A region of a source file handed from candidate discovery to checking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan<'a> {
    pub line: usize,
    pub text: &'a str,
}

impl<'a> SourceSpan<'a> {
    pub fn new(line: usize, text: &'a str) -> Self {
        Self { line, text }
    }
}
