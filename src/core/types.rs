//! Core types for rule evaluation results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Finding severity
/// Ordered from lowest to highest priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only
    Info = 1,
    /// Minor issue ("suggestion" in review feedback)
    Minor = 2,
    /// Moderate issue ("warning" in review feedback)
    Moderate = 3,
    /// Serious issue, fix before release
    Serious = 4,
    /// Critical issue, must fix immediately
    Critical = 5,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::Serious,
        Severity::Moderate,
        Severity::Minor,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Serious => "serious",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
            Severity::Info => "info",
        }
    }

    /// Parse a severity name from either vocabulary.
    ///
    /// The accessibility checks speak axe's `critical/serious/moderate/minor`
    /// while code review speaks `critical/warning/suggestion/info`; both map
    /// onto the same scale.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "serious" => Some(Severity::Serious),
            "moderate" | "warning" => Some(Severity::Moderate),
            "minor" | "suggestion" => Some(Severity::Minor),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Review feedback bucket this severity falls into
    pub fn bucket(&self) -> FeedbackBucket {
        match self {
            Severity::Critical | Severity::Serious => FeedbackBucket::Critical,
            Severity::Moderate => FeedbackBucket::Warning,
            Severity::Minor => FeedbackBucket::Suggestion,
            Severity::Info => FeedbackBucket::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four groups plain-text review feedback is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackBucket {
    Critical,
    Warning,
    Suggestion,
    Info,
}

impl FeedbackBucket {
    /// Buckets in the fixed order feedback lists them
    pub const ORDER: [FeedbackBucket; 4] = [
        FeedbackBucket::Critical,
        FeedbackBucket::Warning,
        FeedbackBucket::Suggestion,
        FeedbackBucket::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackBucket::Critical => "critical",
            FeedbackBucket::Warning => "warning",
            FeedbackBucket::Suggestion => "suggestion",
            FeedbackBucket::Info => "info",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            FeedbackBucket::Critical => "Critical issues",
            FeedbackBucket::Warning => "Warnings",
            FeedbackBucket::Suggestion => "Suggestions",
            FeedbackBucket::Info => "Info",
        }
    }
}

/// Where an occurrence lives: a CSS-style selector for markup, a 1-based line
/// for source files
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Line(usize),
    Selector(String),
}

impl Target {
    pub fn line(&self) -> Option<usize> {
        match self {
            Target::Line(n) => Some(*n),
            Target::Selector(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Line(n) => write!(f, "line {}", n),
            Target::Selector(s) => f.write_str(s),
        }
    }
}

/// One concrete occurrence of a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Offending markup or source text
    pub snippet: String,
    pub target: Target,
    /// How to fix this occurrence
    pub remediation: String,
}

impl Location {
    pub fn new(snippet: impl Into<String>, target: Target, remediation: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
            target,
            remediation: remediation.into(),
        }
    }
}

/// A reported rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Rule identifier (e.g., "image-alt", "security_eval")
    pub rule_id: String,
    pub severity: Severity,
    /// One-line summary of the rule
    pub summary: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
    /// Always holds at least one entry
    pub locations: Vec<Location>,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        summary: impl Into<String>,
        description: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            summary: summary.into(),
            description: description.into(),
            help_url: None,
            locations: vec![location],
        }
    }

    pub fn with_help_url(mut self, url: impl Into<String>) -> Self {
        self.help_url = Some(url.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// First line number among the locations, if the finding is line-based
    pub fn first_line(&self) -> Option<usize> {
        self.locations.iter().find_map(|l| l.target.line())
    }
}

/// A rule that ran against at least one target and found nothing wrong
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pass {
    pub rule_id: String,
    pub description: String,
}

impl Pass {
    pub fn new(rule_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
        }
    }
}

/// Outcome of running a rule catalog over one input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub findings: Vec<Finding>,
    pub passes: Vec<Pass>,
}

impl RuleResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn finding(&self, rule_id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.rule_id == rule_id)
    }

    pub fn has_finding(&self, rule_id: &str) -> bool {
        self.finding(rule_id).is_some()
    }

    pub fn has_pass(&self, rule_id: &str) -> bool {
        self.passes.iter().any(|p| p.rule_id == rule_id)
    }

    /// Number of concrete occurrences across all findings
    pub fn occurrence_count(&self) -> usize {
        self.findings.iter().map(|f| f.locations.len()).sum()
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}
