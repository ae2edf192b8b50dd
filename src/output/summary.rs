//! Aggregated counts and severity buckets for a rule result

use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::{FeedbackBucket, RuleResult, Severity};

/// Finding counts per severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
            Severity::Info => self.info,
        }
    }

    fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Serious => self.serious += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::Minor => self.minor += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Structured summary of one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of findings (one per violated rule)
    pub total_violations: usize,
    /// Number of offending locations across all findings
    pub total_occurrences: usize,
    pub total_passes: usize,
    /// Occurrences per rule id
    pub by_rule_id: BTreeMap<String, usize>,
    /// Findings per severity
    pub by_severity: SeverityCounts,
}

impl Summary {
    pub fn from_result(result: &RuleResult) -> Self {
        let mut summary = Summary {
            total_violations: result.findings.len(),
            total_passes: result.passes.len(),
            ..Default::default()
        };

        for finding in &result.findings {
            summary.total_occurrences += finding.locations.len();
            *summary
                .by_rule_id
                .entry(finding.rule_id.clone())
                .or_default() += finding.locations.len();
            summary.by_severity.increment(finding.severity);
        }

        summary
    }
}

/// One line-level issue as reported by the review API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewIssue {
    #[serde(rename = "type")]
    pub rule_id: String,
    pub message: String,
    pub severity: FeedbackBucket,
    pub line: usize,
}

/// Flatten findings into issues, one per location, in catalog order
pub fn review_issues(result: &RuleResult) -> Vec<ReviewIssue> {
    result
        .findings
        .iter()
        .flat_map(|finding| {
            finding.locations.iter().map(move |location| ReviewIssue {
                rule_id: finding.rule_id.clone(),
                message: finding.summary.clone(),
                severity: finding.severity.bucket(),
                line: location.target.line().unwrap_or(1),
            })
        })
        .collect()
}

/// Issues grouped into the four feedback buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeverityBuckets {
    pub critical: Vec<ReviewIssue>,
    pub warning: Vec<ReviewIssue>,
    pub suggestion: Vec<ReviewIssue>,
    pub info: Vec<ReviewIssue>,
}

impl SeverityBuckets {
    pub fn from_result(result: &RuleResult) -> Self {
        let mut buckets = SeverityBuckets::default();
        for issue in review_issues(result) {
            buckets.bucket_mut(issue.severity).push(issue);
        }
        buckets
    }

    pub fn bucket(&self, bucket: FeedbackBucket) -> &[ReviewIssue] {
        match bucket {
            FeedbackBucket::Critical => &self.critical,
            FeedbackBucket::Warning => &self.warning,
            FeedbackBucket::Suggestion => &self.suggestion,
            FeedbackBucket::Info => &self.info,
        }
    }

    fn bucket_mut(&mut self, bucket: FeedbackBucket) -> &mut Vec<ReviewIssue> {
        match bucket {
            FeedbackBucket::Critical => &mut self.critical,
            FeedbackBucket::Warning => &mut self.warning,
            FeedbackBucket::Suggestion => &mut self.suggestion,
            FeedbackBucket::Info => &mut self.info,
        }
    }

    pub fn total(&self) -> usize {
        FeedbackBucket::ORDER
            .iter()
            .map(|b| self.bucket(*b).len())
            .sum()
    }
}
