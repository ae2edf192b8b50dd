//! Rule evaluation engine
//!
//! The engine owns an ordered catalog of boxed rules for one input category
//! and evaluates all of them against a single input:
//!
//! ```text
//! subject ──► rule.candidates ──► rule.check (per candidate)
//!                  │                    │
//!             none: skip        violations? ──► Finding
//!                                   none   ──► Pass
//! ```
//!
//! Catalogs are plain values, so callers can build subsets or inject their
//! own rules without touching shared state.

pub mod rule;

pub use rule::{Rule, RuleMeta, Subject, Violation};

use std::collections::HashMap;

use crate::config::Config;
use crate::core::{Finding, MarkupDocument, Pass, RuleResult, Severity, SourceFile};
use crate::rules;

/// Ordered, immutable rule catalog for one input category
pub struct RuleEngine<S: Subject + ?Sized> {
    rules: Vec<Box<dyn Rule<S>>>,
    severity_overrides: HashMap<&'static str, Severity>,
}

impl<S: Subject + ?Sized> RuleEngine<S> {
    pub fn new(rules: Vec<Box<dyn Rule<S>>>) -> Self {
        Self {
            rules,
            severity_overrides: HashMap::new(),
        }
    }

    /// Append a rule at the end of the catalog
    pub fn with_rule(mut self, rule: Box<dyn Rule<S>>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Keep only rules matching `keep`, preserving catalog order
    pub fn retain(mut self, keep: impl Fn(&RuleMeta) -> bool) -> Self {
        self.rules.retain(|rule| keep(rule.meta()));
        self
    }

    /// Apply `rules.enable`/`rules.disable` and severity overrides
    pub fn filtered(self, config: &Config) -> Self {
        let mut engine = self.retain(|meta| config.is_rule_enabled(meta.id));
        engine.severity_overrides = engine
            .rules
            .iter()
            .filter_map(|rule| {
                config
                    .severity_override(rule.id())
                    .map(|severity| (rule.id(), severity))
            })
            .collect();
        engine
    }

    pub fn rules(&self) -> impl Iterator<Item = &RuleMeta> {
        self.rules.iter().map(|rule| rule.meta())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule in catalog order
    ///
    /// A rule with no candidates produces nothing. Otherwise it produces one
    /// Finding holding all violating locations, or one Pass.
    pub fn evaluate(&self, subject: &S) -> RuleResult {
        let mut result = RuleResult::new();

        for rule in &self.rules {
            let meta = rule.meta();
            let candidates = rule.candidates(subject);
            if candidates.is_empty() {
                continue;
            }

            let base = self
                .severity_overrides
                .get(meta.id)
                .copied()
                .unwrap_or(meta.severity);
            let mut severity = base;
            let mut locations = Vec::new();

            for node in &candidates {
                for violation in rule.check(subject, node) {
                    if let Some(raised) = violation.severity {
                        severity = severity.max(raised);
                    }
                    locations.push(violation.location);
                }
            }

            if locations.is_empty() {
                result.passes.push(Pass::new(meta.id, meta.description));
            } else {
                tracing::debug!(
                    rule = meta.id,
                    occurrences = locations.len(),
                    "rule reported violations"
                );
                result.findings.push(Finding {
                    rule_id: meta.id.to_string(),
                    severity,
                    summary: meta.summary.to_string(),
                    description: meta.description.to_string(),
                    help_url: meta.help_url.map(str::to_string),
                    locations,
                });
            }
        }

        result
    }
}

impl RuleEngine<MarkupDocument> {
    /// Default accessibility catalog
    pub fn markup() -> Self {
        Self::new(rules::markup::catalog())
    }
}

impl RuleEngine<SourceFile> {
    /// Default code review catalog
    pub fn source() -> Self {
        Self::new(rules::source::catalog())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceSpan;

    /// Flags every line containing "bad"; raises to critical on "very bad"
    struct BadWordRule;

    const BAD_WORD: RuleMeta = RuleMeta::new("bad_word", Severity::Minor, "Bad word", "No bad words");

    impl Rule<SourceFile> for BadWordRule {
        fn meta(&self) -> &RuleMeta {
            &BAD_WORD
        }

        fn candidates<'a>(&self, subject: &'a SourceFile) -> Vec<SourceSpan<'a>> {
            subject
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| SourceSpan::new(i + 1, line))
                .collect()
        }

        fn check<'a>(&self, _subject: &'a SourceFile, node: &SourceSpan<'a>) -> Vec<Violation> {
            if !node.text.contains("bad") {
                return Vec::new();
            }
            let violation = Violation::at_line(node.line, node.text, "rephrase");
            if node.text.contains("very bad") {
                vec![violation.with_severity(Severity::Critical)]
            } else {
                vec![violation]
            }
        }
    }

    fn engine() -> RuleEngine<SourceFile> {
        RuleEngine::new(vec![Box::new(BadWordRule)])
    }

    #[test]
    fn test_no_candidates_no_output() {
        let result = engine().evaluate(&SourceFile::new("a.txt", "\n\n"));
        assert!(result.findings.is_empty());
        assert!(result.passes.is_empty());
    }

    #[test]
    fn test_pass_when_clean() {
        let result = engine().evaluate(&SourceFile::new("a.txt", "good\nfine"));
        assert!(result.findings.is_empty());
        assert!(result.has_pass("bad_word"));
    }

    #[test]
    fn test_single_finding_collects_all_locations() {
        let result = engine().evaluate(&SourceFile::new("a.txt", "bad\ngood\nbad again"));
        assert_eq!(result.findings.len(), 1);
        let finding = &result.findings[0];
        assert_eq!(finding.locations.len(), 2);
        assert_eq!(finding.severity, Severity::Minor);
        assert!(!result.has_pass("bad_word"));
    }

    #[test]
    fn test_raised_severity_wins() {
        let result = engine().evaluate(&SourceFile::new("a.txt", "bad\nvery bad"));
        assert_eq!(result.findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_filtered_by_config() {
        let mut config = Config::default();
        config.rules.disable.push("bad_*".to_string());
        let filtered = engine().filtered(&config);
        assert!(filtered.is_empty());
        assert!(filtered.evaluate(&SourceFile::new("a.txt", "bad")).is_clean());
    }

    #[test]
    fn test_severity_override_from_config() {
        let mut config = Config::default();
        config
            .rules
            .severity
            .insert("bad_word".to_string(), "serious".to_string());
        let result = engine()
            .filtered(&config)
            .evaluate(&SourceFile::new("a.txt", "bad"));
        assert_eq!(result.findings[0].severity, Severity::Serious);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let file = SourceFile::new("a.js", "let x = 1;\nconsole.log(x);\neval(x);\n// TODO");
        let engine = RuleEngine::source();
        let first = serde_json::to_string(&engine.evaluate(&file)).unwrap();
        let second = serde_json::to_string(&engine.evaluate(&file)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_catalog_order() {
        let ids: Vec<_> = RuleEngine::markup().rules().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                "image-alt",
                "link-name",
                "label",
                "heading-order",
                "aria-roles",
                "aria-state-and-properties",
                "keyboard-accessibility",
            ]
        );
        assert_eq!(RuleEngine::source().len(), 18);
    }
}
