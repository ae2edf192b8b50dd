//! Rule definitions for the analysis engine
//!
//! A rule is split in two steps: `candidates` picks the parts of the input it
//! applies to and `check` inspects one candidate. The engine turns the
//! outcome into a single Finding or Pass per rule.

use crate::core::{ElementExt, Location, MarkupDocument, Severity, SourceFile, SourceSpan, Target};
use scraper::ElementRef;

/// Input category a rule catalog runs against
pub trait Subject {
    /// Unit handed from candidate discovery to checking
    type Node<'a>
    where
        Self: 'a;
}

impl Subject for MarkupDocument {
    type Node<'a> = ElementRef<'a>;
}

impl Subject for SourceFile {
    type Node<'a> = SourceSpan<'a>;
}

/// Static description of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMeta {
    /// Unique rule identifier (e.g., "image-alt")
    pub id: &'static str,
    /// Declared severity; violations may raise it but never lower it
    pub severity: Severity,
    pub summary: &'static str,
    pub description: &'static str,
    pub help_url: Option<&'static str>,
}

impl RuleMeta {
    pub const fn new(
        id: &'static str,
        severity: Severity,
        summary: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            id,
            severity,
            summary,
            description,
            help_url: None,
        }
    }

    pub const fn with_help_url(self, url: &'static str) -> Self {
        Self {
            help_url: Some(url),
            ..self
        }
    }
}

/// One offending occurrence reported by `Rule::check`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub location: Location,
    /// Raises the finding above the rule's declared severity
    pub severity: Option<Severity>,
}

impl Violation {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            severity: None,
        }
    }

    /// Violation pointing at a markup element
    pub fn at_element(element: &ElementRef<'_>, remediation: impl Into<String>) -> Self {
        Self::new(Location::new(
            element.outer_html(),
            Target::Selector(element.css_target()),
            remediation,
        ))
    }

    /// Violation pointing at a source line
    pub fn at_line(line: usize, snippet: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self::new(Location::new(snippet, Target::Line(line), remediation))
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// Trait for rules over one input category
///
/// `check` returns every problem found on the candidate, so an element with
/// two bad attributes yields two violations.
pub trait Rule<S: Subject + ?Sized>: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    /// Parts of the input this rule applies to; empty means "not applicable"
    fn candidates<'a>(&self, subject: &'a S) -> Vec<S::Node<'a>>;

    fn check<'a>(&self, subject: &'a S, node: &S::Node<'a>) -> Vec<Violation>;

    fn id(&self) -> &'static str {
        self.meta().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: RuleMeta = RuleMeta::new("demo", Severity::Minor, "Demo", "A demo rule")
        .with_help_url("https://example.com/demo");

    #[test]
    fn test_meta_const_builder() {
        assert_eq!(META.id, "demo");
        assert_eq!(META.help_url, Some("https://example.com/demo"));
        assert_eq!(META.severity, Severity::Minor);
    }

    #[test]
    fn test_violation_at_line() {
        let v = Violation::at_line(7, "eval(x)", "remove eval").with_severity(Severity::Critical);
        assert_eq!(v.location.target, Target::Line(7));
        assert_eq!(v.severity, Some(Severity::Critical));
    }

    #[test]
    fn test_violation_at_element() {
        let doc = MarkupDocument::parse(r#"<img id="hero" src="a.png">"#, "t.html");
        let img = doc.elements_named(&["img"]).next().unwrap();
        let v = Violation::at_element(&img, "add alt");
        assert_eq!(v.location.target, Target::Selector("img#hero".into()));
        assert!(v.location.snippet.contains("hero"));
        assert_eq!(v.severity, None);
    }
}
