//! Plain-text review feedback and console summaries

use colored::*;

use super::summary::{SeverityBuckets, Summary};
use crate::core::{FeedbackBucket, RuleResult, Severity};

/// Feedback text posted as a review comment
///
/// Issues are grouped into the four buckets in fixed order, one bullet per
/// location. A result without findings gets a single congratulatory line.
pub fn render_text_feedback(result: &RuleResult, source: &str) -> String {
    if result.is_clean() {
        return format!("No issues were found in {}. Great work!", source);
    }

    let buckets = SeverityBuckets::from_result(result);
    let sections: Vec<String> = FeedbackBucket::ORDER
        .iter()
        .filter_map(|bucket| {
            let issues = buckets.bucket(*bucket);
            if issues.is_empty() {
                return None;
            }
            let mut section = format!("{}:\n", bucket.heading());
            for issue in issues {
                section.push_str(&format!("- [line {}] {}\n", issue.line, issue.message));
            }
            Some(section)
        })
        .collect();

    format!("Review results for {}:\n\n{}", source, sections.join("\n"))
}

fn severity_label(severity: Severity, colored: bool) -> ColoredString {
    let s = severity.as_str();
    if !colored {
        return s.normal();
    }
    match severity {
        Severity::Critical => s.red().bold(),
        Severity::Serious => s.red(),
        Severity::Moderate => s.yellow(),
        Severity::Minor => s.cyan(),
        Severity::Info => s.dimmed(),
    }
}

/// Short summary printed by the CLI after checking one input
pub fn render_console_summary(result: &RuleResult, source: &str, colored: bool) -> String {
    let summary = Summary::from_result(result);
    let mut output = String::new();

    if colored {
        output.push_str(&format!("{}\n", source.underline()));
    } else {
        output.push_str(&format!("{}\n", source));
    }

    for (index, finding) in result.findings.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {} [{}] {} ({} occurrence{})\n",
            index + 1,
            severity_label(finding.severity, colored),
            finding.rule_id,
            finding.summary,
            finding.locations.len(),
            if finding.locations.len() == 1 { "" } else { "s" }
        ));
    }

    let violations = format!("{} violations", summary.total_violations);
    let passes = format!("{} passes", summary.total_passes);
    if colored {
        output.push_str(&format!("  {}, {}\n", violations.red(), passes.green()));
    } else {
        output.push_str(&format!("  {}, {}\n", violations, passes));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Finding, Location, Pass, Target};
    use pretty_assertions::assert_eq;

    fn issue(rule: &str, severity: Severity, summary: &str, line: usize) -> Finding {
        Finding::new(rule, severity, summary, "d", Location::new("x", Target::Line(line), "fix"))
    }

    #[test]
    fn test_clean_feedback() {
        let result = RuleResult {
            findings: vec![],
            passes: vec![Pass::new("console_log", "ok")],
        };
        assert_eq!(
            render_text_feedback(&result, "src/app.js"),
            "No issues were found in src/app.js. Great work!"
        );
    }

    #[test]
    fn test_feedback_bucket_order() {
        let result = RuleResult {
            findings: vec![
                issue("todo_comment", Severity::Info, "Unfinished TODO comment", 3),
                issue("console_log", Severity::Moderate, "Production code contains console.log", 5),
                issue("security_eval", Severity::Critical, "eval() executes arbitrary code", 9),
                issue("long_line", Severity::Minor, "Line exceeds 100 characters", 2)
                    .with_location(Location::new("y", Target::Line(7), "wrap")),
            ],
            passes: vec![],
        };

        let expected = "Review results for app.js:\n\n\
Critical issues:\n\
- [line 9] eval() executes arbitrary code\n\
\n\
Warnings:\n\
- [line 5] Production code contains console.log\n\
\n\
Suggestions:\n\
- [line 2] Line exceeds 100 characters\n\
- [line 7] Line exceeds 100 characters\n\
\n\
Info:\n\
- [line 3] Unfinished TODO comment\n";

        assert_eq!(render_text_feedback(&result, "app.js"), expected);
    }

    #[test]
    fn test_feedback_skips_empty_buckets() {
        let result = RuleResult {
            findings: vec![issue("todo_comment", Severity::Info, "Unfinished TODO comment", 1)],
            passes: vec![],
        };
        let text = render_text_feedback(&result, "a.py");
        assert!(!text.contains("Critical issues"));
        assert!(text.contains("Info:\n- [line 1] Unfinished TODO comment"));
    }

    #[test]
    fn test_console_summary_plain() {
        let result = RuleResult {
            findings: vec![issue("label", Severity::Critical, "Form elements must have labels", 1)],
            passes: vec![Pass::new("image-alt", "ok")],
        };
        let text = render_console_summary(&result, "index.html", false);
        assert!(text.starts_with("index.html\n"));
        assert!(text.contains("1. critical [label] Form elements must have labels (1 occurrence)"));
        assert!(text.contains("1 violations, 1 passes"));
    }
}
