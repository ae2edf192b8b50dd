//! Markdown/MDX accessibility report
//!
//! The document is plain Markdown with inline-styled HTML blocks, so it
//! renders the same in MDX docs pages and on code-hosting sites.

use chrono::{DateTime, Utc};
use std::path::Path;

use super::html::html_escape;
use crate::core::{Finding, RuleResult, Severity};

const PASS_COLOR: &str = "#27ae60";
const FAIL_COLOR: &str = "#e74c3c";

/// Border colour for a finding's severity
pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "#e74c3c",
        Severity::Serious => "#e67e22",
        Severity::Moderate => "#f1c40f",
        _ => "#3498db",
    }
}

pub fn render_markdown_report(result: &RuleResult, source: &str, timestamp: DateTime<Utc>) -> String {
    let name = Path::new(source)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(source);
    let violation_color = if result.findings.is_empty() {
        PASS_COLOR
    } else {
        FAIL_COLOR
    };

    let mut mdx = format!(
        r#"# {name} accessibility report

<div style="background-color: #f8f9fa; padding: 12px; border-radius: 4px; margin: 12px 0; border-left: 5px solid #3498db;">
  <h2 style="margin: 0 0 8px 0;">Summary</h2>
  <ul style="margin: 0; padding-left: 20px;">
    <li><strong>Checked file:</strong> `{source}`</li>
    <li><strong>Checked at:</strong> {timestamp}</li>
    <li><strong>Violations:</strong> <span style="color: {violation_color}; font-weight: bold;">{violations}</span></li>
    <li><strong>Passes:</strong> <span style="color: {pass_color}; font-weight: bold;">{passes}</span></li>
  </ul>
</div>
"#,
        name = name,
        source = source,
        timestamp = timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        violation_color = violation_color,
        violations = result.findings.len(),
        pass_color = PASS_COLOR,
        passes = result.passes.len(),
    );

    if !result.findings.is_empty() {
        mdx.push_str("\n## Violations\n");
        for (index, finding) in result.findings.iter().enumerate() {
            mdx.push_str(&format_finding(index + 1, finding));
        }
    }

    if !result.passes.is_empty() {
        mdx.push_str("\n## Passes\n");
        for pass in &result.passes {
            mdx.push_str(&format!(
                r#"<div style="background-color: #f1fff1; border-left: 5px solid {color}; padding: 8px 12px; margin: 6px 0; border-radius: 4px;">
  <p style="margin: 0;"><strong>{id}:</strong> {description}</p>
</div>
"#,
                color = PASS_COLOR,
                id = pass.rule_id,
                description = html_escape(&pass.description),
            ));
        }
    }

    mdx
}

fn format_finding(number: usize, finding: &Finding) -> String {
    let help = finding
        .help_url
        .as_ref()
        .map(|url| {
            format!(
                "\n    <li><strong>Reference:</strong> <a href=\"{}\" target=\"_blank\">Learn more</a></li>",
                url
            )
        })
        .unwrap_or_default();

    let mut block = format!(
        r#"<div style="background-color: #fff8f8; border-left: 5px solid {color}; padding: 12px; margin: 8px 0; border-radius: 4px;">
  <h3 style="margin: 0 0 8px 0;">{number}. {id}</h3>
  <ul style="margin: 0 0 8px 0; padding-left: 20px;">
    <li><strong>Severity:</strong> {severity}</li>
    <li><strong>Description:</strong> {description}</li>
    <li><strong>How to fix:</strong> {summary}</li>{help}
  </ul>
"#,
        color = severity_color(finding.severity),
        number = number,
        id = finding.rule_id,
        severity = finding.severity,
        description = html_escape(&finding.description),
        summary = html_escape(&finding.summary),
        help = help,
    );

    for (index, location) in finding.locations.iter().enumerate() {
        block.push_str(&format!(
            r#"  <h4 style="margin: 8px 0 4px 0;">Affected element {n} ({target})</h4>
  <div style="background-color: #f5f5f5; padding: 8px; border-radius: 4px; font-family: monospace; overflow-x: auto;">
    {snippet}
  </div>
  <p style="margin: 4px 0;"><strong>Fix:</strong> {remediation}</p>
"#,
            n = index + 1,
            target = html_escape(&location.target.to_string()),
            snippet = html_escape(&location.snippet),
            remediation = html_escape(&location.remediation),
        ));
    }

    block.push_str("</div>\n");
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Location, Pass, Target};
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn finding(severity: Severity) -> Finding {
        Finding::new(
            "label",
            severity,
            "Form elements must have labels",
            "Every form control needs an accessible label.",
            Location::new("<input>", Target::Selector("input:nth-of-type(1)".into()), "Add a label"),
        )
    }

    #[test]
    fn test_color_map() {
        assert_eq!(severity_color(Severity::Critical), "#e74c3c");
        assert_eq!(severity_color(Severity::Serious), "#e67e22");
        assert_eq!(severity_color(Severity::Moderate), "#f1c40f");
        assert_eq!(severity_color(Severity::Minor), "#3498db");
        assert_eq!(severity_color(Severity::Info), "#3498db");
    }

    #[test]
    fn test_report_structure() {
        let result = RuleResult {
            findings: vec![finding(Severity::Critical)],
            passes: vec![Pass::new("image-alt", "Every image needs alt text.")],
        };
        let mdx = render_markdown_report(&result, "src/stories/Form/form.html", timestamp());

        assert!(mdx.starts_with("# form.html accessibility report"));
        assert!(mdx.contains("`src/stories/Form/form.html`"));
        assert!(mdx.contains("2024-05-01 08:00:00 UTC"));
        assert!(mdx.contains("## Violations"));
        assert!(mdx.contains("1. label"));
        assert!(mdx.contains("border-left: 5px solid #e74c3c"));
        assert!(mdx.contains("&lt;input&gt;"));
        assert!(mdx.contains("## Passes"));
        assert!(mdx.contains("<strong>image-alt:</strong>"));
    }

    #[test]
    fn test_clean_report_has_no_violation_section() {
        let result = RuleResult {
            findings: vec![],
            passes: vec![Pass::new("heading-order", "ok")],
        };
        let mdx = render_markdown_report(&result, "page.html", timestamp());
        assert!(!mdx.contains("## Violations"));
        assert!(mdx.contains("color: #27ae60; font-weight: bold;\">0</span>"));
    }
}
