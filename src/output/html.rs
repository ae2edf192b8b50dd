//! Standalone HTML accessibility report

use chrono::{DateTime, Utc};

use super::summary::Summary;
use crate::core::{Finding, Location, Pass, RuleResult};

/// Render a self-contained HTML page for one checked document
pub fn render_html_report(result: &RuleResult, source: &str, timestamp: DateTime<Utc>) -> String {
    let summary = Summary::from_result(result);

    let violations = if result.findings.is_empty() {
        r#"<p class="empty">No violations found.</p>"#.to_string()
    } else {
        result
            .findings
            .iter()
            .map(format_finding)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let passes = if result.passes.is_empty() {
        r#"<p class="empty">No passing checks.</p>"#.to_string()
    } else {
        format!(
            "<ul class=\"passes\">\n{}\n</ul>",
            result
                .passes
                .iter()
                .map(format_pass)
                .collect::<Vec<_>>()
                .join("\n")
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Accessibility report: {source}</title>
    <style>{css}</style>
</head>
<body>
    <header>
        <h1>Accessibility report</h1>
        <p class="source">{source}</p>
        <p class="timestamp">Generated: {timestamp}</p>
    </header>

    <section class="summary">
        <h2>Summary</h2>
        <div class="stats-grid">
            <div class="stat-card violations">
                <span class="stat-value">{total_violations}</span>
                <span class="stat-label">Violations</span>
            </div>
            <div class="stat-card">
                <span class="stat-value">{total_occurrences}</span>
                <span class="stat-label">Affected elements</span>
            </div>
            <div class="stat-card passes">
                <span class="stat-value">{total_passes}</span>
                <span class="stat-label">Passes</span>
            </div>
        </div>
    </section>

    <section class="violations">
        <h2>Violations</h2>
        {violations}
    </section>

    <section class="passes">
        <h2>Passes</h2>
        {passes}
    </section>

    <footer>
        <p>Generated by web-analyzer v{version}</p>
    </footer>
</body>
</html>"#,
        source = html_escape(source),
        css = CSS,
        timestamp = timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        total_violations = summary.total_violations,
        total_occurrences = summary.total_occurrences,
        total_passes = summary.total_passes,
        violations = violations,
        passes = passes,
        version = env!("CARGO_PKG_VERSION"),
    )
}

fn format_finding(finding: &Finding) -> String {
    let help = finding
        .help_url
        .as_ref()
        .map(|url| {
            format!(
                r#"<p class="help"><a href="{}" target="_blank">Learn more about {}</a></p>"#,
                html_escape(url),
                html_escape(&finding.rule_id)
            )
        })
        .unwrap_or_default();

    let locations: String = finding
        .locations
        .iter()
        .map(format_location)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<article class="violation {sev}">
    <h3><span class="badge {sev}">{sev}</span> {rule_id}: {summary}</h3>
    <p class="description">{description}</p>
    {help}
    <ol class="locations">
{locations}
    </ol>
</article>"#,
        sev = finding.severity.as_str(),
        rule_id = html_escape(&finding.rule_id),
        summary = html_escape(&finding.summary),
        description = html_escape(&finding.description),
        help = help,
        locations = locations,
    )
}

fn format_location(location: &Location) -> String {
    format!(
        r#"        <li>
            <p class="target">{target}</p>
            <pre><code>{snippet}</code></pre>
            <p class="remediation">{remediation}</p>
        </li>"#,
        target = html_escape(&location.target.to_string()),
        snippet = html_escape(&location.snippet),
        remediation = html_escape(&location.remediation),
    )
}

fn format_pass(pass: &Pass) -> String {
    format!(
        r#"    <li><strong>{}</strong>: {}</li>"#,
        html_escape(&pass.rule_id),
        html_escape(&pass.description)
    )
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const CSS: &str = r#"
:root {
    --color-critical: #e74c3c;
    --color-serious: #e67e22;
    --color-moderate: #f1c40f;
    --color-minor: #3498db;
    --color-info: #95a5a6;
    --color-pass: #27ae60;
}

* {
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.6;
    color: #333;
    max-width: 1100px;
    margin: 0 auto;
    padding: 20px;
    background: #f5f5f5;
}

header {
    background: linear-gradient(135deg, #2c3e50 0%, #34495e 100%);
    color: white;
    padding: 24px 30px;
    border-radius: 8px;
    margin-bottom: 20px;
}

header h1 {
    margin: 0 0 5px;
}

.source, .timestamp {
    margin: 0;
    opacity: 0.85;
}

section {
    background: white;
    padding: 25px;
    border-radius: 8px;
    margin-bottom: 20px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
}

h2 {
    margin-top: 0;
    border-bottom: 2px solid #2c3e50;
    padding-bottom: 8px;
}

.stats-grid {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
    gap: 15px;
}

.stat-card {
    background: #f8f9fa;
    padding: 20px;
    border-radius: 8px;
    text-align: center;
}

.stat-value {
    display: block;
    font-size: 2.2em;
    font-weight: bold;
}

.stat-card.violations .stat-value { color: var(--color-critical); }
.stat-card.passes .stat-value { color: var(--color-pass); }

.violation {
    border-left: 5px solid var(--color-minor);
    padding: 10px 20px;
    margin-bottom: 20px;
    background: #fafafa;
}

.violation.critical { border-left-color: var(--color-critical); }
.violation.serious { border-left-color: var(--color-serious); }
.violation.moderate { border-left-color: var(--color-moderate); }
.violation.info { border-left-color: var(--color-info); }

.badge {
    display: inline-block;
    padding: 2px 8px;
    border-radius: 4px;
    font-size: 0.75em;
    text-transform: uppercase;
    color: white;
    background: var(--color-minor);
}

.badge.critical { background: var(--color-critical); }
.badge.serious { background: var(--color-serious); }
.badge.moderate { background: var(--color-moderate); color: #333; }
.badge.info { background: var(--color-info); }

pre {
    background: #2d2d2d;
    color: #f8f8f2;
    padding: 10px;
    border-radius: 4px;
    overflow-x: auto;
}

.target {
    font-family: monospace;
    color: #555;
}

ul.passes li {
    color: var(--color-pass);
}

.empty {
    color: #777;
    font-style: italic;
}

footer {
    text-align: center;
    color: #777;
    font-size: 0.9em;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, Target};
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_report_contains_findings_and_passes() {
        let result = RuleResult {
            findings: vec![Finding::new(
                "image-alt",
                Severity::Serious,
                "Images must have alternate text",
                "Every image needs an alt attribute.",
                Location::new(r#"<img src="a.png">"#, Target::Selector("img:nth-of-type(1)".into()), "Add alt"),
            )
            .with_help_url("https://dequeuniversity.com/rules/axe/4.4/image-alt")],
            passes: vec![Pass::new("label", "Every form control needs a label.")],
        };

        let html = render_html_report(&result, "pages/index.html", timestamp());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("pages/index.html"));
        assert!(html.contains("2024-05-01 12:30:00 UTC"));
        assert!(html.contains(r#"class="violation serious""#));
        assert!(html.contains("&lt;img src=&quot;a.png&quot;&gt;"));
        assert!(html.contains("img:nth-of-type(1)"));
        assert!(html.contains("https://dequeuniversity.com/rules/axe/4.4/image-alt"));
        assert!(html.contains("<strong>label</strong>"));
    }

    #[test]
    fn test_report_empty_result() {
        let html = render_html_report(&RuleResult::new(), "empty.html", timestamp());
        assert!(html.contains("No violations found."));
        assert!(html.contains("No passing checks."));
    }
}
