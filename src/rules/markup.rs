//! Accessibility rules for HTML documents
//!
//! Each rule mirrors a well-known axe-core check, reduced to what can be
//! decided from static markup without rendering.

use scraper::ElementRef;

use crate::core::{ElementExt, MarkupDocument, Severity};
use crate::engine::{Rule, RuleMeta, Violation};

/// Accessibility catalog in evaluation order
pub fn catalog() -> Vec<Box<dyn Rule<MarkupDocument>>> {
    vec![
        Box::new(ImageAlt),
        Box::new(LinkName),
        Box::new(FormLabel),
        Box::new(HeadingOrder),
        Box::new(AriaRoles),
        Box::new(AriaStateAndProperties),
        Box::new(KeyboardAccessibility),
    ]
}

/// Roles defined by WAI-ARIA 1.1
pub const VALID_ROLES: [&str; 69] = [
    "alert",
    "alertdialog",
    "application",
    "article",
    "banner",
    "button",
    "cell",
    "checkbox",
    "columnheader",
    "combobox",
    "complementary",
    "contentinfo",
    "definition",
    "dialog",
    "directory",
    "document",
    "feed",
    "figure",
    "form",
    "grid",
    "gridcell",
    "group",
    "heading",
    "img",
    "link",
    "list",
    "listbox",
    "listitem",
    "log",
    "main",
    "marquee",
    "math",
    "menu",
    "menubar",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "navigation",
    "none",
    "note",
    "option",
    "presentation",
    "progressbar",
    "radio",
    "radiogroup",
    "region",
    "row",
    "rowgroup",
    "rowheader",
    "scrollbar",
    "search",
    "searchbox",
    "separator",
    "slider",
    "spinbutton",
    "status",
    "switch",
    "tab",
    "table",
    "tablist",
    "tabpanel",
    "term",
    "textbox",
    "timer",
    "toolbar",
    "tooltip",
    "tree",
    "treegrid",
    "treeitem",
];

/// Roles that make an element behave like a focusable control
const WIDGET_ROLES: [&str; 6] = ["button", "link", "checkbox", "radio", "tab", "menuitem"];

const BOOLEAN_STATES: [&str; 4] = ["aria-expanded", "aria-pressed", "aria-checked", "aria-selected"];

const ID_REFERENCES: [&str; 2] = ["aria-controls", "aria-labelledby"];

const ARIA_ATTRIBUTES: [&str; 7] = [
    "aria-expanded",
    "aria-pressed",
    "aria-checked",
    "aria-selected",
    "aria-controls",
    "aria-labelledby",
    "aria-describedby",
];

fn non_empty_attr(element: &ElementRef<'_>, name: &str) -> bool {
    element.attr(name).is_some_and(|v| !v.trim().is_empty())
}

// ============================================================================
// image-alt
// ============================================================================

pub struct ImageAlt;

const IMAGE_ALT: RuleMeta = RuleMeta::new(
    "image-alt",
    Severity::Serious,
    "Images must have alternate text",
    "Every image needs an alt attribute describing its content.",
)
.with_help_url("https://dequeuniversity.com/rules/axe/4.4/image-alt");

impl Rule<MarkupDocument> for ImageAlt {
    fn meta(&self) -> &RuleMeta {
        &IMAGE_ALT
    }

    fn candidates<'a>(&self, doc: &'a MarkupDocument) -> Vec<ElementRef<'a>> {
        doc.elements_named(&["img"]).collect()
    }

    fn check<'a>(&self, _doc: &'a MarkupDocument, img: &ElementRef<'a>) -> Vec<Violation> {
        if non_empty_attr(img, "alt") {
            return Vec::new();
        }
        vec![Violation::at_element(
            img,
            "Add an alt attribute that describes the image.",
        )]
    }
}

// ============================================================================
// link-name
// ============================================================================

pub struct LinkName;

const LINK_NAME: RuleMeta = RuleMeta::new(
    "link-name",
    Severity::Serious,
    "Links and buttons must have discernible text",
    "Every link and button needs an accessible name.",
)
.with_help_url("https://dequeuniversity.com/rules/axe/4.4/link-name");

impl Rule<MarkupDocument> for LinkName {
    fn meta(&self) -> &RuleMeta {
        &LINK_NAME
    }

    fn candidates<'a>(&self, doc: &'a MarkupDocument) -> Vec<ElementRef<'a>> {
        doc.elements_named(&["a", "button"]).collect()
    }

    fn check<'a>(&self, _doc: &'a MarkupDocument, el: &ElementRef<'a>) -> Vec<Violation> {
        let named = !el.text_content().trim().is_empty()
            || non_empty_attr(el, "aria-label")
            || non_empty_attr(el, "aria-labelledby");
        if named {
            return Vec::new();
        }
        vec![Violation::at_element(
            el,
            "Add text content or an aria-label attribute to this element.",
        )]
    }
}

// ============================================================================
// label
// ============================================================================

pub struct FormLabel;

const LABEL: RuleMeta = RuleMeta::new(
    "label",
    Severity::Critical,
    "Form elements must have labels",
    "Every form control needs an accessible label.",
)
.with_help_url("https://dequeuniversity.com/rules/axe/4.4/label");

const UNLABELLED_INPUT_TYPES: [&str; 4] = ["hidden", "button", "submit", "reset"];

impl Rule<MarkupDocument> for FormLabel {
    fn meta(&self) -> &RuleMeta {
        &LABEL
    }

    fn candidates<'a>(&self, doc: &'a MarkupDocument) -> Vec<ElementRef<'a>> {
        doc.elements_named(&["input", "select", "textarea"])
            .filter(|el| {
                let kind = el.attr("type").unwrap_or("").trim().to_ascii_lowercase();
                !UNLABELLED_INPUT_TYPES.contains(&kind.as_str())
            })
            .collect()
    }

    fn check<'a>(&self, doc: &'a MarkupDocument, control: &ElementRef<'a>) -> Vec<Violation> {
        if control.has_attr("aria-label") || control.has_attr("aria-labelledby") {
            return Vec::new();
        }
        let labelled = control
            .attr("id")
            .filter(|id| !id.is_empty())
            .is_some_and(|id| doc.has_label_for(id));
        if labelled {
            return Vec::new();
        }
        vec![Violation::at_element(
            control,
            "Associate a <label for> element or add an aria-label attribute.",
        )]
    }
}

// ============================================================================
// heading-order
// ============================================================================

pub struct HeadingOrder;

const HEADING_ORDER: RuleMeta = RuleMeta::new(
    "heading-order",
    Severity::Moderate,
    "Heading levels should only increase by one",
    "Heading levels must increase one step at a time (h1 is followed by h2, not h3).",
)
.with_help_url("https://dequeuniversity.com/rules/axe/4.4/heading-order");

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

fn heading_level(el: &ElementRef<'_>) -> Option<u8> {
    el.tag().strip_prefix('h')?.parse().ok()
}

impl Rule<MarkupDocument> for HeadingOrder {
    fn meta(&self) -> &RuleMeta {
        &HEADING_ORDER
    }

    fn candidates<'a>(&self, doc: &'a MarkupDocument) -> Vec<ElementRef<'a>> {
        doc.elements_named(&HEADINGS).collect()
    }

    fn check<'a>(&self, doc: &'a MarkupDocument, heading: &ElementRef<'a>) -> Vec<Violation> {
        let Some(level) = heading_level(heading) else {
            return Vec::new();
        };
        let previous = doc
            .elements_named(&HEADINGS)
            .take_while(|el| el.id() != heading.id())
            .last()
            .and_then(|el| heading_level(&el));

        match previous {
            Some(prev) if level > prev + 1 => vec![Violation::at_element(
                heading,
                format!(
                    "Heading level jumps from h{} to h{}; use h{} instead.",
                    prev,
                    level,
                    prev + 1
                ),
            )],
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// aria-roles
// ============================================================================

pub struct AriaRoles;

const ARIA_ROLES: RuleMeta = RuleMeta::new(
    "aria-roles",
    Severity::Serious,
    "ARIA roles must be valid",
    "Values of the role attribute must be valid ARIA roles.",
)
.with_help_url("https://dequeuniversity.com/rules/axe/4.4/aria-roles");

impl Rule<MarkupDocument> for AriaRoles {
    fn meta(&self) -> &RuleMeta {
        &ARIA_ROLES
    }

    fn candidates<'a>(&self, doc: &'a MarkupDocument) -> Vec<ElementRef<'a>> {
        doc.elements().filter(|el| el.has_attr("role")).collect()
    }

    fn check<'a>(&self, _doc: &'a MarkupDocument, el: &ElementRef<'a>) -> Vec<Violation> {
        let role = el.attr("role").unwrap_or("");
        if VALID_ROLES.contains(&role) {
            return Vec::new();
        }
        vec![Violation::at_element(
            el,
            format!("\"{}\" is not a valid ARIA role.", role),
        )]
    }
}

// ============================================================================
// aria-state-and-properties
// ============================================================================

pub struct AriaStateAndProperties;

const ARIA_STATE: RuleMeta = RuleMeta::new(
    "aria-state-and-properties",
    Severity::Serious,
    "ARIA states and properties must be used correctly",
    "ARIA id references must point to existing elements and boolean states must be true or false.",
)
.with_help_url("https://dequeuniversity.com/rules/axe/4.4/aria-valid-attr-value");

impl Rule<MarkupDocument> for AriaStateAndProperties {
    fn meta(&self) -> &RuleMeta {
        &ARIA_STATE
    }

    fn candidates<'a>(&self, doc: &'a MarkupDocument) -> Vec<ElementRef<'a>> {
        doc.elements()
            .filter(|el| ARIA_ATTRIBUTES.iter().any(|attr| el.has_attr(attr)))
            .collect()
    }

    fn check<'a>(&self, doc: &'a MarkupDocument, el: &ElementRef<'a>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for attr in ID_REFERENCES {
            let Some(value) = el.attr(attr) else { continue };
            let missing: Vec<&str> = value
                .split_whitespace()
                .filter(|id| doc.element_by_id(id).is_none())
                .collect();
            if value.trim().is_empty() || !missing.is_empty() {
                violations.push(Violation::at_element(
                    el,
                    format!(
                        "{}=\"{}\" does not reference an existing element id.",
                        attr, value
                    ),
                ));
            }
        }

        for attr in BOOLEAN_STATES {
            let Some(value) = el.attr(attr) else { continue };
            let value_lower = value.to_ascii_lowercase();
            if value_lower != "true" && value_lower != "false" {
                violations.push(Violation::at_element(
                    el,
                    format!("{}=\"{}\" must be 'true' or 'false'.", attr, value),
                ));
            }
        }

        violations
    }
}

// ============================================================================
// keyboard-accessibility
// ============================================================================

pub struct KeyboardAccessibility;

const KEYBOARD: RuleMeta = RuleMeta::new(
    "keyboard-accessibility",
    Severity::Serious,
    "Interactive elements must be keyboard accessible",
    "Interactive elements must be reachable with the keyboard.",
)
.with_help_url("https://dequeuniversity.com/rules/axe/4.4/tabindex");

fn is_interactive(el: &ElementRef<'_>) -> bool {
    match el.tag() {
        "a" if el.has_attr("href") => true,
        "button" => true,
        _ => {
            el.attr("role").is_some_and(|role| WIDGET_ROLES.contains(&role))
                || el.attr("contenteditable") == Some("true")
        }
    }
}

fn is_hidden(el: &ElementRef<'_>) -> bool {
    el.has_attr("disabled")
        || el.has_attr("aria-hidden")
        || el.inline_style("display").as_deref() == Some("none")
        || el.inline_style("visibility").as_deref() == Some("hidden")
}

impl Rule<MarkupDocument> for KeyboardAccessibility {
    fn meta(&self) -> &RuleMeta {
        &KEYBOARD
    }

    fn candidates<'a>(&self, doc: &'a MarkupDocument) -> Vec<ElementRef<'a>> {
        doc.elements().filter(is_interactive).collect()
    }

    fn check<'a>(&self, _doc: &'a MarkupDocument, el: &ElementRef<'a>) -> Vec<Violation> {
        let mut violations = Vec::new();
        let native = matches!(el.tag(), "a" | "button");

        if let Some(role) = el.attr("role").filter(|r| WIDGET_ROLES.contains(r)) {
            if !native && !el.has_attr("tabindex") {
                violations.push(Violation::at_element(
                    el,
                    format!(
                        "Add a tabindex attribute; elements with role=\"{}\" must be reachable with the keyboard.",
                        role
                    ),
                ));
            }
        }

        let tabindex = el.attr("tabindex").and_then(|v| v.trim().parse::<i32>().ok());
        if tabindex.is_some_and(|t| t < 0) && !is_hidden(el) {
            violations.push(Violation::at_element(
                el,
                "Use a tabindex of 0 or remove it; a negative tabindex removes the element from keyboard navigation.",
            ));
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RuleResult;
    use crate::engine::RuleEngine;

    fn run(html: &str) -> RuleResult {
        RuleEngine::markup().evaluate(&MarkupDocument::parse(html, "page.html"))
    }

    #[test]
    fn test_every_rule_links_to_help() {
        for rule in catalog() {
            let url = rule.meta().help_url.unwrap();
            assert!(url.starts_with("https://dequeuniversity.com/rules/axe/4.4/"));
        }
    }

    #[test]
    fn test_role_list_size() {
        assert_eq!(VALID_ROLES.len(), 69);
    }

    #[test]
    fn test_images_with_alt_pass() {
        let result = run(r#"<img src="a.png" alt="Logo"><img src="b.png" alt="Chart">"#);
        assert!(!result.has_finding("image-alt"));
        assert_eq!(
            result.passes.iter().filter(|p| p.rule_id == "image-alt").count(),
            1
        );
    }

    #[test]
    fn test_no_images_no_pass() {
        let result = run("<p>text only</p>");
        assert!(!result.has_finding("image-alt"));
        assert!(!result.has_pass("image-alt"));
    }

    #[test]
    fn test_missing_or_empty_alt() {
        let result = run(r#"<img src="a.png"><img src="b.png" alt="  "><img src="c.png" alt="ok">"#);
        let finding = result.finding("image-alt").unwrap();
        assert_eq!(finding.locations.len(), 2);
        assert_eq!(finding.severity, Severity::Serious);
        assert!(finding.help_url.as_deref().unwrap().ends_with("image-alt"));
    }

    #[test]
    fn test_link_name() {
        let result = run(
            r#"<a href="/">Home</a><a href="/x"></a><button aria-label="Close"></button><button> </button>"#,
        );
        assert_eq!(result.finding("link-name").unwrap().locations.len(), 2);
    }

    #[test]
    fn test_label_rules() {
        let result = run(
            r#"<label for="email">Email</label><input id="email">
               <input type="hidden" name="t"><input type="submit">
               <input aria-label="Search"><textarea></textarea><select id="x"></select>"#,
        );
        let finding = result.finding("label").unwrap();
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.locations.len(), 2);
    }

    #[test]
    fn test_label_only_submit_is_not_applicable() {
        let result = run(r#"<input type="submit"><input type="HIDDEN">"#);
        assert!(!result.has_finding("label"));
        assert!(!result.has_pass("label"));
    }

    #[test]
    fn test_heading_jump_one_finding() {
        let result = run("<h1>a</h1><h2>b</h2><h4>c</h4>");
        let finding = result.finding("heading-order").unwrap();
        assert_eq!(finding.locations.len(), 1);
        assert!(finding.locations[0].remediation.contains("h2 to h4"));
    }

    #[test]
    fn test_heading_skip_from_first() {
        let result = run("<h1>a</h1><h3>b</h3>");
        assert_eq!(result.finding("heading-order").unwrap().locations.len(), 1);
    }

    #[test]
    fn test_heading_sequence_ok() {
        let result = run("<h1>a</h1><section><h2>b</h2><h3>c</h3></section><h2>d</h2>");
        assert!(!result.has_finding("heading-order"));
        assert!(result.has_pass("heading-order"));
    }

    #[test]
    fn test_aria_roles() {
        let result = run(r#"<div role="navigation"></div><div role="buton"></div>"#);
        let finding = result.finding("aria-roles").unwrap();
        assert_eq!(finding.locations.len(), 1);
        assert!(finding.locations[0].remediation.contains("buton"));
    }

    #[test]
    fn test_aria_expanded_values() {
        let bad = run(r#"<button aria-expanded="maybe">x</button>"#);
        assert!(bad.has_finding("aria-state-and-properties"));

        let good = run(r#"<button aria-expanded="true">x</button><button aria-expanded="FALSE">y</button>"#);
        assert!(!good.has_finding("aria-state-and-properties"));
        assert!(good.has_pass("aria-state-and-properties"));
    }

    #[test]
    fn test_aria_id_references() {
        let result = run(
            r#"<button aria-controls="menu">x</button><ul id="menu"></ul>
               <div aria-labelledby="ghost"></div>"#,
        );
        let finding = result.finding("aria-state-and-properties").unwrap();
        assert_eq!(finding.locations.len(), 1);
        assert!(finding.locations[0].remediation.contains("ghost"));
    }

    #[test]
    fn test_multiple_bad_attributes_on_one_element() {
        let result = run(r#"<div aria-controls="nope" aria-pressed="yes"></div>"#);
        let finding = result.finding("aria-state-and-properties").unwrap();
        assert_eq!(finding.locations.len(), 2);
    }

    #[test]
    fn test_keyboard_role_needs_tabindex() {
        let result = run(
            r#"<div role="button">Go</div><span role="link" tabindex="0">Open</span><a role="button" href="/">A</a>"#,
        );
        let finding = result.finding("keyboard-accessibility").unwrap();
        assert_eq!(finding.locations.len(), 1);
        assert!(finding.locations[0].snippet.contains("<div"));
    }

    #[test]
    fn test_keyboard_negative_tabindex() {
        let result = run(
            r#"<button tabindex="-1">a</button>
               <button tabindex="-1" disabled>b</button>
               <button tabindex="-1" style="display: none">c</button>
               <a href="/" tabindex="-1" aria-hidden="true">d</a>"#,
        );
        let finding = result.finding("keyboard-accessibility").unwrap();
        assert_eq!(finding.locations.len(), 1);
    }

    #[test]
    fn test_keyboard_pass() {
        let result = run(r#"<a href="/">Home</a><button>Save</button>"#);
        assert!(result.has_pass("keyboard-accessibility"));
    }

    #[test]
    fn test_clean_document_is_all_passes() {
        let result = run(
            r#"<html lang="en"><body><h1>Title</h1>
               <img src="logo.png" alt="Company logo">
               <a href="/about">About</a>
               <label for="q">Search</label><input id="q" type="text">
               </body></html>"#,
        );
        assert!(result.is_clean());
        assert!(result.has_pass("image-alt"));
        assert!(result.has_pass("link-name"));
        assert!(result.has_pass("label"));
        assert!(result.has_pass("heading-order"));
    }
}
