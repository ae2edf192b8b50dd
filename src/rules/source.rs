//! Code review heuristics for source files
//!
//! These are substring and regex checks, not parsers. They are cheap and
//! predictable, and they share the false positives of any text-level check
//! (an identifier mentioned only in a comment still counts as "used").

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::core::{Severity, SourceFile, SourceKind, SourceSpan};
use crate::engine::{Rule, RuleMeta, Violation};

pub const MAX_FILE_LINES: usize = 100;
pub const MAX_LINE_LENGTH: usize = 100;
pub const MAX_DOM_QUERIES: usize = 5;
/// Reported when an `if`/`else` block opens at this depth
pub const MAX_CONDITIONAL_DEPTH: usize = 3;
pub const MAX_FUNCTION_LINES: usize = 50;
pub const MAX_MAGIC_NUMBERS: usize = 5;
pub const ALLOWED_NUMBERS: [&str; 3] = ["0", "1", "100"];
pub const MAX_DUPLICATED_LINES: usize = 3;
pub const MIN_DUPLICATE_LENGTH: usize = 30;

const SNIPPET_LENGTH: usize = 80;

static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)").unwrap());

static DOM_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bdocument\.(?:getElementById|getElementsByClassName|getElementsByTagName|getElementsByName|querySelectorAll|querySelector)\s*\(",
    )
    .unwrap()
});

static DYNAMIC_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\beval\s*\(|\bnew\s+Function\s*\(").unwrap());

static HTML_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(?:innerHTML|outerHTML)\s*\+?=(?:[^=]|$)").unwrap());

static CONDITIONAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:if|else)\b").unwrap());

static FUNCTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfunction\b[^{;]*\{|=>\s*\{").unwrap());

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());

// `=>` is consumed as a unit so arrow functions inside JSX attributes do not
// end the tag early
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z](?:=>|[^>])*>").unwrap());

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b(?:=>|[^>])*>").unwrap());

static ALT_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[\s:]alt\b").unwrap());

static CLICK_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bonclick\s*=|@click\b|\bon:click\b)").unwrap()
});

static KEY_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bonkey(?:down|up|press)\s*=|@key(?:down|up|press)\b|\bon:key(?:down|up|press)\b)")
        .unwrap()
});

/// Which files a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Scripts and components
    JavaScript,
    Component,
    Python,
    All,
}

impl Scope {
    fn covers(self, kind: SourceKind) -> bool {
        match self {
            Scope::JavaScript => kind.is_javascript(),
            Scope::Component => kind == SourceKind::Component,
            Scope::Python => kind == SourceKind::Python,
            Scope::All => true,
        }
    }
}

/// A rule that inspects the whole file at once
struct HeuristicRule {
    meta: RuleMeta,
    scope: Scope,
    check: fn(&SourceFile) -> Vec<Violation>,
}

impl Rule<SourceFile> for HeuristicRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn candidates<'a>(&self, file: &'a SourceFile) -> Vec<SourceSpan<'a>> {
        if self.scope.covers(file.kind) {
            vec![file.whole()]
        } else {
            Vec::new()
        }
    }

    fn check<'a>(&self, file: &'a SourceFile, _span: &SourceSpan<'a>) -> Vec<Violation> {
        (self.check)(file)
    }
}

fn heuristic(
    meta: RuleMeta,
    scope: Scope,
    check: fn(&SourceFile) -> Vec<Violation>,
) -> Box<dyn Rule<SourceFile>> {
    Box::new(HeuristicRule { meta, scope, check })
}

/// Code review catalog in evaluation order
pub fn catalog() -> Vec<Box<dyn Rule<SourceFile>>> {
    vec![
        heuristic(CONSOLE_LOG, Scope::JavaScript, check_console_log),
        heuristic(PRINT_STATEMENT, Scope::Python, check_print_statement),
        heuristic(LARGE_FILE, Scope::JavaScript, check_large_file),
        heuristic(MEMORY_LEAK, Scope::JavaScript, check_memory_leak),
        heuristic(UNUSED_VARIABLE, Scope::JavaScript, check_unused_variables),
        heuristic(TODO_COMMENT, Scope::All, check_todo),
        Box::new(LongLine),
        heuristic(DOM_QUERIES, Scope::JavaScript, check_dom_queries),
        heuristic(SECURITY_EVAL, Scope::JavaScript, check_eval),
        heuristic(SECURITY_INNERHTML, Scope::JavaScript, check_inner_html),
        heuristic(TIMER_LEAK, Scope::JavaScript, check_timers),
        heuristic(NESTED_CONDITIONALS, Scope::JavaScript, check_nested_conditionals),
        heuristic(LONG_FUNCTION, Scope::JavaScript, check_long_functions),
        heuristic(MAGIC_NUMBERS, Scope::JavaScript, check_magic_numbers),
        heuristic(UNHANDLED_PROMISE, Scope::JavaScript, check_unhandled_promise),
        heuristic(DUPLICATE_CODE, Scope::JavaScript, check_duplicate_code),
        heuristic(A11Y_CLICK_HANDLER, Scope::Component, check_click_handlers),
        heuristic(A11Y_IMG_ALT, Scope::Component, check_img_alt),
    ]
}

fn snippet(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= SNIPPET_LENGTH {
        return text.to_string();
    }
    let cut: String = text.chars().take(SNIPPET_LENGTH).collect();
    format!("{}...", cut)
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with('#')
}

/// One violation at the first line containing `needle`, if present
fn first_occurrence(file: &SourceFile, needle: &str, remediation: &str) -> Vec<Violation> {
    if !file.content.contains(needle) {
        return Vec::new();
    }
    let span = file.span_of(needle);
    vec![Violation::at_line(span.line, snippet(span.text), remediation)]
}

/// One violation per regex match, at the line where the match starts
fn each_match(file: &SourceFile, pattern: &Regex, remediation: &str) -> Vec<Violation> {
    pattern
        .find_iter(&file.content)
        .map(|m| {
            let line = file.line_at_offset(m.start());
            Violation::at_line(line, snippet(file.line_text(line)), remediation)
        })
        .collect()
}

// ============================================================================
// Debug output
// ============================================================================

const CONSOLE_LOG: RuleMeta = RuleMeta::new(
    "console_log",
    Severity::Moderate,
    "Production code contains console.log",
    "Debug logging left in shipped code leaks internals and clutters the console.",
);

fn check_console_log(file: &SourceFile) -> Vec<Violation> {
    first_occurrence(file, "console.log(", "Remove the call or route it through a logger.")
}

const PRINT_STATEMENT: RuleMeta = RuleMeta::new(
    "print_statement",
    Severity::Moderate,
    "Production code contains print statements",
    "print() calls in library or service code should use the logging module.",
);

fn check_print_statement(file: &SourceFile) -> Vec<Violation> {
    first_occurrence(file, "print(", "Replace print() with logging.")
}

const TODO_COMMENT: RuleMeta = RuleMeta::new(
    "todo_comment",
    Severity::Info,
    "Unfinished TODO comment",
    "The file contains a TODO marker for unfinished work.",
);

fn check_todo(file: &SourceFile) -> Vec<Violation> {
    first_occurrence(file, "TODO", "Finish the work or track it in an issue.")
}

// ============================================================================
// Size
// ============================================================================

const LARGE_FILE: RuleMeta = RuleMeta::new(
    "large_file",
    Severity::Minor,
    "File is too large; keep it under 100 lines",
    "Large files are harder to review and usually mix several responsibilities.",
);

fn check_large_file(file: &SourceFile) -> Vec<Violation> {
    let lines = file.line_count();
    if lines <= MAX_FILE_LINES {
        return Vec::new();
    }
    vec![Violation::at_line(
        1,
        format!("{} lines", lines),
        "Split the file into smaller modules.",
    )]
}

pub struct LongLine;

const LONG_LINE: RuleMeta = RuleMeta::new(
    "long_line",
    Severity::Minor,
    "Line exceeds 100 characters",
    "Long lines are hard to read and to diff.",
);

impl Rule<SourceFile> for LongLine {
    fn meta(&self) -> &RuleMeta {
        &LONG_LINE
    }

    fn candidates<'a>(&self, file: &'a SourceFile) -> Vec<SourceSpan<'a>> {
        file.lines()
            .enumerate()
            .map(|(i, line)| SourceSpan::new(i + 1, line))
            .collect()
    }

    fn check<'a>(&self, _file: &'a SourceFile, span: &SourceSpan<'a>) -> Vec<Violation> {
        let length = span.text.chars().count();
        if length <= MAX_LINE_LENGTH {
            return Vec::new();
        }
        vec![Violation::at_line(
            span.line,
            snippet(span.text),
            format!("Wrap this line ({} characters).", length),
        )]
    }
}

const LONG_FUNCTION: RuleMeta = RuleMeta::new(
    "long_function",
    Severity::Minor,
    "Function is longer than 50 lines",
    "Long functions usually do more than one thing and are hard to test.",
);

/// Offset of the `}` closing the `{` at `open`, counting raw braces
fn matching_brace(content: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in content.as_bytes()[open..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn check_long_functions(file: &SourceFile) -> Vec<Violation> {
    let mut violations = Vec::new();
    for m in FUNCTION_START.find_iter(&file.content) {
        let open = m.end() - 1;
        let Some(close) = matching_brace(&file.content, open) else {
            continue;
        };
        let start = file.line_at_offset(m.start());
        let length = file.line_at_offset(close) - start + 1;
        if length > MAX_FUNCTION_LINES {
            violations.push(Violation::at_line(
                start,
                snippet(file.line_text(start)),
                format!("Split this {}-line function into smaller ones.", length),
            ));
        }
    }
    violations
}

// ============================================================================
// Resource leaks
// ============================================================================

const MEMORY_LEAK: RuleMeta = RuleMeta::new(
    "memory_leak",
    Severity::Critical,
    "addEventListener without removeEventListener may leak memory",
    "Listeners that are never removed keep their targets and closures alive.",
);

fn check_memory_leak(file: &SourceFile) -> Vec<Violation> {
    if file.content.contains("removeEventListener") {
        return Vec::new();
    }
    first_occurrence(
        file,
        "addEventListener",
        "Remove the listener with removeEventListener when it is no longer needed.",
    )
}

const TIMER_LEAK: RuleMeta = RuleMeta::new(
    "timer_leak",
    Severity::Moderate,
    "Timer is started but never cleared",
    "Timers that are never cleared keep running after their owner is gone.",
);

fn check_timers(file: &SourceFile) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !file.content.contains("clearInterval(") {
        violations.extend(first_occurrence(
            file,
            "setInterval(",
            "Keep the interval id and call clearInterval.",
        ));
    }
    if !file.content.contains("clearTimeout(") {
        violations.extend(first_occurrence(
            file,
            "setTimeout(",
            "Keep the timeout id and call clearTimeout when cancelling.",
        ));
    }
    violations
}

const UNHANDLED_PROMISE: RuleMeta = RuleMeta::new(
    "unhandled_promise",
    Severity::Moderate,
    "Promise chain has no .catch()",
    "Rejections without a handler surface as unhandled promise rejections.",
);

fn check_unhandled_promise(file: &SourceFile) -> Vec<Violation> {
    if file.content.contains(".catch(") {
        return Vec::new();
    }
    first_occurrence(file, ".then(", "Add a .catch() handler to the chain.")
}

// ============================================================================
// Maintainability
// ============================================================================

const UNUSED_VARIABLE: RuleMeta = RuleMeta::new(
    "unused_variable",
    Severity::Moderate,
    "Variable is declared but never used",
    "Unused declarations are dead code and hide real intent.",
);

fn check_unused_variables(file: &SourceFile) -> Vec<Violation> {
    let mut violations = Vec::new();
    for caps in DECLARATION.captures_iter(&file.content) {
        let Some(name) = caps.get(1) else { continue };
        let rest = &file.content[name.end()..];
        let used = match Regex::new(&format!(r"\b{}\b", regex::escape(name.as_str()))) {
            Ok(usage) => usage.is_match(rest),
            Err(_) => true,
        };
        if !used {
            let line = file.line_at_offset(name.start());
            violations.push(Violation::at_line(
                line,
                snippet(file.line_text(line)),
                format!("Remove `{}` or use it.", name.as_str()),
            ));
        }
    }
    violations
}

const NESTED_CONDITIONALS: RuleMeta = RuleMeta::new(
    "nested_conditionals",
    Severity::Moderate,
    "Conditionals are nested too deeply",
    "Three or more nested if blocks are hard to follow.",
);

fn check_nested_conditionals(file: &SourceFile) -> Vec<Violation> {
    let mut violations = Vec::new();
    // One entry per open brace: whether it opened an if/else block
    let mut blocks: Vec<bool> = Vec::new();

    for (i, line) in file.lines().enumerate() {
        let keyword_ends: Vec<usize> = CONDITIONAL.find_iter(line).map(|m| m.end()).collect();
        let mut next_keyword = 0;
        // Set by an if/else keyword; consumed by its brace, dropped at the end of a braceless branch
        let mut pending = false;

        for (offset, ch) in line.char_indices() {
            while next_keyword < keyword_ends.len() && keyword_ends[next_keyword] <= offset {
                pending = true;
                next_keyword += 1;
            }
            match ch {
                '{' => {
                    blocks.push(pending);
                    if pending && blocks.iter().filter(|c| **c).count() == MAX_CONDITIONAL_DEPTH {
                        violations.push(Violation::at_line(
                            i + 1,
                            snippet(line),
                            "Use early returns or extract the inner branches into functions.",
                        ));
                    }
                    pending = false;
                }
                '}' => {
                    blocks.pop();
                }
                ';' => pending = false,
                _ => {}
            }
        }
    }
    violations
}

const MAGIC_NUMBERS: RuleMeta = RuleMeta::new(
    "magic_numbers",
    Severity::Minor,
    "Too many magic numbers",
    "Unnamed numeric literals hide their meaning; give them named constants.",
);

fn check_magic_numbers(file: &SourceFile) -> Vec<Violation> {
    let mut numbers: Vec<&str> = Vec::new();
    let mut first_line = None;

    for (i, line) in file.lines().enumerate() {
        if is_comment(line.trim_start()) {
            continue;
        }
        for m in NUMBER.find_iter(line) {
            let literal = m.as_str();
            if ALLOWED_NUMBERS.contains(&literal) {
                continue;
            }
            first_line.get_or_insert(i + 1);
            if !numbers.contains(&literal) {
                numbers.push(literal);
            }
        }
    }

    match first_line {
        Some(line) if numbers.len() > MAX_MAGIC_NUMBERS => vec![Violation::at_line(
            line,
            snippet(&numbers.join(", ")),
            format!("Replace the {} distinct literals with named constants.", numbers.len()),
        )],
        _ => Vec::new(),
    }
}

const DUPLICATE_CODE: RuleMeta = RuleMeta::new(
    "duplicate_code",
    Severity::Minor,
    "Duplicated lines of code",
    "Several non-trivial lines appear more than once; extract shared code.",
);

fn check_duplicate_code(file: &SourceFile) -> Vec<Violation> {
    // line text -> (first line number, occurrences)
    let mut seen: HashMap<&str, (usize, usize)> = HashMap::new();
    for (i, line) in file.lines().enumerate() {
        let text = line.trim();
        if text.chars().count() <= MIN_DUPLICATE_LENGTH || is_comment(text) {
            continue;
        }
        seen.entry(text).or_insert((i + 1, 0)).1 += 1;
    }

    let mut duplicated: Vec<(usize, &str)> = seen
        .into_iter()
        .filter(|(_, (_, count))| *count > 1)
        .map(|(text, (line, _))| (line, text))
        .collect();
    duplicated.sort_unstable();

    if duplicated.len() <= MAX_DUPLICATED_LINES {
        return Vec::new();
    }
    let (line, text) = duplicated[0];
    vec![Violation::at_line(
        line,
        snippet(text),
        format!(
            "{} distinct lines are repeated; extract them into a shared function.",
            duplicated.len()
        ),
    )]
}

const DOM_QUERIES: RuleMeta = RuleMeta::new(
    "excessive_dom_queries",
    Severity::Moderate,
    "Too many DOM queries",
    "Repeated DOM lookups are slow; cache element references.",
);

fn check_dom_queries(file: &SourceFile) -> Vec<Violation> {
    let queries: Vec<_> = DOM_QUERY.find_iter(&file.content).collect();
    if queries.len() <= MAX_DOM_QUERIES {
        return Vec::new();
    }
    let line = file.line_at_offset(queries[0].start());
    vec![Violation::at_line(
        line,
        format!("{} DOM queries", queries.len()),
        "Query each element once and keep the reference.",
    )]
}

// ============================================================================
// Security
// ============================================================================

const SECURITY_EVAL: RuleMeta = RuleMeta::new(
    "security_eval",
    Severity::Critical,
    "eval() or new Function() executes arbitrary code",
    "Evaluating strings as code allows injection attacks.",
);

fn check_eval(file: &SourceFile) -> Vec<Violation> {
    each_match(
        file,
        &DYNAMIC_CODE,
        "Parse the data explicitly instead of evaluating it as code.",
    )
}

const SECURITY_INNERHTML: RuleMeta = RuleMeta::new(
    "security_innerhtml",
    Severity::Critical,
    "Assigning innerHTML or outerHTML can introduce XSS",
    "Markup built from strings is parsed as HTML and can run injected scripts.",
);

fn check_inner_html(file: &SourceFile) -> Vec<Violation> {
    each_match(
        file,
        &HTML_ASSIGNMENT,
        "Use textContent or build elements with createElement.",
    )
}

// ============================================================================
// Accessibility in components
// ============================================================================

const A11Y_CLICK_HANDLER: RuleMeta = RuleMeta::new(
    "a11y_click_handler",
    Severity::Moderate,
    "Click handler without a keyboard handler",
    "Elements that react to clicks must also react to the keyboard.",
);

fn check_click_handlers(file: &SourceFile) -> Vec<Violation> {
    TAG.find_iter(&file.content)
        .filter(|tag| CLICK_HANDLER.is_match(tag.as_str()) && !KEY_HANDLER.is_match(tag.as_str()))
        .map(|tag| {
            Violation::at_line(
                file.line_at_offset(tag.start()),
                snippet(tag.as_str()),
                "Add a keyboard handler (onKeyDown) next to the click handler.",
            )
        })
        .collect()
}

const A11Y_IMG_ALT: RuleMeta = RuleMeta::new(
    "a11y_img_alt",
    Severity::Moderate,
    "Image without alt attribute",
    "Images in components need alternative text.",
);

fn check_img_alt(file: &SourceFile) -> Vec<Violation> {
    IMG_TAG
        .find_iter(&file.content)
        .filter(|tag| !ALT_ATTR.is_match(tag.as_str()))
        .map(|tag| {
            Violation::at_line(
                file.line_at_offset(tag.start()),
                snippet(tag.as_str()),
                "Add an alt attribute describing the image.",
            )
        })
        .collect()
}
