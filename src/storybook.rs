//! Storybook integration for accessibility reports
//!
//! When a checked page `<name>.html` has a sibling `<name>.stories.js`, the
//! stories file gets an import of the MDX report and an `a11yReport`
//! parameter, and a dedicated `accessibility-report.stories.js` is written.
//!
//! [`docs_document`] builds the page a component's docs view renders: the
//! page imported by its stories file, repeated once per extra story.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{AnalyzerError, Result};

pub const REPORT_STORY_FILE: &str = "accessibility-report.stories.js";

const REPORT_IMPORT: &str = "import a11yReport from './a11y/report.mdx?raw';\n";

static IMPORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^import .+? from .+?['"];?\n"#).unwrap());

static PARAMETERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"parameters\s*:\s*\{").unwrap());

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"title\s*:\s*['"](.+?)['"]"#).unwrap());

static HTML_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+\w+Html\s+from\s+['"](.+?)['"]"#).unwrap());

static STORY_EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export const (\w+) = \{").unwrap());

/// Directories searched for component stories, relative to the project root
pub const STORY_ROOTS: &[&str] = &["src/stories", "stories"];

/// Stories that never get their own copy in the docs view
const SKIPPED_STORIES: &[&str] = &["Default", "AccessibilityReport"];

/// Outcome of linking a report into Storybook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryLink {
    /// No `<name>.stories.js` beside the page
    NoStories,
    /// The stories file already references the report
    AlreadyLinked(PathBuf),
    Linked {
        stories: PathBuf,
        report_story: PathBuf,
    },
}

/// Link the reports for `html_path` into its stories file
pub fn link_report(html_path: &Path) -> Result<StoryLink> {
    let Some(stem) = html_path.file_stem().and_then(|s| s.to_str()) else {
        return Ok(StoryLink::NoStories);
    };
    let dir = html_path.parent().unwrap_or_else(|| Path::new(""));
    let stories = dir.join(format!("{}.stories.js", stem));
    if !stories.exists() {
        tracing::debug!("no stories file at {}", stories.display());
        return Ok(StoryLink::NoStories);
    }

    let content = read(&stories)?;
    if content.contains("a11y/report.mdx") || content.contains("AccessibilityReport") {
        return Ok(StoryLink::AlreadyLinked(stories));
    }

    let patched = add_report_parameter(&add_report_import(&content));
    let report_story = dir.join(REPORT_STORY_FILE);
    fs::write(&report_story, report_story_source(&story_title(&content)))?;
    fs::write(&stories, patched)?;

    tracing::info!(
        stories = %stories.display(),
        report_story = %report_story.display(),
        "linked accessibility report into Storybook"
    );
    Ok(StoryLink::Linked {
        stories,
        report_story,
    })
}

/// Insert the report import after the last import statement
pub fn add_report_import(content: &str) -> String {
    match IMPORT_LINE.find_iter(content).last() {
        Some(last) => format!(
            "{}{}{}",
            &content[..last.end()],
            REPORT_IMPORT,
            &content[last.end()..]
        ),
        None => format!("{}{}", REPORT_IMPORT, content),
    }
}

/// Add an `a11yReport` entry to the first `parameters: {` object
pub fn add_report_parameter(content: &str) -> String {
    if content.contains("a11yReport:") {
        return content.to_string();
    }
    match PARAMETERS.find(content) {
        Some(m) => format!(
            "{}\n    a11yReport: {{\n      disable: false,\n      report: a11yReport\n    }},{}",
            &content[..m.end()],
            &content[m.end()..]
        ),
        None => content.to_string(),
    }
}

/// Story title with any trailing `/variant` segment removed
pub fn story_title(content: &str) -> String {
    TITLE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches("/variant").to_string())
        .unwrap_or_default()
}

/// Combined docs-view HTML for one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsDocument {
    pub stories: PathBuf,
    /// Page imported by the stories file; reports are written beside it
    pub page: PathBuf,
    pub html: String,
    /// Stories that were added as extra copies of the page
    pub variants: Vec<String>,
}

/// `<root>/{src/stories,stories}/<Component>/<component>.stories.js`, first match
pub fn find_component_stories(root: &Path, component: &str) -> Option<PathBuf> {
    let mut chars = component.chars();
    let dir_name = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return None,
    };
    let file_name = format!("{}.stories.js", component.to_lowercase());

    STORY_ROOTS
        .iter()
        .map(|base| root.join(base).join(&dir_name).join(&file_name))
        .find(|path| path.is_file())
}

/// Build the docs-view document for `component`
///
/// Every story other than `Default` adds a `<div id="<story>">` copy of the
/// page. A stories file with a single story yields the page unchanged.
pub fn docs_document(root: &Path, component: &str) -> Result<DocsDocument> {
    let stories = find_component_stories(root, component).ok_or_else(|| {
        AnalyzerError::Validation(format!("no stories file found for component '{}'", component))
    })?;
    let content = read(&stories)?;

    let import = HTML_IMPORT
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            AnalyzerError::parse(stories.display().to_string(), "no `import <name>Html from` statement")
        })?;
    let relative = import.as_str().replace("?raw", "");
    let page = stories
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(relative.trim_start_matches("./"));
    let base = read(&page)?;

    let names: Vec<&str> = STORY_EXPORT
        .captures_iter(&content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    let variants: Vec<String> = if names.len() > 1 {
        names
            .into_iter()
            .filter(|name| !SKIPPED_STORIES.contains(name))
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    let mut html = base.clone();
    for name in &variants {
        html.push_str(&format!(
            "\n<!-- {name} -->\n<div id=\"{id}\">{base}</div>",
            id = name.to_lowercase()
        ));
    }

    tracing::debug!(
        stories = %stories.display(),
        page = %page.display(),
        variants = variants.len(),
        "built docs document"
    );
    Ok(DocsDocument {
        stories,
        page,
        html,
        variants,
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| AnalyzerError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn report_story_source(title: &str) -> String {
    let full_title = if title.is_empty() {
        "Accessibility Report".to_string()
    } else {
        format!("{}/Accessibility Report", title)
    };
    format!(
        r#"{import}
export default {{
  title: '{title}',
  parameters: {{
    viewMode: 'docs',
    previewTabs: {{
      canvas: {{ hidden: true }}
    }},
    options: {{
      showPanel: false
    }}
  }}
}};

export const Report = {{
  name: 'Accessibility Report',
  render: () => {{
    const container = document.createElement('div');
    container.className = 'a11y-report';
    const pre = document.createElement('pre');
    pre.style.whiteSpace = 'pre-wrap';
    pre.textContent = a11yReport;
    container.appendChild(pre);
    return container;
  }}
}};
"#,
        import = REPORT_IMPORT,
        title = full_title,
    )
}
