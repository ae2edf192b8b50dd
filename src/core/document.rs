//! Markup document wrapper for HTML parsing

use scraper::{ElementRef, Html};

use crate::error::{AnalyzerError, Result};

/// A parsed HTML document
///
/// Parsing goes through html5ever, which recovers from malformed markup the
/// same way browsers do, so building a document from text never fails.
pub struct MarkupDocument {
    html: Html,
    name: String,
}

impl MarkupDocument {
    /// Parse HTML text; `name` identifies the source in reports
    pub fn parse(source: &str, name: impl Into<String>) -> Self {
        Self {
            html: Html::parse_document(source),
            name: name.into(),
        }
    }

    /// Parse raw bytes, rejecting anything that is not UTF-8
    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = std::str::from_utf8(bytes)
            .map_err(|e| AnalyzerError::parse(name.clone(), e.to_string()))?;
        Ok(Self::parse(source, name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All elements in document order, starting with `<html>`
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    }

    /// Elements whose tag is one of `tags` (lowercase), in document order
    pub fn elements_named<'a>(&'a self, tags: &'a [&'a str]) -> impl Iterator<Item = ElementRef<'a>> {
        self.elements().filter(move |el| tags.contains(&el.value().name()))
    }

    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.elements().find(|el| el.value().id() == Some(id))
    }

    /// Whether a `<label for="id">` exists for the given id
    pub fn has_label_for(&self, id: &str) -> bool {
        self.elements_named(&["label"])
            .any(|label| label.value().attr("for") == Some(id))
    }
}

/// Helpers on parsed elements
pub trait ElementExt {
    fn tag(&self) -> &str;
    fn attr(&self, name: &str) -> Option<&str>;
    fn has_attr(&self, name: &str) -> bool;
    fn text_content(&self) -> String;
    fn outer_html(&self) -> String;
    /// Selector for reports: `tag#id` when the element has an id, otherwise
    /// `tag:nth-of-type(n)` among its siblings
    fn css_target(&self) -> String;
    /// Value of a property in the inline `style` attribute (lowercased)
    fn inline_style(&self, property: &str) -> Option<String>;
}

impl ElementExt for ElementRef<'_> {
    fn tag(&self) -> &str {
        self.value().name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn has_attr(&self, name: &str) -> bool {
        self.value().attr(name).is_some()
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }

    fn outer_html(&self) -> String {
        self.html()
    }

    fn css_target(&self) -> String {
        let tag = self.tag();
        if let Some(id) = self.value().id() {
            return format!("{}#{}", tag, id);
        }
        let position = self
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| sibling.value().name() == tag)
            .count()
            + 1;
        format!("{}:nth-of-type({})", tag, position)
    }

    fn inline_style(&self, property: &str) -> Option<String> {
        let style = self.value().attr("style")?;
        style.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            if name.trim().eq_ignore_ascii_case(property) {
                Some(value.trim().to_lowercase())
            } else {
                None
            }
        })
    }
}
