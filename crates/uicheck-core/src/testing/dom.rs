//! A small element tree for the in-memory page.
//!
//! Locators resolve with the same rules as the in-page resolver of the
//! Chrome backend: explicit or implicit ARIA roles, accessible names,
//! innermost text matches, `hasText` filters and `nth` picks, each segment
//! scoped to the matches of the previous one. Names and text go through
//! [`text_matches`]. CSS covers tag, `#id`, `.class`, `[attr]` and
//! `[attr=value]` compounds joined by descendant combinators.

use crate::error::SurfaceError;
use crate::locator::{Segment, Selector, normalize_whitespace, text_matches};
use crate::surface::{ElementProbe, Rect};
use std::time::Duration;
use tokio::time::Instant;

/// Tags whose content never counts as rendered text.
const SKIPPED: [&str; 6] = ["script", "style", "noscript", "template", "head", "title"];

/// Index of `<body>`.
const ROOT: usize = 0;

/// An element and its subtree, ready to be inserted into a page.
///
/// ```ignore
/// let entry = Node::new("div")
///     .attr("class", "cart-item")
///     .child(Node::new("h3").text("Ceramic Modern Coffee Mug"))
///     .child(Node::new("table").child(
///         Node::new("tr")
///             .child(Node::new("td").text("Print run"))
///             .child(Node::new("td").text("100")),
///     ));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Child>,
    hidden: bool,
    visible_after: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
enum Child {
    Text(String),
    Element(Node),
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
            hidden: false,
            visible_after: None,
        }
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.attrs.iter_mut().find(|attr| attr.0 == name) {
            existing.1 = value;
        } else {
            self.attrs.push((name, value));
        }
        self
    }

    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Appends a text node.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    #[must_use]
    pub fn child(mut self, node: Node) -> Self {
        self.children.push(Child::Element(node));
        self
    }

    /// Not rendered, like `display: none`. Hides the whole subtree.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// The subtree becomes visible only this long after insertion.
    #[must_use]
    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.visible_after = Some(delay);
        self
    }
}

#[derive(Debug)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    content: Vec<Content>,
    parent: Option<usize>,
    hidden: bool,
    visible_after: Option<Duration>,
    inserted: Instant,
}

#[derive(Debug)]
enum Content {
    Text(String),
    Element(usize),
}

/// The document of a fake page. Elements live in an arena; detaching one
/// unlinks it from its parent, which disconnects the whole subtree.
#[derive(Debug)]
pub(crate) struct Dom {
    elements: Vec<Element>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty `<body>`.
    pub(crate) fn new() -> Self {
        Self {
            elements: vec![Element {
                tag: "body".to_string(),
                attrs: Vec::new(),
                content: Vec::new(),
                parent: None,
                hidden: false,
                visible_after: None,
                inserted: Instant::now(),
            }],
        }
    }

    /// Appends `node` to the connected element with id `parent`, or to the
    /// body. Returns false when the parent does not exist.
    pub(crate) fn append(&mut self, parent: Option<&str>, node: &Node) -> bool {
        let parent = match parent {
            Some(id) => match self.find_by_id(id) {
                Some(index) => index,
                None => return false,
            },
            None => ROOT,
        };
        let index = self.insert(node, parent, Instant::now());
        self.elements[parent].content.push(Content::Element(index));
        true
    }

    fn insert(&mut self, node: &Node, parent: usize, now: Instant) -> usize {
        let index = self.elements.len();
        self.elements.push(Element {
            tag: node.tag.clone(),
            attrs: node.attrs.clone(),
            content: Vec::new(),
            parent: Some(parent),
            hidden: node.hidden,
            visible_after: node.visible_after,
            inserted: now,
        });
        for child in &node.children {
            let content = match child {
                Child::Text(text) => Content::Text(text.clone()),
                Child::Element(child) => Content::Element(self.insert(child, index, now)),
            };
            self.elements[index].content.push(content);
        }
        index
    }

    /// Detaches the connected element with id `id`. Returns false when there
    /// is none.
    pub(crate) fn detach(&mut self, id: &str) -> bool {
        let Some(index) = self.find_by_id(id) else {
            return false;
        };
        if let Some(parent) = self.elements[index].parent.take() {
            self.elements[parent]
                .content
                .retain(|content| !matches!(content, Content::Element(child) if *child == index));
        }
        true
    }

    /// Immediate snapshot of `segments`, shaped like the Chrome backend's.
    pub(crate) fn probe(&self, segments: &[Segment]) -> Result<ElementProbe, SurfaceError> {
        let matches = self.resolve(segments)?;
        let Some(&first) = matches.first() else {
            return Ok(ElementProbe::absent());
        };
        let visible = self.is_visible(first);
        Ok(ElementProbe {
            count: matches.len(),
            visible,
            bounds: visible.then(|| bounds(first)),
            text: Some(self.text_of(first)),
        })
    }

    /// All matches of `segments`, in document order per scope.
    pub(crate) fn resolve(&self, segments: &[Segment]) -> Result<Vec<usize>, SurfaceError> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let mut current = vec![ROOT];
        for segment in segments {
            let mut next: Vec<usize> = Vec::new();
            for &root in &current {
                for el in self.select(root, &segment.selector)? {
                    if !next.contains(&el) {
                        next.push(el);
                    }
                }
            }

            if let Some(text) = &segment.has_text {
                next.retain(|&el| text_matches(&self.text_of(el), text, false));
            }
            if let Some(nth) = segment.nth {
                next = pick(&next, nth);
            }
            current = next;
        }
        Ok(current)
    }

    fn select(&self, root: usize, selector: &Selector) -> Result<Vec<usize>, SurfaceError> {
        let candidates = self.descendants(root);
        let matches = match selector {
            Selector::Css { css } => {
                let compounds = parse_css(css)
                    .ok_or_else(|| SurfaceError::Script(format!("unsupported selector: {css}")))?;
                candidates
                    .into_iter()
                    .filter(|&el| self.matches_css(el, &compounds))
                    .collect()
            }
            Selector::TestId { test_id } => candidates
                .into_iter()
                .filter(|&el| self.attr(el, "data-testid") == Some(test_id.as_str()))
                .collect(),
            Selector::Role { role, name, exact } => {
                let wanted = role.to_ascii_lowercase();
                candidates
                    .into_iter()
                    .filter(|&el| {
                        self.role_of(el).as_deref() == Some(wanted.as_str())
                            && name.as_ref().is_none_or(|name| {
                                text_matches(&self.accessible_name(el), name, *exact)
                            })
                    })
                    .collect()
            }
            Selector::Text { text, exact } => {
                let hits: Vec<usize> = candidates
                    .into_iter()
                    .filter(|&el| {
                        !SKIPPED.contains(&self.elements[el].tag.as_str())
                            && text_matches(&self.text_of(el), text, *exact)
                    })
                    .collect();
                // Innermost matches only.
                hits.iter()
                    .copied()
                    .filter(|&el| !hits.iter().any(|&other| other != el && self.contains(el, other)))
                    .collect()
            }
        };
        Ok(matches)
    }

    fn descendants(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_descendants(root, &mut out);
        out
    }

    fn collect_descendants(&self, el: usize, out: &mut Vec<usize>) {
        for content in &self.elements[el].content {
            if let Content::Element(child) = content {
                out.push(*child);
                self.collect_descendants(*child, out);
            }
        }
    }

    fn find_by_id(&self, id: &str) -> Option<usize> {
        std::iter::once(ROOT)
            .chain(self.descendants(ROOT))
            .find(|&el| self.attr(el, "id") == Some(id))
    }

    fn attr(&self, el: usize, name: &str) -> Option<&str> {
        self.elements[el]
            .attrs
            .iter()
            .find(|attr| attr.0 == name)
            .map(|attr| attr.1.as_str())
    }

    /// Whether `el` is a strict descendant of `ancestor`.
    fn contains(&self, ancestor: usize, mut el: usize) -> bool {
        while let Some(parent) = self.elements[el].parent {
            if parent == ancestor {
                return true;
            }
            el = parent;
        }
        false
    }

    fn text_of(&self, el: usize) -> String {
        let parts: Vec<String> = self.elements[el]
            .content
            .iter()
            .map(|content| match content {
                Content::Text(text) => text.clone(),
                Content::Element(child) => self.text_of(*child),
            })
            .collect();
        normalize_whitespace(&parts.join(" "))
    }

    fn is_visible(&self, el: usize) -> bool {
        let mut cursor = Some(el);
        while let Some(index) = cursor {
            let element = &self.elements[index];
            if element.hidden {
                return false;
            }
            if element
                .visible_after
                .is_some_and(|delay| element.inserted.elapsed() < delay)
            {
                return false;
            }
            if index == ROOT {
                return true;
            }
            cursor = element.parent;
        }
        // Detached
        false
    }

    fn role_of(&self, el: usize) -> Option<String> {
        if let Some(role) = self
            .attr(el, "role")
            .and_then(|role| role.split_whitespace().next())
        {
            return Some(role.to_ascii_lowercase());
        }

        let role = match self.elements[el].tag.as_str() {
            "a" | "area" => self.attr(el, "href").map(|_| "link")?,
            "button" => "button",
            "input" => {
                let kind = self.attr(el, "type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "button" | "submit" | "reset" | "image" => "button",
                    "checkbox" => "checkbox",
                    "radio" => "radio",
                    "range" => "slider",
                    "number" => "spinbutton",
                    "search" => "searchbox",
                    "text" | "email" | "tel" | "url" => "textbox",
                    _ => return None,
                }
            }
            "select" => "combobox",
            "textarea" => "textbox",
            "option" => "option",
            "img" => {
                if self.attr(el, "alt") == Some("") {
                    "presentation"
                } else {
                    "img"
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
            "ul" | "ol" => "list",
            "li" => "listitem",
            "nav" => "navigation",
            "main" => "main",
            "header" => "banner",
            "footer" => "contentinfo",
            "aside" => "complementary",
            "form" => "form",
            "dialog" => "dialog",
            "table" => "table",
            "thead" | "tbody" | "tfoot" => "rowgroup",
            "tr" => "row",
            "td" => "cell",
            "th" => {
                if self.attr(el, "scope") == Some("row") {
                    "rowheader"
                } else {
                    "columnheader"
                }
            }
            "article" => "article",
            "section" => {
                if self.attr(el, "aria-label").is_some()
                    || self.attr(el, "aria-labelledby").is_some()
                {
                    "region"
                } else {
                    return None;
                }
            }
            "p" => "paragraph",
            "hr" => "separator",
            _ => return None,
        };
        Some(role.to_string())
    }

    fn accessible_name(&self, el: usize) -> String {
        if let Some(ids) = self.attr(el, "aria-labelledby") {
            let text: Vec<String> = ids
                .split_whitespace()
                .filter_map(|id| self.find_by_id(id))
                .map(|label| self.text_of(label))
                .collect();
            let text = normalize_whitespace(&text.join(" "));
            if !text.is_empty() {
                return text;
            }
        }

        let label = normalize_whitespace(self.attr(el, "aria-label").unwrap_or_default());
        if !label.is_empty() {
            return label;
        }

        let labels: Vec<String> = self
            .labels(el)
            .into_iter()
            .map(|label| self.text_of(label))
            .collect();
        let labelled = normalize_whitespace(&labels.join(" "));
        if !labelled.is_empty() {
            return labelled;
        }

        let tag = self.elements[el].tag.as_str();
        let kind = self.attr(el, "type").unwrap_or_default().to_ascii_lowercase();
        if tag == "img" || (tag == "input" && kind == "image") {
            let alt = normalize_whitespace(self.attr(el, "alt").unwrap_or_default());
            if !alt.is_empty() {
                return alt;
            }
        }
        if tag == "input" && matches!(kind.as_str(), "button" | "submit" | "reset") {
            let value = normalize_whitespace(self.attr(el, "value").unwrap_or_default());
            if !value.is_empty() {
                return value;
            }
        }

        let content = self.text_of(el);
        if !content.is_empty() {
            return content;
        }
        normalize_whitespace(self.attr(el, "title").unwrap_or_default())
    }

    /// `<label for=id>` elements and wrapping labels of a form control.
    fn labels(&self, el: usize) -> Vec<usize> {
        if !matches!(
            self.elements[el].tag.as_str(),
            "input" | "select" | "textarea" | "button"
        ) {
            return Vec::new();
        }

        let mut labels: Vec<usize> = match self.attr(el, "id") {
            Some(id) => self
                .descendants(ROOT)
                .into_iter()
                .filter(|&label| {
                    self.elements[label].tag == "label" && self.attr(label, "for") == Some(id)
                })
                .collect(),
            None => Vec::new(),
        };

        let mut cursor = self.elements[el].parent;
        while let Some(parent) = cursor {
            if self.elements[parent].tag == "label" && !labels.contains(&parent) {
                labels.push(parent);
            }
            cursor = self.elements[parent].parent;
        }
        labels
    }

    fn matches_css(&self, el: usize, compounds: &[Compound]) -> bool {
        let Some((last, ancestors)) = compounds.split_last() else {
            return false;
        };
        if !self.matches_compound(el, last) {
            return false;
        }

        let mut wanted = ancestors.iter().rev().peekable();
        let mut cursor = self.elements[el].parent;
        while let Some(compound) = wanted.peek() {
            let Some(index) = cursor else {
                return false;
            };
            if self.matches_compound(index, compound) {
                wanted.next();
            }
            cursor = self.elements[index].parent;
        }
        true
    }

    fn matches_compound(&self, el: usize, compound: &Compound) -> bool {
        let element = &self.elements[el];
        compound.tag.as_ref().is_none_or(|tag| *tag == element.tag)
            && compound
                .id
                .as_deref()
                .is_none_or(|id| self.attr(el, "id") == Some(id))
            && compound.classes.iter().all(|class| {
                self.attr(el, "class")
                    .is_some_and(|list| list.split_whitespace().any(|c| c == class.as_str()))
            })
            && compound
                .attrs
                .iter()
                .all(|(name, value)| match (self.attr(el, name), value) {
                    (Some(actual), Some(expected)) => actual == expected.as_str(),
                    (Some(_), None) => true,
                    (None, _) => false,
                })
    }
}

/// Layout stand-in: one fixed row per element, so bounds never move.
#[allow(clippy::cast_precision_loss)]
fn bounds(el: usize) -> Rect {
    Rect::new(8.0, 24.0 * el as f64, 320.0, 24.0)
}

fn pick(matches: &[usize], nth: i32) -> Vec<usize> {
    let index = if nth < 0 {
        matches.len().checked_sub(nth.unsigned_abs() as usize)
    } else {
        usize::try_from(nth).ok()
    };
    index
        .and_then(|i| matches.get(i).copied())
        .into_iter()
        .collect()
}

#[derive(Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

fn parse_css(css: &str) -> Option<Vec<Compound>> {
    if css.contains([',', '>', '+', '~', ':']) {
        return None;
    }
    let compounds = css
        .split_whitespace()
        .map(parse_compound)
        .collect::<Option<Vec<_>>>()?;
    (!compounds.is_empty()).then_some(compounds)
}

fn parse_compound(text: &str) -> Option<Compound> {
    let is_delimiter = |c: char| matches!(c, '#' | '.' | '[');
    let mut compound = Compound::default();

    let tag_end = text.find(is_delimiter).unwrap_or(text.len());
    let tag = &text[..tag_end];
    if !tag.is_empty() && tag != "*" {
        if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        compound.tag = Some(tag.to_ascii_lowercase());
    }

    let mut rest = &text[tag_end..];
    while let Some(first) = rest.chars().next() {
        rest = &rest[first.len_utf8()..];
        match first {
            '#' | '.' => {
                let end = rest.find(is_delimiter).unwrap_or(rest.len());
                let name = &rest[..end];
                if name.is_empty() {
                    return None;
                }
                if first == '#' {
                    compound.id = Some(name.to_string());
                } else {
                    compound.classes.push(name.to_string());
                }
                rest = &rest[end..];
            }
            '[' => {
                let end = rest.find(']')?;
                let inner = &rest[..end];
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => (
                        name.trim(),
                        Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string()),
                    ),
                    None => (inner.trim(), None),
                };
                if name.is_empty() {
                    return None;
                }
                compound.attrs.push((name.to_string(), value));
                rest = &rest[end + 1..];
            }
            _ => return None,
        }
    }
    Some(compound)
}
