//! Declarative element queries.
//!
//! A [`Locator`] describes *how to find* elements, never *which* elements:
//! page state is mutable and externally driven, so every operation resolves
//! the description again. Locators are a chain of [`Segment`]s; each segment
//! is resolved inside the matches of the previous one, then narrowed by its
//! optional `hasText` filter and `nth` index.
//!
//! ```ignore
//! // page.getByText("Ceramic Modern Coffee Mug")
//! //     .getByRole("row", { name: "Print run" })
//! //     .locator("td").nth(1)
//! let print_run = Locator::text("Ceramic Modern Coffee Mug")
//!     .locator(Locator::role_named("row", "Print run"))
//!     .locator(Locator::css("td"))
//!     .nth(1);
//! assert_eq!(
//!     print_run.to_string(),
//!     r#"text="Ceramic Modern Coffee Mug" >> role=row[name="Print run"] >> css=td >> nth=1"#
//! );
//! ```

use crate::error::SurfaceError;
use crate::surface::{ElementProbe, PageSurface};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a single segment selects candidate elements.
///
/// Deserializes from the keys present in the segment table:
/// `{ role = "link", name = "Red" }`, `{ text = "..." }`, `{ css = "td" }`
/// or `{ testId = "cart" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    /// ARIA role with an optional accessible name.
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        exact: bool,
    },
    /// Innermost elements whose rendered text matches.
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "is_false")]
        exact: bool,
    },
    /// Plain CSS selector.
    Css { css: String },
    /// `data-testid` attribute.
    TestId {
        #[serde(rename = "testId")]
        test_id: String,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// One link of a locator chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(flatten)]
    pub selector: Selector,

    /// Keep only matches whose text contains this substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,

    /// Pick a single match; negative values count from the end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<i32>,
}

impl Segment {
    /// Creates an unfiltered segment.
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            has_text: None,
            nth: None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Selector::Role { role, name, exact } => {
                write!(f, "role={role}")?;
                if let Some(name) = name {
                    write!(f, "[name={name:?}]")?;
                }
                if *exact {
                    f.write_str("[exact]")?;
                }
            }
            Selector::Text { text, exact } => {
                write!(f, "text={text:?}")?;
                if *exact {
                    f.write_str("[exact]")?;
                }
            }
            Selector::Css { css } => write!(f, "css={css}")?,
            Selector::TestId { test_id } => write!(f, "test-id={test_id:?}")?,
        }
        if let Some(text) = &self.has_text {
            write!(f, " >> has-text={text:?}")?;
        }
        if let Some(nth) = self.nth {
            write!(f, " >> nth={nth}")?;
        }
        Ok(())
    }
}

/// A chain of segments describing target elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LocatorRepr", into = "Vec<Segment>")]
pub struct Locator {
    segments: Vec<Segment>,
}

/// Scenario files may give a single segment table or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum LocatorRepr {
    One(Segment),
    Chain(Vec<Segment>),
}

impl From<LocatorRepr> for Locator {
    fn from(repr: LocatorRepr) -> Self {
        match repr {
            LocatorRepr::One(segment) => Self {
                segments: vec![segment],
            },
            LocatorRepr::Chain(segments) => Self { segments },
        }
    }
}

impl From<Locator> for Vec<Segment> {
    fn from(locator: Locator) -> Self {
        locator.segments
    }
}

impl Locator {
    /// Creates a single-segment locator.
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            segments: vec![Segment::new(selector)],
        }
    }

    /// Elements with the given ARIA role.
    pub fn role(role: impl Into<String>) -> Self {
        Self::new(Selector::Role {
            role: role.into(),
            name: None,
            exact: false,
        })
    }

    /// Elements with the given ARIA role and accessible name.
    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Selector::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        })
    }

    /// Innermost elements whose text matches.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Selector::Text {
            text: text.into(),
            exact: false,
        })
    }

    /// Elements matching a CSS selector.
    pub fn css(css: impl Into<String>) -> Self {
        Self::new(Selector::Css { css: css.into() })
    }

    /// Elements with a `data-testid` attribute.
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::new(Selector::TestId { test_id: id.into() })
    }

    /// Requires exact, case-sensitive name or text matching on the last
    /// segment.
    #[must_use]
    pub fn exact(mut self) -> Self {
        if let Some(last) = self.segments.last_mut() {
            match &mut last.selector {
                Selector::Role { exact, .. } | Selector::Text { exact, .. } => *exact = true,
                Selector::Css { .. } | Selector::TestId { .. } => {}
            }
        }
        self
    }

    /// Keeps matches of the last segment whose text contains `text`.
    #[must_use]
    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.has_text = Some(text.into());
        }
        self
    }

    /// Picks the `index`-th match of the last segment.
    #[must_use]
    pub fn nth(mut self, index: i32) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.nth = Some(index);
        }
        self
    }

    /// Picks the first match.
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Picks the last match.
    #[must_use]
    pub fn last(self) -> Self {
        self.nth(-1)
    }

    /// Resolves `child` inside the matches of this locator.
    #[must_use]
    pub fn locator(mut self, child: Locator) -> Self {
        self.segments.extend(child.segments);
        self
    }

    /// The segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Mutable access to the segments, for parameter binding.
    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    /// True when the locator has no segments and can never match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Collapses whitespace runs into single spaces and trims the ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Name and text matching used by `role` and `text` selectors.
///
/// Non-exact matching is case-insensitive substring; exact matching is
/// case-sensitive equality. Both sides are whitespace-normalized.
#[must_use]
pub fn text_matches(actual: &str, expected: &str, exact: bool) -> bool {
    let actual = normalize_whitespace(actual);
    let expected = normalize_whitespace(expected);
    if exact {
        actual == expected
    } else {
        actual.to_lowercase().contains(&expected.to_lowercase())
    }
}

/// Substring containment used by text assertions: whitespace-normalized,
/// case-sensitive.
#[must_use]
pub fn contains_text(actual: &str, expected: &str) -> bool {
    normalize_whitespace(actual).contains(&normalize_whitespace(expected))
}

/// A lazy handle: a locator bound to a page, resolved on every operation.
#[derive(Clone)]
pub struct LocatorHandle<'p> {
    page: &'p dyn PageSurface,
    locator: Locator,
}

impl<'p> LocatorHandle<'p> {
    /// Binds a locator to a page. Nothing is resolved yet.
    #[must_use]
    pub fn new(page: &'p dyn PageSurface, locator: Locator) -> Self {
        Self { page, locator }
    }

    /// The underlying description.
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Narrows the handle to `child` inside the current matches.
    #[must_use]
    pub fn locate(&self, child: Locator) -> LocatorHandle<'p> {
        LocatorHandle::new(self.page, self.locator.clone().locator(child))
    }

    /// Resolves now and returns an immediate snapshot.
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub async fn probe(&self) -> Result<ElementProbe, SurfaceError> {
        self.page.probe(&self.locator).await
    }

    /// Immediate visibility check of the first match. Never waits; a backend
    /// error counts as not visible.
    pub async fn is_visible(&self) -> bool {
        matches!(self.probe().await, Ok(probe) if probe.visible)
    }

    /// Rendered text of the first match, if any element matches.
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub async fn text(&self) -> Result<Option<String>, SurfaceError> {
        Ok(self.probe().await?.text)
    }

    /// Number of elements currently matching.
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub async fn count(&self) -> Result<usize, SurfaceError> {
        Ok(self.probe().await?.count)
    }
}

impl fmt::Debug for LocatorHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatorHandle")
            .field("locator", &self.locator.to_string())
            .finish_non_exhaustive()
    }
}
