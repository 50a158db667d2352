//! The page automation surface: the only seam between the engine and a
//! browser.
//!
//! Backends implement immediate operations only. A probe never waits and a
//! click is dispatched as-is; auto-waiting, stability checks and timeouts
//! live in [`ActionExecutor`](crate::ActionExecutor) and
//! [`AssertionEngine`](crate::AssertionEngine) so they behave identically
//! on every backend.

use crate::error::SurfaceError;
use crate::locator::Locator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounding box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Immediate snapshot of a locator against the current page.
///
/// `visible`, `bounds` and `text` describe the first match only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementProbe {
    /// How many elements matched.
    pub count: usize,
    /// Whether the first match is rendered and not hidden.
    pub visible: bool,
    /// Bounding box of the first match.
    pub bounds: Option<Rect>,
    /// Rendered text of the first match.
    pub text: Option<String>,
}

impl ElementProbe {
    /// Nothing matched.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// At least one element is attached to the document.
    #[must_use]
    pub fn attached(&self) -> bool {
        self.count > 0
    }
}

impl fmt::Display for ElementProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.count, self.visible) {
            (0, _) => f.write_str("not attached"),
            (1, true) => f.write_str("visible"),
            (1, false) => f.write_str("attached but hidden"),
            (n, true) => write!(f, "visible ({n} matches)"),
            (n, false) => write!(f, "attached but hidden ({n} matches)"),
        }
    }
}

/// A single page (tab) the engine can drive.
///
/// Implementations must be cheap to probe repeatedly: the engine calls
/// [`probe`](Self::probe) on every poll.
#[async_trait]
pub trait PageSurface: Send + Sync {
    /// Loads `url` and suspends until the document has loaded.
    async fn goto(&self, url: &str) -> Result<(), SurfaceError>;

    /// Resolves `locator` now and describes the result.
    async fn probe(&self, locator: &Locator) -> Result<ElementProbe, SurfaceError>;

    /// Dispatches a click on the first match, without waiting.
    async fn click(&self, locator: &Locator) -> Result<(), SurfaceError>;

    /// PNG screenshot of the viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, SurfaceError> {
        Err(SurfaceError::Unsupported("screenshot"))
    }

    /// Console errors the page has logged so far.
    fn console_errors(&self) -> Vec<String> {
        Vec::new()
    }

    /// Releases the page and everything it owns.
    async fn close(&self) -> Result<(), SurfaceError>;
}

/// Opens isolated pages, one per scenario run.
///
/// Pages from the same factory must not share state (cookies, storage), so
/// scenarios can run concurrently.
#[async_trait]
pub trait PageFactory: Send + Sync {
    /// Opens a fresh page.
    async fn open_page(&self) -> Result<Box<dyn PageSurface>, SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_display_describes_state() {
        assert_eq!(ElementProbe::absent().to_string(), "not attached");

        let hidden = ElementProbe {
            count: 1,
            ..ElementProbe::default()
        };
        assert_eq!(hidden.to_string(), "attached but hidden");

        let many = ElementProbe {
            count: 3,
            visible: true,
            ..ElementProbe::default()
        };
        assert_eq!(many.to_string(), "visible (3 matches)");
    }
}
