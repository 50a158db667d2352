//! In-memory page surface for tests.
//!
//! [`FakePage`] holds two kinds of content. Keyed elements are scripted
//! states registered under a locator's canonical rendering; they match only
//! that exact locator and suit tests of waiting and cleanup rules. Markup is
//! a tree of [`Node`]s that every locator resolves against, with the same
//! role, name, text and scoping rules as the Chrome backend. A keyed entry
//! wins over the tree for its own locator.
//!
//! Clicks and navigations trigger scripted mutations of either kind.
//! Navigation replaces the markup and leaves keyed elements in place.
//!
//! Timing uses `tokio::time`, so tests can run under a paused clock.
//!
//! ```ignore
//! let accept = Locator::role_named("button", "Accept all");
//! let page = FakePage::new()
//!     .with_node(Node::new("div").id("banner").child(Node::new("button").text("Accept all")))
//!     .on_click(&accept, Mutation::detach("banner"));
//! ```

mod dom;

pub use dom::Node;

use crate::error::SurfaceError;
use crate::locator::Locator;
use crate::surface::{ElementProbe, PageFactory, PageSurface, Rect};
use dom::Dom;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Scripted state of one locator.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeElement {
    pub count: usize,
    pub visible: bool,
    pub text: Option<String>,
    pub bounds: Option<Rect>,
    /// Bounds change on every probe, so the element never becomes stable.
    pub moving: bool,
    /// Becomes visible only this long after it was inserted.
    pub visible_after: Option<Duration>,
}

impl FakeElement {
    /// A single visible element with the given text.
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            count: 1,
            visible: true,
            text: Some(text.into()),
            bounds: Some(Rect::new(10.0, 10.0, 120.0, 24.0)),
            moving: false,
            visible_after: None,
        }
    }

    /// A single attached but hidden element.
    pub fn hidden(text: impl Into<String>) -> Self {
        Self {
            visible: false,
            bounds: None,
            ..Self::visible(text)
        }
    }

    #[must_use]
    pub fn moving(mut self) -> Self {
        self.moving = true;
        self
    }

    #[must_use]
    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.visible_after = Some(delay);
        self
    }
}

/// A change applied to the fake page when a trigger fires.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert or replace an element.
    Show(String, FakeElement),
    /// Detach an element.
    Remove(String),
    /// Append markup to the element with the given id, or to the body.
    Append { parent: Option<String>, node: Node },
    /// Detach the markup element with the given id.
    Detach(String),
}

impl Mutation {
    pub fn show(locator: &Locator, element: FakeElement) -> Self {
        Self::Show(locator.to_string(), element)
    }

    pub fn remove(locator: &Locator) -> Self {
        Self::Remove(locator.to_string())
    }

    pub fn append(node: Node) -> Self {
        Self::Append { parent: None, node }
    }

    pub fn append_to(parent: impl Into<String>, node: Node) -> Self {
        Self::Append {
            parent: Some(parent.into()),
            node,
        }
    }

    pub fn detach(id: impl Into<String>) -> Self {
        Self::Detach(id.into())
    }
}

#[derive(Debug)]
struct Entry {
    element: FakeElement,
    inserted: Instant,
    probes: u32,
}

#[derive(Debug, Default)]
struct State {
    url: Option<String>,
    visited: Vec<String>,
    elements: HashMap<String, Entry>,
    dom: Dom,
    on_click: HashMap<String, Vec<Mutation>>,
    on_goto: HashMap<String, Vec<Mutation>>,
    failing_urls: HashSet<String>,
    panicking_clicks: HashSet<String>,
    clicks: Vec<String>,
    probes: usize,
    console_errors: Vec<String>,
    closed: bool,
}

impl State {
    fn apply(&mut self, mutations: &[Mutation]) {
        for mutation in mutations {
            match mutation {
                Mutation::Show(key, element) => {
                    self.elements.insert(
                        key.clone(),
                        Entry {
                            element: element.clone(),
                            inserted: Instant::now(),
                            probes: 0,
                        },
                    );
                }
                Mutation::Remove(key) => {
                    self.elements.remove(key);
                }
                Mutation::Append { parent, node } => {
                    if !self.dom.append(parent.as_deref(), node) {
                        warn!(parent = ?parent, "append target is not in the page");
                    }
                }
                Mutation::Detach(id) => {
                    if !self.dom.detach(id) {
                        warn!(id = %id, "detach target is not in the page");
                    }
                }
            }
        }
    }
}

/// A scripted page. Clones share state, so a test can keep one clone for
/// inspection after handing another to the runner.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<State>>,
}

impl FakePage {
    /// An empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an element present from the start.
    #[must_use]
    pub fn with_element(self, locator: &Locator, element: FakeElement) -> Self {
        self.state()
            .apply(&[Mutation::show(locator, element)]);
        self
    }

    /// Appends markup to the body from the start.
    #[must_use]
    pub fn with_node(self, node: Node) -> Self {
        self.state().apply(&[Mutation::append(node)]);
        self
    }

    /// Applies `mutation` whenever `locator` is clicked.
    #[must_use]
    pub fn on_click(self, locator: &Locator, mutation: Mutation) -> Self {
        self.state()
            .on_click
            .entry(locator.to_string())
            .or_default()
            .push(mutation);
        self
    }

    /// Applies `mutation` whenever `url` finishes loading, after the markup
    /// of the previous document is gone.
    #[must_use]
    pub fn on_goto(self, url: &str, mutation: Mutation) -> Self {
        self.state()
            .on_goto
            .entry(url.to_string())
            .or_default()
            .push(mutation);
        self
    }

    /// Navigation to `url` fails.
    #[must_use]
    pub fn failing_navigation(self, url: &str) -> Self {
        self.state().failing_urls.insert(url.to_string());
        self
    }

    /// Clicking `locator` panics, simulating a bug in step execution.
    #[must_use]
    pub fn panicking_on_click(self, locator: &Locator) -> Self {
        self.state().panicking_clicks.insert(locator.to_string());
        self
    }

    /// Records a console error.
    #[must_use]
    pub fn with_console_error(self, message: impl Into<String>) -> Self {
        self.state().console_errors.push(message.into());
        self
    }

    /// Applies a mutation right now, as if the page changed on its own.
    pub fn mutate(&self, mutation: Mutation) {
        self.state().apply(&[mutation]);
    }

    /// Locators clicked so far, in order.
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.state().clicks.clone()
    }

    /// URLs loaded so far, in order.
    #[must_use]
    pub fn visited(&self) -> Vec<String> {
        self.state().visited.clone()
    }

    /// The current URL.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.state().url.clone()
    }

    /// Number of probes served.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.state().probes
    }

    /// Whether `close` was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

#[async_trait]
impl PageSurface for FakePage {
    async fn goto(&self, url: &str) -> Result<(), SurfaceError> {
        let mut state = self.state();
        if state.closed {
            return Err(SurfaceError::Closed);
        }
        if state.failing_urls.contains(url) {
            return Err(SurfaceError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        state.url = Some(url.to_string());
        state.visited.push(url.to_string());
        state.dom = Dom::new();
        let mutations = state.on_goto.get(url).cloned().unwrap_or_default();
        state.apply(&mutations);
        Ok(())
    }

    async fn probe(&self, locator: &Locator) -> Result<ElementProbe, SurfaceError> {
        let mut state = self.state();
        if state.closed {
            return Err(SurfaceError::Closed);
        }
        state.probes += 1;

        let key = locator.to_string();
        if !state.elements.contains_key(&key) {
            return state.dom.probe(locator.segments());
        }
        let Some(entry) = state.elements.get_mut(&key) else {
            return Ok(ElementProbe::absent());
        };
        entry.probes += 1;

        let element = &entry.element;
        let shown = element.visible
            && element
                .visible_after
                .is_none_or(|delay| entry.inserted.elapsed() >= delay);
        let bounds = if element.moving {
            Some(Rect::new(f64::from(entry.probes), 0.0, 120.0, 24.0))
        } else if shown {
            element.bounds
        } else {
            None
        };

        Ok(ElementProbe {
            count: element.count,
            visible: shown && element.count > 0,
            bounds,
            text: (element.count > 0).then(|| element.text.clone()).flatten(),
        })
    }

    async fn click(&self, locator: &Locator) -> Result<(), SurfaceError> {
        let key = locator.to_string();
        let mut state = self.state();
        if state.closed {
            return Err(SurfaceError::Closed);
        }
        let present = match state.elements.get(&key) {
            Some(entry) => entry.element.count > 0,
            None => !state.dom.resolve(locator.segments())?.is_empty(),
        };
        if !present {
            return Err(SurfaceError::NotFound(key));
        }
        if state.panicking_clicks.contains(&key) {
            drop(state);
            panic!("scripted panic while clicking {key}");
        }
        state.clicks.push(key.clone());
        let mutations = state.on_click.get(&key).cloned().unwrap_or_default();
        state.apply(&mutations);
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SurfaceError> {
        if self.state().closed {
            return Err(SurfaceError::Closed);
        }
        // PNG signature only; enough for artifact plumbing.
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    fn console_errors(&self) -> Vec<String> {
        self.state().console_errors.clone()
    }

    async fn close(&self) -> Result<(), SurfaceError> {
        self.state().closed = true;
        Ok(())
    }
}

/// Page factory handing out fresh fake pages.
pub struct FakeFactory {
    template: Box<dyn Fn() -> FakePage + Send + Sync>,
    opened: Mutex<Vec<FakePage>>,
    fail_open: bool,
}

impl FakeFactory {
    /// Builds a new page from `template` for every scenario run.
    pub fn new(template: impl Fn() -> FakePage + Send + Sync + 'static) -> Self {
        Self {
            template: Box::new(template),
            opened: Mutex::new(Vec::new()),
            fail_open: false,
        }
    }

    /// A factory whose pages can never be opened.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(FakePage::new)
        }
    }

    /// Every page opened so far.
    #[must_use]
    pub fn opened(&self) -> Vec<FakePage> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True when every opened page has been closed.
    #[must_use]
    pub fn all_closed(&self) -> bool {
        self.opened().iter().all(FakePage::is_closed)
    }
}

#[async_trait]
impl PageFactory for FakeFactory {
    async fn open_page(&self) -> Result<Box<dyn PageSurface>, SurfaceError> {
        if self.fail_open {
            return Err(SurfaceError::Backend("browser is not available".to_string()));
        }
        let page = (self.template)();
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(page.clone());
        Ok(Box::new(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn probe_reflects_scripted_state() {
        let banner = Locator::role_named("button", "Accept all");
        let page = FakePage::new().with_element(&banner, FakeElement::visible("Accept all"));

        let probe = page.probe(&banner).await.unwrap();
        assert_eq!(probe.count, 1);
        assert!(probe.visible);
        assert_eq!(probe.text.as_deref(), Some("Accept all"));

        let missing = page.probe(&Locator::css("#nope")).await.unwrap();
        assert_eq!(missing, ElementProbe::absent());
    }

    #[tokio::test(start_paused = true)]
    async fn click_applies_mutations() {
        let banner = Locator::role_named("button", "Accept all");
        let page = FakePage::new()
            .with_element(&banner, FakeElement::visible("Accept all"))
            .on_click(&banner, Mutation::remove(&banner));

        page.click(&banner).await.unwrap();
        assert_eq!(page.clicks(), vec![banner.to_string()]);
        assert!(!page.probe(&banner).await.unwrap().attached());

        let err = page.click(&banner).await.unwrap_err();
        assert!(matches!(err, SurfaceError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_elements_appear_with_time() {
        let cart = Locator::css("#cart");
        let page = FakePage::new().with_element(
            &cart,
            FakeElement::visible("Cart").appearing_after(Duration::from_millis(300)),
        );

        assert!(!page.probe(&cart).await.unwrap().visible);
        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(page.probe(&cart).await.unwrap().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn markup_resolves_any_locator_shape() {
        let page = FakePage::new()
            .with_node(Node::new("div").id("banner").child(Node::new("button").text("Accept all")))
            .on_click(&Locator::role_named("button", "accept"), Mutation::detach("banner"));

        let accept = Locator::css("#banner").locator(Locator::text("Accept all"));
        let probe = page.probe(&accept).await.unwrap();
        assert_eq!(probe.count, 1);
        assert!(probe.visible);
        assert_eq!(probe.text.as_deref(), Some("Accept all"));

        page.click(&Locator::role_named("button", "accept")).await.unwrap();
        assert!(!page.probe(&accept).await.unwrap().attached());
        assert!(matches!(
            page.click(&accept).await,
            Err(SurfaceError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_replaces_markup_but_keeps_keyed_elements() {
        let home = "http://shop.test/";
        let product = "http://shop.test/mug";
        let keyed = Locator::css("#keyed");
        let heading = Locator::role_named("heading", "Ceramic Modern Coffee Mug");
        let page = FakePage::new()
            .with_element(&keyed, FakeElement::visible("kept"))
            .with_node(Node::new("p").text("Before navigation"))
            .on_goto(
                product,
                Mutation::append(Node::new("h1").text("Ceramic Modern Coffee Mug")),
            );

        page.goto(home).await.unwrap();
        assert!(!page.probe(&Locator::text("Before navigation")).await.unwrap().attached());
        assert!(!page.probe(&heading).await.unwrap().attached());

        page.goto(product).await.unwrap();
        assert!(page.probe(&heading).await.unwrap().visible);
        assert!(page.probe(&keyed).await.unwrap().visible);
        assert_eq!(page.visited(), vec![home.to_string(), product.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_page_rejects_operations() {
        let page = FakePage::new();
        page.close().await.unwrap();
        assert!(page.is_closed());
        assert_eq!(page.goto("http://shop.test/").await, Err(SurfaceError::Closed));
        assert_eq!(page.probe(&Locator::css("a")).await, Err(SurfaceError::Closed));
    }
}
