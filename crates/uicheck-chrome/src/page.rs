//! A Chrome tab as a [`PageSurface`].
//!
//! Every operation here is immediate except `goto`, which suspends until
//! the document is loaded. Waiting for elements is the engine's job.

use crate::console::{ConsoleCapture, parse_console_event, parse_exception_event};
use crate::error::{BrowserError, Result};
use crate::resolver;
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::DisposeBrowserContextParams;
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, EventExceptionThrown};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uicheck_core::{ElementProbe, Locator, PageSurface, SurfaceError, WaitConfig, poll_until};

/// One browser tab in its own browser context.
pub struct ChromePage {
    inner: Page,
    console: ConsoleCapture,
    context: Option<BrowserContextId>,
    browser: Arc<Mutex<Option<Browser>>>,
    load_timeout: Duration,
    closed: AtomicBool,
    listeners: Vec<JoinHandle<()>>,
}

impl ChromePage {
    /// Wraps a page and starts console capture.
    pub(crate) fn new(
        page: Page,
        context: Option<BrowserContextId>,
        browser: Arc<Mutex<Option<Browser>>>,
        load_timeout: Duration,
    ) -> Self {
        let console = ConsoleCapture::new();

        let console_page = page.clone();
        let console_sink = console.clone();
        let console_task = tokio::spawn(async move {
            if let Ok(mut events) = console_page
                .event_listener::<EventConsoleApiCalled>()
                .await
            {
                while let Some(event) = events.next().await {
                    console_sink.push(parse_console_event(&event));
                }
            }
        });

        let exception_page = page.clone();
        let exception_sink = console.clone();
        let exception_task = tokio::spawn(async move {
            if let Ok(mut events) = exception_page
                .event_listener::<EventExceptionThrown>()
                .await
            {
                while let Some(event) = events.next().await {
                    exception_sink.push(parse_exception_event(&event));
                }
            }
        });

        Self {
            inner: page,
            console,
            context,
            browser,
            load_timeout,
            closed: AtomicBool::new(false),
            listeners: vec![console_task, exception_task],
        }
    }

    /// Everything the page logged so far.
    #[must_use]
    pub fn console(&self) -> &ConsoleCapture {
        &self.console
    }

    /// Executes JavaScript in the page and deserializes the result.
    ///
    /// # Errors
    ///
    /// Returns an error if script execution fails or the result cannot be
    /// deserialized.
    pub async fn evaluate<T>(&self, script: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.ensure_open()?;
        self.inner
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptExecutionFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::ScriptExecutionFailed(e.to_string()))
    }

    /// Navigates and waits for `document.readyState == "complete"`.
    ///
    /// # Errors
    ///
    /// Returns `NavigationFailed` or `LoadTimeout`.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        self.inner
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.wait_for_load(url).await
    }

    async fn wait_for_load(&self, url: &str) -> Result<()> {
        poll_until(
            WaitConfig::with_timeout(self.load_timeout),
            || self.evaluate::<String>("document.readyState"),
            |state| matches!(state, Ok(s) if s == "complete").then_some(()),
        )
        .await
        .map_err(|_| BrowserError::LoadTimeout {
            url: url.to_string(),
            timeout: self.load_timeout,
        })
    }

    /// Resolves `locator` in the page, optionally marking the first match.
    async fn resolve(&self, locator: &Locator, mark: Option<&str>) -> Result<ElementProbe> {
        let raw: String = self.evaluate(&resolver::script(locator, mark)?).await?;
        resolver::parse_probe(&raw)
    }

    async fn dispatch_click(&self, locator: &Locator) -> Result<()> {
        let mark = uuid::Uuid::new_v4().to_string();
        let probe = self.resolve(locator, Some(&mark)).await?;
        if !probe.attached() {
            return Err(BrowserError::ScriptExecutionFailed(format!(
                "no element matches `{locator}`"
            )));
        }

        let clicked = async {
            let element = self
                .inner
                .find_element(resolver::target_selector(&mark))
                .await?;
            element.click().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        }
        .await;

        // The click may have navigated away; a stale marker is harmless.
        if let Err(e) = self.inner.evaluate(resolver::unmark_script(&mark).as_str()).await {
            debug!("Could not remove click marker: {}", e);
        }

        clicked.map_err(BrowserError::from)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(BrowserError::AlreadyClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PageSurface for ChromePage {
    async fn goto(&self, url: &str) -> std::result::Result<(), SurfaceError> {
        self.navigate(url).await.map_err(SurfaceError::from)
    }

    async fn probe(&self, locator: &Locator) -> std::result::Result<ElementProbe, SurfaceError> {
        self.resolve(locator, None).await.map_err(SurfaceError::from)
    }

    async fn click(&self, locator: &Locator) -> std::result::Result<(), SurfaceError> {
        self.dispatch_click(locator).await.map_err(SurfaceError::from)
    }

    async fn screenshot(&self) -> std::result::Result<Vec<u8>, SurfaceError> {
        self.ensure_open()?;
        self.inner
            .screenshot(ScreenshotParams::default())
            .await
            .map_err(|e| SurfaceError::Backend(format!("screenshot failed: {e}")))
    }

    fn console_errors(&self) -> Vec<String> {
        self.console
            .errors()
            .into_iter()
            .map(|message| match message.source {
                Some(source) => format!("{} ({source})", message.text),
                None => message.text,
            })
            .collect()
    }

    async fn close(&self) -> std::result::Result<(), SurfaceError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        for listener in &self.listeners {
            listener.abort();
        }

        let closed = self.inner.clone().close().await.map_err(BrowserError::from);

        if let Some(context) = &self.context {
            if let Some(browser) = self.browser.lock().await.as_ref() {
                if let Err(e) = browser
                    .execute(DisposeBrowserContextParams::new(context.clone()))
                    .await
                {
                    warn!("Failed to dispose browser context: {}", e);
                }
            }
        }

        closed.map_err(SurfaceError::from)
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.abort();
        }
    }
}
