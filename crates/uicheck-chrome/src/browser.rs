//! Browser lifecycle management and process control.
//!
//! One [`ChromeBrowser`] process serves every scenario of a run. Each page
//! lives in its own browser context (an incognito-like profile), so cookies
//! and storage never leak between concurrently running scenarios.
//!
//! # Resource Safety
//!
//! Dropping a `ChromeBrowser` kills the process through chromiumoxide's own
//! Drop, but explicit [`close`](ChromeBrowser::close) is preferred for a
//! graceful shutdown.

use crate::error::{BrowserError, Result};
use crate::page::ChromePage;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uicheck_core::{PageFactory, PageSurface, SurfaceError};

/// Configuration for launching Chrome.
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Run in headless mode (default: true, unless the `visible` feature
    /// is enabled).
    pub headless: bool,

    /// Browser window size (default: 1920x1080).
    pub window_size: (u32, u32),

    /// Additional Chrome arguments.
    pub args: Vec<String>,

    /// Chrome executable path (None = auto-detect).
    pub chrome_path: Option<PathBuf>,

    /// How long `goto` waits for the document to finish loading.
    pub load_timeout: Duration,
}

impl ChromeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows the browser window, for watching a scenario run.
    #[must_use]
    pub fn visible(mut self) -> Self {
        self.headless = false;
        self
    }

    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    #[must_use]
    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Chrome command-line arguments derived from this config.
    fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![format!(
            "--window-size={},{}",
            self.window_size.0, self.window_size.1
        )];

        // A unique profile avoids ProcessSingleton conflicts between
        // browsers launched in parallel.
        let user_data_dir =
            std::env::temp_dir().join(format!("uicheck-chrome-{}", uuid::Uuid::new_v4()));
        args.push(format!("--user-data-dir={}", user_data_dir.display()));

        args.extend(self.args.iter().cloned());
        args
    }

    #[allow(clippy::result_large_err)]
    fn to_browser_config(&self) -> Result<BrowserConfig> {
        let mut config = BrowserConfig::builder();
        if !self.headless {
            config = config.with_head();
        }
        for arg in self.chrome_args() {
            config = config.arg(arg);
        }
        if let Some(path) = &self.chrome_path {
            config = config.chrome_executable(path);
        }

        config.build().map_err(|e| BrowserError::LaunchFailed {
            reason: format!("invalid browser configuration: {e}"),
            source: None,
        })
    }
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            headless: !cfg!(feature = "visible"),
            window_size: (1920, 1080),
            args: vec![
                // Needed when user namespaces are unavailable (containers, CI).
                // Only point uicheck at sites you trust.
                "--no-sandbox".to_string(),
                // Prevents /dev/shm exhaustion in containers
                "--disable-dev-shm-usage".to_string(),
            ],
            chrome_path: None,
            load_timeout: Duration::from_secs(30),
        }
    }
}

/// A running Chrome process that hands out isolated pages.
pub struct ChromeBrowser {
    inner: Arc<Mutex<Option<Browser>>>,
    load_timeout: Duration,
}

impl ChromeBrowser {
    /// Launches Chrome and starts driving its CDP connection.
    ///
    /// # Errors
    ///
    /// Returns `LaunchFailed` if Chrome is not installed, not executable,
    /// or fails to start.
    pub async fn launch(config: ChromeConfig) -> Result<Self> {
        debug!("Launching browser with config: {:?}", config);

        let browser_config = config.to_browser_config()?;
        let (browser, mut handler) =
            Browser::launch(browser_config)
                .await
                .map_err(|e| BrowserError::LaunchFailed {
                    reason: "failed to launch Chrome process".to_string(),
                    source: Some(Box::new(e)),
                })?;

        // chromiumoxide only processes CDP events while the handler is polled
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Browser handler error: {}", e);
                }
            }
        });

        debug!("Browser launched successfully");
        Ok(Self {
            inner: Arc::new(Mutex::new(Some(browser))),
            load_timeout: config.load_timeout,
        })
    }

    /// Opens a blank page in a fresh browser context.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyClosed` if the browser has been closed, or
    /// `ConnectionFailed` if the context or target cannot be created.
    pub async fn new_page(&self) -> Result<ChromePage> {
        let guard = self.inner.lock().await;
        let browser = guard.as_ref().ok_or(BrowserError::AlreadyClosed)?;

        let context = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?
            .result
            .browser_context_id;

        let mut target = CreateTargetParams::new("about:blank");
        target.browser_context_id = Some(context.clone());

        let page = match browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(err) = browser
                    .execute(DisposeBrowserContextParams::new(context))
                    .await
                {
                    warn!("Failed to dispose browser context: {}", err);
                }
                return Err(BrowserError::ConnectionFailed(e.to_string()));
            }
        };

        debug!("Opened page in context {:?}", context);
        Ok(ChromePage::new(
            page,
            Some(context),
            Arc::clone(&self.inner),
            self.load_timeout,
        ))
    }

    /// Closes the browser and kills the Chrome process.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser fails to close gracefully.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        if let Some(mut browser) = guard.take() {
            debug!("Closing browser gracefully");
            browser
                .close()
                .await
                .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;
            if let Err(e) = browser.wait().await {
                warn!("Failed to reap Chrome process: {}", e);
            }
        }
        Ok(())
    }

    /// Returns true if the browser has been closed.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }
}

#[async_trait]
impl PageFactory for ChromeBrowser {
    async fn open_page(&self) -> std::result::Result<Box<dyn PageSurface>, SurfaceError> {
        let page = self.new_page().await?;
        Ok(Box::new(page))
    }
}

impl Drop for ChromeBrowser {
    fn drop(&mut self) {
        // chromiumoxide's Browser::drop kills the process if close() never ran
        if let Ok(guard) = self.inner.try_lock() {
            if guard.is_some() {
                warn!("ChromeBrowser dropped without explicit close() - forcing shutdown via Drop");
            }
        }
    }
}
