//! # uicheck-chrome
//!
//! Headless Chrome backend for `uicheck-core`, built on chromiumoxide.
//!
//! [`ChromeBrowser`] launches one Chrome process and implements
//! [`PageFactory`](uicheck_core::PageFactory): every scenario gets a
//! [`ChromePage`] in its own browser context, so concurrent scenarios share
//! no cookies or storage. Locators are resolved inside the page by an
//! injected script; the engine in `uicheck-core` does all waiting.
//!
//! ## Example
//!
//! ```ignore
//! use uicheck_chrome::{ChromeBrowser, ChromeConfig};
//! use uicheck_core::{RunnerConfig, ScenarioRunner};
//!
//! let browser = ChromeBrowser::launch(ChromeConfig::default()).await?;
//! let runner = ScenarioRunner::new(RunnerConfig::new("https://shop.test"));
//! let result = runner.run(&scenario, &browser).await;
//! browser.close().await?;
//! ```
//!
//! Browser tests need Chrome installed and are `#[ignore]`d; run them with
//! `cargo test -p uicheck-chrome -- --ignored`.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod console;
pub mod error;
pub mod page;
mod resolver;

pub use browser::{ChromeBrowser, ChromeConfig};
pub use console::{ConsoleCapture, ConsoleLevel, ConsoleMessage};
pub use error::{BrowserError, Result};
pub use page::ChromePage;
