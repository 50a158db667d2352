//! Simple spinner for tasks without known duration.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Spinner for launching the browser and running scenarios.
///
/// Hidden when stderr is not a terminal, so CI logs stay clean.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Create and start a new spinner.
    pub fn new(message: &str) -> Self {
        let pb = if console::user_attended_stderr() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "●"]));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish spinner with a success message.
    pub fn finish(&self, message: &str) {
        if super::colors_enabled() {
            self.pb
                .finish_with_message(format!("{} {}", "✓".green(), message));
        } else {
            self.pb.finish_with_message(format!("✓ {}", message));
        }
    }

    /// Finish spinner with an error message.
    pub fn fail(&self, message: &str) {
        if super::colors_enabled() {
            self.pb
                .finish_with_message(format!("{} {}", "✗".red(), message));
        } else {
            self.pb.finish_with_message(format!("✗ {}", message));
        }
    }

    /// Removes the spinner line without a message.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        // Should not panic
        let spinner = Spinner::new("Launching Chrome...");
        spinner.finish("Chrome ready");

        Spinner::new("Running").fail("Chrome crashed");
        Spinner::new("Running").clear();
    }
}
