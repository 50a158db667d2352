//! Terminal UI utilities: status messages, spinners and the run summary.
//!
//! Everything is written to stderr. Colors follow `--no-color`, `NO_COLOR`,
//! `FORCE_COLOR` and terminal detection, in that order.
//!
//! # Examples
//!
//! ```no_run
//! use uicheck_cli::ui;
//!
//! ui::init_colors(false);
//!
//! let spinner = ui::Spinner::new("Launching Chrome...");
//! spinner.finish("Chrome ready");
//!
//! ui::success("All scenarios passed");
//! ```

mod format;
mod messages;
mod spinner;

use std::sync::atomic::{AtomicBool, Ordering};

pub use format::{format_duration, print_summary, summary_lines};
pub use messages::{error, info, success, warning};
pub use spinner::Spinner;

static COLORS: AtomicBool = AtomicBool::new(true);

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR environment variables, falls back to
/// terminal capability detection.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }

    console::user_attended_stderr()
}

/// Initialize color support. Call once, early in main.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    COLORS.store(enabled, Ordering::Relaxed);
    console::set_colors_enabled_stderr(enabled);
}

/// Whether messages should be colored.
pub fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_flag_disables_colors() {
        init_colors(true);
        assert!(!colors_enabled());
    }
}
