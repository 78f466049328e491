//! Terminal progress for ticket fetching and processing.
//!
//! Nothing is drawn unless stderr is an interactive terminal, so piped runs
//! and `--json` output stay clean.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

#[must_use]
pub fn stderr_is_interactive() -> bool {
    stderr().is_terminal()
}

/// A bar or spinner whose visibility is fixed at construction.
pub struct ProgressTracker {
    bar: ProgressBar,
    showing: bool,
}

impl ProgressTracker {
    /// Bar over `total` items; `show = false` keeps it hidden even on a
    /// terminal.
    #[must_use]
    pub fn with_visibility(total: u64, message: &str, show: bool) -> Self {
        let showing = show && stderr_is_interactive();
        let bar = ProgressBar::new(total);
        if showing {
            let style = ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .map_or_else(|_| ProgressStyle::default_bar(), |style| style.progress_chars("=>-"));
            bar.set_style(style);
            bar.set_message(message.to_string());
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { bar, showing }
    }

    /// Spinner for paged fetches where the total is learned late.
    #[must_use]
    pub fn new_spinner(message: &str) -> Self {
        let showing = stderr_is_interactive();
        let bar = ProgressBar::new_spinner();
        if showing {
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_message(message.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { bar, showing }
    }

    pub fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }

    #[must_use]
    pub const fn is_showing(&self) -> bool {
        self.showing
    }
}
