//! Progress UI (spinner) while sources are queried.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Starts a stderr spinner when requested.
/// Returns `None` when disabled so callers can finish it unconditionally.
pub(crate) fn start_spinner(use_spinner: bool, query: &str) -> Option<ProgressBar> {
    if !use_spinner {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Searching sources for \"{query}\"..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

pub(crate) fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}
