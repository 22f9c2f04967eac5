use std::borrow::Cow;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner drawn on stderr while a request is in flight.
///
/// indicatif hides it when stderr is not a terminal. It must be finished before
/// any response text is written.
pub struct Spinner(ProgressBar);

impl Spinner {
    pub fn start(message: impl Into<Cow<'static, str>>) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.blue} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.set_message(message);
        Spinner(bar)
    }

    pub fn finish(self) {
        self.0.finish_and_clear();
    }
}
