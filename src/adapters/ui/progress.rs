//! Indicatif helpers for long-running flows (remote calls, tracker sync).

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A steady-tick spinner with a message. Finish with
/// [`finish_spinner`] so the final line stays visible.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid spinner template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

/// Stop the spinner and replace it with a closing message.
pub fn finish_spinner(pb: &ProgressBar, message: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(message.to_string());
}
