use indicatif::{ProgressBar, ProgressStyle};

/// Renders one `DownloadingProgress` stream as a single indicatif bar.
pub struct TerminalProgressObserver {
    bar: ProgressBar,
}

impl TerminalProgressObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap()
            .progress_chars("=>-");
        bar.set_style(style);
        Self { bar }
    }

    pub fn on_progress(&self, percentage: f64) {
        self.bar.set_position(percentage.clamp(0.0, 100.0) as u64);
    }

    pub fn on_complete(&self) {
        self.bar.finish_with_message("done");
    }

    pub fn on_canceled(&self) {
        self.bar.abandon_with_message("canceled");
    }

    pub fn on_error(&self, reason: &str) {
        self.bar.abandon_with_message(format!("error: {reason}"));
    }
}
