use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::application::LauncherUi;
use crate::domain::{ProcessHandle, Progress, ValidationError};

/// Terminal presentation for `--headless` runs.
pub struct ConsoleUi {
    bar: ProgressBar,
}

impl ConsoleUi {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .map(|style| style.progress_chars("█▓░"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    fn use_spinner(&self) {
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            self.bar.set_style(style);
        }
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl LauncherUi for ConsoleUi {
    fn report_progress(&self, progress: Progress) {
        match progress {
            Progress::Percent(percent) => self.bar.set_position(u64::from(percent)),
            Progress::Indeterminate => {
                self.use_spinner();
                self.bar.set_message("downloading (size unknown)");
            }
        }
    }

    fn report_validation_error(&self, error: &ValidationError) {
        self.bar.suspend(|| eprintln!("{}", error));
    }

    fn notify_process_found(&self, handle: &ProcessHandle) {
        self.bar.finish_and_clear();
        println!(
            "Watching {} (PID {}); the download is removed when it exits.",
            handle.matched_name, handle.pid
        );
    }

    fn notify_fatal_error(&self, message: &str) {
        self.bar.abandon();
        eprintln!("Download failed: {}", message);
    }
}
