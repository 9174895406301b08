use std::path::PathBuf;

use super::DownloadError;

/// A single download signal for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Whole percent in `0..=100`.
    Percent(u8),
    /// The server sent no usable content length.
    Indeterminate,
}

/// Bookkeeping for one download run.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    pub destination: PathBuf,
    pub total_bytes: Option<u64>,
    pub bytes_written: u64,
    last_percent: Option<u8>,
}

impl DownloadJob {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            total_bytes: None,
            bytes_written: 0,
            last_percent: None,
        }
    }

    /// Total length usable for percentages. A zero length counts as unknown.
    pub fn known_total(&self) -> Option<u64> {
        self.total_bytes.filter(|total| *total > 0)
    }

    /// Record a written chunk and return the signal to emit for it, if any.
    ///
    /// Returns `None` when the total is unknown (the caller reports
    /// [`Progress::Indeterminate`] once up front) and when the chunk would
    /// repeat an already emitted 100.
    pub fn record_chunk(&mut self, len: usize) -> Option<Progress> {
        self.bytes_written = self.bytes_written.saturating_add(len as u64);

        let total = self.known_total()?;
        let percent = percent_of(self.bytes_written, total);
        if percent == 100 && self.last_percent == Some(100) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(Progress::Percent(percent))
    }

    /// `true` when the known total was not reached.
    pub fn is_short(&self) -> bool {
        self.known_total()
            .is_some_and(|total| self.bytes_written < total)
    }
}

/// `floor(written * 100 / total)`, clamped to 100. `total` must be non-zero.
pub fn percent_of(written: u64, total: u64) -> u8 {
    let percent = (u128::from(written) * 100) / u128::from(total);
    percent.min(100) as u8
}

/// The process matched by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub matched_name: String,
    pub pid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Searching,
    Found(ProcessHandle),
    Watching(ProcessHandle),
    Terminated(ProcessHandle),
    Cancelled,
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub url: String,
    pub process_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The watched process exited and the artifact was cleaned up.
    Completed,
    /// Input validation failed; nothing was started.
    Rejected,
    Failed(DownloadError),
    Cancelled,
}
