pub mod error;
pub mod model;

pub use error::{DeletionError, DownloadError, Field, LaunchError, ValidationError};
pub use model::{DownloadJob, ProcessHandle, Progress, RunOutcome, RunRequest, WatchState};
