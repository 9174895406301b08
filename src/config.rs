use std::path::PathBuf;
use std::time::Duration;

use crate::api::HttpConfig;

pub const ARTIFACT_FILE_NAME: &str = "downloaded_file.exe";
pub const LOG_FILE_NAME: &str = "app-launcher.log";

/// Runtime settings. Built from defaults, then overridden by CLI flags.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Interval of both process poll phases.
    pub poll_interval: Duration,
    /// How often the GUI drains pending events.
    pub ui_tick: Duration,
    /// Where the artifact is written; overwritten each run.
    pub destination: PathBuf,
    pub log_file: PathBuf,
    pub http: HttpConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            poll_interval: Duration::from_secs(1),
            ui_tick: Duration::from_millis(100),
            destination: temp.join(ARTIFACT_FILE_NAME),
            log_file: temp.join(LOG_FILE_NAME),
            http: HttpConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_live_in_temp_dir() {
        let config = LauncherConfig::default();
        let temp = std::env::temp_dir();

        assert_eq!(config.destination, temp.join("downloaded_file.exe"));
        assert_eq!(config.log_file.parent(), Some(temp.as_path()));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(config.ui_tick < config.poll_interval);
    }
}
