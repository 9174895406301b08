use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::LauncherConfig;
use crate::domain::RunRequest;

/// Download a file, launch it, and delete it again once a process exits.
#[derive(Debug, Parser)]
#[command(name = "app-launcher", version, about)]
pub struct Cli {
    /// URL of the file to download
    pub url: Option<String>,

    /// Name, or part of the name, of the process to watch
    pub process: Option<String>,

    /// Run without a window; requires URL and PROCESS
    #[arg(long, requires_all = ["url", "process"])]
    pub headless: bool,

    /// Process poll interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: u64,

    /// Override the download destination
    #[arg(long, value_name = "PATH")]
    pub destination: Option<PathBuf>,

    /// Override the log file location
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn config(&self) -> LauncherConfig {
        let mut config = LauncherConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..LauncherConfig::default()
        };
        if let Some(destination) = &self.destination {
            config.destination = destination.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = log_file.clone();
        }
        config
    }

    /// The request given on the command line, when both parts are present.
    pub fn request(&self) -> Option<RunRequest> {
        match (&self.url, &self.process) {
            (Some(url), Some(process)) => Some(RunRequest {
                url: url.clone(),
                process_filter: process.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_means_interactive() {
        let cli = Cli::try_parse_from(["app-launcher"]).unwrap();
        assert!(cli.request().is_none());
        assert!(!cli.headless);
        assert_eq!(cli.config().poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_positionals_and_overrides() {
        let cli = Cli::try_parse_from([
            "app-launcher",
            "https://example.com/setup.exe",
            "setup",
            "--poll-interval-ms",
            "250",
            "--destination",
            "/tmp/x.exe",
        ])
        .unwrap();

        let request = cli.request().unwrap();
        assert_eq!(request.url, "https://example.com/setup.exe");
        assert_eq!(request.process_filter, "setup");

        let config = cli.config();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.destination, PathBuf::from("/tmp/x.exe"));
    }

    #[test]
    fn test_headless_needs_both_positionals() {
        assert!(Cli::try_parse_from(["app-launcher", "--headless"]).is_err());
        assert!(Cli::try_parse_from(["app-launcher", "--poll-interval-ms", "0"]).is_err());
    }
}
