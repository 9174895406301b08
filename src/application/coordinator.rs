use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    api::{self, HttpClient},
    config::LauncherConfig,
    domain::{DeletionError, DownloadError, RunOutcome, RunRequest, WatchState},
    utils::validate_request,
};

use super::{
    downloader::{DownloadEvent, Downloader},
    launcher::{ArtifactLauncher, SystemLauncher},
    process_watcher::{ProcessTable, ProcessWatcher, SystemProcessTable},
    ui_port::LauncherUi,
};

/// Drives one run: download, launch, watch, delete.
///
/// `run` consumes the coordinator, so a coordinator and its cancellation
/// token belong to exactly one run.
pub struct Coordinator<T, L> {
    config: LauncherConfig,
    downloader: Downloader,
    table: T,
    launcher: L,
}

impl Coordinator<SystemProcessTable, SystemLauncher> {
    pub fn from_config(config: LauncherConfig) -> api::Result<Self> {
        let downloader = Downloader::new(HttpClient::new(&config.http)?);
        Ok(Self::new(
            config,
            downloader,
            SystemProcessTable::new(),
            SystemLauncher,
        ))
    }
}

impl<T: ProcessTable, L: ArtifactLauncher> Coordinator<T, L> {
    pub fn new(config: LauncherConfig, downloader: Downloader, table: T, launcher: L) -> Self {
        Self {
            config,
            downloader,
            table,
            launcher,
        }
    }

    pub async fn run<U: LauncherUi>(
        self,
        request: RunRequest,
        ui: &U,
        cancel: CancellationToken,
    ) -> RunOutcome {
        let errors = validate_request(&request.url, &request.process_filter);
        if !errors.is_empty() {
            for error in &errors {
                warn!(%error, "Rejected input");
                ui.report_validation_error(error);
            }
            return RunOutcome::Rejected;
        }

        info!(url = %request.url, filter = %request.process_filter, "Run started");

        let artifact = match self.download(&request.url, ui, &cancel).await {
            Ok(path) => path,
            Err(DownloadError::Cancelled) => {
                info!("Run cancelled during download");
                return RunOutcome::Cancelled;
            }
            Err(e) => {
                error!(error = %e, url = %request.url, "Download failed");
                ui.notify_fatal_error(&e.to_string());
                return RunOutcome::Failed(e);
            }
        };

        if cancel.is_cancelled() {
            info!("Run cancelled before launch");
            return RunOutcome::Cancelled;
        }

        // A failed launch is not fatal: the user may start the artifact by hand.
        if let Err(e) = self.launcher.launch(&artifact) {
            error!(error = %e, "Could not open the artifact, watching anyway");
        }

        let watcher = ProcessWatcher::new(
            self.table,
            request.process_filter,
            self.config.poll_interval,
        );

        match watcher
            .run(&cancel, |handle| ui.notify_process_found(handle))
            .await
        {
            WatchState::Terminated(_) => {
                if let Err(e) = remove_artifact(&artifact).await {
                    warn!(error = %e, "Artifact cleanup skipped");
                }
                info!("Run completed");
                RunOutcome::Completed
            }
            _ => {
                info!("Run cancelled while watching");
                RunOutcome::Cancelled
            }
        }
    }

    async fn download<U: LauncherUi>(
        &self,
        url: &str,
        ui: &U,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        let mut events = self.downloader.download(
            url.to_string(),
            self.config.destination.clone(),
            cancel.clone(),
        );

        while let Some(event) = events.next().await {
            match event {
                DownloadEvent::Progress(progress) => {
                    if !cancel.is_cancelled() {
                        ui.report_progress(progress);
                    }
                }
                DownloadEvent::Completed(path) => return Ok(path),
                DownloadEvent::Failed(e) => return Err(e),
            }
        }

        Err(DownloadError::Network(
            "Download ended without a result".to_string(),
        ))
    }
}

/// Delete the artifact once. A missing file is reported, never retried.
pub async fn remove_artifact(path: &Path) -> Result<(), DeletionError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!(path = %path.display(), "Artifact deleted");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DeletionError::Missing(path.to_path_buf()))
        }
        Err(source) => Err(DeletionError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
