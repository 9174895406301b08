use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::{self, HttpClient},
    domain::{DownloadError, DownloadJob, Progress},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Progress(Progress),
    Completed(PathBuf),
    Failed(DownloadError),
}

pub type ByteStream = BoxStream<'static, api::Result<Bytes>>;

#[derive(Clone)]
pub struct Downloader {
    client: HttpClient,
}

impl Downloader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Stream `url` into `path`.
    ///
    /// The returned stream ends with exactly one `Completed` or `Failed`.
    /// Nothing touches `path` until the server answered with a success status.
    pub fn download(
        &self,
        url: String,
        path: PathBuf,
        cancel: CancellationToken,
    ) -> BoxStream<'static, DownloadEvent> {
        drive(
            DownloadRuntimeState::Start {
                client: self.client.clone(),
                job: DownloadJob::new(url, path),
            },
            cancel,
        )
    }
}

/// Write an already opened response body to `job.destination`.
#[cfg(test)]
pub fn write_body(
    job: DownloadJob,
    body: ByteStream,
    cancel: CancellationToken,
) -> BoxStream<'static, DownloadEvent> {
    drive(DownloadRuntimeState::Opened { job, body }, cancel)
}

fn drive(initial: DownloadRuntimeState, cancel: CancellationToken) -> BoxStream<'static, DownloadEvent> {
    futures::stream::unfold((initial, cancel), |(state, cancel)| async move {
        let (event, next) = step(state, &cancel).await?;
        Some((event, (next, cancel)))
    })
    // Steps that only advance the state produce no event.
    .filter_map(|event| async move { event })
    .boxed()
}

enum DownloadRuntimeState {
    Start {
        client: HttpClient,
        job: DownloadJob,
    },
    Opened {
        job: DownloadJob,
        body: ByteStream,
    },
    Downloading {
        file: tokio::fs::File,
        body: ByteStream,
        job: DownloadJob,
    },
    Finished,
}

type Step = (Option<DownloadEvent>, DownloadRuntimeState);

fn fail(error: DownloadError) -> Step {
    (
        Some(DownloadEvent::Failed(error)),
        DownloadRuntimeState::Finished,
    )
}

async fn step(state: DownloadRuntimeState, cancel: &CancellationToken) -> Option<Step> {
    match state {
        DownloadRuntimeState::Start { client, mut job } => {
            info!(url = %job.url, "Starting download");

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Some(fail(DownloadError::Cancelled)),
                opened = client.download_file_stream(&job.url) => opened,
            };

            match opened {
                Ok((total_size, body)) => {
                    job.total_bytes = total_size;
                    Some((None, DownloadRuntimeState::Opened {
                        job,
                        body: body.boxed(),
                    }))
                }
                Err(e) => {
                    warn!(url = %job.url, error = %e, "Download request failed");
                    Some(fail(DownloadError::Network(e.to_string())))
                }
            }
        }
        DownloadRuntimeState::Opened { job, body } => {
            let file = match tokio::fs::File::create(&job.destination).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %job.destination.display(), error = %e, "Failed to create file");
                    return Some(fail(DownloadError::Io(format!(
                        "Failed to create file: {}",
                        e
                    ))));
                }
            };

            info!(
                path = %job.destination.display(),
                total_bytes = ?job.total_bytes,
                "Writing download"
            );

            let event = job
                .known_total()
                .is_none()
                .then_some(DownloadEvent::Progress(Progress::Indeterminate));

            Some((event, DownloadRuntimeState::Downloading { file, body, job }))
        }
        DownloadRuntimeState::Downloading {
            mut file,
            mut body,
            mut job,
        } => {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = body.next() => Some(next),
            };

            let Some(next) = next else {
                info!(bytes_written = job.bytes_written, "Download cancelled");
                abandon(file, &job.destination).await;
                return Some(fail(DownloadError::Cancelled));
            };

            match next {
                Some(Ok(chunk)) => {
                    if let Err(e) = file.write_all(&chunk).await {
                        warn!(error = %e, "Write error");
                        abandon(file, &job.destination).await;
                        return Some(fail(DownloadError::Io(format!("Write error: {}", e))));
                    }

                    let event = job.record_chunk(chunk.len()).map(DownloadEvent::Progress);
                    debug!(bytes_written = job.bytes_written, "Chunk written");

                    Some((event, DownloadRuntimeState::Downloading { file, body, job }))
                }
                Some(Err(e)) => {
                    warn!(error = %e, bytes_written = job.bytes_written, "Download interrupted");
                    abandon(file, &job.destination).await;
                    Some(fail(DownloadError::Network(e.to_string())))
                }
                None => {
                    if job.is_short() {
                        let message = format!(
                            "Body ended after {} of {} bytes",
                            job.bytes_written,
                            job.total_bytes.unwrap_or_default()
                        );
                        warn!("{}", message);
                        abandon(file, &job.destination).await;
                        return Some(fail(DownloadError::Network(message)));
                    }

                    if let Err(e) = file.sync_all().await {
                        warn!(error = %e, "Failed to sync file");
                        abandon(file, &job.destination).await;
                        return Some(fail(DownloadError::Io(format!(
                            "Failed to sync file: {}",
                            e
                        ))));
                    }

                    info!(
                        path = %job.destination.display(),
                        bytes_written = job.bytes_written,
                        "Download finished"
                    );
                    Some((
                        Some(DownloadEvent::Completed(job.destination)),
                        DownloadRuntimeState::Finished,
                    ))
                }
            }
        }
        DownloadRuntimeState::Finished => None,
    }
}

/// Close and remove a partial download.
async fn abandon(file: tokio::fs::File, path: &Path) {
    drop(file);
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!(path = %path.display(), "Removed partial download"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial download"),
    }
}
