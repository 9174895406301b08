use futures::Stream;
use futures::TryStreamExt;
use reqwest::Client;
use thiserror::Error;

use super::models::HttpConfig;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Open a streaming GET.
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self.client.get(download_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: download_url.to_string(),
            });
        }

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(FetchError::RequestError);

        Ok((total_size, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_reports_length_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/setup.exe")
            .with_status(200)
            .with_body(vec![7u8; 64])
            .create_async()
            .await;

        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let (total, stream) = client
            .download_file_stream(&format!("{}/setup.exe", server.url()))
            .await
            .unwrap();

        let chunks: Vec<_> = stream.collect().await;
        let body: Vec<u8> = chunks
            .into_iter()
            .map(|chunk| chunk.unwrap())
            .flat_map(|chunk| chunk.to_vec())
            .collect();

        assert_eq!(body, vec![7u8; 64]);
        if let Some(total) = total {
            assert_eq!(total, 64);
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let result = client
            .download_file_stream(&format!("{}/missing", server.url()))
            .await;

        match result {
            Err(FetchError::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("404 must not open a stream"),
        }
    }
}
