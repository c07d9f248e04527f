//! Source media acquisition.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{WorkerError, WorkerResult};

/// Resolves a request's `source` to a readable local file.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Return a local path for `source`, downloading into `dest_dir` if needed.
    async fn fetch(&self, source: &str, dest_dir: &Path) -> WorkerResult<PathBuf>;
}

/// Uses local paths in place and streams `http(s)` URLs to disk.
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    client: reqwest::Client,
}

impl Default for HttpSourceFetcher {
    fn default() -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl HttpSourceFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn download(&self, url: &Url, dest_dir: &Path) -> WorkerResult<PathBuf> {
        let dest = dest_dir.join(download_file_name(url));
        debug!(url = %url, dest = %dest.display(), "Downloading source");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()
            .map_err(|e| WorkerError::download_failed(e.to_string()))?;

        let mut file = tokio::fs::File::create(&dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if written == 0 {
            return Err(WorkerError::download_failed(format!("{} returned an empty body", url)));
        }

        info!(url = %url, bytes = written, "Downloaded source");
        Ok(dest)
    }
}

/// `source.<ext>`, keeping the URL's extension when it looks like one.
fn download_file_name(url: &Url) -> String {
    let ext = url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);
    match ext {
        Some(ext) => format!("source.{}", ext),
        None => "source.media".to_string(),
    }
}

async fn local_file(path: PathBuf) -> WorkerResult<PathBuf> {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(path),
        Ok(_) => Err(WorkerError::download_failed(format!(
            "source is not a file: {}",
            path.display()
        ))),
        Err(e) => Err(WorkerError::download_failed(format!(
            "source {} is not readable: {}",
            path.display(),
            e
        ))),
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, source: &str, dest_dir: &Path) -> WorkerResult<PathBuf> {
        let source = source.trim();
        match Url::parse(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.download(&url, dest_dir).await,
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| WorkerError::download_failed(format!("bad file URL: {}", source)))?;
                local_file(path).await
            }
            // Anything else, including bare and Windows drive paths, is a local path
            _ => local_file(PathBuf::from(source)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_download_file_name() {
        let url = Url::parse("https://cdn.example.org/archive/2024/session.MP4?sig=abc").unwrap();
        assert_eq!(download_file_name(&url), "source.mp4");
        let bare = Url::parse("https://cdn.example.org/stream").unwrap();
        assert_eq!(download_file_name(&bare), "source.media");
    }

    #[tokio::test]
    async fn test_local_path_used_in_place() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("meeting.mp4");
        tokio::fs::write(&file, b"data").await.unwrap();

        let fetched = HttpSourceFetcher::default()
            .fetch(file.to_str().unwrap(), dir.path())
            .await
            .unwrap();
        assert_eq!(fetched, file);
    }

    #[tokio::test]
    async fn test_missing_local_path_is_download_error() {
        let dir = TempDir::new().unwrap();
        let err = HttpSourceFetcher::default()
            .fetch("/definitely/not/here.mp4", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::DownloadFailed(_)));
    }

    #[tokio::test]
    async fn test_http_source_is_streamed_to_disk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/council.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/media/council.mp4", server.uri());
        let fetched = HttpSourceFetcher::default().fetch(&url, dir.path()).await.unwrap();

        assert_eq!(fetched, dir.path().join("source.mp4"));
        assert_eq!(tokio::fs::read(&fetched).await.unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_http_error_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let err = HttpSourceFetcher::default()
            .fetch(&format!("{}/gone.mp4", server.uri()), dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), hilite_models::FailureKind::Download);
    }
}
