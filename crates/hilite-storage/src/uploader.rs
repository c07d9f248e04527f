//! Upload collaborators: publish rendered files and return their URLs.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

use crate::client::{content_type_for, R2Client, R2Config};
use crate::error::{StorageError, StorageResult};
use crate::fs_utils::move_file;

/// Publishes files under a namespace.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `files` and return one URL per file, in input order.
    async fn upload(&self, files: &[PathBuf], namespace: &str) -> StorageResult<Vec<String>>;
}

/// Upload one file and insist on exactly one URL back.
pub async fn upload_single(
    uploader: &dyn Uploader,
    file: &Path,
    namespace: &str,
) -> StorageResult<String> {
    let mut urls = uploader.upload(&[file.to_path_buf()], namespace).await?;
    if urls.len() != 1 {
        return Err(StorageError::CountMismatch {
            expected: 1,
            actual: urls.len(),
        });
    }
    Ok(urls.remove(0))
}

/// Normalize a namespace into slash-separated key segments.
fn namespace_segments(namespace: &str) -> StorageResult<Vec<&str>> {
    let segments: Vec<&str> = namespace
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.iter().any(|s| *s == "." || *s == ".." || s.contains('\\')) {
        return Err(StorageError::invalid_key(namespace));
    }
    Ok(segments)
}

fn file_name(path: &Path) -> StorageResult<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::invalid_key(path.display().to_string()))
}

/// Object key for `file` under `namespace`.
pub fn object_key(namespace: &str, file: &Path) -> StorageResult<String> {
    let mut parts = namespace_segments(namespace)?;
    parts.push(file_name(file)?);
    Ok(parts.join("/"))
}

fn parse_base_url(base: &str) -> StorageResult<Url> {
    Url::parse(base)
        .map_err(|e| StorageError::config_error(format!("invalid public base URL: {}", e)))
}

/// Uploads to an R2 bucket served from a public origin.
pub struct R2Uploader {
    client: R2Client,
    public_base_url: Url,
}

impl R2Uploader {
    pub fn new(client: R2Client, public_base_url: &str) -> StorageResult<Self> {
        Ok(Self {
            client,
            public_base_url: parse_base_url(public_base_url)?,
        })
    }

    pub fn from_config(config: &R2Config) -> StorageResult<Self> {
        let public_base_url = parse_base_url(&config.public_base_url)?;
        Ok(Self {
            client: R2Client::new(config),
            public_base_url,
        })
    }

    pub fn from_env() -> StorageResult<Self> {
        Self::from_config(&R2Config::from_env()?)
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.as_str().trim_end_matches('/'),
            key
        )
    }
}

#[async_trait]
impl Uploader for R2Uploader {
    async fn upload(&self, files: &[PathBuf], namespace: &str) -> StorageResult<Vec<String>> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let key = object_key(namespace, file)?;
            self.client
                .upload_file(file, &key, content_type_for(file))
                .await?;
            urls.push(self.public_url(&key));
        }
        Ok(urls)
    }
}

/// Moves files into a local directory tree and returns `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalUploader {
    root: PathBuf,
}

impl LocalUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Uploader for LocalUploader {
    async fn upload(&self, files: &[PathBuf], namespace: &str) -> StorageResult<Vec<String>> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let dst = namespace_segments(namespace)?
                .into_iter()
                .fold(self.root.clone(), |acc, seg| acc.join(seg))
                .join(file_name(file)?);

            move_file(file, &dst).await?;
            let absolute = tokio::fs::canonicalize(&dst).await?;
            let url = Url::from_file_path(&absolute)
                .map_err(|_| StorageError::invalid_key(absolute.display().to_string()))?;

            info!(path = %absolute.display(), "Published locally");
            urls.push(url.to_string());
        }
        Ok(urls)
    }
}
