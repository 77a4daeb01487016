//! Content-addressed cache of remote preview audio.
//!
//! Files are named after the SHA-256 of their source URL, so the same URL
//! always maps to the same file across calls and restarts.

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const CACHED_AUDIO_EXTENSION: &str = "mp3";

/// CDN host serving Spotify preview clips.
const PREVIEW_CDN_TOKEN: &str = "p.scdn.co";

/// Whether `url` looks like a short preview clip worth caching.
pub fn is_preview_url(url: &str) -> bool {
    url.contains("preview")
        || url.contains(PREVIEW_CDN_TOKEN)
        || url.to_ascii_lowercase().ends_with(".mp3")
}

/// Lowercase hex SHA-256 of the URL.
pub fn cache_key(url: &str) -> String {
    Sha256::digest(url.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub struct AudioCache {
    base_dir: PathBuf,
    storage_dir_name: String,
    client: reqwest::Client,
}

impl AudioCache {
    /// `storage_dir_name` is the directory under `base_dir` holding the files,
    /// and also the first component of every path handed out.
    pub fn new<P: Into<PathBuf>, S: Into<String>>(base_dir: P, storage_dir_name: S) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(AudioCache {
            base_dir: base_dir.into(),
            storage_dir_name: storage_dir_name.into(),
            client,
        })
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.base_dir.join(&self.storage_dir_name)
    }

    fn file_name(url: &str) -> String {
        format!("{}.{}", cache_key(url), CACHED_AUDIO_EXTENSION)
    }

    /// Storage-relative path of the cached file for `url`.
    pub fn relative_path(&self, url: &str) -> String {
        format!("{}/{}", self.storage_dir_name, Self::file_name(url))
    }

    /// Absolute path the cached file for `url` lives at.
    pub fn audio_path(&self, url: &str) -> PathBuf {
        self.storage_dir().join(Self::file_name(url))
    }

    /// Maps a path previously returned by `fetch` back to the filesystem.
    /// Anything pointing outside the storage directory yields None.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        let mut components = path.components();
        match components.next() {
            Some(Component::Normal(first))
                if first.to_str() == Some(self.storage_dir_name.as_str()) => {}
            _ => return None,
        }
        let rest: Vec<Component> = components.collect();
        if rest.is_empty() || rest.iter().any(|c| !matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.base_dir.join(path))
    }

    pub async fn exists(&self, url: &str) -> bool {
        tokio::fs::try_exists(self.audio_path(url))
            .await
            .unwrap_or(false)
    }

    /// Removes the cached file for `url`. Returns false when nothing was
    /// removed, including on I/O errors.
    pub async fn delete(&self, url: &str) -> bool {
        let path = self.audio_path(url);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed cached audio {:?}", path);
                true
            }
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove cached audio {:?}: {}", path, err);
                }
                false
            }
        }
    }

    /// Makes the preview at `url` available locally and returns its
    /// storage-relative path. Already cached files are returned without any
    /// network access. Non-preview URLs and failed downloads yield None.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        if !is_preview_url(url) {
            debug!("Not caching non-preview url {}", url);
            return None;
        }

        let target = self.audio_path(url);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!("Audio cache hit for {}", url);
            return Some(self.relative_path(url));
        }

        match self.download(url, &target).await {
            Ok(size) => {
                info!(
                    "Cached audio from {} at {:?} ({:#})",
                    url,
                    target,
                    byte_unit::Byte::from(size)
                );
                Some(self.relative_path(url))
            }
            Err(err) => {
                warn!("Failed to cache audio from {}: {:#}", url, err);
                None
            }
        }
    }

    /// Streams `url` into a temporary file next to `target` and renames it into
    /// place once complete. The temporary file is deleted on any error.
    async fn download(&self, url: &str, target: &Path) -> Result<u64> {
        let dir = self.storage_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create audio storage dir {:?}", dir))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to request audio")?;
        if !response.status().is_success() {
            bail!("Audio download failed with status {}", response.status());
        }
        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.starts_with("audio/") {
                warn!("Unexpected content type {} for {}", content_type, url);
            }
        }

        let (std_file, temp_path) = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".part")
            .tempfile_in(&dir)
            .context("Failed to create temporary audio file")?
            .into_parts();

        let mut writer = BufWriter::new(tokio::fs::File::from_std(std_file));
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read audio stream")?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        drop(writer);

        temp_path
            .persist(target)
            .with_context(|| format!("Failed to move audio into {:?}", target))?;
        Ok(written)
    }
}
