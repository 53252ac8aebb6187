//! Media extraction
//!
//! `Extractor` is the seam between the pipeline and whatever fetches media.
//! `YtDlpExtractor` drives the `yt-dlp` executable and reads its JSON output.

use crate::error::{AcquireError, ExtractionKind, Result};
use crate::types::{watch_url, MediaInfo, SearchHit};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use tunekeep_core::SettingsHandle;

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Look up media metadata without downloading
    async fn resolve(&self, url: &str) -> Result<MediaInfo>;

    /// Download into `dest_dir`, converted to the configured audio codec
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<MediaInfo>;

    /// Up to `limit` ranked hits for a text query
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

/// yt-dlp JSON as printed by `--dump-single-json`
#[derive(Debug, Deserialize)]
struct RawInfo {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    filepath: Option<PathBuf>,
    #[serde(default)]
    requested_downloads: Vec<RawDownload>,
    #[serde(default)]
    entries: Vec<RawInfo>,
}

#[derive(Debug, Deserialize)]
struct RawDownload {
    #[serde(default)]
    filepath: Option<PathBuf>,
}

impl RawInfo {
    fn into_media(self) -> MediaInfo {
        let file = self
            .requested_downloads
            .into_iter()
            .rev()
            .find_map(|d| d.filepath)
            .or(self.filepath);
        MediaInfo {
            id: self.id,
            title: self.title.unwrap_or_default(),
            uploader: self.uploader.or(self.channel),
            thumbnail: self.thumbnail,
            ext: self.ext,
            file,
        }
    }

    fn into_hits(self, limit: usize) -> Vec<SearchHit> {
        self.entries
            .into_iter()
            .take(limit)
            .map(|entry| SearchHit {
                url: watch_url(&entry.id),
                title: entry.title.unwrap_or_default(),
                uploader: entry.uploader.or(entry.channel),
                id: entry.id,
            })
            .collect()
    }
}

/// Extractor backed by the `yt-dlp` command-line tool
///
/// Executable and audio codec are read from the current settings on every
/// call.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    settings: SettingsHandle,
}

impl YtDlpExtractor {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    async fn run(&self, args: Vec<String>) -> Result<RawInfo> {
        let program = self.settings.snapshot().await.extractor_path.clone();
        debug!(program = %program.display(), args = ?args, "Running extractor");

        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AcquireError::ExtractionFailed {
                kind: ExtractionKind::Other,
                message: format!("could not run {}: {}", program.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AcquireError::extraction(&stderr));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn resolve(&self, url: &str) -> Result<MediaInfo> {
        let args = vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            url.to_string(),
        ];
        Ok(self.run(args).await?.into_media())
    }

    async fn download(&self, url: &str, dest_dir: &Path) -> Result<MediaInfo> {
        let audio_format = self.settings.snapshot().await.audio_format.clone();
        tokio::fs::create_dir_all(dest_dir).await?;
        let template = dest_dir.join("%(id)s.%(ext)s");

        let args = vec![
            "--dump-single-json".to_string(),
            "--no-simulate".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "--no-playlist".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            audio_format,
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
            url.to_string(),
        ];
        Ok(self.run(args).await?.into_media())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let args = vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--flat-playlist".to_string(),
            format!("ytsearch{limit}:{query}"),
        ];
        Ok(self.run(args).await?.into_hits(limit))
    }
}
