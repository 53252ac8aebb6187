//! Runtime settings
//!
//! `Settings` is an immutable value. Operations take one snapshot when they
//! start and use it for their whole run; `SettingsHandle::reconfigure` swaps
//! in a new value for operations that start afterwards.

use crate::error::{Result, TuneError};
use crate::types::PoolLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default admission gate size for concurrent fetches
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Default number of hits offered for a text query
pub const DEFAULT_SEARCH_RESULTS: usize = 5;

/// Default file name of the pending work-list under the playlists root
pub const DEFAULT_WORKLIST_NAME: &str = "songs.txt";

/// What to do with content hashes of acquired files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupPolicy {
    /// No hashing
    #[default]
    Off,
    /// Hash and warn about duplicates already in the library
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub layout: PoolLayout,
    /// Pending "song list" file
    pub worklist: PathBuf,
    /// Fetches admitted at once
    pub max_concurrent: usize,
    /// Hits offered for a text query
    pub search_results: usize,
    pub dedup: DedupPolicy,
    /// Codec the extractor converts downloads to
    pub audio_format: String,
    /// Executable used for extraction
    pub extractor_path: PathBuf,
}

impl Settings {
    /// Settings with default layout and limits for a playlists root
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let layout = PoolLayout::for_root(root);
        let worklist = layout.root.join(DEFAULT_WORKLIST_NAME);
        Self {
            layout,
            worklist,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            search_results: DEFAULT_SEARCH_RESULTS,
            dedup: DedupPolicy::Off,
            audio_format: "mp3".to_string(),
            extractor_path: PathBuf::from("yt-dlp"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(TuneError::config("max_concurrent must be at least 1"));
        }
        if self.search_results == 0 {
            return Err(TuneError::config("search_results must be at least 1"));
        }
        if self.audio_format.trim().is_empty() {
            return Err(TuneError::config("audio_format must not be empty"));
        }
        Ok(())
    }
}

/// Shared, swappable settings
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    current: Arc<RwLock<Arc<Settings>>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
        })
    }

    /// Immutable view of the settings in effect right now
    pub async fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the settings atomically, returning the previous value
    pub async fn reconfigure(&self, settings: Settings) -> Result<Arc<Settings>> {
        settings.validate()?;
        let mut guard = self.current.write().await;
        let previous = std::mem::replace(&mut *guard, Arc::new(settings));
        tracing::info!(
            root = %guard.layout.root.display(),
            max_concurrent = guard.max_concurrent,
            "Settings reconfigured"
        );
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::for_root("/music/PLAYLISTS");
        assert_eq!(settings.max_concurrent, 10);
        assert_eq!(settings.search_results, 5);
        assert_eq!(settings.dedup, DedupPolicy::Off);
        assert_eq!(settings.worklist, PathBuf::from("/music/PLAYLISTS/songs.txt"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut settings = Settings::for_root("/music/PLAYLISTS");
        settings.max_concurrent = 0;
        assert!(SettingsHandle::new(settings).is_err());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reconfigure() {
        let handle = SettingsHandle::new(Settings::for_root("/a/PLAYLISTS")).unwrap();
        let before = handle.snapshot().await;

        let mut next = (*before).clone();
        next.max_concurrent = 3;
        let previous = handle.reconfigure(next).await.unwrap();

        assert_eq!(before.max_concurrent, 10);
        assert_eq!(previous.max_concurrent, 10);
        assert_eq!(handle.snapshot().await.max_concurrent, 3);
    }

    #[tokio::test]
    async fn test_invalid_reconfigure_keeps_current() {
        let handle = SettingsHandle::new(Settings::for_root("/a/PLAYLISTS")).unwrap();
        let mut bad = (*handle.snapshot().await).clone();
        bad.max_concurrent = 0;

        assert!(handle.reconfigure(bad).await.is_err());
        assert_eq!(handle.snapshot().await.max_concurrent, 10);
    }
}
