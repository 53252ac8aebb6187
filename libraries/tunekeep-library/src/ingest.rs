//! Folder ingestion
//!
//! Sorts a tree of per-playlist folders into the library. Each top-level
//! sub-folder of the source names a playlist; its audio files (at any depth)
//! are moved into the library and added to that playlist. Files directly in
//! the source root are ignored.

use crate::dedup::hash_file;
use crate::membership::MembershipEngine;
use crate::types::{IngestReport, IngestedFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};
use tunekeep_core::{is_audio_file, ContentHasher, Result, Track, TuneError};
use tunekeep_storage::validate_playlist_name;
use walkdir::WalkDir;

impl MembershipEngine {
    pub async fn ingest_folder(
        &self,
        source: &Path,
        hasher: Option<Arc<dyn ContentHasher>>,
    ) -> Result<IngestReport> {
        if !fs::try_exists(source).await? {
            return Err(TuneError::NotFound(source.to_path_buf()));
        }

        let root = source.to_path_buf();
        let candidates = tokio::task::spawn_blocking(move || scan_source(&root))
            .await
            .map_err(|e| TuneError::Io(std::io::Error::other(e)))?;
        info!(source = %source.display(), files = candidates.len(), "Found audio files to ingest");

        let mut report = IngestReport::default();
        for (path, playlist) in candidates {
            if let Err(e) = validate_playlist_name(&playlist) {
                report.skipped.push((path, e));
                continue;
            }

            let content_hash = match &hasher {
                Some(hasher) => match hash_file(Arc::clone(hasher), &path).await {
                    Ok(hash) => Some(hash),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                        report.skipped.push((path, e));
                        continue;
                    }
                },
                None => None,
            };

            let placed = match self.promote_unique(&Track::new(&path)).await {
                Ok(track) => track,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to move file into library");
                    report.skipped.push((path, e));
                    continue;
                }
            };

            for (name, result) in self
                .append_memberships(&placed, std::slice::from_ref(&playlist))
                .await?
            {
                if let Ok(true) = result {
                    info!(track = %placed, playlist = %name, "Added to playlist");
                }
            }
            if let Err(e) = self.retag(&placed, None, None).await {
                warn!(track = %placed, error = %e, "Failed to write tags");
            }

            report.imported.push(IngestedFile {
                source: path,
                track: placed,
                playlist,
                content_hash,
            });
        }

        info!(
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            "Folder ingestion finished"
        );
        Ok(report)
    }
}

/// Audio files below `root`, paired with their top-level folder name
fn scan_source(root: &Path) -> Vec<(PathBuf, String)> {
    let mut found = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(2)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Error walking ingest source");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_audio_file(path) {
            continue;
        }
        let playlist = path
            .strip_prefix(root)
            .ok()
            .and_then(|rel| rel.components().next())
            .map(|c| c.as_os_str().to_string_lossy().into_owned());
        if let Some(playlist) = playlist {
            found.push((path.to_path_buf(), playlist));
        }
    }

    found
}
