//! Domain types: tracks, pools, and the directory layout that ties them together

use crate::error::{Result, TuneError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory name of the Library pool under the playlists root
pub const LIBRARY_DIR_NAME: &str = "AllSongs";

/// Directory name of the Staging pool next to the playlists root
pub const STAGING_DIR_NAME: &str = "TempDownloads";

/// Extension of playlist index files
pub const PLAYLIST_EXTENSION: &str = "m3u";

/// Audio extensions recognised as tracks
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "m4a", "aac", "wav", "ogg", "opus", "wma", "aiff", "alac",
];

/// Check if a path is an audio file based on extension
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// One of the two physical locations a track can live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    /// Tracks with at least one playlist membership
    Library,
    /// Tracks with no playlist membership
    Staging,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Staging => write!(f, "staging"),
        }
    }
}

/// An audio file, identified by its path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Track {
    path: PathBuf,
}

impl Track {
    /// Wrap a path without validating its extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Wrap a path, rejecting anything outside the audio allow-list
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if is_audio_file(&path) {
            Ok(Self { path })
        } else {
            Err(TuneError::NotAudio(path))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem, used as the display name
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lower-cased extension
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stem())
    }
}

/// Where playlists and both pools live on disk
///
/// The playlists root is the base for every relative entry written into a
/// playlist file. Pools may live outside the root, in which case entries
/// carry `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLayout {
    pub root: PathBuf,
    pub library: PathBuf,
    pub staging: PathBuf,
}

impl PoolLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        library: impl Into<PathBuf>,
        staging: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root: paths::normalize(&root.into()),
            library: paths::normalize(&library.into()),
            staging: paths::normalize(&staging.into()),
        }
    }

    /// Default layout: `<root>/AllSongs` and `<root>/../TempDownloads`
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = paths::normalize(&root.into());
        let library = root.join(LIBRARY_DIR_NAME);
        let staging = root
            .parent()
            .map_or_else(|| root.join(STAGING_DIR_NAME), |p| p.join(STAGING_DIR_NAME));
        Self {
            root,
            library,
            staging,
        }
    }

    /// The pool a path belongs to, decided by its parent directory alone
    pub fn pool_of(&self, path: &Path) -> Option<Pool> {
        let parent = paths::normalize(path.parent()?);
        if parent == self.library {
            Some(Pool::Library)
        } else if parent == self.staging {
            Some(Pool::Staging)
        } else {
            None
        }
    }

    pub fn dir(&self, pool: Pool) -> &Path {
        match pool {
            Pool::Library => &self.library,
            Pool::Staging => &self.staging,
        }
    }

    /// Forward-slash entry for `path` relative to the playlists root
    pub fn relative_entry(&self, path: &Path) -> Result<String> {
        paths::relative_entry(&self.root, path).ok_or_else(|| TuneError::OutsideRoot {
            path: path.to_path_buf(),
            root: self.root.clone(),
        })
    }

    /// Absolute path a playlist entry points at
    pub fn resolve_entry(&self, entry: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in entry.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        paths::normalize(&path)
    }

    pub fn playlist_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{PLAYLIST_EXTENSION}"))
    }
}
