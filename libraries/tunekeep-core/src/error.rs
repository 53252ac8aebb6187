/// Core error types for Tunekeep
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `TuneError`
pub type Result<T> = std::result::Result<T, TuneError>;

/// Core error type for library, playlist, and tag operations
#[derive(Error, Debug)]
pub enum TuneError {
    /// The destination filename is already taken in the target pool
    #[error("Cannot move {from:?}: {to:?} already exists")]
    MoveConflict { from: PathBuf, to: PathBuf },

    /// A playlist with this name already exists
    #[error("Playlist already exists: {0}")]
    AlreadyExists(String),

    /// The file is no longer present
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),

    /// Neither UTF-8 nor Windows-1252 could decode the file
    #[error("Could not decode text file: {path:?}")]
    DecodeFallback { path: PathBuf },

    /// Playlist names must be plain file stems
    #[error("Invalid playlist name: {0:?}")]
    InvalidPlaylistName(String),

    /// The path does not carry an allow-listed audio extension
    #[error("Not an audio file: {0:?}")]
    NotAudio(PathBuf),

    /// The path cannot be expressed relative to the playlists root
    #[error("Path {path:?} cannot be made relative to {root:?}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// Tag container read/write failure
    #[error("Tag error: {0}")]
    Tag(String),

    /// Invalid runtime settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TuneError {
    /// Create a tag error
    pub fn tag(msg: impl Into<String>) -> Self {
        Self::Tag(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a move conflict error
    pub fn move_conflict(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self::MoveConflict {
            from: from.into(),
            to: to.into(),
        }
    }
}
