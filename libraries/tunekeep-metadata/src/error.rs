/// Metadata-specific errors
use thiserror::Error;

/// Result type alias using `MetadataError`
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Metadata error types
#[derive(Error, Debug)]
pub enum MetadataError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Tag writing error
    #[error("Tag writing error: {0}")]
    WriteError(String),

    /// ID3 error
    #[error(transparent)]
    Id3(#[from] id3::Error),

    /// Lofty error
    #[error(transparent)]
    Lofty(#[from] lofty::error::LoftyError),
}

impl From<MetadataError> for tunekeep_core::TuneError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::FileNotFound(path) => Self::NotFound(path.into()),
            other => Self::tag(other.to_string()),
        }
    }
}
