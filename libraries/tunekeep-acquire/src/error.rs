/// Acquisition error types
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tunekeep_core::TuneError;

/// Result type alias using `AcquireError`
pub type Result<T> = std::result::Result<T, AcquireError>;

/// Why the extraction tool gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionKind {
    /// Removed, private, or region-locked media
    Unavailable,
    /// The tool has no extractor for this URL
    UnsupportedUrl,
    /// Audio conversion failed, usually because ffmpeg is missing
    ConverterMissing,
    Other,
}

impl ExtractionKind {
    /// Classify a failure from the tool's error output
    pub fn classify(stderr: &str) -> Self {
        if stderr.contains("Video unavailable") {
            Self::Unavailable
        } else if stderr.contains("Unsupported URL") {
            Self::UnsupportedUrl
        } else if stderr.to_lowercase().contains("ffmpeg") {
            Self::ConverterMissing
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "video is unavailable or private"),
            Self::UnsupportedUrl => write!(f, "unsupported URL format"),
            Self::ConverterMissing => write!(f, "audio conversion failed, ensure ffmpeg is installed"),
            Self::Other => write!(f, "download failed"),
        }
    }
}

/// Errors raised while acquiring a track
#[derive(Error, Debug)]
pub enum AcquireError {
    /// Remote fetch or search failed
    #[error("Extraction failed ({kind}): {message}")]
    ExtractionFailed { kind: ExtractionKind, message: String },

    /// The fetch reported success but no output file could be found
    #[error("Could not locate downloaded file for {id:?} in {dir:?}")]
    FileNotLocated { id: String, dir: PathBuf },

    #[error("Thumbnail fetch failed: {0}")]
    Thumbnail(String),

    /// Extractor printed something that is not the expected JSON
    #[error("Unexpected extractor output: {0}")]
    Parse(#[from] serde_json::Error),

    /// A job task panicked or was aborted
    #[error("Job task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Library(#[from] TuneError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AcquireError {
    /// Create an extraction error from the tool's stderr
    pub fn extraction(stderr: &str) -> Self {
        let message = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no error output")
            .trim()
            .to_string();
        Self::ExtractionFailed {
            kind: ExtractionKind::classify(stderr),
            message,
        }
    }

    /// Extraction kind, if this is an extraction failure
    pub fn extraction_kind(&self) -> Option<ExtractionKind> {
        match self {
            Self::ExtractionFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
