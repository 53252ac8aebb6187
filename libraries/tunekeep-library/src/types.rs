//! Result types reported by engine operations

use std::path::PathBuf;
use tunekeep_core::{Pool, Result, Track, TuneError};

/// Outcome of a membership change for one track
#[derive(Debug)]
pub struct TrackUpdate {
    /// Where the track ended up
    pub track: Track,
    pub pool: Option<Pool>,
    /// Playlists the track belongs to afterwards
    pub playlists: Vec<String>,
    pub result: Result<()>,
}

impl TrackUpdate {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of an orphan reconciliation pass
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Tracks moved to staging, at their new location
    pub moved: Vec<Track>,
    /// Tracks left in the library because the staging name was taken
    pub skipped: Vec<Track>,
    pub failed: Vec<(Track, TuneError)>,
}

/// Result of repairing one playlist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub playlist: String,
    pub kept: usize,
    /// Entries dropped because their file is missing or they were duplicates
    pub removed: Vec<String>,
}

/// A file sorted into the library by folder ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    pub source: PathBuf,
    pub track: Track,
    pub playlist: String,
    pub content_hash: Option<String>,
}

/// Summary of a folder ingestion pass
#[derive(Debug, Default)]
pub struct IngestReport {
    pub imported: Vec<IngestedFile>,
    pub skipped: Vec<(PathBuf, TuneError)>,
}
