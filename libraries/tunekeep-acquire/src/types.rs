use crate::error::AcquireError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tunekeep_core::{Pool, Track};
use uuid::Uuid;

/// Watch URL for a search hit id
pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// What the extractor knows about one media item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    /// Output file after post-processing, when the tool reports it
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// One ranked result of a text search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub uploader: Option<String>,
    pub url: String,
}

/// A single download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionJob {
    pub id: Uuid,
    /// URL handed to the extractor
    pub url: String,
    /// Work-list line this job came from (the URL or the search query)
    pub origin_line: String,
    /// Target playlists; empty leaves the track in staging
    pub playlists: Vec<String>,
}

impl AcquisitionJob {
    pub fn new(url: impl Into<String>, origin_line: impl Into<String>, playlists: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            origin_line: origin_line.into(),
            playlists,
        }
    }

    /// Job whose work-list line is the URL itself
    pub fn for_url(url: impl Into<String>, playlists: Vec<String>) -> Self {
        let url = url.into();
        Self::new(url.clone(), url, playlists)
    }

    /// Job for the chosen hit of a text query
    pub fn for_hit(hit: &SearchHit, query: impl Into<String>, playlists: Vec<String>) -> Self {
        Self::new(hit.url.clone(), query, playlists)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Pending,
    Fetching,
    Tagging,
    Placing,
    PlaylistUpdating,
    Staged,
    Done,
    Failed,
}

impl JobStage {
    /// Nominal completion percentage reported at this stage
    pub fn percent(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Fetching => 10,
            Self::Tagging => 60,
            Self::Placing => 80,
            Self::PlaylistUpdating | Self::Staged => 90,
            Self::Done | Self::Failed => 100,
        }
    }

}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Tagging => "tagging",
            Self::Placing => "placing",
            Self::PlaylistUpdating => "updating playlists",
            Self::Staged => "staged",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Stage transition sent to the progress sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_id: Uuid,
    /// Originating work-list line
    pub input: String,
    pub stage: JobStage,
    pub percent: u8,
    pub message: String,
}

/// Final state of a job
#[derive(Debug)]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub input: String,
    /// `Done` or `Failed`
    pub state: JobStage,
    /// Where the file ended up
    pub track: Option<Track>,
    /// Pool holding `track`
    pub pool: Option<Pool>,
    /// Playlists the track was successfully added to
    pub playlists: Vec<String>,
    pub error: Option<AcquireError>,
    /// Set when hashing is enabled
    pub content_hash: Option<String>,
    /// Library tracks with identical content
    pub duplicates: Vec<Track>,
}

impl JobOutcome {
    pub(crate) fn failed(job: &AcquisitionJob, error: AcquireError) -> Self {
        Self {
            job_id: job.id,
            input: job.origin_line.clone(),
            state: JobStage::Failed,
            track: None,
            pool: None,
            playlists: Vec::new(),
            error: Some(error),
            content_hash: None,
            duplicates: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == JobStage::Done
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.track, self.pool) {
            (Some(e), _, _) => write!(f, "{}: {}", self.input, e),
            (None, Some(track), Some(Pool::Staging)) => {
                write!(f, "{}: saved {} to staging", self.input, track.file_name())
            }
            (None, Some(track), _) if self.playlists.is_empty() => write!(
                f,
                "{}: moved {} to the library but no playlist could be updated",
                self.input,
                track.file_name()
            ),
            (None, Some(track), _) => write!(
                f,
                "{}: added {} to {}",
                self.input,
                track.file_name(),
                self.playlists.join(", ")
            ),
            (None, None, _) => write!(f, "{}: {}", self.input, self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_info_from_partial_json() {
        let info: MediaInfo = serde_json::from_str(r#"{"id": "abc", "title": "Song", "unknown": 1}"#).unwrap();
        assert_eq!(info.id, "abc");
        assert_eq!(info.uploader, None);
        assert_eq!(info.file, None);
    }

    #[test]
    fn test_job_for_url_uses_url_as_line() {
        let job = AcquisitionJob::for_url("https://youtu.be/x", vec![]);
        assert_eq!(job.origin_line, "https://youtu.be/x");
        assert_eq!(watch_url("x"), "https://www.youtube.com/watch?v=x");
    }

    fn done(track: &str, pool: Pool, playlists: &[&str]) -> JobOutcome {
        let job = AcquisitionJob::for_url("url", vec![]);
        JobOutcome {
            state: JobStage::Done,
            track: Some(Track::new(track)),
            pool: Some(pool),
            playlists: playlists.iter().map(|p| p.to_string()).collect(),
            error: None,
            ..JobOutcome::failed(&job, AcquireError::Task("unused".into()))
        }
    }

    #[test]
    fn test_outcome_wording_follows_pool() {
        let staged = done("/S/a.mp3", Pool::Staging, &[]);
        assert_eq!(staged.to_string(), "url: saved a.mp3 to staging");

        let added = done("/L/a.mp3", Pool::Library, &["Rock", "Chill"]);
        assert_eq!(added.to_string(), "url: added a.mp3 to Rock, Chill");

        let orphaned = done("/L/a.mp3", Pool::Library, &[]);
        assert_eq!(
            orphaned.to_string(),
            "url: moved a.mp3 to the library but no playlist could be updated"
        );
    }
}
