//! Acquisition pipeline
//!
//! Each job walks Pending → Fetching → Tagging → (Placing →
//! PlaylistUpdating | Staged) → Done, or drops to Failed from any stage.
//! Only Fetching is bounded by the admission gate; the rest of a job runs
//! as soon as its download is on disk.

use crate::error::{AcquireError, Result};
use crate::extractor::Extractor;
use crate::thumbnail::ThumbnailSource;
use crate::types::{AcquisitionJob, JobOutcome, JobProgress, JobStage, MediaInfo, SearchHit};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tunekeep_core::naming::sanitize_file_stem;
use tunekeep_core::{ContentHasher, CoverArt, DedupPolicy, Pool, Settings, Track};
use tunekeep_library::{DuplicateFinder, MembershipEngine};
use tunekeep_storage::{move_unique, WorkItem, Worklist};

/// Downloads media and files it into the library
#[derive(Clone)]
pub struct AcquisitionPipeline {
    engine: Arc<MembershipEngine>,
    extractor: Arc<dyn Extractor>,
    thumbnails: Arc<dyn ThumbnailSource>,
    progress: Option<mpsc::Sender<JobProgress>>,
    duplicates: Arc<DuplicateFinder>,
    worklist: Arc<Mutex<Option<Arc<Worklist>>>>,
    /// Serializes pick-a-free-name-then-move steps across jobs
    placement: Arc<Mutex<()>>,
}

impl AcquisitionPipeline {
    pub fn new(
        engine: Arc<MembershipEngine>,
        extractor: Arc<dyn Extractor>,
        thumbnails: Arc<dyn ThumbnailSource>,
    ) -> Self {
        Self {
            engine,
            extractor,
            thumbnails,
            progress: None,
            duplicates: Arc::new(DuplicateFinder::sha256()),
            worklist: Arc::new(Mutex::new(None)),
            placement: Arc::new(Mutex::new(())),
        }
    }

    /// Send stage transitions to `sink`
    ///
    /// The receiver must be drained; a full channel holds the job back.
    pub fn with_progress(mut self, sink: mpsc::Sender<JobProgress>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Hash with `hasher` instead of SHA-256 when duplicate reports are on
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.duplicates = Arc::new(DuplicateFinder::new(hasher));
        self
    }

    pub fn engine(&self) -> &Arc<MembershipEngine> {
        &self.engine
    }

    // ===== Lookups =====

    /// Ranked hits for a text query, as many as the settings allow
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let settings = self.engine.settings().snapshot().await;
        self.extractor.search(query, settings.search_results).await
    }

    /// Title of a URL without downloading it
    pub async fn resolve_title(&self, url: &str) -> Result<String> {
        Ok(self.extractor.resolve(url).await?.title)
    }

    // ===== Work-list =====

    /// Items still waiting in the work-list
    pub async fn pending(&self) -> Result<Vec<WorkItem>> {
        let settings = self.engine.settings().snapshot().await;
        Ok(self.worklist(&settings).await.load().await?)
    }

    /// Turn the work-list into jobs without target playlists
    ///
    /// Queries take their first hit. Queries without hits, or whose search
    /// fails, are discarded.
    pub async fn plan_worklist(&self) -> Result<Vec<AcquisitionJob>> {
        let mut jobs = Vec::new();
        for item in self.pending().await? {
            match item {
                WorkItem::Url(url) => jobs.push(AcquisitionJob::for_url(url, Vec::new())),
                WorkItem::Query(query) => match self.search(&query).await {
                    Ok(hits) => match hits.first() {
                        Some(hit) => {
                            info!(query = %query, title = %hit.title, "Picked first search hit");
                            jobs.push(AcquisitionJob::for_hit(hit, query.as_str(), Vec::new()));
                        }
                        None => {
                            self.discard(&query, "no results").await?;
                        }
                    },
                    Err(e) => {
                        self.discard(&query, &e.to_string()).await?;
                    }
                },
            }
        }
        Ok(jobs)
    }

    /// Drop a work-list line that never became a job
    pub async fn discard(&self, line: &str, reason: &str) -> Result<usize> {
        warn!(line = %line, reason = %reason, "Dropping work-list item");
        let settings = self.engine.settings().snapshot().await;
        Ok(self.worklist(&settings).await.consume(line).await?)
    }

    async fn worklist(&self, settings: &Settings) -> Arc<Worklist> {
        let mut slot = self.worklist.lock().await;
        if let Some(current) = slot.as_ref() {
            if current.path() == settings.worklist.as_path() {
                return Arc::clone(current);
            }
        }
        let worklist = Arc::new(Worklist::new(&settings.worklist));
        *slot = Some(Arc::clone(&worklist));
        worklist
    }

    // ===== Jobs =====

    /// Run all jobs concurrently, one outcome per job in submission order
    pub async fn run(&self, jobs: Vec<AcquisitionJob>) -> Vec<JobOutcome> {
        let settings = self.engine.settings().snapshot().await;
        let gate = Arc::new(Semaphore::new(settings.max_concurrent));
        info!(
            jobs = jobs.len(),
            max_concurrent = settings.max_concurrent,
            "Starting acquisition batch"
        );

        let mut tasks = JoinSet::new();
        for (index, job) in jobs.iter().enumerate() {
            let pipeline = self.clone();
            let job = job.clone();
            let settings = Arc::clone(&settings);
            let gate = Arc::clone(&gate);
            tasks.spawn(async move { (index, pipeline.process(job, settings, gate).await) });
        }

        let mut outcomes: Vec<Option<JobOutcome>> = jobs.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!(error = %e, "Acquisition task failed"),
            }
        }

        let mut results = Vec::with_capacity(jobs.len());
        for (job, outcome) in jobs.iter().zip(outcomes) {
            match outcome {
                Some(outcome) => results.push(outcome),
                None => {
                    let err = AcquireError::Task("job did not complete".to_string());
                    self.report(job, JobStage::Failed, err.to_string()).await;
                    self.consume_line(&settings, &job.origin_line).await;
                    results.push(JobOutcome::failed(job, err));
                }
            }
        }

        let done = results.iter().filter(|o| o.is_done()).count();
        info!(done, failed = results.len() - done, "Acquisition batch finished");
        results
    }

    /// Run a single job and consume its work-list line
    async fn process(
        &self,
        job: AcquisitionJob,
        settings: Arc<Settings>,
        gate: Arc<Semaphore>,
    ) -> JobOutcome {
        self.report(&job, JobStage::Pending, "Queued").await;

        let outcome = match self.execute(&job, &settings, &gate).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(job = %job.id, input = %job.origin_line, error = %e, "Acquisition failed");
                self.report(&job, JobStage::Failed, e.to_string()).await;
                JobOutcome::failed(&job, e)
            }
        };

        self.consume_line(&settings, &job.origin_line).await;
        outcome
    }

    async fn execute(
        &self,
        job: &AcquisitionJob,
        settings: &Settings,
        gate: &Semaphore,
    ) -> Result<JobOutcome> {
        let staging = settings.layout.dir(Pool::Staging);

        let info = {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| AcquireError::Task(e.to_string()))?;
            self.report(job, JobStage::Fetching, format!("Downloading {}", job.url))
                .await;
            self.extractor.download(&job.url, staging).await?
        };

        let staged = {
            let _placing = self.placement.lock().await;
            let source = locate_download(&info, staging, &settings.audio_format).await?;
            rename_to_title(&source, &info.title, staging).await?
        };
        info!(job = %job.id, track = %staged, "Downloaded");

        self.report(job, JobStage::Tagging, "Fetching cover").await;
        let cover = self.fetch_cover(&info).await;
        let (content_hash, duplicates) = self.check_duplicates(settings, &staged).await;

        let mut outcome = JobOutcome {
            job_id: job.id,
            input: job.origin_line.clone(),
            state: JobStage::Done,
            track: None,
            pool: None,
            playlists: Vec::new(),
            error: None,
            content_hash,
            duplicates,
        };

        if job.playlists.is_empty() {
            self.tag(&staged, cover, info.uploader.clone()).await;
            self.report(
                job,
                JobStage::Staged,
                format!("Saved {} to staging", staged.file_name()),
            )
            .await;
            outcome.track = Some(staged);
            outcome.pool = Some(Pool::Staging);
            self.report(job, JobStage::Done, "Complete").await;
            return Ok(outcome);
        }

        self.report(job, JobStage::Placing, "Moving into library").await;
        let placed = {
            let _placing = self.placement.lock().await;
            self.engine.promote_unique(&staged).await?
        };

        self.report(job, JobStage::PlaylistUpdating, "Updating playlists")
            .await;
        for (name, result) in self
            .engine
            .append_memberships(&placed, &job.playlists)
            .await?
        {
            if result.is_ok() {
                info!(track = %placed, playlist = %name, "Added to playlist");
                outcome.playlists.push(name);
            }
        }

        self.tag(&placed, cover, info.uploader.clone()).await;
        outcome.track = Some(placed);
        outcome.pool = Some(Pool::Library);
        self.report(job, JobStage::Done, "Complete").await;
        Ok(outcome)
    }

    /// Best-effort cover download
    async fn fetch_cover(&self, info: &MediaInfo) -> Option<CoverArt> {
        let Some(url) = info.thumbnail.as_deref() else {
            debug!(id = %info.id, "No thumbnail available");
            return None;
        };
        match self.thumbnails.fetch(url).await {
            Ok(cover) => Some(cover),
            Err(e) => {
                warn!(id = %info.id, error = %e, "Failed to download thumbnail");
                None
            }
        }
    }

    async fn check_duplicates(
        &self,
        settings: &Settings,
        track: &Track,
    ) -> (Option<String>, Vec<Track>) {
        if settings.dedup == DedupPolicy::Off {
            return (None, Vec::new());
        }

        let library: Vec<Track> = match self.engine.all_tracks().await {
            Ok(tracks) => tracks
                .into_iter()
                .filter(|t| settings.layout.pool_of(t.path()) == Some(Pool::Library))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Could not list library for duplicate check");
                Vec::new()
            }
        };

        match self.duplicates.duplicates_of(track.path(), &library).await {
            Ok((hash, duplicates)) => {
                for duplicate in &duplicates {
                    warn!(track = %track, duplicate = %duplicate, "Same content already in library");
                }
                (Some(hash), duplicates)
            }
            Err(e) => {
                warn!(track = %track, error = %e, "Could not hash download");
                (None, Vec::new())
            }
        }
    }

    async fn tag(&self, track: &Track, cover: Option<CoverArt>, artist: Option<String>) {
        if let Err(e) = self.engine.retag(track, cover, artist).await {
            warn!(track = %track, error = %e, "Failed to tag download");
        }
    }

    async fn consume_line(&self, settings: &Settings, line: &str) {
        let worklist = self.worklist(settings).await;
        match worklist.consume(line).await {
            Ok(0) => debug!(line = %line, "Line not present in work-list"),
            Ok(removed) => debug!(line = %line, removed, "Removed line from work-list"),
            Err(e) => warn!(line = %line, error = %e, "Failed to update work-list"),
        }
    }

    async fn report(&self, job: &AcquisitionJob, stage: JobStage, message: impl Into<String>) {
        let Some(sink) = &self.progress else {
            return;
        };
        let progress = JobProgress {
            job_id: job.id,
            input: job.origin_line.clone(),
            stage,
            percent: stage.percent(),
            message: message.into(),
        };
        if sink.send(progress).await.is_err() {
            debug!(job = %job.id, "Progress receiver dropped");
        }
    }
}

/// Find the file a successful download produced
///
/// Tries the path the extractor reported, then `<id>.<format>` in staging,
/// then the newest staging file whose name contains the title.
async fn locate_download(info: &MediaInfo, staging: &Path, audio_format: &str) -> Result<PathBuf> {
    if let Some(file) = &info.file {
        if fs::try_exists(file).await? {
            return Ok(file.clone());
        }
    }

    if !info.id.is_empty() {
        let expected = staging.join(format!("{}.{}", info.id, audio_format));
        if fs::try_exists(&expected).await? {
            return Ok(expected);
        }
    }

    if let Some(found) = newest_matching(staging, &info.title).await? {
        return Ok(found);
    }

    Err(AcquireError::FileNotLocated {
        id: info.id.clone(),
        dir: staging.to_path_buf(),
    })
}

async fn newest_matching(dir: &Path, title: &str) -> Result<Option<PathBuf>> {
    let needle = title.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(None);
    }

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await? {
        if !entry
            .file_name()
            .to_string_lossy()
            .to_lowercase()
            .contains(&needle)
        {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, entry.path()));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Rename a staged download after its title, uniquified within staging
async fn rename_to_title(source: &Path, title: &str, staging: &Path) -> Result<Track> {
    let current = Track::new(source);
    if title.trim().is_empty() {
        return Ok(current);
    }

    let stem = sanitize_file_stem(title);
    if current.stem() == stem && source.parent() == Some(staging) {
        return Ok(current);
    }

    let file_name = match current.extension() {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    };
    let dest = move_unique(source, staging, &file_name).await?;
    Ok(Track::new(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_locate_prefers_reported_file() {
        let dir = TempDir::new().unwrap();
        let reported = dir.path().join("reported.mp3");
        std::fs::write(&reported, b"x").unwrap();
        std::fs::write(dir.path().join("id1.mp3"), b"x").unwrap();

        let info = MediaInfo {
            id: "id1".into(),
            file: Some(reported.clone()),
            ..Default::default()
        };
        assert_eq!(locate_download(&info, dir.path(), "mp3").await.unwrap(), reported);
    }

    #[tokio::test]
    async fn test_locate_falls_back_to_id_then_title() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Some Title [x].mp3"), b"x").unwrap();

        let by_title = MediaInfo {
            id: "missing".into(),
            title: "some title".into(),
            file: Some(dir.path().join("gone.mp3")),
            ..Default::default()
        };
        assert_eq!(
            locate_download(&by_title, dir.path(), "mp3").await.unwrap(),
            dir.path().join("Some Title [x].mp3")
        );

        std::fs::write(dir.path().join("missing.mp3"), b"x").unwrap();
        assert_eq!(
            locate_download(&by_title, dir.path(), "mp3").await.unwrap(),
            dir.path().join("missing.mp3")
        );
    }

    #[tokio::test]
    async fn test_locate_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let info = MediaInfo {
            id: "nothing".into(),
            title: "Nowhere".into(),
            ..Default::default()
        };
        let err = locate_download(&info, dir.path(), "mp3").await.unwrap_err();
        assert!(matches!(err, AcquireError::FileNotLocated { .. }));
    }

    #[tokio::test]
    async fn test_rename_to_title_uniquifies() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Song_ Live.mp3"), b"old").unwrap();
        let source = dir.path().join("abc.mp3");
        std::fs::write(&source, b"new").unwrap();

        let track = rename_to_title(&source, "Song: Live", dir.path()).await.unwrap();
        assert_eq!(track.path(), dir.path().join("Song_ Live (2).mp3"));
        assert!(!source.exists());
    }
}
