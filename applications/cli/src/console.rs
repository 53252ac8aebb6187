//! Interactive console
//!
//! Every flow prints one status line per item it touched. Input comes from
//! any async line reader so flows can be driven from tests.

use crate::selection::{parse_choice, parse_indices, pick};
use anyhow::Result;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tunekeep_acquire::{AcquisitionJob, AcquisitionPipeline, JobOutcome, JobProgress, JobStage, SearchHit};
use tunekeep_core::settings::DEFAULT_WORKLIST_NAME;
use tunekeep_core::{ContentHasher, DedupPolicy, PoolLayout, Track, TuneError};
use tunekeep_library::{MembershipEngine, ReconcileReport, Sha256Hasher, TrackUpdate};
use tunekeep_metadata::read_tag_summary;
use tunekeep_storage::WorkItem;

/// Columns used when listing playlists for download targets
const PLAYLIST_COLUMNS: usize = 3;

enum HitChoice {
    Picked(SearchHit),
    Skipped,
    /// Search failed or came back empty; the line can be dropped
    Unavailable(String),
}

pub struct Console<R> {
    engine: Arc<MembershipEngine>,
    pipeline: AcquisitionPipeline,
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> Console<R> {
    pub fn new(pipeline: AcquisitionPipeline, input: R) -> Self {
        Self {
            engine: Arc::clone(pipeline.engine()),
            pipeline,
            lines: input.lines(),
        }
    }

    /// Print `text` and read one trimmed line; `None` at end of input
    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        print!("{text}");
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    pub async fn run_menu(&mut self) -> Result<()> {
        loop {
            println!("\nMain Menu:");
            println!("1. Song Changer - Search all songs, manage playlists");
            println!("2. Playlist Cleanse - Remove songs from a specific playlist");
            println!("3. Playlist Bulk - Add songs to a playlist with multiple queries");
            println!("4. Download - Fetch a song or work through the song list");
            println!("5. Reconcile - Move songs without playlists to staging");
            println!("6. Repair - Drop playlist entries whose files are gone");
            println!("7. Settings");

            let Some(choice) = self.prompt("Choose option (1-7, or 'q' to quit): ").await? else {
                break;
            };
            match choice.to_lowercase().as_str() {
                "q" => break,
                "1" => self.manage(None).await?,
                "2" => self.cleanse().await?,
                "3" => self.bulk().await?,
                "4" => self.download_menu().await?,
                "5" => self.reconcile().await?,
                "6" => self.repair().await?,
                "7" => self.settings().await?,
                _ => println!("Invalid choice."),
            }
        }
        Ok(())
    }

    // ===== Song changer =====

    /// Search tracks and edit their memberships, starting with `initial` if given
    pub async fn manage(&mut self, initial: Option<String>) -> Result<()> {
        let mut pending = initial;
        loop {
            let term = match pending.take() {
                Some(term) => term,
                None => match self.prompt("\nEnter search term (or 'q' to quit): ").await? {
                    Some(term) => term,
                    None => return Ok(()),
                },
            };
            if term.eq_ignore_ascii_case("q") {
                return Ok(());
            }
            if term.is_empty() {
                continue;
            }

            let matches = self.engine.find_tracks(&term).await?;
            if matches.is_empty() {
                println!("No matches found.");
                continue;
            }

            println!("\nMatches:");
            self.list_tracks(&matches).await;

            let Some(choice) = self
                .prompt("Choose numbers (comma/space separated, 0=cancel): ")
                .await?
            else {
                return Ok(());
            };
            let chosen = pick(&matches, &parse_indices(&choice, matches.len()));
            if chosen.is_empty() {
                continue;
            }

            println!("\nSelected songs:");
            for track in &chosen {
                println!(" - {}", track.file_name());
            }
            self.edit_memberships(&chosen).await?;
        }
    }

    async fn edit_memberships(&mut self, chosen: &[Track]) -> Result<()> {
        let mut playlists = self.show_marked_playlists(chosen).await?;
        println!("\nType numbers (comma/space separated) for playlists to KEEP (applies to all songs)");
        println!("Or 'n' to create a new playlist, 'c' to clear all playlists, 'd' to delete selected songs, '0' to cancel.");

        loop {
            let Some(input) = self.prompt("> ").await? else {
                return Ok(());
            };
            match input.to_lowercase().as_str() {
                "" | "0" => return Ok(()),
                "n" => {
                    if self.create_playlist().await?.is_some() {
                        playlists = self.show_marked_playlists(chosen).await?;
                    }
                }
                "c" => {
                    let updates = self.engine.clear_memberships(chosen).await?;
                    print_updates(&updates);
                    return Ok(());
                }
                "d" => {
                    let confirm = self
                        .prompt("Are you sure you want to DELETE these songs? (y/n): ")
                        .await?;
                    if confirm.is_some_and(|c| c.eq_ignore_ascii_case("y")) {
                        for track in chosen {
                            match self.engine.delete_track(track).await {
                                Ok(removed) if removed.is_empty() => {
                                    println!("✓ Deleted {}", track.file_name());
                                }
                                Ok(removed) => println!(
                                    "✓ Deleted {} (removed from {})",
                                    track.file_name(),
                                    removed.join(", ")
                                ),
                                Err(e) => println!("✗ {}: {}", track.file_name(), e),
                            }
                        }
                    }
                    return Ok(());
                }
                other => {
                    let indices = parse_indices(other, playlists.len());
                    if indices.is_empty() {
                        println!("Invalid input.");
                        continue;
                    }
                    let names = pick(&playlists, &indices);
                    let updates = self.engine.set_memberships(chosen, &names).await?;
                    print_updates(&updates);
                    return Ok(());
                }
            }
        }
    }

    async fn show_marked_playlists(&self, chosen: &[Track]) -> Result<Vec<String>> {
        let all = self.engine.list_playlists().await?;
        let mut current = BTreeSet::new();
        for track in chosen {
            current.extend(self.engine.playlists_of(track).await?);
        }

        println!("\nAvailable playlists:");
        for (i, name) in all.iter().enumerate() {
            let mark = if current.contains(name) { "✓" } else { " " };
            println!(" {}. [{}] {}", i + 1, mark, name);
        }
        Ok(all)
    }

    // ===== Playlist cleanse / bulk =====

    pub async fn cleanse(&mut self) -> Result<()> {
        let Some(playlist) = self.choose_one_playlist().await? else {
            return Ok(());
        };

        let mut tracks = self.engine.tracks_in_playlist(&playlist).await?;
        if tracks.is_empty() {
            println!("No songs in playlist {playlist}.");
            return Ok(());
        }
        tracks.sort_by_key(|t| t.file_name().to_lowercase());

        println!("\nSongs in {playlist} (alphabetical):");
        self.list_tracks(&tracks).await;

        let Some(choice) = self
            .prompt("Choose songs to remove (comma/space separated, 0=cancel): ")
            .await?
        else {
            return Ok(());
        };
        let chosen = pick(&tracks, &parse_indices(&choice, tracks.len()));
        if chosen.is_empty() {
            return Ok(());
        }

        let updates = self.engine.remove_from_playlist(&playlist, &chosen).await?;
        let removed = updates.iter().filter(|u| u.is_ok()).count();
        println!("Removed {removed} songs from {playlist}");
        print_updates(&updates);
        Ok(())
    }

    pub async fn bulk(&mut self) -> Result<()> {
        let Some(playlist) = self.choose_one_playlist().await? else {
            return Ok(());
        };
        println!("\nAdding songs to {playlist}. Enter '0' to finish.");

        loop {
            let Some(term) = self.prompt("Enter search term (0 to finish): ").await? else {
                return Ok(());
            };
            if term == "0" {
                return Ok(());
            }
            if term.is_empty() {
                continue;
            }

            let matches = self.engine.find_tracks(&term).await?;
            if matches.is_empty() {
                println!("No matches found.");
                continue;
            }
            println!("\nMatches:");
            self.list_tracks(&matches).await;

            let Some(choice) = self
                .prompt("Choose songs to add (comma/space separated, 0=cancel): ")
                .await?
            else {
                return Ok(());
            };
            let chosen = pick(&matches, &parse_indices(&choice, matches.len()));
            if chosen.is_empty() {
                continue;
            }

            let updates = self.engine.add_to_playlist(&playlist, &chosen).await?;
            print_updates(&updates);
        }
    }

    async fn choose_one_playlist(&mut self) -> Result<Option<String>> {
        let all = self.engine.list_playlists().await?;
        if all.is_empty() {
            println!("No playlists found.");
            return Ok(None);
        }

        println!("\nAvailable playlists:");
        for (i, name) in all.iter().enumerate() {
            println!(" {}. {}", i + 1, name);
        }

        let Some(choice) = self.prompt("Choose playlist number (0=cancel): ").await? else {
            return Ok(None);
        };
        if choice.is_empty() || choice == "0" {
            return Ok(None);
        }
        match parse_choice(&choice, all.len()) {
            Some(index) => Ok(all.get(index).cloned()),
            None => {
                println!("Invalid choice.");
                Ok(None)
            }
        }
    }

    async fn create_playlist(&mut self) -> Result<Option<String>> {
        let Some(name) = self.prompt("Enter new playlist name: ").await? else {
            return Ok(None);
        };
        if name.is_empty() {
            return Ok(None);
        }
        match self.engine.create_playlist(&name).await {
            Ok(()) => {
                println!("✓ Created playlist {name}");
                Ok(Some(name))
            }
            Err(TuneError::AlreadyExists(_)) => {
                println!("Playlist {name} already exists");
                Ok(Some(name))
            }
            Err(e) => {
                println!("✗ Could not create playlist: {e}");
                Ok(None)
            }
        }
    }

    // ===== Download =====

    async fn download_menu(&mut self) -> Result<()> {
        let Some(choice) = self
            .prompt("Do you want to (1) input a single song/query or (2) use the song list? ")
            .await?
        else {
            return Ok(());
        };
        if choice == "1" {
            match self.prompt("Enter URL or search query: ").await? {
                Some(input) if !input.is_empty() => self.download_input(&input, &[]).await,
                _ => Ok(()),
            }
        } else {
            self.download_worklist(false, &[]).await
        }
    }

    /// Download one URL or the chosen hit of one query
    pub async fn download_input(&mut self, input: &str, preset: &[String]) -> Result<()> {
        let job = match WorkItem::parse(input) {
            None => return Ok(()),
            Some(WorkItem::Url(url)) => {
                match self.pipeline.resolve_title(&url).await {
                    Ok(title) => println!("Processing: {title}"),
                    Err(e) => {
                        println!("✗ {url}: {e}");
                        return Ok(());
                    }
                }
                let playlists = self.playlists_or_prompt(preset).await?;
                AcquisitionJob::for_url(url, playlists)
            }
            Some(WorkItem::Query(query)) => match self.choose_hit(&query).await? {
                HitChoice::Picked(hit) => {
                    let playlists = self.playlists_or_prompt(preset).await?;
                    AcquisitionJob::for_hit(&hit, query, playlists)
                }
                HitChoice::Skipped | HitChoice::Unavailable(_) => return Ok(()),
            },
        };
        self.run_jobs(vec![job]).await
    }

    /// Work through the song list
    ///
    /// With `auto`, every line is fetched without prompting: no playlists
    /// unless `preset` names some, and the first hit for queries.
    pub async fn download_worklist(&mut self, auto: bool, preset: &[String]) -> Result<()> {
        if auto {
            let mut jobs = self.pipeline.plan_worklist().await?;
            for job in &mut jobs {
                job.playlists = preset.to_vec();
            }
            return self.run_jobs(jobs).await;
        }

        let items = self.pipeline.pending().await?;
        if items.is_empty() {
            println!("Song list is empty; nothing to do.");
            return Ok(());
        }

        let mut jobs = Vec::new();
        for item in items {
            match item {
                WorkItem::Url(url) => {
                    let title = match self.pipeline.resolve_title(&url).await {
                        Ok(title) => title,
                        Err(e) => {
                            debug!(url = %url, error = %e, "Could not resolve title");
                            url.clone()
                        }
                    };
                    println!("\nProcessing: {title}");
                    let playlists = self.playlists_or_prompt(preset).await?;
                    jobs.push(AcquisitionJob::for_url(url, playlists));
                }
                WorkItem::Query(query) => match self.choose_hit(&query).await? {
                    HitChoice::Picked(hit) => {
                        let playlists = self.playlists_or_prompt(preset).await?;
                        jobs.push(AcquisitionJob::for_hit(&hit, query, playlists));
                    }
                    HitChoice::Skipped => {}
                    HitChoice::Unavailable(reason) => {
                        self.pipeline.discard(&query, &reason).await?;
                    }
                },
            }
        }
        self.run_jobs(jobs).await
    }

    async fn choose_hit(&mut self, query: &str) -> Result<HitChoice> {
        let hits = match self.pipeline.search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                println!("✗ Search failed for {query}: {e}");
                return Ok(HitChoice::Unavailable(e.to_string()));
            }
        };
        if hits.is_empty() {
            println!("\nNo results for: {query}");
            return Ok(HitChoice::Unavailable("no results".to_string()));
        }

        println!("\nResults for: {query}");
        for (i, hit) in hits.iter().enumerate() {
            let uploader = hit.uploader.as_deref().unwrap_or("Unknown");
            println!("{}. {} - {}", i + 1, hit.title, uploader);
            println!("   {}", hit.url);
        }

        let Some(choice) = self.prompt("Choose number to download (0=skip): ").await? else {
            return Ok(HitChoice::Skipped);
        };
        Ok(match parse_choice(&choice, hits.len()) {
            Some(index) => HitChoice::Picked(hits[index].clone()),
            None => HitChoice::Skipped,
        })
    }

    async fn playlists_or_prompt(&mut self, preset: &[String]) -> Result<Vec<String>> {
        if preset.is_empty() {
            self.choose_playlists().await
        } else {
            Ok(preset.to_vec())
        }
    }

    /// Multi-choice playlist picker with a trailing "create new" entry
    async fn choose_playlists(&mut self) -> Result<Vec<String>> {
        let all = self.engine.list_playlists().await?;

        println!("\nAvailable playlists:");
        for (i, name) in all.iter().enumerate() {
            print!("{:2}. {:<30} ", i + 1, display_name(name));
            if (i + 1) % PLAYLIST_COLUMNS == 0 {
                println!();
            }
        }
        println!("\n{:2}. + Create new playlist", all.len() + 1);

        let Some(choice) = self
            .prompt("Choose playlist numbers (comma/space separated, 0=skip): ")
            .await?
        else {
            return Ok(Vec::new());
        };

        let mut chosen = Vec::new();
        for index in parse_indices(&choice, all.len() + 1) {
            if index == all.len() {
                if let Some(name) = self.create_playlist().await? {
                    chosen.push(name);
                }
            } else if let Some(name) = all.get(index) {
                chosen.push(name.clone());
            }
        }
        Ok(chosen)
    }

    async fn run_jobs(&self, jobs: Vec<AcquisitionJob>) -> Result<()> {
        if jobs.is_empty() {
            println!("Nothing to download.");
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel::<JobProgress>(100);
        let pipeline = self.pipeline.clone().with_progress(tx);
        let printer = tokio::spawn(async move {
            while let Some(progress) = rx.recv().await {
                if progress.stage != JobStage::Pending {
                    println!(
                        "[{:>3}%] {}: {}",
                        progress.percent, progress.input, progress.message
                    );
                }
            }
        });

        let outcomes = pipeline.run(jobs).await;
        drop(pipeline);
        if let Err(e) = printer.await {
            warn!(error = %e, "Progress printer stopped");
        }

        print_outcomes(&outcomes);
        Ok(())
    }

    // ===== Maintenance =====

    pub async fn reconcile(&self) -> Result<()> {
        let report = self.engine.reconcile_orphans().await?;
        print_reconcile(&report);
        Ok(())
    }

    pub async fn repair(&self) -> Result<()> {
        let reports = self.engine.repair_playlists().await?;
        if reports.is_empty() {
            println!("No playlists found.");
        }
        for report in reports {
            if report.removed.is_empty() {
                println!("✓ {}: {} entries OK", report.playlist, report.kept);
            } else {
                println!(
                    "✓ {}: kept {}, removed {}",
                    report.playlist,
                    report.kept,
                    report.removed.len()
                );
                for entry in &report.removed {
                    println!("   - {entry}");
                }
            }
        }
        Ok(())
    }

    pub async fn ingest(&self, source: &Path) -> Result<()> {
        let settings = self.engine.settings().snapshot().await;
        let hasher: Option<Arc<dyn ContentHasher>> = match settings.dedup {
            DedupPolicy::Off => None,
            DedupPolicy::Report => Some(Arc::new(Sha256Hasher)),
        };

        let report = self.engine.ingest_folder(source, hasher).await?;
        for file in &report.imported {
            println!(
                "✓ {} -> {} ({})",
                file.source.display(),
                file.track.file_name(),
                file.playlist
            );
        }
        for (path, e) in &report.skipped {
            println!("✗ {}: {}", path.display(), e);
        }
        println!(
            "Imported {} files, skipped {}",
            report.imported.len(),
            report.skipped.len()
        );
        Ok(())
    }

    // ===== Settings =====

    pub async fn settings(&mut self) -> Result<()> {
        let handle = self.engine.settings().clone();
        loop {
            let current = handle.snapshot().await;
            println!("\nSettings:");
            println!("1. Playlists root:  {}", current.layout.root.display());
            println!("2. Max concurrent:  {}", current.max_concurrent);
            println!("3. Search results:  {}", current.search_results);
            println!("4. Duplicate check: {}", dedup_label(current.dedup));
            println!("5. Audio format:    {}", current.audio_format);
            println!("6. yt-dlp path:     {}", current.extractor_path.display());

            let Some(choice) = self.prompt("Choose setting to change (0=back): ").await? else {
                return Ok(());
            };
            let Some(index) = parse_choice(&choice, 6) else {
                return Ok(());
            };
            let Some(value) = self.prompt("New value: ").await? else {
                return Ok(());
            };
            if value.is_empty() {
                continue;
            }

            let mut updated = (*current).clone();
            match index {
                0 => {
                    updated.layout = PoolLayout::for_root(&value);
                    updated.worklist = updated.layout.root.join(DEFAULT_WORKLIST_NAME);
                }
                1 | 2 => {
                    let Ok(n) = value.parse::<usize>() else {
                        println!("Not a number: {value}");
                        continue;
                    };
                    if index == 1 {
                        updated.max_concurrent = n;
                    } else {
                        updated.search_results = n;
                    }
                }
                3 => match value.to_lowercase().as_str() {
                    "off" => updated.dedup = DedupPolicy::Off,
                    "report" => updated.dedup = DedupPolicy::Report,
                    _ => {
                        println!("Use 'off' or 'report'");
                        continue;
                    }
                },
                4 => updated.audio_format = value,
                _ => updated.extractor_path = PathBuf::from(value),
            }

            match handle.reconfigure(updated).await {
                Ok(_) => println!("✓ Settings updated"),
                Err(e) => println!("✗ {e}"),
            }
        }
    }

    // ===== Output =====

    async fn list_tracks(&self, tracks: &[Track]) {
        let settings = self.engine.settings().snapshot().await;
        for (i, track) in tracks.iter().enumerate() {
            let pool = settings
                .layout
                .pool_of(track.path())
                .map_or_else(String::new, |p| format!(" [{p}]"));
            let artist = artist_of(track)
                .await
                .map_or_else(String::new, |a| format!(" - {a}"));
            println!(" {}. {}{}{}", i + 1, track.file_name(), artist, pool);
        }
    }
}

/// One line per track: where it ended up, or why it failed
pub fn print_updates(updates: &[TrackUpdate]) {
    for update in updates {
        let name = update.track.file_name();
        match &update.result {
            Ok(()) if update.playlists.is_empty() => {
                let pool = update
                    .pool
                    .map_or_else(|| "unknown location".to_string(), |p| p.to_string());
                println!("✓ {name}: no playlists, now in {pool}");
            }
            Ok(()) => println!("✓ {name}: {}", update.playlists.join(", ")),
            Err(e) => println!("✗ {name}: {e}"),
        }
    }
}

pub fn print_reconcile(report: &ReconcileReport) {
    for track in &report.moved {
        println!("Moved {} to staging (no playlists)", track.file_name());
    }
    for track in &report.skipped {
        println!(
            "{} already exists in staging, left in library",
            track.file_name()
        );
    }
    for (track, e) in &report.failed {
        println!("✗ {}: {}", track.file_name(), e);
    }
}

fn print_outcomes(outcomes: &[JobOutcome]) {
    for outcome in outcomes {
        let mark = if outcome.is_done() { "✓" } else { "✗" };
        println!("{mark} {outcome}");
        for duplicate in &outcome.duplicates {
            println!("   same content as {}", duplicate.file_name());
        }
    }
}

fn dedup_label(policy: DedupPolicy) -> &'static str {
    match policy {
        DedupPolicy::Off => "off",
        DedupPolicy::Report => "report",
    }
}

/// Playlist name cut to fit a column
fn display_name(name: &str) -> String {
    if name.chars().count() > 30 {
        let head: String = name.chars().take(27).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

async fn artist_of(track: &Track) -> Option<String> {
    let path = track.path().to_path_buf();
    match tokio::task::spawn_blocking(move || read_tag_summary(&path)).await {
        Ok(Ok(summary)) => summary.artist.filter(|a| !a.is_empty()),
        Ok(Err(e)) => {
            debug!(track = %track, error = %e, "No tag summary");
            None
        }
        Err(_) => None,
    }
}
