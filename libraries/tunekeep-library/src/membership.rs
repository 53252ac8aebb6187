//! Membership engine
//!
//! Owns the rule tying a track's pool to its playlists: a track lives in the
//! library iff at least one playlist lists it. Every mutating operation
//! re-checks that rule for each track it touched before returning.

use crate::fuzzy::FuzzyMatcher;
use crate::index::MembershipIndex;
use crate::locks::PlaylistLocks;
use crate::types::{ReconcileReport, TrackUpdate};
use std::collections::{BTreeSet, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use tunekeep_core::{
    is_audio_file, CoverArt, Pool, PoolLayout, Result, Settings, SettingsHandle, TagUpdate,
    TagWriter, Track, TuneError,
};
use tunekeep_storage::{files, validate_playlist_name, PlaylistStore};

#[derive(Debug, Default)]
struct IndexState {
    root: Option<PathBuf>,
    index: MembershipIndex,
}

/// One settings snapshot plus the store for its root
pub(crate) struct OpContext {
    pub(crate) settings: Arc<Settings>,
    pub(crate) store: PlaylistStore,
}

impl OpContext {
    pub(crate) fn layout(&self) -> &PoolLayout {
        &self.settings.layout
    }
}

pub struct MembershipEngine {
    settings: SettingsHandle,
    tagger: Arc<dyn TagWriter>,
    locks: PlaylistLocks,
    state: RwLock<IndexState>,
}

impl MembershipEngine {
    /// Create an engine; the index is built on first use
    pub fn new(settings: SettingsHandle, tagger: Arc<dyn TagWriter>) -> Self {
        Self {
            settings,
            tagger,
            locks: PlaylistLocks::new(),
            state: RwLock::new(IndexState::default()),
        }
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// Snapshot the settings and make sure the index matches their root
    pub(crate) async fn context(&self) -> Result<OpContext> {
        let settings = self.settings.snapshot().await;
        let store = PlaylistStore::new(&settings.layout.root);

        {
            let state = self.state.read().await;
            if state.root.as_deref() == Some(settings.layout.root.as_path()) {
                return Ok(OpContext { settings, store });
            }
        }

        let mut state = self.state.write().await;
        if state.root.as_deref() != Some(settings.layout.root.as_path()) {
            state.index = MembershipIndex::load(&store).await?;
            state.root = Some(settings.layout.root.clone());
            info!(root = %settings.layout.root.display(), "Membership index built");
        }
        Ok(OpContext { settings, store })
    }

    /// Rebuild the index from the playlist files on disk
    pub async fn reload(&self) -> Result<()> {
        let settings = self.settings.snapshot().await;
        let store = PlaylistStore::new(&settings.layout.root);
        let index = MembershipIndex::load(&store).await?;

        let mut state = self.state.write().await;
        state.index = index;
        state.root = Some(settings.layout.root.clone());
        Ok(())
    }

    // ===== Queries =====

    /// Playlists containing the track, sorted by name
    pub async fn playlists_of(&self, track: &Track) -> Result<Vec<String>> {
        let ctx = self.context().await?;
        let entry = ctx.layout().relative_entry(track.path())?;
        Ok(self.playlists_for_entry(&entry).await)
    }

    pub async fn list_playlists(&self) -> Result<Vec<String>> {
        let ctx = self.context().await?;
        ctx.store.list().await
    }

    /// Every track in both pools, library first, each pool sorted by file name
    pub async fn all_tracks(&self) -> Result<Vec<Track>> {
        let ctx = self.context().await?;
        pool_tracks(ctx.layout()).await
    }

    /// Tracks of both pools that belong to `playlist`
    pub async fn tracks_in_playlist(&self, playlist: &str) -> Result<Vec<Track>> {
        validate_playlist_name(playlist)?;
        let ctx = self.context().await?;
        let entries: HashSet<String> = self
            .state
            .read()
            .await
            .index
            .entries(playlist)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default();

        let mut members: Vec<Track> = pool_tracks(ctx.layout())
            .await?
            .into_iter()
            .filter(|track| {
                ctx.layout()
                    .relative_entry(track.path())
                    .is_ok_and(|entry| entries.contains(&entry))
            })
            .collect();
        members.sort_by_key(|t| t.file_name().to_lowercase());
        Ok(members)
    }

    /// Candidate tracks for a free-text term
    pub async fn find_tracks(&self, term: &str) -> Result<Vec<Track>> {
        let tracks = self.all_tracks().await?;
        Ok(FuzzyMatcher::new().find(term, &tracks))
    }

    pub(crate) async fn playlists_for_entry(&self, entry: &str) -> Vec<String> {
        self.state.read().await.index.playlists_of(entry)
    }

    // ===== Playlist management =====

    pub async fn create_playlist(&self, name: &str) -> Result<()> {
        let ctx = self.context().await?;
        let path = ctx.store.path_for(name)?;
        let _guard = self.locks.lock(&path).await;
        ctx.store.create(name).await?;
        self.update_index(&ctx, |index| index.set_playlist(name, Vec::new()))
            .await;
        Ok(())
    }

    // ===== Membership changes =====

    /// Make `playlists` the exact membership set of each track
    pub async fn set_memberships(
        &self,
        tracks: &[Track],
        playlists: &[String],
    ) -> Result<Vec<TrackUpdate>> {
        for name in playlists {
            validate_playlist_name(name)?;
        }
        let targets: BTreeSet<String> = playlists.iter().cloned().collect();
        let ctx = self.context().await?;

        let mut updates = Vec::with_capacity(tracks.len());
        for track in tracks {
            let mut current = track.clone();
            let result = self.apply_memberships(&ctx, &mut current, &targets).await;
            updates.push(self.finish(&ctx, current, result).await);
        }
        Ok(updates)
    }

    /// Remove each track from every playlist
    pub async fn clear_memberships(&self, tracks: &[Track]) -> Result<Vec<TrackUpdate>> {
        self.set_memberships(tracks, &[]).await
    }

    /// Remove the tracks from one playlist in a single rewrite
    pub async fn remove_from_playlist(
        &self,
        playlist: &str,
        tracks: &[Track],
    ) -> Result<Vec<TrackUpdate>> {
        validate_playlist_name(playlist)?;
        let ctx = self.context().await?;

        let entries: Vec<Result<String>> = tracks
            .iter()
            .map(|t| ctx.layout().relative_entry(t.path()))
            .collect();
        let to_drop: Vec<String> = entries
            .iter()
            .filter_map(|e| e.as_ref().ok().cloned())
            .collect();

        let removed = self.remove_entries(&ctx, playlist, &to_drop).await?;
        info!(playlist = %playlist, removed, "Removed tracks from playlist");

        let mut updates = Vec::with_capacity(tracks.len());
        for (track, entry) in tracks.iter().zip(entries) {
            let mut current = track.clone();
            let result = match entry {
                Ok(entry) => self.resettle(&ctx, &mut current, &entry).await,
                Err(e) => Err(e),
            };
            updates.push(self.finish(&ctx, current, result).await);
        }
        Ok(updates)
    }

    /// Add the tracks to one playlist, moving staged tracks into the library
    pub async fn add_to_playlist(
        &self,
        playlist: &str,
        tracks: &[Track],
    ) -> Result<Vec<TrackUpdate>> {
        validate_playlist_name(playlist)?;
        let ctx = self.context().await?;

        let mut updates = Vec::with_capacity(tracks.len());
        for track in tracks {
            let mut current = track.clone();
            let result = self.apply_add(&ctx, playlist, &mut current).await;
            updates.push(self.finish(&ctx, current, result).await);
        }
        Ok(updates)
    }

    /// Move every library track without memberships to staging
    pub async fn reconcile_orphans(&self) -> Result<ReconcileReport> {
        let ctx = self.context().await?;
        let mut report = ReconcileReport::default();

        for track in list_pool(ctx.layout().dir(Pool::Library)).await? {
            let entry = match ctx.layout().relative_entry(track.path()) {
                Ok(entry) => entry,
                Err(e) => {
                    report.failed.push((track, e));
                    continue;
                }
            };
            if !self.playlists_for_entry(&entry).await.is_empty() {
                continue;
            }

            match self.move_to(&ctx, &track, Pool::Staging).await {
                Ok(moved) => report.moved.push(moved),
                Err(TuneError::MoveConflict { to, .. }) => {
                    info!(
                        track = %track,
                        existing = %to.display(),
                        "Orphan already exists in staging, skipping move"
                    );
                    report.skipped.push(track);
                }
                Err(e) => {
                    warn!(track = %track, error = %e, "Failed to move orphan to staging");
                    report.failed.push((track, e));
                }
            }
        }

        info!(
            moved = report.moved.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Orphan reconciliation finished"
        );
        Ok(report)
    }

    /// Remove the track from every playlist, then delete the file
    ///
    /// Returns the playlists it was removed from. Fails with `NotFound` if
    /// the file was already gone; playlist entries are still removed.
    pub async fn delete_track(&self, track: &Track) -> Result<Vec<String>> {
        let ctx = self.context().await?;
        let entry = ctx.layout().relative_entry(track.path())?;
        let playlists = self.playlists_for_entry(&entry).await;

        for name in &playlists {
            self.remove_entries(&ctx, name, std::slice::from_ref(&entry))
                .await?;
        }

        match fs::remove_file(track.path()).await {
            Ok(()) => {
                info!(track = %track, playlists = playlists.len(), "Deleted track");
                Ok(playlists)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(TuneError::NotFound(track.path().to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    // ===== Acquisition hand-off =====

    /// Move a track into the library, renaming to `name (N).ext` on collision
    pub async fn promote_unique(&self, track: &Track) -> Result<Track> {
        let ctx = self.context().await?;
        let library = ctx.layout().dir(Pool::Library);
        if ctx.layout().pool_of(track.path()) == Some(Pool::Library) {
            return Ok(track.clone());
        }
        let dest = files::move_unique(track.path(), library, &track.file_name()).await?;
        info!(track = %track, dest = %dest.display(), "Placed track in library");
        Ok(Track::new(dest))
    }

    /// Append the track to each playlist, reporting per playlist
    pub async fn append_memberships(
        &self,
        track: &Track,
        playlists: &[String],
    ) -> Result<Vec<(String, Result<bool>)>> {
        let ctx = self.context().await?;
        let entry = ctx.layout().relative_entry(track.path())?;

        let mut results = Vec::with_capacity(playlists.len());
        for name in playlists {
            let result = match validate_playlist_name(name) {
                Ok(()) => self.append_entry(&ctx, name, &entry).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!(track = %track, playlist = %name, error = %e, "Failed to add to playlist");
            }
            results.push((name.clone(), result));
        }
        Ok(results)
    }

    /// Rewrite the membership comment, optionally with cover and artist
    ///
    /// Returns the memberships written.
    pub async fn retag(
        &self,
        track: &Track,
        cover: Option<CoverArt>,
        artist: Option<String>,
    ) -> Result<Vec<String>> {
        let ctx = self.context().await?;
        let entry = ctx.layout().relative_entry(track.path())?;
        let playlists = self.playlists_for_entry(&entry).await;
        let update = TagUpdate {
            playlists: playlists.clone(),
            cover,
            artist,
        };
        self.write_tags(track, update).await?;
        Ok(playlists)
    }

    // ===== Internals =====

    async fn apply_memberships(
        &self,
        ctx: &OpContext,
        current: &mut Track,
        targets: &BTreeSet<String>,
    ) -> Result<()> {
        ensure_exists(current).await?;

        let entry = if targets.is_empty() {
            ctx.layout().relative_entry(current.path())?
        } else {
            self.admit_to_library(ctx, current).await?
        };

        for name in self.playlists_for_entry(&entry).await {
            if !targets.contains(&name) {
                self.remove_entries(ctx, &name, std::slice::from_ref(&entry))
                    .await?;
                info!(track = %current, playlist = %name, "Removed from playlist");
            }
        }
        for name in targets {
            if self.append_entry(ctx, name, &entry).await? {
                info!(track = %current, playlist = %name, "Added to playlist");
            }
        }

        self.resettle(ctx, current, &entry).await
    }

    async fn apply_add(&self, ctx: &OpContext, playlist: &str, current: &mut Track) -> Result<()> {
        ensure_exists(current).await?;
        let entry = self.admit_to_library(ctx, current).await?;
        if self.append_entry(ctx, playlist, &entry).await? {
            info!(track = %current, playlist = %playlist, "Added to playlist");
        }
        self.resettle(ctx, current, &entry).await
    }

    /// Move a staged track into the library ahead of gaining memberships
    ///
    /// Returns the track's entry at its final location. Entries left behind
    /// for the staging path are dropped.
    async fn admit_to_library(&self, ctx: &OpContext, current: &mut Track) -> Result<String> {
        if ctx.layout().pool_of(current.path()) == Some(Pool::Staging) {
            let old_entry = ctx.layout().relative_entry(current.path())?;
            *current = self.move_to(ctx, current, Pool::Library).await?;
            for name in self.playlists_for_entry(&old_entry).await {
                self.remove_entries(ctx, &name, std::slice::from_ref(&old_entry))
                    .await?;
            }
        }
        ctx.layout().relative_entry(current.path())
    }

    /// Tag the track with its memberships, then demote it if it has none
    async fn resettle(&self, ctx: &OpContext, current: &mut Track, entry: &str) -> Result<()> {
        ensure_exists(current).await?;
        let playlists = self.playlists_for_entry(entry).await;

        if let Err(e) = self
            .write_tags(current, TagUpdate::memberships(playlists.clone()))
            .await
        {
            warn!(track = %current, error = %e, "Failed to write tags");
        }

        if playlists.is_empty() && ctx.layout().pool_of(current.path()) == Some(Pool::Library) {
            let demoted = self.move_to(ctx, current, Pool::Staging).await;
            match demoted {
                Ok(moved) => *current = moved,
                Err(TuneError::MoveConflict { to, .. }) => {
                    info!(
                        track = %current,
                        existing = %to.display(),
                        "Already exists in staging, leaving in library"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn finish(&self, ctx: &OpContext, track: Track, result: Result<()>) -> TrackUpdate {
        if let Err(e) = &result {
            warn!(track = %track, error = %e, "Membership update failed");
        }
        let playlists = match ctx.layout().relative_entry(track.path()) {
            Ok(entry) => self.playlists_for_entry(&entry).await,
            Err(_) => Vec::new(),
        };
        TrackUpdate {
            pool: ctx.layout().pool_of(track.path()),
            track,
            playlists,
            result,
        }
    }

    async fn move_to(&self, ctx: &OpContext, track: &Track, pool: Pool) -> Result<Track> {
        let dest = files::move_into(track.path(), ctx.layout().dir(pool)).await?;
        info!(track = %track, to = %pool, "Moved track");
        Ok(Track::new(dest))
    }

    /// Drop entries from a playlist under its lock; returns how many went
    pub(crate) async fn remove_entries(
        &self,
        ctx: &OpContext,
        playlist: &str,
        entries: &[String],
    ) -> Result<usize> {
        let path = ctx.store.path_for(playlist)?;
        let _guard = self.locks.lock(&path).await;

        let removed = ctx.store.remove(playlist, entries).await?;
        if removed > 0 {
            self.update_index(ctx, |index| index.remove_entries(playlist, entries))
                .await;
        }
        Ok(removed)
    }

    /// Rewrite a playlist under its lock with the result of `f`
    pub(crate) async fn rewrite_playlist<F>(
        &self,
        ctx: &OpContext,
        playlist: &str,
        f: F,
    ) -> Result<(Vec<String>, Vec<String>)>
    where
        F: FnOnce(Vec<String>) -> (Vec<String>, Vec<String>),
    {
        let path = ctx.store.path_for(playlist)?;
        let _guard = self.locks.lock(&path).await;

        let current = ctx.store.read(playlist).await?;
        let (kept, dropped) = f(current);
        ctx.store.write(playlist, &kept).await?;
        let indexed = kept.clone();
        self.update_index(ctx, |index| index.set_playlist(playlist, indexed))
            .await;
        Ok((kept, dropped))
    }

    /// Append one entry under the playlist's lock, creating the file if needed
    pub(crate) async fn append_entry(
        &self,
        ctx: &OpContext,
        playlist: &str,
        entry: &str,
    ) -> Result<bool> {
        let path = ctx.store.path_for(playlist)?;
        let _guard = self.locks.lock(&path).await;

        let added = ctx.store.append(playlist, entry).await?;
        self.update_index(ctx, |index| index.insert(playlist, entry))
            .await;
        Ok(added)
    }

    async fn update_index<F>(&self, ctx: &OpContext, f: F)
    where
        F: FnOnce(&mut MembershipIndex),
    {
        let mut state = self.state.write().await;
        // An index rebuilt for another root must not see this change
        if state.root.as_deref() == Some(ctx.layout().root.as_path()) {
            f(&mut state.index);
        }
    }

    pub(crate) async fn write_tags(&self, track: &Track, update: TagUpdate) -> Result<()> {
        if !self.tagger.supports(track.path()) {
            debug!(track = %track, "Tag format not supported, skipping");
            return Ok(());
        }
        let tagger = Arc::clone(&self.tagger);
        let path = track.path().to_path_buf();
        tokio::task::spawn_blocking(move || tagger.write_tags(&path, &update))
            .await
            .map_err(|e| TuneError::tag(format!("tag task failed: {e}")))?
    }
}

async fn ensure_exists(track: &Track) -> Result<()> {
    if fs::try_exists(track.path()).await? {
        Ok(())
    } else {
        Err(TuneError::NotFound(track.path().to_path_buf()))
    }
}

/// Audio files directly inside a pool directory, sorted by file name
/// Library tracks then staging tracks, each sorted by file name
async fn pool_tracks(layout: &PoolLayout) -> Result<Vec<Track>> {
    let mut tracks = list_pool(layout.dir(Pool::Library)).await?;
    tracks.extend(list_pool(layout.dir(Pool::Staging)).await?);
    Ok(tracks)
}

pub(crate) async fn list_pool(dir: &Path) -> Result<Vec<Track>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut tracks = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_audio_file(&path) {
            tracks.push(Track::new(path));
        }
    }
    tracks.sort_by_key(Track::file_name);
    Ok(tracks)
}
