//! Playlist index files
//!
//! A playlist is `<root>/<name>.m3u`: the `#EXTM3U` header followed by one
//! root-relative entry per line. Existing files are found whatever the case of
//! their extension; new files always get a lowercase `.m3u`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tunekeep_core::text::{decode_text, non_empty_lines};
use tunekeep_core::types::PLAYLIST_EXTENSION;
use tunekeep_core::{Result, TuneError};

/// First line of every playlist file
pub const PLAYLIST_HEADER: &str = "#EXTM3U";

/// Reject names that would escape the playlists root or produce odd files
pub fn validate_playlist_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name.contains(['/', '\\'])
        || name == "."
        || name == ".."
        || name.chars().any(char::is_control)
    {
        return Err(TuneError::InvalidPlaylistName(name.to_string()));
    }
    Ok(())
}

/// Reads and writes playlist files under a single root
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    root: PathBuf,
}

impl PlaylistStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a new playlist called `name` is created at
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_playlist_name(name)?;
        Ok(self.root.join(format!("{name}.{PLAYLIST_EXTENSION}")))
    }

    /// The file currently backing `name`, if any
    ///
    /// The lowercase spelling wins when several files differ only in the
    /// case of their extension.
    pub async fn locate(&self, name: &str) -> Result<Option<PathBuf>> {
        let canonical = self.path_for(name)?;
        if fs::try_exists(&canonical).await? {
            return Ok(Some(canonical));
        }

        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut found: Option<PathBuf> = None;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if playlist_stem(&path) != Some(name) || !entry.file_type().await?.is_file() {
                continue;
            }
            if found.as_ref().is_some_and(|f| *f <= path) {
                continue;
            }
            found = Some(path);
        }
        Ok(found)
    }

    /// Existing file for `name`, or the path a new one would get
    async fn resolve(&self, name: &str) -> Result<PathBuf> {
        match self.locate(name).await? {
            Some(path) => Ok(path),
            None => self.path_for(name),
        }
    }

    /// Names of all playlists, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let Some(stem) = playlist_stem(&path) else {
                continue;
            };
            if entry.file_type().await?.is_file() {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.locate(name).await?.is_some())
    }

    /// Entries of a playlist, in file order; a missing playlist is empty
    pub async fn read(&self, name: &str) -> Result<Vec<String>> {
        let Some(path) = self.locate(name).await? else {
            return Ok(Vec::new());
        };
        match read_raw(&path).await? {
            Some(text) => Ok(parse_entries(&text)),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the whole playlist, dropping duplicate entries
    pub async fn write(&self, name: &str, entries: &[String]) -> Result<()> {
        let path = self.resolve(name).await?;
        fs::create_dir_all(&self.root).await?;

        let content = render(entries);
        let tmp = self.root.join(format!(".{name}.{PLAYLIST_EXTENSION}.tmp"));
        fs::write(&tmp, content.as_bytes()).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::debug!(playlist = %name, entries = entries.len(), "Playlist written");
        Ok(())
    }

    /// Create a new playlist containing only the header
    pub async fn create(&self, name: &str) -> Result<()> {
        if self.locate(name).await?.is_some() {
            return Err(TuneError::AlreadyExists(name.to_string()));
        }
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.root).await?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(TuneError::AlreadyExists(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(format!("{PLAYLIST_HEADER}\n").as_bytes())
            .await?;
        file.flush().await?;
        tracing::info!(playlist = %name, "Playlist created");
        Ok(())
    }

    /// Create the playlist if absent; returns true if it was created
    pub async fn ensure(&self, name: &str) -> Result<bool> {
        match self.create(name).await {
            Ok(()) => Ok(true),
            Err(TuneError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Add one entry; returns false if it was already present
    pub async fn append(&self, name: &str, entry: &str) -> Result<bool> {
        let path = self.resolve(name).await?;
        let Some(text) = read_raw(&path).await? else {
            fs::create_dir_all(&self.root).await?;
            fs::write(&path, format!("{PLAYLIST_HEADER}\n{entry}\n")).await?;
            return Ok(true);
        };

        if parse_entries(&text).iter().any(|e| e == entry) {
            return Ok(false);
        }

        let mut line = String::new();
        if text.is_empty() {
            line.push_str(PLAYLIST_HEADER);
            line.push('\n');
        } else if !text.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(entry);
        line.push('\n');

        let mut file = fs::OpenOptions::new().append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(true)
    }

    /// Drop the given entries; returns how many lines were removed
    pub async fn remove(&self, name: &str, entries: &[String]) -> Result<usize> {
        let current = self.read(name).await?;
        let kept: Vec<String> = current
            .iter()
            .filter(|e| !entries.contains(e))
            .cloned()
            .collect();
        let removed = current.len() - kept.len();
        if removed > 0 {
            self.write(name, &kept).await?;
        }
        Ok(removed)
    }
}

/// Stem of a playlist file name, matching the extension case-insensitively
fn playlist_stem(path: &Path) -> Option<&str> {
    let is_playlist = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PLAYLIST_EXTENSION));
    if !is_playlist {
        return None;
    }
    path.file_stem().and_then(|s| s.to_str())
}

async fn read_raw(path: &Path) -> Result<Option<String>> {
    match fs::read(path).await {
        Ok(bytes) => decode_text(bytes, path).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Entry lines of a playlist, skipping the header and other directives
fn parse_entries(text: &str) -> Vec<String> {
    non_empty_lines(text)
        .filter(|line| !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn render(entries: &[String]) -> String {
    let mut out = String::with_capacity(PLAYLIST_HEADER.len() + 1 + entries.len() * 32);
    out.push_str(PLAYLIST_HEADER);
    out.push('\n');
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if seen.insert(entry.as_str()) {
            out.push_str(entry);
            out.push('\n');
        }
    }
    out
}
