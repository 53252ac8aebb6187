//! In-memory membership index
//!
//! Mirrors the playlist files: playlist name to ordered entries, and entry
//! to the set of playlists containing it. Updated by the engine inside each
//! playlist's critical section.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tunekeep_core::Result;
use tunekeep_storage::PlaylistStore;

#[derive(Debug, Clone, Default)]
pub struct MembershipIndex {
    members: BTreeMap<String, Vec<String>>,
    by_entry: HashMap<String, BTreeSet<String>>,
}

impl MembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from every playlist in the store
    pub async fn load(store: &PlaylistStore) -> Result<Self> {
        let mut index = Self::new();
        for name in store.list().await? {
            let entries = store.read(&name).await?;
            index.set_playlist(&name, entries);
        }
        tracing::debug!(
            playlists = index.members.len(),
            entries = index.by_entry.len(),
            "Membership index loaded"
        );
        Ok(index)
    }

    /// Playlists containing `entry`, sorted by name
    pub fn playlists_of(&self, entry: &str) -> Vec<String> {
        self.by_entry
            .get(entry)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn entries(&self, playlist: &str) -> Option<&[String]> {
        self.members.get(playlist).map(Vec::as_slice)
    }

    /// Replace a playlist's entries
    pub fn set_playlist(&mut self, playlist: &str, entries: Vec<String>) {
        self.remove_playlist(playlist);
        for entry in &entries {
            self.by_entry
                .entry(entry.clone())
                .or_default()
                .insert(playlist.to_string());
        }
        self.members.insert(playlist.to_string(), entries);
    }

    pub fn insert(&mut self, playlist: &str, entry: &str) {
        let list = self.members.entry(playlist.to_string()).or_default();
        if !list.iter().any(|e| e == entry) {
            list.push(entry.to_string());
        }
        self.by_entry
            .entry(entry.to_string())
            .or_default()
            .insert(playlist.to_string());
    }

    /// Drop `entries` from one playlist, keeping the rest in order
    pub fn remove_entries(&mut self, playlist: &str, entries: &[String]) {
        let Some(list) = self.members.get_mut(playlist) else {
            return;
        };
        list.retain(|e| !entries.contains(e));
        for entry in entries {
            if let Some(names) = self.by_entry.get_mut(entry) {
                names.remove(playlist);
                if names.is_empty() {
                    self.by_entry.remove(entry);
                }
            }
        }
    }

    pub fn remove_playlist(&mut self, playlist: &str) {
        let Some(old) = self.members.remove(playlist) else {
            return;
        };
        for entry in old {
            if let Some(names) = self.by_entry.get_mut(&entry) {
                names.remove(playlist);
                if names.is_empty() {
                    self.by_entry.remove(&entry);
                }
            }
        }
    }
}
