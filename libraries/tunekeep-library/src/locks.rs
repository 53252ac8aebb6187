//! Per-playlist critical sections

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per playlist file
///
/// Every read-modify-write of a playlist file happens while holding the
/// guard for that file's path.
#[derive(Debug, Default)]
pub struct PlaylistLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PlaylistLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, playlist_file: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(playlist_file.to_path_buf()).or_default())
        };
        lock.lock_owned().await
    }
}
