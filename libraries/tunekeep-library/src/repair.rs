//! Playlist repair: purge entries whose file no longer exists

use crate::membership::MembershipEngine;
use crate::types::RepairReport;
use std::collections::HashSet;
use tokio::fs;
use tracing::{info, warn};
use tunekeep_core::Result;

impl MembershipEngine {
    /// Rewrite every playlist keeping only entries that resolve to a file
    ///
    /// Duplicate entries are dropped too, and the header is restored if it
    /// was missing.
    pub async fn repair_playlists(&self) -> Result<Vec<RepairReport>> {
        let ctx = self.context().await?;
        let mut reports = Vec::new();

        for name in ctx.store.list().await? {
            let mut missing = HashSet::new();
            for entry in ctx.store.read(&name).await? {
                if !fs::try_exists(ctx.layout().resolve_entry(&entry)).await? {
                    missing.insert(entry);
                }
            }

            let (kept, removed) = self
                .rewrite_playlist(&ctx, &name, |current| {
                    let mut seen = HashSet::new();
                    let mut kept = Vec::new();
                    let mut dropped = Vec::new();
                    for entry in current {
                        if missing.contains(&entry) || !seen.insert(entry.clone()) {
                            dropped.push(entry);
                        } else {
                            kept.push(entry);
                        }
                    }
                    (kept, dropped)
                })
                .await?;

            for entry in &removed {
                warn!(playlist = %name, entry = %entry, "Removed dead playlist entry");
            }
            info!(playlist = %name, kept = kept.len(), removed = removed.len(), "Playlist repaired");

            reports.push(RepairReport {
                playlist: name,
                kept: kept.len(),
                removed,
            });
        }

        Ok(reports)
    }
}
