//! Pending work-list
//!
//! One raw item per line, either a URL or a free-text search query. The
//! acquisition pipeline removes each line once its job has finished.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tunekeep_core::text::{decode_text, non_empty_lines};
use tunekeep_core::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkItem {
    Url(String),
    Query(String),
}

impl WorkItem {
    /// Classify one line; blank lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            None
        } else if line.contains("http") {
            Some(Self::Url(line.to_string()))
        } else {
            Some(Self::Query(line.to_string()))
        }
    }

    /// The line as it appears in the work-list
    pub fn raw(&self) -> &str {
        match self {
            Self::Url(s) | Self::Query(s) => s,
        }
    }
}

/// The work-list file plus the lock serializing its rewrites
#[derive(Debug)]
pub struct Worklist {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Worklist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All pending items in file order; a missing file is empty
    pub async fn load(&self) -> Result<Vec<WorkItem>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_lines()
            .await?
            .iter()
            .filter_map(|line| WorkItem::parse(line))
            .collect())
    }

    /// Remove every line equal to `line` after trimming
    ///
    /// Blank lines are dropped in the same rewrite; every other line is
    /// written back byte for byte. Returns the number of matching lines
    /// removed.
    pub async fn consume(&self, line: &str) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let target = line.trim();
        let Some(text) = self.read_text().await? else {
            return Ok(0);
        };

        let mut content = String::with_capacity(text.len());
        let mut removed = 0;
        for raw in text.split_inclusive('\n') {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == target {
                removed += 1;
                continue;
            }
            content.push_str(raw);
            if !raw.ends_with('\n') {
                content.push('\n');
            }
        }
        if removed == 0 {
            return Ok(0);
        }

        fs::write(&self.path, content).await?;
        tracing::debug!(line = %target, "Removed line from work-list");
        Ok(removed)
    }

    async fn read_lines(&self) -> Result<Vec<String>> {
        Ok(self
            .read_text()
            .await?
            .map(|text| non_empty_lines(&text).map(str::to_string).collect())
            .unwrap_or_default())
    }

    async fn read_text(&self) -> Result<Option<String>> {
        match fs::read(&self.path).await {
            Ok(bytes) => decode_text(bytes, &self.path).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
