/// Capability traits implemented outside the core
use crate::error::Result;
use std::path::Path;

/// Embedded cover image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Fields written into a track's tag container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagUpdate {
    /// Playlist names, stored as the comment
    pub playlists: Vec<String>,
    pub cover: Option<CoverArt>,
    pub artist: Option<String>,
}

impl TagUpdate {
    /// Update that only rewrites the membership comment
    pub fn memberships(playlists: Vec<String>) -> Self {
        Self {
            playlists,
            ..Self::default()
        }
    }

    /// Comment text: playlist names joined with ", "
    pub fn comment(&self) -> String {
        self.playlists.join(", ")
    }
}

/// Read-modify-write access to a file's tag container
///
/// Implementations are blocking; async callers run them on the blocking pool.
pub trait TagWriter: Send + Sync {
    /// Whether this writer can tag the given file
    fn supports(&self, path: &Path) -> bool;

    /// Replace the comment and optionally set cover and artist
    fn write_tags(&self, path: &Path, update: &TagUpdate) -> Result<()>;
}

/// Content hash of a file, for duplicate detection
pub trait ContentHasher: Send + Sync {
    fn hash_file(&self, path: &Path) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_joins_names() {
        let update = TagUpdate::memberships(vec!["Rock".into(), "Chill".into()]);
        assert_eq!(update.comment(), "Rock, Chill");
        assert_eq!(TagUpdate::default().comment(), "");
    }
}
