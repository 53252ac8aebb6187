/// Tag summary reader implementation using lofty
use crate::error::{MetadataError, Result};
use lofty::{Accessor, TaggedFileExt};
use std::path::Path;

/// The tag fields the library engine cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSummary {
    pub artist: Option<String>,
    pub comment: Option<String>,
    pub has_cover: bool,
}

impl TagSummary {
    /// Playlist names recorded in the comment field
    pub fn playlists(&self) -> Vec<String> {
        self.comment
            .as_deref()
            .map(|c| {
                c.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Read artist, comment, and cover presence from any supported format
pub fn read_tag_summary(path: &Path) -> Result<TagSummary> {
    if !path.exists() {
        return Err(MetadataError::FileNotFound(path.display().to_string()));
    }

    let tagged_file = lofty::read_from_path(path)?;

    // Get primary tag or first available tag
    let Some(tag) = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.tags().first())
    else {
        return Ok(TagSummary::default());
    };

    Ok(TagSummary {
        artist: tag.artist().map(|s| s.to_string()),
        comment: tag.comment().map(|s| s.to_string()),
        has_cover: !tag.pictures().is_empty(),
    })
}
