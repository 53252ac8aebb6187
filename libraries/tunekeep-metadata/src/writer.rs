/// ID3 tag writer
use crate::error::{MetadataError, Result};
use id3::frame::{Comment, Picture, PictureType};
use id3::{ErrorKind, Tag, TagLike, Version};
use std::path::Path;
use tunekeep_core::{TagUpdate, TagWriter};

/// Writes membership comments, covers, and artists into ID3 containers
///
/// Existing frames other than comments, the front cover, and the artist
/// are preserved. Output is always ID3v2.3 for compatibility with older
/// players.
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3TagWriter;

impl Id3TagWriter {
    pub fn new() -> Self {
        Self
    }

    fn write(path: &Path, update: &TagUpdate) -> Result<()> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }

        let mut tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Tag::new(),
            Err(e) => return Err(e.into()),
        };

        // Comment (COMM): replace all with a single "eng" comment
        let _ = tag.remove("COMM");
        let _ = tag.add_frame(Comment {
            lang: "eng".to_string(),
            description: String::new(),
            text: update.comment(),
        });

        if let Some(cover) = &update.cover {
            tag.remove_picture_by_type(PictureType::CoverFront);
            let _ = tag.add_frame(Picture {
                mime_type: cover.mime_type.clone(),
                picture_type: PictureType::CoverFront,
                description: "Cover".to_string(),
                data: cover.data.clone(),
            });
        }

        if let Some(artist) = update.artist.as_deref().map(str::trim) {
            if !artist.is_empty() {
                tag.set_artist(artist);
            }
        }

        tag.write_to_path(path, Version::Id3v23)?;
        tracing::debug!(path = %path.display(), comment = %update.comment(), "Tags written");
        Ok(())
    }
}

impl TagWriter for Id3TagWriter {
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
    }

    fn write_tags(&self, path: &Path, update: &TagUpdate) -> tunekeep_core::Result<()> {
        Self::write(path, update).map_err(Into::into)
    }
}
