//! Tunekeep Metadata
//!
//! Tag container access for tracks.
//!
//! This crate provides:
//! - `Id3TagWriter`: the `TagWriter` capability over ID3, persisted as v2.3
//! - `read_tag_summary`: artist, comment, and cover presence for any supported format
//!
//! # Example
//!
//! ```rust,no_run
//! use tunekeep_core::{TagUpdate, TagWriter};
//! use tunekeep_metadata::Id3TagWriter;
//! use std::path::Path;
//! # fn example() -> tunekeep_core::Result<()> {
//! let writer = Id3TagWriter::new();
//! let update = TagUpdate::memberships(vec!["Rock".to_string()]);
//! writer.write_tags(Path::new("/music/AllSongs/song.mp3"), &update)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod reader;
mod writer;

pub use error::{MetadataError, Result};
pub use reader::{read_tag_summary, TagSummary};
pub use writer::Id3TagWriter;
