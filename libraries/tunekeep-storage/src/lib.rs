//! Tunekeep Storage
//!
//! File-backed persistence for the library engine:
//!
//! - `playlists`: m3u playlist index files under the playlists root
//! - `worklist`: the pending "song list" consumed by the acquisition pipeline
//! - `files`: pool moves with collision handling
//!
//! All I/O goes through `tokio::fs`. Serialization of concurrent writers to
//! the same playlist is the caller's job; the work-list serializes its own
//! rewrites.

pub mod files;
pub mod playlists;
pub mod worklist;

pub use files::{move_file, move_into, move_unique, unique_destination};
pub use playlists::{validate_playlist_name, PlaylistStore, PLAYLIST_HEADER};
pub use worklist::{WorkItem, Worklist};
