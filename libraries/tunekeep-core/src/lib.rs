//! Tunekeep Core
//!
//! Shared types, capability traits, and error handling for the Tunekeep
//! library synchronization engine.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Pool`, `PoolLayout`
//! - **Runtime Settings**: immutable `Settings` snapshots behind a `SettingsHandle`
//! - **Capability Traits**: `TagWriter`, `ContentHasher`
//! - **Error Handling**: unified `TuneError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tunekeep_core::{Pool, PoolLayout, Track};
//!
//! let layout = PoolLayout::for_root("/music/PLAYLISTS");
//! let track = Track::new("/music/PLAYLISTS/AllSongs/Song.mp3");
//!
//! assert_eq!(layout.pool_of(track.path()), Some(Pool::Library));
//! assert_eq!(layout.relative_entry(track.path()).unwrap(), "AllSongs/Song.mp3");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod naming;
pub mod paths;
pub mod settings;
pub mod text;
pub mod traits;
pub mod types;

pub use error::{Result, TuneError};
pub use settings::{DedupPolicy, Settings, SettingsHandle};
pub use traits::{ContentHasher, CoverArt, TagUpdate, TagWriter};
pub use types::{is_audio_file, Pool, PoolLayout, Track, AUDIO_EXTENSIONS};
