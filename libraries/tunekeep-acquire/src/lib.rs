//! Tunekeep Acquisition
//!
//! Downloads remote media into the staging pool, tags it, and files it into
//! target playlists through the membership engine.
//!
//! # Architecture
//!
//! - `extractor`: the `Extractor` seam and the yt-dlp adapter
//! - `thumbnail`: cover image download over HTTP
//! - `pipeline`: concurrent jobs behind an admission gate, with a progress sink
//! - `types`: jobs, stages, and outcomes
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tunekeep_acquire::{AcquisitionJob, AcquisitionPipeline, HttpThumbnails, YtDlpExtractor};
//! use tunekeep_core::{Settings, SettingsHandle};
//! use tunekeep_library::MembershipEngine;
//! use tunekeep_metadata::Id3TagWriter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsHandle::new(Settings::for_root("/music/PLAYLISTS"))?;
//! let engine = Arc::new(MembershipEngine::new(settings.clone(), Arc::new(Id3TagWriter)));
//! let pipeline = AcquisitionPipeline::new(
//!     engine,
//!     Arc::new(YtDlpExtractor::new(settings)),
//!     Arc::new(HttpThumbnails::new()?),
//! );
//!
//! let job = AcquisitionJob::for_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ", vec!["Rock".into()]);
//! for outcome in pipeline.run(vec![job]).await {
//!     println!("{outcome}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod thumbnail;
pub mod types;

pub use error::{AcquireError, ExtractionKind, Result};
pub use extractor::{Extractor, YtDlpExtractor};
pub use pipeline::AcquisitionPipeline;
pub use thumbnail::{HttpThumbnails, ThumbnailSource};
pub use types::{watch_url, AcquisitionJob, JobOutcome, JobProgress, JobStage, MediaInfo, SearchHit};
