//! Tunekeep Library Engine
//!
//! Keeps track placement and playlist membership consistent.
//!
//! # Features
//!
//! - Pool rule: a track sits in the library iff a playlist lists it, otherwise in staging
//! - Fuzzy track lookup (similarity ranking plus substring matches)
//! - Per-playlist critical sections and an in-memory reverse index
//! - Partial-failure batches: one result per track
//! - Maintenance: orphan reconciliation, playlist repair, folder ingestion
//! - Optional content hashing for duplicate reports
//!
//! # Architecture
//!
//! - `membership`: the engine and its membership operations
//! - `fuzzy`: Ratcliff/Obershelp matching over file stems
//! - `index`: reverse index from entry to playlists
//! - `locks`: per-playlist async mutexes
//! - `repair`, `ingest`: maintenance passes
//! - `dedup`: content hashing

pub mod dedup;
pub mod fuzzy;
pub mod index;
pub mod ingest;
pub mod locks;
pub mod membership;
pub mod repair;
mod types;

pub use dedup::{DuplicateFinder, Sha256Hasher};
pub use fuzzy::FuzzyMatcher;
pub use index::MembershipIndex;
pub use membership::MembershipEngine;
pub use types::*;
