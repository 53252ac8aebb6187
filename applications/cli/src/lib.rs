//! Tunekeep command-line front end
//!
//! - `config`: layered file + environment configuration
//! - `console`: interactive flows over the library engine and pipeline
//! - `selection`: numbered-choice parsing for prompts

pub mod config;
pub mod console;
pub mod selection;

pub use config::AppConfig;
pub use console::Console;
