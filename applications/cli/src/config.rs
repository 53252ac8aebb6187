/// Application configuration
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tunekeep_core::settings::{DEFAULT_MAX_CONCURRENT, DEFAULT_SEARCH_RESULTS};
use tunekeep_core::{DedupPolicy, PoolLayout, Result, Settings, TuneError};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "tunekeep.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Playlists root; every playlist entry is relative to it
    #[serde(default)]
    pub playlists_dir: PathBuf,

    /// Defaults to `<playlists_dir>/AllSongs`
    #[serde(default)]
    pub library_dir: Option<PathBuf>,

    /// Defaults to `<playlists_dir>/../TempDownloads`
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Defaults to `<playlists_dir>/songs.txt`
    #[serde(default)]
    pub worklist: Option<PathBuf>,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_search_results")]
    pub search_results: usize,

    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,

    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    #[serde(default)]
    pub dedup: DedupPolicy,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// Reads `path`, or `tunekeep.toml` if it exists, then applies
    /// `TUNEKEEP_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with TUNEKEEP_)
        settings = settings.add_source(
            config::Environment::with_prefix("TUNEKEEP").try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| TuneError::config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| TuneError::config(e.to_string()))
    }

    /// Parse a TOML document, without environment overrides
    pub fn from_toml(text: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .map_err(|e| TuneError::config(e.to_string()))
    }

    /// Defaults for a playlists root
    pub fn for_root(playlists_dir: impl Into<PathBuf>) -> Self {
        Self {
            playlists_dir: playlists_dir.into(),
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playlists_dir.as_os_str().is_empty() {
            return Err(TuneError::config(
                "playlists_dir is required (set TUNEKEEP_PLAYLISTS_DIR or pass --root)",
            ));
        }

        if self.max_concurrent == 0 {
            return Err(TuneError::config("max_concurrent must be at least 1"));
        }

        Ok(())
    }

    /// Runtime settings for the engine and pipeline
    pub fn into_settings(self) -> Result<Settings> {
        self.validate()?;

        let mut settings = Settings::for_root(&self.playlists_dir);
        if self.library_dir.is_some() || self.staging_dir.is_some() {
            let library = self
                .library_dir
                .unwrap_or_else(|| settings.layout.library.clone());
            let staging = self
                .staging_dir
                .unwrap_or_else(|| settings.layout.staging.clone());
            settings.layout = PoolLayout::new(&self.playlists_dir, library, staging);
        }
        if let Some(worklist) = self.worklist {
            settings.worklist = worklist;
        }
        settings.max_concurrent = self.max_concurrent;
        settings.search_results = self.search_results;
        settings.extractor_path = self.yt_dlp_path;
        settings.audio_format = self.audio_format;
        settings.dedup = self.dedup;

        settings.validate()?;
        Ok(settings)
    }
}

// Default values
fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_search_results() -> usize {
    DEFAULT_SEARCH_RESULTS
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playlists_dir: PathBuf::new(),
            library_dir: None,
            staging_dir: None,
            worklist: None,
            max_concurrent: default_max_concurrent(),
            search_results: default_search_results(),
            yt_dlp_path: default_yt_dlp_path(),
            audio_format: default_audio_format(),
            dedup: DedupPolicy::Off,
        }
    }
}
