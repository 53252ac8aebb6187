/// Tunekeep - playlist-driven music library keeper
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tunekeep::console::print_reconcile;
use tunekeep::{AppConfig, Console};
use tunekeep_acquire::{AcquisitionPipeline, HttpThumbnails, YtDlpExtractor};
use tunekeep_core::{Pool, SettingsHandle};
use tunekeep_library::MembershipEngine;
use tunekeep_metadata::Id3TagWriter;

#[derive(Parser)]
#[command(name = "tunekeep")]
#[command(about = "Keep playlists, library, and staging folders in sync", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (default: ./tunekeep.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Playlists root, overriding the configuration
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive main menu (default)
    Menu,
    /// Search songs and manage their playlists
    Manage {
        /// Initial search term
        term: Option<String>,
    },
    /// Remove songs from a playlist
    Cleanse,
    /// Add songs to a playlist with repeated searches
    Bulk,
    /// Download a URL or search query, or the song list when omitted
    Download {
        /// URL or search query
        input: Option<String>,
        /// Target playlist (repeatable); skips the playlist prompt
        #[arg(short, long = "playlist")]
        playlists: Vec<String>,
        /// Process the song list without prompting
        #[arg(long)]
        auto: bool,
    },
    /// Move songs without playlists to staging
    Reconcile,
    /// Drop playlist entries whose files are gone
    Repair,
    /// Sort a folder of per-playlist sub-folders into the library
    Ingest {
        /// Folder whose sub-folders are named after playlists
        source: PathBuf,
    },
    /// View and change runtime settings
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tunekeep=info,tunekeep_library=info,tunekeep_acquire=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.playlists_dir = root;
    }
    let settings = config.into_settings()?;

    for pool in [Pool::Library, Pool::Staging] {
        let dir = settings.layout.dir(pool);
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {} folder {}", pool, dir.display()))?;
    }
    tracing::info!(root = %settings.layout.root.display(), "Starting Tunekeep");

    let handle = SettingsHandle::new(settings)?;
    let engine = Arc::new(MembershipEngine::new(handle.clone(), Arc::new(Id3TagWriter::new())));
    let pipeline = AcquisitionPipeline::new(
        Arc::clone(&engine),
        Arc::new(YtDlpExtractor::new(handle)),
        Arc::new(HttpThumbnails::new()?),
    );

    let command = cli.command.unwrap_or(Commands::Menu);

    // Clean up orphaned songs at startup
    if !matches!(command, Commands::Reconcile) {
        let report = engine.reconcile_orphans().await?;
        print_reconcile(&report);
    }

    let mut console = Console::new(pipeline, BufReader::new(tokio::io::stdin()));
    match command {
        Commands::Menu => console.run_menu().await?,
        Commands::Manage { term } => console.manage(term).await?,
        Commands::Cleanse => console.cleanse().await?,
        Commands::Bulk => console.bulk().await?,
        Commands::Download {
            input: Some(input),
            playlists,
            ..
        } => console.download_input(&input, &playlists).await?,
        Commands::Download {
            input: None,
            playlists,
            auto,
        } => console.download_worklist(auto, &playlists).await?,
        Commands::Reconcile => console.reconcile().await?,
        Commands::Repair => console.repair().await?,
        Commands::Ingest { source } => console.ingest(&source).await?,
        Commands::Settings => console.settings().await?,
    }

    Ok(())
}
