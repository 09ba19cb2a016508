//! # reelsetctl
//!
//! Fills Plex movie collections with posters and summaries.
//!
//! `reelsetctl run` walks every movie library (or the ones passed with
//! `--library`) and resolves each collection's poster and summary.
//! `reelsetctl list` prints the movie libraries the server exposes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use reelset_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use reelset_core::{
    CollectionSync, LibraryScope, PlexClient, RunOptions, SyncArea,
    TmdbProvider,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "reelsetctl", version)]
#[command(about = "Resolve Plex collection posters and summaries from TMDB")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
struct GlobalArgs {
    /// Path to reelset.toml (defaults to ./reelset.toml or ./config/reelset.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env)
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short = 'v', long, global = true)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve posters and/or summaries for every in-scope collection
    Run(RunArgs),
    /// List the movie libraries on the Plex server
    List,
}

#[derive(ClapArgs, Debug, Clone)]
struct RunArgs {
    /// Areas to sync; all of them when omitted
    #[arg(value_enum, value_name = "AREA")]
    areas: Vec<AreaArg>,

    /// Log every change instead of applying it
    #[arg(short, long)]
    dry_run: bool,

    /// Overwrite summaries that are already set
    #[arg(short, long)]
    force: bool,

    /// Restrict to a library section, by ID or name (repeatable)
    #[arg(long = "library", value_name = "ID|NAME")]
    libraries: Vec<LibraryScope>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AreaArg {
    Posters,
    Summaries,
}

impl From<AreaArg> for SyncArea {
    fn from(area: AreaArg) -> Self {
        match area {
            AreaArg::Posters => SyncArea::Posters,
            AreaArg::Summaries => SyncArea::Summaries,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    let ConfigLoad { config, warnings } = ConfigLoader::with_options(
        ConfigLoaderOptions {
            config_path: cli.global.config.clone(),
            env_file: cli.global.env_file.clone(),
        },
    )
    .load()
    .context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "loaded configuration file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    let plex = PlexClient::new(&config.plex.url, &config.plex.token)
        .context("failed to build Plex client")?;
    let tmdb = TmdbProvider::new(config.tmdb_settings())
        .context("failed to build TMDB client")?;

    let options = match &cli.command {
        Command::Run(args) => RunOptions {
            dry_run: args.dry_run,
            force: args.force,
            library_scope: args.libraries.clone(),
            areas: args.areas.iter().copied().map(SyncArea::from).collect(),
        },
        Command::List => RunOptions::default(),
    };
    let sync = CollectionSync::new(
        Arc::new(plex),
        Arc::new(tmdb),
        config.poster_settings(),
        options,
    );

    match cli.command {
        Command::List => list_sections(&sync).await,
        Command::Run(_) => run_sync(&sync).await,
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn list_sections(sync: &CollectionSync) -> anyhow::Result<()> {
    let sections = sync
        .list_movie_sections()
        .await
        .context("failed to list Plex library sections")?;

    if sections.is_empty() {
        println!("No movie libraries found.");
        return Ok(());
    }
    for section in sections {
        println!("{:>5}  {}", section.id.0, section.title);
    }
    Ok(())
}

async fn run_sync(sync: &CollectionSync) -> anyhow::Result<()> {
    if sync.options().dry_run {
        info!("dry run: no changes will be made");
    }

    let report = sync
        .run()
        .await
        .context("failed to list Plex library sections")?;

    println!(
        "{} collections in {} libraries: {} posters changed, {} summaries changed, {} skipped, {} unmatched, {} failed",
        report.collections,
        report.sections,
        report.posters_changed,
        report.summaries_changed,
        report.skipped,
        report.unmatched,
        report.failed,
    );
    Ok(())
}
