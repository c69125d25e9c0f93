//! Blog Mirror CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use blog_mirror::{
    error::Result,
    models::Config,
    pipeline::{self, Mirror, PostSource},
};
use clap::{Parser, Subcommand};

/// Blog Mirror - static copy of a Confluence space blog
#[derive(Parser, Debug)]
#[command(
    name = "blog-mirror",
    version,
    about = "Mirror a Confluence space blog with comments and attachments"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "mirror.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Server root URL (overrides server.url)
    #[arg(long)]
    server: Option<String>,

    /// Space key (overrides server.space)
    #[arg(long)]
    space: Option<String>,

    /// Output folder (overrides output.folder)
    #[arg(long)]
    folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Test the connection and credentials
    Check,

    /// Validate configuration
    Validate,

    /// List blog posts into the mirror index
    List {
        /// Offset of the first post (overrides listing.start)
        #[arg(long)]
        start: Option<u64>,

        /// Stop at this offset (overrides listing.end)
        #[arg(long)]
        end: Option<u64>,

        /// Replace the index instead of merging with it
        #[arg(long)]
        replace: bool,
    },

    /// Export posts by id, from a file, or from the mirror index
    Scrape {
        /// Post id, may be repeated
        #[arg(long = "id")]
        ids: Vec<String>,

        /// CSV or plain id list (default: {folder}/{space}/list_blogposts.csv)
        #[arg(long, conflicts_with = "ids")]
        file: Option<PathBuf>,

        /// The file has no header row
        #[arg(long, requires = "file")]
        no_header: bool,
    },

    /// Rebuild index.html from the exported documents
    Index,

    /// Run full pipeline: List → Scrape → Index
    Pipeline {
        /// Skip listing, use the existing index
        #[arg(long)]
        skip_list: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Apply command-line overrides on top of the loaded file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(server) = &cli.server {
        config.server.url = server.clone();
    }
    if let Some(space) = &cli.space {
        config.server.space = space.clone();
    }
    if let Some(folder) = &cli.folder {
        config.output.folder = folder.clone();
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Blog mirror starting...");

    let mut config = if cli.config.exists() {
        log::info!("Loaded configuration from {}", cli.config.display());
        Config::load_or_default(&cli.config)
    } else {
        log::info!(
            "No configuration at {}, using defaults and flags",
            cli.config.display()
        );
        Config::default()
    };
    apply_overrides(&mut config, &cli);

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    if matches!(cli.command, Command::Validate) {
        log::info!("✓ Config OK");
        log::info!("Mirror root: {}", config.mirror_root().display());
        return Ok(());
    }

    let mirror = Mirror::from_config(config)?;

    match cli.command {
        Command::Validate => {}

        Command::Check => {
            let probe = mirror.test_connection().await?;
            log::info!("✓ Server reachable (status {})", probe.status);
        }

        Command::List { start, end, replace } => {
            let listing = &mirror.config().listing;
            let start = start.unwrap_or(listing.start);
            let end = end.or(listing.end);
            let merge = listing.merge && !replace;

            let report = mirror.list_posts(start, end, merge).await?;
            for export in &report.exports {
                log::info!(
                    "{}: {} entries ({} before, {} duplicated)",
                    export.path.display(),
                    export.written,
                    export.previous,
                    export.duplicates
                );
            }
            log::info!("List complete!");
        }

        Command::Scrape {
            ids,
            file,
            no_header,
        } => {
            let source = if !ids.is_empty() {
                PostSource::Ids(ids)
            } else if let Some(path) = file {
                PostSource::File {
                    path,
                    has_header: !no_header,
                }
            } else {
                PostSource::DefaultIndex
            };

            let report = mirror.scrape_items(source).await?;
            for (id, error) in &report.failures {
                log::warn!("Post {id} not exported: {error}");
            }
            log::info!("Scrape complete!");
        }

        Command::Index => {
            let path = mirror.rebuild_index().await?;
            log::info!("Index written to {}", path.display());
        }

        Command::Pipeline { skip_list } => {
            pipeline::run_pipeline(&mirror, skip_list).await?;
            log::info!("Pipeline complete!");
        }
    }

    Ok(())
}
