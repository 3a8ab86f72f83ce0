//! Prospector CLI - command-line interface for the metadata harvester.

mod commands;
mod config;
mod shutdown;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prospector")]
#[command(version)]
#[command(about = "Harvests commit and pull-request metadata for an organization")]
#[command(
    long_about = "Prospector continuously walks every repository of a source-hosting \
organization and records commit and pull-request metadata into a local database. \
Discovery records the keys (shas, pull numbers); enrichment fills in the details. \
Both phases are idempotent and safe to interrupt and restart."
)]
#[command(after_long_help = r#"EXAMPLES
    One full crawl of an organization:
        $ prospector crawl acme

    Discovery only, repeated continuously:
        $ prospector crawl acme --discover --loop

    Enrich what discovery already recorded:
        $ prospector crawl acme --enrich

    Only commits pushed this year, skipping two repos:
        $ prospector crawl acme --since 2026-01-01T00:00:00Z --ignore legacy --ignore archive

CONFIGURATION
    Prospector reads configuration from:
      1. ~/.config/prospector/config.toml (or $XDG_CONFIG_HOME/prospector/config.toml)
      2. ./prospector.toml
      3. Environment variables (PROSPECTOR_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    PROSPECTOR_DATABASE_URL    Database connection string (default: ~/.local/state/prospector/prospector.db)
    PROSPECTOR_GITHUB_TOKEN    API token for the source-hosting platform
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl an organization
    Crawl {
        /// Organization name (or from config/crawl.org)
        org: Option<String>,

        #[command(flatten)]
        opts: CrawlOptions,
    },
    /// Manage the stored per-organization ignore list
    Ignore {
        #[command(subcommand)]
        action: IgnoreAction,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Show current API quota
    Limits,
}

#[derive(Subcommand)]
enum IgnoreAction {
    /// Add a repository to the ignore list
    Add {
        /// Repository name
        repo: String,

        /// Organization (or from config/crawl.org)
        #[arg(short, long)]
        org: Option<String>,
    },
    /// Remove a repository from the ignore list
    Remove {
        /// Repository name
        repo: String,

        /// Organization (or from config/crawl.org)
        #[arg(short, long)]
        org: Option<String>,
    },
    /// List ignored repositories
    List {
        /// Organization (or from config/crawl.org)
        #[arg(short, long)]
        org: Option<String>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[derive(Debug, Clone, clap::Args)]
struct CrawlOptions {
    /// Run the discovery phase (record repos, shas, pull numbers)
    #[arg(short = 'd', long)]
    discover: bool,

    /// Run the enrichment phase (fill in metadata for recorded keys)
    #[arg(short = 'e', long)]
    enrich: bool,

    /// Keep crawling: drivers re-run after each pass instead of stopping
    #[arg(short = 'l', long = "loop")]
    loop_mode: bool,

    /// Maximum rows fetched per enrichment poll (default from config or 1000)
    #[arg(short = 'L', long)]
    limit: Option<u64>,

    /// Worker pool size (default from config or 5)
    #[arg(short = 's', long)]
    scale: Option<usize>,

    /// Seconds a driver sleeps after an empty pass (default from config or 15)
    #[arg(short = 'D', long)]
    delay: Option<u64>,

    /// Only consider commits since this RFC 3339 timestamp
    #[arg(long)]
    since: Option<chrono::DateTime<chrono::Utc>>,

    /// Only consider commits until this RFC 3339 timestamp
    #[arg(long)]
    until: Option<chrono::DateTime<chrono::Utc>>,

    /// Repository name to skip - can be given multiple times
    #[arg(short = 'i', long = "ignore")]
    ignores: Vec<String>,

    /// Don't crawl pull requests
    #[arg(short = 'P', long)]
    no_pulls: bool,

    /// Page size for listing requests (default from config or 100)
    #[arg(long)]
    per_page: Option<u32>,

    /// Proactive requests-per-second bound (default: unpaced)
    #[arg(short = 'r', long)]
    rps: Option<u32>,

    /// Don't reuse cached ETag validators for conditional requests
    #[arg(long)]
    no_etag_cache: bool,

    /// When the quota runs out, sleep until its reset epoch instead of a
    /// fixed cool-down
    #[arg(long)]
    until_reset: bool,

    /// API token (or PROSPECTOR_GITHUB_TOKEN / config file)
    #[arg(short = 't', long, env = "PROSPECTOR_GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("prospector=info,prospector_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config = config::Config::load();
    let cli = Cli::parse();

    let database_url = config
        .database_url()
        .ok_or("failed to determine database URL")?;

    // Ensure the database directory exists for SQLite.
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations.
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "database path '{}' is relative - behavior depends on current directory",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    match cli.command {
        Commands::Crawl { org, opts } => {
            commands::handle_crawl(org, opts, &config, &database_url).await?;
        }
        Commands::Ignore { action } => {
            commands::handle_ignore(action, &config, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::handle_migrate(action, &database_url).await?;
        }
        Commands::Limits => {
            commands::handle_limits(&config).await?;
        }
    }

    Ok(())
}
