//! Configuration file support for prospector.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `PROSPECTOR_`, e.g.,
//!    `PROSPECTOR_GITHUB_TOKEN`)
//! 3. Config file (~/.config/prospector/config.toml or ./prospector.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/prospector/prospector.db"
//!
//! [github]
//! token = "ghp_..."          # or PROSPECTOR_GITHUB_TOKEN
//! base_url = "https://api.github.com"
//!
//! [crawl]
//! org = "acme"
//! scale = 5
//! limit = 1000
//! per_page = 100
//! delay_secs = 15
//! ignore = ["legacy", "archive"]
//! pulls = true
//! etag_cache = true
//! requests_per_second = 10
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub crawl: CrawlSection,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL. Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/prospector/prospector.db`.
    pub url: Option<String>,
}

/// Upstream API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API token. Can also be set via PROSPECTOR_GITHUB_TOKEN.
    pub token: Option<String>,
    /// API base URL, for GitHub Enterprise instances.
    pub base_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: "https://api.github.com".to_string(),
        }
    }
}

/// Default crawl options, overridable per-run by CLI flags.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CrawlSection {
    /// Organization to crawl.
    pub org: Option<String>,
    /// Worker pool size.
    pub scale: usize,
    /// Row limit per enrichment poll.
    pub limit: u64,
    /// Page size for listing requests.
    pub per_page: u32,
    /// Cool-down between driver passes, in seconds.
    pub delay_secs: u64,
    /// Repository names to skip.
    pub ignore: Vec<String>,
    /// Whether pull requests are crawled alongside commits.
    pub pulls: bool,
    /// Whether conditional requests reuse cached validators.
    pub etag_cache: bool,
    /// Optional proactive requests-per-second bound.
    pub requests_per_second: Option<u32>,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            org: None,
            scale: 5,
            limit: 1000,
            per_page: 100,
            delay_secs: 15,
            ignore: Vec::new(),
            pulls: true,
            etag_cache: true,
            requests_per_second: None,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/prospector/config.toml)
    /// 3. Local config file (./prospector.toml)
    /// 4. Environment variables with PROSPECTOR_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "prospector") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("prospector.toml");
        if local_config.exists() {
            tracing::debug!("loading config from ./prospector.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g. PROSPECTOR_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("PROSPECTOR")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory
    /// path. The `mode=rwc` parameter creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("prospector.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the default state directory path.
    ///
    /// On Linux this is `$XDG_STATE_HOME/prospector` or
    /// `~/.local/state/prospector`.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "prospector").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
