//! Prospector - continuous commit and pull-request metadata harvesting.
//!
//! Prospector walks every repository of a source-hosting organization,
//! records commit shas and pull numbers into a relational store (discovery),
//! then fills in per-item metadata by polling the store for rows that still
//! lack it (enrichment). Both phases run as tasks on one fixed-size worker
//! pool and are idempotent, so a crawl can be interrupted and restarted at
//! any point.
//!
//! # Features
//!
//! - `migrate` - Enables database migration support. When enabled, you can
//!   use [`connect_and_migrate`] to automatically run migrations on
//!   connection.
//!
//! # Example
//!
//! ```ignore
//! use prospector::{CrawlConfig, connect_and_migrate, crawl};
//!
//! let db = connect_and_migrate("sqlite://prospector.db?mode=rwc").await?;
//! let config = CrawlConfig {
//!     org: "acme".to_string(),
//!     token: std::env::var("GITHUB_TOKEN")?,
//!     ..CrawlConfig::default()
//! };
//! crawl::run(config, db, shutdown_flag).await?;
//! ```

pub mod config;
pub mod crawl;
pub mod db;
pub mod entity;
pub mod etag;
pub mod github;
pub mod retry;
pub mod store;

#[cfg(feature = "migrate")]
pub mod migration;

pub use config::{CrawlConfig, CrawlMode, ThrottlePolicy};
pub use crawl::{CrawlContext, CrawlError, CrawlTask, TaskQueue, WorkerPool};
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use etag::EtagCache;
pub use github::{GitHubClient, GitHubError};
pub use store::StoreError;
