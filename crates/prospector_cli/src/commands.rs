//! Command handlers.

use std::collections::HashSet;
use std::time::Duration;

use prospector::migration::{Migrator, MigratorTrait};
use prospector::store::ignore;
use prospector::{CrawlConfig, CrawlMode, GitHubClient, ThrottlePolicy, crawl, db};

use crate::config::Config;
use crate::shutdown;
use crate::{CrawlOptions, IgnoreAction, MigrateAction};

/// Merge config-file defaults and CLI flags into a `CrawlConfig` and run the
/// crawl to completion.
pub(crate) async fn handle_crawl(
    org: Option<String>,
    opts: CrawlOptions,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let org = org
        .or_else(|| config.crawl.org.clone())
        .ok_or("no organization given (pass one as an argument or set crawl.org)")?;

    let token = opts
        .token
        .clone()
        .or_else(|| config.github.token.clone())
        .unwrap_or_default();
    if token.is_empty() {
        tracing::warn!("no API token configured, quota will be severely limited");
    }

    // Neither phase flag means both, matching the common case of a full
    // crawl in one invocation.
    let mode = match (opts.discover, opts.enrich) {
        (true, false) => CrawlMode::Discover,
        (false, true) => CrawlMode::Enrich,
        _ => CrawlMode::Both,
    };

    let delay = Duration::from_secs(opts.delay.unwrap_or(config.crawl.delay_secs));
    let throttle = if opts.until_reset {
        ThrottlePolicy::UntilReset
    } else {
        ThrottlePolicy::Cooldown(delay)
    };

    let mut ignores: HashSet<String> = config.crawl.ignore.iter().cloned().collect();
    ignores.extend(opts.ignores.iter().cloned());

    let crawl_config = CrawlConfig {
        org: org.clone(),
        token,
        base_url: config.github.base_url.clone(),
        mode,
        scale: opts.scale.unwrap_or(config.crawl.scale),
        query_limit: opts.limit.unwrap_or(config.crawl.limit),
        per_page: opts.per_page.unwrap_or(config.crawl.per_page),
        ignores,
        since: opts.since,
        until: opts.until,
        loop_mode: opts.loop_mode,
        delay,
        throttle,
        requests_per_second: opts.rps.or(config.crawl.requests_per_second),
        etag_cache: !opts.no_etag_cache && config.crawl.etag_cache,
        pulls: !opts.no_pulls && config.crawl.pulls,
    };

    let database = db::connect_and_migrate(database_url).await?;
    let shutdown_flag = shutdown::setup_shutdown_handler();

    tracing::info!(org, mode = ?crawl_config.mode, loop_mode = crawl_config.loop_mode, "starting crawl");
    crawl::run(crawl_config, database, shutdown_flag).await?;

    Ok(())
}

/// Manage the `ignored_repos` rows for an organization.
pub(crate) async fn handle_ignore(
    action: IgnoreAction,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolve_org = |org: Option<String>| {
        org.or_else(|| config.crawl.org.clone())
            .ok_or("no organization given (pass --org or set crawl.org)")
    };

    let db = db::connect_and_migrate(database_url).await?;

    match action {
        IgnoreAction::Add { repo, org } => {
            let org = resolve_org(org)?;
            if ignore::add(&db, &org, &repo).await? {
                println!("Ignoring {org}/{repo}.");
            } else {
                println!("{org}/{repo} is already ignored.");
            }
        }
        IgnoreAction::Remove { repo, org } => {
            let org = resolve_org(org)?;
            if ignore::remove(&db, &org, &repo).await? > 0 {
                println!("No longer ignoring {org}/{repo}.");
            } else {
                println!("{org}/{repo} was not ignored.");
            }
        }
        IgnoreAction::List { org } => {
            let org = resolve_org(org)?;
            let mut repos: Vec<String> = ignore::load(&db, &org).await?.into_iter().collect();
            repos.sort();
            if repos.is_empty() {
                println!("No ignored repositories for {org}.");
            } else {
                for repo in repos {
                    println!("{org}/{repo}");
                }
            }
        }
    }

    Ok(())
}

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            println!("Applying migrations...");
            Migrator::up(&db, None).await?;
            println!("Migrations applied successfully.");
        }
        MigrateAction::Down => {
            println!("Rolling back last migration...");
            Migrator::down(&db, Some(1)).await?;
            println!("Rollback complete.");
        }
        MigrateAction::Status => {
            println!("Migration status:");
            Migrator::status(&db).await?;
        }
        MigrateAction::Fresh => {
            println!("Dropping all tables and reapplying migrations...");
            Migrator::fresh(&db).await?;
            println!("Fresh migration complete.");
        }
    }

    Ok(())
}

/// Print the current core API quota.
pub(crate) async fn handle_limits(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let crawl_config = CrawlConfig {
        token: config.github.token.clone().unwrap_or_default(),
        base_url: config.github.base_url.clone(),
        ..CrawlConfig::default()
    };

    let client = GitHubClient::new(&crawl_config)?;
    let quota = client.fetch_quota().await?;

    match quota.remaining {
        Some(remaining) => println!("Core quota remaining: {remaining}"),
        None => println!("Core quota remaining: unknown"),
    }
    match quota.reset_at {
        Some(reset_at) => println!("Resets at: {reset_at}"),
        None => println!("Resets at: unknown"),
    }

    Ok(())
}
