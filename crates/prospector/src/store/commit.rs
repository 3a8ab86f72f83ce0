//! Commit record operations: discovery, enrichment, and the unenriched poll.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::commit::{ActiveModel, Column, Entity as Commit, Model};

use super::errors::{Result, StoreError};

/// Find a commit by its natural key (org, repo, sha).
pub async fn find_by_natural_key(
    db: &DatabaseConnection,
    org: &str,
    repo: &str,
    sha: &str,
) -> Result<Option<Model>> {
    Commit::find()
        .filter(Column::Org.eq(org))
        .filter(Column::Repo.eq(repo))
        .filter(Column::Sha.eq(sha))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Find a commit by its UUID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>> {
    Commit::find_by_id(id).one(db).await.map_err(StoreError::from)
}

/// Record a discovered commit if it is not already present.
///
/// Returns `true` when a new row was inserted. The unique index on
/// (org, repo, sha) is the authoritative guard: a concurrent discovery of the
/// same key loses the insert race with a unique violation, which is swallowed
/// here as the benign outcome it is.
pub async fn find_or_create(
    db: &DatabaseConnection,
    org: &str,
    repo: &str,
    sha: &str,
) -> Result<bool> {
    if find_by_natural_key(db, org, repo, sha).await?.is_some() {
        return Ok(false);
    }

    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        org: Set(org.to_string()),
        repo: Set(repo.to_string()),
        sha: Set(sha.to_string()),
        discovered_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(_) => Ok(true),
        Err(e) => {
            let err = StoreError::from(e);
            if err.is_unique_violation() {
                tracing::debug!(org, repo, sha, "commit discovery lost insert race");
                Ok(false)
            } else {
                Err(err)
            }
        }
    }
}

/// Enrichment payload for a single commit.
#[derive(Debug, Clone)]
pub struct CommitEnrichment {
    pub author_email: String,
    pub author_date: Option<DateTime<FixedOffset>>,
    pub message: String,
    pub additions: i32,
    pub deletions: i32,
    pub total: i32,
}

/// Write enrichment fields back, keyed by record id.
///
/// Safe to re-run with the same input: the second call writes the same values
/// and only bumps `enriched_at`.
pub async fn enrich(db: &DatabaseConnection, id: Uuid, data: CommitEnrichment) -> Result<Model> {
    let model = ActiveModel {
        id: Set(id),
        author_email: Set(Some(data.author_email)),
        author_date: Set(data.author_date),
        message: Set(Some(data.message)),
        additions: Set(Some(data.additions)),
        deletions: Set(Some(data.deletions)),
        total: Set(Some(data.total)),
        enriched_at: Set(Some(Utc::now().fixed_offset())),
        ..Default::default()
    };

    model.update(db).await.map_err(|e| match e {
        sea_orm::DbErr::RecordNotUpdated => StoreError::not_found_by_id(id),
        other => StoreError::from(other),
    })
}

/// Fetch up to `limit` commits of an org whose enrichment is still unset.
///
/// `author_email IS NULL` is the enrichment sentinel.
pub async fn find_unenriched(
    db: &DatabaseConnection,
    org: &str,
    limit: u64,
) -> Result<Vec<Model>> {
    Commit::find()
        .filter(Column::Org.eq(org))
        .filter(Column::AuthorEmail.is_null())
        .limit(limit)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Count the commits recorded for an org.
pub async fn count(db: &DatabaseConnection, org: &str) -> Result<u64> {
    use sea_orm::PaginatorTrait;

    Commit::find()
        .filter(Column::Org.eq(org))
        .count(db)
        .await
        .map_err(StoreError::from)
}
