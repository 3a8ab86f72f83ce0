//! Pull-request record operations, mirroring the commit store.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::pull::{ActiveModel, Column, Entity as Pull, Model};

use super::errors::{Result, StoreError};

/// Find a pull request by its natural key (org, repo, number).
pub async fn find_by_natural_key(
    db: &DatabaseConnection,
    org: &str,
    repo: &str,
    number: i64,
) -> Result<Option<Model>> {
    Pull::find()
        .filter(Column::Org.eq(org))
        .filter(Column::Repo.eq(repo))
        .filter(Column::Number.eq(number))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Find a pull request by its UUID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>> {
    Pull::find_by_id(id).one(db).await.map_err(StoreError::from)
}

/// Record a discovered pull request if it is not already present.
///
/// Returns `true` when a new row was inserted; a unique violation from a
/// concurrent discovery of the same key is swallowed.
pub async fn find_or_create(
    db: &DatabaseConnection,
    org: &str,
    repo: &str,
    number: i64,
) -> Result<bool> {
    if find_by_natural_key(db, org, repo, number).await?.is_some() {
        return Ok(false);
    }

    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        org: Set(org.to_string()),
        repo: Set(repo.to_string()),
        number: Set(number),
        discovered_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(_) => Ok(true),
        Err(e) => {
            let err = StoreError::from(e);
            if err.is_unique_violation() {
                tracing::debug!(org, repo, number, "pull discovery lost insert race");
                Ok(false)
            } else {
                Err(err)
            }
        }
    }
}

/// Enrichment payload for a single pull request.
#[derive(Debug, Clone)]
pub struct PullEnrichment {
    pub title: String,
    pub comments: i32,
    pub commits: i32,
    pub additions: i32,
    pub deletions: i32,
    pub changed_files: i32,
}

/// Write enrichment fields back, keyed by record id.
pub async fn enrich(db: &DatabaseConnection, id: Uuid, data: PullEnrichment) -> Result<Model> {
    let model = ActiveModel {
        id: Set(id),
        title: Set(Some(data.title)),
        comments: Set(Some(data.comments)),
        commits: Set(Some(data.commits)),
        additions: Set(Some(data.additions)),
        deletions: Set(Some(data.deletions)),
        changed_files: Set(Some(data.changed_files)),
        enriched_at: Set(Some(Utc::now().fixed_offset())),
        ..Default::default()
    };

    model.update(db).await.map_err(|e| match e {
        sea_orm::DbErr::RecordNotUpdated => StoreError::not_found_by_id(id),
        other => StoreError::from(other),
    })
}

/// Fetch up to `limit` pulls of an org whose enrichment is still unset.
///
/// `title IS NULL` is the enrichment sentinel.
pub async fn find_unenriched(
    db: &DatabaseConnection,
    org: &str,
    limit: u64,
) -> Result<Vec<Model>> {
    Pull::find()
        .filter(Column::Org.eq(org))
        .filter(Column::Title.is_null())
        .limit(limit)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Count the pull requests recorded for an org.
pub async fn count(db: &DatabaseConnection, org: &str) -> Result<u64> {
    use sea_orm::PaginatorTrait;

    Pull::find()
        .filter(Column::Org.eq(org))
        .count(db)
        .await
        .map_err(StoreError::from)
}
