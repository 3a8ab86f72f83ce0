//! Ignore-entry operations.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::ignored_repo::{ActiveModel, Column, Entity as IgnoredRepo};

use super::errors::{Result, StoreError};

/// Load the ignored repository names for an org.
pub async fn load(db: &DatabaseConnection, org: &str) -> Result<HashSet<String>> {
    let rows = IgnoredRepo::find()
        .filter(Column::Org.eq(org))
        .all(db)
        .await
        .map_err(StoreError::from)?;

    Ok(rows.into_iter().map(|r| r.repo).collect())
}

/// Record an (org, repo) pair as permanently excluded from discovery.
///
/// Returns `true` when a new entry was inserted; re-adding an existing pair
/// is a no-op.
pub async fn add(db: &DatabaseConnection, org: &str, repo: &str) -> Result<bool> {
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        org: Set(org.to_string()),
        repo: Set(repo.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    };

    match model.insert(db).await {
        Ok(_) => Ok(true),
        Err(e) => {
            let err = StoreError::from(e);
            if err.is_unique_violation() {
                Ok(false)
            } else {
                Err(err)
            }
        }
    }
}

/// Remove an ignore entry. Returns the number of rows deleted (0 or 1).
pub async fn remove(db: &DatabaseConnection, org: &str, repo: &str) -> Result<u64> {
    let result = IgnoredRepo::delete_many()
        .filter(Column::Org.eq(org))
        .filter(Column::Repo.eq(repo))
        .exec(db)
        .await
        .map_err(StoreError::from)?;

    Ok(result.rows_affected)
}
