//! PullRecord entity - one row per discovered pull request of an organization.
//!
//! Same lifecycle shape as the commit entity: discovery inserts the natural
//! key with the enrichment columns unset, enrichment fills them in by id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// PullRecord model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pulls")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Natural Key ─────────────────────────────────────────────────────────
    /// Organization the crawl run belongs to.
    pub org: String,
    /// Repository name within the organization.
    pub repo: String,
    /// Pull request number.
    pub number: i64,

    // ─── Enrichment ──────────────────────────────────────────────────────────
    /// Pull request title.
    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,
    /// Comment count.
    pub comments: Option<i32>,
    /// Commit count.
    pub commits: Option<i32>,
    /// Lines added.
    pub additions: Option<i32>,
    /// Lines deleted.
    pub deletions: Option<i32>,
    /// Files changed.
    pub changed_files: Option<i32>,

    // ─── Tracking ────────────────────────────────────────────────────────────
    /// When the row was created by discovery.
    pub discovered_at: DateTimeWithTimeZone,
    /// When enrichment last wrote the metadata columns.
    pub enriched_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True once the enrichment phase has written the metadata columns.
    ///
    /// `title` is the enrichment sentinel, matching the unenriched query in
    /// the store layer.
    pub fn is_enriched(&self) -> bool {
        self.title.is_some()
    }

    /// Compute the full path (org/repo#number) for log context.
    pub fn full_path(&self) -> String {
        format!("{}/{}#{}", self.org, self.repo, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_full_path() {
        let model = Model {
            id: Uuid::new_v4(),
            org: "acme".to_string(),
            repo: "widgets".to_string(),
            number: 42,
            title: None,
            comments: None,
            commits: None,
            additions: None,
            deletions: None,
            changed_files: None,
            discovered_at: Utc::now().fixed_offset(),
            enriched_at: None,
        };
        assert_eq!(model.full_path(), "acme/widgets#42");
        assert!(!model.is_enriched());
    }
}
