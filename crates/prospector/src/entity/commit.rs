//! CommitRecord entity - one row per discovered commit of an organization.
//!
//! Rows are created by the discovery phase with every enrichment column unset
//! and filled in exactly once by the enrichment phase. The (org, repo, sha)
//! natural key carries a unique index; the surrogate UUID is what enrichment
//! updates are keyed by.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// CommitRecord model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commits")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Natural Key ─────────────────────────────────────────────────────────
    /// Organization the crawl run belongs to.
    pub org: String,
    /// Repository name within the organization.
    pub repo: String,
    /// Commit SHA.
    pub sha: String,

    // ─── Enrichment ──────────────────────────────────────────────────────────
    /// Commit author email.
    pub author_email: Option<String>,
    /// Commit author date.
    pub author_date: Option<DateTimeWithTimeZone>,
    /// Commit message.
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    /// Lines added.
    pub additions: Option<i32>,
    /// Lines deleted.
    pub deletions: Option<i32>,
    /// Total lines changed.
    pub total: Option<i32>,

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
    /// `author_email` doubles as the enrichment sentinel, matching the
    /// unenriched query in the store layer.
    pub fn is_enriched(&self) -> bool {
        self.author_email.is_some()
    }

    /// Compute the full path (org/repo@sha) for log context.
    pub fn full_path(&self) -> String {
        format!("{}/{}@{}", self.org, self.repo, self.sha)
    }
}
