//! IgnoreEntry entity - (org, repo) pairs permanently excluded from discovery.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// IgnoreEntry model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ignored_repos")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Organization the ignore applies to.
    pub org: String,
    /// Repository name to exclude.
    pub repo: String,

    /// When the ignore was recorded.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
