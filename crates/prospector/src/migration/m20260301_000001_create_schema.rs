//! Initial migration to create the prospector database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_commits(manager).await?;
        self.create_pulls(manager).await?;
        self.create_ignored_repos(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IgnoredRepos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pulls::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Commits::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_commits(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commits::Table)
                    .if_not_exists()
                    // Internal
                    .col(ColumnDef::new(Commits::Id).uuid().not_null().primary_key())
                    // Natural key
                    .col(ColumnDef::new(Commits::Org).string().not_null())
                    .col(ColumnDef::new(Commits::Repo).string().not_null())
                    .col(ColumnDef::new(Commits::Sha).string().not_null())
                    // Enrichment (all null until the enrichment phase runs)
                    .col(ColumnDef::new(Commits::AuthorEmail).string().null())
                    .col(
                        ColumnDef::new(Commits::AuthorDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Commits::Message).text().null())
                    .col(ColumnDef::new(Commits::Additions).integer().null())
                    .col(ColumnDef::new(Commits::Deletions).integer().null())
                    .col(ColumnDef::new(Commits::Total).integer().null())
                    // Tracking
                    .col(
                        ColumnDef::new(Commits::DiscoveredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Commits::EnrichedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique natural key - the authoritative guard against duplicate
        // discovery under concurrency.
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_natural_key")
                    .table(Commits::Table)
                    .col(Commits::Org)
                    .col(Commits::Repo)
                    .col(Commits::Sha)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Partial scans for the enrichment poll (org + sentinel column).
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_org_email")
                    .table(Commits::Table)
                    .col(Commits::Org)
                    .col(Commits::AuthorEmail)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_pulls(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pulls::Table)
                    .if_not_exists()
                    // Internal
                    .col(ColumnDef::new(Pulls::Id).uuid().not_null().primary_key())
                    // Natural key
                    .col(ColumnDef::new(Pulls::Org).string().not_null())
                    .col(ColumnDef::new(Pulls::Repo).string().not_null())
                    .col(ColumnDef::new(Pulls::Number).big_integer().not_null())
                    // Enrichment
                    .col(ColumnDef::new(Pulls::Title).text().null())
                    .col(ColumnDef::new(Pulls::Comments).integer().null())
                    .col(ColumnDef::new(Pulls::Commits).integer().null())
                    .col(ColumnDef::new(Pulls::Additions).integer().null())
                    .col(ColumnDef::new(Pulls::Deletions).integer().null())
                    .col(ColumnDef::new(Pulls::ChangedFiles).integer().null())
                    // Tracking
                    .col(
                        ColumnDef::new(Pulls::DiscoveredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Pulls::EnrichedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pulls_natural_key")
                    .table(Pulls::Table)
                    .col(Pulls::Org)
                    .col(Pulls::Repo)
                    .col(Pulls::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pulls_org_title")
                    .table(Pulls::Table)
                    .col(Pulls::Org)
                    .col(Pulls::Title)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_ignored_repos(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IgnoredRepos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IgnoredRepos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IgnoredRepos::Org).string().not_null())
                    .col(ColumnDef::new(IgnoredRepos::Repo).string().not_null())
                    .col(
                        ColumnDef::new(IgnoredRepos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ignored_repos_org_repo")
                    .table(IgnoredRepos::Table)
                    .col(IgnoredRepos::Org)
                    .col(IgnoredRepos::Repo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Commits {
    Table,
    Id,
    Org,
    Repo,
    Sha,
    AuthorEmail,
    AuthorDate,
    Message,
    Additions,
    Deletions,
    Total,
    DiscoveredAt,
    EnrichedAt,
}

#[derive(DeriveIden)]
enum Pulls {
    Table,
    Id,
    Org,
    Repo,
    Number,
    Title,
    Comments,
    Commits,
    Additions,
    Deletions,
    ChangedFiles,
    DiscoveredAt,
    EnrichedAt,
}

#[derive(DeriveIden)]
enum IgnoredRepos {
    Table,
    Id,
    Org,
    Repo,
    CreatedAt,
}
