//! Common re-exports for convenient entity usage.

pub use super::commit::{
    ActiveModel as CommitActiveModel, Column as CommitColumn, Entity as Commit,
    Model as CommitModel,
};
pub use super::ignored_repo::{
    ActiveModel as IgnoredRepoActiveModel, Column as IgnoredRepoColumn, Entity as IgnoredRepo,
    Model as IgnoredRepoModel,
};
pub use super::pull::{
    ActiveModel as PullActiveModel, Column as PullColumn, Entity as Pull, Model as PullModel,
};
