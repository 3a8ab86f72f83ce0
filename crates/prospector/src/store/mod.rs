//! Store operations for commit and pull records.
//!
//! The engine needs only four shapes of access, all provided here:
//! find-by-natural-key, insert-if-absent ([`commit::find_or_create`] /
//! [`pull::find_or_create`]), update-by-id ([`commit::enrich`] /
//! [`pull::enrich`]), and the bounded unenriched poll queries.

pub mod commit;
mod errors;
pub mod ignore;
pub mod pull;

pub use commit::CommitEnrichment;
pub use errors::{Result, StoreError};
pub use pull::PullEnrichment;
