//! Database entities for the crawl store.

pub mod commit;
pub mod ignored_repo;
pub mod prelude;
pub mod pull;
