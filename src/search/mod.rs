//! Full-text search over purchases.
//!
//! Queries use PostgreSQL `to_tsquery` syntax on every backend. On
//! PostgreSQL the database does the matching; elsewhere the in-process
//! engine evaluates the same syntax over textual `tsvector`s.

pub mod engine;
pub mod in_process;
pub mod normalize;
pub mod postgres;
pub mod tsquery;
pub mod tsvector;

pub use engine::{engine_for, prepare_query, ReindexReport, ScoredPurchase, TextSearchEngine};
pub use in_process::InProcessTextSearch;
pub use normalize::{tokenize, SearchLanguage};
pub use postgres::PostgresTextSearch;
pub use tsquery::{TsQuery, TsQueryError};
pub use tsvector::TsVector;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: u64 = 50;
