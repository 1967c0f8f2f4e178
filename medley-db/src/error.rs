//! Store-level error type shared by catalog, link, and record operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Positional operations require a loaded view; run `refresh()` first.
    #[error("View is stale: run refresh() before positional operations")]
    StaleView,
}
