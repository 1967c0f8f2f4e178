//! Data model types for the medley list keeper.
//!
//! This crate defines the persistent data model (list kinds, tag
//! categories, records, catalog entries, and snapshots) without any
//! database dependencies. Consumers can use these types directly for
//! serialization, display, or passing to `medley-db` for persistence.

pub mod kinds;
pub mod types;

pub use kinds::{schema_for, Column, KindSchema, ListKind, TagCategory};
pub use types::{
    ListSnapshot, RecordRow, SensitivityRow, Sensitivity, TagEdge, TagEntry, ViewLayout,
    RATING_MAX,
};
