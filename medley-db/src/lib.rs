//! SQLite store for the medley list keeper.
//!
//! Provides schema creation, per-list tag catalogs, item/tag link
//! tables, the ordered record engine, and view query building, backed
//! by SQLite (via rusqlite with the bundled feature).

pub mod catalog;
pub mod error;
pub mod links;
pub mod lists;
mod order;
pub mod records;
pub mod schema;
mod util;
pub mod view;

pub use catalog::{
    add_tag_if_absent, list_tags, move_tags_by, move_tags_to, remove_tags, rename_tag,
};
pub use error::StoreError;
pub use links::{
    cascade_remove, edges_for, joined_names_for, sensitivity_for, set_edges, set_sensitivity,
};
pub use lists::{
    all_lists, create_list, dataset_stats, delete_list, get_list, layout, rename_list,
    set_layout, DatasetStats, ListInfo,
};
pub use records::{snapshot_list, FieldValue, RecordTable, ViewRow};
pub use schema::{open_database, open_memory, SchemaError};
pub use view::{Filter, QueryPlan, SortOrder, SortState};
