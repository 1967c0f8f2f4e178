//! Record, tag, and snapshot types shared by the store and the save codec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kinds::{ListKind, TagCategory};

/// Upper bound for item ratings and for each sensitivity component.
pub const RATING_MAX: u8 = 5;

/// One reusable tag value in a catalog.
///
/// `order` values are kept dense (`0..N-1`) within a catalog; `id` is
/// assigned by the store on insert and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub id: i64,
    pub order: i64,
    pub name: String,
}

/// A single many-to-many edge between an item and a tag-catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEdge {
    pub item_id: i64,
    pub tag_id: i64,
}

/// Bounded content-rating triple. Each component is clamped to
/// `0..=RATING_MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sensitivity {
    pub explicit: u8,
    pub violence: u8,
    pub bad_language: u8,
}

impl Sensitivity {
    pub fn new(explicit: u8, violence: u8, bad_language: u8) -> Self {
        Self {
            explicit: explicit.min(RATING_MAX),
            violence: violence.min(RATING_MAX),
            bad_language: bad_language.min(RATING_MAX),
        }
    }
}

/// The content rating of one item, keyed by item id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub item_id: i64,
    #[serde(flatten)]
    pub value: Sensitivity,
}

/// The persisted fields of one list row.
///
/// Derived tag text is never part of this type; it is recomputed from
/// the link tables whenever the view is refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: i64,
    pub position: i64,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub rating: u8,
}

/// View layout hints carried alongside a list.
///
/// `sort_column` is the display-column index, or -1 for manual order;
/// `sort_desc` is 0 for ascending, nonzero for descending. Both blocks
/// are optional in older save files and default to manual order with no
/// width hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewLayout {
    #[serde(default = "default_sort_column")]
    pub sort_column: i8,
    #[serde(default)]
    pub sort_desc: u8,
    #[serde(default)]
    pub column_widths: Vec<u32>,
}

fn default_sort_column() -> i8 {
    -1
}

impl Default for ViewLayout {
    fn default() -> Self {
        Self {
            sort_column: -1,
            sort_desc: 0,
            column_widths: Vec::new(),
        }
    }
}

/// Canonical, id-ordered image of one list, produced by the record
/// engine's `retrieve` and consumed by the save codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSnapshot {
    pub name: String,
    pub kind: ListKind,
    pub records: Vec<RecordRow>,
    #[serde(default)]
    pub catalogs: BTreeMap<TagCategory, Vec<TagEntry>>,
    #[serde(default)]
    pub edges: BTreeMap<TagCategory, Vec<TagEdge>>,
    #[serde(default)]
    pub sensitivity: Vec<SensitivityRow>,
    #[serde(default)]
    pub layout: ViewLayout,
}
