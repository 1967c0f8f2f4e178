//! List kinds and their declarative schemas.
//!
//! Each kind of list (games, movies, ...) is described by a static
//! [`KindSchema`]: which tag categories it links to and which display
//! columns it presents, in order. The record engine is generic over
//! these descriptors, so adding a kind means adding a descriptor here
//! rather than a new engine.

use serde::{Deserialize, Serialize};

/// The kind of a list, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Games,
    Movies,
    Series,
    Books,
    Common,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Games => "games",
            ListKind::Movies => "movies",
            ListKind::Series => "series",
            ListKind::Books => "books",
            ListKind::Common => "common",
        }
    }

    /// Parse a stored kind string, tolerating unknown values as `None`.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "games" => Some(ListKind::Games),
            "movies" => Some(ListKind::Movies),
            "series" => Some(ListKind::Series),
            "books" => Some(ListKind::Books),
            "common" => Some(ListKind::Common),
            _ => None,
        }
    }

    pub fn schema(&self) -> &'static KindSchema {
        schema_for(*self)
    }
}

/// A tag category: one shared, reusable catalog dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    Categories,
    Developers,
    Platforms,
    Services,
    Actors,
    Directors,
    Authors,
}

impl TagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Categories => "categories",
            TagCategory::Developers => "developers",
            TagCategory::Platforms => "platforms",
            TagCategory::Services => "services",
            TagCategory::Actors => "actors",
            TagCategory::Directors => "directors",
            TagCategory::Authors => "authors",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "categories" => Some(TagCategory::Categories),
            "developers" => Some(TagCategory::Developers),
            "platforms" => Some(TagCategory::Platforms),
            "services" => Some(TagCategory::Services),
            "actors" => Some(TagCategory::Actors),
            "directors" => Some(TagCategory::Directors),
            "authors" => Some(TagCategory::Authors),
            _ => None,
        }
    }
}

/// One display column of a list kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Url,
    Rating,
    /// Derived text column joined from one tag category.
    Tags(TagCategory),
    /// The three-component content rating.
    Sensitivity,
}

/// Declarative description of one list kind.
///
/// Sort-column indices from callers resolve through `columns`; the
/// record engine consults `categories` to know which link tables to
/// join when materializing a view.
#[derive(Debug)]
pub struct KindSchema {
    pub kind: ListKind,
    pub categories: &'static [TagCategory],
    pub columns: &'static [Column],
}

impl KindSchema {
    /// The column at a display index, if any.
    pub fn column(&self, index: usize) -> Option<Column> {
        self.columns.get(index).copied()
    }

    /// Whether this kind carries the content-rating column.
    pub fn has_sensitivity(&self) -> bool {
        self.columns.contains(&Column::Sensitivity)
    }
}

static GAMES: KindSchema = KindSchema {
    kind: ListKind::Games,
    categories: &[
        TagCategory::Categories,
        TagCategory::Developers,
        TagCategory::Platforms,
        TagCategory::Services,
    ],
    columns: &[
        Column::Name,
        Column::Tags(TagCategory::Categories),
        Column::Tags(TagCategory::Developers),
        Column::Tags(TagCategory::Platforms),
        Column::Tags(TagCategory::Services),
        Column::Rating,
        Column::Sensitivity,
        Column::Url,
    ],
};

static MOVIES: KindSchema = KindSchema {
    kind: ListKind::Movies,
    categories: &[
        TagCategory::Categories,
        TagCategory::Actors,
        TagCategory::Directors,
    ],
    columns: &[
        Column::Name,
        Column::Tags(TagCategory::Categories),
        Column::Tags(TagCategory::Actors),
        Column::Tags(TagCategory::Directors),
        Column::Rating,
        Column::Url,
    ],
};

static SERIES: KindSchema = KindSchema {
    kind: ListKind::Series,
    categories: &[TagCategory::Categories, TagCategory::Actors],
    columns: &[
        Column::Name,
        Column::Tags(TagCategory::Categories),
        Column::Tags(TagCategory::Actors),
        Column::Rating,
        Column::Url,
    ],
};

static BOOKS: KindSchema = KindSchema {
    kind: ListKind::Books,
    categories: &[TagCategory::Categories, TagCategory::Authors],
    columns: &[
        Column::Name,
        Column::Tags(TagCategory::Categories),
        Column::Tags(TagCategory::Authors),
        Column::Rating,
        Column::Url,
    ],
};

static COMMON: KindSchema = KindSchema {
    kind: ListKind::Common,
    categories: &[TagCategory::Categories],
    columns: &[
        Column::Name,
        Column::Tags(TagCategory::Categories),
        Column::Rating,
        Column::Url,
    ],
};

/// The schema descriptor for a kind.
pub fn schema_for(kind: ListKind) -> &'static KindSchema {
    match kind {
        ListKind::Games => &GAMES,
        ListKind::Movies => &MOVIES,
        ListKind::Series => &SERIES,
        ListKind::Books => &BOOKS,
        ListKind::Common => &COMMON,
    }
}
