//! Builds the projection query for a list's current sort and filter.
//!
//! The builder is a pure function of the sort/filter state over a kind
//! schema. All user data travels through bound parameters; the SQL text
//! itself only ever contains static fragments.

use medley_model::{Column, KindSchema, TagCategory};
use rusqlite::types::ToSql;

use crate::util::placeholders;

/// Sort direction for catalogs and views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::Descending)
    }
}

/// The active sort indicator: a display-column index, or none for
/// manual (position) order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub column: Option<usize>,
    pub order: SortOrder,
}

/// The active filter predicate. Only one dimension is active at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Filter {
    #[default]
    None,
    /// Case-insensitive substring match on the record name.
    NameContains(String),
    /// The item's edge set for `category` intersects `tag_ids`. An empty
    /// id set matches nothing, not everything.
    TagsAnyOf {
        category: TagCategory,
        tag_ids: Vec<i64>,
    },
    /// Exact rating match.
    RatingIs(u8),
}

/// Which derived key the stable in-memory pass sorts on. Joined tag
/// text and the sensitivity triple only exist after materialization, so
/// they cannot be ordered at the statement level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKey {
    TagText(TagCategory),
    Sensitivity,
}

/// A ready-to-run projection: statement text, bound parameters, and an
/// optional in-memory sort the record engine must apply afterwards.
pub struct QueryPlan {
    pub sql: String,
    pub params: Vec<Box<dyn ToSql>>,
    pub memory_sort: Option<(MemoryKey, SortOrder)>,
}

/// Build the view query for one list.
///
/// The base projection is always `id, position, name, url, rating` over
/// the list's items; the default order is position ascending. A sort
/// column that resolves to a derived column keeps the position order in
/// SQL and records the in-memory key instead. Equal sort keys keep
/// their relative position order (the position tiebreak below, plus the
/// stability of the in-memory pass).
pub fn build(schema: &KindSchema, list_id: i64, sort: &SortState, filter: &Filter) -> QueryPlan {
    let mut sql = String::from(
        "SELECT id, position, name, url, rating FROM items WHERE list_id = ?1",
    );
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(list_id)];

    match filter {
        Filter::None => {}
        Filter::NameContains(pattern) => {
            sql.push_str(&format!(" AND name LIKE ?{}", params.len() + 1));
            params.push(Box::new(format!("%{}%", pattern)));
        }
        Filter::TagsAnyOf { category, tag_ids } => {
            if tag_ids.is_empty() {
                // An empty membership set selects nothing.
                sql.push_str(" AND 0 = 1");
            } else {
                let cat_param = params.len() + 1;
                let in_list = placeholders(cat_param + 1, tag_ids.len());
                sql.push_str(&format!(
                    " AND EXISTS (SELECT 1 FROM item_tags e \
                     WHERE e.item_id = items.id AND e.category = ?{cat_param} \
                     AND e.tag_id IN ({in_list}))"
                ));
                params.push(Box::new(category.as_str()));
                for id in tag_ids {
                    params.push(Box::new(*id));
                }
            }
        }
        Filter::RatingIs(rating) => {
            sql.push_str(&format!(" AND rating = ?{}", params.len() + 1));
            params.push(Box::new(i64::from(*rating)));
        }
    }

    let mut memory_sort = None;
    let dir = sort.order.sql();
    let order_clause = match sort.column.and_then(|i| schema.column(i)) {
        None => "position ASC".to_string(),
        Some(Column::Name) => format!("name COLLATE NOCASE {dir}, position ASC"),
        Some(Column::Url) => format!("url COLLATE NOCASE {dir}, position ASC"),
        Some(Column::Rating) => format!("rating {dir}, position ASC"),
        Some(Column::Tags(category)) => {
            memory_sort = Some((MemoryKey::TagText(category), sort.order));
            "position ASC".to_string()
        }
        Some(Column::Sensitivity) => {
            memory_sort = Some((MemoryKey::Sensitivity, sort.order));
            "position ASC".to_string()
        }
    };
    sql.push_str(" ORDER BY ");
    sql.push_str(&order_clause);

    QueryPlan {
        sql,
        params,
        memory_sort,
    }
}
