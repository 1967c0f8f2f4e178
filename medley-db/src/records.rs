//! The ordered record engine for one list.
//!
//! A [`RecordTable`] owns the in-memory view of a list's records and
//! orchestrates everything around them: positional CRUD, reordering,
//! link-table updates, and view refreshes. The backing store is always
//! written before the cache, so a failed statement leaves the visible
//! view at its last known-good state; a partially applied batch is
//! reconciled by the next [`RecordTable::refresh`].

use std::collections::BTreeMap;

use medley_model::{
    Column, KindSchema, ListKind, ListSnapshot, RecordRow, Sensitivity, SensitivityRow, TagEdge,
    TagCategory, RATING_MAX,
};
use rusqlite::{params, Connection};

use crate::catalog;
use crate::error::StoreError;
use crate::links;
use crate::lists;
use crate::order::{plan_relocate, plan_shift};
use crate::util::placeholders;
use crate::view::{self, Filter, MemoryKey, SortOrder, SortState};

/// One materialized row of the current view: the persisted fields plus
/// the derived per-category tag text and the content rating.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub record: RecordRow,
    pub tags: BTreeMap<TagCategory, String>,
    pub sensitivity: Sensitivity,
}

/// Directly writable scalar fields. Tag columns go through
/// [`RecordTable::set_tags`]; everything else is derived.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Name(String),
    Rating(u8),
}

/// The ordered record engine for one list.
///
/// Starts stale: [`RecordTable::refresh`] must run before any
/// positional operation.
#[derive(Debug)]
pub struct RecordTable {
    list_id: i64,
    schema: &'static KindSchema,
    rows: Vec<ViewRow>,
    sort: SortState,
    filter: Filter,
    loaded: bool,
}

impl RecordTable {
    pub fn new(list_id: i64, kind: ListKind) -> Self {
        Self {
            list_id,
            schema: kind.schema(),
            rows: Vec::new(),
            sort: SortState::default(),
            filter: Filter::None,
            loaded: false,
        }
    }

    pub fn list_id(&self) -> i64 {
        self.list_id
    }

    pub fn schema(&self) -> &'static KindSchema {
        self.schema
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.columns.len()
    }

    /// The display text of one cell, resolved through the kind schema.
    pub fn cell_text(&self, row: usize, column: usize) -> Option<String> {
        let view_row = self.rows.get(row)?;
        Some(match self.schema.column(column)? {
            Column::Name => view_row.record.name.clone(),
            Column::Url => view_row.record.url.clone(),
            Column::Rating => view_row.record.rating.to_string(),
            Column::Tags(category) => view_row.tags.get(&category).cloned().unwrap_or_default(),
            Column::Sensitivity => {
                let s = view_row.sensitivity;
                format!("{}/{}/{}", s.explicit, s.violence, s.bad_language)
            }
        })
    }

    /// Run the current view query, replace the cache, and re-join every
    /// link table to repopulate derived text. The only path that brings
    /// the cache back in sync after external store edits.
    pub fn refresh(&mut self, conn: &Connection) -> Result<(), StoreError> {
        let plan = view::build(self.schema, self.list_id, &self.sort, &self.filter);
        let bound: Vec<&dyn rusqlite::types::ToSql> =
            plan.params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&plan.sql)?;
        let records = stmt
            .query_map(bound.as_slice(), row_to_record)?
            .collect::<Result<Vec<RecordRow>, _>>()?;
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();

        let mut tags_by_category = BTreeMap::new();
        for &category in self.schema.categories {
            tags_by_category.insert(category, links::joined_names_for(conn, category, &ids)?);
        }
        let ratings = if self.schema.has_sensitivity() {
            links::sensitivity_for(conn, &ids)?
        } else {
            BTreeMap::new()
        };

        let mut rows: Vec<ViewRow> = records
            .into_iter()
            .map(|record| {
                let tags = self
                    .schema
                    .categories
                    .iter()
                    .map(|&category| {
                        let text = tags_by_category
                            .get(&category)
                            .and_then(|m| m.get(&record.id))
                            .cloned()
                            .unwrap_or_default();
                        (category, text)
                    })
                    .collect();
                let sensitivity = ratings.get(&record.id).copied().unwrap_or_default();
                ViewRow {
                    record,
                    tags,
                    sensitivity,
                }
            })
            .collect();

        if let Some((key, order)) = plan.memory_sort {
            sort_rows(&mut rows, key, order);
        }

        self.rows = rows;
        self.loaded = true;
        Ok(())
    }

    /// Insert `count` placeholder records. With no explicit position, or
    /// while a sort or filter is active, they append at the end;
    /// otherwise positions shift to open a gap at `at`. Returns the new
    /// record ids in row order.
    pub fn insert(
        &mut self,
        conn: &Connection,
        count: usize,
        at: Option<usize>,
    ) -> Result<Vec<i64>, StoreError> {
        if !self.loaded {
            return Err(StoreError::StaleView);
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let insert_at = match at {
            Some(index) if self.manual_order() && index < self.rows.len() => Some(index),
            _ => None,
        };

        let mut inserted = Vec::with_capacity(count);
        let base = match insert_at {
            Some(index) => {
                let base = self.rows[index].record.position;
                conn.execute(
                    "UPDATE items SET position = position + ?3 WHERE list_id = ?1 AND position >= ?2",
                    params![self.list_id, base, count as i64],
                )?;
                base
            }
            None => conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM items WHERE list_id = ?1",
                params![self.list_id],
                |row| row.get(0),
            )?,
        };
        for offset in 0..count {
            conn.execute(
                "INSERT INTO items (list_id, position) VALUES (?1, ?2)",
                params![self.list_id, base + offset as i64],
            )?;
            inserted.push(conn.last_insert_rowid());
        }

        let new_rows: Vec<ViewRow> = inserted
            .iter()
            .enumerate()
            .map(|(offset, &id)| blank_row(id, base + offset as i64, self.schema))
            .collect();
        match insert_at {
            Some(index) => {
                for row in &mut self.rows[index..] {
                    row.record.position += count as i64;
                }
                self.rows.splice(index..index, new_rows);
            }
            None => self.rows.extend(new_rows),
        }
        Ok(inserted)
    }

    /// Delete records, cascading to their edges and content ratings.
    /// Remaining positions are not renumbered here; the gap closes on
    /// the next normalization.
    pub fn remove(&mut self, conn: &Connection, ids: &[i64]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        links::cascade_remove(conn, ids)?;
        let sql = format!(
            "DELETE FROM items WHERE id IN ({})",
            placeholders(1, ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let bound: Vec<&dyn rusqlite::types::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
        stmt.execute(bound.as_slice())?;

        self.rows.retain(|row| !ids.contains(&row.record.id));
        Ok(())
    }

    /// Write one scalar field through to the store and the cache.
    pub fn set_field(
        &mut self,
        conn: &Connection,
        id: i64,
        value: FieldValue,
    ) -> Result<(), StoreError> {
        let changed = match &value {
            FieldValue::Name(name) => conn.execute(
                "UPDATE items SET name = ?2 WHERE id = ?1",
                params![id, name],
            )?,
            FieldValue::Rating(rating) => conn.execute(
                "UPDATE items SET rating = ?2 WHERE id = ?1",
                params![id, (*rating).min(RATING_MAX)],
            )?,
        };
        if changed == 0 {
            return Err(StoreError::NotFound { entity: "item", id });
        }

        if let Some(row) = self.rows.iter_mut().find(|r| r.record.id == id) {
            match value {
                FieldValue::Name(name) => row.record.name = name,
                FieldValue::Rating(rating) => row.record.rating = rating.min(RATING_MAX),
            }
        }
        Ok(())
    }

    /// Replace the item's edge set for one category, then refresh just
    /// that row's derived text.
    pub fn set_tags(
        &mut self,
        conn: &Connection,
        id: i64,
        category: TagCategory,
        tag_ids: &[i64],
    ) -> Result<(), StoreError> {
        if !self.schema.categories.contains(&category) {
            log::debug!(
                "ignoring tags for category '{}' on a '{}' list",
                category.as_str(),
                self.schema.kind.as_str()
            );
            return Ok(());
        }

        links::set_edges(conn, id, category, tag_ids)?;

        let joined = links::joined_names_for(conn, category, &[id])?;
        if let Some(row) = self.rows.iter_mut().find(|r| r.record.id == id) {
            row.tags
                .insert(category, joined.get(&id).cloned().unwrap_or_default());
        }
        Ok(())
    }

    /// Replace the item's content rating (components clamped).
    pub fn set_sensitivity(
        &mut self,
        conn: &Connection,
        id: i64,
        value: Sensitivity,
    ) -> Result<(), StoreError> {
        let value = Sensitivity::new(value.explicit, value.violence, value.bad_language);
        links::set_sensitivity(conn, id, value)?;
        if let Some(row) = self.rows.iter_mut().find(|r| r.record.id == id) {
            row.sensitivity = value;
        }
        Ok(())
    }

    /// Move the selected records one step up (`delta < 0`) or down,
    /// swapping positions with the adjacent record. Records at the
    /// boundary stay put. Returns the selection's new row indices.
    ///
    /// Manual reordering only applies to the manual view: with a sort
    /// or filter active the call is a no-op and the current indices
    /// come back unchanged.
    pub fn move_by(
        &mut self,
        conn: &Connection,
        ids: &[i64],
        delta: i32,
    ) -> Result<Vec<usize>, StoreError> {
        if !self.loaded {
            return Err(StoreError::StaleView);
        }
        let selected = self.indices_of(ids);
        if selected.is_empty() {
            return Ok(Vec::new());
        }
        if !self.manual_order() {
            log::debug!("ignoring step move: sort or filter active");
            return Ok(selected);
        }

        let plan = plan_shift(self.rows.len(), &selected, delta);
        for &(a, b) in &plan.swaps {
            let pos_a = self.rows[a].record.position;
            let pos_b = self.rows[b].record.position;
            update_position(conn, self.rows[a].record.id, pos_b)?;
            update_position(conn, self.rows[b].record.id, pos_a)?;
            self.rows[a].record.position = pos_b;
            self.rows[b].record.position = pos_a;
            self.rows.swap(a, b);
        }
        Ok(plan.new_indices)
    }

    /// Detach the selected records and reinsert them contiguously at
    /// `target` (clamped), assigning fresh dense positions, then
    /// normalize from the first index that changed. Returns the
    /// selection's new row indices.
    pub fn move_to(
        &mut self,
        conn: &Connection,
        ids: &[i64],
        target: usize,
    ) -> Result<Vec<usize>, StoreError> {
        if !self.loaded {
            return Err(StoreError::StaleView);
        }
        let selected = self.indices_of(ids);
        if selected.is_empty() {
            return Ok(Vec::new());
        }
        if !self.manual_order() {
            log::debug!("ignoring absolute move: sort or filter active");
            return Ok(selected);
        }

        let plan = plan_relocate(self.rows.len(), &selected, target);
        let reordered: Vec<ViewRow> = plan.order.iter().map(|&i| self.rows[i].clone()).collect();
        self.rows = reordered;
        for &slot in &plan.new_indices {
            let id = self.rows[slot].record.id;
            update_position(conn, id, slot as i64)?;
            self.rows[slot].record.position = slot as i64;
        }
        self.normalize_positions(conn, plan.first_changed)?;
        Ok(plan.new_indices)
    }

    /// Walk the cache from `from` and write the corrected position
    /// wherever a row disagrees with its index. Closes the gaps left by
    /// removals and absolute moves.
    pub fn normalize_positions(&mut self, conn: &Connection, from: usize) -> Result<(), StoreError> {
        for index in from..self.rows.len() {
            let want = index as i64;
            if self.rows[index].record.position != want {
                update_position(conn, self.rows[index].record.id, want)?;
                self.rows[index].record.position = want;
            }
        }
        Ok(())
    }

    /// Change the sort indicator and re-run the view. An out-of-range
    /// column index falls back to manual order.
    pub fn set_sort(
        &mut self,
        conn: &Connection,
        column: Option<usize>,
        order: SortOrder,
    ) -> Result<(), StoreError> {
        self.sort = SortState {
            column: column.filter(|&i| i < self.schema.columns.len()),
            order,
        };
        self.refresh(conn)
    }

    /// Change the filter predicate and re-run the view.
    pub fn set_filter(&mut self, conn: &Connection, filter: Filter) -> Result<(), StoreError> {
        self.filter = filter;
        self.refresh(conn)
    }

    /// Canonical id-ascending snapshot of the whole list, independent
    /// of the active sort and filter. Used by the save codec.
    pub fn retrieve(&self, conn: &Connection) -> Result<ListSnapshot, StoreError> {
        snapshot_list(conn, self.list_id)
    }

    fn manual_order(&self) -> bool {
        self.sort.column.is_none() && self.filter == Filter::None
    }

    fn indices_of(&self, ids: &[i64]) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| ids.contains(&row.record.id))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Canonical snapshot of one list: records by id ascending, catalogs by
/// `ord`, edge sets and content ratings grouped deterministically.
pub fn snapshot_list(conn: &Connection, list_id: i64) -> Result<ListSnapshot, StoreError> {
    let info = lists::get_list(conn, list_id)?.ok_or(StoreError::NotFound {
        entity: "list",
        id: list_id,
    })?;
    let schema = info.kind.schema();

    let mut stmt = conn.prepare(
        "SELECT id, position, name, url, rating FROM items WHERE list_id = ?1 ORDER BY id",
    )?;
    let records = stmt
        .query_map(params![list_id], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut catalogs = BTreeMap::new();
    let mut edges = BTreeMap::new();
    for &category in schema.categories {
        catalogs.insert(
            category,
            catalog::list_tags(conn, list_id, category, false, SortOrder::Ascending, None)?,
        );

        let mut stmt = conn.prepare(
            "SELECT e.item_id, e.tag_id FROM item_tags e \
             JOIN items i ON i.id = e.item_id \
             WHERE i.list_id = ?1 AND e.category = ?2 \
             ORDER BY e.item_id, e.rowid",
        )?;
        let category_edges = stmt
            .query_map(params![list_id, category.as_str()], |row| {
                Ok(TagEdge {
                    item_id: row.get(0)?,
                    tag_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        edges.insert(category, category_edges);
    }

    let sensitivity = if schema.has_sensitivity() {
        let mut stmt = conn.prepare(
            "SELECT s.item_id, s.explicit, s.violence, s.bad_language FROM sensitivity s \
             JOIN items i ON i.id = s.item_id \
             WHERE i.list_id = ?1 ORDER BY s.item_id",
        )?;
        stmt.query_map(params![list_id], |row| {
            Ok(SensitivityRow {
                item_id: row.get(0)?,
                value: Sensitivity {
                    explicit: row.get(1)?,
                    violence: row.get(2)?,
                    bad_language: row.get(3)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    Ok(ListSnapshot {
        name: info.name,
        kind: info.kind,
        records,
        catalogs,
        edges,
        sensitivity,
        layout: lists::layout(conn, list_id)?,
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        position: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        rating: row.get(4)?,
    })
}

fn blank_row(id: i64, position: i64, schema: &KindSchema) -> ViewRow {
    ViewRow {
        record: RecordRow {
            id,
            position,
            name: String::new(),
            url: String::new(),
            rating: 0,
        },
        tags: schema
            .categories
            .iter()
            .map(|&category| (category, String::new()))
            .collect(),
        sensitivity: Sensitivity::default(),
    }
}

fn update_position(conn: &Connection, id: i64, position: i64) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE items SET position = ?2 WHERE id = ?1",
        params![id, position],
    )?;
    Ok(())
}

/// Stable secondary sort over the materialized rows. Equal keys keep
/// their relative position order from the base query.
fn sort_rows(rows: &mut [ViewRow], key: MemoryKey, order: SortOrder) {
    match key {
        MemoryKey::TagText(category) => rows.sort_by(|a, b| {
            let text_a = a.tags.get(&category).map(String::as_str).unwrap_or("");
            let text_b = b.tags.get(&category).map(String::as_str).unwrap_or("");
            let ordering = text_a.to_lowercase().cmp(&text_b.to_lowercase());
            if order.is_descending() {
                ordering.reverse()
            } else {
                ordering
            }
        }),
        MemoryKey::Sensitivity => rows.sort_by(|a, b| {
            // Three-key comparison: explicit, then violence, then bad
            // language (the derive order on Sensitivity).
            let ordering = a.sensitivity.cmp(&b.sensitivity);
            if order.is_descending() {
                ordering.reverse()
            } else {
                ordering
            }
        }),
    }
}
