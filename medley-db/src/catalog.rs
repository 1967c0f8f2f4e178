//! Tag catalog maintenance.
//!
//! A catalog is the master, de-duplicated list of reusable tag values
//! for one (list, category) pair. Entries carry a dense `ord` that is
//! renumbered after every structural change; entry ids are stable for
//! the life of the dataset and are what link rows reference.

use medley_model::{TagCategory, TagEntry};
use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::order::{plan_relocate, plan_shift};
use crate::util::placeholders;
use crate::view::SortOrder;

/// Snapshot the catalog, optionally sorted by name instead of `ord` and
/// optionally narrowed to entries containing `search` (case-insensitive).
pub fn list_tags(
    conn: &Connection,
    list_id: i64,
    category: TagCategory,
    by_name: bool,
    order: SortOrder,
    search: Option<&str>,
) -> Result<Vec<TagEntry>, StoreError> {
    let key = if by_name { "name COLLATE NOCASE" } else { "ord" };
    let mut sql =
        String::from("SELECT id, ord, name FROM tags WHERE list_id = ?1 AND category = ?2");
    if search.is_some() {
        sql.push_str(" AND name LIKE ?3");
    }
    sql.push_str(&format!(" ORDER BY {key} {}", order.sql()));

    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &rusqlite::Row<'_>| {
        Ok(TagEntry {
            id: row.get(0)?,
            order: row.get(1)?,
            name: row.get(2)?,
        })
    };
    let rows = match search {
        Some(pattern) => stmt.query_map(
            params![list_id, category.as_str(), format!("%{}%", pattern)],
            map_row,
        )?,
        None => stmt.query_map(params![list_id, category.as_str()], map_row)?,
    };
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Return the id of the entry with this exact name, inserting a new one
/// at the end of the catalog if none exists. Calling repeatedly with
/// the same name never grows the catalog.
pub fn add_tag_if_absent(
    conn: &Connection,
    list_id: i64,
    category: TagCategory,
    name: &str,
) -> Result<i64, StoreError> {
    let existing = conn.query_row(
        "SELECT id FROM tags WHERE list_id = ?1 AND category = ?2 AND name = ?3 LIMIT 1",
        params![list_id, category.as_str(), name],
        |row| row.get::<_, i64>(0),
    );
    match existing {
        Ok(id) => return Ok(id),
        Err(rusqlite::Error::QueryReturnedNoRows) => {}
        Err(e) => return Err(e.into()),
    }

    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(ord) + 1, 0) FROM tags WHERE list_id = ?1 AND category = ?2",
        params![list_id, category.as_str()],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO tags (list_id, category, ord, name) VALUES (?1, ?2, ?3, ?4)",
        params![list_id, category.as_str(), next, name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rename a catalog entry. Links are untouched; every item referencing
/// the entry picks up the new text on its next join.
pub fn rename_tag(conn: &Connection, id: i64, new_name: &str) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE tags SET name = ?2 WHERE id = ?1",
        params![id, new_name],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound { entity: "tag", id });
    }
    Ok(())
}

/// Delete catalog entries and close the `ord` gaps they leave.
///
/// Edges referencing a removed entry are left in place and skipped at
/// join time. An empty id set is a no-op.
pub fn remove_tags(
    conn: &Connection,
    list_id: i64,
    category: TagCategory,
    ids: &[i64],
) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }

    let sql = format!(
        "DELETE FROM tags WHERE list_id = ?1 AND category = ?2 AND id IN ({})",
        placeholders(3, ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut bound: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(ids.len() + 2);
    let cat = category.as_str();
    bound.push(&list_id);
    bound.push(&cat);
    for id in ids {
        bound.push(id);
    }
    stmt.execute(bound.as_slice())?;

    let entries = list_tags(conn, list_id, category, false, SortOrder::Ascending, None)?;
    renumber(conn, &entries)
}

/// Move the selected entries one step towards the front (`delta < 0`)
/// or the back. Entries already at the boundary stay put. Returns the
/// selection's new indices.
pub fn move_tags_by(
    conn: &Connection,
    list_id: i64,
    category: TagCategory,
    ids: &[i64],
    delta: i32,
) -> Result<Vec<usize>, StoreError> {
    let mut entries = list_tags(conn, list_id, category, false, SortOrder::Ascending, None)?;
    let selected = indices_of(&entries, ids);
    let plan = plan_shift(entries.len(), &selected, delta);
    for &(a, b) in &plan.swaps {
        entries.swap(a, b);
    }
    renumber(conn, &entries)?;
    Ok(plan.new_indices)
}

/// Detach the selected entries and reinsert them contiguously at
/// `target` (clamped), then renumber. Returns the selection's new
/// indices.
pub fn move_tags_to(
    conn: &Connection,
    list_id: i64,
    category: TagCategory,
    ids: &[i64],
    target: usize,
) -> Result<Vec<usize>, StoreError> {
    let entries = list_tags(conn, list_id, category, false, SortOrder::Ascending, None)?;
    let selected = indices_of(&entries, ids);
    let plan = plan_relocate(entries.len(), &selected, target);
    let reordered: Vec<TagEntry> = plan.order.iter().map(|&i| entries[i].clone()).collect();
    renumber(conn, &reordered)?;
    Ok(plan.new_indices)
}

/// Write `ord = index` wherever an entry disagrees with its slot.
fn renumber(conn: &Connection, entries: &[TagEntry]) -> Result<(), StoreError> {
    for (index, entry) in entries.iter().enumerate() {
        let index = index as i64;
        if entry.order != index {
            conn.execute(
                "UPDATE tags SET ord = ?2 WHERE id = ?1",
                params![entry.id, index],
            )?;
        }
    }
    Ok(())
}

fn indices_of(entries: &[TagEntry], ids: &[i64]) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| ids.contains(&e.id))
        .map(|(i, _)| i)
        .collect()
}
