//! Dataset-level list registry and per-list view layout hints.

use medley_model::{ListKind, ViewLayout};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::links;

/// One registered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListInfo {
    pub id: i64,
    pub name: String,
    pub kind: ListKind,
}

/// Register a new, empty list. Returns its id.
pub fn create_list(conn: &Connection, name: &str, kind: ListKind) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO lists (name, kind) VALUES (?1, ?2)",
        params![name, kind.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rename a list.
pub fn rename_list(conn: &Connection, id: i64, name: &str) -> Result<(), StoreError> {
    let changed = conn.execute("UPDATE lists SET name = ?2 WHERE id = ?1", params![id, name])?;
    if changed == 0 {
        return Err(StoreError::NotFound { entity: "list", id });
    }
    Ok(())
}

/// Delete a list and everything it owns: records, edges, content
/// ratings, tag catalogs, and layout hints.
pub fn delete_list(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let mut stmt = conn.prepare("SELECT id FROM items WHERE list_id = ?1")?;
    let item_ids: Vec<i64> = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    links::cascade_remove(conn, &item_ids)?;

    conn.execute("DELETE FROM items WHERE list_id = ?1", params![id])?;
    conn.execute("DELETE FROM tags WHERE list_id = ?1", params![id])?;
    conn.execute("DELETE FROM layout WHERE list_id = ?1", params![id])?;
    let changed = conn.execute("DELETE FROM lists WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(StoreError::NotFound { entity: "list", id });
    }
    Ok(())
}

/// All registered lists, oldest first. A row whose stored kind is not
/// recognized is skipped with a warning rather than failing the load.
pub fn all_lists(conn: &Connection) -> Result<Vec<ListInfo>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, name, kind FROM lists ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut lists = Vec::new();
    for row in rows {
        let (id, name, kind) = row?;
        match ListKind::from_str_loose(&kind) {
            Some(kind) => lists.push(ListInfo { id, name, kind }),
            None => log::warn!("skipping list {id} ('{name}'): unknown kind '{kind}'"),
        }
    }
    Ok(lists)
}

/// Look up one list.
pub fn get_list(conn: &Connection, id: i64) -> Result<Option<ListInfo>, StoreError> {
    let row = conn
        .query_row(
            "SELECT name, kind FROM lists WHERE id = ?1",
            params![id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    let Some((name, kind)) = row else {
        return Ok(None);
    };
    Ok(ListKind::from_str_loose(&kind).map(|kind| ListInfo { id, name, kind }))
}

/// Persist a list's layout hints (sort indicator and column widths).
pub fn set_layout(conn: &Connection, list_id: i64, layout: &ViewLayout) -> Result<(), StoreError> {
    let widths = layout
        .column_widths
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(",");
    conn.execute(
        "INSERT INTO layout (list_id, sort_column, sort_desc, column_widths) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(list_id) DO UPDATE SET
             sort_column = excluded.sort_column,
             sort_desc = excluded.sort_desc,
             column_widths = excluded.column_widths",
        params![list_id, layout.sort_column, layout.sort_desc, widths],
    )?;
    Ok(())
}

/// A list's layout hints, or defaults when none were ever saved.
pub fn layout(conn: &Connection, list_id: i64) -> Result<ViewLayout, StoreError> {
    let row = conn
        .query_row(
            "SELECT sort_column, sort_desc, column_widths FROM layout WHERE list_id = ?1",
            params![list_id],
            |row| {
                Ok((
                    row.get::<_, i8>(0)?,
                    row.get::<_, u8>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((sort_column, sort_desc, widths)) = row else {
        return Ok(ViewLayout::default());
    };
    let column_widths = widths
        .split(',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    Ok(ViewLayout {
        sort_column,
        sort_desc,
        column_widths,
    })
}

/// Row counts per entity kind, one query each.
pub fn dataset_stats(conn: &Connection) -> Result<DatasetStats, StoreError> {
    let lists: i64 = conn.query_row("SELECT COUNT(*) FROM lists", [], |r| r.get(0))?;
    let items: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |r| r.get(0))?;
    let tags: i64 = conn.query_row("SELECT COUNT(*) FROM tags", [], |r| r.get(0))?;
    let edges: i64 = conn.query_row("SELECT COUNT(*) FROM item_tags", [], |r| r.get(0))?;
    let rated: i64 = conn.query_row("SELECT COUNT(*) FROM sensitivity", [], |r| r.get(0))?;

    Ok(DatasetStats {
        lists,
        items,
        tags,
        edges,
        rated,
    })
}

/// Summary statistics for a dataset.
#[derive(Debug)]
pub struct DatasetStats {
    pub lists: i64,
    pub items: i64,
    pub tags: i64,
    pub edges: i64,
    pub rated: i64,
}
