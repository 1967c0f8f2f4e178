//! Item/tag link tables and the per-item content rating.
//!
//! Edges are the source of truth for every derived tag-text field. All
//! replacement operations are delete-then-insert: the caller supplies
//! the full desired set, never a diff. The checkbox-editor round trip
//! in the presentation layer depends on that replacement semantic.

use std::collections::BTreeMap;

use medley_model::{Sensitivity, TagCategory};
use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::util::placeholders;

/// Replace all of `item_id`'s edges in `category` with exactly the
/// given set. Duplicate ids in the input collapse to one edge.
pub fn set_edges(
    conn: &Connection,
    item_id: i64,
    category: TagCategory,
    tag_ids: &[i64],
) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM item_tags WHERE item_id = ?1 AND category = ?2",
        params![item_id, category.as_str()],
    )?;

    let mut stmt =
        conn.prepare("INSERT INTO item_tags (item_id, tag_id, category) VALUES (?1, ?2, ?3)")?;
    let mut seen = Vec::with_capacity(tag_ids.len());
    for &tag_id in tag_ids {
        if seen.contains(&tag_id) {
            continue;
        }
        seen.push(tag_id);
        stmt.execute(params![item_id, tag_id, category.as_str()])?;
    }
    Ok(())
}

/// Replace the item's content rating, creating the row if this is the
/// first write. Same delete-then-insert shape as [`set_edges`].
pub fn set_sensitivity(
    conn: &Connection,
    item_id: i64,
    value: Sensitivity,
) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM sensitivity WHERE item_id = ?1",
        params![item_id],
    )?;
    conn.execute(
        "INSERT INTO sensitivity (item_id, explicit, violence, bad_language) VALUES (?1, ?2, ?3, ?4)",
        params![item_id, value.explicit, value.violence, value.bad_language],
    )?;
    Ok(())
}

/// The item's edge set for one category, in edge insertion order.
pub fn edges_for(
    conn: &Connection,
    item_id: i64,
    category: TagCategory,
) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT tag_id FROM item_tags WHERE item_id = ?1 AND category = ?2 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![item_id, category.as_str()], |row| row.get(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Join the items' edges against the tag catalog and concatenate the
/// matched names with ", ", grouped per item.
///
/// Every requested item gets an entry, empty when it has no edges. An
/// edge whose tag no longer exists is skipped rather than failing the
/// join.
pub fn joined_names_for(
    conn: &Connection,
    category: TagCategory,
    item_ids: &[i64],
) -> Result<BTreeMap<i64, String>, StoreError> {
    let mut joined: BTreeMap<i64, String> = item_ids.iter().map(|&id| (id, String::new())).collect();
    if item_ids.is_empty() {
        return Ok(joined);
    }

    let sql = format!(
        "SELECT e.item_id, e.tag_id, t.name FROM item_tags e \
         LEFT JOIN tags t ON t.id = e.tag_id \
         WHERE e.category = ?1 AND e.item_id IN ({}) \
         ORDER BY e.item_id, e.rowid",
        placeholders(2, item_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let cat = category.as_str();
    let mut bound: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(item_ids.len() + 1);
    bound.push(&cat);
    for id in item_ids {
        bound.push(id);
    }

    let rows = stmt.query_map(bound.as_slice(), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;
    for row in rows {
        let (item_id, tag_id, name) = row?;
        let Some(name) = name else {
            log::debug!("skipping stale edge: item {item_id} references missing tag {tag_id}");
            continue;
        };
        let text = joined.entry(item_id).or_default();
        if !text.is_empty() {
            text.push_str(", ");
        }
        text.push_str(&name);
    }
    Ok(joined)
}

/// The content ratings of the given items. Items that never had one
/// written are absent from the map.
pub fn sensitivity_for(
    conn: &Connection,
    item_ids: &[i64],
) -> Result<BTreeMap<i64, Sensitivity>, StoreError> {
    let mut out = BTreeMap::new();
    if item_ids.is_empty() {
        return Ok(out);
    }

    let sql = format!(
        "SELECT item_id, explicit, violence, bad_language FROM sensitivity WHERE item_id IN ({})",
        placeholders(1, item_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let bound: Vec<&dyn rusqlite::types::ToSql> =
        item_ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
    let rows = stmt.query_map(bound.as_slice(), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            Sensitivity {
                explicit: row.get(1)?,
                violence: row.get(2)?,
                bad_language: row.get(3)?,
            },
        ))
    })?;
    for row in rows {
        let (item_id, value) = row?;
        out.insert(item_id, value);
    }
    Ok(out)
}

/// Delete every edge and content-rating row referencing the given
/// items. Called whenever records are deleted; catalogs are never
/// touched here.
pub fn cascade_remove(conn: &Connection, item_ids: &[i64]) -> Result<(), StoreError> {
    if item_ids.is_empty() {
        return Ok(());
    }

    let in_list = placeholders(1, item_ids.len());
    let bound: Vec<&dyn rusqlite::types::ToSql> =
        item_ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

    let mut stmt = conn.prepare(&format!(
        "DELETE FROM item_tags WHERE item_id IN ({in_list})"
    ))?;
    stmt.execute(bound.as_slice())?;

    let mut stmt = conn.prepare(&format!(
        "DELETE FROM sensitivity WHERE item_id IN ({in_list})"
    ))?;
    stmt.execute(bound.as_slice())?;

    Ok(())
}
