//! Encode and decode the dataset save container.

use std::fs;
use std::path::Path;

use medley_db::{lists, records, RecordTable, SortOrder, StoreError};
use medley_model::{ListSnapshot, RATING_MAX};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current save format version. Increment when adding blocks.
///
/// Version history: 1 is records, catalogs, edges, and content
/// ratings; 2 adds the sort indicator; 3 adds column-width hints.
/// Older files simply omit the newer blocks and load with defaults.
pub const CURRENT_SAVE_VERSION: u32 = 3;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Save file parse error in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct SaveFileOut<'a> {
    version: u32,
    lists: &'a [ListSnapshot],
}

// Lists are held as raw values so one malformed list can be skipped
// without failing the rest of the file.
#[derive(Deserialize)]
struct SaveFileIn {
    version: u32,
    #[serde(default)]
    lists: Vec<serde_json::Value>,
}

/// Snapshot every list in the dataset, in registry order.
pub fn snapshot_dataset(conn: &Connection) -> Result<Vec<ListSnapshot>, SaveError> {
    let mut snapshots = Vec::new();
    for info in lists::all_lists(conn)? {
        snapshots.push(records::snapshot_list(conn, info.id)?);
    }
    Ok(snapshots)
}

/// Serialize snapshots into the current container format.
pub fn encode(snapshots: &[ListSnapshot]) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(&SaveFileOut {
        version: CURRENT_SAVE_VERSION,
        lists: snapshots,
    })?)
}

/// Parse a container. A list entry that fails to deserialize is
/// skipped with a warning; a file newer than this build refuses to
/// load.
pub fn decode(text: &str) -> Result<Vec<ListSnapshot>, SaveError> {
    let file: SaveFileIn = serde_json::from_str(text)?;
    if file.version > CURRENT_SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found: file.version,
            supported: CURRENT_SAVE_VERSION,
        });
    }

    let mut snapshots = Vec::new();
    for (index, value) in file.lists.into_iter().enumerate() {
        match serde_json::from_value::<ListSnapshot>(value) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => log::warn!("skipping malformed list at index {index}: {e}"),
        }
    }
    Ok(snapshots)
}

/// Snapshot the dataset and write it to `path` atomically (temp file
/// plus rename, so a crash never leaves a truncated save).
pub fn save_dataset(conn: &Connection, path: &Path) -> Result<(), SaveError> {
    let serialized = encode(&snapshot_dataset(conn)?)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &serialized).map_err(|e| io_error(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_error(path, e))?;
    Ok(())
}

/// Load a save file into the store, returning one refreshed
/// [`RecordTable`] per successfully restored list. A list that fails to
/// restore (id collision, constraint violation) is skipped with a
/// warning; the rest of the file still loads.
pub fn load_dataset(conn: &Connection, path: &Path) -> Result<Vec<RecordTable>, SaveError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let snapshots = decode(&text).map_err(|e| match e {
        SaveError::Json(source) => SaveError::Parse {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })?;

    let mut tables = Vec::new();
    for snapshot in &snapshots {
        match restore_list(conn, snapshot) {
            Ok(table) => tables.push(table),
            Err(e) => log::warn!("skipping list '{}': {e}", snapshot.name),
        }
    }
    Ok(tables)
}

/// Restore one list into the store, preserving record and tag ids, and
/// run the single refresh that materializes derived fields under the
/// saved sort indicator.
///
/// Expects a store that does not already contain the saved ids; a
/// collision surfaces as a statement error and the caller skips the
/// list.
pub fn restore_list(conn: &Connection, snapshot: &ListSnapshot) -> Result<RecordTable, SaveError> {
    let list_id = lists::create_list(conn, &snapshot.name, snapshot.kind)?;

    // Catalogs and link tables exist before any record-derived state is
    // touched; the refresh below is the only thing that derives text.
    for (category, entries) in &snapshot.catalogs {
        let mut stmt = conn.prepare(
            "INSERT INTO tags (id, list_id, category, ord, name) VALUES (?1, ?2, ?3, ?4, ?5)",
        ).map_err(StoreError::from)?;
        for entry in entries {
            stmt.execute(params![
                entry.id,
                list_id,
                category.as_str(),
                entry.order,
                entry.name
            ])
            .map_err(StoreError::from)?;
        }
    }

    for record in &snapshot.records {
        conn.execute(
            "INSERT INTO items (id, list_id, position, name, url, rating) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                list_id,
                record.position,
                record.name,
                record.url,
                record.rating.min(RATING_MAX)
            ],
        )
        .map_err(StoreError::from)?;
    }

    for (category, edges) in &snapshot.edges {
        let mut stmt = conn
            .prepare("INSERT INTO item_tags (item_id, tag_id, category) VALUES (?1, ?2, ?3)")
            .map_err(StoreError::from)?;
        for edge in edges {
            stmt.execute(params![edge.item_id, edge.tag_id, category.as_str()])
                .map_err(StoreError::from)?;
        }
    }

    for row in &snapshot.sensitivity {
        conn.execute(
            "INSERT INTO sensitivity (item_id, explicit, violence, bad_language) VALUES (?1, ?2, ?3, ?4)",
            params![
                row.item_id,
                row.value.explicit.min(RATING_MAX),
                row.value.violence.min(RATING_MAX),
                row.value.bad_language.min(RATING_MAX)
            ],
        )
        .map_err(StoreError::from)?;
    }

    lists::set_layout(conn, list_id, &snapshot.layout)?;

    let mut table = RecordTable::new(list_id, snapshot.kind);
    let column = usize::try_from(snapshot.layout.sort_column).ok();
    let order = if snapshot.layout.sort_desc != 0 {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };
    table.set_sort(conn, column, order)?;
    Ok(table)
}

fn io_error(path: &Path, source: std::io::Error) -> SaveError {
    SaveError::Io {
        path: path.display().to_string(),
        source,
    }
}
