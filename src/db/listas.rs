use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension, Row};

use crate::models::{now_timestamp, Lista, ListaChanges};

const LISTA_SELECT: &str = "SELECT l.id, l.category_id, l.name, l.description, l.created_at,
        l.updated_at, l.last_used, l.use_count,
        (SELECT COUNT(*) FROM items i WHERE i.list_id = l.id) AS item_count
     FROM listas l";

fn lista_from_row(row: &Row<'_>) -> rusqlite::Result<Lista> {
    let item_count: i64 = row.get(8)?;
    Ok(Lista {
        id: row.get(0)?,
        category_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        last_used: row.get(6)?,
        use_count: row.get(7)?,
        item_count: usize::try_from(item_count).unwrap_or_default(),
        items: Vec::new(),
    })
}

pub fn fetch_lista(conn: &Connection, id: i64) -> Result<Option<Lista>> {
    conn.query_row(&format!("{LISTA_SELECT} WHERE l.id = ?1"), [id], lista_from_row)
        .optional()
        .context("failed to load lista")
}

/// Lists of a category, ordered by name, with `item_count` filled in.
pub fn fetch_listas_for_category(conn: &Connection, category_id: i64) -> Result<Vec<Lista>> {
    let mut stmt = conn
        .prepare(&format!(
            "{LISTA_SELECT} WHERE l.category_id = ?1 ORDER BY l.name COLLATE NOCASE"
        ))
        .context("failed to prepare listas query")?;

    let listas = stmt
        .query_map([category_id], lista_from_row)
        .context("failed to iterate listas")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect listas")?;

    Ok(listas)
}

/// Whether `name` is free inside `category_id`, optionally ignoring one list
/// (the one being renamed).
pub fn is_lista_name_unique(
    conn: &Connection,
    category_id: i64,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let taken: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM listas
             WHERE category_id = ?1 AND name = ?2 AND (?3 IS NULL OR id <> ?3)",
            params![category_id, name, exclude_id],
            |row| row.get(0),
        )
        .context("failed to check lista name")?;
    Ok(taken == 0)
}

pub fn create_lista(
    conn: &Connection,
    category_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<i64> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO listas (category_id, name, description, created_at, updated_at, use_count)
         VALUES (?1, ?2, ?3, ?4, ?4, 0)",
        params![category_id, name, description, now],
    )
    .map_err(|err| map_unique_constraint(err, name))
    .context("failed to insert lista")?;

    Ok(conn.last_insert_rowid())
}

/// Apply a partial update. `updated_at` is bumped whenever anything changes.
pub fn update_lista(conn: &Connection, id: i64, changes: &ListaChanges) -> Result<()> {
    if changes.is_empty() {
        return Ok(());
    }

    let updated = conn
        .execute(
            "UPDATE listas SET
                name = COALESCE(?1, name),
                description = COALESCE(?2, description),
                updated_at = ?3
             WHERE id = ?4",
            params![changes.name, changes.description, now_timestamp(), id],
        )
        .map_err(|err| map_unique_constraint(err, changes.name.as_deref().unwrap_or_default()))
        .context("failed to update lista")?;

    if updated == 0 {
        Err(anyhow!("Lista not found"))
    } else {
        Ok(())
    }
}

/// Remove a list. The schema cascades to its items. Returns whether a row
/// was deleted.
pub fn delete_lista(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM listas WHERE id = ?1", params![id])
        .context("failed to delete lista")?;
    Ok(deleted > 0)
}

pub fn mark_lista_used(conn: &Connection, id: i64) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE listas SET use_count = use_count + 1, last_used = ?1 WHERE id = ?2",
            params![now_timestamp(), id],
        )
        .context("failed to record lista usage")?;

    if updated == 0 {
        Err(anyhow!("Lista not found"))
    } else {
        Ok(())
    }
}

fn map_unique_constraint(err: SqlError, name: &str) -> anyhow::Error {
    if matches!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation)) {
        anyhow!("A list named '{name}' already exists in this category.")
    } else {
        err.into()
    }
}
