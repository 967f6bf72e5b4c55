use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension, Row};

use crate::models::{now_timestamp, Category};

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// All categories, alphabetically.
pub fn fetch_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn
        .prepare("SELECT id, name, icon, created_at FROM categories ORDER BY name COLLATE NOCASE")
        .context("failed to prepare category query")?;

    let categories = stmt
        .query_map([], category_from_row)
        .context("failed to load categories")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect categories")?;

    Ok(categories)
}

pub fn fetch_category(conn: &Connection, id: i64) -> Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name, icon, created_at FROM categories WHERE id = ?1",
        [id],
        category_from_row,
    )
    .optional()
    .context("failed to load category")
}

pub fn create_category(conn: &Connection, name: &str, icon: Option<&str>) -> Result<Category> {
    let created_at = now_timestamp();
    conn.execute(
        "INSERT INTO categories (name, icon, created_at) VALUES (?1, ?2, ?3)",
        params![name, icon, created_at],
    )
    .map_err(|err| map_unique_constraint(err, name))
    .context("failed to insert category")?;

    Ok(Category {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        icon: icon.map(str::to_string),
        created_at,
    })
}

/// Remove a category; its lists and items go with it through the cascade.
pub fn delete_category(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM categories WHERE id = ?1", params![id])
        .context("failed to delete category")?;

    if deleted == 0 {
        Err(anyhow!("Category not found"))
    } else {
        Ok(())
    }
}

fn map_unique_constraint(err: SqlError, name: &str) -> anyhow::Error {
    if matches!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation)) {
        anyhow!("Category '{name}' already exists.")
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn categories_sort_case_insensitively() {
        let conn = open_in_memory().expect("db");
        create_category(&conn, "zeta", None).expect("zeta");
        create_category(&conn, "Alpha", Some("📁")).expect("alpha");

        let names: Vec<_> = fetch_categories(&conn)
            .expect("fetch")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "zeta"]);
    }

    #[test]
    fn duplicate_names_are_reported() {
        let conn = open_in_memory().expect("db");
        create_category(&conn, "Work", None).expect("first");
        let err = create_category(&conn, "Work", None).unwrap_err();
        assert!(format!("{err:#}").contains("already exists"));
    }

    #[test]
    fn delete_missing_category_fails() {
        let conn = open_in_memory().expect("db");
        assert!(delete_category(&conn, 99).is_err());
        let cat = create_category(&conn, "Tmp", None).expect("cat");
        delete_category(&conn, cat.id).expect("delete");
        assert!(fetch_category(&conn, cat.id).expect("fetch").is_none());
    }
}
