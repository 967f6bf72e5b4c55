use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{now_timestamp, Item, ListPlacement, NewItem};

const ITEM_COLUMNS: &str = "id, category_id, label, content, type, icon, description, \
     is_sensitive, tags, list_id, orden_lista, created_at";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let raw_type: String = row.get(4)?;
    let raw_tags: Option<String> = row.get(8)?;
    Ok(Item {
        id: row.get(0)?,
        category_id: row.get(1)?,
        label: row.get(2)?,
        content: row.get(3)?,
        item_type: raw_type.parse().unwrap_or_default(),
        icon: row.get(5)?,
        description: row.get(6)?,
        is_sensitive: row.get(7)?,
        tags: raw_tags.as_deref().map(parse_tags).unwrap_or_default(),
        list_id: row.get(9)?,
        orden_lista: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Decode the `tags` column. Current rows hold a JSON array; rows written by
/// older builds hold comma-separated text.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(tags) => tags.into_iter().filter(|tag| !tag.is_empty()).collect(),
        Err(_) => raw
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).context("failed to encode tags")
}

pub fn fetch_item(conn: &Connection, id: i64) -> Result<Option<Item>> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
        [id],
        item_from_row,
    )
    .optional()
    .context("failed to load item")
}

/// Items of a list in display order.
pub fn fetch_items_for_lista(conn: &Connection, list_id: i64) -> Result<Vec<Item>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE list_id = ?1 ORDER BY orden_lista, id"
        ))
        .context("failed to prepare list items query")?;

    let items = stmt
        .query_map([list_id], item_from_row)
        .context("failed to iterate list items")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect list items")?;

    Ok(items)
}

/// Items of a category that do not belong to any list.
pub fn fetch_loose_items(conn: &Connection, category_id: i64) -> Result<Vec<Item>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE category_id = ?1 AND list_id IS NULL
             ORDER BY label COLLATE NOCASE, id"
        ))
        .context("failed to prepare category items query")?;

    let items = stmt
        .query_map([category_id], item_from_row)
        .context("failed to iterate category items")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect category items")?;

    Ok(items)
}

pub fn insert_item(
    conn: &Connection,
    category_id: i64,
    item: &NewItem,
    placement: Option<ListPlacement>,
) -> Result<i64> {
    let tags = encode_tags(&item.tags)?;
    conn.execute(
        "INSERT INTO items (
            category_id, label, content, type, icon, description,
            is_sensitive, tags, list_id, orden_lista, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            category_id,
            item.label,
            item.content,
            item.item_type.as_str(),
            item.icon,
            item.description,
            item.is_sensitive,
            tags,
            placement.map(|p| p.list_id),
            placement.map(|p| p.orden_lista),
            now_timestamp(),
        ],
    )
    .context("failed to insert item")?;

    Ok(conn.last_insert_rowid())
}

pub fn delete_item(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM items WHERE id = ?1", params![id])
        .context("failed to delete item")?;

    if deleted == 0 {
        Err(anyhow!("Item not found"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_category, open_in_memory};
    use crate::models::ItemType;

    #[test]
    fn tags_accept_json_and_legacy_text() {
        assert_eq!(parse_tags(r#"["a","b"]"#), vec!["a", "b"]);
        assert_eq!(parse_tags(" a, ,b ,"), vec!["a", "b"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn inserted_item_round_trips_every_field() {
        let conn = open_in_memory().expect("db");
        let cat = create_category(&conn, "Web", None).expect("cat");
        let new = NewItem {
            label: "Docs".into(),
            content: "https://docs.rs".into(),
            item_type: ItemType::Url,
            icon: Some("🔗".into()),
            description: Some("crate docs".into()),
            is_sensitive: true,
            tags: vec!["rust".into(), "docs".into()],
        };

        let id = insert_item(&conn, cat.id, &new, None).expect("insert");
        let item = fetch_item(&conn, id).expect("fetch").expect("present");
        assert_eq!(item.to_new_item(), new);
        assert_eq!(item.list_id, None);

        let loose = fetch_loose_items(&conn, cat.id).expect("loose");
        assert_eq!(loose.len(), 1);
    }

    #[test]
    fn legacy_comma_tags_are_read() {
        let conn = open_in_memory().expect("db");
        let cat = create_category(&conn, "Old", None).expect("cat");
        conn.execute(
            "INSERT INTO items (category_id, label, content, type, tags, created_at)
             VALUES (?1, 'x', 'y', 'text', 'one, two', '2024-01-01 10:00:00')",
            [cat.id],
        )
        .expect("raw insert");

        let items = fetch_loose_items(&conn, cat.id).expect("items");
        assert_eq!(items[0].tags, vec!["one", "two"]);
        assert_eq!(items[0].item_type, ItemType::Text);
    }

    #[test]
    fn deleting_unknown_item_fails() {
        let conn = open_in_memory().expect("db");
        assert!(delete_item(&conn, 42).is_err());
    }
}
