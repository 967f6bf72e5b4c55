//! The persistence contract the list controller depends on, and its SQLite
//! implementation.

use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::models::{Category, Item, ListPlacement, Lista, ListaChanges, NewItem};

/// Store operations used by [`crate::controller::ListController`]. Errors are
/// plain `anyhow` failures; the controller decides how to report them.
pub trait ListStore {
    fn get_item(&self, id: i64) -> Result<Option<Item>>;
    fn is_lista_name_unique(&self, category_id: i64, name: &str, exclude_id: Option<i64>)
        -> Result<bool>;
    fn create_lista(&self, category_id: i64, name: &str, description: Option<&str>) -> Result<i64>;
    fn get_lista(&self, id: i64) -> Result<Option<Lista>>;
    fn update_lista(&self, id: i64, changes: &ListaChanges) -> Result<()>;
    /// Deletes the list and, through the cascade, its items.
    fn delete_lista(&self, id: i64) -> Result<bool>;
    fn get_listas_by_category(&self, category_id: i64) -> Result<Vec<Lista>>;
    /// Items ordered by `orden_lista`.
    fn get_items_by_lista(&self, list_id: i64) -> Result<Vec<Item>>;
    fn add_item(
        &self,
        category_id: i64,
        item: &NewItem,
        placement: Option<ListPlacement>,
    ) -> Result<i64>;
    fn delete_item(&self, id: i64) -> Result<()>;
    fn mark_lista_used(&self, id: i64) -> Result<()>;
}

/// `ListStore` over a single long-lived SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: db::open_database(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: db::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        db::fetch_categories(&self.conn)
    }

    pub fn category(&self, id: i64) -> Result<Option<Category>> {
        db::fetch_category(&self.conn, id)
    }

    pub fn create_category(&self, name: &str, icon: Option<&str>) -> Result<Category> {
        db::create_category(&self.conn, name, icon)
    }

    pub fn delete_category(&self, id: i64) -> Result<()> {
        db::delete_category(&self.conn, id)
    }

    /// Items of a category that are not part of any list.
    pub fn loose_items(&self, category_id: i64) -> Result<Vec<Item>> {
        db::fetch_loose_items(&self.conn, category_id)
    }
}

impl ListStore for SqliteStore {
    fn get_item(&self, id: i64) -> Result<Option<Item>> {
        db::fetch_item(&self.conn, id)
    }

    fn is_lista_name_unique(
        &self,
        category_id: i64,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        db::is_lista_name_unique(&self.conn, category_id, name, exclude_id)
    }

    fn create_lista(&self, category_id: i64, name: &str, description: Option<&str>) -> Result<i64> {
        db::create_lista(&self.conn, category_id, name, description)
    }

    fn get_lista(&self, id: i64) -> Result<Option<Lista>> {
        db::fetch_lista(&self.conn, id)
    }

    fn update_lista(&self, id: i64, changes: &ListaChanges) -> Result<()> {
        db::update_lista(&self.conn, id, changes)
    }

    fn delete_lista(&self, id: i64) -> Result<bool> {
        db::delete_lista(&self.conn, id)
    }

    fn get_listas_by_category(&self, category_id: i64) -> Result<Vec<Lista>> {
        db::fetch_listas_for_category(&self.conn, category_id)
    }

    fn get_items_by_lista(&self, list_id: i64) -> Result<Vec<Item>> {
        db::fetch_items_for_lista(&self.conn, list_id)
    }

    fn add_item(
        &self,
        category_id: i64,
        item: &NewItem,
        placement: Option<ListPlacement>,
    ) -> Result<i64> {
        db::insert_item(&self.conn, category_id, item, placement)
    }

    fn delete_item(&self, id: i64) -> Result<()> {
        db::delete_item(&self.conn, id)
    }

    fn mark_lista_used(&self, id: i64) -> Result<()> {
        db::mark_lista_used(&self.conn, id)
    }
}
