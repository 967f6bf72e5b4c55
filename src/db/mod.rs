//! Persistence module split across logical submodules. Every function takes
//! a borrowed connection and owns exactly one query.

mod categories;
mod connection;
mod items;
mod listas;

pub use categories::{create_category, delete_category, fetch_categories, fetch_category};
pub use connection::{ensure_schema, open_database, open_in_memory};
pub use items::{
    delete_item, fetch_item, fetch_items_for_lista, fetch_loose_items, insert_item, parse_tags,
};
pub use listas::{
    create_lista, delete_lista, fetch_lista, fetch_listas_for_category, is_lista_name_unique,
    mark_lista_used, update_lista,
};
