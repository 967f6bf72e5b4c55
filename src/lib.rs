//! Core library surface for snippet-shelf: clipboard snippets grouped into
//! ordered lists that can be copied at once or replayed step by step.
//!
//! The `bin` target wires these pieces to a terminal UI and a small CLI;
//! everything below the UI is usable on its own.
pub mod capture;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod store;
pub mod ui;

pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard};
pub use config::{load_settings, Settings};
pub use controller::{ExecutionProgress, ListController, ListCreated};
pub use error::{CaptureError, ListError, ListResult, ValidationError};
pub use events::{EventBus, ListEvent};
pub use models::{Category, Item, ItemType, Lista, NewItem};
pub use store::{ListStore, SqliteStore};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
