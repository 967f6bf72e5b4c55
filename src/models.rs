//! Domain models that mirror the SQLite schema and get passed between the
//! store, the list controller and the terminal UI. They stay plain data
//! holders; validation lives in the controller and persistence in `db`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format used for every timestamp we write (local time, ISO-8601 with
/// microseconds).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current local time as an ISO-8601 string.
pub fn now_timestamp() -> String {
    Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts both our own format and the
/// space-separated variant SQLite produces for `CURRENT_TIMESTAMP`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    raw.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok())
}

/// A top-level grouping for items and lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub created_at: String,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.icon {
            Some(icon) if !icon.trim().is_empty() => write!(f, "{icon} {}", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// Kind of payload an item carries. Stored as upper-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    #[default]
    Text,
    Url,
    Code,
    Path,
    WebStatic,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Text => "TEXT",
            ItemType::Url => "URL",
            ItemType::Code => "CODE",
            ItemType::Path => "PATH",
            ItemType::WebStatic => "WEB_STATIC",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    /// Case-insensitive; older rows used lower-case `text`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TEXT" | "" => Ok(ItemType::Text),
            "URL" => Ok(ItemType::Url),
            "CODE" => Ok(ItemType::Code),
            "PATH" => Ok(ItemType::Path),
            "WEB_STATIC" => Ok(ItemType::WebStatic),
            other => Err(format!("unknown item type '{other}'")),
        }
    }
}

/// A persisted clipboard item. Items either float loose inside a category or
/// belong to exactly one list at a given position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: i64,
    pub category_id: i64,
    pub label: String,
    pub content: String,
    pub item_type: ItemType,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub is_sensitive: bool,
    pub tags: Vec<String>,
    pub list_id: Option<i64>,
    /// 1-based position inside `list_id`.
    pub orden_lista: Option<i64>,
    pub created_at: String,
}

impl Item {
    /// Label prefixed with the icon, if any.
    pub fn display_label(&self) -> String {
        match &self.icon {
            Some(icon) if !icon.trim().is_empty() => format!("{icon} {}", self.label),
            _ => self.label.clone(),
        }
    }

    /// Content safe to print on screen. Sensitive items are masked.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.is_sensitive {
            return "••••••••".to_string();
        }
        let single_line = self.content.replace(['\n', '\r'], " ");
        if single_line.chars().count() <= max_chars {
            single_line
        } else {
            let mut cut: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
            cut.push('…');
            cut
        }
    }

    /// Copy the user-editable fields into a fresh [`NewItem`].
    pub fn to_new_item(&self) -> NewItem {
        NewItem {
            label: self.label.clone(),
            content: self.content.clone(),
            item_type: self.item_type,
            icon: self.icon.clone(),
            description: self.description.clone(),
            is_sensitive: self.is_sensitive,
            tags: self.tags.clone(),
        }
    }
}

/// Item fields supplied by callers when creating items. Everything beyond
/// `label` and `content` has a sensible default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub label: String,
    pub content: String,
    #[serde(default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_sensitive: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewItem {
    pub fn text(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Where a newly inserted item lands inside a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPlacement {
    pub list_id: i64,
    /// 1-based display order.
    pub orden_lista: i64,
}

/// Partial update for a list row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListaChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ListaChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// A named, ordered group of items inside one category.
///
/// `item_count` and `items` are calculated on load and never written back.
#[derive(Debug, Clone, Serialize)]
pub struct Lista {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_used: Option<String>,
    pub use_count: i64,
    pub item_count: usize,
    #[serde(skip)]
    pub items: Vec<Item>,
}

impl Lista {
    /// Fresh in-memory list with both timestamps set to now.
    pub fn new(id: i64, category_id: i64, name: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            id,
            category_id,
            name: name.into(),
            description: None,
            created_at: now.clone(),
            updated_at: now,
            last_used: None,
            use_count: 0,
            item_count: 0,
            items: Vec::new(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }

    pub fn increment_use_count(&mut self) {
        self.use_count += 1;
        self.last_used = Some(now_timestamp());
    }

    pub fn has_items(&self) -> bool {
        self.item_count > 0
    }

    pub fn is_used(&self) -> bool {
        self.use_count > 0
    }

    pub fn formatted_use_count(&self) -> String {
        match self.use_count {
            0 => "Never used".to_string(),
            1 => "Used 1 time".to_string(),
            n => format!("Used {n} times"),
        }
    }

    pub fn formatted_last_used(&self) -> String {
        match self.last_used.as_deref() {
            None | Some("") => "Never used".to_string(),
            Some(raw) => match parse_timestamp(raw) {
                Some(dt) => format!("Last used: {}", dt.format("%Y-%m-%d %H:%M")),
                None => "Last used: Unknown".to_string(),
            },
        }
    }
}

impl PartialEq for Lista {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.category_id == other.category_id
    }
}

impl Eq for Lista {}

impl Hash for Lista {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.category_id.hash(state);
    }
}

impl fmt::Display for Lista {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
