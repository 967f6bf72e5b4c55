//! Business logic for lists: validation, create/update/delete orchestration,
//! clipboard copy and sequential replay.
//!
//! Every failure is logged, published as [`ListEvent::Error`] and returned as
//! a [`ListError`]; nothing coming out of the store or the clipboard escapes
//! as a panic. Multi-item writes run item by item without a transaction, so a
//! store failure halfway through leaves the rows written so far in place.

mod execution;
mod validation;


use crossbeam_channel::Receiver;
use tracing::{error, info, warn};

use crate::clipboard::Clipboard;
use crate::error::{ListError, ListResult, ValidationError};
use crate::events::{EventBus, ListEvent};
use crate::models::{Item, ListPlacement, Lista, ListaChanges, NewItem};
use crate::store::ListStore;

pub use execution::{ExecutionProgress, DEFAULT_STEP_DELAY};
pub use validation::{MAX_LABEL_CHARS, MAX_LIST_ITEMS, MAX_LIST_NAME_CHARS};

use execution::ExecutionSession;

/// Separator used by [`ListController::copy_all_list_items`] callers that do
/// not pick their own.
pub const DEFAULT_SEPARATOR: &str = "\n";

/// Tag every item receives when a list is assembled from existing items.
const LIST_TAG: &str = "lista";

/// Outcome of a successful list creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCreated {
    pub list_id: i64,
    /// Ids of the inserted items, in list order.
    pub item_ids: Vec<i64>,
    pub message: String,
}

pub struct ListController<S, C> {
    store: S,
    clipboard: C,
    events: EventBus,
    session: Option<ExecutionSession>,
}

impl<S: ListStore, C: Clipboard> ListController<S, C> {
    pub fn new(store: S, clipboard: C) -> Self {
        info!("list controller initialized");
        Self {
            store,
            clipboard,
            events: EventBus::new(),
            session: None,
        }
    }

    /// Register a new listener. Events published from now on are delivered
    /// in order.
    pub fn subscribe(&mut self) -> Receiver<ListEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut C {
        &mut self.clipboard
    }

    // ---- CRUD ----

    /// Validate and persist a new list together with its items. Items get a
    /// 1-based `orden_lista` matching their position in `items`.
    pub fn create_list(
        &mut self,
        category_id: i64,
        name: &str,
        items: &[NewItem],
        description: Option<&str>,
    ) -> ListResult<ListCreated> {
        if let Err(err) = self.validate_list_data(name, items, Some(category_id), None) {
            return self.fail(err);
        }

        let persisted = self
            .store
            .create_lista(category_id, name, description)
            .and_then(|list_id| {
                self.insert_list_items(category_id, list_id, items)
                    .map(|item_ids| (list_id, item_ids))
            });

        match persisted {
            Ok((list_id, item_ids)) => {
                info!(list_id, category_id, name, items = item_ids.len(), "list created");
                self.events.publish(ListEvent::Created {
                    list_id,
                    category_id,
                });
                self.events.publish(ListEvent::LegacyCreated {
                    name: name.to_string(),
                    category_id,
                });
                Ok(ListCreated {
                    list_id,
                    message: format!("Lista '{name}' creada con {} pasos", item_ids.len()),
                    item_ids,
                })
            }
            Err(source) => self.fail(ListError::store("crear lista")(source)),
        }
    }

    /// Build a list out of existing items. Each copy is tagged
    /// `["lista", <name>]` ahead of its own tags; ids that no longer resolve
    /// are skipped.
    pub fn create_list_from_items(
        &mut self,
        name: &str,
        category_id: i64,
        item_ids: &[i64],
    ) -> ListResult<ListCreated> {
        let mut auto_tags = vec![LIST_TAG.to_string()];
        if !name.is_empty() {
            auto_tags.push(name.to_string());
        }

        let mut items = Vec::with_capacity(item_ids.len());
        for &item_id in item_ids {
            match self.store.get_item(item_id) {
                Ok(Some(item)) => items.push(tagged_copy(&item, &auto_tags)),
                Ok(None) => warn!(item_id, "item not found, skipping"),
                Err(source) => {
                    return self.fail(ListError::store("crear lista desde items")(source));
                }
            }
        }

        if items.is_empty() {
            return self.fail(ListError::NoValidItems);
        }

        self.create_list(category_id, name, &items, None)
    }

    /// Rename, re-describe and/or replace the items of a list. Supplying
    /// `items` replaces the whole set (delete all, then insert with fresh
    /// ordering).
    pub fn update_list(
        &mut self,
        list_id: i64,
        name: Option<&str>,
        description: Option<&str>,
        items: Option<&[NewItem]>,
    ) -> ListResult<String> {
        let lista = match self.store.get_lista(list_id) {
            Ok(Some(lista)) => lista,
            Ok(None) => return self.fail(ListError::NotFound(list_id)),
            Err(source) => return self.fail(ListError::store("actualizar lista")(source)),
        };
        let old_name = lista.name.clone();
        let category_id = lista.category_id;
        let renamed = name.filter(|new_name| *new_name != old_name);

        if let Some(new_name) = renamed {
            let check = self.validate_list_data(
                new_name,
                items.unwrap_or_default(),
                Some(category_id),
                Some(list_id),
            );
            match check {
                Ok(()) | Err(ListError::Validation(ValidationError::NoItems)) => {}
                Err(err) => return self.fail(err),
            }
        }

        let final_name = name.unwrap_or(&old_name).to_string();

        if let Some(items) = items {
            if let Err(err) =
                self.validate_list_data(&final_name, items, Some(category_id), Some(list_id))
            {
                return self.fail(err);
            }
        }

        let changes = ListaChanges {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
        };
        if let Err(source) = self.apply_update(list_id, category_id, &changes, items) {
            return self.fail(ListError::store("actualizar lista")(source));
        }

        info!(list_id, old_name = %old_name, new_name = %final_name, "list updated");
        match renamed {
            Some(new_name) => self.events.publish(ListEvent::Renamed {
                list_id,
                old_name,
                new_name: new_name.to_string(),
                category_id,
            }),
            None => self.events.publish(ListEvent::Updated {
                list_id,
                category_id,
            }),
        }
        self.events.publish(ListEvent::LegacyUpdated {
            name: final_name.clone(),
            category_id,
        });

        Ok(format!("Lista '{final_name}' actualizada exitosamente"))
    }

    pub fn rename_list(&mut self, list_id: i64, new_name: &str) -> ListResult<String> {
        self.update_list(list_id, Some(new_name), None, None)
    }

    /// Delete a list; the store removes its items with it.
    pub fn delete_list(&mut self, list_id: i64) -> ListResult<String> {
        let lista = match self.store.get_lista(list_id) {
            Ok(Some(lista)) => lista,
            Ok(None) => return self.fail(ListError::NotFound(list_id)),
            Err(source) => return self.fail(ListError::store("eliminar lista")(source)),
        };

        match self.store.delete_lista(list_id) {
            Ok(true) => {
                info!(list_id, name = %lista.name, "list deleted");
                self.events.publish(ListEvent::Deleted {
                    list_id,
                    category_id: lista.category_id,
                });
                self.events.publish(ListEvent::LegacyDeleted {
                    name: lista.name.clone(),
                    category_id: lista.category_id,
                });
                Ok(format!("Lista '{}' eliminada", lista.name))
            }
            Ok(false) => self.fail(ListError::DeleteFailed),
            Err(source) => self.fail(ListError::store("eliminar lista")(source)),
        }
    }

    // ---- queries ----

    /// Lists of a category. Store failures are logged and yield an empty
    /// vector.
    pub fn get_lists(&self, category_id: i64) -> Vec<Lista> {
        self.store
            .get_listas_by_category(category_id)
            .unwrap_or_else(|err| {
                error!(category_id, error = %format!("{err:#}"), "failed to load lists");
                Vec::new()
            })
    }

    /// Items of a list in display order; empty on store failure.
    pub fn get_list_items(&self, list_id: i64) -> Vec<Item> {
        self.store.get_items_by_lista(list_id).unwrap_or_else(|err| {
            error!(list_id, error = %format!("{err:#}"), "failed to load list items");
            Vec::new()
        })
    }

    pub fn get_list_count(&self, category_id: i64) -> usize {
        self.get_lists(category_id).len()
    }

    // ---- clipboard ----

    /// Copy every item of the list to the clipboard in one go, joined by
    /// `separator`.
    pub fn copy_all_list_items(&mut self, list_id: i64, separator: &str) -> ListResult<String> {
        let lista = match self.store.get_lista(list_id) {
            Ok(Some(lista)) => lista,
            Ok(None) => return self.fail(ListError::NotFound(list_id)),
            Err(source) => return self.fail(ListError::store("copiar lista")(source)),
        };

        let items = self.get_list_items(list_id);
        if items.is_empty() {
            return self.fail(ListError::EmptyList);
        }

        let combined = items
            .iter()
            .map(|item| item.content.as_str())
            .collect::<Vec<_>>()
            .join(separator);

        if let Err(err) = self.clipboard.copy_text(&combined) {
            return self.fail(ListError::Clipboard(err));
        }

        self.record_use(list_id);
        info!(list_id, name = %lista.name, items = items.len(), "list copied to clipboard");
        Ok(format!("Copiados {} pasos de '{}'", items.len(), lista.name))
    }

    // ---- internals ----

    fn insert_list_items(
        &self,
        category_id: i64,
        list_id: i64,
        items: &[NewItem],
    ) -> anyhow::Result<Vec<i64>> {
        items
            .iter()
            .zip(1..)
            .map(|(item, orden_lista)| {
                self.store.add_item(
                    category_id,
                    item,
                    Some(ListPlacement {
                        list_id,
                        orden_lista,
                    }),
                )
            })
            .collect()
    }

    fn apply_update(
        &self,
        list_id: i64,
        category_id: i64,
        changes: &ListaChanges,
        items: Option<&[NewItem]>,
    ) -> anyhow::Result<()> {
        if !changes.is_empty() {
            self.store.update_lista(list_id, changes)?;
        }

        if let Some(items) = items {
            for current in self.store.get_items_by_lista(list_id)? {
                self.store.delete_item(current.id)?;
            }
            self.insert_list_items(category_id, list_id, items)?;
        }
        Ok(())
    }

    fn record_use(&self, list_id: i64) {
        if let Err(err) = self.store.mark_lista_used(list_id) {
            warn!(list_id, error = %format!("{err:#}"), "failed to record list usage");
        }
    }

    /// Log, broadcast and return `err`.
    fn fail<T>(&mut self, err: ListError) -> ListResult<T> {
        match &err {
            ListError::Store { .. } | ListError::Clipboard(_) | ListError::DeleteFailed => {
                error!(error = %err, "list operation failed");
            }
            _ => warn!(error = %err, "list operation rejected"),
        }
        self.events.publish(ListEvent::Error(err.to_string()));
        Err(err)
    }
}

/// Copy of `item` carrying `auto_tags` first, then its own tags without
/// duplicates.
fn tagged_copy(item: &Item, auto_tags: &[String]) -> NewItem {
    let mut tags = auto_tags.to_vec();
    for tag in &item.tags {
        if !tag.is_empty() && !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    NewItem {
        tags,
        ..item.to_new_item()
    }
}
