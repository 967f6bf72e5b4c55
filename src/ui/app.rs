use std::mem;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::Receiver;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info};

use crate::capture::{parse_tag_list, WizardStep};
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::Settings;
use crate::controller::ListController;
use crate::events::ListEvent;
use crate::models::{Category, ItemType, Lista, NewItem};
use crate::store::{ListStore, SqliteStore};

use super::forms::{
    category_form, fields, list_name_form, text_item_form, url_capture_from, url_form,
    ConfirmCategoryDelete, ConfirmItemDelete, ConfirmListDelete, EntryForm, FormAction, WebWizard,
};
use super::helpers::{
    centered_rect, clamp_selection, key_hints, progress_bar, surface_error,
};
use super::screens::{ItemsScreen, ListsScreen, StepsScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Characters of item content shown next to each label.
const PREVIEW_CHARS: usize = 48;
const PROGRESS_WIDTH: usize = 20;

/// High-level navigation states.
enum Screen {
    Categories,
    Lists(ListsScreen),
    Steps(StepsScreen),
    Items(ItemsScreen),
}

/// Modal overlays scoped to the current screen.
enum Mode {
    Normal,
    AddingCategory(EntryForm),
    AddingItem {
        category_id: i64,
        form: EntryForm,
    },
    SavingUrl {
        category_id: i64,
        form: EntryForm,
    },
    WebWizard(WebWizard),
    NamingList {
        category_id: i64,
        item_ids: Vec<i64>,
        form: EntryForm,
    },
    RenamingList {
        list_id: i64,
        form: EntryForm,
    },
    ConfirmCategoryDelete(ConfirmCategoryDelete),
    ConfirmListDelete(ConfirmListDelete),
    ConfirmItemDelete(ConfirmItemDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App<C: Clipboard = SystemClipboard> {
    controller: ListController<SqliteStore, C>,
    events: Receiver<ListEvent>,
    step_delay: Duration,
    separator: String,
    /// Categories with their list counts.
    categories: Vec<(Category, usize)>,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl<C: Clipboard> App<C> {
    pub fn new(mut controller: ListController<SqliteStore, C>, settings: &Settings) -> Result<Self> {
        let events = controller.subscribe();
        let mut app = Self {
            controller,
            events,
            step_delay: settings.step_delay(),
            separator: settings.copy_separator.clone(),
            categories: Vec::new(),
            selected: 0,
            screen: Screen::Categories,
            mode: Mode::Normal,
            status: None,
        };
        app.reload_categories(None)?;
        Ok(app)
    }

    /// Advance a running replay and fold pending controller events into the
    /// screen. Called once per loop iteration.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        self.controller.poll_execution(now);

        let mut stale = false;
        while let Ok(event) = self.events.try_recv() {
            stale |= self.apply_event(event);
        }
        if stale {
            self.refresh_screen()?;
        }
        Ok(())
    }

    /// When the loop must wake up for the next replay step.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.controller.next_execution_deadline()
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingCategory(form) => self.handle_add_category(code, form)?,
            Mode::AddingItem { category_id, form } => {
                self.handle_add_item(code, category_id, form)?
            }
            Mode::SavingUrl { category_id, form } => {
                self.handle_save_url(code, category_id, form)?
            }
            Mode::WebWizard(wizard) => self.handle_web_wizard(code, wizard)?,
            Mode::NamingList {
                category_id,
                item_ids,
                form,
            } => self.handle_name_list(code, category_id, item_ids, form)?,
            Mode::RenamingList { list_id, form } => self.handle_rename_list(code, list_id, form)?,
            Mode::ConfirmCategoryDelete(confirm) => {
                self.handle_confirm_category_delete(code, confirm)?
            }
            Mode::ConfirmListDelete(confirm) => self.handle_confirm_list_delete(code, confirm)?,
            Mode::ConfirmItemDelete(confirm) => self.handle_confirm_item_delete(code, confirm)?,
        };

        Ok(exit)
    }

    /// Returns whether the visible data may be out of date.
    fn apply_event(&mut self, event: ListEvent) -> bool {
        match event {
            ListEvent::Created { .. }
            | ListEvent::Updated { .. }
            | ListEvent::Deleted { .. }
            | ListEvent::Renamed { .. } => true,
            ListEvent::ExecutionStarted { total_items, .. } => {
                self.set_status(format!("Ejecutando {total_items} pasos..."), StatusKind::Info);
                false
            }
            ListEvent::ExecutionStep { step, label } => {
                self.set_status(format!("Paso {step}: '{label}' copiado"), StatusKind::Info);
                false
            }
            ListEvent::ExecutionCompleted { .. } => {
                self.set_status("Ejecución completada", StatusKind::Info);
                true
            }
            ListEvent::ExecutionCancelled => {
                self.set_status("Ejecución cancelada", StatusKind::Info);
                false
            }
            ListEvent::Error(message) => {
                // The failing call already reported it.
                debug!(%message, "controller error event");
                false
            }
            ListEvent::LegacyCreated { .. }
            | ListEvent::LegacyUpdated { .. }
            | ListEvent::LegacyDeleted { .. } => false,
        }
    }

    // ---- normal mode ----

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Categories => self.handle_categories_key(code, exit),
            Screen::Lists(_) => self.handle_lists_key(code, exit),
            Screen::Steps(_) => self.handle_steps_key(code, exit),
            Screen::Items(_) => self.handle_items_key(code, exit),
        }
    }

    fn handle_categories_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.selected = clamp_selection(self.selected, -1, self.categories.len()),
            KeyCode::Down => self.selected = clamp_selection(self.selected, 1, self.categories.len()),
            KeyCode::Enter => match self.categories.get(self.selected) {
                Some((category, _)) => {
                    let category = category.clone();
                    self.open_lists(category, None);
                }
                None => self.set_status("No hay ninguna categoría seleccionada.", StatusKind::Error),
            },
            KeyCode::Char('+') | KeyCode::Char('a') => return Ok(Mode::AddingCategory(category_form())),
            KeyCode::Char('-') => {
                if let Some((category, list_count)) = self.categories.get(self.selected) {
                    return Ok(Mode::ConfirmCategoryDelete(ConfirmCategoryDelete {
                        category: category.clone(),
                        list_count: *list_count,
                    }));
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_lists_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Lists(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        let category = screen.category.clone();
        let current = screen.current().cloned();

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.reload_categories(Some(category.id))?;
                self.screen = Screen::Categories;
                self.clear_status();
            }
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::Tab => self.open_items(category)?,
            KeyCode::Char('s') => self.stop_execution(),
            _ => {
                let Some(lista) = current else {
                    if matches!(
                        code,
                        KeyCode::Enter | KeyCode::Char('x' | 'c' | 'e' | '-')
                    ) {
                        self.set_status("No hay ninguna lista seleccionada.", StatusKind::Error);
                    }
                    return Ok(Mode::Normal);
                };
                match code {
                    KeyCode::Enter => self.open_steps(category, lista)?,
                    KeyCode::Char('x') => self.execute_list(lista.id),
                    KeyCode::Char('c') => self.copy_list(lista.id),
                    KeyCode::Char('e') => {
                        return Ok(Mode::RenamingList {
                            list_id: lista.id,
                            form: list_name_form("Renombrar lista", &lista.name),
                        })
                    }
                    KeyCode::Char('-') => {
                        return Ok(Mode::ConfirmListDelete(ConfirmListDelete { lista }))
                    }
                    _ => {}
                }
            }
        }
        Ok(Mode::Normal)
    }

    fn handle_steps_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Steps(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        let category = screen.category.clone();
        let list_id = screen.lista.id;

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.open_lists(category, Some(list_id));
            }
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::Char('K') => self.move_step(-1)?,
            KeyCode::Char('J') => self.move_step(1)?,
            KeyCode::Enter => {
                if let Some(item) = screen.current().cloned() {
                    self.copy_text(&item.label, &item.content);
                }
            }
            KeyCode::Char('x') => self.execute_list(list_id),
            KeyCode::Char('c') => self.copy_list(list_id),
            KeyCode::Char('s') => self.stop_execution(),
            KeyCode::Char('e') => {
                return Ok(Mode::RenamingList {
                    list_id,
                    form: list_name_form("Renombrar lista", &screen.lista.name),
                })
            }
            KeyCode::Char('-') => {
                return Ok(Mode::ConfirmListDelete(ConfirmListDelete {
                    lista: screen.lista.clone(),
                }))
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_items_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Items(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        let category_id = screen.category.id;

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc | KeyCode::Tab => {
                let category = screen.category.clone();
                self.open_lists(category, None);
            }
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::Char(' ') => {
                screen.toggle_mark();
            }
            KeyCode::Enter => {
                if let Some(item) = screen.current().cloned() {
                    self.copy_text(&item.label, &item.content);
                }
            }
            KeyCode::Char('o') => {
                if let Some(item) = screen.current().cloned() {
                    self.open_item(&item.label, &item.content, item.item_type);
                }
            }
            KeyCode::Char('l') => {
                if screen.marked.is_empty() {
                    self.set_status(
                        "Marca items con [Espacio] antes de crear una lista.",
                        StatusKind::Error,
                    );
                } else {
                    return Ok(Mode::NamingList {
                        category_id,
                        item_ids: screen.marked.clone(),
                        form: list_name_form("Nueva lista", ""),
                    });
                }
            }
            KeyCode::Char('n') => {
                return Ok(Mode::AddingItem {
                    category_id,
                    form: text_item_form(),
                })
            }
            KeyCode::Char('u') => {
                return Ok(Mode::SavingUrl {
                    category_id,
                    form: url_form(),
                })
            }
            KeyCode::Char('w') => return Ok(Mode::WebWizard(WebWizard::new(category_id))),
            KeyCode::Char('-') => {
                if let Some(item) = screen.current().cloned() {
                    return Ok(Mode::ConfirmItemDelete(ConfirmItemDelete { item }));
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    // ---- modal forms ----

    fn handle_add_category(&mut self, code: KeyCode, mut form: EntryForm) -> Result<Mode> {
        match form.apply_key(code) {
            FormAction::Continue => {}
            FormAction::Cancel => {
                self.set_status("Creación cancelada.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormAction::Submit => {
                if !form.check_required() {
                    return Ok(Mode::AddingCategory(form));
                }
                let icon = form.value(fields::ICON).trim();
                let created = self
                    .controller
                    .store()
                    .create_category(form.value(fields::NAME).trim(), (!icon.is_empty()).then_some(icon));
                match created {
                    Ok(category) => {
                        info!(category_id = category.id, name = %category.name, "category created");
                        self.reload_categories(Some(category.id))?;
                        self.set_status(format!("Categoría '{}' creada.", category.name), StatusKind::Info);
                        return Ok(Mode::Normal);
                    }
                    Err(err) => {
                        let message = surface_error(&err);
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
        }
        Ok(Mode::AddingCategory(form))
    }

    fn handle_add_item(&mut self, code: KeyCode, category_id: i64, mut form: EntryForm) -> Result<Mode> {
        match form.apply_key(code) {
            FormAction::Continue => {}
            FormAction::Cancel => {
                self.set_status("Creación cancelada.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormAction::Submit => {
                if !form.check_required() {
                    return Ok(Mode::AddingItem { category_id, form });
                }
                let description = form.value(fields::DESCRIPTION).trim();
                let item = NewItem {
                    description: (!description.is_empty()).then(|| description.to_string()),
                    tags: parse_tag_list(form.value(fields::TAGS)),
                    ..NewItem::text(form.value(fields::LABEL).trim(), form.value(fields::CONTENT))
                };
                if self.save_item(category_id, &item, &mut form)? {
                    return Ok(Mode::Normal);
                }
            }
        }
        Ok(Mode::AddingItem { category_id, form })
    }

    fn handle_save_url(&mut self, code: KeyCode, category_id: i64, mut form: EntryForm) -> Result<Mode> {
        match form.apply_key(code) {
            FormAction::Continue => {}
            FormAction::Cancel => {
                self.set_status("Captura cancelada.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormAction::Submit => match url_capture_from(&form, category_id).finish() {
                Ok((category_id, item)) => {
                    if self.save_item(category_id, &item, &mut form)? {
                        return Ok(Mode::Normal);
                    }
                }
                Err(err) => form.error = Some(err.to_string()),
            },
        }
        Ok(Mode::SavingUrl { category_id, form })
    }

    fn handle_web_wizard(&mut self, code: KeyCode, mut wizard: WebWizard) -> Result<Mode> {
        let on_content = wizard.draft.step() == WizardStep::Content;
        match wizard.form.apply_key(code) {
            FormAction::Continue => {}
            FormAction::Cancel if on_content => wizard.retreat(),
            FormAction::Cancel => {
                self.set_status("Creación cancelada.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormAction::Submit if !on_content => {
                wizard.advance();
            }
            FormAction::Submit => {
                wizard.sync_content();
                match wizard.draft.finish() {
                    Ok((category_id, item)) => {
                        if self.save_item(category_id, &item, &mut wizard.form)? {
                            return Ok(Mode::Normal);
                        }
                    }
                    Err(err) => wizard.form.error = Some(err.to_string()),
                }
            }
        }
        Ok(Mode::WebWizard(wizard))
    }

    fn handle_name_list(
        &mut self,
        code: KeyCode,
        category_id: i64,
        item_ids: Vec<i64>,
        mut form: EntryForm,
    ) -> Result<Mode> {
        match form.apply_key(code) {
            FormAction::Continue => {}
            FormAction::Cancel => {
                self.set_status("Creación cancelada.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormAction::Submit => {
                let name = form.value(fields::NAME).to_string();
                match self.controller.create_list_from_items(&name, category_id, &item_ids) {
                    Ok(created) => {
                        if let Screen::Items(screen) = &mut self.screen {
                            screen.marked.clear();
                        }
                        self.set_status(created.message, StatusKind::Info);
                        return Ok(Mode::Normal);
                    }
                    Err(err) => form.error = Some(err.to_string()),
                }
            }
        }
        Ok(Mode::NamingList {
            category_id,
            item_ids,
            form,
        })
    }

    fn handle_rename_list(&mut self, code: KeyCode, list_id: i64, mut form: EntryForm) -> Result<Mode> {
        match form.apply_key(code) {
            FormAction::Continue => {}
            FormAction::Cancel => {
                self.set_status("Edición cancelada.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormAction::Submit => {
                match self.controller.rename_list(list_id, form.value(fields::NAME)) {
                    Ok(message) => {
                        self.set_status(message, StatusKind::Info);
                        return Ok(Mode::Normal);
                    }
                    Err(err) => form.error = Some(err.to_string()),
                }
            }
        }
        Ok(Mode::RenamingList { list_id, form })
    }

    fn handle_confirm_category_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmCategoryDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Eliminación cancelada.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('s') => {
                match self.controller.store().delete_category(confirm.category.id) {
                    Ok(()) => {
                        info!(category_id = confirm.category.id, "category deleted");
                        self.reload_categories(None)?;
                        self.set_status(
                            format!("Categoría '{}' eliminada.", confirm.category.name),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmCategoryDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmCategoryDelete(confirm)),
        }
    }

    fn handle_confirm_list_delete(&mut self, code: KeyCode, confirm: ConfirmListDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Eliminación cancelada.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('s') => {
                match self.controller.delete_list(confirm.lista.id) {
                    Ok(message) => {
                        self.set_status(message, StatusKind::Info);
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        self.set_status(err.to_string(), StatusKind::Error);
                        Ok(Mode::ConfirmListDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmListDelete(confirm)),
        }
    }

    fn handle_confirm_item_delete(&mut self, code: KeyCode, confirm: ConfirmItemDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Eliminación cancelada.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('s') => {
                match self.controller.store().delete_item(confirm.item.id) {
                    Ok(()) => {
                        self.refresh_screen()?;
                        self.set_status(
                            format!("Item '{}' eliminado.", confirm.item.label),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmItemDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmItemDelete(confirm)),
        }
    }

    // ---- actions ----

    fn execute_list(&mut self, list_id: i64) {
        if let Err(err) = self
            .controller
            .execute_list_sequentially(list_id, self.step_delay)
        {
            self.set_status(err.to_string(), StatusKind::Error);
        }
    }

    fn stop_execution(&mut self) {
        if self.controller.is_executing() {
            self.controller.cancel_execution();
        } else {
            self.set_status("No hay ninguna ejecución en curso.", StatusKind::Info);
        }
    }

    fn copy_list(&mut self, list_id: i64) {
        match self.controller.copy_all_list_items(list_id, &self.separator) {
            Ok(message) => self.set_status(message, StatusKind::Info),
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn copy_text(&mut self, label: &str, content: &str) {
        match self.controller.clipboard_mut().copy_text(content) {
            Ok(()) => self.set_status(format!("'{label}' copiado al portapapeles"), StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_item(&mut self, label: &str, content: &str, item_type: ItemType) {
        if item_type != ItemType::Url {
            self.set_status("Solo se pueden abrir items de tipo URL.", StatusKind::Error);
            return;
        }
        match open_link(content) {
            Ok(()) => self.set_status(format!("Abriendo '{label}'..."), StatusKind::Info),
            Err(err) => self.set_status(format!("Error al abrir URL: {err}"), StatusKind::Error),
        }
    }

    fn move_step(&mut self, offset: isize) -> Result<()> {
        let Screen::Steps(screen) = &self.screen else {
            return Ok(());
        };
        let Some((items, target)) = screen.reordered(offset) else {
            return Ok(());
        };
        let list_id = screen.lista.id;

        match self.controller.update_list(list_id, None, None, Some(&items)) {
            Ok(_) => {
                self.refresh_screen()?;
                if let Screen::Steps(screen) = &mut self.screen {
                    screen.selected = clamp_selection(target, 0, screen.items.len());
                }
                self.set_status(format!("Paso movido a la posición {}", target + 1), StatusKind::Info);
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
        Ok(())
    }

    /// Insert a standalone item. Returns `false` and leaves the message on
    /// the form when the store rejects it.
    fn save_item(&mut self, category_id: i64, item: &NewItem, form: &mut EntryForm) -> Result<bool> {
        match self.controller.store().add_item(category_id, item, None) {
            Ok(item_id) => {
                info!(item_id, category_id, kind = %item.item_type, "item saved");
                self.refresh_screen()?;
                self.set_status(format!("Item '{}' guardado.", item.label), StatusKind::Info);
                Ok(true)
            }
            Err(err) => {
                let message = surface_error(&err);
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                Ok(false)
            }
        }
    }

    // ---- navigation and reloads ----

    fn open_lists(&mut self, category: Category, focus_id: Option<i64>) {
        let lists = self.controller.get_lists(category.id);
        let mut screen = ListsScreen::new(category, Vec::new());
        screen.set_lists(lists, focus_id);
        self.screen = Screen::Lists(screen);
        self.clear_status();
    }

    fn open_steps(&mut self, category: Category, lista: Lista) -> Result<()> {
        let items = self.controller.get_list_items(lista.id);
        self.screen = Screen::Steps(StepsScreen::new(category, lista, items));
        self.clear_status();
        Ok(())
    }

    fn open_items(&mut self, category: Category) -> Result<()> {
        let items = self.controller.store().loose_items(category.id)?;
        self.screen = Screen::Items(ItemsScreen::new(category, items));
        self.clear_status();
        Ok(())
    }

    fn reload_categories(&mut self, focus_id: Option<i64>) -> Result<()> {
        let categories = self.controller.store().categories()?;
        self.categories = categories
            .into_iter()
            .map(|category| {
                let count = self.controller.get_list_count(category.id);
                (category, count)
            })
            .collect();

        if let Some(index) =
            focus_id.and_then(|id| self.categories.iter().position(|(c, _)| c.id == id))
        {
            self.selected = index;
        }
        self.selected = clamp_selection(self.selected, 0, self.categories.len());
        Ok(())
    }

    /// Reload whatever the current screen shows. A steps screen whose list
    /// disappeared falls back to the category's lists.
    fn refresh_screen(&mut self) -> Result<()> {
        let mut fallback = None;
        match &mut self.screen {
            Screen::Categories => {}
            Screen::Lists(screen) => {
                let focus = screen.current().map(|lista| lista.id);
                screen.set_lists(self.controller.get_lists(screen.category.id), focus);
            }
            Screen::Steps(screen) => match self.controller.store().get_lista(screen.lista.id)? {
                Some(lista) => {
                    screen.set_items(self.controller.get_list_items(lista.id));
                    screen.lista = lista;
                }
                None => fallback = Some(screen.category.clone()),
            },
            Screen::Items(screen) => {
                screen.set_items(self.controller.store().loose_items(screen.category.id)?);
            }
        }

        if matches!(self.screen, Screen::Categories) {
            self.reload_categories(None)?;
        }
        if let Some(category) = fallback {
            let status = self.status.take();
            self.open_lists(category, None);
            self.status = status;
        }
        Ok(())
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    // ---- drawing ----

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Categories => self.draw_categories(frame, content_area),
            Screen::Lists(screen) => self.draw_lists(frame, content_area, screen),
            Screen::Steps(screen) => self.draw_steps(frame, content_area, screen),
            Screen::Items(screen) => self.draw_items(frame, content_area, screen),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Normal => {}
            Mode::AddingCategory(form)
            | Mode::AddingItem { form, .. }
            | Mode::SavingUrl { form, .. }
            | Mode::NamingList { form, .. }
            | Mode::RenamingList { form, .. } => self.draw_form(frame, area, form),
            Mode::WebWizard(wizard) => self.draw_form(frame, area, &wizard.form),
            Mode::ConfirmCategoryDelete(confirm) => self.draw_confirm(
                frame,
                area,
                "Eliminar categoría",
                vec![
                    Line::from(format!("¿Eliminar la categoría '{}'?", confirm.category.name)),
                    Line::from(format!(
                        "Se eliminarán también sus {} listas y todos sus items.",
                        confirm.list_count
                    )),
                ],
            ),
            Mode::ConfirmListDelete(confirm) => self.draw_confirm(
                frame,
                area,
                "Eliminar lista",
                vec![
                    Line::from(format!("¿Eliminar la lista '{}'?", confirm.lista.name)),
                    Line::from(format!(
                        "Se eliminarán también sus {} pasos.",
                        confirm.lista.item_count
                    )),
                ],
            ),
            Mode::ConfirmItemDelete(confirm) => self.draw_confirm(
                frame,
                area,
                "Eliminar item",
                vec![Line::from(format!(
                    "¿Eliminar el item '{}'?",
                    confirm.item.display_label()
                ))],
            ),
        }
    }

    fn draw_categories(&self, frame: &mut Frame, area: Rect) {
        let rows = if self.categories.is_empty() {
            vec![ListItem::new("No hay categorías. Pulsa [+] para crear una.")]
        } else {
            self.categories
                .iter()
                .map(|(category, count)| ListItem::new(format!("{category}  ({count} listas)")))
                .collect()
        };
        let selected = (!self.categories.is_empty()).then_some(self.selected);
        render_rows(frame, area, "Categorías".to_string(), rows, selected);
    }

    fn draw_lists(&self, frame: &mut Frame, area: Rect, screen: &ListsScreen) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let progress = self.controller.execution_progress();
        let rows = if screen.lists.is_empty() {
            vec![ListItem::new(
                "Sin listas. Pulsa [Tab], marca items y crea una con [l].",
            )]
        } else {
            screen
                .lists
                .iter()
                .map(|lista| {
                    let mut spans = vec![
                        Span::raw(lista.name.clone()),
                        Span::styled(
                            format!("  · {} pasos", lista.item_count),
                            Style::default().fg(Color::Gray),
                        ),
                    ];
                    if let Some(progress) = progress.as_ref().filter(|p| p.list_id == lista.id) {
                        spans.push(Span::styled(
                            format!("  {}", progress_bar(progress, PROGRESS_WIDTH)),
                            Style::default().fg(Color::Green),
                        ));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect()
        };
        let selected = (!screen.lists.is_empty()).then_some(screen.selected);
        render_rows(frame, chunks[0], format!("{} · Listas", screen.category), rows, selected);

        let block = Block::default().title("Detalles").borders(Borders::ALL);
        let details = match screen.current() {
            Some(lista) => vec![
                Line::from(Span::styled(
                    lista.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(lista.description.clone().unwrap_or_default()),
                Line::from(""),
                Line::from(format!("Pasos: {}", lista.item_count)),
                Line::from(lista.formatted_use_count()),
                Line::from(lista.formatted_last_used()),
                Line::from(format!("Creada: {}", lista.created_at)),
            ],
            None => vec![Line::from("")],
        };
        frame.render_widget(
            Paragraph::new(details).block(block).wrap(Wrap { trim: true }),
            chunks[1],
        );
    }

    fn draw_steps(&self, frame: &mut Frame, area: Rect, screen: &StepsScreen) {
        let done = self
            .controller
            .execution_progress()
            .filter(|progress| progress.list_id == screen.lista.id)
            .map(|progress| progress.completed);

        let rows = if screen.items.is_empty() {
            vec![ListItem::new("La lista está vacía.")]
        } else {
            screen
                .items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let style = match done {
                        Some(completed) if index < completed => Style::default().fg(Color::Green),
                        _ => Style::default(),
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{:>2}. {}", index + 1, item.display_label()), style),
                        Span::styled(
                            format!("  [{}] {}", item.item_type, item.preview(PREVIEW_CHARS)),
                            Style::default().fg(Color::Gray),
                        ),
                    ]))
                })
                .collect()
        };
        let selected = (!screen.items.is_empty()).then_some(screen.selected);
        let title = format!("{} · {}", screen.category, screen.lista.name);
        render_rows(frame, area, title, rows, selected);
    }

    fn draw_items(&self, frame: &mut Frame, area: Rect, screen: &ItemsScreen) {
        let rows = if screen.items.is_empty() {
            vec![ListItem::new("Sin items. Pulsa [n], [u] o [w] para añadir uno.")]
        } else {
            screen
                .items
                .iter()
                .map(|item| {
                    let mark = match screen.mark_position(item.id) {
                        Some(position) => format!("[{}]", position + 1),
                        None => "[ ]".to_string(),
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(mark, Style::default().fg(Color::Cyan)),
                        Span::raw(format!(" {}", item.display_label())),
                        Span::styled(
                            format!("  [{}] {}", item.item_type, item.preview(PREVIEW_CHARS)),
                            Style::default().fg(Color::Gray),
                        ),
                    ]))
                })
                .collect()
        };
        let selected = (!screen.items.is_empty()).then_some(screen.selected);
        render_rows(frame, area, format!("{} · Items", screen.category), rows, selected);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = match &self.status {
            Some(status) => Line::from(vec![Span::styled(status.text.clone(), status.kind.style())]),
            None => Line::from(""),
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (
                _,
                Mode::ConfirmCategoryDelete(_)
                | Mode::ConfirmListDelete(_)
                | Mode::ConfirmItemDelete(_),
            ) => {
                key_hints(&[("Y", "Confirmar"), ("N/Esc", "Cancelar")])
            }
            (_, Mode::Normal) => match &self.screen {
                Screen::Categories => key_hints(&[
                    ("↑↓", "Navegar"),
                    ("Enter", "Abrir"),
                    ("+", "Nueva categoría"),
                    ("-", "Eliminar"),
                    ("q", "Salir"),
                ]),
                Screen::Lists(_) => key_hints(&[
                    ("Enter", "Pasos"),
                    ("x", "Ejecutar"),
                    ("c", "Copiar todo"),
                    ("s", "Detener"),
                    ("e", "Renombrar"),
                    ("-", "Eliminar"),
                    ("Tab", "Items"),
                    ("Esc", "Volver"),
                ]),
                Screen::Steps(_) => key_hints(&[
                    ("Enter", "Copiar paso"),
                    ("K/J", "Mover"),
                    ("x", "Ejecutar"),
                    ("c", "Copiar todo"),
                    ("s", "Detener"),
                    ("Esc", "Volver"),
                ]),
                Screen::Items(_) => key_hints(&[
                    ("Enter", "Copiar"),
                    ("Espacio", "Marcar"),
                    ("l", "Crear lista"),
                    ("n", "Texto"),
                    ("u", "URL"),
                    ("w", "Web"),
                    ("o", "Abrir"),
                    ("-", "Eliminar"),
                    ("Esc", "Volver"),
                ]),
            },
            _ => key_hints(&[("Enter", "Guardar"), ("Tab", "Campo"), ("Esc", "Cancelar")]),
        }
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &EntryForm) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(form.title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.build_lines();
        lines.push(Line::from(""));
        match &form.error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Enter para guardar • Tab para cambiar de campo • Esc para cancelar",
                Style::default().fg(Color::Gray),
            ))),
        }
        frame.render_widget(Paragraph::new(lines), inner);

        if let Some(field) = form.fields.get(form.active) {
            let prefix = field.name.chars().count() as u16 + 2;
            let cursor_x = inner.x + prefix + field.value.chars().count() as u16;
            let cursor_y = inner.y + form.active as u16;
            frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), cursor_y));
        }
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'static>>) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Pulsa Y para confirmar o N / Esc para cancelar.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

fn render_rows(
    frame: &mut Frame,
    area: Rect,
    title: String,
    rows: Vec<ListItem<'static>>,
    selected: Option<usize>,
) {
    let list = List::new(rows)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::clipboard::MemoryClipboard;

    fn app() -> App<MemoryClipboard> {
        let store = SqliteStore::open_in_memory().expect("store");
        let controller = ListController::new(store, MemoryClipboard::new());
        let mut settings = Settings::with_data_dir(Path::new("/tmp/shelf-test"));
        settings.step_delay_ms = 100;
        App::new(controller, &settings).expect("app")
    }

    fn type_text(app: &mut App<MemoryClipboard>, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).expect("key");
        }
    }

    fn seed_category(app: &mut App<MemoryClipboard>) -> i64 {
        app.handle_key(KeyCode::Char('+')).expect("open form");
        type_text(app, "Git");
        app.handle_key(KeyCode::Enter).expect("save");
        app.categories[0].0.id
    }

    fn status_text(app: &App<MemoryClipboard>) -> &str {
        app.status.as_ref().map(|s| s.text.as_str()).unwrap_or_default()
    }

    #[test]
    fn category_form_creates_and_focuses() {
        let mut app = app();
        seed_category(&mut app);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.categories.len(), 1);
        assert_eq!(app.categories[0].0.name, "Git");
        assert_eq!(status_text(&app), "Categoría 'Git' creada.");

        app.handle_key(KeyCode::Char('+')).expect("open form");
        type_text(&mut app, "Git");
        app.handle_key(KeyCode::Enter).expect("duplicate");
        let Mode::AddingCategory(form) = &app.mode else {
            panic!("form should stay open");
        };
        assert!(form.error.is_some());
    }

    #[test]
    fn marked_items_become_a_list_and_replay() {
        let mut app = app();
        let category_id = seed_category(&mut app);
        let store = app.controller.store();
        store
            .add_item(category_id, &NewItem::text("pull", "git pull"), None)
            .expect("item");
        store
            .add_item(category_id, &NewItem::text("push", "git push"), None)
            .expect("item");

        app.handle_key(KeyCode::Enter).expect("open lists");
        app.handle_key(KeyCode::Tab).expect("items");
        app.handle_key(KeyCode::Char(' ')).expect("mark");
        app.handle_key(KeyCode::Down).expect("down");
        app.handle_key(KeyCode::Char(' ')).expect("mark");
        app.handle_key(KeyCode::Char('l')).expect("name list");
        type_text(&mut app, "Sync");
        app.handle_key(KeyCode::Enter).expect("create");
        assert_eq!(status_text(&app), "Lista 'Sync' creada con 2 pasos");

        app.handle_key(KeyCode::Esc).expect("back to lists");
        app.tick(Instant::now()).expect("tick");
        let Screen::Lists(screen) = &app.screen else {
            panic!("expected lists screen");
        };
        assert_eq!(screen.lists.len(), 1);
        assert_eq!(screen.lists[0].item_count, 2);

        app.handle_key(KeyCode::Char('x')).expect("execute");
        assert_eq!(app.controller.clipboard().last(), Some("git pull"));
        assert!(app.next_deadline().is_some());

        app.tick(Instant::now() + Duration::from_millis(150))
            .expect("tick");
        assert_eq!(app.controller.clipboard().last(), Some("git push"));
        assert_eq!(status_text(&app), "Ejecución completada");
        assert!(app.next_deadline().is_none());
    }

    #[test]
    fn list_without_marks_is_refused() {
        let mut app = app();
        seed_category(&mut app);
        app.handle_key(KeyCode::Enter).expect("lists");
        app.handle_key(KeyCode::Tab).expect("items");
        app.handle_key(KeyCode::Char('l')).expect("list");
        assert!(matches!(app.mode, Mode::Normal));
        assert!(status_text(&app).contains("Marca items"));
    }

    #[test]
    fn rename_errors_stay_on_the_form() {
        let mut app = app();
        let category_id = seed_category(&mut app);
        app.controller
            .create_list(category_id, "Deploy", &[NewItem::text("a", "1")], None)
            .expect("list");
        app.controller
            .create_list(category_id, "Build", &[NewItem::text("b", "2")], None)
            .expect("list");

        app.handle_key(KeyCode::Enter).expect("lists");
        // Sorted by name: Build, Deploy.
        app.handle_key(KeyCode::Char('e')).expect("rename");
        for _ in 0.."Build".len() {
            app.handle_key(KeyCode::Backspace).expect("erase");
        }
        type_text(&mut app, "Deploy");
        app.handle_key(KeyCode::Enter).expect("submit");

        let Mode::RenamingList { form, .. } = &app.mode else {
            panic!("form should stay open");
        };
        assert!(form.error.as_deref().unwrap_or_default().contains("Deploy"));
    }

    #[test]
    fn deleting_a_category_drops_its_lists() {
        let mut app = app();
        let category_id = seed_category(&mut app);
        app.controller
            .create_list(category_id, "Deploy", &[NewItem::text("a", "1")], None)
            .expect("list");
        app.reload_categories(None).expect("reload");
        assert_eq!(app.categories[0].1, 1);

        app.handle_key(KeyCode::Char('-')).expect("confirm");
        app.handle_key(KeyCode::Char('n')).expect("cancel");
        assert_eq!(app.categories.len(), 1);

        app.handle_key(KeyCode::Char('-')).expect("confirm");
        app.handle_key(KeyCode::Char('y')).expect("delete");
        assert!(app.categories.is_empty());
        assert_eq!(app.controller.get_list_count(category_id), 0);
    }

    #[test]
    fn stop_without_replay_is_reported() {
        let mut app = app();
        seed_category(&mut app);
        app.handle_key(KeyCode::Enter).expect("lists");
        app.handle_key(KeyCode::Char('s')).expect("stop");
        assert_eq!(status_text(&app), "No hay ninguna ejecución en curso.");
    }
}
