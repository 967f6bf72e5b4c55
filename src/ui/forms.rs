use crossterm::event::KeyCode;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::capture::{UrlCapture, WebStaticDraft};
use crate::models::{Category, Item, Lista};

/// What a key press did to a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormAction {
    Continue,
    Cancel,
    Submit,
}

/// One labelled text input.
#[derive(Clone)]
pub(crate) struct FormField {
    pub(crate) name: &'static str,
    pub(crate) value: String,
    pub(crate) required: bool,
}

/// Modal form made of single-line fields. Tab cycles focus, typed characters
/// go to the focused field.
#[derive(Clone)]
pub(crate) struct EntryForm {
    pub(crate) title: &'static str,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl EntryForm {
    pub(crate) fn new(title: &'static str, fields: &[(&'static str, bool)]) -> Self {
        Self {
            title,
            fields: fields
                .iter()
                .map(|&(name, required)| FormField {
                    name,
                    value: String::new(),
                    required,
                })
                .collect(),
            active: 0,
            error: None,
        }
    }

    pub(crate) fn with_value(mut self, index: usize, value: impl Into<String>) -> Self {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = value.into();
        }
        self
    }

    pub(crate) fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.value.as_str())
            .unwrap_or_default()
    }

    pub(crate) fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + 1) % self.fields.len();
        }
    }

    pub(crate) fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.fields.get_mut(self.active) {
            Some(field) => {
                field.value.push(ch);
                self.error = None;
                true
            }
            None => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.pop();
        }
    }

    pub(crate) fn apply_key(&mut self, code: KeyCode) -> FormAction {
        match code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::Tab | KeyCode::Down => self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.previous_field(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(ch) => {
                self.push_char(ch);
            }
            _ => {}
        }
        FormAction::Continue
    }

    /// Name of the first required field left blank.
    pub(crate) fn missing_required(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|field| field.required && field.value.trim().is_empty())
            .map(|field| field.name)
    }

    /// Check required fields, storing the message on the form when one is
    /// blank.
    pub(crate) fn check_required(&mut self) -> bool {
        match self.missing_required() {
            Some(name) => {
                self.error = Some(format!("El campo '{name}' es obligatorio."));
                false
            }
            None => true,
        }
    }

    pub(crate) fn build_lines(&self) -> Vec<Line<'static>> {
        self.fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let is_active = index == self.active;
                let display = if field.value.is_empty() {
                    if field.required { "<required>" } else { "<optional>" }.to_string()
                } else {
                    field.value.clone()
                };
                let style = if is_active {
                    Style::default().fg(Color::Yellow)
                } else if field.value.is_empty() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::raw(format!("{}: ", field.name)),
                    Span::styled(display, style),
                ])
            })
            .collect()
    }
}

pub(crate) mod fields {
    pub(crate) const NAME: usize = 0;
    pub(crate) const ICON: usize = 1;

    pub(crate) const LABEL: usize = 0;
    pub(crate) const CONTENT: usize = 1;
    pub(crate) const DESCRIPTION: usize = 2;
    pub(crate) const TAGS: usize = 3;

    pub(crate) const URL: usize = 0;
    pub(crate) const URL_LABEL: usize = 1;

    pub(crate) const HTML: usize = 0;
}

pub(crate) fn category_form() -> EntryForm {
    EntryForm::new("Nueva categoría", &[("Nombre", true), ("Icono", false)])
}

pub(crate) fn text_item_form() -> EntryForm {
    EntryForm::new(
        "Nuevo item",
        &[
            ("Nombre", true),
            ("Contenido", true),
            ("Descripción", false),
            ("Tags", false),
        ],
    )
}

pub(crate) fn url_form() -> EntryForm {
    EntryForm::new(
        "Guardar URL",
        &[
            ("URL", true),
            ("Nombre", false),
            ("Descripción", false),
            ("Tags", false),
        ],
    )
}

/// Build the URL capture from the form. An empty label falls back to the
/// URL itself.
pub(crate) fn url_capture_from(form: &EntryForm, category_id: i64) -> UrlCapture {
    let mut capture = UrlCapture::new(form.value(fields::URL), form.value(fields::URL_LABEL));
    capture.category_id = Some(category_id);
    capture.description = form.value(fields::DESCRIPTION).to_string();
    capture.tags = form.value(fields::TAGS).to_string();
    capture
}

pub(crate) fn list_name_form(title: &'static str, current: &str) -> EntryForm {
    EntryForm::new(title, &[("Nombre", true)]).with_value(fields::NAME, current)
}

/// Static web item wizard: a draft plus the form for its current step.
#[derive(Clone)]
pub(crate) struct WebWizard {
    pub(crate) draft: WebStaticDraft,
    pub(crate) form: EntryForm,
}

impl WebWizard {
    pub(crate) fn new(category_id: i64) -> Self {
        Self {
            draft: WebStaticDraft::new(Some(category_id)),
            form: Self::details_form(&WebStaticDraft::default()),
        }
    }

    fn details_form(draft: &WebStaticDraft) -> EntryForm {
        EntryForm::new(
            "Item web estático (1/2)",
            &[("Nombre", true), ("Descripción", false), ("Tags", false)],
        )
        .with_value(0, draft.label.clone())
        .with_value(1, draft.description.clone())
        .with_value(2, draft.tags.clone())
    }

    fn content_form(draft: &WebStaticDraft) -> EntryForm {
        EntryForm::new("Item web estático (2/2)", &[("HTML", true)])
            .with_value(fields::HTML, draft.html.clone())
    }

    /// Move from details to content. Errors stay on the form.
    pub(crate) fn advance(&mut self) -> bool {
        self.draft.label = self.form.value(0).to_string();
        self.draft.description = self.form.value(1).to_string();
        self.draft.tags = self.form.value(2).to_string();
        match self.draft.go_next() {
            Ok(()) => {
                self.form = Self::content_form(&self.draft);
                true
            }
            Err(err) => {
                self.form.error = Some(err.to_string());
                false
            }
        }
    }

    pub(crate) fn retreat(&mut self) {
        self.draft.html = self.form.value(fields::HTML).to_string();
        self.draft.go_back();
        self.form = Self::details_form(&self.draft);
    }

    pub(crate) fn sync_content(&mut self) {
        self.draft.html = self.form.value(fields::HTML).to_string();
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmCategoryDelete {
    pub(crate) category: Category,
    pub(crate) list_count: usize,
}

#[derive(Clone)]
pub(crate) struct ConfirmListDelete {
    pub(crate) lista: Lista,
}

#[derive(Clone)]
pub(crate) struct ConfirmItemDelete {
    pub(crate) item: Item,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::WizardStep;

    #[test]
    fn required_fields_are_reported_by_name() {
        let mut form = text_item_form();
        assert!(!form.check_required());
        assert_eq!(form.error.as_deref(), Some("El campo 'Nombre' es obligatorio."));

        for ch in "deploy".chars() {
            form.push_char(ch);
        }
        assert!(form.error.is_none());
        form.next_field();
        assert_eq!(form.missing_required(), Some("Contenido"));
        form.push_char('x');
        assert!(form.check_required());
    }

    #[test]
    fn keys_edit_the_focused_field() {
        let mut form = category_form();
        assert_eq!(form.apply_key(KeyCode::Char('G')), FormAction::Continue);
        assert_eq!(form.apply_key(KeyCode::Tab), FormAction::Continue);
        form.apply_key(KeyCode::Char('*'));
        form.apply_key(KeyCode::Backspace);
        form.apply_key(KeyCode::Char('#'));
        assert_eq!(form.value(fields::NAME), "G");
        assert_eq!(form.value(fields::ICON), "#");
        assert_eq!(form.apply_key(KeyCode::Enter), FormAction::Submit);
        assert_eq!(form.apply_key(KeyCode::Esc), FormAction::Cancel);
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = url_form();
        form.previous_field();
        assert_eq!(form.active, 3);
        form.next_field();
        assert_eq!(form.active, 0);
    }

    #[test]
    fn wizard_keeps_html_when_going_back() {
        let mut wizard = WebWizard::new(4);
        assert!(!wizard.advance());
        assert!(wizard.form.error.is_some());

        wizard.form = wizard.form.clone().with_value(0, "Landing");
        assert!(wizard.advance());
        assert_eq!(wizard.draft.step(), WizardStep::Content);

        wizard.form.push_char('<');
        wizard.retreat();
        assert_eq!(wizard.draft.html, "<");
        assert_eq!(wizard.form.value(0), "Landing");
    }

    #[test]
    fn url_form_builds_capture() {
        let form = url_form()
            .with_value(fields::URL, "https://docs.rs")
            .with_value(fields::TAGS, "rust");
        let capture = url_capture_from(&form, 2);
        let (category_id, item) = capture.finish().expect("capture");
        assert_eq!(category_id, 2);
        assert_eq!(item.label, "https://docs.rs");
        assert_eq!(item.tags, vec!["rust"]);
    }
}
