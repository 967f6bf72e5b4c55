//! Form logic for capturing new standalone items: a browser URL, or a static
//! web page built in two steps (details, then HTML).

use crate::error::CaptureError;
use crate::models::{ItemType, NewItem};

/// Split a comma-separated tag field, dropping blanks and duplicates.
pub fn parse_tag_list(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn optional_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A URL about to be saved as an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlCapture {
    pub category_id: Option<i64>,
    pub url: String,
    pub label: String,
    pub description: String,
    pub tags: String,
}

impl UrlCapture {
    /// Pre-fill the label with the page title, falling back to the URL.
    pub fn new(url: &str, page_title: &str) -> Self {
        let title = page_title.trim();
        Self {
            url: url.trim().to_string(),
            label: if title.is_empty() { url.trim() } else { title }.to_string(),
            ..Self::default()
        }
    }

    /// Check the fields and return the category plus the item to insert.
    pub fn finish(&self) -> Result<(i64, NewItem), CaptureError> {
        let category_id = self.category_id.ok_or(CaptureError::MissingCategory)?;
        let label = self.label.trim();
        if label.is_empty() {
            return Err(CaptureError::MissingLabel);
        }
        let url = self.url.trim();
        if url.is_empty() {
            return Err(CaptureError::MissingUrl);
        }

        Ok((
            category_id,
            NewItem {
                label: label.to_string(),
                content: url.to_string(),
                item_type: ItemType::Url,
                description: optional_text(&self.description),
                tags: parse_tag_list(&self.tags),
                ..NewItem::default()
            },
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WizardStep {
    #[default]
    Details,
    Content,
}

/// Two-step draft for a `WEB_STATIC` item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebStaticDraft {
    step: WizardStep,
    pub category_id: Option<i64>,
    pub label: String,
    pub description: String,
    pub tags: String,
    pub html: String,
}

impl WebStaticDraft {
    pub fn new(category_id: Option<i64>) -> Self {
        Self {
            category_id,
            ..Self::default()
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Leave the details step. A label is required.
    pub fn go_next(&mut self) -> Result<(), CaptureError> {
        if self.step != WizardStep::Details {
            return Err(CaptureError::WrongStep);
        }
        if self.label.trim().is_empty() {
            return Err(CaptureError::MissingLabel);
        }
        self.step = WizardStep::Content;
        Ok(())
    }

    /// Return to the details step; the HTML typed so far is kept.
    pub fn go_back(&mut self) {
        self.step = WizardStep::Details;
    }

    pub fn finish(&self) -> Result<(i64, NewItem), CaptureError> {
        if self.step != WizardStep::Content {
            return Err(CaptureError::WrongStep);
        }
        let category_id = self.category_id.ok_or(CaptureError::MissingCategory)?;
        let label = self.label.trim();
        if label.is_empty() {
            return Err(CaptureError::MissingLabel);
        }
        if self.html.trim().is_empty() {
            return Err(CaptureError::MissingHtml);
        }

        Ok((
            category_id,
            NewItem {
                label: label.to_string(),
                content: self.html.clone(),
                item_type: ItemType::WebStatic,
                description: optional_text(&self.description),
                tags: parse_tag_list(&self.tags),
                ..NewItem::default()
            },
        ))
    }
}
