//! Clipboard seam used by the list controller.

use anyhow::{anyhow, Context, Result};
use tracing::debug;

/// Anything that can receive text destined for the OS clipboard.
pub trait Clipboard {
    fn copy_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard backed by `arboard`. The handle is opened lazily on the
/// first copy and reopened after a failure, since some platforms drop the
/// connection when the owning window goes away.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().context("failed to open system clipboard")?);
        }
        let clipboard = self
            .inner
            .as_mut()
            .ok_or_else(|| anyhow!("system clipboard unavailable"))?;

        if let Err(err) = clipboard.set_text(text) {
            self.inner = None;
            return Err(anyhow!(err).context("failed to set clipboard text"));
        }
        debug!(chars = text.chars().count(), "copied text to clipboard");
        Ok(())
    }
}

/// In-memory clipboard that remembers every payload. Used by tests and by
/// headless runs where no display server is present.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    history: Vec<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn last(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }
}

impl Clipboard for MemoryClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        self.history.push(text.to_string());
        Ok(())
    }
}
