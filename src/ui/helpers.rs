use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::controller::ExecutionProgress;

/// Move a cursor by `offset` inside `len` rows, clamping at both ends.
pub(crate) fn clamp_selection(current: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current
        .saturating_add_signed(offset)
        .min(len - 1)
}

/// Text bar such as `[#####-----] 2/4` for a running replay.
pub(crate) fn progress_bar(progress: &ExecutionProgress, width: usize) -> String {
    let filled = if progress.total == 0 {
        0
    } else {
        progress.completed * width / progress.total
    };
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled)),
        progress.completed,
        progress.total
    )
}

/// Key hint row for the footer: `[key] action` pairs.
pub(crate) fn key_hints(pairs: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (key, action) in pairs {
        spans.push(Span::styled(format!("[{key}]"), key_style));
        spans.push(Span::raw(format!(" {action}   ")));
    }
    Line::from(spans)
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_clamps_to_bounds() {
        assert_eq!(clamp_selection(0, -1, 3), 0);
        assert_eq!(clamp_selection(1, 5, 3), 2);
        assert_eq!(clamp_selection(4, 0, 3), 2);
        assert_eq!(clamp_selection(2, 1, 0), 0);
    }

    #[test]
    fn progress_bar_scales_to_width() {
        let progress = ExecutionProgress {
            list_id: 1,
            list_name: "Deploy".into(),
            completed: 1,
            total: 4,
        };
        assert_eq!(progress_bar(&progress, 8), "[##------] 1/4");
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to save item");
        assert_eq!(surface_error(&err), "disk full");
    }
}
