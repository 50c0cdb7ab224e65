//! Transcript pane rendering

use super::common::{pane_block, visible_height, window};
use crate::snapshot::Transcript;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{List, ListItem, Padding, Paragraph},
    Frame,
};

/// Render the transcript pane. Output of the statement at `current_line` is
/// highlighted.
pub fn render_transcript_pane(
    frame: &mut Frame,
    area: Rect,
    transcript: &Transcript,
    current_line: usize,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Output ", is_focused);

    if transcript.lines.is_empty() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.muted));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
    let items: Vec<ListItem> = transcript
        .lines
        .iter()
        .map(|line| {
            let style = if line.location.line == current_line {
                Style::default()
                    .fg(DEFAULT_THEME.highlight)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            ListItem::new(line.text.as_str()).style(style)
        })
        .collect();

    let visible = window(items, scroll_offset, visible_height(area));
    frame.render_widget(List::new(visible).block(block), area);
}
