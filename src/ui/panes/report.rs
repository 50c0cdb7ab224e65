//! Size report pane: breakdown of the most recent `footprint`

use super::common::{pane_block, visible_height, window};
use crate::interpreter::measure::Measurement;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{List, ListItem},
    Frame,
};

/// Render the size report pane
pub fn render_report_pane(
    frame: &mut Frame,
    area: Rect,
    measurement: Option<&Measurement>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let Some(measurement) = measurement else {
        let block = pane_block(" Size Report ", is_focused);
        let items =
            vec![ListItem::new("(no footprint yet)").style(Style::default().fg(DEFAULT_THEME.muted))];
        frame.render_widget(List::new(items).block(block), area);
        return;
    };

    let title = format!(
        " Size Report (line {}, {} B) ",
        measurement.location.line,
        measurement.total()
    );
    let block = pane_block(&title, is_focused);

    let items: Vec<ListItem> = measurement
        .render_lines()
        .into_iter()
        .map(|line| {
            let style = if line.ends_with(':') {
                Style::default()
                    .fg(DEFAULT_THEME.accent)
                    .add_modifier(Modifier::BOLD)
            } else if line.trim_start().starts_with("total ") {
                Style::default().fg(DEFAULT_THEME.size)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let visible = window(items, scroll_offset, visible_height(area));
    frame.render_widget(List::new(visible).block(block), area);
}
