//! Bindings pane: every script variable with its node and sizes

use super::common::{format_bytes, pane_block, visible_height, window};
use crate::memory::{bindings::Bindings, display, heap::Heap};
use crate::sizing::{compute_size, shallow_size};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// One row of the bindings pane
#[derive(Debug, Clone, PartialEq)]
pub struct BindingRow {
    pub name: String,
    pub address: u64,
    pub type_name: String,
    pub shallow: usize,
    pub deep: usize,
}

/// Rows in declaration order; deep sizes are computed independently per name
pub fn binding_rows(bindings: &Bindings, heap: &Heap) -> Vec<BindingRow> {
    bindings
        .iter()
        .map(|(name, addr)| BindingRow {
            name: name.to_string(),
            address: addr,
            type_name: heap
                .get(addr)
                .map(|v| v.type_name().to_string())
                .unwrap_or_else(|_| "<invalid>".to_string()),
            shallow: shallow_size(heap, addr),
            deep: compute_size(heap, addr, None),
        })
        .collect()
}

/// Render the bindings pane
pub fn render_bindings_pane(
    frame: &mut Frame,
    area: Rect,
    bindings: &Bindings,
    heap: &Heap,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Bindings ", is_focused);

    let rows = binding_rows(bindings, heap);
    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new("(no variables)").style(Style::default().fg(DEFAULT_THEME.muted))]
    } else {
        let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
        rows.into_iter()
            .map(|row| {
                let preview = display::short_repr(heap, row.address, 24);
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:width$} ", row.name, width = name_width),
                        Style::default().fg(DEFAULT_THEME.fg),
                    ),
                    Span::styled(
                        format!("0x{:08x} ", row.address),
                        Style::default().fg(DEFAULT_THEME.muted),
                    ),
                    Span::styled(
                        format!("{} ", row.type_name),
                        Style::default().fg(DEFAULT_THEME.type_name),
                    ),
                    Span::styled(
                        format!(
                            "{} / {} ",
                            format_bytes(row.shallow),
                            format_bytes(row.deep)
                        ),
                        Style::default().fg(DEFAULT_THEME.size),
                    ),
                    Span::styled(preview, Style::default().fg(DEFAULT_THEME.muted)),
                ]))
            })
            .collect()
    };

    let visible = window(items, scroll_offset, visible_height(area));
    frame.render_widget(List::new(visible).block(block), area);
}
