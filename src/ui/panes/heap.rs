//! Heap pane rendering
//!
//! Lists every node on the heap in address order with its type, intrinsic
//! size and a short value preview. Nodes charged by the most recent
//! `footprint` measurement are marked.
//!
//! A node's intrinsic size may differ from the size it was allocated with
//! when a container grew after allocation; the current size is shown.

use super::common::{format_bytes, pane_block, visible_height, window};
use crate::interpreter::measure::Measurement;
use crate::memory::{display, heap::Heap, intrinsic_size};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};
use rustc_hash::FxHashSet;

/// Scroll state for the heap pane
pub struct HeapScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

impl HeapScrollState {
    pub fn new() -> Self {
        HeapScrollState {
            offset: 0,
            prev_item_count: 0,
        }
    }
}

impl Default for HeapScrollState {
    fn default() -> Self {
        Self::new()
    }
}

/// Data needed to render the heap pane
pub struct HeapRenderData<'a> {
    pub heap: &'a Heap,
    pub measurement: Option<&'a Measurement>,
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    data: HeapRenderData,
    is_focused: bool,
    scroll_state: &mut HeapScrollState,
) {
    let title = format!(
        " Heap ({} nodes, {} of {}) ",
        data.heap.len(),
        format_bytes(data.heap.total_allocated()),
        format_bytes(data.heap.max_size())
    );
    let block = pane_block(&title, is_focused);

    let charged: FxHashSet<u64> = data
        .measurement
        .map(|m| {
            m.roots
                .iter()
                .flat_map(|r| r.report.charges.iter().map(|c| c.id))
                .collect()
        })
        .unwrap_or_default();

    let nodes = data.heap.nodes();
    let items: Vec<ListItem> = if nodes.is_empty() {
        vec![ListItem::new("(no allocations)").style(Style::default().fg(DEFAULT_THEME.muted))]
    } else {
        nodes
            .iter()
            .map(|(addr, node)| {
                let is_charged = charged.contains(addr);
                let marker = if is_charged { "● " } else { "  " };
                let addr_style = if is_charged {
                    Style::default()
                        .fg(DEFAULT_THEME.charged)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(DEFAULT_THEME.muted)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(DEFAULT_THEME.charged)),
                    Span::styled(format!("0x{:08x}", addr), addr_style),
                    Span::raw(" | "),
                    Span::styled(
                        format!("{:<8}", node.value.type_name()),
                        Style::default().fg(DEFAULT_THEME.type_name),
                    ),
                    Span::raw(" | "),
                    Span::styled(
                        format!("{:>6}", format_bytes(intrinsic_size(&node.value))),
                        Style::default().fg(DEFAULT_THEME.size),
                    ),
                    Span::raw(" | "),
                    Span::styled(
                        display::short_repr(data.heap, *addr, 40),
                        Style::default().fg(DEFAULT_THEME.fg),
                    ),
                ]))
            })
            .collect()
    };

    // New allocations scroll into view
    let total_items = items.len();
    if total_items > scroll_state.prev_item_count {
        scroll_state.offset = usize::MAX;
    }
    scroll_state.prev_item_count = total_items;

    let visible = window(items, &mut scroll_state.offset, visible_height(area));
    frame.render_widget(List::new(visible).block(block), area);
}
