//! Status bar: step position, message, snapshot memory and key hints

use super::common::format_bytes;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const KEY_HINTS: [(&str, &str); 5] = [
    (" ←/→ ", "step"),
    (" ⎵ ", "play"),
    (" ↵/⌫ ", "end/start"),
    (" ⇥ ", "focus"),
    (" q ", "quit"),
];

pub struct StatusRenderData<'a> {
    pub message: &'a str,
    pub current_step: usize,
    pub total_steps: usize,
    /// Runtime error that ended execution, if any
    pub error: Option<&'a str>,
    pub is_playing: bool,
    /// Snapshot history usage and limit in bytes
    pub snapshot_memory: (usize, usize),
}

fn badge_style(color: Color) -> Style {
    Style::default()
        .bg(color)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

/// The badge shown at the far right, if the position deserves one
fn position_badge(data: &StatusRenderData, show_error: bool) -> Option<(&'static str, Color)> {
    if data.is_playing {
        return Some((" ▶ PLAYING ", DEFAULT_THEME.highlight));
    }
    if show_error {
        return Some((" ERROR ", DEFAULT_THEME.error));
    }
    if data.current_step + 1 >= data.total_steps {
        return Some((" END ", DEFAULT_THEME.error));
    }
    (data.current_step == 0).then_some((" START ", DEFAULT_THEME.charged))
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, data: StatusRenderData) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let bar = Style::default().bg(DEFAULT_THEME.line_bg);
    let sep = bar.fg(DEFAULT_THEME.muted);

    // An error only takes over the bar once the last snapshot is shown
    let show_error = data.error.is_some() && data.current_step + 1 >= data.total_steps;
    let (message, message_color) = match data.error {
        Some(error) if show_error => (error, DEFAULT_THEME.error),
        _ => (data.message, DEFAULT_THEME.fg),
    };
    let (used, limit) = data.snapshot_memory;

    let left = vec![
        Span::styled(
            format!(" Step {}/{} ", data.current_step + 1, data.total_steps),
            badge_style(if show_error {
                DEFAULT_THEME.error
            } else {
                DEFAULT_THEME.accent
            }),
        ),
        Span::styled(
            format!(" {} / {} ", format_bytes(used), format_bytes(limit)),
            bar.fg(DEFAULT_THEME.size),
        ),
        Span::styled("│", sep),
        Span::styled(format!(" {} ", message), bar.fg(message_color)),
    ];
    frame.render_widget(
        Paragraph::new(Line::from(left))
            .style(bar)
            .alignment(Alignment::Left),
        halves[0],
    );

    let key = Style::default().bg(DEFAULT_THEME.muted).fg(Color::Black);
    let mut right = Vec::new();
    for (i, (keys, action)) in KEY_HINTS.iter().enumerate() {
        if i > 0 {
            right.push(Span::styled("│", sep));
        }
        right.push(Span::styled(*keys, key));
        right.push(Span::styled(format!(" {} ", action), bar.fg(DEFAULT_THEME.fg)));
    }
    if let Some((text, color)) = position_badge(&data, show_error) {
        right.push(Span::styled("│", sep));
        right.push(Span::styled(text, badge_style(color)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(right))
            .style(bar)
            .alignment(Alignment::Right),
        halves[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(step: usize, total: usize, playing: bool) -> StatusRenderData<'static> {
        StatusRenderData {
            message: "",
            current_step: step,
            total_steps: total,
            error: None,
            is_playing: playing,
            snapshot_memory: (0, 0),
        }
    }

    #[test]
    fn test_position_badge() {
        assert_eq!(position_badge(&data(0, 5, false), false).map(|b| b.0), Some(" START "));
        assert_eq!(position_badge(&data(2, 5, false), false), None);
        assert_eq!(position_badge(&data(4, 5, false), false).map(|b| b.0), Some(" END "));
        assert_eq!(position_badge(&data(4, 5, false), true).map(|b| b.0), Some(" ERROR "));
        assert_eq!(position_badge(&data(0, 5, true), false).map(|b| b.0), Some(" ▶ PLAYING "));
    }
}
