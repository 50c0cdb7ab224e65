//! Source pane rendering with syntax highlighting
//!
//! This module renders the source pane, which displays the heap script being
//! executed with basic syntax highlighting and execution indicators.
//!
//! # Features
//!
//! - Highlighting for keywords, class names, strings, numbers and `#` comments
//! - Current line highlighting
//! - Error line highlighting when execution stopped on a runtime error
//! - Line numbering
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring the full lexer.

use super::common::{pane_block, visible_height};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Simple syntax highlighting for one script line
fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (byte_idx, c) = chars[i];

        // Comments run to the end of the line
        if c == '#' {
            if !current_word.is_empty() {
                spans.push(styled_word(&current_word, false));
                current_word.clear();
            }
            spans.push(Span::styled(
                line[byte_idx..].to_string(),
                Style::default().fg(DEFAULT_THEME.muted),
            ));
            break;
        }

        // Strings, including the `b` prefix of bytes literals
        if c == '"' {
            let start = if current_word == "b" {
                current_word.clear();
                byte_idx - 1
            } else {
                if !current_word.is_empty() {
                    spans.push(styled_word(&current_word, false));
                    current_word.clear();
                }
                byte_idx
            };
            let mut end = i + 1;
            while end < chars.len() && chars[end].1 != '"' {
                end += if chars[end].1 == '\\' { 2 } else { 1 };
            }
            let end_byte = chars.get(end + 1).map_or(line.len(), |(b, _)| *b);
            spans.push(Span::styled(
                line[start..end_byte].to_string(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end + 1;
            continue;
        }

        // Delimiters end the current word
        if !c.is_alphanumeric() && c != '_' {
            if !current_word.is_empty() {
                spans.push(styled_word(&current_word, c == '('));
                current_word.clear();
            }

            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.accent),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    if !current_word.is_empty() {
        spans.push(styled_word(&current_word, false));
    }

    Line::from(spans)
}

fn styled_word(word: &str, is_call: bool) -> Span<'static> {
    let style = match word {
        "class" | "slots" | "footprint" | "sizeof" | "dump" | "print" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "None" | "True" | "False" => Style::default().fg(DEFAULT_THEME.number),
        w if w.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ if is_call => Style::default().fg(DEFAULT_THEME.class_name),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    };
    Span::styled(word.to_string(), style)
}

/// Scroll state for the source pane
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is pinned to (None = center on first render)
    pub target_line_row: Option<usize>,
}

impl SourceScrollState {
    pub fn new() -> Self {
        SourceScrollState {
            offset: 0,
            target_line_row: None,
        }
    }
}

impl Default for SourceScrollState {
    fn default() -> Self {
        Self::new()
    }
}

/// Data needed to render the source pane
pub struct SourceRenderData<'a> {
    pub source_code: &'a str,
    pub current_line: usize,
    /// Line of the runtime error, shown only while at the end of history
    pub error_line: Option<usize>,
}

/// Render the source pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: SourceRenderData,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let block = pane_block(" Source ", is_focused);

    let lines: Vec<&str> = data.source_code.lines().collect();
    let total_lines = lines.len();
    let visible_height = visible_height(area);

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the current line at the target visual row
    if data.current_line > 0 && data.current_line <= total_lines {
        scroll_state.offset = (data.current_line - 1).saturating_sub(target_row);
        if total_lines > visible_height {
            scroll_state.offset = scroll_state.offset.min(total_lines - visible_height);
        } else {
            scroll_state.offset = 0;
        }
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_error = data.error_line == Some(line_num);
            let is_current = line_num == data.current_line;

            let num_style = if is_error {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default()
                    .fg(DEFAULT_THEME.highlight)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.muted)
            };

            let mut content_line = highlight_source_code(line);
            if is_error {
                // White on red overrides all highlighting
                let error_style = Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD);
                for span in &mut content_line.spans {
                    span.style = error_style;
                }
            } else if is_current {
                let current_style = Style::default().bg(DEFAULT_THEME.line_bg);
                for span in &mut content_line.spans {
                    span.style = span.style.patch(current_style);
                }
            }

            let mut spans = vec![Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(content_line.spans);
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_comment_and_bytes_literal() {
        let line = highlight_source_code("x = b\"ab\" # note");
        assert_eq!(texts(&line), vec!["x", " ", "=", " ", "b\"ab\"", " ", "# note"]);
        assert_eq!(line.spans[4].style.fg, Some(DEFAULT_THEME.string));
        assert_eq!(line.spans[6].style.fg, Some(DEFAULT_THEME.muted));
    }

    #[test]
    fn test_keywords_and_calls() {
        let line = highlight_source_code("footprint DataItem(1)");
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.keyword));
        assert_eq!(line.spans[2].style.fg, Some(DEFAULT_THEME.class_name));
        assert_eq!(line.spans[4].style.fg, Some(DEFAULT_THEME.number));
    }
}
