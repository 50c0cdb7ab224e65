//! Main TUI application state and logic

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

use super::panes::{
    render_bindings_pane, render_heap_pane, render_report_pane, render_source_pane,
    render_status_bar, render_transcript_pane, HeapRenderData, HeapScrollState,
    SourceRenderData, SourceScrollState, StatusRenderData,
};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Transcript,
    Bindings,
    Heap,
    Report,
}

impl FocusedPane {
    /// Move focus to the next pane (left column top to bottom, then right column)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Transcript,
            FocusedPane::Transcript => FocusedPane::Bindings,
            FocusedPane::Bindings => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Report,
            FocusedPane::Report => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Report,
            FocusedPane::Transcript => FocusedPane::Source,
            FocusedPane::Bindings => FocusedPane::Transcript,
            FocusedPane::Heap => FocusedPane::Bindings,
            FocusedPane::Report => FocusedPane::Heap,
        }
    }
}

/// The main application state
pub struct App {
    /// The interpreter instance (already run)
    pub interpreter: Interpreter,

    /// The source code being executed
    pub source_code: String,

    /// Error that stopped execution, shown at the end of history
    pub error: Option<RuntimeError>,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll state
    pub source_scroll: SourceScrollState,
    pub bindings_scroll: usize,
    pub heap_scroll: HeapScrollState,
    pub report_scroll: usize,
    pub transcript_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    /// Create a new app with the given interpreter and source code
    pub fn new(interpreter: Interpreter, source_code: String, error: Option<RuntimeError>) -> Self {
        let long_ago = Instant::now()
            .checked_sub(Duration::from_secs(1))
            .unwrap_or_else(Instant::now);
        App {
            interpreter,
            source_code,
            error,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::new(),
            bindings_scroll: 0,
            heap_scroll: HeapScrollState::new(),
            report_scroll: 0,
            transcript_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready!"),
            is_playing: false,
            last_play_time: long_ago,
            last_space_press: long_ago,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_secs(1) {
                if self.interpreter.step_forward().is_ok() {
                    self.status_message = "Playing...".to_string();
                    self.transcript_scroll = usize::MAX;
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so auto-play keeps running
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.interpreter.history_position() + 1 >= self.interpreter.total_snapshots()
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Output (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[0]);

        // Right column: Bindings | Heap | Size Report
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(35),
                Constraint::Percentage(35),
            ])
            .split(columns[1]);

        let at_end = self.is_at_end();
        let error_line = self
            .error
            .as_ref()
            .filter(|_| at_end)
            .and_then(|e| e.location())
            .map(|loc| loc.line);
        let current_line = self.interpreter.current_location().line;

        render_source_pane(
            frame,
            left_rows[0],
            SourceRenderData {
                source_code: &self.source_code,
                current_line,
                error_line,
            },
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        render_transcript_pane(
            frame,
            left_rows[1],
            self.interpreter.transcript(),
            current_line,
            self.focused_pane == FocusedPane::Transcript,
            &mut self.transcript_scroll,
        );

        render_bindings_pane(
            frame,
            right_rows[0],
            self.interpreter.bindings(),
            self.interpreter.heap(),
            self.focused_pane == FocusedPane::Bindings,
            &mut self.bindings_scroll,
        );

        render_heap_pane(
            frame,
            right_rows[1],
            HeapRenderData {
                heap: self.interpreter.heap(),
                measurement: self.interpreter.last_report(),
            },
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        render_report_pane(
            frame,
            right_rows[2],
            self.interpreter.last_report(),
            self.focused_pane == FocusedPane::Report,
            &mut self.report_scroll,
        );

        let error_text = self.error.as_ref().map(|e| e.to_string());
        render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                current_step: self.interpreter.history_position(),
                total_steps: self.interpreter.total_snapshots(),
                error: error_text.as_deref(),
                is_playing: self.is_playing,
                snapshot_memory: self.interpreter.snapshot_memory(),
            },
        );
    }

    /// Handle keyboard events
    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1) as usize;
                let stepped = (0..n)
                    .take_while(|_| self.interpreter.step_forward().is_ok())
                    .count();
                self.status_message = format!("Stepped forward {} step(s)", stepped);
                self.transcript_scroll = usize::MAX;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.step_backward();
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.step_forward();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Transcript => {
                    self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
                }
                FocusedPane::Bindings => {
                    self.bindings_scroll = self.bindings_scroll.saturating_sub(1);
                }
                FocusedPane::Heap => {
                    self.heap_scroll.offset = self.heap_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Report => {
                    self.report_scroll = self.report_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Transcript => {
                    self.transcript_scroll = self.transcript_scroll.saturating_add(1);
                }
                FocusedPane::Bindings => {
                    self.bindings_scroll = self.bindings_scroll.saturating_add(1);
                }
                FocusedPane::Heap => {
                    self.heap_scroll.offset = self.heap_scroll.offset.saturating_add(1);
                }
                FocusedPane::Report => {
                    self.report_scroll = self.report_scroll.saturating_add(1);
                }
            },
            KeyCode::Char(' ') => {
                // Toggle auto-play (200ms debounce against key repeat)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(Duration::from_secs(1))
                            .unwrap_or_else(Instant::now);
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.status_message = match self.interpreter.jump_to_end() {
                    Ok(()) => "Jumped to end".to_string(),
                    Err(e) => e.to_string(),
                };
                self.transcript_scroll = usize::MAX;
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.status_message = match self.interpreter.rewind_to_start() {
                    Ok(()) => "Jumped to start".to_string(),
                    Err(e) => e.to_string(),
                };
                self.transcript_scroll = usize::MAX;
            }
            _ => {}
        }
    }

    /// Step forward in execution
    fn step_forward(&mut self) {
        match self.interpreter.step_forward() {
            Ok(()) => {
                self.status_message = "Stepped forward".to_string();
                self.transcript_scroll = usize::MAX;
            }
            Err(RuntimeError::HistoryOperationFailed { message, .. }) => {
                self.status_message = format!("Cannot step forward: {}", message);
            }
            Err(e) => {
                self.status_message = format!("Error: {}", e);
            }
        }
    }

    /// Step backward in execution
    fn step_backward(&mut self) {
        match self.interpreter.step_backward() {
            Ok(()) => {
                self.status_message = "Stepped backward".to_string();
                self.transcript_scroll = usize::MAX;
            }
            Err(RuntimeError::HistoryOperationFailed { message, .. }) => {
                self.status_message = format!("Cannot step backward: {}", message);
            }
            Err(e) => {
                self.status_message = format!("Error: {}", e);
            }
        }
    }
}
