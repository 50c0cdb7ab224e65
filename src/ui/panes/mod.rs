//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Script source with syntax highlighting and current line indicator
//! - [`bindings`]: Variables with their node, shallow size and deep size
//! - [`heap`]: Every heap node with type, intrinsic size and value preview
//! - [`report`]: Breakdown of the most recent `footprint`
//! - [`transcript`]: Script output
//! - [`status`]: Status bar with keybindings and execution state
//! - `common`: Shared block, scrolling and formatting helpers
//!
//! Each pane module exports a primary `render_*` function. Panes hold no
//! state of their own beyond the scroll offsets the app passes in.

mod common;

pub mod bindings;
pub mod heap;
pub mod report;
pub mod source;
pub mod status;
pub mod transcript;

// Re-export render functions for convenience
pub use bindings::render_bindings_pane;
pub use heap::{render_heap_pane, HeapRenderData, HeapScrollState};
pub use report::render_report_pane;
pub use source::{render_source_pane, SourceRenderData, SourceScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use transcript::render_transcript_pane;
