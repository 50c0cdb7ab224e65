//! # Introduction
//!
//! footprint measures how much memory an object graph occupies. Every node is
//! charged exactly once, no matter how many references lead to it, and
//! reference cycles terminate.
//!
//! Graphs are built with a small heap script: classes with an attribute table
//! or with fixed slots, lists, tuples, sets, dicts, strings, bytes and
//! scalars. The interpreter captures a snapshot after each statement, and the
//! snapshot history is navigated forward and backward through a terminal UI
//! built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter → Snapshots → TUI
//!                                      ↓
//!                               size accumulator
//! ```
//!
//! 1. [`script`]: tokenises the source and builds an AST.
//! 2. [`interpreter`]: executes statements against the heap and captures
//!    [`snapshot::Snapshot`]s at each step.
//! 3. [`memory`]: the node model ([`memory::value::Value`]), its intrinsic
//!    sizes, and the address-keyed [`memory::heap::Heap`].
//! 4. [`sizing`]: the cycle-safe deep-size accumulator, generic over any
//!    [`sizing::ObjectGraph`].
//! 5. [`snapshot`]: snapshot history with a configurable memory limit and the
//!    [`snapshot::Transcript`] that records script output.
//! 6. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use footprint::memory::{heap::Heap, value::Value};
//! use footprint::sizing::compute_size;
//!
//! let mut heap = Heap::default();
//! let list = heap.allocate(Value::List(Vec::new())).unwrap();
//! heap.update(list, |value| {
//!     if let Value::List(items) = value {
//!         items.push(list); // the list contains itself
//!     }
//! })
//! .unwrap();
//! assert_eq!(compute_size(&heap, list, None), 64);
//! ```

pub mod interpreter;
pub mod memory;
pub mod script;
pub mod sizing;
pub mod snapshot;
pub mod ui;
