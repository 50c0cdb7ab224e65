//! Heap script execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: Interpreter state, history navigation and accessors
//! - [`statements`]: Statement execution (classes, assignments, measurements)
//! - [`expressions`]: Expression evaluation, attribute/index access and methods
//! - [`measure`]: Results of `footprint` statements
//! - [`errors`]: Runtime error types
//! - [`constants`]: Address layout and default limits
//!
//! # Execution Model
//!
//! The interpreter executes statements one at a time, in order. A snapshot is
//! taken before the first statement and after each one, so the UI can move
//! back and forth through the run without executing anything again.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod expressions;
pub mod measure;
pub mod statements;
