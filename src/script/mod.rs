//! Heap script parser
//!
//! This module transforms heap script text into an AST:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parser`]: Parsing (tokens → AST)
//! - [`ast`]: AST node definitions
//!
//! # Language
//!
//! A script is a sequence of statements, one per line (or separated by `;`):
//!
//! ```text
//! class DataItem(name, age, address)       # instances carry an attribute table
//! slots class Packed(name, age, address)   # instances carry fixed slots
//! d1 = DataItem("Alex", 42, "-")
//! d1.weight = 66
//! xs = [d1, (1, 2.5), {"k": b"raw"}, {1, 2}, None]
//! xs.append(xs)
//! sizeof d1
//! footprint d1, xs
//! dump d1
//! print xs
//! ```
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser. There are no operators, so there is
//! no precedence to climb: an expression is a primary followed by attribute,
//! method call and index suffixes.

pub mod ast;
pub mod lexer;
pub mod parser;
