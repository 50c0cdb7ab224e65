//! Runtime error types for the heap script interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! while executing a script (as opposed to parse errors or I/O errors).
//!
//! All runtime errors are fatal - they halt execution. History recorded up to
//! the failing statement is kept and can still be navigated.

use crate::memory::heap::HeapError;
use crate::script::ast::SourceLocation;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Undefined variable reference
    #[error("Undefined variable '{name}' at line {}", .location.line)]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    /// Construction of a class that was never defined
    #[error("Unknown class '{name}' at line {}", .location.line)]
    UnknownClass {
        name: String,
        location: SourceLocation,
    },

    #[error("Class '{name}' is already defined (line {})", .location.line)]
    DuplicateClass {
        name: String,
        location: SourceLocation,
    },

    /// Constructor or method argument count mismatch
    #[error(
        "{callee}() takes {expected} argument(s) but {got} were given at line {}",
        .location.line
    )]
    ArgumentCountMismatch {
        callee: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    #[error("'{type_name}' object has no attribute '{attribute}' at line {}", .location.line)]
    UnknownAttribute {
        type_name: String,
        attribute: String,
        location: SourceLocation,
    },

    /// Assigning a field a slotted class did not declare
    #[error(
        "Cannot add attribute '{attribute}' to '{class}': instance uses slots (line {})",
        .location.line
    )]
    SlotsCannotGrow {
        class: String,
        attribute: String,
        location: SourceLocation,
    },

    #[error("Type error at line {}: {message}", .location.line)]
    TypeError {
        message: String,
        location: SourceLocation,
    },

    #[error("Index {index} out of range for length {len} at line {}", .location.line)]
    IndexOutOfRange {
        index: i64,
        len: usize,
        location: SourceLocation,
    },

    #[error("Key {key} not found at line {}", .location.line)]
    MissingKey {
        key: String,
        location: SourceLocation,
    },

    /// Mutable container used as a dict key or set element
    #[error("Unhashable type '{type_name}' at line {}", .location.line)]
    Unhashable {
        type_name: String,
        location: SourceLocation,
    },

    #[error("'{type_name}' object has no method '{method}' at line {}", .location.line)]
    UnknownMethod {
        type_name: String,
        method: String,
        location: SourceLocation,
    },

    /// Heap exhaustion or a dangling address
    #[error("{source} (line {})", .location.line)]
    Heap {
        source: HeapError,
        location: SourceLocation,
    },

    /// Snapshot history limit exceeded
    #[error("Snapshot memory limit exceeded: {current} bytes used, limit is {limit}")]
    SnapshotLimitExceeded { current: usize, limit: usize },

    /// History/snapshot navigation failed
    #[error("{message}")]
    HistoryOperationFailed {
        message: String,
        location: SourceLocation,
    },
}

impl RuntimeError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            RuntimeError::UndefinedVariable { location, .. }
            | RuntimeError::UnknownClass { location, .. }
            | RuntimeError::DuplicateClass { location, .. }
            | RuntimeError::ArgumentCountMismatch { location, .. }
            | RuntimeError::UnknownAttribute { location, .. }
            | RuntimeError::SlotsCannotGrow { location, .. }
            | RuntimeError::TypeError { location, .. }
            | RuntimeError::IndexOutOfRange { location, .. }
            | RuntimeError::MissingKey { location, .. }
            | RuntimeError::Unhashable { location, .. }
            | RuntimeError::UnknownMethod { location, .. }
            | RuntimeError::Heap { location, .. }
            | RuntimeError::HistoryOperationFailed { location, .. } => Some(location),
            RuntimeError::SnapshotLimitExceeded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_line() {
        let err = RuntimeError::SlotsCannotGrow {
            class: "Packed".to_string(),
            attribute: "weight".to_string(),
            location: SourceLocation::new(7, 1),
        };
        assert_eq!(
            err.to_string(),
            "Cannot add attribute 'weight' to 'Packed': instance uses slots (line 7)"
        );
        assert_eq!(err.location(), Some(&SourceLocation::new(7, 1)));
    }

    #[test]
    fn test_heap_error_is_source() {
        use std::error::Error as _;

        let err = RuntimeError::Heap {
            source: HeapError::InvalidAddress(0x10),
            location: SourceLocation::new(2, 3),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().ends_with("(line 2)"));

        let limit = RuntimeError::SnapshotLimitExceeded {
            current: 10,
            limit: 5,
        };
        assert_eq!(limit.location(), None);
    }
}
