// Execution engine for heap scripts

use crate::interpreter::constants::DEFAULT_HEAP_LIMIT;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::measure::Measurement;
use crate::memory::{bindings::Bindings, heap::Heap, value::Address};
use crate::script::ast::*;
use crate::snapshot::{Snapshot, SnapshotManager, Transcript};
use rustc_hash::FxHashMap;

/// A class declared by the script
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub fields: Vec<String>,
    /// Instances store fields inline instead of in an attribute table
    pub slots: bool,
    pub location: SourceLocation,
}

/// The main interpreter that executes a heap script
pub struct Interpreter {
    /// Parsed program
    program: Program,

    /// Heap memory
    pub(crate) heap: Heap,

    /// Variable name -> node address
    pub(crate) bindings: Bindings,

    /// Output of print/dump/sizeof/footprint
    pub(crate) transcript: Transcript,

    /// Class definitions (name -> ClassDef)
    pub(crate) classes: FxHashMap<String, ClassDef>,

    /// One `Str` node per attribute name
    pub(crate) interned: FxHashMap<String, Address>,

    /// Addresses of the `None`, `False` and `True` singletons once allocated
    pub(crate) none_addr: Option<Address>,
    pub(crate) bool_addrs: [Option<Address>; 2],

    /// Every measurement taken so far, in execution order
    reports: Vec<Measurement>,

    /// Most recent measurement as of the current history position
    pub(crate) last_measurement: Option<Measurement>,

    /// Current source location being executed
    current_location: SourceLocation,

    /// Snapshot manager for reverse execution
    snapshot_manager: SnapshotManager,

    /// Index of the snapshot currently shown
    history_position: usize,

    /// Statements executed so far
    executed: usize,

}

impl Interpreter {
    /// Create a new interpreter with the parsed program
    pub fn new(program: Program, snapshot_memory_limit: usize) -> Self {
        Self::with_heap_limit(program, snapshot_memory_limit, DEFAULT_HEAP_LIMIT)
    }

    /// Create an interpreter whose heap refuses allocations beyond `heap_limit` bytes
    pub fn with_heap_limit(program: Program, snapshot_memory_limit: usize, heap_limit: usize) -> Self {
        let current_location = program
            .statements
            .first()
            .map(|s| s.location())
            .unwrap_or(SourceLocation::new(1, 1));

        Interpreter {
            program,
            heap: Heap::new(heap_limit),
            bindings: Bindings::new(),
            transcript: Transcript::new(),
            classes: FxHashMap::default(),
            interned: FxHashMap::default(),
            none_addr: None,
            bool_addrs: [None, None],
            reports: Vec::new(),
            last_measurement: None,
            current_location,
            snapshot_manager: SnapshotManager::new(snapshot_memory_limit),
            history_position: 0,
            executed: 0,
        }
    }

    /// Run the script from start to finish
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        // Initial snapshot: nothing executed yet
        self.take_snapshot()?;

        let statements = self.program.statements.clone();
        for stmt in &statements {
            self.current_location = stmt.location();
            log::debug!(
                "executing statement at line {}, column {}",
                self.current_location.line,
                self.current_location.column
            );
            self.execute_statement(stmt)?;
            self.executed += 1;
            self.take_snapshot()?;
        }

        Ok(())
    }

    /// Record a measurement as both the latest and part of the full history
    pub(crate) fn record_measurement(&mut self, measurement: Measurement) {
        self.reports.push(measurement.clone());
        self.last_measurement = Some(measurement);
    }

    /// Take a snapshot of the current execution state
    fn take_snapshot(&mut self) -> Result<(), RuntimeError> {
        let snapshot = Snapshot {
            heap: self.heap.clone(),
            bindings: self.bindings.clone(),
            transcript: self.transcript.clone(),
            statement_index: self.executed,
            source_location: self.current_location,
            last_measurement: self.last_measurement.clone(),
        };

        self.snapshot_manager.push(snapshot).map_err(|message| {
            log::warn!("{}", message);
            RuntimeError::SnapshotLimitExceeded {
                current: self.snapshot_manager.memory_usage(),
                limit: self.snapshot_manager.memory_limit(),
            }
        })?;

        self.history_position = self.snapshot_manager.len() - 1;
        Ok(())
    }

    /// Restore execution state from a snapshot
    fn restore_snapshot(&mut self, index: usize) -> Result<(), RuntimeError> {
        let Some(snapshot) = self.snapshot_manager.get(index) else {
            return Err(RuntimeError::HistoryOperationFailed {
                message: format!("Snapshot {} not found in history", index),
                location: self.current_location,
            });
        };

        self.heap = snapshot.heap.clone();
        self.bindings = snapshot.bindings.clone();
        self.transcript = snapshot.transcript.clone();
        self.current_location = snapshot.source_location;
        self.last_measurement = snapshot.last_measurement.clone();
        self.history_position = index;
        Ok(())
    }

    /// Step backward in execution (restore previous snapshot)
    pub fn step_backward(&mut self) -> Result<(), RuntimeError> {
        if self.history_position == 0 {
            return Err(RuntimeError::HistoryOperationFailed {
                message: "Already at the beginning of execution".to_string(),
                location: self.current_location,
            });
        }
        self.restore_snapshot(self.history_position - 1)
    }

    /// Step forward in execution (restore next snapshot)
    pub fn step_forward(&mut self) -> Result<(), RuntimeError> {
        if self.history_position + 1 >= self.snapshot_manager.len() {
            return Err(RuntimeError::HistoryOperationFailed {
                message: "Already at the end of execution".to_string(),
                location: self.current_location,
            });
        }
        self.restore_snapshot(self.history_position + 1)
    }

    /// Rewind to the beginning of execution history
    pub fn rewind_to_start(&mut self) -> Result<(), RuntimeError> {
        if self.snapshot_manager.is_empty() {
            return Err(RuntimeError::HistoryOperationFailed {
                message: "No snapshots available".to_string(),
                location: self.current_location,
            });
        }
        self.restore_snapshot(0)
    }

    /// Jump to the last recorded snapshot
    pub fn jump_to_end(&mut self) -> Result<(), RuntimeError> {
        match self.snapshot_manager.len() {
            0 => Err(RuntimeError::HistoryOperationFailed {
                message: "No snapshots available".to_string(),
                location: self.current_location,
            }),
            len => self.restore_snapshot(len - 1),
        }
    }

    // ========== Getter methods for UI ==========

    /// Get the parsed program
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Get the current source location
    pub fn current_location(&self) -> SourceLocation {
        self.current_location
    }

    /// Get a reference to the heap
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Get the variable bindings
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Get the script output
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Latest `footprint` result as of the current history position
    pub fn last_report(&self) -> Option<&Measurement> {
        self.last_measurement.as_ref()
    }

    /// Every `footprint` result recorded during the run
    pub fn reports(&self) -> &[Measurement] {
        &self.reports
    }

    /// Get the current history position
    pub fn history_position(&self) -> usize {
        self.history_position
    }

    /// Get the total number of snapshots
    pub fn total_snapshots(&self) -> usize {
        self.snapshot_manager.len()
    }

    /// Bytes of snapshot history in use and the configured limit
    pub fn snapshot_memory(&self) -> (usize, usize) {
        (
            self.snapshot_manager.memory_usage(),
            self.snapshot_manager.memory_limit(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::Parser;

    fn interpreter(source: &str) -> Interpreter {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        Interpreter::new(program, 64 * 1024 * 1024)
    }

    #[test]
    fn test_history_navigation() {
        let mut interp = interpreter("a = [1]\nb = a\nprint b\n");
        interp.run().unwrap();
        assert_eq!(interp.current_location().line, 3);
        assert_eq!(interp.total_snapshots(), 4);
        assert_eq!(interp.history_position(), 3);
        assert_eq!(interp.transcript().get_output(), vec!["[1]"]);

        interp.step_backward().unwrap();
        assert_eq!(interp.history_position(), 2);
        assert_eq!(interp.current_location().line, 2);
        assert!(interp.transcript().lines.is_empty());
        assert_eq!(interp.bindings().len(), 2);

        interp.rewind_to_start().unwrap();
        assert!(interp.bindings().is_empty());
        assert!(interp.heap().is_empty());
        assert!(interp.step_backward().is_err());

        interp.step_forward().unwrap();
        assert_eq!(interp.bindings().len(), 1);

        interp.jump_to_end().unwrap();
        assert!(interp.step_forward().is_err());
        assert_eq!(interp.transcript().get_output(), vec!["[1]"]);
    }

    #[test]
    fn test_error_keeps_partial_history() {
        let mut interp = interpreter("a = 1\nprint missing\nb = 2\n");
        let err = interp.run().unwrap_err();
        assert_eq!(err.location().map(|l| l.line), Some(2));
        assert_eq!(interp.total_snapshots(), 2);
        assert!(interp.bindings().get("a").is_some());
        assert!(interp.bindings().get("b").is_none());
    }

    #[test]
    fn test_snapshot_limit() {
        let program = Parser::new("a = \"x\"\n").unwrap().parse_program().unwrap();
        let mut interp = Interpreter::new(program, 60);
        // The empty initial state fits, the state holding the string does not
        assert!(matches!(
            interp.run(),
            Err(RuntimeError::SnapshotLimitExceeded { limit: 60, .. })
        ));
        assert_eq!(interp.total_snapshots(), 1);
    }

    #[test]
    fn test_measurement_follows_history() {
        let mut interp = interpreter("a = [1]\nfootprint a\na.append(2)\nfootprint a\n");
        interp.run().unwrap();
        assert_eq!(interp.reports().len(), 2);
        assert_eq!(interp.last_report().map(|m| m.total()), Some(72 + 56));

        interp.rewind_to_start().unwrap();
        assert!(interp.last_report().is_none());
        interp.step_forward().unwrap();
        interp.step_forward().unwrap();
        assert_eq!(interp.last_report().map(|m| m.total()), Some(64 + 28));
        assert_eq!(interp.last_report().map(|m| m.location.line), Some(2));
    }
}
