// Snapshot management for stepping through a script

use crate::interpreter::measure::Measurement;
use crate::memory::{bindings::Bindings, heap::Heap};
use crate::script::ast::SourceLocation;

/// Captured script output (`print`, `dump`, `sizeof`, `footprint`)
#[derive(Debug, Clone)]
pub struct Transcript {
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript { lines: Vec::new() }
    }

    /// Append one line of output produced by the statement at `location`
    pub fn print(&mut self, text: String, location: SourceLocation) {
        self.lines.push(TranscriptLine { text, location });
    }

    /// Get all lines as a vector of strings
    pub fn get_output(&self) -> Vec<String> {
        self.lines.iter().map(|tl| tl.text.clone()).collect()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// A line of output with source location tracking
#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub text: String,
    pub location: SourceLocation,
}

/// Snapshot of execution state after one statement
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub heap: Heap,
    pub bindings: Bindings,
    pub transcript: Transcript,
    pub statement_index: usize, // Statements executed so far
    pub source_location: SourceLocation,
    pub last_measurement: Option<Measurement>,
}

impl Snapshot {
    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        // Heap: what the nodes themselves account for
        let heap_size = self.heap.total_allocated();

        // Bindings: assume 64 bytes per entry
        let bindings_size = self.bindings.len() * 64;

        // Transcript: assume 50 bytes per line on average
        let transcript_size = self.transcript.lines.len() * 50;

        let report_size = self
            .last_measurement
            .as_ref()
            .map_or(0, |m| m.node_count() * 48);

        heap_size + bindings_size + transcript_size + report_size
    }
}

/// Manages execution history
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), String> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(format!(
                "Snapshot memory limit exceeded: {} + {} > {}",
                self.current_memory, snapshot_size, self.max_memory
            ));
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::Value;

    fn snapshot_with_heap(heap: Heap) -> Snapshot {
        Snapshot {
            heap,
            bindings: Bindings::new(),
            transcript: Transcript::new(),
            statement_index: 0,
            source_location: SourceLocation::new(1, 1),
            last_measurement: None,
        }
    }

    #[test]
    fn test_estimated_size_counts_heap_and_output() {
        let mut heap = Heap::default();
        let addr = heap.allocate(Value::Str("hello".to_string())).unwrap();
        let mut snapshot = snapshot_with_heap(heap);
        snapshot.bindings.bind("s", addr);
        snapshot
            .transcript
            .print("'hello'".to_string(), SourceLocation::new(2, 1));

        assert_eq!(snapshot.estimated_size(), 54 + 64 + 50);
    }

    #[test]
    fn test_push_respects_limit() {
        let mut heap = Heap::default();
        heap.allocate(Value::List(Vec::new())).unwrap();
        let snapshot = snapshot_with_heap(heap);

        let mut manager = SnapshotManager::new(100);
        assert!(manager.push(snapshot.clone()).is_ok());
        assert_eq!(manager.memory_usage(), 56);
        let err = manager.push(snapshot).unwrap_err();
        assert!(err.contains("56 + 56 > 100"));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_transcript_keeps_line_tags() {
        let mut transcript = Transcript::new();
        transcript.print("a".to_string(), SourceLocation::new(3, 1));
        transcript.print("b".to_string(), SourceLocation::new(4, 1));
        transcript.print("c".to_string(), SourceLocation::new(3, 1));

        let lines: Vec<usize> = transcript.lines.iter().map(|l| l.location.line).collect();
        assert_eq!(lines, vec![3, 4, 3]);
        assert_eq!(transcript.get_output(), vec!["a", "b", "c"]);
    }
}
