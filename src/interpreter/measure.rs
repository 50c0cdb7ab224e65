//! Results of `footprint` statements
//!
//! A [`Measurement`] keeps one [`SizeReport`] per root expression. Roots of a
//! single statement share a visited set, so a node reachable from two roots is
//! charged to the first one only and the sum of the root totals never counts
//! anything twice.

use crate::memory::{display, heap::Heap, value::Address};
use crate::script::ast::SourceLocation;
use crate::sizing::SizeReport;

/// One measured root
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredRoot {
    /// Expression text as written in the script
    pub label: String,
    pub report: SizeReport<Address>,
    /// Breakdown rendered when the measurement was taken
    pub lines: Vec<String>,
}

/// A `footprint` statement's result
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub location: SourceLocation,
    pub roots: Vec<MeasuredRoot>,
}

impl Measurement {
    pub fn new(location: SourceLocation) -> Self {
        Measurement {
            location,
            roots: Vec::new(),
        }
    }

    /// Record a root's report, rendering its breakdown against `heap`
    pub fn push(&mut self, label: String, report: SizeReport<Address>, heap: &Heap) {
        let lines = report.render_lines(|addr| display::node_label(heap, addr));
        self.roots.push(MeasuredRoot {
            label,
            report,
            lines,
        });
    }

    /// Combined size of all roots
    pub fn total(&self) -> usize {
        self.roots.iter().map(|r| r.report.total).sum()
    }

    /// Distinct nodes charged across all roots
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(|r| r.report.node_count()).sum()
    }

    /// Report for the root labelled `label`
    pub fn root(&self, label: &str) -> Option<&SizeReport<Address>> {
        self.roots
            .iter()
            .find(|r| r.label == label)
            .map(|r| &r.report)
    }

    /// Breakdown of every root, each preceded by a header line
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for root in &self.roots {
            lines.push(format!("{}:", root.label));
            lines.extend(root.lines.iter().map(|l| format!("  {}", l)));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::Value;
    use crate::sizing::{size_report, Visited};

    #[test]
    fn test_shared_visited_splits_charges() {
        let mut heap = Heap::default();
        let s = heap.allocate(Value::Str("shared".to_string())).unwrap();
        let a = heap.allocate(Value::List(vec![s])).unwrap();
        let b = heap.allocate(Value::Tuple(vec![s])).unwrap();

        let mut visited = Visited::new();
        let mut m = Measurement::new(SourceLocation::new(4, 1));
        let ra = size_report(&heap, a, Some(&mut visited));
        m.push("a".to_string(), ra, &heap);
        let rb = size_report(&heap, b, Some(&mut visited));
        m.push("b".to_string(), rb, &heap);

        assert_eq!(m.root("a").map(|r| r.total), Some(64 + 55));
        assert_eq!(m.root("b").map(|r| r.total), Some(48));
        assert_eq!(m.total(), 64 + 55 + 48);
        assert_eq!(m.node_count(), 3);

        let lines = m.render_lines();
        assert_eq!(lines[0], "a:");
        assert!(lines[1].starts_with("  0x10000040 list"));
        assert!(lines.iter().any(|l| l == "b:"));
    }
}
