//! Per-node size breakdown
//!
//! A [`SizeReport`] is produced by the same traversal as
//! [`compute_size`](super::compute_size) and records which parent each node
//! was charged to. Nodes reachable along several paths appear once, under the
//! first parent that reached them.

use super::accumulator::{walk, Step, Visited};
use super::ObjectGraph;
use std::fmt;

/// How a charged node was reached from its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// The node the traversal started from
    Root,
    /// The `n`th key of a mapping
    Key(usize),
    /// The value of the `n`th mapping entry
    Value(usize),
    /// The attribute table of an instance
    Attributes,
    /// The `n`th element of a sequence
    Element(usize),
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Root => write!(f, "root"),
            Edge::Key(i) => write!(f, "key #{}", i),
            Edge::Value(i) => write!(f, "value #{}", i),
            Edge::Attributes => write!(f, "attrs"),
            Edge::Element(i) => write!(f, "[{}]", i),
        }
    }
}

/// A node charged to the total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge<Id> {
    pub id: Id,
    pub parent: Option<Id>,
    pub edge: Edge,
    pub depth: usize,
    pub intrinsic: usize,
}

/// Result of a traversal with breakdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReport<Id> {
    pub root: Id,
    pub total: usize,
    /// Charged nodes in traversal (pre-)order
    pub charges: Vec<Charge<Id>>,
    /// Edges that led to an already charged node
    pub revisits: usize,
}

impl<Id: Copy + Eq> SizeReport<Id> {
    /// Number of distinct nodes charged
    pub fn node_count(&self) -> usize {
        self.charges.len()
    }

    /// Deep size of each charged node, aligned with `charges`.
    ///
    /// A node's subtree is the run of deeper entries that follows it in
    /// pre-order, so the sizes are folded upward in one pass.
    pub fn subtree_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.charges.iter().map(|c| c.intrinsic).collect();
        let mut open: Vec<usize> = Vec::new();
        fn close(open: &mut Vec<usize>, sizes: &mut [usize]) {
            if let Some(done) = open.pop() {
                if let Some(&parent) = open.last() {
                    sizes[parent] += sizes[done];
                }
            }
        }

        for (i, charge) in self.charges.iter().enumerate() {
            while open
                .last()
                .is_some_and(|&top| self.charges[top].depth >= charge.depth)
            {
                close(&mut open, &mut sizes);
            }
            open.push(i);
        }
        while !open.is_empty() {
            close(&mut open, &mut sizes);
        }
        sizes
    }

    /// Indented text rendering, one line per charged node.
    ///
    /// `label` describes a node (address, type, short value).
    pub fn render_lines<F>(&self, label: F) -> Vec<String>
    where
        F: Fn(Id) -> String,
    {
        let mut lines = Vec::with_capacity(self.charges.len() + 1);
        for (charge, deep) in self.charges.iter().zip(self.subtree_sizes()) {
            let indent = "  ".repeat(charge.depth);
            let edge = match charge.edge {
                Edge::Root => String::new(),
                edge => format!("{} ", edge),
            };
            let mut line = format!("{}{}{} {} B", indent, edge, label(charge.id), charge.intrinsic);
            if deep > charge.intrinsic {
                line.push_str(&format!(" ({} B deep)", deep));
            }
            lines.push(line);
        }
        lines.push(format!(
            "total {} B in {} node{}, {} shared/cyclic reference{} skipped",
            self.total,
            self.node_count(),
            if self.node_count() == 1 { "" } else { "s" },
            self.revisits,
            if self.revisits == 1 { "" } else { "s" }
        ));
        lines
    }
}

/// Traverse like [`compute_size`](super::compute_size) and record the breakdown
pub fn size_report<G>(
    graph: &G,
    root: G::Id,
    visited: Option<&mut Visited<G::Id>>,
) -> SizeReport<G::Id>
where
    G: ObjectGraph + ?Sized,
{
    let mut local = Visited::new();
    let visited = visited.unwrap_or(&mut local);
    let mut charges = Vec::new();
    let mut revisits = 0;

    let total = walk(graph, root, visited, |step| match step {
        Step::Charged {
            id,
            parent,
            edge,
            depth,
            intrinsic,
        } => charges.push(Charge {
            id,
            parent,
            edge,
            depth,
            intrinsic,
        }),
        Step::Revisited { id } => {
            log::trace!("report for {:?}: revisit of {:?}", root, id);
            revisits += 1;
        }
    });

    SizeReport {
        root,
        total,
        charges,
        revisits,
    }
}
