//! Cycle-safe size accumulation
//!
//! [`compute_size`] walks the graph depth-first in pre-order. The walk uses an
//! explicit work stack instead of recursion; children are pushed in reverse so
//! they are popped, and therefore charged, in exactly the order a recursive
//! implementation would reach them. Deep chains cannot exhaust the thread
//! stack.

use super::report::Edge;
use super::{ObjectGraph, Shape};
use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Node identities already charged during a traversal
#[derive(Debug, Clone)]
pub struct Visited<Id> {
    seen: FxHashSet<Id>,
}

impl<Id: Copy + Eq + Hash> Visited<Id> {
    pub fn new() -> Self {
        Visited {
            seen: FxHashSet::default(),
        }
    }

    /// Record `id`; returns false if it was already present
    pub fn insert(&mut self, id: Id) -> bool {
        self.seen.insert(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<Id: Copy + Eq + Hash> Default for Visited<Id> {
    fn default() -> Self {
        Self::new()
    }
}

/// One step of the traversal, handed to the observer
pub(crate) enum Step<Id> {
    /// A node charged for the first time
    Charged {
        id: Id,
        parent: Option<Id>,
        edge: Edge,
        depth: usize,
        intrinsic: usize,
    },
    /// A node reached again and skipped
    Revisited { id: Id },
}

struct Pending<Id> {
    id: Id,
    parent: Option<Id>,
    edge: Edge,
    depth: usize,
}

/// Shared traversal behind [`compute_size`] and the size report
pub(crate) fn walk<G, F>(
    graph: &G,
    root: G::Id,
    visited: &mut Visited<G::Id>,
    mut observe: F,
) -> usize
where
    G: ObjectGraph + ?Sized,
    F: FnMut(Step<G::Id>),
{
    let mut total = 0;
    let mut work = vec![Pending {
        id: root,
        parent: None,
        edge: Edge::Root,
        depth: 0,
    }];

    while let Some(Pending {
        id,
        parent,
        edge,
        depth,
    }) = work.pop()
    {
        // Marked before any child is queued: a self-edge finds it here
        if !visited.insert(id) {
            log::trace!("skipping {:?}: already charged", id);
            observe(Step::Revisited { id });
            continue;
        }

        let intrinsic = graph.intrinsic_size(id);
        total += intrinsic;
        observe(Step::Charged {
            id,
            parent,
            edge,
            depth,
            intrinsic,
        });

        let children: Vec<(G::Id, Edge)> = match graph.shape(id) {
            Shape::Mapping(pairs) => {
                let values = pairs.iter().enumerate().map(|(i, &(_, v))| (v, Edge::Value(i)));
                let keys = pairs.iter().enumerate().map(|(i, &(k, _))| (k, Edge::Key(i)));
                values.chain(keys).collect()
            }
            Shape::Attributes(table) => vec![(table, Edge::Attributes)],
            Shape::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (item, Edge::Element(i)))
                .collect(),
            Shape::Leaf => Vec::new(),
        };

        work.extend(children.into_iter().rev().map(|(child, edge)| Pending {
            id: child,
            parent: Some(id),
            edge,
            depth: depth + 1,
        }));
    }

    total
}

/// Total size of every node reachable from `root`, each charged once.
///
/// When `visited` is `None` a fresh set is used and discarded. When a set is
/// supplied, nodes already in it are not charged again and every node charged
/// by this call is added to it.
pub fn compute_size<G>(graph: &G, root: G::Id, visited: Option<&mut Visited<G::Id>>) -> usize
where
    G: ObjectGraph + ?Sized,
{
    let mut local = Visited::new();
    let visited = visited.unwrap_or(&mut local);
    let total = walk(graph, root, visited, |_| {});
    log::debug!("compute_size({:?}) = {} bytes", root, total);
    total
}

/// Intrinsic size of `node` alone, ignoring everything it references
pub fn shallow_size<G>(graph: &G, node: G::Id) -> usize
where
    G: ObjectGraph + ?Sized,
{
    graph.intrinsic_size(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    /// Hand-built graph: node id -> (intrinsic size, shape)
    #[derive(Default)]
    struct TestGraph {
        nodes: FxHashMap<u32, (usize, Shape<u32>)>,
    }

    impl TestGraph {
        fn node(mut self, id: u32, size: usize, shape: Shape<u32>) -> Self {
            self.nodes.insert(id, (size, shape));
            self
        }
    }

    impl ObjectGraph for TestGraph {
        type Id = u32;

        fn intrinsic_size(&self, node: u32) -> usize {
            self.nodes.get(&node).map_or(0, |(size, _)| *size)
        }

        fn shape(&self, node: u32) -> Shape<u32> {
            self.nodes
                .get(&node)
                .map_or(Shape::Leaf, |(_, shape)| shape.clone())
        }
    }

    #[test]
    fn test_leaf_is_intrinsic_only() {
        let graph = TestGraph::default().node(1, 28, Shape::Leaf);
        assert_eq!(compute_size(&graph, 1, None), 28);
        assert_eq!(shallow_size(&graph, 1), 28);
    }

    #[test]
    fn test_direct_self_reference() {
        let graph = TestGraph::default()
            .node(1, 64, Shape::Sequence(vec![1, 2]))
            .node(2, 10, Shape::Leaf);
        assert_eq!(compute_size(&graph, 1, None), 74);
    }

    #[test]
    fn test_mutual_cycle() {
        let graph = TestGraph::default()
            .node(1, 100, Shape::Sequence(vec![2]))
            .node(2, 30, Shape::Sequence(vec![1]));
        assert_eq!(compute_size(&graph, 1, None), 130);
        assert_eq!(compute_size(&graph, 2, None), 130);
    }

    #[test]
    fn test_shared_child_counted_once() {
        let graph = TestGraph::default()
            .node(1, 8, Shape::Sequence(vec![2, 3]))
            .node(2, 8, Shape::Sequence(vec![4]))
            .node(3, 8, Shape::Mapping(vec![(5, 4)]))
            .node(4, 500, Shape::Leaf)
            .node(5, 1, Shape::Leaf);
        assert_eq!(compute_size(&graph, 1, None), 8 + 8 + 8 + 500 + 1);
    }

    #[test]
    fn test_attributes_reuse_mapping() {
        let graph = TestGraph::default()
            .node(1, 48, Shape::Attributes(2))
            .node(2, 232, Shape::Mapping(vec![(3, 4)]))
            .node(3, 53, Shape::Leaf)
            .node(4, 28, Shape::Leaf);
        assert_eq!(compute_size(&graph, 1, None), 48 + 232 + 53 + 28);
    }

    #[test]
    fn test_shared_visited_across_calls() {
        let graph = TestGraph::default()
            .node(1, 10, Shape::Sequence(vec![3]))
            .node(2, 20, Shape::Sequence(vec![3]))
            .node(3, 400, Shape::Leaf);

        let mut visited = Visited::new();
        let first = compute_size(&graph, 1, Some(&mut visited));
        let second = compute_size(&graph, 2, Some(&mut visited));

        assert_eq!(first, 410);
        assert_eq!(second, 20);
        assert_eq!(visited.len(), 3);
        assert_eq!(compute_size(&graph, 1, Some(&mut visited)), 0);
    }

    #[test]
    fn test_fresh_visited_per_call() {
        let graph = TestGraph::default().node(1, 10, Shape::Sequence(vec![1]));
        assert_eq!(compute_size(&graph, 1, None), 10);
        assert_eq!(compute_size(&graph, 1, None), 10);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let depth = 200_000;
        let mut graph = TestGraph::default();
        for id in 0..depth {
            graph = graph.node(id, 1, Shape::Sequence(vec![id + 1]));
        }
        graph = graph.node(depth, 1, Shape::Leaf);
        assert_eq!(compute_size(&graph, 0, None), depth as usize + 1);
    }
}
