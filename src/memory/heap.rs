//! Heap implementation for heap scripts
//!
//! This module provides node storage with:
//! - Monotonic address assignment (an address is never reused)
//! - A byte limit on the intrinsic size of everything allocated
//! - Value equality for dict keys and set membership
//!
//! The heap is the [`ObjectGraph`] the size accumulator walks. Nodes are never
//! freed; a script that drops its last binding to a node simply leaves it
//! unreachable.

use super::intrinsic_size;
use super::value::{Address, Layout, Value};
use crate::interpreter::constants::{DEFAULT_HEAP_LIMIT, HEAP_ADDRESS_START, NODE_ALIGNMENT};
use crate::sizing::{ObjectGraph, Shape};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised by heap operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    #[error("Out of memory: requested {requested} bytes, {allocated} already allocated, limit is {limit}")]
    OutOfMemory {
        requested: usize,
        allocated: usize,
        limit: usize,
    },

    #[error("Invalid address 0x{0:x}: no node allocated there")]
    InvalidAddress(Address),
}

/// A node stored on the heap
#[derive(Debug, Clone)]
pub struct HeapNode {
    pub value: Value,
    /// Intrinsic size as last charged against the heap limit
    pub allocated_size: usize,
}

/// The heap
#[derive(Debug, Clone)]
pub struct Heap {
    nodes: FxHashMap<Address, HeapNode>,
    next_address: Address,
    total_allocated_bytes: usize,
    max_heap_size: usize,
}

impl Heap {
    /// Create a new heap with a maximum size limit
    pub fn new(max_heap_size: usize) -> Self {
        Heap {
            nodes: FxHashMap::default(),
            next_address: HEAP_ADDRESS_START,
            total_allocated_bytes: 0,
            max_heap_size,
        }
    }

    /// Allocate a node holding `value` and return its address
    pub fn allocate(&mut self, value: Value) -> Result<Address, HeapError> {
        let size = intrinsic_size(&value);
        if self.total_allocated_bytes + size > self.max_heap_size {
            return Err(HeapError::OutOfMemory {
                requested: size,
                allocated: self.total_allocated_bytes,
                limit: self.max_heap_size,
            });
        }

        let addr = self.next_address;
        let stride = size.max(1).next_multiple_of(NODE_ALIGNMENT);
        self.next_address += stride as u64;
        self.nodes.insert(
            addr,
            HeapNode {
                value,
                allocated_size: size,
            },
        );
        self.total_allocated_bytes += size;

        log::trace!("allocated {} bytes at 0x{:x}", size, addr);
        Ok(addr)
    }

    /// Get the value stored at an address
    pub fn get(&self, addr: Address) -> Result<&Value, HeapError> {
        self.nodes
            .get(&addr)
            .map(|node| &node.value)
            .ok_or(HeapError::InvalidAddress(addr))
    }

    /// Mutate the node at `addr` in place, charging any growth against the limit.
    ///
    /// The mutation is applied to a copy first; when the grown node would not
    /// fit, the stored node is left unchanged and `OutOfMemory` is returned.
    pub fn update<F>(&mut self, addr: Address, mutate: F) -> Result<(), HeapError>
    where
        F: FnOnce(&mut Value),
    {
        let node = self
            .nodes
            .get_mut(&addr)
            .ok_or(HeapError::InvalidAddress(addr))?;
        let mut value = node.value.clone();
        mutate(&mut value);

        let old_size = node.allocated_size;
        let new_size = intrinsic_size(&value);
        let others = self.total_allocated_bytes - old_size;
        if new_size > old_size && others + new_size > self.max_heap_size {
            return Err(HeapError::OutOfMemory {
                requested: new_size - old_size,
                allocated: self.total_allocated_bytes,
                limit: self.max_heap_size,
            });
        }

        node.value = value;
        node.allocated_size = new_size;
        self.total_allocated_bytes = others + new_size;
        if new_size != old_size {
            log::trace!("node 0x{:x} resized {} -> {} bytes", addr, old_size, new_size);
        }
        Ok(())
    }

    /// All nodes sorted by address (for UI display)
    pub fn nodes(&self) -> Vec<(Address, &HeapNode)> {
        let mut nodes: Vec<_> = self.nodes.iter().map(|(a, n)| (*a, n)).collect();
        nodes.sort_by_key(|(addr, _)| *addr);
        nodes
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing has been allocated
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get total allocated bytes
    pub fn total_allocated(&self) -> usize {
        self.total_allocated_bytes
    }

    /// Get max heap size
    pub fn max_size(&self) -> usize {
        self.max_heap_size
    }

    /// Compare two nodes the way dict keys and set elements are compared.
    ///
    /// Numbers and booleans compare by numeric value, strings and bytes by
    /// content, tuples element-wise. Everything else compares by identity.
    pub fn values_equal(&self, a: Address, b: Address) -> bool {
        if a == b {
            return true;
        }
        let (Ok(left), Ok(right)) = (self.get(a), self.get(b)) else {
            return false;
        };
        match (left, right) {
            (Value::None, Value::None) => true,
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Bytes(x), Value::Bytes(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Float(x), other) | (other, Value::Float(x)) => {
                other.as_int().is_some_and(|n| n as f64 == *x)
            }
            (Value::Tuple(xs), Value::Tuple(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys.iter())
                        .all(|(x, y)| self.values_equal(*x, *y))
            }
            (x, y) => match (x.as_int(), y.as_int()) {
                (Some(m), Some(n)) => m == n,
                _ => false,
            },
        }
    }

    /// Type name of the node that keeps `addr` from being a dict key or set
    /// element, or `None` when it is hashable.
    ///
    /// Tuples are hashable only when every element is.
    pub fn unhashable_type(&self, addr: Address) -> Option<&str> {
        let mut pending = vec![addr];
        while let Some(next) = pending.pop() {
            match self.get(next) {
                Ok(Value::Tuple(items)) => pending.extend(items.iter().rev()),
                Ok(value) if !value.is_hashable() => return Some(value.type_name()),
                _ => {}
            }
        }
        None
    }

    /// Find the index of `key` among the keys of a dict's pairs
    pub fn find_key(&self, pairs: &[(Address, Address)], key: Address) -> Option<usize> {
        pairs.iter().position(|(k, _)| self.values_equal(*k, key))
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(DEFAULT_HEAP_LIMIT)
    }
}

impl ObjectGraph for Heap {
    type Id = Address;

    fn intrinsic_size(&self, node: Address) -> usize {
        match self.nodes.get(&node) {
            Some(heap_node) => intrinsic_size(&heap_node.value),
            None => {
                log::warn!("size requested for unallocated address 0x{:x}", node);
                0
            }
        }
    }

    fn shape(&self, node: Address) -> Shape<Address> {
        let Some(heap_node) = self.nodes.get(&node) else {
            return Shape::Leaf;
        };
        match &heap_node.value {
            Value::Dict(pairs) => Shape::Mapping(pairs.clone()),
            Value::Object(instance) => match &instance.layout {
                Layout::Table(table) => Shape::Attributes(*table),
                // Slots expose no attribute table
                Layout::Slots(_) => Shape::Leaf,
            },
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
                Shape::Sequence(items.clone())
            }
            // Iterable, but opaque
            Value::Str(_) | Value::Bytes(_) => Shape::Leaf,
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) => Shape::Leaf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_assigns_distinct_aligned_addresses() {
        let mut heap = Heap::default();
        let a = heap.allocate(Value::Str("x".to_string())).unwrap();
        let b = heap.allocate(Value::Str("x".to_string())).unwrap();

        assert_eq!(a, HEAP_ADDRESS_START);
        assert_ne!(a, b);
        assert_eq!(b % NODE_ALIGNMENT as u64, 0);
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.total_allocated(), 100);
    }

    #[test]
    fn test_out_of_memory() {
        let mut heap = Heap::new(50);
        heap.allocate(Value::Int(1)).unwrap();
        let err = heap.allocate(Value::Int(2)).unwrap_err();
        assert_eq!(
            err,
            HeapError::OutOfMemory {
                requested: 28,
                allocated: 28,
                limit: 50
            }
        );
    }

    #[test]
    fn test_update_charges_growth() {
        let mut heap = Heap::new(200);
        let one = heap.allocate(Value::Int(1)).unwrap();
        let list = heap.allocate(Value::List(vec![one])).unwrap();
        assert_eq!(heap.total_allocated(), 28 + 64);

        heap.update(list, |v| {
            if let Value::List(items) = v {
                items.extend([one, one]);
            }
        })
        .unwrap();
        assert_eq!(heap.total_allocated(), 28 + 80);
        assert_eq!(heap.nodes()[1].1.allocated_size, 80);

        // 56 + 8 * 15 = 176 would push the total past 200
        let err = heap
            .update(list, |v| {
                if let Value::List(items) = v {
                    items.extend([one; 12]);
                }
            })
            .unwrap_err();
        assert_eq!(
            err,
            HeapError::OutOfMemory {
                requested: 96,
                allocated: 108,
                limit: 200
            }
        );
        assert_eq!(heap.get(list), Ok(&Value::List(vec![one, one, one])));
        assert_eq!(heap.total_allocated(), 108);
    }

    #[test]
    fn test_update_invalid_address() {
        let mut heap = Heap::default();
        assert_eq!(heap.update(0x42, |_| {}), Err(HeapError::InvalidAddress(0x42)));
    }

    #[test]
    fn test_unhashable_type_looks_inside_tuples() {
        let mut heap = Heap::default();
        let one = heap.allocate(Value::Int(1)).unwrap();
        let list = heap.allocate(Value::List(vec![one])).unwrap();
        let flat = heap.allocate(Value::Tuple(vec![one, one])).unwrap();
        let nested = heap.allocate(Value::Tuple(vec![one, flat])).unwrap();
        let hiding = heap.allocate(Value::Tuple(vec![nested, list])).unwrap();

        assert_eq!(heap.unhashable_type(one), None);
        assert_eq!(heap.unhashable_type(nested), None);
        assert_eq!(heap.unhashable_type(list), Some("list"));
        assert_eq!(heap.unhashable_type(hiding), Some("list"));
    }

    #[test]
    fn test_invalid_address() {
        let heap = Heap::default();
        assert_eq!(heap.get(0x42), Err(HeapError::InvalidAddress(0x42)));
    }

    #[test]
    fn test_values_equal() {
        let mut heap = Heap::default();
        let one = heap.allocate(Value::Int(1)).unwrap();
        let one_f = heap.allocate(Value::Float(1.0)).unwrap();
        let yes = heap.allocate(Value::Bool(true)).unwrap();
        let s1 = heap.allocate(Value::Str("k".to_string())).unwrap();
        let s2 = heap.allocate(Value::Str("k".to_string())).unwrap();
        let l1 = heap.allocate(Value::List(Vec::new())).unwrap();
        let l2 = heap.allocate(Value::List(Vec::new())).unwrap();
        let t1 = heap.allocate(Value::Tuple(vec![one, s1])).unwrap();
        let t2 = heap.allocate(Value::Tuple(vec![yes, s2])).unwrap();

        assert!(heap.values_equal(one, one_f));
        assert!(heap.values_equal(one, yes));
        assert!(heap.values_equal(s1, s2));
        assert!(heap.values_equal(t1, t2));
        assert!(!heap.values_equal(l1, l2));
        assert!(heap.values_equal(l1, l1));
        assert!(!heap.values_equal(one, s1));
    }

    #[test]
    fn test_shape_classification() {
        let mut heap = Heap::default();
        let s = heap.allocate(Value::Str("abc".to_string())).unwrap();
        let b = heap.allocate(Value::Bytes(vec![1, 2])).unwrap();
        let list = heap.allocate(Value::List(vec![s, b])).unwrap();
        let dict = heap.allocate(Value::Dict(vec![(s, list)])).unwrap();

        assert_eq!(heap.shape(s), Shape::Leaf);
        assert_eq!(heap.shape(b), Shape::Leaf);
        assert_eq!(heap.shape(list), Shape::Sequence(vec![s, b]));
        assert_eq!(heap.shape(dict), Shape::Mapping(vec![(s, list)]));
        assert_eq!(heap.shape(0x1), Shape::Leaf);
        assert_eq!(heap.intrinsic_size(0x1), 0);
    }
}
