//! Script variable bindings
//!
//! A binding maps a variable name to the address of a heap node. Rebinding a
//! name never touches the node it used to refer to; the node stays on the heap
//! and may still be reachable through other references.

use super::value::Address;
use rustc_hash::FxHashMap;

/// Name → address table that remembers declaration order
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    slots: FxHashMap<String, Address>,
    insertion_order: Vec<String>, // Track order of first binding
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `addr`, returning the previously bound address
    pub fn bind(&mut self, name: &str, addr: Address) -> Option<Address> {
        let previous = self.slots.insert(name.to_string(), addr);
        if previous.is_none() {
            self.insertion_order.push(name.to_string());
        }
        previous
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<Address> {
        self.slots.get(name).copied()
    }

    /// Bindings in the order the names were first bound
    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> + '_ {
        self.insertion_order
            .iter()
            .filter_map(|name| self.slots.get(name).map(|addr| (name.as_str(), *addr)))
    }

    /// All bound addresses, in declaration order
    pub fn roots(&self) -> Vec<Address> {
        self.iter().map(|(_, addr)| addr).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
