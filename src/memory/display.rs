//! Text rendering of heap nodes
//!
//! [`repr`] follows the repr conventions of the language heap scripts imitate:
//! quoted strings, `b'..'` bytes, `(1,)` for one-element tuples, `set()` for an
//! empty set. A container that contains itself renders the inner occurrence as
//! `[...]`, `(...)`, `{...}` or `Class(...)` instead of recursing forever.

use super::heap::Heap;
use super::value::{Address, Layout, Value};
use rustc_hash::FxHashSet;

/// Full repr of the node at `addr`
pub fn repr(heap: &Heap, addr: Address) -> String {
    let mut writer = ReprWriter::new(heap, usize::MAX);
    writer.write(addr);
    writer.out
}

/// Repr truncated to `max_chars` characters (with a trailing `…`).
///
/// Rendering stops as soon as enough text exists, so the cost does not depend
/// on how large the full repr would be.
pub fn short_repr(heap: &Heap, addr: Address, max_chars: usize) -> String {
    // A char is at most 4 bytes: past this many bytes we hold > max_chars chars
    let mut writer = ReprWriter::new(heap, max_chars.saturating_mul(4));
    writer.write(addr);
    let full = writer.out;
    if full.chars().count() <= max_chars {
        return full;
    }
    let mut truncated: String = full.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// One-line node description: address, type and a short repr
pub fn node_label(heap: &Heap, addr: Address) -> String {
    match heap.get(addr) {
        Ok(value) => format!(
            "0x{:08x} {} {}",
            addr,
            value.type_name(),
            short_repr(heap, addr, 32)
        ),
        Err(_) => format!("0x{:08x} <invalid>", addr),
    }
}

/// Attribute names and values of an instance, in definition order.
///
/// Returns `None` when the node is not an instance.
pub fn attributes(heap: &Heap, addr: Address) -> Option<Vec<(String, Address)>> {
    let Ok(Value::Object(instance)) = heap.get(addr) else {
        return None;
    };
    match &instance.layout {
        Layout::Slots(slots) => Some(slots.clone()),
        Layout::Table(table) => match heap.get(*table) {
            Ok(Value::Dict(pairs)) => Some(
                pairs
                    .iter()
                    .map(|(k, v)| {
                        let name = match heap.get(*k) {
                            Ok(Value::Str(s)) => s.clone(),
                            _ => repr(heap, *k),
                        };
                        (name, *v)
                    })
                    .collect(),
            ),
            _ => Some(Vec::new()),
        },
    }
}

fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("b'");
    for &b in bytes {
        match b {
            b'\'' => out.push_str("\\'"),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push('\'');
    out
}

struct ReprWriter<'a> {
    heap: &'a Heap,
    /// Containers currently being written; reaching one again is a cycle
    active: FxHashSet<Address>,
    out: String,
    /// Stop once `out` is longer than this many bytes
    budget: usize,
}

impl<'a> ReprWriter<'a> {
    fn new(heap: &'a Heap, budget: usize) -> Self {
        ReprWriter {
            heap,
            active: FxHashSet::default(),
            out: String::new(),
            budget,
        }
    }

    fn exhausted(&self) -> bool {
        self.out.len() > self.budget
    }

    fn write_items(&mut self, items: &[Address]) {
        for (i, item) in items.iter().enumerate() {
            if self.exhausted() {
                return;
            }
            if i > 0 {
                self.out.push_str(", ");
            }
            self.write(*item);
        }
    }

    fn write(&mut self, addr: Address) {
        if self.exhausted() {
            return;
        }
        let heap = self.heap;
        let Ok(value) = heap.get(addr) else {
            self.out.push_str(&format!("<invalid 0x{:x}>", addr));
            return;
        };

        if !value.is_scalar() && !self.active.insert(addr) {
            let placeholder = match value {
                Value::List(_) => "[...]".to_string(),
                Value::Tuple(_) => "(...)".to_string(),
                Value::Object(instance) => format!("{}(...)", instance.class_name),
                _ => "{...}".to_string(),
            };
            self.out.push_str(&placeholder);
            return;
        }

        match value {
            Value::None => self.out.push_str("None"),
            Value::Bool(b) => self.out.push_str(if *b { "True" } else { "False" }),
            Value::Int(n) => self.out.push_str(&n.to_string()),
            Value::Float(x) => self.out.push_str(&format!("{:?}", x)),
            Value::Str(s) => self.out.push_str(&quote_str(s)),
            Value::Bytes(b) => self.out.push_str(&quote_bytes(b)),
            Value::List(items) => {
                self.out.push('[');
                self.write_items(items);
                self.out.push(']');
            }
            Value::Tuple(items) => {
                self.out.push('(');
                self.write_items(items);
                if items.len() == 1 {
                    self.out.push(',');
                }
                self.out.push(')');
            }
            Value::Set(items) if items.is_empty() => self.out.push_str("set()"),
            Value::Set(items) => {
                self.out.push('{');
                self.write_items(items);
                self.out.push('}');
            }
            Value::Dict(pairs) => {
                self.out.push('{');
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if self.exhausted() {
                        break;
                    }
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.write(*k);
                    self.out.push_str(": ");
                    self.write(*v);
                }
                self.out.push('}');
            }
            Value::Object(instance) => {
                self.out.push_str(&instance.class_name);
                self.out.push('(');
                let fields = attributes(heap, addr).unwrap_or_default();
                for (i, (name, field)) in fields.iter().enumerate() {
                    if self.exhausted() {
                        break;
                    }
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(name);
                    self.out.push('=');
                    self.write(*field);
                }
                self.out.push(')');
            }
        }

        self.active.remove(&addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::Instance;

    #[test]
    fn test_scalar_reprs() {
        let mut heap = Heap::default();
        let s = heap.allocate(Value::Str("it's".to_string())).unwrap();
        let b = heap.allocate(Value::Bytes(vec![b'a', 0])).unwrap();
        let f = heap.allocate(Value::Float(1.0)).unwrap();
        let empty = heap.allocate(Value::Set(Vec::new())).unwrap();

        assert_eq!(repr(&heap, s), "'it\\'s'");
        assert_eq!(repr(&heap, b), "b'a\\x00'");
        assert_eq!(repr(&heap, f), "1.0");
        assert_eq!(repr(&heap, empty), "set()");
    }

    #[test]
    fn test_recursive_list() {
        let mut heap = Heap::default();
        let one = heap.allocate(Value::Int(1)).unwrap();
        let list = heap.allocate(Value::List(vec![one])).unwrap();
        heap.update(list, |v| {
            if let Value::List(items) = v {
                items.push(list);
            }
        })
        .unwrap();
        let pair = heap.allocate(Value::Tuple(vec![list])).unwrap();

        assert_eq!(repr(&heap, list), "[1, [...]]");
        assert_eq!(repr(&heap, pair), "([1, [...]],)");
    }

    #[test]
    fn test_shared_child_is_not_a_cycle() {
        let mut heap = Heap::default();
        let s = heap.allocate(Value::Str("x".to_string())).unwrap();
        let inner = heap.allocate(Value::List(vec![s])).unwrap();
        let outer = heap.allocate(Value::List(vec![inner, inner])).unwrap();
        assert_eq!(repr(&heap, outer), "[['x'], ['x']]");
    }

    #[test]
    fn test_instance_repr_and_attributes() {
        let mut heap = Heap::default();
        let key = heap.allocate(Value::Str("name".to_string())).unwrap();
        let val = heap.allocate(Value::Str("Alex".to_string())).unwrap();
        let table = heap.allocate(Value::Dict(vec![(key, val)])).unwrap();
        let obj = heap
            .allocate(Value::Object(Instance {
                class_name: "DataItem".to_string(),
                layout: Layout::Table(table),
            }))
            .unwrap();

        assert_eq!(repr(&heap, obj), "DataItem(name='Alex')");
        assert_eq!(
            attributes(&heap, obj),
            Some(vec![("name".to_string(), val)])
        );
        assert_eq!(attributes(&heap, val), None);
        assert_eq!(short_repr(&heap, obj, 10), "DataItem(…");
    }

    #[test]
    fn test_short_repr_of_doubling_dag_is_bounded() {
        // Level n holds level n-1 twice; the full repr would have 2^30 leaves
        let mut heap = Heap::default();
        let one = heap.allocate(Value::Int(1)).unwrap();
        let mut level = heap.allocate(Value::List(vec![one])).unwrap();
        for _ in 0..30 {
            level = heap.allocate(Value::List(vec![level, level])).unwrap();
        }

        let label = short_repr(&heap, level, 32);
        assert_eq!(label.chars().count(), 32);
        assert!(label.starts_with("[[[[["));
        assert!(label.ends_with('…'));
        assert!(node_label(&heap, level).starts_with("0x"));
    }

    #[test]
    fn test_short_repr_keeps_short_values_whole() {
        let mut heap = Heap::default();
        let s = heap.allocate(Value::Str("café".to_string())).unwrap();
        let list = heap.allocate(Value::List(vec![s, s])).unwrap();
        assert_eq!(short_repr(&heap, list, 32), "['café', 'café']");
    }
}
