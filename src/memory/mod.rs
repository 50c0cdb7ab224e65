//! Memory model for heap scripts
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Node payloads (scalars, strings, containers, instances)
//! - [`heap`]: Address-keyed node storage with an allocation limit
//! - [`bindings`]: Variable name → address table
//! - [`display`]: Repr-style rendering of nodes
//!
//! # Intrinsic Sizes
//!
//! Sizes are fixed and platform-independent, loosely modeled on a 64-bit
//! CPython object layout. They describe the node itself and never include
//! anything reachable through it:
//! - `None`: 16 bytes
//! - `bool`: 28 bytes
//! - `int`: 24 bytes for zero, plus 4 bytes per 30-bit digit otherwise
//! - `float`: 24 bytes
//! - `str`: 49 + len for ASCII, wider headers and code units for other text
//! - `bytes`: 33 + len
//! - `list`: 56 + 8 per element, `tuple`: 40 + 8 per element
//! - `set`: 88 + 16 per hash table slot (table starts at 8)
//! - `dict`: 64 when empty, 64 + 21 per slot of capacity otherwise
//! - instance: 48 with an attribute table, 40 + 8 per slot otherwise

pub mod bindings;
pub mod display;
pub mod heap;
pub mod value;

use value::{Layout, Value};

/// Object header: reference count plus type pointer
pub const HEADER_SIZE: usize = 16;

/// Size of one reference held by a container
pub const POINTER_SIZE: usize = 8;

const INT_BASE: usize = 24;
const INT_DIGIT: usize = 4;
const INT_DIGIT_BITS: u32 = 30;

/// Calculate the intrinsic size of a node in bytes
pub fn intrinsic_size(value: &Value) -> usize {
    match value {
        Value::None => HEADER_SIZE,
        Value::Bool(_) => INT_BASE + INT_DIGIT,
        Value::Int(n) => int_size(*n),
        Value::Float(_) => HEADER_SIZE + 8,
        Value::Str(s) => str_size(s),
        Value::Bytes(b) => 33 + b.len(),
        Value::List(items) => 56 + POINTER_SIZE * items.len(),
        Value::Tuple(items) => 40 + POINTER_SIZE * items.len(),
        Value::Set(items) => 88 + 16 * set_table_size(items.len()),
        Value::Dict(pairs) => dict_size(pairs.len()),
        Value::Object(instance) => match &instance.layout {
            Layout::Table(_) => 48,
            Layout::Slots(slots) => 40 + POINTER_SIZE * slots.len(),
        },
    }
}

fn int_size(n: i64) -> usize {
    if n == 0 {
        return INT_BASE;
    }
    let bits = u64::BITS - n.unsigned_abs().leading_zeros();
    let digits = bits.div_ceil(INT_DIGIT_BITS) as usize;
    INT_BASE + INT_DIGIT * digits
}

fn str_size(s: &str) -> usize {
    if s.is_ascii() {
        return 49 + s.len();
    }
    let chars = s.chars().count();
    match s.chars().map(|c| c as u32).max().unwrap_or(0) {
        0..=0xff => 73 + chars,
        0x100..=0xffff => 74 + 2 * chars,
        _ => 76 + 4 * chars,
    }
}

/// Hash table slots for a set holding `len` elements
fn set_table_size(len: usize) -> usize {
    let mut table = 8;
    while 5 * len >= 3 * table {
        table *= 4;
    }
    table
}

fn dict_size(len: usize) -> usize {
    if len == 0 {
        return 64;
    }
    let mut capacity = 8;
    while 3 * len > 2 * capacity {
        capacity *= 2;
    }
    64 + 21 * capacity
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::Instance;

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(intrinsic_size(&Value::None), 16);
        assert_eq!(intrinsic_size(&Value::Bool(true)), 28);
        assert_eq!(intrinsic_size(&Value::Float(1.5)), 24);
    }

    #[test]
    fn test_int_digits() {
        assert_eq!(intrinsic_size(&Value::Int(0)), 24);
        assert_eq!(intrinsic_size(&Value::Int(1)), 28);
        assert_eq!(intrinsic_size(&Value::Int(-42)), 28);
        assert_eq!(intrinsic_size(&Value::Int(1 << 30)), 32);
        assert_eq!(intrinsic_size(&Value::Int(i64::MIN)), 24 + 4 * 3);
    }

    #[test]
    fn test_string_widths() {
        assert_eq!(intrinsic_size(&Value::Str(String::new())), 49);
        assert_eq!(intrinsic_size(&Value::Str("hello".to_string())), 54);
        assert_eq!(intrinsic_size(&Value::Str("é".to_string())), 74);
        assert_eq!(intrinsic_size(&Value::Str("€€".to_string())), 78);
        assert_eq!(intrinsic_size(&Value::Str("🦀".to_string())), 80);
    }

    #[test]
    fn test_container_growth() {
        assert_eq!(intrinsic_size(&Value::List(Vec::new())), 56);
        assert_eq!(intrinsic_size(&Value::List(vec![1, 2, 3])), 80);
        assert_eq!(intrinsic_size(&Value::Tuple(vec![1])), 48);
        assert_eq!(intrinsic_size(&Value::Set(Vec::new())), 216);
        assert_eq!(intrinsic_size(&Value::Set(vec![1, 2, 3, 4])), 216);
        assert_eq!(intrinsic_size(&Value::Set(vec![1, 2, 3, 4, 5])), 88 + 16 * 32);
        assert_eq!(intrinsic_size(&Value::Dict(Vec::new())), 64);
        assert_eq!(intrinsic_size(&Value::Dict(vec![(1, 2)])), 232);
        let six: Vec<_> = (0..6).map(|i| (i, i)).collect();
        assert_eq!(intrinsic_size(&Value::Dict(six)), 64 + 21 * 16);
    }

    #[test]
    fn test_instance_layouts() {
        let table = Value::Object(Instance {
            class_name: "DataItem".to_string(),
            layout: Layout::Table(0x1000),
        });
        let slots = Value::Object(Instance {
            class_name: "DataItem".to_string(),
            layout: Layout::Slots(vec![
                ("name".to_string(), 1),
                ("age".to_string(), 2),
                ("address".to_string(), 3),
            ]),
        });
        assert_eq!(intrinsic_size(&table), 48);
        assert_eq!(intrinsic_size(&slots), 64);
    }
}
