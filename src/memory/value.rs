//! Heap node representation
//!
//! This module defines the [`Value`] enum, the payload stored at every heap
//! address. Composite values never own their children directly: they hold the
//! [`Address`] of each child, so the heap forms a reference graph in which
//! sharing and cycles are possible.
//!
//! # Value Types
//!
//! - Scalars: [`Value::None`], [`Value::Bool`], [`Value::Int`], [`Value::Float`]
//! - Opaque sequences: [`Value::Str`], [`Value::Bytes`]
//! - Containers: [`Value::List`], [`Value::Tuple`], [`Value::Set`], [`Value::Dict`]
//! - Class instances: [`Value::Object`], with either an attribute table or slots

/// Memory address type (64-bit). Doubles as node identity.
pub type Address = u64;

/// How an instance stores its fields
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// Attributes live in a separate dict node at this address
    Table(Address),
    /// Fixed fields stored inline, in declaration order
    Slots(Vec<(String, Address)>),
}

/// An instance of a script-defined class
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub class_name: String,
    pub layout: Layout,
}

/// Payload of a heap node
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Address>),
    Tuple(Vec<Address>),
    Set(Vec<Address>),
    Dict(Vec<(Address, Address)>), // Insertion-ordered key -> value
    Object(Instance),
}

impl Value {
    /// Short type name, as shown in the UI and in error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Object(instance) => &instance.class_name,
        }
    }

    /// Get the integer value, returns None if not an Int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Get the string contents, returns None if not a Str
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value itself may be used as a dict key or set element.
    ///
    /// Mutable containers are unhashable. A tuple passes here; its elements are
    /// checked by [`Heap::unhashable_type`](super::heap::Heap::unhashable_type).
    pub fn is_hashable(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Set(_) | Value::Dict(_))
    }

    /// Whether this value is a scalar (no outgoing references at all)
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::None.type_name(), "NoneType");
        assert_eq!(Value::Dict(Vec::new()).type_name(), "dict");
        let obj = Value::Object(Instance {
            class_name: "DataItem".to_string(),
            layout: Layout::Table(0x10),
        });
        assert_eq!(obj.type_name(), "DataItem");
    }

    #[test]
    fn test_hashable() {
        assert!(Value::Str("k".to_string()).is_hashable());
        assert!(Value::Tuple(vec![1, 2]).is_hashable());
        assert!(!Value::List(Vec::new()).is_hashable());
        assert!(!Value::Dict(Vec::new()).is_hashable());
    }
}
