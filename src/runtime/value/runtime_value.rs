//! Dynamic payload carried through deferred cells
//!
//! `Value` is the unified representation of everything a producer can settle a
//! cell with, and of everything a handler can raise. Values and errors share the
//! same type: an error is just a value that travelled down the rejection path.
//!
//! - Scalars are stored inline
//! - Strings and byte buffers are `Arc`-shared, so fan-out to many waiters is cheap
//! - `clone()` on collections is a deep copy

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Value kind enumeration for type queries and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Empty value
    Unit,
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// Unicode scalar
    Char,
    /// Shared string
    String,
    /// Shared byte buffer
    Bytes,
    /// Fixed-arity tuple
    Tuple,
    /// Dynamic list
    List,
    /// String-keyed dictionary (insertion ordered)
    Dict,
}

impl fmt::Display for ValueKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            ValueKind::Unit => "unit",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Char => "char",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Tuple => "tuple",
            ValueKind::List => "list",
            ValueKind::Dict => "dict",
        };
        f.write_str(name)
    }
}

/// Dynamic value settled into, or raised out of, a deferred cell
///
/// # Design Principles
/// - Uses `enum` for easy pattern matching in handlers
/// - `Arc` for shared text and bytes, the value itself carries no ownership state
/// - The absent value is `Unit`, which is also what a handler returning `()` yields
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Empty value
    #[default]
    Unit,

    /// Boolean
    Bool(bool),

    /// Integer
    Int(i64),

    /// Float
    Float(f64),

    /// Character
    Char(char),

    /// String (shared, Arc<str>)
    String(Arc<str>),

    /// Byte array
    Bytes(Arc<[u8]>),

    /// Tuple
    Tuple(Vec<Value>),

    /// Dynamic list
    List(Vec<Value>),

    /// Dictionary, iteration follows insertion order
    Dict(IndexMap<Arc<str>, Value>),
}

// ============================================================================
// Type Query Methods
// ============================================================================

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unit => ValueKind::Unit,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Char(_) => ValueKind::Char,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::List(_) => ValueKind::List,
            Value::Dict(_) => ValueKind::Dict,
        }
    }

    /// Check if this is the unit value
    #[inline]
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// Convert to bool
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert to i64
    pub fn to_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to f64 (integers widen)
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Borrow as str
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow list or tuple elements
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a dictionary entry
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        match self {
            Value::Dict(map) => map.get(key),
            _ => None,
        }
    }

    /// Build a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Build a list value
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a dictionary value from key/value pairs
    pub fn dict<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Value::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into()))
                .collect(),
        )
    }

    /// Convert a panic payload into a value
    ///
    /// `panic!("...")` payloads are `&'static str` or `String`; anything else
    /// becomes a generic message.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(s) = payload.downcast_ref::<&'static str>() {
            Value::string(s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Value::string(s)
        } else {
            Value::string("handler panicked")
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Arc::from(b))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or_default()
    }
}

impl From<std::io::Error> for Value {
    fn from(e: std::io::Error) -> Self {
        Value::string(e.to_string())
    }
}

impl From<std::num::ParseIntError> for Value {
    fn from(e: std::num::ParseIntError) -> Self {
        Value::string(e.to_string())
    }
}

// ============================================================================
// Serialization
// ============================================================================

impl Serialize for Value {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match self {
            Value::Unit => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Tuple(items) | Value::List(items) => items.serialize(serializer),
            Value::Dict(map) => map.serialize(serializer),
        }
    }
}

// ============================================================================
// Display Implementation
// ============================================================================

fn join(items: &[Value]) -> String {
    items
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "unit"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Char(c) => write!(f, "{}", c),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Value::Tuple(items) => write!(f, "({})", join(items)),
            Value::List(items) => write!(f, "[{}]", join(items)),
            Value::Dict(m) => {
                write!(
                    f,
                    "{{{}}}",
                    m.iter()
                        .map(|(k, v)| format!("{}: {}", k, v))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}
