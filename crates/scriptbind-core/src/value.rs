//! Runtime values on both sides of the adapter boundary.
//!
//! - [`ScriptValue`]: what the scripting runtime passes in and receives back
//!   (nil, boolean, number, string, table).
//! - [`NativeValue`]: what bound native functions consume and produce.
//!
//! The two are bridged by a [`TypeConverter`](crate::TypeConverter).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::ClassRef;

/// A value in the scripting runtime's value model.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScriptValue {
    /// Absent / null-equivalent.
    #[default]
    Nil,
    /// Boolean.
    Boolean(bool),
    /// Number (scripts have a single numeric type).
    Number(f64),
    /// String.
    String(String),
    /// Table (array or dictionary).
    Table(ScriptTable),
}

impl ScriptValue {
    /// Script-facing name of this value's kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Boolean(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Table(_) => "table",
        }
    }

    /// Check if this is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    /// Borrow the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the numeric payload.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the table payload.
    pub fn as_table(&self) -> Option<&ScriptTable> {
        match self {
            ScriptValue::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => f.write_str("nil"),
            ScriptValue::Boolean(b) => write!(f, "{}", b),
            ScriptValue::Number(n) if n.fract() == 0.0 && n.abs() < 2f64.powi(63) => {
                write!(f, "{}", *n as i64)
            }
            ScriptValue::Number(n) if n.fract() == 0.0 => write!(f, "{:.0}", n),
            ScriptValue::Number(n) => write!(f, "{}", n),
            ScriptValue::String(s) => f.write_str(s),
            ScriptValue::Table(t) => write!(f, "table[{}]", t.len()),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(v: bool) -> Self {
        ScriptValue::Boolean(v)
    }
}

impl From<f64> for ScriptValue {
    fn from(v: f64) -> Self {
        ScriptValue::Number(v)
    }
}

impl From<i64> for ScriptValue {
    fn from(v: i64) -> Self {
        ScriptValue::Number(v as f64)
    }
}

impl From<&str> for ScriptValue {
    fn from(v: &str) -> Self {
        ScriptValue::String(v.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(v: String) -> Self {
        ScriptValue::String(v)
    }
}

impl From<ScriptTable> for ScriptValue {
    fn from(v: ScriptTable) -> Self {
        ScriptValue::Table(v)
    }
}

/// A script table with insertion-ordered entries.
///
/// Keys are compared by value; inserting an existing key replaces its value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptTable {
    entries: Vec<(ScriptValue, ScriptValue)>,
}

impl ScriptTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an array-style table with keys `1..=n`.
    pub fn from_sequence(values: impl IntoIterator<Item = ScriptValue>) -> Self {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (ScriptValue::Number((i + 1) as f64), v))
                .collect(),
        }
    }

    /// Insert or replace an entry. Nil keys are ignored.
    pub fn insert(&mut self, key: impl Into<ScriptValue>, value: impl Into<ScriptValue>) {
        let key = key.into();
        if key.is_nil() {
            return;
        }
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<ScriptValue>, value: impl Into<ScriptValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a value by key.
    pub fn get(&self, key: &ScriptValue) -> Option<&ScriptValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a value by string key.
    pub fn get_str(&self, key: &str) -> Option<&ScriptValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ScriptValue, &ScriptValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Interpret the table as a 1-based sequence.
    ///
    /// Returns `None` if the keys are not exactly `1..=len`.
    pub fn sequence(&self) -> Option<Vec<&ScriptValue>> {
        let mut slots: Vec<Option<&ScriptValue>> = vec![None; self.entries.len()];
        for (k, v) in &self.entries {
            let n = k.as_number()?;
            if n.fract() != 0.0 || n < 1.0 || n > self.entries.len() as f64 {
                return None;
            }
            slots[n as usize - 1] = Some(v);
        }
        slots.into_iter().collect()
    }
}

/// A host object carried through the adapter layer.
///
/// Pairs the object's class (for assignability checks) with a shared,
/// type-erased payload.
#[derive(Clone)]
pub struct NativeObject {
    class: ClassRef,
    value: Arc<dyn Any + Send + Sync>,
}

impl NativeObject {
    /// Wrap `value` as an instance of `class`.
    pub fn new<T: Any + Send + Sync>(class: ClassRef, value: T) -> Self {
        Self {
            class,
            value: Arc::new(value),
        }
    }

    /// Wrap an already shared payload.
    pub fn from_arc(class: ClassRef, value: Arc<dyn Any + Send + Sync>) -> Self {
        Self { class, value }
    }

    /// The object's class.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Borrow the payload as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether both handles share the same payload.
    pub fn ptr_eq(&self, other: &NativeObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeObject({})", self.class.name())
    }
}

/// A value on the native side of the boundary.
#[derive(Debug, Clone, Default)]
pub enum NativeValue {
    /// Null / no value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer (all widths stored as i64).
    Int(i64),
    /// Floating point (all widths stored as f64).
    Float(f64),
    /// Owned string.
    String(String),
    /// Array (also the shape of collected variadic arguments).
    Array(Vec<NativeValue>),
    /// Ordered or unordered collection.
    List(Vec<NativeValue>),
    /// Key/value pairs.
    Map(Vec<(NativeValue, NativeValue)>),
    /// Host object.
    Object(NativeObject),
    /// Explicit multi-value result.
    Multi(Vec<NativeValue>),
}

impl NativeValue {
    /// Human-readable name for this value's kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "bool",
            NativeValue::Int(_) => "int",
            NativeValue::Float(_) => "float",
            NativeValue::String(_) => "string",
            NativeValue::Array(_) => "array",
            NativeValue::List(_) => "list",
            NativeValue::Map(_) => "map",
            NativeValue::Object(_) => "object",
            NativeValue::Multi(_) => "multi",
        }
    }

    /// Check if this is null.
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Create an explicit multi-value result.
    pub fn multi(values: impl IntoIterator<Item = NativeValue>) -> Self {
        NativeValue::Multi(values.into_iter().collect())
    }

    /// Borrow the object payload, if this is an object.
    pub fn as_object(&self) -> Option<&NativeObject> {
        match self {
            NativeValue::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NativeValue::Null, NativeValue::Null) => true,
            (NativeValue::Bool(a), NativeValue::Bool(b)) => a == b,
            (NativeValue::Int(a), NativeValue::Int(b)) => a == b,
            (NativeValue::Float(a), NativeValue::Float(b)) => a == b,
            (NativeValue::String(a), NativeValue::String(b)) => a == b,
            (NativeValue::Array(a), NativeValue::Array(b)) => a == b,
            (NativeValue::List(a), NativeValue::List(b)) => a == b,
            (NativeValue::Map(a), NativeValue::Map(b)) => a == b,
            (NativeValue::Multi(a), NativeValue::Multi(b)) => a == b,
            // Objects compare by identity
            (NativeValue::Object(a), NativeValue::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_value_type_names() {
        assert_eq!(ScriptValue::Nil.type_name(), "nil");
        assert_eq!(ScriptValue::from(true).type_name(), "boolean");
        assert_eq!(ScriptValue::from(1.5).type_name(), "number");
        assert_eq!(ScriptValue::from("x").type_name(), "string");
        assert_eq!(ScriptValue::from(ScriptTable::new()).type_name(), "table");
    }

    #[test]
    fn script_value_display() {
        assert_eq!(ScriptValue::Number(3.0).to_string(), "3");
        assert_eq!(ScriptValue::Number(2.5).to_string(), "2.5");
        assert_eq!(ScriptValue::Number(1e20).to_string(), "100000000000000000000");
        assert_eq!(ScriptValue::Number(-1e20).to_string(), "-100000000000000000000");
        assert_eq!(ScriptValue::Number(f64::INFINITY).to_string(), "inf");
        assert_eq!(ScriptValue::from("abc").to_string(), "abc");
        assert_eq!(ScriptValue::Nil.to_string(), "nil");
    }

    #[test]
    fn table_insert_replaces_existing_key() {
        let mut t = ScriptTable::new();
        t.insert("a", 1.0);
        t.insert("a", 2.0);
        t.insert(ScriptValue::Nil, 3.0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get_str("a"), Some(&ScriptValue::Number(2.0)));
    }

    #[test]
    fn table_sequence_roundtrip() {
        let t = ScriptTable::from_sequence(vec![ScriptValue::from("x"), ScriptValue::from("y")]);
        let seq = t.sequence().unwrap();
        assert_eq!(seq, vec![&ScriptValue::from("x"), &ScriptValue::from("y")]);
    }

    #[test]
    fn table_sequence_accepts_out_of_order_keys() {
        let t = ScriptTable::new().with(2i64, "b").with(1i64, "a");
        let seq = t.sequence().unwrap();
        assert_eq!(seq[0], &ScriptValue::from("a"));
        assert_eq!(seq[1], &ScriptValue::from("b"));
    }

    #[test]
    fn table_sequence_rejects_gaps_and_strings() {
        assert!(ScriptTable::new().with(1i64, "a").with(3i64, "c").sequence().is_none());
        assert!(ScriptTable::new().with("k", "v").sequence().is_none());
        assert_eq!(ScriptTable::new().sequence(), Some(vec![]));
    }

    #[test]
    fn native_object_downcast() {
        let class = ClassRef::new("Counter");
        let obj = NativeObject::new(class, 41u32);
        assert_eq!(obj.downcast_ref::<u32>(), Some(&41));
        assert!(obj.downcast_ref::<String>().is_none());
        assert_eq!(obj.class().name(), "Counter");
    }

    #[test]
    fn native_objects_compare_by_identity() {
        let class = ClassRef::new("Counter");
        let a = NativeValue::Object(NativeObject::new(class.clone(), 1u32));
        let b = NativeValue::Object(NativeObject::new(class, 1u32));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn native_value_multi() {
        let m = NativeValue::multi([NativeValue::Int(1), NativeValue::Int(2)]);
        assert_eq!(m.type_name(), "multi");
        assert_eq!(m, NativeValue::Multi(vec![NativeValue::Int(1), NativeValue::Int(2)]));
    }
}
