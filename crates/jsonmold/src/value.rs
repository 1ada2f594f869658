//! Typed values materialised by the parser.
//!
//! [`Value`] covers the primitive tags plus two container shapes:
//! [`MapValue`] backs both maps and records (and the generic staging map
//! used while a union target is still being narrowed), and [`ListValue`]
//! backs arrays and tuples. Containers remember the descriptor they were
//! allocated for.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use bigdecimal::BigDecimal;

use crate::typedesc::{implied_type, ArrayState, TypeDesc, TypeRef};

/// A value produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    List(ListValue),
    Map(MapValue),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        if let Self::Map(m) = self {
            Some(m)
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&ListValue> {
        if let Self::List(l) = self {
            Some(l)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }
}

/// Map-shaped container for `map<T>`, records, and union staging frames.
///
/// Entries are mutated through [`MapValue::put_forcefully`] during
/// construction, which bypasses the frozen flag; [`MapValue::freeze`] seals
/// a read-only record once it is fully materialised.
#[derive(Debug, Clone)]
pub struct MapValue {
    ty: TypeRef,
    entries: BTreeMap<String, Value>,
    frozen: bool,
}

impl MapValue {
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            entries: BTreeMap::new(),
            frozen: false,
        }
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Inserts regardless of the frozen flag.
    pub fn put_forcefully(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, Value> {
        self.entries
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

// Equality is structural; the descriptor and the frozen flag do not
// participate.
impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// List-shaped container for arrays and tuples.
///
/// A closed array whose element type has a filler value is pre-filled to its
/// declared size; input elements overwrite fillers in order.
#[derive(Debug, Clone)]
pub struct ListValue {
    ty: TypeRef,
    items: Vec<Value>,
}

impl ListValue {
    pub fn new(ty: TypeRef) -> Self {
        let items = match &*ty {
            TypeDesc::Array(a) => match a.state {
                ArrayState::Closed(size) if a.has_filler => {
                    let filler = filler_value(&a.elem).unwrap_or(Value::Null);
                    let mut items = Vec::with_capacity(size);
                    items.resize(size, filler);
                    items
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { ty, items }
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Stores `value` at `index`, overwriting a pre-filled slot or appending
    /// at the end.
    pub fn set(&mut self, index: usize, value: Value) {
        if index < self.items.len() {
            self.items[index] = value;
        } else {
            self.items.push(value);
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl PartialEq for ListValue {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

/// The filler value of a type, used to complete closed arrays and to judge
/// whether an array type has fillers at all.
pub fn filler_value(ty: &TypeRef) -> Option<Value> {
    match &*implied_type(ty) {
        TypeDesc::Int
        | TypeDesc::Signed8
        | TypeDesc::Signed16
        | TypeDesc::Signed32
        | TypeDesc::Unsigned8
        | TypeDesc::Unsigned16
        | TypeDesc::Unsigned32
        | TypeDesc::Byte => Some(Value::Int(0)),
        TypeDesc::Float => Some(Value::Float(0.0)),
        TypeDesc::Decimal => Some(Value::Decimal(BigDecimal::from(0))),
        TypeDesc::String => Some(Value::String(String::new())),
        TypeDesc::Boolean => Some(Value::Boolean(false)),
        TypeDesc::Null | TypeDesc::Json => Some(Value::Null),
        TypeDesc::Map(_) => Some(Value::Map(MapValue::new(implied_type(ty)))),
        TypeDesc::Record(r) => {
            if r.fields.iter().any(|f| f.required) {
                return None;
            }
            let mut map = MapValue::new(implied_type(ty));
            for field in &r.fields {
                if let Some(default) = &field.default {
                    map.put_forcefully(field.name.clone(), default.clone());
                }
            }
            Some(Value::Map(map))
        }
        TypeDesc::Array(a) => match a.state {
            ArrayState::Open => Some(Value::List(ListValue::new(implied_type(ty)))),
            ArrayState::Closed(_) if a.has_filler => {
                Some(Value::List(ListValue::new(implied_type(ty))))
            }
            ArrayState::Closed(_) => None,
        },
        TypeDesc::Tuple(t) => {
            let mut items = Vec::with_capacity(t.members.len());
            for member in &t.members {
                items.push(filler_value(member)?);
            }
            let mut list = ListValue::new(implied_type(ty));
            for (i, item) in items.into_iter().enumerate() {
                list.set(i, item);
            }
            Some(Value::List(list))
        }
        TypeDesc::Union(u) => {
            if u.members
                .iter()
                .any(|m| matches!(&*implied_type(m), TypeDesc::Null))
            {
                Some(Value::Null)
            } else {
                None
            }
        }
        TypeDesc::Ref(_) => unreachable!("implied_type strips references"),
    }
}

/// Escapes control characters in a string for inclusion in a JSON string
/// literal.
pub(crate) fn write_escaped_string<W: fmt::Write>(src: &str, f: &mut W) -> fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\u{2028}' | '\u{2029}' => write!(f, "\\u{:04X}", c as u32)?,
            c if c.is_ascii_control() || c.is_control() && (c as u32) <= 0xFFFF => {
                write!(f, "\\u{:04X}", c as u32)?;
            }
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

fn write_decimal<W: fmt::Write>(d: &BigDecimal, f: &mut W) -> fmt::Result {
    let text = d.to_string();
    // A bare integer rendering would reparse as int; keep a fraction so the
    // lexeme stays in the decimal lane.
    if text.contains(['.', 'e', 'E']) {
        f.write_str(&text)
    } else {
        write!(f, "{text}.0")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(n) => f.write_str(&n.to_string()),
            Value::Decimal(d) => write_decimal(d, f),
            Value::String(s) => {
                f.write_str("\"")?;
                write_escaped_string(s, f)?;
                f.write_str("\"")
            }
            Value::List(list) => {
                f.write_str("[")?;
                for (i, item) in list.items().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.entries().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("\"")?;
                    write_escaped_string(key, f)?;
                    write!(f, "\":{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list.items() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut entries = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.entries() {
                    entries.serialize_entry(key, value)?;
                }
                entries.end()
            }
        }
    }
}
