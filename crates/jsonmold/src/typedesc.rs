//! Type descriptors consumed by the parser.
//!
//! A [`TypeDesc`] describes the shape the parser must materialise: a
//! primitive tag, a container (map, record, array, tuple), a union of
//! alternatives, or a named reference to another descriptor. Descriptors are
//! immutable and shared through [`TypeRef`]; the parser only ever inspects
//! them.

use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::fmt;

use crate::value::Value;

/// Shared handle to a type descriptor.
pub type TypeRef = Arc<TypeDesc>;

/// A type descriptor.
///
/// The numeric family (`Int`, the sized signed/unsigned variants, and
/// `Byte`) all lex as 64-bit signed integers; the sized tags exist so that
/// schemas can carry them through and distinguish them on inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    Int,
    Signed8,
    Signed16,
    Signed32,
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Byte,
    Float,
    Decimal,
    String,
    Boolean,
    Null,
    /// The open JSON type: accepts any JSON value.
    Json,
    Map(MapDesc),
    Record(RecordDesc),
    Array(ArrayDesc),
    Tuple(TupleDesc),
    Union(UnionDesc),
    /// A named alias for another descriptor. Stripped by [`implied_type`].
    Ref(RefDesc),
}

/// `map<constraint>`: every member value has the constrained type.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDesc {
    pub constraint: TypeRef,
}

/// One declared record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    pub name: String,
    pub ty: TypeRef,
    pub required: bool,
    /// Inserted when the input omits an optional field.
    pub default: Option<Value>,
}

/// A record type: ordered declared fields, an optional rest field type, and
/// a read-only flag. A record with no rest field type is *sealed*: input
/// fields outside the declared set are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDesc {
    pub name: String,
    pub fields: Vec<FieldDesc>,
    pub rest: Option<TypeRef>,
    pub readonly: bool,
}

impl RecordDesc {
    /// Starts a record definition; finish with [`RecordDesc::build`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            rest: None,
            readonly: false,
        }
    }

    /// Adds a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
            required: true,
            default: None,
        });
        self
    }

    /// Adds an optional field without a default; it stays absent when the
    /// input omits it.
    #[must_use]
    pub fn optional_field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
            required: false,
            default: None,
        });
        self
    }

    /// Adds an optional field with a default value.
    #[must_use]
    pub fn defaulted_field(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        default: Value,
    ) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
            required: false,
            default: Some(default),
        });
        self
    }

    /// Opens the record to undeclared fields of the given type.
    #[must_use]
    pub fn rest(mut self, ty: TypeRef) -> Self {
        self.rest = Some(ty);
        self
    }

    /// Marks the record read-only; materialised values are frozen.
    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn build(self) -> TypeRef {
        Arc::new(TypeDesc::Record(self))
    }

    /// Looks up a declared field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn sealed(&self) -> bool {
        self.rest.is_none()
    }
}

/// Whether an array type has a fixed declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayState {
    Open,
    Closed(usize),
}

/// An array type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDesc {
    pub elem: TypeRef,
    pub state: ArrayState,
    /// Whether the element type has a filler value, so a closed array may be
    /// completed from fewer input elements.
    pub has_filler: bool,
}

impl ArrayDesc {
    pub fn size(&self) -> Option<usize> {
        match self.state {
            ArrayState::Open => None,
            ArrayState::Closed(n) => Some(n),
        }
    }
}

/// A tuple type: fixed member types plus an optional rest element type for
/// indices beyond the declared length.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleDesc {
    pub members: Vec<TypeRef>,
    pub rest: Option<TypeRef>,
}

/// A union of alternatives, tried in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDesc {
    pub members: Vec<TypeRef>,
}

/// A named alias.
#[derive(Debug, Clone, PartialEq)]
pub struct RefDesc {
    pub name: String,
    pub target: TypeRef,
}

impl TypeDesc {
    pub fn int() -> TypeRef {
        Arc::new(TypeDesc::Int)
    }

    pub fn float() -> TypeRef {
        Arc::new(TypeDesc::Float)
    }

    pub fn decimal() -> TypeRef {
        Arc::new(TypeDesc::Decimal)
    }

    pub fn string() -> TypeRef {
        Arc::new(TypeDesc::String)
    }

    pub fn boolean() -> TypeRef {
        Arc::new(TypeDesc::Boolean)
    }

    pub fn null() -> TypeRef {
        Arc::new(TypeDesc::Null)
    }

    pub fn json() -> TypeRef {
        Arc::new(TypeDesc::Json)
    }

    pub fn map_of(constraint: TypeRef) -> TypeRef {
        Arc::new(TypeDesc::Map(MapDesc { constraint }))
    }

    /// An open array of `elem`.
    pub fn array_of(elem: TypeRef) -> TypeRef {
        Arc::new(TypeDesc::Array(ArrayDesc {
            elem,
            state: ArrayState::Open,
            has_filler: false,
        }))
    }

    /// A closed array of `size` elements. The filler flag is derived from
    /// the element type.
    pub fn closed_array(elem: TypeRef, size: usize) -> TypeRef {
        let has_filler = crate::value::filler_value(&elem).is_some();
        Arc::new(TypeDesc::Array(ArrayDesc {
            elem,
            state: ArrayState::Closed(size),
            has_filler,
        }))
    }

    pub fn tuple(members: Vec<TypeRef>, rest: Option<TypeRef>) -> TypeRef {
        Arc::new(TypeDesc::Tuple(TupleDesc { members, rest }))
    }

    pub fn union(members: Vec<TypeRef>) -> TypeRef {
        Arc::new(TypeDesc::Union(UnionDesc { members }))
    }

    pub fn reference(name: impl Into<String>, target: TypeRef) -> TypeRef {
        Arc::new(TypeDesc::Ref(RefDesc {
            name: name.into(),
            target,
        }))
    }

    /// Whether a JSON string is acceptable at a position of this type.
    pub fn accepts_string(&self) -> bool {
        match self {
            TypeDesc::String | TypeDesc::Json => true,
            TypeDesc::Union(u) => u.members.iter().any(|m| implied_type(m).accepts_string()),
            TypeDesc::Ref(r) => r.target.accepts_string(),
            _ => false,
        }
    }
}

/// Canonical form of a descriptor: follows reference chains to the
/// underlying type.
pub fn implied_type(ty: &TypeRef) -> TypeRef {
    let mut cur = ty.clone();
    while let TypeDesc::Ref(r) = &*cur {
        cur = r.target.clone();
    }
    cur
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Int => f.write_str("int"),
            TypeDesc::Signed8 => f.write_str("int8"),
            TypeDesc::Signed16 => f.write_str("int16"),
            TypeDesc::Signed32 => f.write_str("int32"),
            TypeDesc::Unsigned8 => f.write_str("uint8"),
            TypeDesc::Unsigned16 => f.write_str("uint16"),
            TypeDesc::Unsigned32 => f.write_str("uint32"),
            TypeDesc::Byte => f.write_str("byte"),
            TypeDesc::Float => f.write_str("float"),
            TypeDesc::Decimal => f.write_str("decimal"),
            TypeDesc::String => f.write_str("string"),
            TypeDesc::Boolean => f.write_str("boolean"),
            TypeDesc::Null => f.write_str("null"),
            TypeDesc::Json => f.write_str("json"),
            TypeDesc::Map(m) => write!(f, "map<{}>", m.constraint),
            TypeDesc::Record(r) => f.write_str(&r.name),
            TypeDesc::Array(a) => match a.state {
                ArrayState::Open => write!(f, "{}[]", a.elem),
                ArrayState::Closed(n) => write!(f, "{}[{n}]", a.elem),
            },
            TypeDesc::Tuple(t) => {
                f.write_str("[")?;
                for (i, m) in t.members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{m}")?;
                }
                if let Some(rest) = &t.rest {
                    if !t.members.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "{rest}...")?;
                }
                f.write_str("]")
            }
            TypeDesc::Union(u) => {
                for (i, m) in u.members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            TypeDesc::Ref(r) => f.write_str(&r.name),
        }
    }
}

impl TypeDesc {
    pub(crate) fn type_name(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_type_strips_reference_chains() {
        let base = TypeDesc::int();
        let once = TypeDesc::reference("Meters", base.clone());
        let twice = TypeDesc::reference("Distance", once);
        assert_eq!(*implied_type(&twice), TypeDesc::Int);
    }

    #[test]
    fn accepts_string_through_unions_and_refs() {
        assert!(TypeDesc::string().accepts_string());
        assert!(TypeDesc::json().accepts_string());
        assert!(!TypeDesc::int().accepts_string());

        let u = TypeDesc::union(alloc::vec![TypeDesc::int(), TypeDesc::string()]);
        assert!(u.accepts_string());

        let r = TypeDesc::reference("S", TypeDesc::string());
        assert!(r.accepts_string());
        let no = TypeDesc::union(alloc::vec![TypeDesc::int(), TypeDesc::boolean()]);
        assert!(!no.accepts_string());
    }

    #[test]
    fn display_names() {
        assert_eq!(TypeDesc::map_of(TypeDesc::string()).to_string(), "map<string>");
        assert_eq!(TypeDesc::closed_array(TypeDesc::int(), 4).to_string(), "int[4]");
        let t = TypeDesc::tuple(
            alloc::vec![TypeDesc::int(), TypeDesc::string()],
            Some(TypeDesc::boolean()),
        );
        assert_eq!(t.to_string(), "[int, string, boolean...]");
        let u = TypeDesc::union(alloc::vec![TypeDesc::int(), TypeDesc::null()]);
        assert_eq!(u.to_string(), "int|null");
    }

    #[test]
    fn sealed_record_lookup() {
        let rec = RecordDesc::new("Point")
            .field("x", TypeDesc::int())
            .optional_field("y", TypeDesc::int());
        assert!(rec.sealed());
        assert!(rec.get_field("x").is_some());
        assert!(rec.get_field("z").is_none());
    }
}
