//! Conversion between lexed text, generic JSON values, and target types.
//!
//! Two conversion surfaces exist. [`convert_lexeme`] turns the raw text of a
//! non-string lexeme directly into a primitive of the target type while the
//! parse is running. [`convert_value`] converts an already-materialised
//! value to a target type; union finalisation uses it to commit a staged
//! container to the first viable branch.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};

use crate::{
    error::ParseErrorKind,
    typedesc::{implied_type, ArrayState, RecordDesc, TypeDesc, TypeRef},
    value::{ListValue, MapValue, Value},
};

/// Converts the text of a non-string lexeme to a primitive of the target
/// type. The int family and byte parse as 64-bit signed integers; decimal
/// parses exactly; a string target always fails since strings must arrive
/// quoted.
pub(crate) fn convert_lexeme(target: &TypeDesc, lexeme: &str) -> Result<Value, ParseErrorKind> {
    match target {
        TypeDesc::Int
        | TypeDesc::Signed8
        | TypeDesc::Signed16
        | TypeDesc::Signed32
        | TypeDesc::Unsigned8
        | TypeDesc::Unsigned16
        | TypeDesc::Unsigned32
        | TypeDesc::Byte => lexeme
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| unrecognized(lexeme)),
        TypeDesc::Decimal => lexeme
            .parse::<BigDecimal>()
            .map(Value::Decimal)
            .map_err(|_| unrecognized(lexeme)),
        TypeDesc::Float => lexeme
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| unrecognized(lexeme)),
        TypeDesc::Boolean => match lexeme {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(unrecognized(lexeme)),
        },
        TypeDesc::Null => {
            if lexeme == "null" {
                Ok(Value::Null)
            } else {
                Err(unrecognized(lexeme))
            }
        }
        TypeDesc::String => Err(ParseErrorKind::NotAString),
        TypeDesc::Json => infer_json(lexeme),
        TypeDesc::Union(u) => {
            for member in &u.members {
                if let Ok(value) = convert_lexeme(&implied_type(member), lexeme) {
                    return Ok(value);
                }
            }
            Err(ParseErrorKind::NoMatchingType)
        }
        TypeDesc::Ref(r) => convert_lexeme(&implied_type(&r.target), lexeme),
        other => Err(ParseErrorKind::CannotConvert(other.type_name())),
    }
}

/// Generic JSON inference for a non-string lexeme, used when the target is
/// the open `json` type or a union staging frame.
///
/// A fractional lexeme is a decimal, except that a negative zero is a float.
/// Exponential integers are decimals; everything else numeric is a 64-bit
/// int.
pub(crate) fn infer_json(lexeme: &str) -> Result<Value, ParseErrorKind> {
    if lexeme.is_empty() {
        return Err(unrecognized(lexeme));
    }
    if lexeme.contains('.') {
        return if is_negative_zero(lexeme) {
            lexeme
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| unrecognized(lexeme))
        } else {
            lexeme
                .parse::<BigDecimal>()
                .map(Value::Decimal)
                .map_err(|_| unrecognized(lexeme))
        };
    }
    match lexeme {
        "true" => return Ok(Value::Boolean(true)),
        "false" => return Ok(Value::Boolean(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }
    if is_negative_zero(lexeme) {
        lexeme
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| unrecognized(lexeme))
    } else if lexeme.contains(['e', 'E']) {
        lexeme
            .parse::<BigDecimal>()
            .map(Value::Decimal)
            .map_err(|_| unrecognized(lexeme))
    } else {
        lexeme
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| unrecognized(lexeme))
    }
}

fn is_negative_zero(lexeme: &str) -> bool {
    lexeme.starts_with('-') && lexeme.parse::<f64>().is_ok_and(|v| v == 0.0)
}

fn unrecognized(lexeme: &str) -> ParseErrorKind {
    ParseErrorKind::UnrecognizedToken(lexeme.into())
}

/// Converts a materialised value to the target type.
///
/// Primitives convert by tag, unions try members in declared order, and
/// containers convert structurally with the same required-field, arity, and
/// size rules the parser applies at finalisation.
pub fn convert_value(target: &TypeRef, value: &Value) -> Result<Value, ParseErrorKind> {
    let target = implied_type(target);
    match &*target {
        TypeDesc::Int
        | TypeDesc::Signed8
        | TypeDesc::Signed16
        | TypeDesc::Signed32
        | TypeDesc::Unsigned8
        | TypeDesc::Unsigned16
        | TypeDesc::Unsigned32
        | TypeDesc::Byte => match value {
            Value::Int(i) => Ok(Value::Int(*i)),
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Float => match value {
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Float(f) => Ok(Value::Float(*f)),
            Value::Decimal(d) => d
                .to_f64()
                .map(Value::Float)
                .ok_or_else(|| cannot_convert(&target)),
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Decimal => match value {
            Value::Int(i) => Ok(Value::Decimal(BigDecimal::from(*i))),
            Value::Float(f) => BigDecimal::from_f64(*f)
                .map(Value::Decimal)
                .ok_or_else(|| cannot_convert(&target)),
            Value::Decimal(d) => Ok(Value::Decimal(d.clone())),
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::String => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Boolean => match value {
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Null => match value {
            Value::Null => Ok(Value::Null),
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Json => Ok(value.clone()),
        TypeDesc::Union(u) => {
            for member in &u.members {
                if let Ok(converted) = convert_value(member, value) {
                    return Ok(converted);
                }
            }
            Err(cannot_convert(&target))
        }
        TypeDesc::Map(m) => match value {
            Value::Map(src) => {
                let mut out = MapValue::new(target.clone());
                for (key, entry) in src.entries() {
                    out.put_forcefully(key.clone(), convert_value(&m.constraint, entry)?);
                }
                Ok(Value::Map(out))
            }
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Record(r) => match value {
            Value::Map(src) => {
                let not_provided = missing_field_names(r, src)?;
                let mut out = build_record_with_defaults(&target, r, &not_provided);
                for (key, entry) in src.entries() {
                    let field_ty = match r.get_field(key) {
                        Some(field) => field.ty.clone(),
                        None => match &r.rest {
                            Some(rest) => rest.clone(),
                            None => {
                                return Err(ParseErrorKind::ClosedRecordField {
                                    field: key.clone(),
                                    record: r.name.clone(),
                                })
                            }
                        },
                    };
                    out.put_forcefully(key.clone(), convert_value(&field_ty, entry)?);
                }
                if r.readonly {
                    out.freeze();
                }
                Ok(Value::Map(out))
            }
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Array(a) => match value {
            Value::List(src) => {
                if let ArrayState::Closed(size) = a.state {
                    if src.len() > size {
                        return Err(ParseErrorKind::ArraySizeNotEnough);
                    }
                    if src.len() < size && !a.has_filler {
                        return Err(ParseErrorKind::ArrayWithoutFiller);
                    }
                }
                let mut out = ListValue::new(target.clone());
                for (i, item) in src.items().iter().enumerate() {
                    out.set(i, convert_value(&a.elem, item)?);
                }
                Ok(Value::List(out))
            }
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Tuple(t) => match value {
            Value::List(src) => {
                if src.len() < t.members.len() {
                    return Err(ParseErrorKind::TupleSizeTooLarge);
                }
                let mut out = ListValue::new(target.clone());
                for (i, item) in src.items().iter().enumerate() {
                    let member_ty = match t.members.get(i) {
                        Some(member) => member.clone(),
                        None => match &t.rest {
                            Some(rest) => rest.clone(),
                            None => return Err(ParseErrorKind::TupleSizeNotEnough),
                        },
                    };
                    out.set(i, convert_value(&member_ty, item)?);
                }
                Ok(Value::List(out))
            }
            _ => Err(cannot_convert(&target)),
        },
        TypeDesc::Ref(_) => unreachable!("implied_type strips references"),
    }
}

/// Materialises a map-shaped record value holding the declared defaults of
/// the listed not-provided fields. Fields without a declared default stay
/// absent.
pub fn record_value_with_defaults(
    record: &TypeRef,
    not_provided: &[String],
) -> Result<MapValue, ParseErrorKind> {
    let target = implied_type(record);
    match &*target {
        TypeDesc::Record(r) => Ok(build_record_with_defaults(&target, r, not_provided)),
        _ => Err(ParseErrorKind::NotMapOrRecord),
    }
}

pub(crate) fn build_record_with_defaults(
    ty: &TypeRef,
    record: &RecordDesc,
    not_provided: &[String],
) -> MapValue {
    let mut out = MapValue::new(ty.clone());
    for name in not_provided {
        if let Some(field) = record.get_field(name) {
            if let Some(default) = &field.default {
                out.put_forcefully(name.clone(), default.clone());
            }
        }
    }
    out
}

/// Names of declared fields absent from the supplied map; errs on a missing
/// required field.
pub(crate) fn missing_field_names(
    record: &RecordDesc,
    supplied: &MapValue,
) -> Result<Vec<String>, ParseErrorKind> {
    let mut not_provided = Vec::new();
    for field in &record.fields {
        if supplied.contains_key(&field.name) {
            continue;
        }
        if field.required {
            return Err(ParseErrorKind::MissingRequiredField {
                field: field.name.clone(),
                field_type: field.ty.to_string(),
                record: record.name.clone(),
            });
        }
        not_provided.push(field.name.clone());
    }
    Ok(not_provided)
}

fn cannot_convert(target: &TypeRef) -> ParseErrorKind {
    ParseErrorKind::CannotConvert(target.to_string())
}
