//! Type-directed construction: the stack discipline behind container opens,
//! field names, value attachment, and container finalisation.
//!
//! A frame exists per open container. `target_types` always holds one entry
//! per frame plus the caller's root target; `list_indices` holds one entry
//! per open array or tuple; `possible_types` one entry per open union
//! staging frame; `field_names` one entry per object entry whose value is
//! still pending.

use alloc::{string::String, vec::Vec};

use super::{LexemeKind, State, StateMachine, StringCtx};
use crate::{
    convert::{build_record_with_defaults, convert_lexeme, convert_value, infer_json,
        missing_field_names},
    error::{ParseError, ParseErrorKind},
    typedesc::{implied_type, ArrayState, TypeDesc, TypeRef, UnionDesc},
    value::{ListValue, MapValue, Value},
};

/// Which kind of container is being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl StateMachine {
    // ------------------------------------------------------------------
    // Stack accessors. The grammar guarantees the stacks are non-empty at
    // every call site; a violation is a parser bug, not an input error.
    // ------------------------------------------------------------------

    fn last_target(&self) -> TypeRef {
        match self.target_types.last() {
            Some(target) => target.clone(),
            None => unreachable!("target stack holds the root target for the whole parse"),
        }
    }

    fn last_list_index(&self) -> usize {
        match self.list_indices.last() {
            Some(index) => *index,
            None => unreachable!("array element processed with no open list frame"),
        }
    }

    fn bump_list_index(&mut self) {
        match self.list_indices.last_mut() {
            Some(index) => *index += 1,
            None => unreachable!("array element processed with no open list frame"),
        }
    }

    fn pop_list_index(&mut self) -> usize {
        match self.list_indices.pop() {
            Some(index) => index,
            None => unreachable!("list frame closed with no open list frame"),
        }
    }

    fn pop_field_name(&mut self) -> String {
        match self.field_names.pop() {
            Some(name) => name,
            None => unreachable!("field value attached with no pending field name"),
        }
    }

    fn last_field_name(&self) -> String {
        match self.field_names.last() {
            Some(name) => name.clone(),
            None => unreachable!("field looked up with no pending field name"),
        }
    }

    fn current_map_mut(&mut self) -> &mut MapValue {
        match &mut self.current_node {
            Some(Value::Map(map)) => map,
            _ => unreachable!("current node is map-shaped inside object states"),
        }
    }

    fn current_list_mut(&mut self) -> &mut ListValue {
        match &mut self.current_node {
            Some(Value::List(list)) => list,
            _ => unreachable!("current node is list-shaped inside array states"),
        }
    }

    // ------------------------------------------------------------------
    // Field names
    // ------------------------------------------------------------------

    /// Dispatches the end of a string lexeme to the action its context
    /// demands, returning the follow-up state.
    pub(super) fn end_string_lexeme(&mut self, ctx: StringCtx) -> Result<State, ParseError> {
        match ctx {
            StringCtx::FieldName => self.end_field_name(),
            StringCtx::StringValue => self.attach_root_string(),
            StringCtx::StringFieldValue => self.attach_string_field(),
            StringCtx::StringArrayElement => self.attach_string_element(),
        }
    }

    /// Records the lexed field name and validates it against the parent
    /// target: sealed records reject unknown fields, union staging frames
    /// narrow their candidate set.
    fn end_field_name(&mut self) -> Result<State, ParseError> {
        let name = self.take_lexeme();
        self.field_names.push(name);

        let target = self.last_target();
        match &*target {
            TypeDesc::Record(record) => {
                let name = self.last_field_name();
                if record.get_field(&name).is_none() && record.sealed() {
                    return Err(self.error(ParseErrorKind::ClosedRecordField {
                        field: name,
                        record: record.name.clone(),
                    }));
                }
            }
            TypeDesc::Union(_) => {
                let name = self.last_field_name();
                let candidates = match self.possible_types.last() {
                    Some(candidates) => candidates,
                    None => unreachable!("union staging frame carries candidates"),
                };
                let mut retained: Vec<TypeRef> = Vec::new();
                for candidate in candidates {
                    match &**candidate {
                        TypeDesc::Map(_) => retained.push(candidate.clone()),
                        TypeDesc::Record(record) => {
                            if record.get_field(&name).is_some() || !record.sealed() {
                                retained.push(candidate.clone());
                            }
                        }
                        _ => {}
                    }
                }
                if retained.is_empty() {
                    return Err(self.error(ParseErrorKind::NoEligibleTypes));
                }
                if let Some(slot) = self.possible_types.last_mut() {
                    *slot = retained;
                }
            }
            // Maps and json accept any field name.
            _ => {}
        }
        Ok(State::EndFieldName)
    }

    // ------------------------------------------------------------------
    // String values
    // ------------------------------------------------------------------

    fn attach_root_string(&mut self) -> Result<State, ParseError> {
        let target = self.last_target();
        if !target.accepts_string() {
            return Err(self.error(ParseErrorKind::RootNotString));
        }
        let value = self.take_lexeme();
        self.current_node = Some(Value::String(value));
        Ok(State::DocEnd)
    }

    fn attach_string_field(&mut self) -> Result<State, ParseError> {
        let target = self.last_target();
        match &*target {
            TypeDesc::Map(map) => {
                if !implied_type(&map.constraint).accepts_string() {
                    return Err(self.error(ParseErrorKind::MapValueNotString));
                }
            }
            TypeDesc::Record(record) => {
                let name = self.last_field_name();
                let field_ty = record
                    .get_field(&name)
                    .map(|field| field.ty.clone())
                    .or_else(|| record.rest.clone());
                match field_ty {
                    Some(ty) if implied_type(&ty).accepts_string() => {}
                    _ => return Err(self.error(ParseErrorKind::RecordFieldNotString)),
                }
            }
            TypeDesc::Json => {}
            _ => return Err(self.error(ParseErrorKind::NotMapString)),
        }
        let name = self.pop_field_name();
        let value = self.take_lexeme();
        self.current_map_mut()
            .put_forcefully(name, Value::String(value));
        Ok(State::FieldEnd)
    }

    fn attach_string_element(&mut self) -> Result<State, ParseError> {
        let index = self.last_list_index();
        let target = self.last_target();
        match &*target {
            TypeDesc::Array(array) => {
                if let ArrayState::Closed(size) = array.state {
                    if size <= index {
                        return Err(self.error(ParseErrorKind::ArraySizeNotEnough));
                    }
                }
                if !implied_type(&array.elem).accepts_string() {
                    return Err(self.error(ParseErrorKind::ArrayElementNotString));
                }
            }
            TypeDesc::Tuple(tuple) => {
                let elem = tuple
                    .members
                    .get(index)
                    .cloned()
                    .or_else(|| tuple.rest.clone());
                let elem = match elem {
                    Some(elem) => elem,
                    None => return Err(self.error(ParseErrorKind::TupleSizeNotEnough)),
                };
                if !implied_type(&elem).accepts_string() {
                    return Err(self.error(ParseErrorKind::TupleElementNotString));
                }
            }
            TypeDesc::Json => {}
            _ => return Err(self.error(ParseErrorKind::ListElementNotString)),
        }
        let value = self.take_lexeme();
        self.current_list_mut().set(index, Value::String(value));
        self.bump_list_index();
        Ok(State::ArrayElementEnd)
    }

    // ------------------------------------------------------------------
    // Container opens
    // ------------------------------------------------------------------

    pub(super) fn open_object(&mut self) -> Result<State, ParseError> {
        if let Some(node) = self.current_node.take() {
            self.nodes.push(node);
            self.push_child_target(Container::Object)?;
        }
        let target = self.last_target();
        match &*target {
            TypeDesc::Map(_) | TypeDesc::Record(_) => {
                self.current_node = Some(Value::Map(MapValue::new(target.clone())));
                Ok(State::FirstFieldReady)
            }
            TypeDesc::Json => {
                self.current_node = Some(Value::Map(MapValue::new(staging_map_type())));
                Ok(State::FirstFieldReady)
            }
            TypeDesc::Union(union) => {
                let mut flattened = Vec::new();
                flatten_union(union, &mut flattened);
                let candidates: Vec<TypeRef> = flattened
                    .into_iter()
                    .filter(|member| {
                        matches!(&**member, TypeDesc::Map(_) | TypeDesc::Record(_))
                    })
                    .collect();
                if candidates.is_empty() {
                    return Err(self.error(ParseErrorKind::UnionWithoutMapOrRecord));
                }
                self.current_node = Some(Value::Map(MapValue::new(staging_map_type())));
                self.possible_types.push(candidates);
                Ok(State::FirstFieldReady)
            }
            _ => Err(self.error(ParseErrorKind::NotMapOrRecord)),
        }
    }

    pub(super) fn open_array(&mut self) -> Result<State, ParseError> {
        if let Some(node) = self.current_node.take() {
            self.nodes.push(node);
            self.push_child_target(Container::Array)?;
        }
        let target = self.last_target();
        match &*target {
            TypeDesc::Array(_) | TypeDesc::Tuple(_) => {
                self.current_node = Some(Value::List(ListValue::new(target.clone())));
                self.list_indices.push(0);
                Ok(State::FirstArrayElementReady)
            }
            TypeDesc::Json => {
                self.current_node = Some(Value::List(ListValue::new(staging_list_type())));
                self.list_indices.push(0);
                Ok(State::FirstArrayElementReady)
            }
            _ => Err(self.error(ParseErrorKind::NotArray)),
        }
    }

    /// Computes the target type of a nested container frame from the parent
    /// frame's target and pushes it. For a union parent (objects only) the
    /// surviving candidates are projected through the same rules and the
    /// child target becomes a fresh union over the projections.
    fn push_child_target(&mut self, container: Container) -> Result<(), ParseError> {
        let parent = self.last_target();
        let child = match &*parent {
            TypeDesc::Array(array) => {
                let index = self.last_list_index();
                if let ArrayState::Closed(size) = array.state {
                    if size <= index {
                        return Err(self.error(ParseErrorKind::ArraySizeNotEnough));
                    }
                }
                implied_type(&array.elem)
            }
            TypeDesc::Tuple(tuple) => {
                let index = self.last_list_index();
                let elem = tuple
                    .members
                    .get(index)
                    .cloned()
                    .or_else(|| tuple.rest.clone());
                match elem {
                    Some(elem) => implied_type(&elem),
                    None => return Err(self.error(ParseErrorKind::TupleSizeNotEnough)),
                }
            }
            TypeDesc::Map(map) => implied_type(&map.constraint),
            TypeDesc::Json => TypeDesc::json(),
            TypeDesc::Record(record) => {
                let name = self.last_field_name();
                let field_ty = record
                    .get_field(&name)
                    .map(|field| field.ty.clone())
                    .or_else(|| record.rest.clone());
                match field_ty {
                    Some(ty) => implied_type(&ty),
                    None => unreachable!("unknown fields of sealed records are rejected at the field name"),
                }
            }
            TypeDesc::Union(_) => {
                if container == Container::Array {
                    return Err(self.error(ParseErrorKind::UnsupportedType));
                }
                let candidates = match self.possible_types.last() {
                    Some(candidates) => candidates.clone(),
                    None => unreachable!("union staging frame carries candidates"),
                };
                let mut projected: Vec<TypeRef> = Vec::new();
                // The candidate stack holds only map and record members;
                // everything else was filtered out at the staging open.
                for candidate in &candidates {
                    match &**candidate {
                        TypeDesc::Map(map) => {
                            push_unique(&mut projected, implied_type(&map.constraint));
                        }
                        TypeDesc::Record(record) => {
                            let name = self.last_field_name();
                            let field_ty = record
                                .get_field(&name)
                                .map(|field| field.ty.clone())
                                .or_else(|| record.rest.clone());
                            if let Some(ty) = field_ty {
                                push_unique(&mut projected, implied_type(&ty));
                            }
                        }
                        _ => {}
                    }
                }
                if projected.is_empty() {
                    return Err(self.error(ParseErrorKind::NoEligibleType));
                }
                TypeDesc::union(projected)
            }
            _ => return Err(self.error(ParseErrorKind::UnsupportedType)),
        };
        self.target_types.push(child);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Non-string lexemes
    // ------------------------------------------------------------------

    pub(super) fn process_non_string_value(&mut self, kind: LexemeKind) -> Result<(), ParseError> {
        let lexeme = self.take_lexeme();
        let target = self.last_target();
        match &*target {
            TypeDesc::Union(union) => self.process_non_string_union(union, kind, &lexeme),
            TypeDesc::Array(array) => {
                if kind != LexemeKind::ArrayElement {
                    return Err(self.error(ParseErrorKind::NotArray));
                }
                let index = self.last_list_index();
                if let ArrayState::Closed(size) = array.state {
                    if size <= index {
                        return Err(self.error(ParseErrorKind::ArraySizeNotEnough));
                    }
                }
                let value = convert_lexeme(&implied_type(&array.elem), &lexeme)
                    .map_err(|kind| self.error(kind))?;
                self.current_list_mut().set(index, value);
                self.bump_list_index();
                Ok(())
            }
            TypeDesc::Tuple(tuple) => {
                if kind != LexemeKind::ArrayElement {
                    return Err(self.error(ParseErrorKind::NotArray));
                }
                let index = self.last_list_index();
                let elem = tuple
                    .members
                    .get(index)
                    .cloned()
                    .or_else(|| tuple.rest.clone());
                let elem = match elem {
                    Some(elem) => elem,
                    None => return Err(self.error(ParseErrorKind::TupleSizeNotEnough)),
                };
                let value = convert_lexeme(&implied_type(&elem), &lexeme)
                    .map_err(|kind| self.error(kind))?;
                self.current_list_mut().set(index, value);
                self.bump_list_index();
                Ok(())
            }
            TypeDesc::Map(map) => {
                match kind {
                    LexemeKind::ArrayElement => {
                        return Err(self.error(ParseErrorKind::NotArray))
                    }
                    LexemeKind::Value => {
                        return Err(self.error(ParseErrorKind::CannotConvert(
                            target.type_name(),
                        )))
                    }
                    LexemeKind::Field => {}
                }
                let name = self.pop_field_name();
                let value = convert_lexeme(&implied_type(&map.constraint), &lexeme)
                    .map_err(|kind| self.error(kind))?;
                self.current_map_mut().put_forcefully(name, value);
                Ok(())
            }
            TypeDesc::Record(record) => {
                if kind != LexemeKind::Field {
                    return Err(self.error(ParseErrorKind::CannotConvert(target.type_name())));
                }
                let name = self.pop_field_name();
                let field_ty = record
                    .get_field(&name)
                    .map(|field| field.ty.clone())
                    .or_else(|| record.rest.clone());
                let field_ty = match field_ty {
                    Some(ty) => ty,
                    None => unreachable!("unknown fields of sealed records are rejected at the field name"),
                };
                let value = convert_lexeme(&implied_type(&field_ty), &lexeme)
                    .map_err(|kind| self.error(kind))?;
                self.current_map_mut().put_forcefully(name, value);
                Ok(())
            }
            TypeDesc::Json => {
                let value = infer_json(&lexeme).map_err(|kind| self.error(kind))?;
                match kind {
                    LexemeKind::Value => self.current_node = Some(value),
                    LexemeKind::Field => {
                        let name = self.pop_field_name();
                        self.current_map_mut().put_forcefully(name, value);
                    }
                    LexemeKind::ArrayElement => {
                        let index = self.last_list_index();
                        self.current_list_mut().set(index, value);
                        self.bump_list_index();
                    }
                }
                Ok(())
            }
            // Primitive frame targets occur only at the root.
            _ => {
                let value =
                    convert_lexeme(&target, &lexeme).map_err(|kind| self.error(kind))?;
                self.current_node = Some(value);
                Ok(())
            }
        }
    }

    fn process_non_string_union(
        &mut self,
        union: &UnionDesc,
        kind: LexemeKind,
        lexeme: &str,
    ) -> Result<(), ParseError> {
        match kind {
            LexemeKind::Value => {
                for member in &union.members {
                    if let Ok(value) = convert_lexeme(&implied_type(member), lexeme) {
                        self.current_node = Some(value);
                        return Ok(());
                    }
                }
                Err(self.error(ParseErrorKind::NoMatchingType))
            }
            // A union frame is only ever staged for an object; an array
            // under a union target is rejected at the opening bracket.
            LexemeKind::ArrayElement => {
                unreachable!("union staging frames are map-shaped")
            }
            LexemeKind::Field => {
                let candidates = match self.possible_types.last() {
                    Some(candidates) => candidates.clone(),
                    None => unreachable!("union staging frame carries candidates"),
                };
                let retained: Vec<TypeRef> = candidates
                    .iter()
                    .filter(|candidate| {
                        matches!(&***candidate, TypeDesc::Map(_) | TypeDesc::Record(_))
                    })
                    .cloned()
                    .collect();
                let value = infer_json(lexeme).map_err(|kind| self.error(kind))?;
                let name = self.pop_field_name();
                self.current_map_mut().put_forcefully(name, value);
                if retained.is_empty() {
                    return Err(self.error(ParseErrorKind::NoEligibleTypes));
                }
                if let Some(slot) = self.possible_types.last_mut() {
                    *slot = retained;
                }
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Finalisation
    // ------------------------------------------------------------------

    /// Closes the current frame on `}` or `]`: validates it, commits union
    /// staging, then attaches the finished container to its parent or ends
    /// the document.
    pub(super) fn finalize_container(&mut self) -> Result<State, ParseError> {
        let target = match self.target_types.pop() {
            Some(target) => target,
            None => unreachable!("container closed with no open frame"),
        };
        match &*target {
            TypeDesc::Union(_) => self.commit_union_staging()?,
            TypeDesc::Map(_) => {}
            TypeDesc::Json => {
                if matches!(self.current_node, Some(Value::List(_))) {
                    self.pop_list_index();
                }
            }
            TypeDesc::Record(record) => {
                let staging = match self.current_node.take() {
                    Some(Value::Map(map)) => map,
                    _ => unreachable!("record frame finalised without a staging map"),
                };
                let not_provided = missing_field_names(record, &staging)
                    .map_err(|kind| self.error(kind))?;
                let mut value = build_record_with_defaults(&target, record, &not_provided);
                for (name, entry) in staging.into_entries() {
                    value.put_forcefully(name, entry);
                }
                if record.readonly {
                    value.freeze();
                }
                self.current_node = Some(Value::Map(value));
            }
            TypeDesc::Array(array) => {
                let count = self.pop_list_index();
                if let ArrayState::Closed(size) = array.state {
                    if size > count && !array.has_filler {
                        return Err(self.error(ParseErrorKind::ArrayWithoutFiller));
                    }
                }
            }
            TypeDesc::Tuple(tuple) => {
                let count = self.pop_list_index();
                if tuple.members.len() > count {
                    return Err(self.error(ParseErrorKind::TupleSizeTooLarge));
                }
            }
            _ => return Err(self.error(ParseErrorKind::UnsupportedType)),
        }

        if self.nodes.is_empty() {
            return Ok(State::DocEnd);
        }
        let mut parent = match self.nodes.pop() {
            Some(parent) => parent,
            None => unreachable!("checked non-empty above"),
        };
        let child = match self.current_node.take() {
            Some(child) => child,
            None => unreachable!("finalised frame always leaves a value"),
        };

        let parent_target = self.last_target();
        match &*parent_target {
            TypeDesc::Record(_) | TypeDesc::Map(_) | TypeDesc::Union(_) => {
                let name = self.pop_field_name();
                match &mut parent {
                    Value::Map(map) => map.put_forcefully(name, child),
                    _ => unreachable!("map-shaped parent expected"),
                }
                self.current_node = Some(parent);
                Ok(State::FieldEnd)
            }
            TypeDesc::Array(array) => {
                let index = self.last_list_index();
                if let ArrayState::Closed(size) = array.state {
                    if size <= index {
                        return Err(self.error(ParseErrorKind::ArraySizeNotEnough));
                    }
                }
                match &mut parent {
                    Value::List(list) => list.set(index, child),
                    _ => unreachable!("list-shaped parent expected"),
                }
                self.bump_list_index();
                self.current_node = Some(parent);
                Ok(State::ArrayElementEnd)
            }
            TypeDesc::Tuple(tuple) => {
                let index = self.last_list_index();
                if tuple.members.len() <= index && tuple.rest.is_none() {
                    return Err(self.error(ParseErrorKind::TupleSizeNotEnough));
                }
                match &mut parent {
                    Value::List(list) => list.set(index, child),
                    _ => unreachable!("list-shaped parent expected"),
                }
                self.bump_list_index();
                self.current_node = Some(parent);
                Ok(State::ArrayElementEnd)
            }
            TypeDesc::Json => match &mut parent {
                Value::Map(map) => {
                    let name = self.pop_field_name();
                    map.put_forcefully(name, child);
                    self.current_node = Some(parent);
                    Ok(State::FieldEnd)
                }
                Value::List(list) => {
                    let index = self.last_list_index();
                    list.set(index, child);
                    self.bump_list_index();
                    self.current_node = Some(parent);
                    Ok(State::ArrayElementEnd)
                }
                _ => unreachable!("container parent expected under json"),
            },
            _ => Err(self.error(ParseErrorKind::UnsupportedType)),
        }
    }

    /// Commits a union staging map to the first candidate whose full
    /// conversion succeeds, in declared order.
    fn commit_union_staging(&mut self) -> Result<(), ParseError> {
        let candidates = match self.possible_types.pop() {
            Some(candidates) => candidates,
            None => unreachable!("union staging frame carries candidates"),
        };
        let staging = match self.current_node.take() {
            Some(Value::Map(map)) => map,
            _ => unreachable!("union staging frame is map-shaped"),
        };
        let staged = Value::Map(staging);
        for candidate in &candidates {
            if matches!(&**candidate, TypeDesc::Map(_) | TypeDesc::Record(_)) {
                if let Ok(constructed) = convert_value(candidate, &staged) {
                    self.current_node = Some(constructed);
                    return Ok(());
                }
            }
        }
        Err(self.error(ParseErrorKind::CannotConstruct))
    }
}

/// The generic staging type for objects whose concrete shape is still
/// unknown: a map over the open json type.
fn staging_map_type() -> TypeRef {
    TypeDesc::map_of(TypeDesc::json())
}

fn staging_list_type() -> TypeRef {
    TypeDesc::array_of(TypeDesc::json())
}

fn flatten_union(union: &UnionDesc, out: &mut Vec<TypeRef>) {
    for member in &union.members {
        let implied = implied_type(member);
        if let TypeDesc::Union(inner) = &*implied {
            flatten_union(inner, out);
        } else {
            out.push(implied);
        }
    }
}

fn push_unique(list: &mut Vec<TypeRef>, ty: TypeRef) {
    if !list.iter().any(|existing| TypeRef::ptr_eq(existing, &ty)) {
        list.push(ty);
    }
}
