//! Type classifier
//!
//! Maps a value to the structural [`Variant`] that decides how it is cloned.
//! The arms are checked in a fixed priority order (primitive, sequence,
//! ordered map, unique set, instant, pattern, buffer, boxed primitive,
//! callable, then the plain/class fallback). Only the payload tag and the
//! prototype link are read; accessors are never run.

use facsimile_core::{Builtin, Heap, HeapError, ObjectId, ObjectKind, Value};
use std::fmt;

/// Structural category of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Immutable scalar; cloned by identity
    Primitive,
    /// Length-indexed list
    Sequence,
    /// Insertion-ordered key/value map
    OrderedMap,
    /// Insertion-ordered set
    UniqueSet,
    /// Point in time
    Instant,
    /// Regular expression
    Pattern,
    /// Fixed-length bytes
    BinaryBuffer,
    /// Object wrapper around a primitive
    BoxedPrimitive,
    /// Executable behavior
    Callable,
    /// Property bag whose prototype is `Object.prototype` or null
    PlainObject,
    /// Property bag with any other prototype
    ClassInstance,
    /// Host resource with no built-in rule
    Opaque,
}

impl Variant {
    /// Stable name for diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            Variant::Primitive => "primitive",
            Variant::Sequence => "sequence",
            Variant::OrderedMap => "ordered map",
            Variant::UniqueSet => "unique set",
            Variant::Instant => "instant",
            Variant::Pattern => "pattern",
            Variant::BinaryBuffer => "binary buffer",
            Variant::BoxedPrimitive => "boxed primitive",
            Variant::Callable => "callable",
            Variant::PlainObject => "plain object",
            Variant::ClassInstance => "class instance",
            Variant::Opaque => "opaque host object",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify any value
pub fn classify(heap: &Heap, value: &Value) -> Result<Variant, HeapError> {
    match value {
        Value::Object(id) => classify_object(heap, *id),
        _ => Ok(Variant::Primitive),
    }
}

/// Classify a heap object
pub fn classify_object(heap: &Heap, id: ObjectId) -> Result<Variant, HeapError> {
    let object = heap.get(id)?;
    Ok(match &object.kind {
        ObjectKind::Array(_) => Variant::Sequence,
        ObjectKind::Map(_) => Variant::OrderedMap,
        ObjectKind::Set(_) => Variant::UniqueSet,
        ObjectKind::Date(_) => Variant::Instant,
        ObjectKind::RegExp(_) => Variant::Pattern,
        ObjectKind::Buffer(_) => Variant::BinaryBuffer,
        ObjectKind::Boxed(_) => Variant::BoxedPrimitive,
        ObjectKind::Function(_) => Variant::Callable,
        ObjectKind::Host(_) => Variant::Opaque,
        ObjectKind::Ordinary => match object.prototype {
            None => Variant::PlainObject,
            Some(p) if p == heap.intrinsic_prototype(Builtin::Object) => Variant::PlainObject,
            Some(_) => Variant::ClassInstance,
        },
    })
}

/// Human-readable type of a value, e.g. `Map`, `function foo`, `Socket`
pub fn describe(heap: &Heap, value: &Value) -> String {
    let Value::Object(id) = value else {
        return value.type_name().to_string();
    };
    match heap.get(*id).map(|o| &o.kind) {
        Ok(ObjectKind::Function(f)) => format!("function {}", f.name),
        Ok(ObjectKind::Host(h)) => h.type_name.to_string(),
        Ok(kind) => kind.name().to_string(),
        Err(_) => format!("dangling reference {}", id),
    }
}
