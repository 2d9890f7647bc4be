//! Facsimile core runtime
//!
//! This crate provides the in-memory value model the clone engine works on:
//! - Primitive values and symbols
//! - Property keys and descriptors (data and accessor)
//! - Heap objects with built-in payloads (arrays, maps, sets, dates,
//!   regexps, buffers, functions, boxed primitives, host resources)
//! - The arena heap with realm intrinsics and integrity operations

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod heap;
pub mod object;
pub mod property;
pub mod value;

pub use heap::{Builtin, Heap, HeapCheckpoint, ObjectId};
pub use object::{
    ArrayObject, BufferObject, DateObject, FunctionObject, HeapObject, HostObject, IntegrityLevel,
    MapObject, NativeFn, ObjectKind, RegExpMatch, RegExpObject, SetObject,
};
pub use property::{Property, PropertyDescriptor, PropertyKey, PropertyMap, Slot};
pub use value::{Symbol, Value};

/// Heap operation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeapError {
    /// Object id does not belong to this heap
    #[error("Invalid object reference {0}")]
    InvalidObject(ObjectId),

    /// Operation needs a different built-in payload
    #[error("Expected {expected} object at {id}, found {found}")]
    WrongKind {
        /// Offending object
        id: ObjectId,
        /// Payload the operation needs
        expected: &'static str,
        /// Payload actually present
        found: &'static str,
    },

    /// Object is not a function
    #[error("Object {0} is not callable")]
    NotCallable(ObjectId),

    /// Primitive used as a callee
    #[error("Value of type {0} is not callable")]
    NotCallableValue(&'static str),

    /// New property on a non-extensible object
    #[error("Cannot add property {key}, object is not extensible")]
    NonExtensible {
        /// Property that could not be added
        key: String,
    },

    /// Incompatible change to a non-configurable property
    #[error("Cannot redefine non-configurable property {key}")]
    NonConfigurable {
        /// Property that could not be changed
        key: String,
    },

    /// Assignment to a read-only property
    #[error("Cannot assign to read-only property {key}")]
    NonWritable {
        /// Property that could not be assigned
        key: String,
    },

    /// Prototype link would form a cycle
    #[error("Cyclic prototype chain through {0}")]
    PrototypeCycle(ObjectId),

    /// Pattern or flags rejected
    #[error("Invalid regular expression: {0}")]
    InvalidRegExp(String),

    /// Only non-nullish primitives can be boxed
    #[error("Cannot box a value of type {0}")]
    InvalidBoxedPrimitive(&'static str),

    /// Byte index past the end of a buffer
    #[error("Index {index} out of bounds (length: {length})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Buffer length
        length: usize,
    },

    /// Native behavior reported a failure
    #[error("{function}: {message}")]
    NativeFailure {
        /// Function name
        function: String,
        /// Failure description
        message: String,
    },
}

/// Heap operation result
pub type HeapResult<T> = Result<T, HeapError>;
