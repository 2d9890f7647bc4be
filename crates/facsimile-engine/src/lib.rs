//! Facsimile clone engine
//!
//! Deep-clones value graphs living on a [`facsimile_core::Heap`]:
//! - Cycles and shared references keep their topology
//! - Property flags, accessors, symbol keys and key order are preserved
//! - Prototypes are cloned (or shared) and intrinsics are never copied
//! - Non-extensible, sealed and frozen states carry over
//! - Built-in payloads (arrays, maps, sets, dates, regexps, buffers, boxed
//!   primitives) get dedicated handling; callables are shared
//! - [`VariantRule`]s extend the engine to host-defined types
//!
//! A failed clone reports the path to the offending value and leaves the
//! heap unchanged.
//!
//! ```ignore
//! let mut heap = Heap::new();
//! let obj = heap.new_object();
//! heap.set_property(obj, "self", obj)?;
//!
//! let copy = facsimile_engine::deep_clone(&mut heap, &Value::Object(obj))?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod classify;
mod cloner;
pub mod descriptors;
pub mod equality;
pub mod error;
pub mod options;
pub mod path;
pub mod properties;
pub mod registry;
pub mod rules;

pub use classify::{classify, Variant};
pub use equality::deep_equal;
pub use error::{CloneError, CloneResult, ConfigError};
pub use options::{CloneOptions, ClonePolicy};
pub use path::{PathSegment, PropertyPath};
pub use rules::{RuleContext, SharedPayloadRule, VariantRule};

use cloner::Cloner;
use facsimile_core::{Heap, Value};

/// Deep-clone `value` with default options
pub fn deep_clone(heap: &mut Heap, value: &Value) -> CloneResult<Value> {
    deep_clone_with(heap, value, &CloneOptions::default())
}

/// Deep-clone `value`
///
/// Primitives are returned as-is. On error nothing allocated by this call
/// remains on the heap.
pub fn deep_clone_with(heap: &mut Heap, value: &Value, options: &CloneOptions) -> CloneResult<Value> {
    Cloner::new(heap, options).run(value)
}
