//! Variant rules
//!
//! A [`VariantRule`] teaches the engine to clone a value it would otherwise
//! reject or treat generically. Rules are consulted in registration order
//! before built-in classification; the first rule whose `matches` returns
//! true owns the value.
//!
//! The engine calls `allocate` to get an empty clone, registers it (so cycles
//! back to the source resolve to it), and later calls `populate` to fill in
//! the payload. Own properties, the prototype link and the integrity level
//! are copied by the engine afterwards, exactly as for built-in variants.

use crate::cloner::Cloner;
use crate::error::{CloneError, CloneResult};
use crate::path::{Location, PathId, PathSegment, PropertyPath};
use facsimile_core::{Heap, HeapError, ObjectId, ObjectKind, Value};

/// Clone behavior for a family of values
pub trait VariantRule: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Whether this rule handles `source`
    fn matches(&self, heap: &Heap, source: ObjectId) -> bool;

    /// Allocate an empty clone of `source`
    ///
    /// Must return a newly allocated object.
    fn allocate(&self, heap: &mut Heap, source: ObjectId) -> CloneResult<ObjectId>;

    /// Copy the payload of `source` into `shell`
    fn populate(&self, _cx: &mut RuleContext<'_, '_>, _source: ObjectId, _shell: ObjectId) -> CloneResult<()> {
        Ok(())
    }
}

/// Access to the running clone from inside [`VariantRule::populate`]
pub struct RuleContext<'c, 'h> {
    cloner: &'c mut Cloner<'h>,
    rule: &'c str,
    path: PathId,
}

impl<'c, 'h> RuleContext<'c, 'h> {
    pub(crate) fn new(cloner: &'c mut Cloner<'h>, rule: &'c str, path: PathId) -> Self {
        Self { cloner, rule, path }
    }

    /// Read access to the heap
    pub fn heap(&self) -> &Heap {
        self.cloner.heap()
    }

    /// Write access to the heap
    pub fn heap_mut(&mut self) -> &mut Heap {
        self.cloner.heap_mut()
    }

    /// Clone a value reachable from the object being populated
    ///
    /// Shares the clone's identity map, so cycles and shared references
    /// behave as for built-in variants. Objects are returned as shells that
    /// are filled in later.
    pub fn clone_child(&mut self, value: &Value, segment: PathSegment) -> CloneResult<Value> {
        self.cloner.reserve(value, Location::Child(self.path, segment))
    }

    /// Path of the object being populated
    pub fn path(&self) -> PropertyPath {
        self.cloner.resolve_path(self.path)
    }

    /// Build a failure attributed to this rule
    pub fn fail(&self, message: impl Into<String>) -> CloneError {
        CloneError::RuleFailed {
            rule: self.rule.to_string(),
            path: self.path(),
            message: message.into(),
        }
    }
}

/// Clones host objects of one type by sharing their payload
///
/// The clone is a distinct object carrying the same `Arc` payload, for
/// immutable host resources that are safe to alias.
#[derive(Debug, Clone)]
pub struct SharedPayloadRule {
    type_name: String,
}

impl SharedPayloadRule {
    /// Rule for host objects whose type name is `type_name`
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

impl VariantRule for SharedPayloadRule {
    fn name(&self) -> &str {
        &self.type_name
    }

    fn matches(&self, heap: &Heap, source: ObjectId) -> bool {
        matches!(
            heap.get(source).map(|o| &o.kind),
            Ok(ObjectKind::Host(h)) if *h.type_name == *self.type_name
        )
    }

    fn allocate(&self, heap: &mut Heap, source: ObjectId) -> CloneResult<ObjectId> {
        let payload = match &heap.get(source)?.kind {
            ObjectKind::Host(h) => h.payload(),
            other => {
                return Err(HeapError::WrongKind {
                    id: source,
                    expected: "Host",
                    found: other.name(),
                }
                .into())
            }
        };
        Ok(heap.new_host(&self.type_name, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_shared_payload_matches_type_name() {
        let mut heap = Heap::new();
        let timer = heap.new_host("Timer", Arc::new(5u64));
        let socket = heap.new_host("Socket", Arc::new(()));
        let rule = SharedPayloadRule::new("Timer");

        assert!(rule.matches(&heap, timer));
        assert!(!rule.matches(&heap, socket));
        assert_eq!(rule.name(), "Timer");
    }

    #[test]
    fn test_shared_payload_allocates_distinct_object() {
        let mut heap = Heap::new();
        let payload: Arc<u64> = Arc::new(5);
        let timer = heap.new_host("Timer", payload.clone());
        let rule = SharedPayloadRule::new("Timer");

        let shell = rule.allocate(&mut heap, timer).unwrap();
        assert_ne!(shell, timer);
        match &heap.get(shell).unwrap().kind {
            ObjectKind::Host(h) => assert_eq!(h.downcast_ref::<u64>(), Some(&5)),
            other => panic!("expected host object, got {}", other.name()),
        }
        assert_eq!(Arc::strong_count(&payload), 3);
    }

    #[test]
    fn test_shared_payload_rejects_non_host() {
        let mut heap = Heap::new();
        let plain = heap.new_object();
        let err = SharedPayloadRule::new("Timer").allocate(&mut heap, plain).unwrap_err();

        assert!(err.path().is_none());
        assert!(matches!(
            err,
            CloneError::Heap(HeapError::WrongKind { expected: "Host", found: "Object", .. })
        ));
    }
}
