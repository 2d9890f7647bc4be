//! Source-to-clone identity map for a single clone call

use facsimile_core::ObjectId;
use rustc_hash::FxHashMap;

/// Maps each source object to its clone
///
/// Entries are registered as soon as a clone shell exists, before its
/// contents are filled in, so cycles and shared references resolve to the
/// same clone.
#[derive(Debug, Default)]
pub struct CloneRegistry {
    clones: FxHashMap<ObjectId, ObjectId>,
}

impl CloneRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone already created for `source`
    pub fn lookup(&self, source: ObjectId) -> Option<ObjectId> {
        self.clones.get(&source).copied()
    }

    /// Record `clone` as the clone of `source`
    ///
    /// A source is registered at most once per clone call.
    pub fn register(&mut self, source: ObjectId, clone: ObjectId) {
        let previous = self.clones.insert(source, clone);
        debug_assert!(previous.is_none(), "{} registered twice", source);
    }

    /// Number of objects cloned so far
    pub fn len(&self) -> usize {
        self.clones.len()
    }

    /// Check if nothing has been cloned yet
    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facsimile_core::Heap;

    #[test]
    fn test_lookup_after_register() {
        let mut heap = Heap::new();
        let a = heap.new_object();
        let b = heap.new_object();
        let mut registry = CloneRegistry::new();

        assert!(registry.is_empty());
        assert_eq!(registry.lookup(a), None);
        registry.register(a, b);
        assert_eq!(registry.lookup(a), Some(b));
        assert_eq!(registry.lookup(b), None);
        assert_eq!(registry.len(), 1);
    }
}
