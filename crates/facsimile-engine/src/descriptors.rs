//! Descriptor writer
//!
//! Installs cloned properties on a clone with the source flags, then
//! reproduces the source's integrity level. Writes go through the heap's
//! strict `define_own_property`, so a target that refuses a property is
//! reported rather than silently skipped.

use facsimile_core::{
    Heap, HeapError, IntegrityLevel, ObjectId, Property, PropertyDescriptor, PropertyKey,
};

/// A single rejected write
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorFailure {
    /// Key being written, or `[[Prototype]]`/`[[Extensible]]` for internal slots
    pub key: String,
    /// Heap error returned for the write
    pub source: HeapError,
}

impl DescriptorFailure {
    fn new(key: impl ToString, source: HeapError) -> Self {
        Self {
            key: key.to_string(),
            source,
        }
    }
}

/// Define every descriptor on `target`, in order
pub fn apply_descriptors(
    heap: &mut Heap,
    target: ObjectId,
    descriptors: Vec<PropertyDescriptor>,
) -> Result<(), DescriptorFailure> {
    for PropertyDescriptor { key, property } in descriptors {
        heap.define_own_property(target, key.clone(), property)
            .map_err(|e| DescriptorFailure::new(&key, e))?;
    }
    Ok(())
}

/// Install array element slots on `target`, keeping holes and length
pub fn apply_elements(
    heap: &mut Heap,
    target: ObjectId,
    elements: Vec<Option<Property>>,
) -> Result<(), DescriptorFailure> {
    let length = elements.len();
    for (index, element) in elements.into_iter().enumerate() {
        let Some(property) = element else {
            continue;
        };
        let key = PropertyKey::from(index as u32);
        heap.define_own_property(target, key.clone(), property)
            .map_err(|e| DescriptorFailure::new(&key, e))?;
    }
    let array = heap
        .array_mut(target)
        .map_err(|e| DescriptorFailure::new("length", e))?;
    if array.elements.len() < length {
        array.elements.resize(length, None);
    }
    Ok(())
}

/// Link `target` to `prototype`
pub fn apply_prototype(
    heap: &mut Heap,
    target: ObjectId,
    prototype: Option<ObjectId>,
) -> Result<(), DescriptorFailure> {
    heap.set_prototype_of(target, prototype)
        .map_err(|e| DescriptorFailure::new("[[Prototype]]", e))
}

/// Bring `target` to the integrity level `source` currently has
pub fn apply_extensibility(
    heap: &mut Heap,
    source: ObjectId,
    target: ObjectId,
) -> Result<(), DescriptorFailure> {
    let level = heap
        .integrity_level(source)
        .map_err(|e| DescriptorFailure::new("[[Extensible]]", e))?;
    apply_integrity(heap, target, level)
}

/// Bring `target` to `level`
pub fn apply_integrity(
    heap: &mut Heap,
    target: ObjectId,
    level: IntegrityLevel,
) -> Result<(), DescriptorFailure> {
    let result = match level {
        IntegrityLevel::Extensible => Ok(()),
        IntegrityLevel::NonExtensible => heap.prevent_extensions(target),
        IntegrityLevel::Sealed => heap.seal(target),
        IntegrityLevel::Frozen => heap.freeze(target),
    };
    result.map_err(|e| DescriptorFailure::new("[[Extensible]]", e))
}
