//! Property enumeration
//!
//! Reads own properties as full descriptors. Getters are never invoked, so
//! enumeration is free of side effects.

use facsimile_core::{Heap, HeapError, ObjectId, ObjectKind, Property, PropertyDescriptor};

/// Every named own property of `id`, enumerable or not, in own-key order
///
/// Array elements are not included; read them with [`indexed_elements`].
/// Symbol-keyed properties come after string keys.
pub fn own_properties(heap: &Heap, id: ObjectId) -> Result<Vec<PropertyDescriptor>, HeapError> {
    let object = heap.get(id)?;
    Ok(object
        .properties
        .ordered_keys()
        .into_iter()
        .filter_map(|key| {
            object
                .properties
                .get(&key)
                .cloned()
                .map(|property| PropertyDescriptor { key, property })
        })
        .collect())
}

/// Element slots of an array, holes as `None`
///
/// The vector length is the array length, so trailing holes are kept.
/// Non-array objects have no elements.
pub fn indexed_elements(heap: &Heap, id: ObjectId) -> Result<Vec<Option<Property>>, HeapError> {
    match &heap.get(id)?.kind {
        ObjectKind::Array(arr) => Ok(arr.elements.clone()),
        _ => Ok(Vec::new()),
    }
}
