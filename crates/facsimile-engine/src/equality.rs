//! Structural equality over value graphs
//!
//! Two graphs are deep-equal when they have the same shape: same payloads,
//! same own keys in the same order with the same flags, same integrity, and
//! prototypes that are identical or themselves deep-equal. Intrinsics,
//! callables and host objects compare by identity. Cycles are handled by
//! assuming a pair under comparison is equal until shown otherwise.

use facsimile_core::{Heap, HeapError, HeapObject, ObjectId, ObjectKind, Property, Slot, Value};
use rustc_hash::FxHashSet;

/// Whether `a` and `b` are structurally equal
pub fn deep_equal(heap: &Heap, a: &Value, b: &Value) -> Result<bool, HeapError> {
    let mut seen: FxHashSet<(ObjectId, ObjectId)> = FxHashSet::default();
    let mut stack = vec![(a.clone(), b.clone())];

    while let Some((x, y)) = stack.pop() {
        let (x, y) = match (&x, &y) {
            (Value::Object(x), Value::Object(y)) => (*x, *y),
            (Value::Object(_), _) | (_, Value::Object(_)) => return Ok(false),
            _ if x.same_value(&y) => continue,
            _ => return Ok(false),
        };
        if x == y || !seen.insert((x, y)) {
            continue;
        }
        if !compare_objects(heap, x, y, &mut stack)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn by_identity(heap: &Heap, object: &HeapObject, id: ObjectId) -> bool {
    heap.is_intrinsic(id) || matches!(object.kind, ObjectKind::Function(_) | ObjectKind::Host(_))
}

/// Compare the shallow parts of two objects, queueing child pairs
fn compare_objects(
    heap: &Heap,
    x: ObjectId,
    y: ObjectId,
    stack: &mut Vec<(Value, Value)>,
) -> Result<bool, HeapError> {
    let a = heap.get(x)?;
    let b = heap.get(y)?;
    if by_identity(heap, a, x) || by_identity(heap, b, y) {
        return Ok(false);
    }
    if a.extensible != b.extensible {
        return Ok(false);
    }

    let payload_equal = match (&a.kind, &b.kind) {
        (ObjectKind::Ordinary, ObjectKind::Ordinary) => true,
        (ObjectKind::Array(p), ObjectKind::Array(q)) => {
            p.len() == q.len()
                && p.elements.iter().zip(&q.elements).all(|pair| match pair {
                    (None, None) => true,
                    (Some(p), Some(q)) => compare_property(p, q, stack),
                    _ => false,
                })
        }
        (ObjectKind::Map(p), ObjectKind::Map(q)) => {
            if p.size() != q.size() {
                return Ok(false);
            }
            for ((k1, v1), (k2, v2)) in p.entries().zip(q.entries()) {
                stack.push((k1.clone(), k2.clone()));
                stack.push((v1.clone(), v2.clone()));
            }
            true
        }
        (ObjectKind::Set(p), ObjectKind::Set(q)) => {
            if p.size() != q.size() {
                return Ok(false);
            }
            stack.extend(p.values().cloned().zip(q.values().cloned()));
            true
        }
        (ObjectKind::Date(p), ObjectKind::Date(q)) => {
            Value::number(p.get_time()).same_value(&Value::number(q.get_time()))
        }
        (ObjectKind::RegExp(p), ObjectKind::RegExp(q)) => p.source == q.source && p.flags == q.flags,
        (ObjectKind::Buffer(p), ObjectKind::Buffer(q)) => p.data == q.data,
        (ObjectKind::Boxed(p), ObjectKind::Boxed(q)) => p.same_value(q),
        _ => false,
    };
    if !payload_equal {
        return Ok(false);
    }

    let keys = a.properties.ordered_keys();
    if keys != b.properties.ordered_keys() {
        return Ok(false);
    }
    for key in &keys {
        match (a.properties.get(key), b.properties.get(key)) {
            (Some(p), Some(q)) if compare_property(p, q, stack) => {}
            _ => return Ok(false),
        }
    }

    match (a.prototype, b.prototype) {
        (None, None) => {}
        (Some(p), Some(q)) if p == q => {}
        (Some(p), Some(q)) if !heap.is_intrinsic(p) && !heap.is_intrinsic(q) => {
            stack.push((Value::Object(p), Value::Object(q)));
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Compare flags, queueing the slot values
fn compare_property(p: &Property, q: &Property, stack: &mut Vec<(Value, Value)>) -> bool {
    if p.enumerable != q.enumerable || p.configurable != q.configurable {
        return false;
    }
    match (&p.slot, &q.slot) {
        (Slot::Data { value: v, writable: w }, Slot::Data { value: u, writable: z }) if w == z => {
            stack.push((v.clone(), u.clone()));
            true
        }
        (Slot::Accessor { get: g1, set: s1 }, Slot::Accessor { get: g2, set: s2 }) => {
            for pair in [(g1, g2), (s1, s2)] {
                match pair {
                    (None, None) => {}
                    (Some(f), Some(g)) => stack.push((f.clone(), g.clone())),
                    _ => return false,
                }
            }
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives() {
        let heap = Heap::new();
        assert!(deep_equal(&heap, &Value::from(1), &Value::from(1)).unwrap());
        assert!(deep_equal(&heap, &Value::number(f64::NAN), &Value::number(f64::NAN)).unwrap());
        assert!(!deep_equal(&heap, &Value::number(0.0), &Value::number(-0.0)).unwrap());
        assert!(!deep_equal(&heap, &Value::from("1"), &Value::from(1)).unwrap());
    }

    #[test]
    fn test_structural_objects() {
        let mut heap = Heap::new();
        let a = heap.new_object();
        let b = heap.new_object();
        heap.set_property(a, "x", 1).unwrap();
        heap.set_property(b, "x", 1).unwrap();
        assert!(deep_equal(&heap, &Value::Object(a), &Value::Object(b)).unwrap());

        heap.set_property(b, "x", 2).unwrap();
        assert!(!deep_equal(&heap, &Value::Object(a), &Value::Object(b)).unwrap());
    }

    #[test]
    fn test_key_order_matters() {
        let mut heap = Heap::new();
        let a = heap.new_object();
        let b = heap.new_object();
        heap.set_property(a, "x", 1).unwrap();
        heap.set_property(a, "y", 2).unwrap();
        heap.set_property(b, "y", 2).unwrap();
        heap.set_property(b, "x", 1).unwrap();
        assert!(!deep_equal(&heap, &Value::Object(a), &Value::Object(b)).unwrap());
    }

    #[test]
    fn test_cycles() {
        let mut heap = Heap::new();
        let a = heap.new_object();
        let b = heap.new_object();
        heap.set_property(a, "self", a).unwrap();
        heap.set_property(b, "self", b).unwrap();
        assert!(deep_equal(&heap, &Value::Object(a), &Value::Object(b)).unwrap());
    }

    #[test]
    fn test_functions_compare_by_identity() {
        let mut heap = Heap::new();
        let f = heap.new_function("f", 0, |_, _, _| Ok(Value::Undefined));
        let g = heap.new_function("f", 0, |_, _, _| Ok(Value::Undefined));
        assert!(deep_equal(&heap, &Value::Object(f), &Value::Object(f)).unwrap());
        assert!(!deep_equal(&heap, &Value::Object(f), &Value::Object(g)).unwrap());
    }

    #[test]
    fn test_integrity_matters() {
        let mut heap = Heap::new();
        let a = heap.new_object();
        let b = heap.new_object();
        heap.prevent_extensions(b).unwrap();
        assert!(!deep_equal(&heap, &Value::Object(a), &Value::Object(b)).unwrap());
    }
}
