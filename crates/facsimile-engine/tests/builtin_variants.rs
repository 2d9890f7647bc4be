//! Integration tests for built-in variants
//!
//! Tests cover:
//! - Arrays, sparse arrays and match results
//! - Maps and sets (order, object keys, extra properties)
//! - Dates, regexps, buffers and boxed primitives
//! - Errors, class instances and functions

use facsimile_core::{Builtin, Heap, ObjectId, ObjectKind, Property, PropertyKey, Value};
use facsimile_engine::{deep_clone, deep_equal};

fn clone_object(heap: &mut Heap, id: ObjectId) -> ObjectId {
    deep_clone(heap, &Value::Object(id))
        .unwrap()
        .as_object()
        .expect("clone of an object is an object")
}

fn constructor_name(heap: &mut Heap, id: ObjectId) -> Value {
    let ctor = heap.get_property(id, "constructor").unwrap().as_object().unwrap();
    heap.get_property(ctor, "name").unwrap()
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn test_array_elements_and_length() {
    let mut heap = Heap::new();
    let inner = heap.new_object();
    let arr = heap.new_array([Value::from(1), Value::from("a"), Value::Object(inner)]);

    let copy = clone_object(&mut heap, arr);
    assert_eq!(heap.get_property(copy, "length").unwrap(), Value::from(3));
    let copied_inner = heap.array(copy).unwrap().get(2).and_then(Value::as_object).unwrap();
    assert_ne!(copied_inner, inner);
    assert!(deep_equal(&heap, &Value::Object(arr), &Value::Object(copy)).unwrap());
}

#[test]
fn test_sparse_array_keeps_holes() {
    let mut heap = Heap::new();
    let arr = heap.new_array([Value::from(1)]);
    heap.set_property(arr, "5", 6).unwrap();
    heap.array_mut(arr).unwrap().elements.resize(8, None);

    let copy = clone_object(&mut heap, arr);
    let elements = &heap.array(copy).unwrap().elements;
    assert_eq!(elements.len(), 8);
    assert!(elements[1].is_none());
    assert!(elements[5].is_some());
    assert!(elements[7].is_none());
    assert_eq!(heap.own_property_keys(copy).unwrap(), heap.own_property_keys(arr).unwrap());
}

#[test]
fn test_array_extra_properties() {
    let mut heap = Heap::new();
    let arr = heap.new_array([Value::from(1)]);
    heap.set_property(arr, "label", "tagged").unwrap();

    let copy = clone_object(&mut heap, arr);
    assert_eq!(heap.get_property(copy, "label").unwrap(), Value::from("tagged"));
}

#[test]
fn test_element_flags_preserved() {
    let mut heap = Heap::new();
    let arr = heap.new_array([]);
    heap.define_own_property(arr, "0".into(), Property::data_with("ro", false, true, false))
        .unwrap();

    let copy = clone_object(&mut heap, arr);
    assert_eq!(
        heap.get_own_property(copy, &"0".into()).unwrap(),
        Some(Property::data_with("ro", false, true, false))
    );
}

#[test]
fn test_match_result_extras() {
    let mut heap = Heap::new();
    let re = heap.new_regexp("b(c)", "").unwrap();
    let result = heap.regexp_exec(re, "abcd").unwrap().as_object().unwrap();

    let copy = clone_object(&mut heap, result);
    assert_eq!(heap.get_property(copy, "index").unwrap(), Value::from(1));
    assert_eq!(heap.get_property(copy, "input").unwrap(), Value::from("abcd"));
    assert_eq!(heap.array(copy).unwrap().get(1), Some(&Value::from("c")));
    assert!(heap.get_own_property(copy, &"groups".into()).unwrap().is_some());
}

// ============================================================================
// Maps and sets
// ============================================================================

#[test]
fn test_map_entries_in_order() {
    let mut heap = Heap::new();
    let map = heap.new_map();
    heap.map_set(map, "foo", "bar").unwrap();
    heap.map_set(map, 1, 5).unwrap();
    heap.map_set(map, "a", "b").unwrap();

    let copy = clone_object(&mut heap, map);
    assert_eq!(heap.map_entries(copy).unwrap(), heap.map_entries(map).unwrap());
    assert_eq!(heap.get_property(copy, "size").unwrap(), Value::from(3));
    assert_eq!(constructor_name(&mut heap, copy), Value::from("Map"));

    heap.map_set(map, "cc", "later").unwrap();
    assert_eq!(heap.map(copy).unwrap().size(), 3);
}

#[test]
fn test_map_object_keys_and_values_are_cloned() {
    let mut heap = Heap::new();
    let key = heap.new_object();
    let value = heap.new_object();
    heap.set_property(value, "f", "bar").unwrap();
    let map = heap.new_map();
    heap.map_set(map, key, value).unwrap();

    let copy = clone_object(&mut heap, map);
    let entries = heap.map_entries(copy).unwrap();
    let (k, v) = &entries[0];
    assert_ne!(k, &Value::Object(key));
    assert_ne!(v, &Value::Object(value));
    let v = v.as_object().unwrap();
    assert_eq!(heap.get_property(v, "f").unwrap(), Value::from("bar"));
}

#[test]
fn test_map_containing_itself() {
    let mut heap = Heap::new();
    let map = heap.new_map();
    heap.map_set(map, "me", map).unwrap();

    let copy = clone_object(&mut heap, map);
    assert_eq!(heap.map_get(copy, &Value::from("me")).unwrap(), Value::Object(copy));
}

#[test]
fn test_map_own_properties() {
    let mut heap = Heap::new();
    let map = heap.new_map();
    heap.set_property(map, "foo", "bar").unwrap();

    let copy = clone_object(&mut heap, map);
    assert_eq!(heap.get_property(copy, "foo").unwrap(), Value::from("bar"));
}

#[test]
fn test_set_values_in_order() {
    let mut heap = Heap::new();
    let member = heap.new_object();
    let set = heap.new_set();
    heap.set_add(set, 3).unwrap();
    heap.set_add(set, "x").unwrap();
    heap.set_add(set, member).unwrap();

    let copy = clone_object(&mut heap, set);
    let values = heap.set_values(copy).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0], Value::from(3));
    assert_eq!(values[1], Value::from("x"));
    assert_ne!(values[2], Value::Object(member));
    assert!(deep_equal(&heap, &Value::Object(set), &Value::Object(copy)).unwrap());

    heap.set_add(set, 99).unwrap();
    assert!(!heap.set_has(copy, &Value::from(99)).unwrap());
}

// ============================================================================
// Scalar payloads
// ============================================================================

#[test]
fn test_date() {
    let mut heap = Heap::new();
    let date = heap.new_date(1_700_000_000_000.0);
    heap.set_property(date, "note", "launch").unwrap();

    let copy = clone_object(&mut heap, date);
    assert_eq!(heap.date_time(copy).unwrap(), 1_700_000_000_000.0);
    assert_eq!(heap.get_property(copy, "note").unwrap(), Value::from("launch"));

    heap.set_date_time(date, 0.0).unwrap();
    assert_eq!(heap.date_time(copy).unwrap(), 1_700_000_000_000.0);
}

#[test]
fn test_invalid_date() {
    let mut heap = Heap::new();
    let date = heap.new_date(f64::NAN);

    let copy = clone_object(&mut heap, date);
    assert!(heap.date_time(copy).unwrap().is_nan());
}

#[test]
fn test_regexp_source_flags_and_last_index() {
    let mut heap = Heap::new();
    let re = heap.new_regexp("a+b", "gi").unwrap();
    heap.regexp_exec(re, "xxAAB aab").unwrap();
    let last_index = heap.get_property(re, "lastIndex").unwrap();

    let copy = clone_object(&mut heap, re);
    assert_eq!(heap.get_property(copy, "source").unwrap(), Value::from("a+b"));
    assert_eq!(heap.get_property(copy, "flags").unwrap(), Value::from("gi"));
    assert_eq!(heap.get_property(copy, "lastIndex").unwrap(), last_index);

    let descriptor = heap.get_own_property(copy, &"lastIndex".into()).unwrap().unwrap();
    assert!(!descriptor.enumerable);
    assert!(!descriptor.configurable);

    // Matching continues from the copied lastIndex
    let next = heap.regexp_exec(copy, "xxAAB aab").unwrap().as_object().unwrap();
    assert_eq!(heap.get_property(next, "index").unwrap(), Value::from(6));
}

#[test]
fn test_buffer_bytes_are_copied() {
    let mut heap = Heap::new();
    let buf = heap.new_buffer_from(vec![1, 2, 3, 4]);

    let copy = clone_object(&mut heap, buf);
    assert_eq!(heap.buffer_bytes(copy).unwrap(), &[1, 2, 3, 4]);
    heap.buffer_bytes_mut(buf).unwrap()[0] = 9;
    assert_eq!(heap.buffer_bytes(copy).unwrap()[0], 1);
    assert_eq!(heap.get_property(copy, "byteLength").unwrap(), Value::from(4));
}

#[test]
fn test_boxed_primitives() {
    let mut heap = Heap::new();
    for primitive in [Value::from("str"), Value::from(12), Value::from(false)] {
        let boxed = heap.new_boxed(primitive.clone()).unwrap();
        heap.set_property(boxed, "extra", 1).unwrap();

        let copy = clone_object(&mut heap, boxed);
        assert_ne!(copy, boxed);
        match &heap.get(copy).unwrap().kind {
            ObjectKind::Boxed(inner) => assert_eq!(inner, &primitive),
            other => panic!("expected boxed primitive, got {}", other.name()),
        }
        assert_eq!(heap.get_property(copy, "extra").unwrap(), Value::from(1));
    }
}

// ============================================================================
// Errors, classes and functions
// ============================================================================

#[test]
fn test_error_message_and_stack() {
    let mut heap = Heap::new();
    let err = heap.new_error("Foobar");
    heap.set_property(err, "foo", "bar").unwrap();

    let copy = clone_object(&mut heap, err);
    for key in ["message", "stack", "foo"] {
        assert_eq!(heap.get_property(copy, key).unwrap(), heap.get_property(err, key).unwrap());
    }
    assert_eq!(constructor_name(&mut heap, copy), Value::from("Error"));
    assert_eq!(
        heap.get_prototype_of(copy).unwrap(),
        Some(heap.intrinsic_prototype(Builtin::Error))
    );

    heap.set_property(err, "message", "changed").unwrap();
    assert_eq!(heap.get_property(copy, "message").unwrap(), Value::from("Foobar"));
}

#[test]
fn test_class_instance_methods_work_on_clone() {
    let mut heap = Heap::new();
    // class Counter { increment() { this.count += 1 } }
    let increment = heap.new_function("increment", 0, |heap, this, _| {
        let Value::Object(this) = this else {
            return Ok(Value::Undefined);
        };
        let count = heap.get_property(*this, "count")?.as_number().unwrap_or(0.0);
        heap.set_property(*this, "count", count + 1.0)?;
        Ok(Value::Undefined)
    });
    let proto = heap.new_object();
    heap.define_own_property(proto, "increment".into(), Property::hidden(increment))
        .unwrap();
    let counter = heap.object_create(Some(proto));
    heap.set_property(counter, "count", 1.0).unwrap();

    let copy = clone_object(&mut heap, counter);
    let method = heap.get_property(copy, "increment").unwrap();
    assert_eq!(method, Value::Object(increment));
    heap.call(&method, &Value::Object(copy), &[]).unwrap();

    assert_eq!(heap.get_property(copy, "count").unwrap(), Value::from(2.0));
    assert_eq!(heap.get_property(counter, "count").unwrap(), Value::from(1.0));
}

#[test]
fn test_constructor_identity_through_cloned_prototype() {
    let mut heap = Heap::new();
    let ctor = heap.new_function("Point", 2, |_, _, _| Ok(Value::Undefined));
    let proto = heap.new_object();
    heap.define_own_property(proto, "constructor".into(), Property::hidden(ctor))
        .unwrap();
    let point = heap.object_create(Some(proto));

    let copy = clone_object(&mut heap, point);
    assert_eq!(heap.get_property(copy, "constructor").unwrap(), Value::Object(ctor));
}

#[test]
fn test_functions_are_shared() {
    let mut heap = Heap::new();
    let func = heap.new_function("callback", 1, |_, _, args| Ok(args.first().cloned().unwrap_or_default()));
    heap.set_property(func, "custom", "prop").unwrap();
    let holder = heap.new_object();
    heap.set_property(holder, "callback", func).unwrap();

    assert_eq!(deep_clone(&mut heap, &Value::Object(func)).unwrap(), Value::Object(func));

    let copy = clone_object(&mut heap, holder);
    assert_eq!(heap.get_property(copy, "callback").unwrap(), Value::Object(func));
}

#[test]
fn test_symbol_valued_property_keeps_identity() {
    let mut heap = Heap::new();
    let sym = facsimile_core::Symbol::new(Some("token"));
    let obj = heap.new_object();
    heap.set_property(obj, "token", sym.clone()).unwrap();

    let copy = clone_object(&mut heap, obj);
    let copied = heap.get_property(copy, "token").unwrap();
    assert_eq!(copied.as_symbol(), Some(&sym));
    assert_eq!(
        heap.own_property_keys(copy).unwrap(),
        vec![PropertyKey::from("token")]
    );
}
