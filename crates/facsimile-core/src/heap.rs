//! Object heap
//!
//! All objects live in a single arena owned by [`Heap`] and are addressed by
//! [`ObjectId`]. The first slots hold the realm intrinsics: one prototype and
//! one constructor per [`Builtin`], so every heap starts with the same
//! well-known objects.
//!
//! # Layout
//!
//! ```text
//! id 0   Object.prototype        id 1   Object
//! id 2   Function.prototype      id 3   Function
//! id 4   Array.prototype         id 5   Array
//! ...
//! id 2n  <first user object>
//! ```
//!
//! Objects are never freed individually. A [`HeapCheckpoint`] records the
//! arena length so a failed multi-object operation can discard everything it
//! allocated with [`Heap::rollback`].

use crate::object::{
    ArrayObject, BufferObject, DateObject, FunctionObject, HeapObject, HostObject,
    IntegrityLevel, MapObject, NativeFn, ObjectKind, RegExpObject, SetObject,
};
use crate::property::{Property, PropertyKey, Slot};
use crate::value::Value;
use crate::HeapError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Handle to an object on the [`Heap`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Position of the object in the arena
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Built-in constructors whose prototype/constructor pair is preallocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `Object`
    Object,
    /// `Function`
    Function,
    /// `Array`
    Array,
    /// `Map`
    Map,
    /// `Set`
    Set,
    /// `Date`
    Date,
    /// `RegExp`
    RegExp,
    /// `ArrayBuffer`
    ArrayBuffer,
    /// `Error`
    Error,
    /// `Boolean`
    Boolean,
    /// `Number`
    Number,
    /// `String`
    String,
    /// `BigInt`
    BigInt,
    /// `Symbol`
    Symbol,
}

impl Builtin {
    /// Every builtin, in allocation order
    pub const ALL: [Builtin; 14] = [
        Builtin::Object,
        Builtin::Function,
        Builtin::Array,
        Builtin::Map,
        Builtin::Set,
        Builtin::Date,
        Builtin::RegExp,
        Builtin::ArrayBuffer,
        Builtin::Error,
        Builtin::Boolean,
        Builtin::Number,
        Builtin::String,
        Builtin::BigInt,
        Builtin::Symbol,
    ];

    /// Constructor name
    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Object => "Object",
            Builtin::Function => "Function",
            Builtin::Array => "Array",
            Builtin::Map => "Map",
            Builtin::Set => "Set",
            Builtin::Date => "Date",
            Builtin::RegExp => "RegExp",
            Builtin::ArrayBuffer => "ArrayBuffer",
            Builtin::Error => "Error",
            Builtin::Boolean => "Boolean",
            Builtin::Number => "Number",
            Builtin::String => "String",
            Builtin::BigInt => "BigInt",
            Builtin::Symbol => "Symbol",
        }
    }

    const fn ordinal(self) -> u32 {
        self as u32
    }
}

const INTRINSIC_COUNT: usize = Builtin::ALL.len() * 2;

/// Arena length recorded by [`Heap::checkpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapCheckpoint {
    len: usize,
}

/// Arena of heap objects plus the realm intrinsics
#[derive(Debug, Clone)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    /// Create a heap with the intrinsics allocated
    pub fn new() -> Self {
        let mut heap = Self {
            objects: Vec::with_capacity(INTRINSIC_COUNT * 2),
        };
        heap.install_intrinsics();
        heap
    }

    fn install_intrinsics(&mut self) {
        let object_prototype = ObjectId(0);
        let function_prototype = ObjectId(Builtin::Function.ordinal() * 2);

        for builtin in Builtin::ALL {
            let parent = (builtin != Builtin::Object).then_some(object_prototype);
            self.objects.push(HeapObject::new(ObjectKind::Ordinary, parent));

            let name = builtin.name();
            let behavior = native(move |_, _, _| {
                Err(HeapError::NativeFailure {
                    function: name.to_string(),
                    message: "constructor must be invoked through the heap allocators".to_string(),
                })
            });
            self.objects.push(HeapObject::new(
                ObjectKind::Function(FunctionObject::new(name, 1, behavior)),
                Some(function_prototype),
            ));
        }

        for builtin in Builtin::ALL {
            let proto = self.intrinsic_prototype(builtin);
            let ctor = self.intrinsic_constructor(builtin);
            let ctor_props = &mut self.objects[ctor.index()].properties;
            ctor_props.insert("length".into(), Property::data_with(1, false, false, true));
            ctor_props.insert("name".into(), Property::data_with(builtin.name(), false, false, true));
            ctor_props.insert("prototype".into(), Property::data_with(proto, false, false, false));
            self.objects[proto.index()]
                .properties
                .insert("constructor".into(), Property::hidden(ctor));
        }

        let error_proto = self.intrinsic_prototype(Builtin::Error);
        let props = &mut self.objects[error_proto.index()].properties;
        props.insert("name".into(), Property::hidden("Error"));
        props.insert("message".into(), Property::hidden(""));
    }

    /// Prototype object of a builtin
    pub const fn intrinsic_prototype(&self, builtin: Builtin) -> ObjectId {
        ObjectId(builtin.ordinal() * 2)
    }

    /// Constructor function of a builtin
    pub const fn intrinsic_constructor(&self, builtin: Builtin) -> ObjectId {
        ObjectId(builtin.ordinal() * 2 + 1)
    }

    /// Check if an object is one of the realm intrinsics
    pub const fn is_intrinsic(&self, id: ObjectId) -> bool {
        id.index() < INTRINSIC_COUNT
    }

    /// Prototype a freshly allocated object of this kind receives
    pub fn default_prototype(&self, kind: &ObjectKind) -> ObjectId {
        let builtin = match kind {
            ObjectKind::Ordinary | ObjectKind::Host(_) => Builtin::Object,
            ObjectKind::Array(_) => Builtin::Array,
            ObjectKind::Map(_) => Builtin::Map,
            ObjectKind::Set(_) => Builtin::Set,
            ObjectKind::Date(_) => Builtin::Date,
            ObjectKind::RegExp(_) => Builtin::RegExp,
            ObjectKind::Buffer(_) => Builtin::ArrayBuffer,
            ObjectKind::Function(_) => Builtin::Function,
            ObjectKind::Boxed(Value::Bool(_)) => Builtin::Boolean,
            ObjectKind::Boxed(Value::Number(_)) => Builtin::Number,
            ObjectKind::Boxed(Value::String(_)) => Builtin::String,
            ObjectKind::Boxed(Value::BigInt(_)) => Builtin::BigInt,
            ObjectKind::Boxed(Value::Symbol(_)) => Builtin::Symbol,
            ObjectKind::Boxed(_) => Builtin::Object,
        };
        self.intrinsic_prototype(builtin)
    }

    /// Number of objects on the heap, intrinsics included
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the heap holds nothing but intrinsics
    pub fn is_empty(&self) -> bool {
        self.objects.len() == INTRINSIC_COUNT
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Allocate an object
    pub fn alloc(&mut self, object: HeapObject) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    /// Allocate an object of `kind` with its default prototype
    pub fn alloc_kind(&mut self, kind: ObjectKind) -> ObjectId {
        let proto = self.default_prototype(&kind);
        self.alloc(HeapObject::new(kind, Some(proto)))
    }

    /// `{}`
    pub fn new_object(&mut self) -> ObjectId {
        self.alloc_kind(ObjectKind::Ordinary)
    }

    /// `Object.create(proto)`
    pub fn object_create(&mut self, proto: Option<ObjectId>) -> ObjectId {
        self.alloc(HeapObject::new(ObjectKind::Ordinary, proto))
    }

    /// Dense array of `values`
    pub fn new_array(&mut self, values: impl IntoIterator<Item = Value>) -> ObjectId {
        self.alloc_kind(ObjectKind::Array(ArrayObject::from_values(values)))
    }

    /// Empty `Map`
    pub fn new_map(&mut self) -> ObjectId {
        self.alloc_kind(ObjectKind::Map(MapObject::new()))
    }

    /// Empty `Set`
    pub fn new_set(&mut self) -> ObjectId {
        self.alloc_kind(ObjectKind::Set(SetObject::new()))
    }

    /// `Date` at `time` milliseconds since the epoch
    pub fn new_date(&mut self, time: f64) -> ObjectId {
        self.alloc_kind(ObjectKind::Date(DateObject::from_timestamp(time)))
    }

    /// `RegExp` with `lastIndex` initialised to 0
    pub fn new_regexp(&mut self, source: &str, flags: &str) -> Result<ObjectId, HeapError> {
        let re = RegExpObject::new(source, flags)?;
        let id = self.alloc_kind(ObjectKind::RegExp(re));
        self.objects[id.index()]
            .properties
            .insert("lastIndex".into(), Property::data_with(0, true, false, false));
        Ok(id)
    }

    /// Zero-filled `ArrayBuffer`
    pub fn new_buffer(&mut self, size: usize) -> ObjectId {
        self.alloc_kind(ObjectKind::Buffer(BufferObject::new(size)))
    }

    /// `ArrayBuffer` holding exactly `data`
    pub fn new_buffer_from(&mut self, data: Vec<u8>) -> ObjectId {
        self.alloc_kind(ObjectKind::Buffer(BufferObject::from_bytes(data)))
    }

    /// Function with native behavior and own `length`/`name` properties
    pub fn new_function<F>(&mut self, name: &str, arity: u32, behavior: F) -> ObjectId
    where
        F: Fn(&mut Heap, &Value, &[Value]) -> Result<Value, HeapError> + Send + Sync + 'static,
    {
        let func = FunctionObject::new(name, arity, native(behavior));
        let id = self.alloc_kind(ObjectKind::Function(func));
        let props = &mut self.objects[id.index()].properties;
        props.insert("length".into(), Property::data_with(arity as f64, false, false, true));
        props.insert("name".into(), Property::data_with(name, false, false, true));
        id
    }

    /// Object wrapper around a primitive
    pub fn new_boxed(&mut self, primitive: Value) -> Result<ObjectId, HeapError> {
        match primitive {
            Value::Undefined | Value::Null | Value::Object(_) => {
                Err(HeapError::InvalidBoxedPrimitive(primitive.type_name()))
            }
            other => Ok(self.alloc_kind(ObjectKind::Boxed(other))),
        }
    }

    /// Opaque host resource
    pub fn new_host(&mut self, type_name: &str, payload: Arc<dyn Any + Send + Sync>) -> ObjectId {
        self.alloc_kind(ObjectKind::Host(HostObject::new(type_name, payload)))
    }

    /// `new Error(message)` with non-enumerable `message` and `stack`
    pub fn new_error(&mut self, message: &str) -> ObjectId {
        let proto = self.intrinsic_prototype(Builtin::Error);
        let id = self.object_create(Some(proto));
        let props = &mut self.objects[id.index()].properties;
        props.insert("stack".into(), Property::hidden(format!("Error: {}\n    at <anonymous>", message)));
        props.insert("message".into(), Property::hidden(message));
        id
    }

    // ------------------------------------------------------------------
    // Raw access
    // ------------------------------------------------------------------

    /// Borrow an object
    pub fn get(&self, id: ObjectId) -> Result<&HeapObject, HeapError> {
        self.objects.get(id.index()).ok_or(HeapError::InvalidObject(id))
    }

    /// Borrow an object mutably
    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut HeapObject, HeapError> {
        self.objects.get_mut(id.index()).ok_or(HeapError::InvalidObject(id))
    }

    /// Prototype link
    pub fn get_prototype_of(&self, id: ObjectId) -> Result<Option<ObjectId>, HeapError> {
        Ok(self.get(id)?.prototype)
    }

    /// Replace the prototype link
    pub fn set_prototype_of(&mut self, id: ObjectId, proto: Option<ObjectId>) -> Result<(), HeapError> {
        let current = self.get(id)?;
        if current.prototype == proto {
            return Ok(());
        }
        if !current.extensible {
            return Err(HeapError::NonExtensible {
                key: "[[Prototype]]".to_string(),
            });
        }
        let mut cursor = proto;
        while let Some(p) = cursor {
            if p == id {
                return Err(HeapError::PrototypeCycle(id));
            }
            cursor = self.get(p)?.prototype;
        }
        self.get_mut(id)?.prototype = proto;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Own property by key; array indices resolve to elements
    pub fn get_own_property(&self, id: ObjectId, key: &PropertyKey) -> Result<Option<Property>, HeapError> {
        let object = self.get(id)?;
        if let (ObjectKind::Array(arr), Some(i)) = (&object.kind, key.array_index()) {
            return Ok(arr.element(i as usize).cloned());
        }
        Ok(object.properties.get(key).cloned())
    }

    /// Own keys in own-key order (elements first for arrays)
    pub fn own_property_keys(&self, id: ObjectId) -> Result<Vec<PropertyKey>, HeapError> {
        let object = self.get(id)?;
        let mut keys = Vec::new();
        if let ObjectKind::Array(arr) = &object.kind {
            keys.extend(
                arr.elements
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.is_some())
                    .map(|(i, _)| PropertyKey::from(i as u32)),
            );
        }
        keys.extend(object.properties.ordered_keys());
        Ok(keys)
    }

    /// `Object.defineProperty` with strict failure semantics
    ///
    /// New keys require an extensible object. Redefining a non-configurable
    /// property is only allowed where the language allows it: lowering
    /// `writable`, or changing the value of a still-writable data slot.
    pub fn define_own_property(&mut self, id: ObjectId, key: PropertyKey, property: Property) -> Result<(), HeapError> {
        let existing = self.get_own_property(id, &key)?;
        let object = self.get_mut(id)?;
        match existing {
            None if !object.extensible => {
                return Err(HeapError::NonExtensible { key: key.to_string() });
            }
            Some(current) if !current.configurable && !compatible_redefinition(&current, &property) => {
                return Err(HeapError::NonConfigurable { key: key.to_string() });
            }
            _ => {}
        }
        if let (ObjectKind::Array(arr), Some(i)) = (&mut object.kind, key.array_index()) {
            arr.set_element(i as usize, property);
            return Ok(());
        }
        object.properties.insert(key, property);
        Ok(())
    }

    /// `[[Get]]`: walks the prototype chain and runs getters with `this = id`
    pub fn get_property(&mut self, id: ObjectId, key: impl Into<PropertyKey>) -> Result<Value, HeapError> {
        let key = key.into();
        if let Some(v) = self.virtual_property(id, &key)? {
            return Ok(v);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if let Some(prop) = self.get_own_property(current, &key)? {
                return match prop.slot {
                    Slot::Data { value, .. } => Ok(value),
                    Slot::Accessor { get: Some(getter), .. } => self.call(&getter, &Value::Object(id), &[]),
                    Slot::Accessor { get: None, .. } => Ok(Value::Undefined),
                };
            }
            cursor = self.get(current)?.prototype;
        }
        Ok(Value::Undefined)
    }

    /// `[[Set]]` with strict failure semantics
    pub fn set_property(&mut self, id: ObjectId, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<(), HeapError> {
        let key = key.into();
        let value = value.into();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if let Some(prop) = self.get_own_property(current, &key)? {
                match prop.slot {
                    Slot::Accessor { set: Some(setter), .. } => {
                        self.call(&setter, &Value::Object(id), &[value])?;
                        return Ok(());
                    }
                    Slot::Accessor { set: None, .. } | Slot::Data { writable: false, .. } => {
                        return Err(HeapError::NonWritable { key: key.to_string() });
                    }
                    Slot::Data { writable: true, .. } if current == id => {
                        let updated = Property { slot: Slot::Data { value, writable: true }, ..prop };
                        return self.define_own_property(id, key, updated);
                    }
                    Slot::Data { writable: true, .. } => break,
                }
            }
            cursor = self.get(current)?.prototype;
        }
        self.define_own_property(id, key, Property::data(value))
    }

    /// `delete obj[key]` with strict failure semantics
    pub fn delete_property(&mut self, id: ObjectId, key: impl Into<PropertyKey>) -> Result<bool, HeapError> {
        let key = key.into();
        match self.get_own_property(id, &key)? {
            None => return Ok(false),
            Some(p) if !p.configurable => {
                return Err(HeapError::NonConfigurable { key: key.to_string() });
            }
            Some(_) => {}
        }
        let object = self.get_mut(id)?;
        if let (ObjectKind::Array(arr), Some(i)) = (&mut object.kind, key.array_index()) {
            if let Some(slot) = arr.elements.get_mut(i as usize) {
                *slot = None;
            }
            return Ok(true);
        }
        Ok(object.properties.remove(&key).is_some())
    }

    /// Built-in accessors served without a prototype lookup
    fn virtual_property(&self, id: ObjectId, key: &PropertyKey) -> Result<Option<Value>, HeapError> {
        let Some(name) = key.as_str() else {
            return Ok(None);
        };
        let object = self.get(id)?;
        let value = match (&object.kind, name) {
            (ObjectKind::Array(arr), "length") => Value::from(arr.len() as f64),
            (ObjectKind::Map(map), "size") => Value::from(map.size() as f64),
            (ObjectKind::Set(set), "size") => Value::from(set.size() as f64),
            (ObjectKind::Buffer(buf), "byteLength") => Value::from(buf.byte_length() as f64),
            (ObjectKind::RegExp(re), "source") => Value::string(&re.source),
            (ObjectKind::RegExp(re), "flags") => Value::string(&re.flags),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    /// Invoke a callable value
    pub fn call(&mut self, callee: &Value, this: &Value, args: &[Value]) -> Result<Value, HeapError> {
        let id = callee.as_object().ok_or(HeapError::NotCallableValue(callee.type_name()))?;
        let behavior = match &self.get(id)?.kind {
            ObjectKind::Function(f) => f.behavior(),
            _ => return Err(HeapError::NotCallable(id)),
        };
        behavior(self, this, args)
    }

    // ------------------------------------------------------------------
    // Built-in payloads
    // ------------------------------------------------------------------

    /// Borrow an array payload
    pub fn array(&self, id: ObjectId) -> Result<&ArrayObject, HeapError> {
        match &self.get(id)?.kind {
            ObjectKind::Array(a) => Ok(a),
            other => Err(wrong_kind(id, "Array", other)),
        }
    }

    /// Borrow an array payload mutably
    pub fn array_mut(&mut self, id: ObjectId) -> Result<&mut ArrayObject, HeapError> {
        match &mut self.get_mut(id)?.kind {
            ObjectKind::Array(a) => Ok(a),
            other => Err(wrong_kind(id, "Array", other)),
        }
    }

    /// `arr.push(value)`
    pub fn array_push(&mut self, id: ObjectId, value: impl Into<Value>) -> Result<usize, HeapError> {
        if !self.get(id)?.extensible {
            return Err(HeapError::NonExtensible {
                key: self.array(id)?.len().to_string(),
            });
        }
        Ok(self.array_mut(id)?.push(value.into()))
    }

    /// `arr.pop()`
    pub fn array_pop(&mut self, id: ObjectId) -> Result<Value, HeapError> {
        let len = self.array(id)?.len();
        if len == 0 {
            return Ok(Value::Undefined);
        }
        let key = PropertyKey::from((len - 1) as u32);
        let value = self.get_property(id, key.clone())?;
        if let Some(p) = self.array(id)?.element(len - 1) {
            if !p.configurable {
                return Err(HeapError::NonConfigurable { key: key.to_string() });
            }
        }
        self.array_mut(id)?.pop();
        Ok(value)
    }

    /// Borrow a map payload
    pub fn map(&self, id: ObjectId) -> Result<&MapObject, HeapError> {
        match &self.get(id)?.kind {
            ObjectKind::Map(m) => Ok(m),
            other => Err(wrong_kind(id, "Map", other)),
        }
    }

    fn map_mut(&mut self, id: ObjectId) -> Result<&mut MapObject, HeapError> {
        match &mut self.get_mut(id)?.kind {
            ObjectKind::Map(m) => Ok(m),
            other => Err(wrong_kind(id, "Map", other)),
        }
    }

    /// `map.set(key, value)`
    pub fn map_set(&mut self, id: ObjectId, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), HeapError> {
        self.map_mut(id)?.set(key.into(), value.into());
        Ok(())
    }

    /// `map.get(key)`
    pub fn map_get(&self, id: ObjectId, key: &Value) -> Result<Value, HeapError> {
        Ok(self.map(id)?.get(key).cloned().unwrap_or_default())
    }

    /// `map.delete(key)`
    pub fn map_delete(&mut self, id: ObjectId, key: &Value) -> Result<bool, HeapError> {
        Ok(self.map_mut(id)?.delete(key))
    }

    /// `Array.from(map)`
    pub fn map_entries(&self, id: ObjectId) -> Result<Vec<(Value, Value)>, HeapError> {
        Ok(self.map(id)?.entries().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Borrow a set payload
    pub fn set(&self, id: ObjectId) -> Result<&SetObject, HeapError> {
        match &self.get(id)?.kind {
            ObjectKind::Set(s) => Ok(s),
            other => Err(wrong_kind(id, "Set", other)),
        }
    }

    fn set_mut(&mut self, id: ObjectId) -> Result<&mut SetObject, HeapError> {
        match &mut self.get_mut(id)?.kind {
            ObjectKind::Set(s) => Ok(s),
            other => Err(wrong_kind(id, "Set", other)),
        }
    }

    /// `set.add(value)`
    pub fn set_add(&mut self, id: ObjectId, value: impl Into<Value>) -> Result<(), HeapError> {
        self.set_mut(id)?.add(value.into());
        Ok(())
    }

    /// `set.has(value)`
    pub fn set_has(&self, id: ObjectId, value: &Value) -> Result<bool, HeapError> {
        Ok(self.set(id)?.has(value))
    }

    /// `set.delete(value)`
    pub fn set_delete(&mut self, id: ObjectId, value: &Value) -> Result<bool, HeapError> {
        Ok(self.set_mut(id)?.delete(value))
    }

    /// `Array.from(set)`
    pub fn set_values(&self, id: ObjectId) -> Result<Vec<Value>, HeapError> {
        Ok(self.set(id)?.values().cloned().collect())
    }

    /// `date.getTime()`
    pub fn date_time(&self, id: ObjectId) -> Result<f64, HeapError> {
        match &self.get(id)?.kind {
            ObjectKind::Date(d) => Ok(d.get_time()),
            other => Err(wrong_kind(id, "Date", other)),
        }
    }

    /// `date.setTime(time)`
    pub fn set_date_time(&mut self, id: ObjectId, time: f64) -> Result<(), HeapError> {
        match &mut self.get_mut(id)?.kind {
            ObjectKind::Date(d) => {
                d.time = time;
                Ok(())
            }
            other => Err(wrong_kind(id, "Date", other)),
        }
    }

    /// Borrow a regexp payload
    pub fn regexp(&self, id: ObjectId) -> Result<&RegExpObject, HeapError> {
        match &self.get(id)?.kind {
            ObjectKind::RegExp(r) => Ok(r),
            other => Err(wrong_kind(id, "RegExp", other)),
        }
    }

    /// `re.exec(text)`: a match-result array with `index`, `input` and
    /// `groups`, or null. Global and sticky patterns advance `lastIndex`.
    pub fn regexp_exec(&mut self, id: ObjectId, text: &str) -> Result<Value, HeapError> {
        let re = self.regexp(id)?.clone();
        let advances = re.global() || re.sticky();
        let start = if advances {
            match self.get_property(id, "lastIndex")? {
                Value::Number(n) if n >= 0.0 => n as usize,
                _ => 0,
            }
        } else {
            0
        };

        let Some(m) = re.exec_at(text, start) else {
            if advances {
                self.set_property(id, "lastIndex", 0)?;
            }
            return Ok(Value::Null);
        };

        if advances {
            self.set_property(id, "lastIndex", (m.index + m.matched.len()) as f64)?;
        }

        let mut values = vec![Value::from(m.matched.as_str())];
        values.extend(
            m.groups
                .iter()
                .map(|g| g.as_deref().map(Value::from).unwrap_or_default()),
        );
        let result = self.new_array(values);
        self.define_own_property(result, "index".into(), Property::data(m.index as f64))?;
        self.define_own_property(result, "input".into(), Property::data(text))?;
        self.define_own_property(result, "groups".into(), Property::data(Value::Undefined))?;
        Ok(Value::Object(result))
    }

    /// Borrow the bytes of a buffer
    pub fn buffer_bytes(&self, id: ObjectId) -> Result<&[u8], HeapError> {
        match &self.get(id)?.kind {
            ObjectKind::Buffer(b) => Ok(&b.data),
            other => Err(wrong_kind(id, "ArrayBuffer", other)),
        }
    }

    /// Borrow the bytes of a buffer mutably
    pub fn buffer_bytes_mut(&mut self, id: ObjectId) -> Result<&mut [u8], HeapError> {
        match &mut self.get_mut(id)?.kind {
            ObjectKind::Buffer(b) => Ok(&mut b.data),
            other => Err(wrong_kind(id, "ArrayBuffer", other)),
        }
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// `Object.preventExtensions`
    pub fn prevent_extensions(&mut self, id: ObjectId) -> Result<(), HeapError> {
        self.get_mut(id)?.extensible = false;
        Ok(())
    }

    /// `Object.seal`
    pub fn seal(&mut self, id: ObjectId) -> Result<(), HeapError> {
        self.restrict(id, false)
    }

    /// `Object.freeze`
    pub fn freeze(&mut self, id: ObjectId) -> Result<(), HeapError> {
        self.restrict(id, true)
    }

    fn restrict(&mut self, id: ObjectId, freeze: bool) -> Result<(), HeapError> {
        let object = self.get_mut(id)?;
        object.extensible = false;
        let elements = match &mut object.kind {
            ObjectKind::Array(arr) => arr.elements.iter_mut().flatten().collect::<Vec<_>>(),
            _ => Vec::new(),
        };
        for prop in elements.into_iter().chain(object.properties.values_mut()) {
            prop.configurable = false;
            if let (true, Slot::Data { writable, .. }) = (freeze, &mut prop.slot) {
                *writable = false;
            }
        }
        Ok(())
    }

    /// `Object.isExtensible`
    pub fn is_extensible(&self, id: ObjectId) -> Result<bool, HeapError> {
        Ok(self.get(id)?.extensible)
    }

    /// `Object.isSealed`
    pub fn is_sealed(&self, id: ObjectId) -> Result<bool, HeapError> {
        Ok(matches!(
            self.integrity_level(id)?,
            IntegrityLevel::Sealed | IntegrityLevel::Frozen
        ))
    }

    /// `Object.isFrozen`
    pub fn is_frozen(&self, id: ObjectId) -> Result<bool, HeapError> {
        Ok(self.integrity_level(id)? == IntegrityLevel::Frozen)
    }

    /// Strongest integrity level the object currently satisfies
    pub fn integrity_level(&self, id: ObjectId) -> Result<IntegrityLevel, HeapError> {
        let object = self.get(id)?;
        if object.extensible {
            return Ok(IntegrityLevel::Extensible);
        }
        let elements: Box<dyn Iterator<Item = &Property> + '_> = match &object.kind {
            ObjectKind::Array(arr) => Box::new(arr.elements.iter().flatten()),
            _ => Box::new(std::iter::empty()),
        };
        let mut sealed = true;
        let mut frozen = true;
        for prop in elements.chain(object.properties.iter().map(|(_, p)| p)) {
            if prop.configurable {
                sealed = false;
                frozen = false;
                break;
            }
            if prop.writable() == Some(true) {
                frozen = false;
            }
        }
        Ok(match (sealed, frozen) {
            (true, true) => IntegrityLevel::Frozen,
            (true, false) => IntegrityLevel::Sealed,
            _ => IntegrityLevel::NonExtensible,
        })
    }

    // ------------------------------------------------------------------
    // Checkpoints
    // ------------------------------------------------------------------

    /// Record the current arena length
    pub fn checkpoint(&self) -> HeapCheckpoint {
        HeapCheckpoint {
            len: self.objects.len(),
        }
    }

    /// Discard every object allocated after `checkpoint`
    ///
    /// Objects that existed at the checkpoint must not have been made to
    /// reference the discarded ones.
    pub fn rollback(&mut self, checkpoint: HeapCheckpoint) {
        let len = checkpoint.len.max(INTRINSIC_COUNT);
        if len < self.objects.len() {
            trace!(discarded = self.objects.len() - len, "heap rollback");
            self.objects.truncate(len);
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

fn native<F>(behavior: F) -> NativeFn
where
    F: Fn(&mut Heap, &Value, &[Value]) -> Result<Value, HeapError> + Send + Sync + 'static,
{
    Arc::new(behavior)
}

fn wrong_kind(id: ObjectId, expected: &'static str, found: &ObjectKind) -> HeapError {
    HeapError::WrongKind {
        id,
        expected,
        found: found.name(),
    }
}

fn compatible_redefinition(current: &Property, next: &Property) -> bool {
    if next.configurable || next.enumerable != current.enumerable {
        return false;
    }
    match (&current.slot, &next.slot) {
        (Slot::Data { writable: true, .. }, Slot::Data { .. }) => true,
        (Slot::Data { value: a, writable: false }, Slot::Data { value: b, writable: false }) => a.same_value(b),
        (Slot::Accessor { get: g1, set: s1 }, Slot::Accessor { get: g2, set: s2 }) => g1 == g2 && s1 == s2,
        _ => false,
    }
}
