//! Object model: heap objects and built-in payloads

use crate::heap::{Heap, ObjectId};
use crate::property::{Property, PropertyMap};
use crate::value::Value;
use crate::HeapError;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Native behavior of a callable: `(heap, this, args) -> result`
pub type NativeFn = Arc<dyn Fn(&mut Heap, &Value, &[Value]) -> Result<Value, HeapError> + Send + Sync>;

/// Object instance (heap-allocated)
#[derive(Debug, Clone)]
pub struct HeapObject {
    /// Built-in payload
    pub kind: ObjectKind,
    /// Prototype link (`None` for `Object.create(null)`-style objects)
    pub prototype: Option<ObjectId>,
    /// Own named properties (array elements live in the payload)
    pub properties: PropertyMap,
    /// Whether new properties may be added
    pub extensible: bool,
}

impl HeapObject {
    /// Create an extensible object with no own properties
    pub fn new(kind: ObjectKind, prototype: Option<ObjectId>) -> Self {
        Self {
            kind,
            prototype,
            properties: PropertyMap::new(),
            extensible: true,
        }
    }
}

/// Built-in payload carried by an object
#[derive(Debug, Clone)]
pub enum ObjectKind {
    /// Plain property bag
    Ordinary,
    /// Length-indexed sequence
    Array(ArrayObject),
    /// Insertion-ordered key/value map
    Map(MapObject),
    /// Insertion-ordered set of unique values
    Set(SetObject),
    /// Point in time
    Date(DateObject),
    /// Regular expression
    RegExp(RegExpObject),
    /// Fixed-length byte buffer
    Buffer(BufferObject),
    /// Executable behavior
    Function(FunctionObject),
    /// Object wrapper around a primitive (`new String("x")`)
    Boxed(Value),
    /// Opaque host resource (timer, socket, handle)
    Host(HostObject),
}

impl ObjectKind {
    /// Name of the payload kind, for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Map(_) => "Map",
            ObjectKind::Set(_) => "Set",
            ObjectKind::Date(_) => "Date",
            ObjectKind::RegExp(_) => "RegExp",
            ObjectKind::Buffer(_) => "ArrayBuffer",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Boxed(_) => "Boxed",
            ObjectKind::Host(_) => "Host",
        }
    }
}

/// Extensibility state of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityLevel {
    /// New properties may be added
    Extensible,
    /// No new properties, but existing ones are unrestricted
    NonExtensible,
    /// Non-extensible and every property non-configurable
    Sealed,
    /// Sealed and every data property non-writable
    Frozen,
}

/// Array object (heap-allocated)
///
/// Each element carries its own attribute flags; `None` is a hole.
#[derive(Debug, Clone, Default)]
pub struct ArrayObject {
    /// Array elements
    pub elements: Vec<Option<Property>>,
}

impl ArrayObject {
    /// Create an empty array
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dense array from values
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            elements: values.into_iter().map(|v| Some(Property::data(v))).collect(),
        }
    }

    /// Get array length
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if array is empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element property at index (`None` for holes and out-of-range)
    pub fn element(&self, index: usize) -> Option<&Property> {
        self.elements.get(index).and_then(|e| e.as_ref())
    }

    /// Data value at index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.element(index).and_then(|p| p.value())
    }

    /// Push a data element, returns new length
    pub fn push(&mut self, value: Value) -> usize {
        self.elements.push(Some(Property::data(value)));
        self.elements.len()
    }

    /// Install an element, growing with holes if needed
    pub fn set_element(&mut self, index: usize, property: Property) {
        if index >= self.elements.len() {
            self.elements.resize(index + 1, None);
        }
        self.elements[index] = Some(property);
    }

    /// Pop the last element
    pub fn pop(&mut self) -> Option<Option<Property>> {
        self.elements.pop()
    }
}

/// Wrapper type for Value that implements Hash and Eq with SameValueZero
/// semantics, for use as a map/set key
///
/// `-0` hashes like `+0`, every NaN hashes alike, strings hash by content,
/// symbols and objects by identity.
#[derive(Clone, Debug)]
pub struct MapKey(pub Value);

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Value::Undefined => 0u8.hash(state),
            Value::Null => 1u8.hash(state),
            Value::Bool(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Value::Number(n) => {
                3u8.hash(state);
                let bits = if n.is_nan() {
                    f64::NAN.to_bits()
                } else if *n == 0.0 {
                    0u64
                } else {
                    n.to_bits()
                };
                bits.hash(state);
            }
            Value::BigInt(i) => {
                4u8.hash(state);
                i.hash(state);
            }
            Value::String(s) => {
                5u8.hash(state);
                s.hash(state);
            }
            Value::Symbol(s) => {
                6u8.hash(state);
                s.hash(state);
            }
            Value::Object(id) => {
                7u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_value_zero(&other.0)
    }
}

impl Eq for MapKey {}

fn normalize_key(key: Value) -> Value {
    match key {
        Value::Number(n) if n == 0.0 => Value::Number(0.0),
        other => other,
    }
}

/// Map builtin - insertion-ordered key/value store
///
/// Deleted entries leave a tombstone so iteration order of the survivors is
/// unaffected. Tombstones are compacted once they outnumber live entries.
#[derive(Debug, Clone, Default)]
pub struct MapObject {
    entries: Vec<Option<(Value, Value)>>,
    index: FxHashMap<MapKey, usize>,
}

impl MapObject {
    /// Create a new empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of entries
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Get a value by key
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let i = *self.index.get(&MapKey(key.clone()))?;
        self.entries[i].as_ref().map(|(_, v)| v)
    }

    /// Set a key-value pair; an existing key keeps its position
    pub fn set(&mut self, key: Value, value: Value) {
        let key = normalize_key(key);
        if let Some(&i) = self.index.get(&MapKey(key.clone())) {
            self.entries[i] = Some((key, value));
            return;
        }
        self.index.insert(MapKey(key.clone()), self.entries.len());
        self.entries.push(Some((key, value)));
    }

    /// Check if key exists
    pub fn has(&self, key: &Value) -> bool {
        self.index.contains_key(&MapKey(key.clone()))
    }

    /// Delete a key, returns true if key existed
    pub fn delete(&mut self, key: &Value) -> bool {
        match self.index.remove(&MapKey(key.clone())) {
            Some(i) => {
                self.entries[i] = None;
                if self.entries.len() > 2 * self.index.len() {
                    self.compact();
                }
                true
            }
            None => false,
        }
    }

    /// Drop tombstones and renumber the index
    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        for (i, (key, _)) in self.entries.iter().flatten().enumerate() {
            self.index.insert(MapKey(key.clone()), i);
        }
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().flatten().map(|(k, v)| (k, v))
    }
}

/// Set builtin - insertion-ordered collection of unique values
#[derive(Debug, Clone, Default)]
pub struct SetObject {
    entries: Vec<Option<Value>>,
    index: FxHashMap<MapKey, usize>,
}

impl SetObject {
    /// Create a new empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of elements
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Add a value to the set; re-adding keeps its first position
    pub fn add(&mut self, value: Value) {
        let value = normalize_key(value);
        let key = MapKey(value.clone());
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(Some(value));
    }

    /// Check if value exists
    pub fn has(&self, value: &Value) -> bool {
        self.index.contains_key(&MapKey(value.clone()))
    }

    /// Delete a value, returns true if value existed
    pub fn delete(&mut self, value: &Value) -> bool {
        match self.index.remove(&MapKey(value.clone())) {
            Some(i) => {
                self.entries[i] = None;
                if self.entries.len() > 2 * self.index.len() {
                    self.compact();
                }
                true
            }
            None => false,
        }
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        for (i, value) in self.entries.iter().flatten().enumerate() {
            self.index.insert(MapKey(value.clone()), i);
        }
    }

    /// Clear all elements
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().flatten()
    }
}

/// Date builtin
#[derive(Debug, Clone, Copy)]
pub struct DateObject {
    /// Milliseconds since Unix epoch (NaN for an invalid date)
    pub time: f64,
}

impl DateObject {
    /// Create a date from timestamp (milliseconds since epoch)
    pub fn from_timestamp(time: f64) -> Self {
        Self { time }
    }

    /// Get timestamp in milliseconds
    pub fn get_time(&self) -> f64 {
        self.time
    }

    /// Check if the date holds a real time
    pub fn is_valid(&self) -> bool {
        !self.time.is_nan()
    }
}

/// Single successful match of a [`RegExpObject`]
#[derive(Debug, Clone, PartialEq)]
pub struct RegExpMatch {
    /// Byte offset of the match in the subject
    pub index: usize,
    /// Matched text
    pub matched: String,
    /// Capture groups (`None` for groups that did not participate)
    pub groups: Vec<Option<String>>,
}

/// RegExp builtin - regular expression pattern
#[derive(Debug, Clone)]
pub struct RegExpObject {
    /// The pattern string
    pub source: String,
    /// Regex flags (d, g, i, m, s, u, v, y)
    pub flags: String,
    compiled: regex::Regex,
}

impl RegExpObject {
    /// Create a new RegExp from pattern and flags
    pub fn new(source: &str, flags: &str) -> Result<Self, HeapError> {
        let mut seen = String::new();
        for c in flags.chars() {
            if !"dgimsuvy".contains(c) || seen.contains(c) {
                return Err(HeapError::InvalidRegExp(format!("invalid flags '{}'", flags)));
            }
            seen.push(c);
        }

        let mut regex_pattern = String::new();
        let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
        if !inline.is_empty() {
            regex_pattern.push_str("(?");
            regex_pattern.push_str(&inline);
            regex_pattern.push(')');
        }
        regex_pattern.push_str(source);

        let compiled = regex::Regex::new(&regex_pattern)
            .map_err(|e| HeapError::InvalidRegExp(e.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            flags: flags.to_string(),
            compiled,
        })
    }

    /// Check if global flag is set
    pub fn global(&self) -> bool {
        self.flags.contains('g')
    }

    /// Check if sticky flag is set
    pub fn sticky(&self) -> bool {
        self.flags.contains('y')
    }

    /// Check if case-insensitive flag is set
    pub fn ignore_case(&self) -> bool {
        self.flags.contains('i')
    }

    /// Test if pattern matches string
    pub fn test(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }

    /// Find the first match at or after `start`
    pub fn exec_at(&self, text: &str, start: usize) -> Option<RegExpMatch> {
        if start > text.len() || !text.is_char_boundary(start) {
            return None;
        }
        let caps = self.compiled.captures_at(text, start)?;
        let full = caps.get(0)?;
        if self.sticky() && full.start() != start {
            return None;
        }
        Some(RegExpMatch {
            index: full.start(),
            matched: full.as_str().to_string(),
            groups: caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        })
    }
}

/// Buffer builtin - raw binary data buffer
#[derive(Debug, Clone, Default)]
pub struct BufferObject {
    /// Raw byte data
    pub data: Vec<u8>,
}

impl BufferObject {
    /// Create a new buffer of given size (zero-filled)
    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size] }
    }

    /// Create a buffer holding exactly these bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Get buffer length in bytes
    pub fn byte_length(&self) -> usize {
        self.data.len()
    }

    /// Get byte at index
    pub fn get_byte(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Set byte at index
    pub fn set_byte(&mut self, index: usize, value: u8) -> Result<(), HeapError> {
        match self.data.get_mut(index) {
            Some(b) => {
                *b = value;
                Ok(())
            }
            None => Err(HeapError::IndexOutOfBounds {
                index,
                length: self.data.len(),
            }),
        }
    }
}

/// Callable object
#[derive(Clone)]
pub struct FunctionObject {
    /// Function name
    pub name: Arc<str>,
    /// Declared parameter count
    pub arity: u32,
    behavior: NativeFn,
}

impl FunctionObject {
    /// Wrap native behavior
    pub fn new(name: &str, arity: u32, behavior: NativeFn) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            behavior,
        }
    }

    /// Shared handle to the behavior, so it can run while the heap is borrowed mutably
    pub fn behavior(&self) -> NativeFn {
        Arc::clone(&self.behavior)
    }
}

impl fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionObject")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Opaque host resource
#[derive(Clone)]
pub struct HostObject {
    /// Host type name (e.g. `"Timer"`, `"Socket"`)
    pub type_name: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    /// Wrap a host payload
    pub fn new(type_name: &str, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            type_name: Arc::from(type_name),
            payload,
        }
    }

    /// Shared handle to the payload
    pub fn payload(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.payload)
    }

    /// Borrow the payload as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
