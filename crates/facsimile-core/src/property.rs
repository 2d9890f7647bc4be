//! Property keys, descriptors, and ordered own-property storage

use crate::value::{Symbol, Value};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Key of an own property: text or a unique symbol
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Text key
    String(Arc<str>),
    /// Symbol key
    Symbol(Symbol),
}

impl PropertyKey {
    /// Text of a string key
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }

    /// Check if this is a symbol key
    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }

    /// Canonical array index (`"0"`, `"17"`, never `"01"` or `"4294967295"`)
    pub fn array_index(&self) -> Option<u32> {
        let s = self.as_str()?;
        if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
            return None;
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match s.parse::<u32>() {
            Ok(i) if i != u32::MAX => Some(i),
            _ => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(Arc::from(s))
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::String(Arc::from(s))
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        PropertyKey::String(Arc::from(i.to_string()))
    }
}

impl From<Symbol> for PropertyKey {
    fn from(s: Symbol) -> Self {
        PropertyKey::Symbol(s)
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{:?}", s),
            PropertyKey::Symbol(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// Storage half of a property: a data slot or an accessor pair
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Plain value
    Data {
        /// Stored value
        value: Value,
        /// Whether assignment may replace the value
        writable: bool,
    },
    /// Getter/setter pair; either side may be absent
    Accessor {
        /// Getter function (an object reference) or `None`
        get: Option<Value>,
        /// Setter function (an object reference) or `None`
        set: Option<Value>,
    },
}

/// An own property: slot plus attribute flags
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Data or accessor storage
    pub slot: Slot,
    /// Visible to enumeration
    pub enumerable: bool,
    /// May be deleted or redefined
    pub configurable: bool,
}

impl Property {
    /// Data property with every flag set, as produced by assignment
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            slot: Slot::Data {
                value: value.into(),
                writable: true,
            },
            enumerable: true,
            configurable: true,
        }
    }

    /// Data property with explicit flags
    pub fn data_with(value: impl Into<Value>, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            slot: Slot::Data {
                value: value.into(),
                writable,
            },
            enumerable,
            configurable,
        }
    }

    /// Writable, configurable, non-enumerable data property (built-in style)
    pub fn hidden(value: impl Into<Value>) -> Self {
        Self::data_with(value, true, false, true)
    }

    /// Accessor property, enumerable and configurable
    pub fn accessor(get: Option<Value>, set: Option<Value>) -> Self {
        Self {
            slot: Slot::Accessor { get, set },
            enumerable: true,
            configurable: true,
        }
    }

    /// Replace the enumerable flag
    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// Replace the configurable flag
    pub fn with_configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    /// Replace the writable flag (no effect on accessors)
    pub fn with_writable(mut self, writable: bool) -> Self {
        if let Slot::Data { writable: w, .. } = &mut self.slot {
            *w = writable;
        }
        self
    }

    /// Stored value of a data property
    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Data { value, .. } => Some(value),
            Slot::Accessor { .. } => None,
        }
    }

    /// Writable flag; `None` for accessors
    pub fn writable(&self) -> Option<bool> {
        match &self.slot {
            Slot::Data { writable, .. } => Some(*writable),
            Slot::Accessor { .. } => None,
        }
    }

    /// Check if this is an accessor property
    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, Slot::Accessor { .. })
    }
}

/// A property together with its key
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Property key
    pub key: PropertyKey,
    /// Slot and flags
    pub property: Property,
}

impl PropertyDescriptor {
    /// Pair a key with a property
    pub fn new(key: impl Into<PropertyKey>, property: Property) -> Self {
        Self {
            key: key.into(),
            property,
        }
    }
}

/// Own properties of an object, remembering insertion order
///
/// Replacing an existing key keeps its position; removing a key shifts the
/// later entries down.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(PropertyKey, Property)>,
    index: FxHashMap<PropertyKey, usize>,
}

impl PropertyMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no properties
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a property
    pub fn get(&self, key: &PropertyKey) -> Option<&Property> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Look up a property for mutation
    pub fn get_mut(&mut self, key: &PropertyKey) -> Option<&mut Property> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Check if a key is present
    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace a property, returning the previous one
    pub fn insert(&mut self, key: PropertyKey, property: Property) -> Option<Property> {
        if let Some(&i) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[i].1, property));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, property));
        None
    }

    /// Remove a property
    pub fn remove(&mut self, key: &PropertyKey) -> Option<Property> {
        let i = self.index.remove(key)?;
        let (_, property) = self.entries.remove(i);
        for (k, _) in &self.entries[i..] {
            if let Some(slot) = self.index.get_mut(k) {
                *slot -= 1;
            }
        }
        Some(property)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &Property)> {
        self.entries.iter().map(|(k, p)| (k, p))
    }

    /// Iterate mutably over properties in insertion order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.entries.iter_mut().map(|(_, p)| p)
    }

    /// Keys in own-key order: array indices ascending, then other strings in
    /// insertion order, then symbols in insertion order
    pub fn ordered_keys(&self) -> Vec<PropertyKey> {
        let mut indices: Vec<(u32, &PropertyKey)> = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for (key, _) in &self.entries {
            if let Some(i) = key.array_index() {
                indices.push((i, key));
            } else if key.is_symbol() {
                symbols.push(key.clone());
            } else {
                strings.push(key.clone());
            }
        }
        indices.sort_by_key(|(i, _)| *i);
        indices
            .into_iter()
            .map(|(_, k)| k.clone())
            .chain(strings)
            .chain(symbols)
            .collect()
    }
}
