//! Graph cloner
//!
//! Cloning runs in two phases per object, driven by an explicit work list
//! instead of recursion so deep graphs cannot overflow the native stack:
//!
//! 1. **Reserve**: when a reference to an unseen object is met, allocate an
//!    empty shell of the right variant, register it in the identity map and
//!    queue it. The shell is returned immediately, which is what makes
//!    cycles and shared references resolve to a single clone.
//! 2. **Populate**: when a queued shell is popped, clone its elements or
//!    entries, own properties and prototype (each child goes through
//!    reserve), then write descriptors and apply the integrity level.
//!
//! Extensibility is applied last per object, after every property has been
//! written. Any failure rolls the heap back to the state before the call.

use crate::classify::{classify_object, describe, Variant};
use crate::descriptors::{
    apply_descriptors, apply_elements, apply_extensibility, apply_prototype, DescriptorFailure,
};
use crate::error::{CloneError, CloneResult};
use crate::options::CloneOptions;
use crate::path::{Location, PathArena, PathId, PathSegment, PropertyPath};
use crate::properties::{indexed_elements, own_properties};
use crate::registry::CloneRegistry;
use crate::rules::{RuleContext, VariantRule};
use facsimile_core::{
    ArrayObject, BufferObject, Heap, HeapObject, MapObject, ObjectId, ObjectKind, Property,
    PropertyDescriptor, PropertyKey, SetObject, Slot, Value,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// A shell waiting to be populated
struct Task {
    source: ObjectId,
    shell: ObjectId,
    variant: Variant,
    rule: Option<Arc<dyn VariantRule>>,
    path: PathId,
}

/// State for one clone call
pub(crate) struct Cloner<'h> {
    heap: &'h mut Heap,
    options: &'h CloneOptions,
    registry: CloneRegistry,
    pending: Vec<Task>,
    paths: PathArena,
}

impl<'h> Cloner<'h> {
    pub(crate) fn new(heap: &'h mut Heap, options: &'h CloneOptions) -> Self {
        Self {
            heap,
            options,
            registry: CloneRegistry::new(),
            pending: Vec::new(),
            paths: PathArena::new(),
        }
    }

    pub(crate) fn heap(&self) -> &Heap {
        &*self.heap
    }

    pub(crate) fn heap_mut(&mut self) -> &mut Heap {
        &mut *self.heap
    }

    pub(crate) fn resolve_path(&self, id: PathId) -> PropertyPath {
        self.paths.resolve(id)
    }

    /// Clone `root`, discarding every allocation if any step fails
    pub(crate) fn run(mut self, root: &Value) -> CloneResult<Value> {
        let checkpoint = self.heap.checkpoint();
        debug!(root = ?root, rules = self.options.variant_rules.len(), "clone started");

        match self.drive(root) {
            Ok(value) => {
                debug!(objects = self.registry.len(), "clone finished");
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, objects = self.registry.len(), "clone failed, rolling back");
                self.heap.rollback(checkpoint);
                Err(err)
            }
        }
    }

    fn drive(&mut self, root: &Value) -> CloneResult<Value> {
        let result = self.reserve(root, Location::Root)?;
        while let Some(task) = self.pending.pop() {
            self.populate(task)?;
        }
        Ok(result)
    }

    /// Map `value` to its clone, allocating and queueing a shell if needed
    pub(crate) fn reserve(&mut self, value: &Value, at: Location) -> CloneResult<Value> {
        let Value::Object(source) = value else {
            return Ok(value.clone());
        };
        let source = *source;
        if self.heap.is_intrinsic(source) {
            return Ok(value.clone());
        }
        if let Some(existing) = self.registry.lookup(source) {
            return Ok(Value::Object(existing));
        }

        let rule = self.options.find_rule(self.heap, source);
        let variant = classify_object(self.heap, source)?;
        if rule.is_none() {
            match variant {
                Variant::Callable if self.options.policy.clone_callables_by_reference => {
                    return Ok(value.clone());
                }
                Variant::Callable | Variant::Opaque => {
                    return Err(CloneError::Unclonable {
                        variant,
                        type_name: describe(self.heap, value),
                        path: self.paths.resolve_location(&at),
                    });
                }
                _ => {}
            }
        }

        if let Some(limit) = self.options.policy.max_nodes {
            if self.registry.len() >= limit {
                return Err(CloneError::NodeLimitExceeded {
                    limit,
                    path: self.paths.resolve_location(&at),
                });
            }
        }

        let shell = match &rule {
            Some(rule) => {
                let before = self.heap.len();
                let shell = rule.allocate(self.heap, source)?;
                if shell.index() < before || self.heap.get(shell).is_err() {
                    return Err(CloneError::RuleFailed {
                        rule: rule.name().to_string(),
                        path: self.paths.resolve_location(&at),
                        message: format!("allocate returned {}, which is not a new object", shell),
                    });
                }
                shell
            }
            None => self.allocate_shell(source, variant, &at)?,
        };

        self.registry.register(source, shell);
        let path = self.paths.intern(at);
        trace!(%source, %shell, %variant, "allocated shell");
        self.pending.push(Task {
            source,
            shell,
            variant,
            rule,
            path,
        });
        Ok(Value::Object(shell))
    }

    /// Empty object of the same variant, with scalar payloads copied
    ///
    /// The prototype is linked during populate.
    fn allocate_shell(&mut self, source: ObjectId, variant: Variant, at: &Location) -> CloneResult<ObjectId> {
        let kind = match &self.heap.get(source)?.kind {
            ObjectKind::Ordinary => ObjectKind::Ordinary,
            ObjectKind::Array(_) => ObjectKind::Array(ArrayObject::new()),
            ObjectKind::Map(_) => ObjectKind::Map(MapObject::new()),
            ObjectKind::Set(_) => ObjectKind::Set(SetObject::new()),
            ObjectKind::Date(date) => ObjectKind::Date(*date),
            ObjectKind::RegExp(re) => ObjectKind::RegExp(re.clone()),
            ObjectKind::Buffer(buf) => ObjectKind::Buffer(BufferObject::from_bytes(buf.data.clone())),
            ObjectKind::Boxed(primitive) => ObjectKind::Boxed(primitive.clone()),
            ObjectKind::Function(_) | ObjectKind::Host(_) => {
                return Err(CloneError::Unclonable {
                    variant,
                    type_name: describe(self.heap, &Value::Object(source)),
                    path: self.paths.resolve_location(at),
                });
            }
        };
        Ok(self.heap.alloc(HeapObject::new(kind, None)))
    }

    fn populate(&mut self, task: Task) -> CloneResult<()> {
        let Task {
            source,
            shell,
            variant,
            rule,
            path,
        } = task;

        match &rule {
            Some(rule) => {
                let mut cx = RuleContext::new(self, rule.name(), path);
                rule.populate(&mut cx, source, shell)?;
            }
            None => match variant {
                Variant::Sequence => self.populate_elements(source, shell, path)?,
                Variant::OrderedMap => self.populate_map(source, shell, path)?,
                Variant::UniqueSet => self.populate_set(source, shell, path)?,
                _ => {}
            },
        }

        let mut descriptors = Vec::new();
        for PropertyDescriptor { key, property } in own_properties(self.heap, source)? {
            let segment = PathSegment::Key(key.clone());
            let property = self.clone_property(property, path, &key, segment)?;
            descriptors.push(PropertyDescriptor { key, property });
        }

        let prototype = self.clone_prototype(source, path)?;
        apply_prototype(self.heap, shell, prototype).map_err(|f| self.descriptor_error(f, path))?;
        apply_descriptors(self.heap, shell, descriptors).map_err(|f| self.descriptor_error(f, path))?;
        if self.options.policy.preserve_extensibility {
            apply_extensibility(self.heap, source, shell).map_err(|f| self.descriptor_error(f, path))?;
        }
        Ok(())
    }

    fn populate_elements(&mut self, source: ObjectId, shell: ObjectId, path: PathId) -> CloneResult<()> {
        let elements = indexed_elements(self.heap, source)?;
        let mut cloned = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            let element = match element {
                Some(property) => {
                    let key = PropertyKey::from(index as u32);
                    Some(self.clone_property(property, path, &key, PathSegment::Index(index))?)
                }
                None => None,
            };
            cloned.push(element);
        }
        apply_elements(self.heap, shell, cloned).map_err(|f| self.descriptor_error(f, path))
    }

    fn populate_map(&mut self, source: ObjectId, shell: ObjectId, path: PathId) -> CloneResult<()> {
        let entries = self.heap.map_entries(source)?;
        let mut cloned = Vec::with_capacity(entries.len());
        for (index, (key, value)) in entries.into_iter().enumerate() {
            let key = self.reserve(&key, Location::Child(path, PathSegment::MapKey(index)))?;
            let value = self.reserve(&value, Location::Child(path, PathSegment::MapValue(index)))?;
            cloned.push((key, value));
        }
        for (key, value) in cloned {
            self.heap.map_set(shell, key, value)?;
        }
        Ok(())
    }

    fn populate_set(&mut self, source: ObjectId, shell: ObjectId, path: PathId) -> CloneResult<()> {
        let values = self.heap.set_values(source)?;
        let mut cloned = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            cloned.push(self.reserve(&value, Location::Child(path, PathSegment::SetEntry(index)))?);
        }
        for value in cloned {
            self.heap.set_add(shell, value)?;
        }
        Ok(())
    }

    /// Same flags, with the value or accessor functions cloned
    fn clone_property(
        &mut self,
        property: Property,
        path: PathId,
        key: &PropertyKey,
        value_segment: PathSegment,
    ) -> CloneResult<Property> {
        let Property {
            slot,
            enumerable,
            configurable,
        } = property;
        let slot = match slot {
            Slot::Data { value, writable } => Slot::Data {
                value: self.reserve(&value, Location::Child(path, value_segment))?,
                writable,
            },
            Slot::Accessor { get, set } => {
                let get = match get {
                    Some(f) => Some(self.reserve(&f, Location::Child(path, PathSegment::Getter(key.clone())))?),
                    None => None,
                };
                let set = match set {
                    Some(f) => Some(self.reserve(&f, Location::Child(path, PathSegment::Setter(key.clone())))?),
                    None => None,
                };
                Slot::Accessor { get, set }
            }
        };
        Ok(Property {
            slot,
            enumerable,
            configurable,
        })
    }

    /// Prototype for the clone of `source`
    ///
    /// Intrinsic prototypes are always shared; others are cloned unless
    /// `clone_prototype` is off.
    fn clone_prototype(&mut self, source: ObjectId, path: PathId) -> CloneResult<Option<ObjectId>> {
        let Some(proto) = self.heap.get_prototype_of(source)? else {
            return Ok(None);
        };
        if self.heap.is_intrinsic(proto) || !self.options.policy.clone_prototype {
            return Ok(Some(proto));
        }
        let cloned = self.reserve(&Value::Object(proto), Location::Child(path, PathSegment::Prototype))?;
        Ok(cloned.as_object())
    }

    fn descriptor_error(&self, failure: DescriptorFailure, path: PathId) -> CloneError {
        CloneError::DescriptorApplication {
            key: failure.key,
            path: self.paths.resolve(path),
            source: failure.source,
        }
    }
}
