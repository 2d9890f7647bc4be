//! Property paths from the clone root, for error reporting
//!
//! Paths are recorded in a [`PathArena`] as parent-linked nodes, one per
//! allocated shell, and only turned into a [`PropertyPath`] when an error
//! needs one. Building a full path for every node up front would cost
//! O(depth) per node.

use facsimile_core::PropertyKey;
use std::fmt;

/// One step from a container to a child value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Own property value
    Key(PropertyKey),
    /// Array element
    Index(usize),
    /// Getter of an accessor property
    Getter(PropertyKey),
    /// Setter of an accessor property
    Setter(PropertyKey),
    /// Key of the n-th map entry
    MapKey(usize),
    /// Value of the n-th map entry
    MapValue(usize),
    /// The n-th set entry
    SetEntry(usize),
    /// Prototype link
    Prototype,
    /// Edge named by a variant rule
    Custom(String),
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &PropertyKey) -> fmt::Result {
    match key {
        PropertyKey::String(s) => write!(f, ".{}", s),
        PropertyKey::Symbol(s) => write!(f, "[{}]", s),
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write_key(f, key),
            PathSegment::Index(i) => write!(f, "[{}]", i),
            PathSegment::Getter(key) => {
                write_key(f, key)?;
                write!(f, "<get>")
            }
            PathSegment::Setter(key) => {
                write_key(f, key)?;
                write!(f, "<set>")
            }
            PathSegment::MapKey(i) => write!(f, ".<map key #{}>", i),
            PathSegment::MapValue(i) => write!(f, ".<map value #{}>", i),
            PathSegment::SetEntry(i) => write!(f, ".<set entry #{}>", i),
            PathSegment::Prototype => write!(f, ".<prototype>"),
            PathSegment::Custom(name) => write!(f, ".<{}>", name),
        }
    }
}

/// Path from the clone root to a value, rendered as `$`, `$.a[0].<prototype>`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// The root value itself
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend by one segment
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Segments from the root outward
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Handle to a node in a [`PathArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(usize);

/// Where a value sits relative to already-recorded nodes
#[derive(Debug, Clone)]
pub enum Location {
    /// The clone root
    Root,
    /// A child of a recorded node
    Child(PathId, PathSegment),
}

#[derive(Debug)]
struct PathNode {
    parent: Option<PathId>,
    segment: Option<PathSegment>,
}

/// Parent-linked path storage scoped to one clone call
#[derive(Debug, Default)]
pub struct PathArena {
    nodes: Vec<PathNode>,
}

impl PathArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a location, returning a handle usable as a parent
    pub fn intern(&mut self, location: Location) -> PathId {
        let node = match location {
            Location::Root => PathNode {
                parent: None,
                segment: None,
            },
            Location::Child(parent, segment) => PathNode {
                parent: Some(parent),
                segment: Some(segment),
            },
        };
        self.nodes.push(node);
        PathId(self.nodes.len() - 1)
    }

    /// Materialise the path of a recorded node
    pub fn resolve(&self, id: PathId) -> PropertyPath {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(PathId(i)) = cursor {
            let Some(node) = self.nodes.get(i) else {
                break;
            };
            if let Some(segment) = &node.segment {
                segments.push(segment.clone());
            }
            cursor = node.parent;
        }
        segments.reverse();
        PropertyPath { segments }
    }

    /// Materialise the path of a location without recording it
    pub fn resolve_location(&self, location: &Location) -> PropertyPath {
        match location {
            Location::Root => PropertyPath::root(),
            Location::Child(parent, segment) => self.resolve(*parent).child(segment.clone()),
        }
    }
}
