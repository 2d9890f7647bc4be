//! Error types for the clone engine

use crate::classify::Variant;
use crate::path::PropertyPath;
use facsimile_core::HeapError;

/// Errors raised while cloning a value graph
///
/// A failed clone leaves the heap as it was before the call; no partially
/// built objects survive.
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    /// Value has no built-in clone behavior and no variant rule matched
    #[error("Cannot clone {type_name} ({variant}) at {path}")]
    Unclonable {
        /// Classification of the offending value
        variant: Variant,
        /// Type name of the offending value
        type_name: String,
        /// Where the value was reached
        path: PropertyPath,
    },

    /// Writing a property onto a clone was rejected
    #[error("Cannot apply descriptor {key} at {path}: {source}")]
    DescriptorApplication {
        /// Property key being written
        key: String,
        /// Object being populated
        path: PropertyPath,
        /// Underlying heap failure
        #[source]
        source: HeapError,
    },

    /// The graph has more clonable objects than the configured limit
    #[error("Clone exceeded the limit of {limit} objects at {path}")]
    NodeLimitExceeded {
        /// Configured limit
        limit: usize,
        /// First object over the limit
        path: PropertyPath,
    },

    /// A variant rule misbehaved or reported a failure
    #[error("Variant rule '{rule}' failed at {path}: {message}")]
    RuleFailed {
        /// Rule name
        rule: String,
        /// Object the rule was handling
        path: PropertyPath,
        /// Failure description
        message: String,
    },

    /// Heap access failed while reading the source graph
    #[error(transparent)]
    Heap(#[from] HeapError),
}

impl CloneError {
    /// Path to the value that caused the failure, when known
    pub fn path(&self) -> Option<&PropertyPath> {
        match self {
            CloneError::Unclonable { path, .. }
            | CloneError::DescriptorApplication { path, .. }
            | CloneError::NodeLimitExceeded { path, .. }
            | CloneError::RuleFailed { path, .. } => Some(path),
            CloneError::Heap(_) => None,
        }
    }

    /// Check if this is an unclonable-value error
    pub fn is_unclonable(&self) -> bool {
        matches!(self, CloneError::Unclonable { .. })
    }

    /// Check if this is a descriptor-application error
    pub fn is_descriptor_application(&self) -> bool {
        matches!(self, CloneError::DescriptorApplication { .. })
    }
}

/// Clone operation result
pub type CloneResult<T> = Result<T, CloneError>;

/// Errors raised while loading a [`ClonePolicy`](crate::ClonePolicy)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the policy file
    #[error("Failed to read clone policy: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse clone policy: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Policy parsed but holds an unusable value
    #[error("Invalid clone policy: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSegment;

    #[test]
    fn test_unclonable_message() {
        let err = CloneError::Unclonable {
            variant: Variant::Opaque,
            type_name: "Socket".into(),
            path: PropertyPath::root().child(PathSegment::Key("conn".into())),
        };
        assert_eq!(err.to_string(), "Cannot clone Socket (opaque host object) at $.conn");
        assert!(err.is_unclonable());
        assert_eq!(err.path().map(|p| p.to_string()), Some("$.conn".to_string()));
    }

    #[test]
    fn test_descriptor_source_chain() {
        use std::error::Error;

        let err = CloneError::DescriptorApplication {
            key: "x".into(),
            path: PropertyPath::root(),
            source: HeapError::NonExtensible { key: "x".into() },
        };
        assert!(err.is_descriptor_application());
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Cannot apply descriptor x at $"));
    }

    #[test]
    fn test_heap_error_has_no_path() {
        let err = CloneError::from(HeapError::InvalidRegExp("(".into()));
        assert!(err.path().is_none());
    }
}
