use core::{error, fmt};

use crate::path;

// -----------------------------------------------------------------------------
// FieldError

/// A enumeration of all error outcomes that might happen
/// while walking a field tree against a document.
///
/// The `key` in every variant is the document key of the failing node. With
/// the `debug` cargo feature (and `debug_assertions`), it is the full dotted
/// path from the walk's root instead, e.g. `` `2.age` ``.
///
/// A duplicate registration is *not* an error: the member map silently keeps
/// the first entry (see [`ContainerField::register`]).
///
/// [`ContainerField::register`]: crate::ContainerField::register
#[derive(Debug)]
pub enum FieldError {
    /// Deserialization requested a key absent from the document node.
    MissingKey { key: String },
    /// A document scalar could not convert to the leaf's declared type.
    TypeMismatch {
        key: String,
        expected: &'static str,
        reason: String,
    },
    /// The walk descended into a node that is not an object.
    NodeShape { key: String },
    /// The leaf's value refused to serialize into a document scalar.
    Unserializable { key: String, reason: String },
}

impl FieldError {
    #[inline]
    pub(crate) fn missing_key(key: &str) -> Self {
        Self::MissingKey {
            key: path::qualify(key),
        }
    }

    #[inline]
    pub(crate) fn type_mismatch(key: &str, expected: &'static str, reason: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            key: path::qualify(key),
            expected,
            reason: reason.to_string(),
        }
    }

    #[inline]
    pub(crate) fn node_shape(key: &str) -> Self {
        Self::NodeShape {
            key: path::qualify(key),
        }
    }

    #[inline]
    pub(crate) fn unserializable(key: &str, reason: impl fmt::Display) -> Self {
        Self::Unserializable {
            key: path::qualify(key),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey { key } => {
                write!(f, "document has no key `{key}`")
            }
            Self::TypeMismatch {
                key,
                expected,
                reason,
            } => {
                write!(f, "value at `{key}` does not convert to `{expected}`: {reason}")
            }
            Self::NodeShape { key } => {
                write!(f, "node at `{key}` is not an object")
            }
            Self::Unserializable { key, reason } => {
                write!(f, "value at `{key}` does not serialize: {reason}")
            }
        }
    }
}

impl error::Error for FieldError {}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::FieldError;

    #[test]
    fn display_names_the_key() {
        let err = FieldError::missing_key("2");
        assert_eq!(err.to_string(), "document has no key `2`");

        let err = FieldError::type_mismatch("age", "i32", "invalid type");
        assert_eq!(
            err.to_string(),
            "value at `age` does not convert to `i32`: invalid type"
        );
    }
}
