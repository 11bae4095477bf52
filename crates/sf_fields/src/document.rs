//! The narrow interface the tree walks need from the document library.
//!
//! The document is a [`serde_json::Value`]; this module is the only place
//! that manipulates its node structure directly. Everything here works on
//! object nodes keyed by string — the walks never produce or consume arrays.

use core::any::type_name;

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::FieldError;

/// A fresh, empty object node.
#[inline]
pub fn object() -> Value {
    Value::Object(Map::new())
}

/// The nested object at `key`, created (or overwritten) if absent.
///
/// Used by the serialize walk when descending into a named container:
/// whatever sat at `key` before — nothing, a scalar, `null` — becomes an
/// empty object to serialize members into.
///
/// Fails with [`FieldError::NodeShape`] if `doc` itself is not an object.
pub fn child_object<'a>(doc: &'a mut Value, key: &str) -> Result<&'a mut Value, FieldError> {
    let Value::Object(map) = doc else {
        return Err(FieldError::node_shape(key));
    };

    let child = map.entry(key.to_owned()).or_insert_with(object);
    if !child.is_object() {
        *child = object();
    }
    Ok(child)
}

/// The child node at `key`, which must exist.
///
/// Fails with [`FieldError::MissingKey`] if `key` is absent, or with
/// [`FieldError::NodeShape`] if `doc` is not an object at all.
pub fn require_child<'a>(doc: &'a Value, key: &str) -> Result<&'a Value, FieldError> {
    match doc {
        Value::Object(map) => map.get(key).ok_or_else(|| FieldError::missing_key(key)),
        _ => Err(FieldError::node_shape(key)),
    }
}

/// Writes `value` as a scalar node under `key`.
pub fn put_scalar<T: Serialize>(doc: &mut Value, key: &str, value: &T) -> Result<(), FieldError> {
    let Value::Object(map) = doc else {
        return Err(FieldError::node_shape(key));
    };

    let scalar =
        serde_json::to_value(value).map_err(|err| FieldError::unserializable(key, err))?;
    map.insert(key.to_owned(), scalar);
    Ok(())
}

/// Reads the scalar node under `key`, converting it to `T`.
///
/// Fails with [`FieldError::MissingKey`] if `key` is absent and with
/// [`FieldError::TypeMismatch`] if the node does not convert.
pub fn take_scalar<T: DeserializeOwned>(doc: &Value, key: &str) -> Result<T, FieldError> {
    let node = require_child(doc, key)?;
    serde_json::from_value(node.clone())
        .map_err(|err| FieldError::type_mismatch(key, type_name::<T>(), err))
}

// -----------------------------------------------------------------------------
// Tests
