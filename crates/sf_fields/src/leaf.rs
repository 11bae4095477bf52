use core::mem;

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use serde_json::Value;
use sf_cell::ValueCell;

use crate::container::ContainerField;
use crate::document;
use crate::error::FieldError;
use crate::field::Field;

// -----------------------------------------------------------------------------
// Scalar

/// The bounds a type must meet to live in a [`LeafField`].
///
/// Anything with a zero-equivalent default that converts to and from a
/// document scalar qualifies; the blanket impl covers every such type.
pub trait Scalar:
    Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static
{
}

impl<T> Scalar for T where
    T: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static
{
}

// -----------------------------------------------------------------------------
// LeafField

/// A named handle over a single scalar value, serialized under one key.
///
/// The value lives in a shared [`ValueCell`]; [`alias`](LeafField::alias)
/// produces a second handle over the same cell, so a write through one
/// alias is observable through every other.
///
/// # Examples
///
/// Free-standing:
///
/// ```
/// # use sf_fields::I32Field;
/// let count = I32Field::with_value("count", 7);
/// let view = count.alias();
///
/// count.set(8);
/// assert_eq!(view.get(), 8);
/// ```
///
/// Self-registering into a record, the way a struct declares its persisted
/// members:
///
/// ```
/// # use sf_fields::{ContainerField, F32Field, I32Field};
/// struct Pose {
///     record: ContainerField,
///     age: I32Field,
///     height: F32Field,
/// }
///
/// impl Pose {
///     fn attached(parent: &ContainerField, name: &str) -> Self {
///         let record = ContainerField::attached(parent, name);
///         Self {
///             age: I32Field::attached(&record, "age"),
///             height: F32Field::attached_with(&record, "height", 2.0),
///             record,
///         }
///     }
/// }
/// ```
pub struct LeafField<T: Scalar> {
    name: String,
    cell: ValueCell<T>,
}

impl<T: Scalar> LeafField<T> {
    /// Creates a leaf holding the type's zero-equivalent.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell: ValueCell::zeroed(),
        }
    }

    /// Creates a leaf with an explicit initial value.
    ///
    /// Accepts anything convertible into `T`, so `F64Field::with_value("x", 1u8)`
    /// and friends work the way the declaration site expects.
    #[inline]
    pub fn with_value(name: impl Into<String>, value: impl Into<T>) -> Self {
        Self {
            name: name.into(),
            cell: ValueCell::new(value.into()),
        }
    }

    /// Creates a zero-valued leaf and registers it into `parent` on the spot.
    #[inline]
    pub fn attached(parent: &ContainerField, name: impl Into<String>) -> Self {
        let field = Self::new(name);
        field.attach(parent);
        field
    }

    /// Creates a leaf with an initial value and registers it into `parent`.
    #[inline]
    pub fn attached_with(
        parent: &ContainerField,
        name: impl Into<String>,
        value: impl Into<T>,
    ) -> Self {
        let field = Self::with_value(name, value);
        field.attach(parent);
        field
    }

    /// The field's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the current value.
    #[inline]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Stores a new value, visible through every alias.
    #[inline]
    pub fn set(&self, value: impl Into<T>) {
        self.cell.set(value.into());
    }

    /// Creates a second handle over the same cell.
    #[inline]
    pub fn alias(&self) -> Self {
        Self {
            name: self.name.clone(),
            cell: self.cell.alias(),
        }
    }

    /// Exchanges name and storage with `other`, creating no additional alias.
    ///
    /// Afterwards the two handles are exactly swapped: each carries the
    /// other's name and references the other's cell, with no residual
    /// aliasing between them.
    ///
    /// Note that a member map keys by the name seen at registration time; a
    /// swap after [`attach`](Field::attach) renames the handle, not the key.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.name, &mut other.name);
        self.cell.swap(&mut other.cell);
    }

    /// The shared cell itself, for callers that want closure access.
    #[inline]
    pub fn cell(&self) -> &ValueCell<T> {
        &self.cell
    }
}

impl<T: Scalar> Field for LeafField<T> {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn alias_box(&self) -> Box<dyn Field> {
        Box::new(self.alias())
    }

    #[inline]
    fn cell_refs(&self) -> usize {
        self.cell.ref_count()
    }

    fn serialize(&self, doc: &mut Value) -> Result<(), FieldError> {
        self.cell
            .with(|value| document::put_scalar(doc, &self.name, value))
    }

    fn deserialize(&self, doc: &Value) -> Result<(), FieldError> {
        let value: T = document::take_scalar(doc, &self.name)?;
        self.cell.set(value);
        Ok(())
    }
}

impl<T: Scalar + core::fmt::Debug> core::fmt::Debug for LeafField<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LeafField")
            .field("name", &self.name)
            .field("cell", &self.cell)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Scalar aliases

pub type U8Field = LeafField<u8>;
pub type U16Field = LeafField<u16>;
pub type U32Field = LeafField<u32>;
pub type U64Field = LeafField<u64>;
pub type I8Field = LeafField<i8>;
pub type I16Field = LeafField<i16>;
pub type I32Field = LeafField<i32>;
pub type I64Field = LeafField<i64>;
pub type F32Field = LeafField<f32>;
pub type F64Field = LeafField<f64>;
pub type BoolField = LeafField<bool>;
pub type StringField = LeafField<String>;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{I32Field, LeafField, StringField};
    use crate::document;
    use crate::error::FieldError;
    use crate::field::Field;

    #[test]
    fn new_defaults_to_zero_equivalent() {
        assert_eq!(I32Field::new("n").get(), 0);
        assert_eq!(StringField::new("s").get(), "");
    }

    #[test]
    fn alias_observes_writes() {
        let a = I32Field::with_value("n", 1);
        let b = a.alias();

        a.set(42);
        assert_eq!(b.get(), 42);
        assert_eq!(a.cell_refs(), 2);
    }

    #[test]
    fn serialize_writes_one_key() {
        let leaf = I32Field::with_value("count", 7);
        let mut doc = document::object();

        leaf.serialize(&mut doc).unwrap();
        assert_eq!(doc, json!({ "count": 7 }));
    }

    #[test]
    fn deserialize_stores_in_place() {
        let leaf = I32Field::new("count");
        let alias = leaf.alias();

        leaf.deserialize(&json!({ "count": 9 })).unwrap();
        assert_eq!(alias.get(), 9);
    }

    #[test]
    fn deserialize_missing_key_fails() {
        let leaf = I32Field::new("count");
        assert!(matches!(
            leaf.deserialize(&json!({})),
            Err(FieldError::MissingKey { .. })
        ));
    }

    #[test]
    fn deserialize_type_mismatch_fails() {
        let leaf = I32Field::with_value("count", 3);
        let err = leaf.deserialize(&json!({ "count": "many" }));

        assert!(matches!(err, Err(FieldError::TypeMismatch { .. })));
        // The failed walk leaves the previous value untouched.
        assert_eq!(leaf.get(), 3);
    }

    #[test]
    fn swap_exchanges_name_and_value_exactly() {
        let mut a = LeafField::<i32>::with_value("a", 1);
        let mut b = LeafField::<i32>::with_value("b", 2);

        a.swap(&mut b);

        assert_eq!(a.name(), "b");
        assert_eq!(a.get(), 2);
        assert_eq!(b.name(), "a");
        assert_eq!(b.get(), 1);

        // No residual aliasing after the swap.
        a.set(20);
        assert_eq!(b.get(), 1);
        assert!(!a.cell().ptr_eq(b.cell()));
    }

    #[test]
    fn with_value_converts_at_declaration() {
        let wide = LeafField::<i64>::with_value("w", 456_i32);
        assert_eq!(wide.get(), 456);

        let text = StringField::with_value("s", "hello");
        assert_eq!(text.get(), "hello");
    }
}
