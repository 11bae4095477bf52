use core::any::Any;
use core::fmt;

use serde_json::Value;

use crate::container::ContainerField;
use crate::error::FieldError;

// -----------------------------------------------------------------------------
// Field

/// The base trait of every field handle.
///
/// A field is a named handle over shared storage that knows how to move its
/// value to and from one node of a JSON document. The two implementors are
/// [`LeafField<T>`] for scalars and [`ContainerField`] for the recursive
/// member registry; containers hold their members as `Box<dyn Field>`, which
/// is what lets a tree mix both.
///
/// # Aliasing
///
/// Handles are never deep-copied. [`alias_box`](Field::alias_box) (and the
/// typed `alias` methods on the implementors) produce a second handle over
/// the same storage: a write through one alias is visible through all, and
/// the storage is released exactly once, when the last alias drops.
///
/// # Why `deserialize` takes `&self`
///
/// Mutation flows through the shared storage cell, not through the handle
/// itself — an `&mut self` receiver would suggest exclusivity the aliasing
/// model does not have, and would make dispatch through a container's
/// shared member map impossible.
///
/// [`LeafField<T>`]: crate::LeafField
pub trait Field: Send + Sync + Any {
    /// The field's name; the document key it serializes under.
    ///
    /// Empty only for a root container.
    fn name(&self) -> &str;

    /// Creates a boxed alias of this handle, sharing its storage.
    fn alias_box(&self) -> Box<dyn Field>;

    /// Number of live aliases of this handle's storage cell.
    fn cell_refs(&self) -> usize;

    /// Writes the field's current value into `doc` under its name.
    ///
    /// `doc` must be an object node; leaves write one scalar, containers a
    /// nested object (or, for an unnamed container, their members directly).
    fn serialize(&self, doc: &mut Value) -> Result<(), FieldError>;

    /// Reads the field's value from `doc` in place.
    ///
    /// Fails with [`FieldError::MissingKey`] if the field's key is absent
    /// and [`FieldError::TypeMismatch`] if the node does not convert. A
    /// failure partway through a container leaves already-visited members
    /// mutated; the walk is not transactional.
    fn deserialize(&self, doc: &Value) -> Result<(), FieldError>;

    /// Registers an alias of this field into `parent`'s member map.
    ///
    /// If a member with the same name already exists, the registration is
    /// silently dropped; see [`ContainerField::register`].
    #[inline]
    fn attach(&self, parent: &ContainerField)
    where
        Self: Sized,
    {
        parent.register(self);
    }
}

impl dyn Field {
    /// Returns `true` if the underlying handle is of type `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Downcasts the handle to its concrete type by reference.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sf_fields::{Field, I32Field};
    /// let leaf = I32Field::with_value("n", 10);
    /// let field: Box<dyn Field> = leaf.alias_box();
    ///
    /// let leaf_again = field.downcast_ref::<I32Field>().unwrap();
    /// assert_eq!(leaf_again.get(), 10);
    /// ```
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }
}

impl fmt::Debug for dyn Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({:?}, refs: {})", self.name(), self.cell_refs())
    }
}

// -----------------------------------------------------------------------------
// Tests
