use core::mem;
use std::collections::BTreeMap;

use serde_json::Value;
use sf_cell::ValueCell;

use crate::document;
use crate::error::FieldError;
use crate::field::Field;
use crate::path;

/// The member registry of a container: field name to an exclusively-owned
/// handle.
///
/// Keys are unique and iteration is lexicographic by name — serialization
/// order follows key order, **not** declaration order. The map lives inside
/// the container's shared cell, so every alias of a container sees the same
/// map instance.
pub type MemberMap = BTreeMap<String, Box<dyn Field>>;

// -----------------------------------------------------------------------------
// ContainerField

/// A field holding a key-unique map of child fields; the record node of the
/// tree.
///
/// A container with an empty name is a *root*: it serializes its members
/// directly into the current document scope. A named container nests them
/// under its own key instead, which is how containers compose recursively.
///
/// # Ownership
///
/// There are two ownership levels here, and they are different on purpose.
/// The member map itself lives in a shared [`ValueCell`], one per container
/// *storage*; aliases of a container share that one map. The entries in the
/// map are plain `Box<dyn Field>`, exclusively owned by the map — they are
/// released (recursively, through their own cells) exactly once, when the
/// last alias of the container drops.
///
/// # Concurrency
///
/// Each individual registration or walk is internally locked, but the order
/// of operations racing through different aliases is unspecified. The
/// intended discipline is to build the tree single-threaded and then share
/// it. Attaching a container into itself or a descendant is not supported:
/// the walk would recurse forever.
///
/// # Examples
///
/// ```
/// # use sf_fields::{ContainerField, F32Field, I32Field, U32Field};
/// let root = ContainerField::root();
/// let id = U32Field::attached_with(&root, "1", 123u32);
///
/// let nested = ContainerField::attached(&root, "2");
/// let age = I32Field::attached_with(&nested, "age", 7);
/// let height = F32Field::attached_with(&nested, "height", 2.0);
///
/// let doc = root.to_document().unwrap();
/// assert_eq!(doc["1"], 123);
/// assert_eq!(doc["2"]["age"], 7);
/// ```
pub struct ContainerField {
    name: String,
    members: ValueCell<MemberMap>,
}

impl ContainerField {
    /// Creates an unnamed root container with an empty member map.
    #[inline]
    pub fn root() -> Self {
        Self::new("")
    }

    /// Creates a named container with an empty member map.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: ValueCell::zeroed(),
        }
    }

    /// Creates a named container and registers it into `parent` on the spot.
    #[inline]
    pub fn attached(parent: &ContainerField, name: impl Into<String>) -> Self {
        let container = Self::new(name);
        container.attach(parent);
        container
    }

    /// The container's name; empty for a root.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers an alias of `member` into this container's member map,
    /// keyed by the member's current name.
    ///
    /// If the key already exists, the registration is **silently dropped**
    /// and the existing entry retained — first registration wins. This is a
    /// long-standing sharp edge of the model, kept as documented behavior
    /// rather than upgraded to an error.
    ///
    /// The original handle stays independently alive; the map holds its own
    /// alias of the same storage.
    pub fn register(&self, member: &dyn Field) {
        self.members.with_mut(|map| {
            if !map.contains_key(member.name()) {
                map.insert(member.name().to_owned(), member.alias_box());
            }
        });
    }

    /// Number of registered members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.with(MemberMap::len)
    }

    /// Returns `true` if no members are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.with(MemberMap::is_empty)
    }

    /// Returns `true` if a member with `name` is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.members.with(|map| map.contains_key(name))
    }

    /// Creates a second handle over the same member map.
    ///
    /// The alias shares the map *instance*: a member registered through one
    /// alias is visible through the other.
    #[inline]
    pub fn alias(&self) -> Self {
        Self {
            name: self.name.clone(),
            members: self.members.alias(),
        }
    }

    /// Exchanges name and member-map storage with `other`, creating no
    /// additional alias.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.name, &mut other.name);
        self.members.swap(&mut other.members);
    }

    /// Produces a full document snapshot of this container tree.
    ///
    /// For a root container, member keys appear at the document's top
    /// level; a named container nests once under its own name.
    pub fn to_document(&self) -> Result<Value, FieldError> {
        let mut doc = document::object();
        Field::serialize(self, &mut doc)?;
        Ok(doc)
    }

    /// Populates this container tree's values from `doc`, in place.
    ///
    /// The walk aborts on the first leaf-level failure and propagates it;
    /// members already visited keep their new values (not transactional).
    pub fn from_document(&self, doc: &Value) -> Result<(), FieldError> {
        Field::deserialize(self, doc)
    }
}

impl Field for ContainerField {
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
        self.members.ref_count()
    }

    fn serialize(&self, doc: &mut Value) -> Result<(), FieldError> {
        self.members.with(|map| {
            if self.name.is_empty() {
                // Flatten: members write into the current scope.
                for member in map.values() {
                    member.serialize(doc)?;
                }
            } else {
                let child = document::child_object(doc, &self.name)?;
                let _scope = path::enter(&self.name);
                for member in map.values() {
                    member.serialize(child)?;
                }
            }
            Ok(())
        })
    }

    fn deserialize(&self, doc: &Value) -> Result<(), FieldError> {
        self.members.with(|map| {
            if self.name.is_empty() {
                for member in map.values() {
                    member.deserialize(doc)?;
                }
            } else {
                let child = document::require_child(doc, &self.name)?;
                let _scope = path::enter(&self.name);
                for member in map.values() {
                    member.deserialize(child)?;
                }
            }
            Ok(())
        })
    }
}

impl core::fmt::Debug for ContainerField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContainerField")
            .field("name", &self.name)
            .field("members", &self.len())
            .field("refs", &self.members.ref_count())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ContainerField;
    use crate::error::FieldError;
    use crate::field::Field;
    use crate::leaf::{F32Field, I32Field, StringField, U32Field};

    /// The two-level record shape used across these tests:
    /// `{"1": <u32>, "2": {"age": <i32>, "height": <f32>}}`.
    struct Inner {
        record: ContainerField,
        age: I32Field,
        height: F32Field,
    }

    impl Inner {
        fn attached(parent: &ContainerField, name: &str) -> Self {
            let record = ContainerField::attached(parent, name);
            Self {
                age: I32Field::attached(&record, "age"),
                height: F32Field::attached_with(&record, "height", 2.0),
                record,
            }
        }
    }

    struct Outer {
        root: ContainerField,
        id: U32Field,
        inner: Inner,
    }

    impl Outer {
        fn new() -> Self {
            let root = ContainerField::root();
            Self {
                id: U32Field::attached_with(&root, "1", 123u32),
                inner: Inner::attached(&root, "2"),
                root,
            }
        }
    }

    #[test]
    fn root_flattens_and_nested_containers_nest() {
        let outer = Outer::new();
        outer.inner.age.set(7);

        let doc = outer.root.to_document().unwrap();
        assert_eq!(
            doc,
            json!({ "1": 123, "2": { "age": 7, "height": 2.0 } })
        );
    }

    #[test]
    fn round_trip_is_identity_on_values() {
        let outer = Outer::new();
        outer.id.set(10u32);
        outer.inner.age.set(55);
        outer.inner.height.set(5.9f32);

        let doc = outer.root.to_document().unwrap();

        let fresh = Outer::new();
        fresh.root.from_document(&doc).unwrap();

        assert_eq!(fresh.id.get(), 10);
        assert_eq!(fresh.inner.age.get(), 55);
        assert_eq!(fresh.inner.height.get(), 5.9);
    }

    #[test]
    fn deserialize_reports_missing_nested_record() {
        let outer = Outer::new();
        let err = outer.root.from_document(&json!({ "1": 123 }));

        assert!(matches!(err, Err(FieldError::MissingKey { ref key }) if key.ends_with('2')));
        // The id member was visited before the failure and keeps the new value.
        assert_eq!(outer.id.get(), 123);
    }

    #[test]
    fn member_order_is_lexicographic_not_declaration() {
        let root = ContainerField::root();
        let _b = StringField::attached_with(&root, "b", "second");
        let _a = StringField::attached_with(&root, "a", "first");

        let doc = root.to_document().unwrap();
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn duplicate_name_keeps_first() {
        let root = ContainerField::root();
        let first = I32Field::attached_with(&root, "n", 1);
        let second = I32Field::attached_with(&root, "n", 2);

        assert_eq!(root.len(), 1);

        // The registry still serializes the first member's cell; the second
        // handle stays alive but unregistered.
        first.set(10);
        second.set(20);
        assert_eq!(root.to_document().unwrap(), json!({ "n": 10 }));
        assert_eq!(second.cell_refs(), 1);
    }

    #[test]
    fn container_aliases_share_one_member_map() {
        let a = ContainerField::new("cfg");
        let b = a.alias();

        let _n = I32Field::attached_with(&a, "n", 5);
        assert!(b.contains("n"));
        assert_eq!(b.to_document().unwrap(), json!({ "cfg": { "n": 5 } }));
    }

    #[test]
    fn dropping_last_alias_releases_members() {
        let leaf = I32Field::with_value("n", 1);
        assert_eq!(leaf.cell_refs(), 1);

        let root = ContainerField::root();
        let root_alias = root.alias();
        leaf.attach(&root);
        assert_eq!(leaf.cell_refs(), 2);

        // An earlier-dropped alias must not tear down the map.
        drop(root_alias);
        assert_eq!(leaf.cell_refs(), 2);

        drop(root);
        assert_eq!(leaf.cell_refs(), 1);
        assert_eq!(leaf.get(), 1);
    }

    #[test]
    fn registered_member_survives_original_handle() {
        let root = ContainerField::root();
        {
            let short_lived = I32Field::attached_with(&root, "n", 77);
            drop(short_lived);
        }
        assert_eq!(root.to_document().unwrap(), json!({ "n": 77 }));
    }

    #[test]
    fn named_container_to_document_nests_once() {
        let cfg = ContainerField::new("cfg");
        let _n = I32Field::attached_with(&cfg, "n", 1);

        assert_eq!(cfg.to_document().unwrap(), json!({ "cfg": { "n": 1 } }));
    }

    #[test]
    fn from_document_rejects_non_object_node() {
        let cfg = ContainerField::new("cfg");
        let _n = I32Field::attached(&cfg, "n");

        let err = cfg.from_document(&json!({ "cfg": 5 }));
        assert!(matches!(err, Err(FieldError::NodeShape { .. })));
    }

    #[test]
    fn swap_exchanges_whole_registries() {
        let mut a = ContainerField::new("a");
        let _x = I32Field::attached_with(&a, "x", 1);

        let mut b = ContainerField::new("b");
        let _y = I32Field::attached_with(&b, "y", 2);

        a.swap(&mut b);

        assert_eq!(a.name(), "b");
        assert!(a.contains("y"));
        assert_eq!(b.name(), "a");
        assert!(b.contains("x"));
    }

    #[test]
    fn concurrent_registration_churn_leaves_member_usable() {
        use std::thread;

        const THREADS: usize = 16;
        const ITERS: usize = 2000;

        let shared = I32Field::with_value("shared", 123);

        thread::scope(|scope| {
            for _ in 0..THREADS {
                let alias = shared.alias();
                scope.spawn(move || {
                    for _ in 0..ITERS {
                        let scratch = ContainerField::root();
                        alias.attach(&scratch);
                        assert_eq!(alias.get(), 123);
                        // `scratch` drops here, releasing its map alias.
                    }
                });
            }
        });

        assert_eq!(shared.cell_refs(), 1);
        assert_eq!(shared.get(), 123);
    }

    #[cfg(all(debug_assertions, feature = "debug"))]
    #[test]
    fn errors_carry_the_walk_path() {
        let outer = Outer::new();
        let err = outer
            .root
            .from_document(&json!({ "1": 1, "2": { "height": 2.0 } }))
            .unwrap_err();

        assert!(matches!(err, FieldError::MissingKey { ref key } if key == "2.age"));
    }
}
