use std::mem;
use std::sync::Arc;

use parking_lot::RwLock;

// -----------------------------------------------------------------------------
// ValueCell

/// Alias-counted storage for exactly one value of `T`.
///
/// A `ValueCell` is the storage block every field handle hangs off of.
/// [`alias`](ValueCell::alias) creates a second handle over the **same**
/// storage rather than a copy of the value: mutation through one alias is
/// visible through every other, and the storage is released exactly once,
/// when the last alias drops. There is no way to observe a released cell —
/// dropping a handle ends its life at the type level.
///
/// # Concurrency
///
/// Alias creation and destruction are safe from any number of threads; no
/// two threads can both conclude they were "the last" releaser. Individual
/// value accesses are serialized by an internal lock, but the cell makes no
/// promise about the *ordering* of accesses racing through different
/// aliases, nor about sequences of calls. Use [`with_mut`](ValueCell::with_mut)
/// for an atomic read-modify-write.
///
/// # Examples
///
/// ```
/// # use sf_cell::ValueCell;
/// let a = ValueCell::new(7);
/// let b = a.alias();
///
/// a.set(42);
/// assert_eq!(b.get(), 42);
/// assert_eq!(a.ref_count(), 2);
/// ```
pub struct ValueCell<T> {
    storage: Arc<RwLock<T>>,
}

impl<T> ValueCell<T> {
    /// Creates fresh storage holding `value`, with an alias count of 1.
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            storage: Arc::new(RwLock::new(value)),
        }
    }

    /// Creates fresh storage holding the type's zero-equivalent.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sf_cell::ValueCell;
    /// let cell = ValueCell::<u32>::zeroed();
    /// assert_eq!(cell.get(), 0);
    /// ```
    #[inline]
    pub fn zeroed() -> Self
    where
        T: Default,
    {
        Self::new(T::default())
    }

    /// Creates a second handle over the same storage.
    ///
    /// This is deliberately not a [`Clone`] impl: cloning a cell would read
    /// like a deep copy, and an alias is anything but.
    #[inline]
    pub fn alias(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }

    /// Number of live aliases of this storage.
    ///
    /// Only a snapshot: other threads may create or drop aliases at any
    /// time. Useful for tests and diagnostics.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.storage)
    }

    /// Returns `true` if `self` and `other` alias the same storage.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Exchanges which storage `self` and `other` reference, in place.
    ///
    /// No additional alias is created and no value is moved; afterwards each
    /// handle owns the other's storage (and keeps the other's alias count).
    ///
    /// # Examples
    ///
    /// ```
    /// # use sf_cell::ValueCell;
    /// let mut a = ValueCell::new(1);
    /// let mut b = ValueCell::new(2);
    ///
    /// a.swap(&mut b);
    /// assert_eq!(a.get(), 2);
    /// assert_eq!(b.get(), 1);
    /// ```
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.storage, &mut other.storage);
    }

    /// Reads the value out by clone.
    #[inline]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.storage.read().clone()
    }

    /// Stores `value`, dropping the previous one.
    #[inline]
    pub fn set(&self, value: T) {
        *self.storage.write() = value;
    }

    /// Stores `value` and returns the previous one.
    #[inline]
    pub fn replace(&self, value: T) -> T {
        mem::replace(&mut *self.storage.write(), value)
    }

    /// Runs `f` with shared access to the value.
    ///
    /// The internal lock is held for the duration of `f`; keep it short and
    /// do not touch the same cell again from inside.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.storage.read())
    }

    /// Runs `f` with exclusive access to the value.
    ///
    /// This is the only atomic read-modify-write the cell offers. The same
    /// re-entrancy caveat as [`with`](ValueCell::with) applies.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sf_cell::ValueCell;
    /// let cell = ValueCell::new(10);
    /// cell.with_mut(|v| *v += 1);
    /// assert_eq!(cell.get(), 11);
    /// ```
    #[inline]
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.storage.write())
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.storage.try_read() {
            Some(guard) => f
                .debug_struct("ValueCell")
                .field("value", &*guard)
                .field("refs", &self.ref_count())
                .finish(),
            None => f.debug_struct("ValueCell").finish_non_exhaustive(),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
