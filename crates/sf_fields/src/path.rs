//! Key-path tracking for tree-walk diagnostics.
//!
//! While a serialize or deserialize walk descends into a named container, the
//! key it entered through is pushed onto a thread-local stack. Errors raised
//! deeper in the walk qualify their key with that stack, so a failure reads
//! `` `2.age` `` instead of a bare `` `age` ``.
//!
//! Only active with the `debug` cargo feature in Debug mode; otherwise every
//! helper here compiles down to nothing.

#[cfg(all(debug_assertions, feature = "debug"))]
mod stack {
    use core::cell::RefCell;

    std::thread_local! {
        static KEY_PATH: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    /// Pops the innermost key when the walk leaves its scope.
    pub(crate) struct PathGuard;

    impl Drop for PathGuard {
        fn drop(&mut self) {
            KEY_PATH.with_borrow_mut(|path| {
                path.pop();
            });
        }
    }

    pub(crate) fn enter(key: &str) -> PathGuard {
        KEY_PATH.with_borrow_mut(|path| path.push(key.to_owned()));
        PathGuard
    }

    pub(crate) fn qualify(key: &str) -> String {
        KEY_PATH.with_borrow(|path| {
            if path.is_empty() {
                key.to_owned()
            } else {
                let mut full = path.join(".");
                full.push('.');
                full.push_str(key);
                full
            }
        })
    }
}

#[cfg(not(all(debug_assertions, feature = "debug")))]
mod stack {
    pub(crate) struct PathGuard;

    #[inline(always)]
    pub(crate) fn enter(_key: &str) -> PathGuard {
        PathGuard
    }

    #[inline(always)]
    pub(crate) fn qualify(key: &str) -> String {
        key.to_owned()
    }
}

pub(crate) use stack::{enter, qualify};

// -----------------------------------------------------------------------------
// Tests

#[cfg(all(test, debug_assertions, feature = "debug"))]
mod tests {
    use super::{enter, qualify};

    #[test]
    fn qualify_joins_entered_keys() {
        assert_eq!(qualify("age"), "age");

        let _outer = enter("2");
        {
            let _inner = enter("pose");
            assert_eq!(qualify("age"), "2.pose.age");
        }
        assert_eq!(qualify("age"), "2.age");
    }
}
