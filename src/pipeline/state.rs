// ABOUTME: Shared state bag carried through one build.
// ABOUTME: Typed keys give schema-checked reads that fail with a descriptive error.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A typed handle for one entry in the state bag.
///
/// The value type travels with the key, so a reader can't ask for a
/// different type than the writer stored without getting a `TypeMismatch`.
pub struct StateKey<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> StateKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StateKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateKey<T> {}

impl<T> fmt::Debug for StateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateKey({})", self.name)
    }
}

/// Errors from reading the state bag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("state key '{key}' was not set by an earlier step")]
    Missing { key: &'static str },

    #[error("state key '{key}' does not hold a {expected}")]
    TypeMismatch {
        key: &'static str,
        expected: &'static str,
    },
}

/// Per-build key/value store shared by every step.
///
/// Steps run one at a time, so the bag is handed out as `&mut` and needs no
/// internal locking.
#[derive(Default)]
pub struct StateBag {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl StateBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value for the key.
    pub fn put<T: Any + Send + Sync>(&mut self, key: StateKey<T>, value: T) {
        self.values.insert(key.name, Box::new(value));
    }

    /// Read a value an earlier step must have stored.
    pub fn get<T: Any + Send + Sync>(&self, key: StateKey<T>) -> Result<&T, StateError> {
        self.find(key)?.ok_or(StateError::Missing { key: key.name })
    }

    /// Read a value that may legitimately be absent.
    pub fn find<T: Any + Send + Sync>(&self, key: StateKey<T>) -> Result<Option<&T>, StateError> {
        match self.values.get(key.name) {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .map(Some)
                .ok_or(StateError::TypeMismatch {
                    key: key.name,
                    expected: type_name::<T>(),
                }),
        }
    }

    /// Read a boolean marker; absent or mistyped markers read as false.
    pub fn flag(&self, key: StateKey<bool>) -> bool {
        matches!(self.find(key), Ok(Some(true)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names of every populated key, sorted.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.values.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for StateBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBag")
            .field("keys", &self.keys())
            .finish()
    }
}
