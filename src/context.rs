//! Request-scoped context values.
//!
//! # Responsibilities
//! - Hold the values a logical request carries across a call boundary
//! - Extend a context without mutating the original (copy-on-write)
//! - Mint opaque keys whose identity cannot collide by accident
//!
//! # Design Decisions
//! - Keys are typed handles with a process-unique id, not strings
//! - Values are stored behind `Arc`, so cloning a context is cheap
//! - The label on a key is for `Debug` output only; it never affects lookup

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global atomic counter for key ids.
/// Relaxed ordering is enough: only uniqueness matters.
static KEY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying one value in a [`Context`].
///
/// Two keys are equal only if one is a copy of the other; creating two keys
/// with the same label yields two independent slots.
///
/// Keys are usually created once and shared, e.g. through a
/// `static KEY: LazyLock<ContextKey<String>>`.
pub struct ContextKey<T> {
    id: u64,
    label: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Mint a new, unique key.
    pub fn new(label: &'static str) -> Self {
        Self {
            id: KEY_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            label,
            _marker: PhantomData,
        }
    }

    /// Label given at construction.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> PartialEq for ContextKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextKey({}#{})", self.label, self.id)
    }
}

#[derive(Clone)]
struct Entry {
    label: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Immutable mapping from [`ContextKey`]s to values, scoped to one request.
///
/// Extending a context returns a new one; every existing entry is kept and
/// the receiver is left untouched.
#[derive(Clone, Default)]
pub struct Context {
    entries: Arc<HashMap<u64, Entry>>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this context with `value` stored under `key`,
    /// replacing any previous value for that key.
    pub fn with_value<T>(&self, key: &ContextKey<T>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        let mut entries = HashMap::clone(&self.entries);
        entries.insert(
            key.id,
            Entry {
                label: key.label,
                value: Arc::new(value),
            },
        );
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Value stored under `key`, if any.
    pub fn get<T>(&self, key: &ContextKey<T>) -> Option<&T>
    where
        T: 'static,
    {
        self.entries
            .get(&key.id)
            .and_then(|entry| entry.value.downcast_ref::<T>())
    }

    /// Whether a value is stored under `key`.
    pub fn contains<T>(&self, key: &ContextKey<T>) -> bool {
        self.entries.contains_key(&key.id)
    }

    /// Number of keys with a value.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has a value.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut labels: Vec<_> = self
            .entries
            .iter()
            .map(|(id, entry)| format!("{}#{}", entry.label, id))
            .collect();
        labels.sort();
        f.debug_struct("Context").field("keys", &labels).finish()
    }
}
