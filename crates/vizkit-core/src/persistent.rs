//! Named values that outlive the objects holding them.
//!
//! A [`PersistentValue`] is a variable with a name. On creation it looks its
//! name up in a [`PersistentCache`]; a cached value wins over the default
//! passed by the caller. Explicit writes go straight to the cache, and the
//! final value is flushed when the `PersistentValue` drops, so recreating an
//! object (e.g. re-registering a structure with the same name) brings its
//! settings back.
//!
//! Mutation through [`PersistentValue::get_mut`] is deliberately *not*
//! written through: UI code may poke the value every frame, and the cache only
//! needs to see it on [`PersistentValue::manually_changed`], at the end of a
//! [`PersistentValue::edit`] scope, or on drop.
//!
//! The cache is an explicit object rather than a process global, so tests and
//! independent viewers can each own one. It is single-threaded (`Rc`), like the
//! rest of the frame loop.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use tracing::{trace, warn};

use crate::type_tag::TypeTag;

/// Misuse of persistent value names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Another live `PersistentValue` already owns this name.
    #[error("persistent value `{name}` is already live")]
    DuplicateLiveName { name: String },

    /// The name is already cached under a different value type.
    #[error("persistent value `{name}` is cached as {cached}, requested as {requested}")]
    TypeMismatch {
        name: String,
        cached: &'static str,
        requested: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CacheTables {
    /// One `HashMap<String, T>` per value type.
    tables: HashMap<TypeId, Box<dyn Any>>,
    owners: HashMap<String, TypeTag>,
    live: HashSet<String>,
}

impl CacheTables {
    fn table<T: 'static>(&self) -> Option<&HashMap<String, T>> {
        self.tables
            .get(&TypeId::of::<T>())
            .and_then(|table| table.downcast_ref())
    }

    fn table_mut<T: 'static>(&mut self) -> &mut HashMap<String, T> {
        let table = self
            .tables
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(HashMap::<String, T>::new()));
        match table.downcast_mut() {
            Some(table) => table,
            None => unreachable!("cache tables are keyed by their value type"),
        }
    }
}

/// Name-keyed store backing [`PersistentValue`]s, one table per value type.
///
/// Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct PersistentCache {
    inner: Rc<RefCell<CacheTables>>,
}

impl PersistentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `name`, if one of type `T` exists.
    pub fn get<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.inner.borrow().table::<T>()?.get(name).cloned()
    }

    pub fn contains<T: 'static>(&self, name: &str) -> bool {
        self.inner
            .borrow()
            .table::<T>()
            .is_some_and(|table| table.contains_key(name))
    }

    /// Number of cached names across all value types.
    pub fn len(&self) -> usize {
        self.inner.borrow().owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every cached value. Live values re-populate their entries when
    /// they are next written or dropped.
    pub fn clear(&self) {
        let mut tables = self.inner.borrow_mut();
        tables.tables.clear();
        tables.owners.clear();
    }

    /// Register a live value named `name`, returning its starting value and
    /// whether it came from the cache.
    fn claim<T: Clone + 'static>(&self, name: &str, default: T) -> Result<(T, bool), CacheError> {
        let mut tables = self.inner.borrow_mut();
        let tag = TypeTag::of::<T>();

        if let Some(cached) = tables.owners.get(name).copied() {
            if cached != tag {
                warn!(
                    name,
                    cached = cached.name(),
                    requested = tag.name(),
                    "persistent value type clash"
                );
                return Err(CacheError::TypeMismatch {
                    name: name.to_string(),
                    cached: cached.name(),
                    requested: tag.name(),
                });
            }
        }
        if !tables.live.insert(name.to_string()) {
            return Err(CacheError::DuplicateLiveName {
                name: name.to_string(),
            });
        }
        tables.owners.insert(name.to_string(), tag);

        let table = tables.table_mut::<T>();
        match table.get(name) {
            Some(cached) => {
                trace!(name, "persistent value restored from cache");
                Ok((cached.clone(), true))
            }
            None => {
                table.insert(name.to_string(), default.clone());
                Ok((default, false))
            }
        }
    }

    fn store<T: 'static>(&self, name: &str, value: T) {
        let mut tables = self.inner.borrow_mut();
        tables
            .owners
            .entry(name.to_string())
            .or_insert_with(TypeTag::of::<T>);
        tables.table_mut::<T>().insert(name.to_string(), value);
    }

    fn release(&self, name: &str) {
        self.inner.borrow_mut().live.remove(name);
    }
}

impl fmt::Debug for PersistentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.inner.borrow();
        f.debug_struct("PersistentCache")
            .field("entries", &tables.owners.len())
            .field("live", &tables.live.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// PersistentValue
// ---------------------------------------------------------------------------

/// A named variable backed by a [`PersistentCache`].
pub struct PersistentValue<T: Clone + 'static> {
    cache: PersistentCache,
    name: String,
    value: T,
    /// Set until the value is explicitly written or was restored from cache.
    holds_default_value: bool,
}

impl<T: Clone + 'static> PersistentValue<T> {
    /// Create a value named `name`. If the cache already holds `name`, that
    /// value replaces `default`; otherwise `default` is written to the cache.
    pub fn new(
        cache: &PersistentCache,
        name: impl Into<String>,
        default: T,
    ) -> Result<Self, CacheError> {
        let name = name.into();
        let (value, from_cache) = cache.claim(&name, default)?;
        Ok(Self {
            cache: cache.clone(),
            name,
            value,
            holds_default_value: !from_cache,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutable access. Changes reach the cache only on
    /// [`manually_changed`](Self::manually_changed) or drop.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Push the current value to the cache after in-place mutation.
    pub fn manually_changed(&mut self) {
        self.set(self.value.clone());
    }

    /// Overwrite the value and its cache entry.
    pub fn set(&mut self, value: T) {
        self.cache.store(&self.name, value.clone());
        self.value = value;
        self.holds_default_value = false;
    }

    /// Overwrite the value only if it still holds its construction default,
    /// i.e. nothing was explicitly set and nothing was restored from cache.
    pub fn set_passive(&mut self, value: T) {
        if self.holds_default_value {
            self.cache.store(&self.name, value.clone());
            self.value = value;
        }
    }

    /// Take the value of `other`, keeping this value's own name.
    pub fn assign_from(&mut self, other: &PersistentValue<T>) {
        self.set(other.value.clone());
    }

    /// Scoped mutable access which is flushed to the cache when the guard drops.
    pub fn edit(&mut self) -> PersistentEdit<'_, T> {
        PersistentEdit { target: self }
    }

    pub fn holds_default_value(&self) -> bool {
        self.holds_default_value
    }
}

impl<T: Clone + 'static> Drop for PersistentValue<T> {
    fn drop(&mut self) {
        self.cache.store(&self.name, self.value.clone());
        self.cache.release(&self.name);
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for PersistentValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentValue")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("holds_default_value", &self.holds_default_value)
            .finish()
    }
}

/// Guard returned by [`PersistentValue::edit`].
pub struct PersistentEdit<'a, T: Clone + 'static> {
    target: &'a mut PersistentValue<T>,
}

impl<T: Clone + 'static> Deref for PersistentEdit<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.target.value
    }
}

impl<T: Clone + 'static> DerefMut for PersistentEdit<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.target.value
    }
}

impl<T: Clone + 'static> Drop for PersistentEdit<'_, T> {
    fn drop(&mut self) {
        self.target.manually_changed();
    }
}
