//! Ordered, value-deduplicated containers.
//!
//! [`Collection`] is the storage shared by
//! [`PermissionCollection`](crate::PermissionCollection) and
//! [`EntityCollection`](crate::EntityCollection). Items are kept in an
//! insertion-ordered map keyed by [`CollectionKey`]; `add` guarantees that
//! no two stored items are value-equal by replacing an equal item in place.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::describe::{indent, Describe};
use crate::equality::ValueEquatable;

/// Key of an item inside a collection.
///
/// `add` hands out integer keys; `put` accepts either kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKey {
    /// Positional key assigned by `add`.
    Index(usize),
    /// Explicit key supplied through `put`.
    Named(String),
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKey::Index(index) => write!(f, "{}", index),
            CollectionKey::Named(name) => write!(f, "{:?}", name),
        }
    }
}

impl From<usize> for CollectionKey {
    fn from(index: usize) -> Self {
        CollectionKey::Index(index)
    }
}

impl From<&str> for CollectionKey {
    fn from(name: &str) -> Self {
        CollectionKey::Named(name.to_string())
    }
}

impl From<String> for CollectionKey {
    fn from(name: String) -> Self {
        CollectionKey::Named(name)
    }
}

/// Items that can be stored in a [`Collection`].
pub trait CollectionItem: ValueEquatable + Clone {
    /// Name of the collection type holding this item, used in dumps and
    /// error messages.
    const COLLECTION_NAME: &'static str;
}

struct Store<T> {
    items: IndexMap<CollectionKey, T>,
    next_index: usize,
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
            next_index: 0,
        }
    }
}

/// Ordered associative container of value-unique items.
///
/// A `Collection` is a shared handle. Cloning it aliases the same backing
/// store, so mutations through any clone are visible through all of them.
/// Use [`detached`](Collection::detached) for an independent container.
///
/// Every method borrows the store only for its own duration; iteration
/// works on a snapshot of the item handles.
pub struct Collection<T> {
    store: Rc<RefCell<Store<T>>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            store: Rc::new(RefCell::new(Store::default())),
        }
    }
}

impl<T: CollectionItem> Collection<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection and `add` every item in order.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let collection = Self::new();
        for item in items {
            collection.add(item);
        }
        collection
    }

    /// Add an item.
    ///
    /// If a value-equal item is already stored it is replaced at its
    /// existing key; otherwise the item is appended under the next integer
    /// key. Returns the key the item ends up under.
    pub fn add(&self, item: T) -> CollectionKey {
        match self.get_key(&item) {
            Some(key) => {
                self.put(item, key.clone());
                key
            }
            None => self.push(item),
        }
    }

    /// Append under the next integer key without looking for a value-equal
    /// item. Callers must already know the item is not stored.
    pub(crate) fn push(&self, item: T) -> CollectionKey {
        let mut store = self.store.borrow_mut();
        let key = CollectionKey::Index(store.next_index);
        store.next_index += 1;
        store.items.insert(key.clone(), item);
        key
    }

    /// Store an item at `key`, replacing whatever is there.
    ///
    /// This is an unconditional upsert: it does not look for value-equal
    /// items under other keys.
    pub fn put(&self, item: T, key: impl Into<CollectionKey>) {
        let key = key.into();
        let mut store = self.store.borrow_mut();
        if let CollectionKey::Index(index) = key {
            if index >= store.next_index {
                store.next_index = index + 1;
            }
        }
        store.items.insert(key, item);
    }

    /// Find the key of the item value-equal to `item`.
    pub fn get_key(&self, item: &T) -> Option<CollectionKey> {
        self.store
            .borrow()
            .items
            .iter()
            .find(|(_, stored)| stored.is_equal_to(item))
            .map(|(key, _)| key.clone())
    }

    /// Get the item stored at `key`.
    pub fn get(&self, key: &CollectionKey) -> Option<T> {
        self.store.borrow().items.get(key).cloned()
    }

    /// Check whether a value-equal item is stored.
    pub fn has(&self, item: &T) -> bool {
        self.get_key(item).is_some()
    }

    /// Remove the item value-equal to `item`, if any.
    pub fn remove(&self, item: &T) -> Option<T> {
        let key = self.get_key(item)?;
        self.remove_key(&key)
    }

    /// Remove the item stored at `key`, keeping the order of the rest.
    pub fn remove_key(&self, key: &CollectionKey) -> Option<T> {
        self.store.borrow_mut().items.shift_remove(key)
    }

    /// Remove every item.
    pub fn remove_all(&self) {
        self.store.borrow_mut().items.clear();
    }

    /// Number of stored items.
    pub fn count(&self) -> usize {
        self.store.borrow().items.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Check whether anything is stored at `key`.
    pub fn key_exists(&self, key: &CollectionKey) -> bool {
        self.store.borrow().items.contains_key(key)
    }

    /// Keys in iteration order.
    pub fn keys(&self) -> Vec<CollectionKey> {
        self.store.borrow().items.keys().cloned().collect()
    }

    /// Item handles in iteration order.
    pub fn items(&self) -> Vec<T> {
        self.store.borrow().items.values().cloned().collect()
    }

    /// Key/item pairs in iteration order.
    pub fn entries(&self) -> Vec<(CollectionKey, T)> {
        self.store
            .borrow()
            .items
            .iter()
            .map(|(key, item)| (key.clone(), item.clone()))
            .collect()
    }

    /// The first item in iteration order.
    pub fn first(&self) -> Option<T> {
        self.store.borrow().items.values().next().cloned()
    }

    /// Stable in-place sort. Keys travel with their items.
    ///
    /// The comparator works on a snapshot and runs outside the store borrow,
    /// so it may read this collection freely. The store is left untouched
    /// until the snapshot is sorted; if the comparator panics nothing is
    /// reordered. Items the comparator adds keep their place after the
    /// sorted ones.
    pub fn sort_by<F>(&self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut entries = self.entries();
        entries.sort_by(|(_, a), (_, b)| compare(a, b));

        let mut store = self.store.borrow_mut();
        let mut sorted = IndexMap::with_capacity(store.items.len());
        for (key, _) in entries {
            if let Some(item) = store.items.shift_remove(&key) {
                sorted.insert(key, item);
            }
        }
        sorted.extend(store.items.drain(..));
        store.items = sorted;
    }

    /// Take every item out, but only when no other handle shares the store.
    ///
    /// Used to tear down long parent chains without recursion.
    pub(crate) fn take_if_unaliased(&self) -> Vec<T> {
        if Rc::strong_count(&self.store) != 1 {
            return Vec::new();
        }
        match self.store.try_borrow_mut() {
            Ok(mut store) => store.items.drain(..).map(|(_, item)| item).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// A new collection holding the same item handles under the same keys.
    pub fn detached(&self) -> Self {
        let store = self.store.borrow();
        Self {
            store: Rc::new(RefCell::new(Store {
                items: store.items.clone(),
                next_index: store.next_index,
            })),
        }
    }

    /// Check if two handles share the same backing store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }
}

impl<T: CollectionItem> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl<T: CollectionItem> IntoIterator for &Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items().into_iter()
    }
}

impl<T: CollectionItem + fmt::Debug> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.borrow();
        f.debug_map().entries(store.items.iter()).finish()
    }
}

impl<T: CollectionItem + Describe> Describe for Collection<T> {
    fn write_description(&self, out: &mut String, depth: usize, excluding: &[&str]) {
        let entries = self.entries();
        if entries.is_empty() {
            out.push_str(T::COLLECTION_NAME);
            out.push_str(" []\n");
            return;
        }
        out.push_str(T::COLLECTION_NAME);
        out.push_str(" [\n");
        for (key, item) in entries {
            indent(out, depth + 1);
            out.push_str(&key.to_string());
            out.push_str(" =>\n");
            item.write_description(out, depth + 2, excluding);
        }
        indent(out, depth);
        out.push_str("]\n");
    }
}
