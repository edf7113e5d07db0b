use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

/// An element that can be stored in an [`ElementSet`], keyed by a derived
/// comparable identity.
pub trait Element {
    type Key: Clone + std::fmt::Debug + Hash + Eq + Ord;

    fn key(&self) -> Self::Key;
}

/// A set of policy elements de-duplicated by their derived identity.
///
/// Iteration order is undefined; callers that emit wire configuration must
/// use [`ElementSet::sorted`] so that output is deterministic.
#[derive(Clone, Debug)]
pub struct ElementSet<T: Element> {
    items: HashMap<T::Key, T, RandomState>,
}

impl Element for String {
    type Key = Self;

    fn key(&self) -> Self::Key {
        self.clone()
    }
}

// === impl ElementSet ===

impl<T: Element> ElementSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an element, returning `false` if an element with the same
    /// identity was already present.
    pub fn insert(&mut self, item: T) -> bool {
        self.items.insert(item.key(), item).is_none()
    }

    /// Adds every element of `other` into this set.
    pub fn union(&mut self, other: impl IntoIterator<Item = T>) {
        for item in other {
            self.insert(item);
        }
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Returns the elements in a stable order, sorted by identity.
    pub fn sorted(&self) -> Vec<&T> {
        let mut items: Vec<&T> = self.items.values().collect();
        items.sort_by_key(|item| item.key());
        items
    }
}

impl<T: Element> Default for ElementSet<T> {
    fn default() -> Self {
        Self {
            items: HashMap::default(),
        }
    }
}

impl<T: Element + PartialEq> PartialEq for ElementSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .all(|(key, item)| other.items.get(key) == Some(item))
    }
}

impl<T: Element + Eq> Eq for ElementSet<T> {}

impl<T: Element> FromIterator<T> for ElementSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.union(iter);
        set
    }
}

impl<T: Element> IntoIterator for ElementSet<T> {
    type Item = T;
    type IntoIter = std::collections::hash_map::IntoValues<T::Key, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}
