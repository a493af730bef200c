/*
 * This file is part of robinmap.
 *
 * robinmap is a free and open-source embeddable hash table engine,
 * distributed in the hope that it will be useful but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or
 * FITNESS FOR A PARTICULAR PURPOSE.
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * You should have received a copy of the GNU Affero General Public
 * License along with this program. If not, see
 * <https://www.gnu.org/licenses/>.
 *
*/

//! A key-value container over [`crate::raw::table::RawTable`]: the table
//! stores `(K, V)` pairs but identity, hashing and equality only ever
//! look at the key half.

use crate::hash::FxBuildHasher;
use crate::raw::alloc::{Allocator, Global};
use crate::raw::table::{RawIter, RawTable};
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

fn make_hash<K, Q, S>(hash_builder: &S, key: &Q) -> u64
where
    K: Borrow<Q>,
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    let mut state = hash_builder.build_hasher();
    key.hash(&mut state);
    state.finish()
}

fn key_eq<'a, K, Q, V>(key: &'a Q) -> impl FnMut(&(K, V)) -> bool + 'a
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    move |pair| key.eq(pair.0.borrow())
}

/// A map from `K` to `V` backed by an open-addressed Robin Hood table.
pub struct RobinMap<K, V, S = FxBuildHasher, A: Allocator = Global> {
    table: RawTable<(K, V), A>,
    hasher: S,
}

impl<K, V> RobinMap<K, V, FxBuildHasher, Global> {
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, FxBuildHasher::default())
    }
}

impl<K, V> Default for RobinMap<K, V, FxBuildHasher, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S: BuildHasher + Default> RobinMap<K, V, S, Global> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: RawTable::new(),
            hasher,
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            table: RawTable::with_capacity(capacity),
            hasher,
        }
    }
}

impl<K, V, S, A> RobinMap<K, V, S, A>
where
    K: Hash + Eq,
    S: BuildHasher,
    A: Allocator + Clone,
{
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    fn hash_of<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        make_hash::<K, Q, S>(&self.hasher, key)
    }

    fn hasher_for_pair(&self) -> impl Fn(&(K, V)) -> u64 + '_ {
        move |pair| make_hash::<K, K, S>(&self.hasher, &pair.0)
    }

    /// Inserts `key`/`value`, returning the previous value under `key` if
    /// one existed.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_of(&key);
        if let Some(existing) = self.table.get_mut(hash, key_eq::<K, K, V>(&key)) {
            return Some(std::mem::replace(&mut existing.1, value));
        }
        let hasher = self.hasher_for_pair();
        self.table.insert_unique(hash, (key, value), hasher);
        None
    }

    /// Inserts `key`/`value` only if `key` is absent. Returns the index
    /// of the existing-or-inserted pair.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> usize {
        let hash = self.hash_of(&key);
        let eq = key_eq::<K, K, V>(&key);
        let hasher = self.hasher_for_pair();
        self.table.insert_if_absent(hash, (key, value), eq, hasher)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table.get(hash, key_eq::<K, Q, V>(key)).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table
            .get_mut(hash, key_eq::<K, Q, V>(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table.contains(hash, key_eq::<K, Q, V>(key))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table
            .remove(hash, key_eq::<K, Q, V>(key))
            .map(|(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn reserve(&mut self, additional: usize) {
        let hasher = self.hasher_for_pair();
        self.table.reserve(additional, hasher);
    }

    /// Runs `builder` exactly once, and only if `key` is absent, to
    /// produce the value installed under `key`. Returns a reference to
    /// the value now stored (whether freshly built or pre-existing).
    ///
    /// Presence is resolved with a lookup that only ever borrows `key`;
    /// `key` itself is moved into the table only on the (single) path
    /// that actually needs to store it, so `builder` never has to share
    /// `key` with an equality closure.
    pub fn compute_if_absent(&mut self, key: K, builder: impl FnOnce() -> V) -> &V {
        let hash = self.hash_of(&key);
        if let Some(idx) = self.table.find(hash, key_eq::<K, K, V>(&key)) {
            return &self.table.value_at(idx).1;
        }
        let hasher = self.hasher_for_pair();
        let idx = self
            .table
            .compute_if_absent(hash, |_| false, hasher, move || (key, builder()));
        &self.table.value_at(idx).1
    }

    /// Inserts `(key, seed)` if absent, or replaces the current value
    /// `v` with `merge(v, seed)` if present. `key` is cloned so it can
    /// back both the equality check and the seed pair the table may end
    /// up storing; `seed` itself is moved in exactly once.
    pub fn merge(&mut self, key: K, seed: V, merge: impl FnOnce(V, V) -> V) -> &V
    where
        K: Clone,
    {
        let hash = self.hash_of(&key);
        let eq = key_eq::<K, K, V>(&key);
        let hasher = self.hasher_for_pair();
        let idx = self.table.compute_merge(
            hash,
            eq,
            hasher,
            (key.clone(), seed),
            move |(k, old), (_, new)| (k, merge(old, new)),
        );
        &self.table.value_at(idx).1
    }

    pub fn for_each(&self, mut visitor: impl FnMut(&K, &V)) {
        self.table.for_each(|(k, v)| visitor(k, v))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

/// An iterator over `(&K, &V)` pairs in unspecified order.
pub struct Iter<'a, K, V> {
    inner: RawIter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
