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

//! A set container over [`crate::raw::table::RawTable`]: identity is the
//! element itself, so no key-projection shim is needed (unlike `map`).

use crate::hash::FxBuildHasher;
use crate::raw::alloc::{Allocator, Global};
use crate::raw::table::{RawIter, RawTable};
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

fn make_hash<T, Q, S>(hash_builder: &S, val: &Q) -> u64
where
    T: Borrow<Q>,
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    let mut state = hash_builder.build_hasher();
    val.hash(&mut state);
    state.finish()
}

/// A set of `T` backed by an open-addressed Robin Hood table.
pub struct RobinSet<T, S = FxBuildHasher, A: Allocator = Global> {
    table: RawTable<T, A>,
    hasher: S,
}

impl<T> RobinSet<T, FxBuildHasher, Global> {
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, FxBuildHasher::default())
    }
}

impl<T> Default for RobinSet<T, FxBuildHasher, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: BuildHasher + Default> RobinSet<T, S, Global> {
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

impl<T, S, A> RobinSet<T, S, A>
where
    T: Hash + Eq,
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

    fn hash_of<Q>(&self, value: &Q) -> u64
    where
        T: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        make_hash::<T, Q, S>(&self.hasher, value)
    }

    fn hasher_for_element(&self) -> impl Fn(&T) -> u64 + '_ {
        move |value| make_hash::<T, T, S>(&self.hasher, value)
    }

    /// Adds `value`, returning `true` if it was not already present.
    ///
    /// Presence is resolved first, borrowing `value` only; `value` is
    /// moved into the table afterward, on the single path that needs it.
    pub fn add(&mut self, value: T) -> bool {
        let hash = self.hash_of(&value);
        if self.table.find(hash, |existing| *existing == value).is_some() {
            return false;
        }
        let hasher = self.hasher_for_element();
        self.table.insert_unique(hash, value, hasher);
        true
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(value);
        self.table.contains(hash, |existing| value.eq(existing.borrow()))
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(value);
        self.table
            .remove(hash, |existing| value.eq(existing.borrow()))
            .is_some()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn reserve(&mut self, additional: usize) {
        let hasher = self.hasher_for_element();
        self.table.reserve(additional, hasher);
    }

    pub fn for_each(&self, visitor: impl FnMut(&T)) {
        self.table.for_each(visitor)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

/// An iterator over `&T` in unspecified order.
pub struct Iter<'a, T> {
    inner: RawIter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
