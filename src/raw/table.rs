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

//! The Robin Hood table itself: lazy allocation, Fibonacci hash mapping,
//! a SIMD-prefiltered lookup, Robin Hood insertion with swap-on-collision,
//! back-shift deletion, and growth.
//!
//! Every entry point here takes the element's hash and an equality
//! predicate from the caller rather than owning a `BuildHasher`: the
//! facades in [`crate::map`] and [`crate::set`] own the hasher and decide
//! what equality means for their element type.

use crate::error::{Fallibility, TryReserveError};
use crate::hash::hash_mapping;
use crate::raw::alloc::{self_allocate, Allocator, Global, Layout};
use crate::raw::scopeguard::ScopeGuard;
use crate::raw::{likely, next_capacity, unlikely, Group, EMPTY};
use log::trace;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::ptr::NonNull;

/// The outcome of [`RawTable::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// No equal element existed; the new element was placed at this index.
    Inserted(usize),
    /// An equal element existed and was replaced; this is its index.
    Replaced(usize),
    /// An equal element existed and `replace` was false; this is its
    /// index. The element passed to `insert` was dropped.
    NotInserted(usize),
}

struct ArrayLayouts {
    values: Layout,
    hashmeta: Layout,
    dist: Layout,
}

fn layouts_for<T>(capacity: usize) -> ArrayLayouts {
    ArrayLayouts {
        values: Layout::array::<T>(capacity).expect("capacity overflow"),
        hashmeta: Layout::array::<u8>(capacity + Group::WIDTH).expect("capacity overflow"),
        dist: Layout::array::<u8>(capacity).expect("capacity overflow"),
    }
}

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// An open-addressed table using Robin Hood probing and tombstone-free
/// back-shift deletion.
///
/// Three parallel allocations back the table: `values` (the elements),
/// `hashmeta` (a 7-bit partial-hash tag per slot, `0` meaning empty, with
/// `Group::WIDTH` extra mirrored bytes at the tail so a SIMD group load
/// can straddle the wrap-around point), and `dist` (the probe distance of
/// the element from its home slot).
pub struct RawTable<T, A: Allocator = Global> {
    capacity: usize,
    items: usize,
    values: NonNull<T>,
    hashmeta: NonNull<u8>,
    dist: NonNull<u8>,
    alloc: A,
    marker: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for RawTable<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for RawTable<T, A> {}

impl<T> RawTable<T, Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }
}

impl<T> Default for RawTable<T, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> RawTable<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            capacity: 0,
            items: 0,
            values: NonNull::dangling(),
            hashmeta: NonNull::dangling(),
            dist: NonNull::dangling(),
            alloc,
            marker: PhantomData,
        }
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut table = Self::new_in(alloc);
        if capacity > 0 {
            table.allocate_empty(next_capacity(capacity));
        }
        table
    }

    /// Allocates the three arrays for a brand-new table (`items` must
    /// still be `0`); used by construction, never by growth (growth must
    /// move existing elements, see [`RawTable::grow_to`]).
    fn allocate_empty(&mut self, capacity: usize) {
        let layouts = layouts_for::<T>(capacity);
        let values = self_allocate(&self.alloc, layouts.values)
            .unwrap_or_else(|_| std::alloc::handle_alloc_error(layouts.values))
            .cast::<T>();
        let hashmeta = self_allocate(&self.alloc, layouts.hashmeta)
            .unwrap_or_else(|_| std::alloc::handle_alloc_error(layouts.hashmeta));
        let dist = self_allocate(&self.alloc, layouts.dist)
            .unwrap_or_else(|_| std::alloc::handle_alloc_error(layouts.dist));
        unsafe {
            hashmeta.as_ptr().write_bytes(EMPTY, layouts.hashmeta.size());
            dist.as_ptr().write_bytes(0, layouts.dist.size());
        }
        self.capacity = capacity;
        self.values = values;
        self.hashmeta = hashmeta;
        self.dist = dist;
    }

    pub fn len(&self) -> usize {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn load_factor(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.items as f64 / self.capacity as f64
        }
    }

    #[inline]
    fn mask(&self) -> usize {
        self.capacity.wrapping_sub(1)
    }

    #[inline]
    unsafe fn meta(&self, index: usize) -> u8 {
        *self.hashmeta.as_ptr().add(index)
    }

    #[inline]
    unsafe fn dist_at(&self, index: usize) -> u8 {
        *self.dist.as_ptr().add(index)
    }

    #[inline]
    unsafe fn value(&self, index: usize) -> &T {
        &*self.values.as_ptr().add(index)
    }

    /// Writes the metadata byte at `index`, keeping the wrap-around
    /// mirror (the extra `Group::WIDTH` bytes past `capacity`) in sync so
    /// a group load straddling the end still observes it.
    #[inline]
    unsafe fn set_meta(&self, index: usize, meta: u8) {
        let mirror = ((index.wrapping_sub(Group::WIDTH)) & self.mask()) + Group::WIDTH;
        *self.hashmeta.as_ptr().add(index) = meta;
        *self.hashmeta.as_ptr().add(mirror) = meta;
    }

    #[inline]
    unsafe fn set_dist(&self, index: usize, d: u8) {
        *self.dist.as_ptr().add(index) = d;
    }

    unsafe fn set_slot(&mut self, index: usize, value: T, meta: u8, d: u8) {
        self.values.as_ptr().add(index).write(value);
        self.set_meta(index, meta);
        self.set_dist(index, d);
    }

    unsafe fn take_slot(&mut self, index: usize) -> T {
        self.values.as_ptr().add(index).read()
    }

    /// Exchanges the element/metadata/distance carried in `value`/`meta`/`d`
    /// with whatever currently occupies `index`, so the caller can keep
    /// walking the probe sequence with the evicted (now carried) element.
    unsafe fn swap_slot(&mut self, index: usize, value: &mut T, meta: &mut u8, d: &mut u8) {
        std::mem::swap(&mut *self.values.as_ptr().add(index), value);
        let old_meta = self.meta(index);
        let old_dist = self.dist_at(index);
        self.set_meta(index, *meta);
        self.set_dist(index, *d);
        *meta = old_meta;
        *d = old_dist;
    }

    /// Finds the index of an element matching `hash`/`eq`, if present.
    pub fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        if self.capacity == 0 {
            return None;
        }
        let mask = self.mask();
        let (home, meta) = hash_mapping(hash, mask);
        let mut slot = home;
        loop {
            unsafe {
                let group = Group::load_unaligned(self.hashmeta.as_ptr().add(slot));
                for bit in group.match_byte(meta) {
                    let idx = (slot + bit) & mask;
                    if likely(eq(self.value(idx))) {
                        return Some(idx);
                    }
                }
                if group.match_empty().any_bit_set() {
                    return None;
                }
            }
            slot = (slot + Group::WIDTH) & mask;
        }
    }

    /// Locates an element without borrowing it, for facades that need the
    /// index itself (e.g. to re-borrow mutably afterward without holding
    /// the equality closure's borrow open). Equivalent to [`RawTable::find`].
    pub fn try_get_index(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<usize> {
        self.find(hash, eq)
    }

    /// Returns the element at `index`.
    ///
    /// `index` must be a slot index previously returned by an operation
    /// on this table, with no intervening mutation (matching every other
    /// index returned by this API: it is a snapshot, not a stable handle).
    pub fn value_at(&self, index: usize) -> &T {
        unsafe { self.value(index) }
    }

    /// Mutable counterpart of [`RawTable::value_at`].
    pub fn value_at_mut(&mut self, index: usize) -> &mut T {
        unsafe { &mut *self.values.as_ptr().add(index) }
    }

    pub fn contains(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> bool {
        self.find(hash, eq).is_some()
    }

    pub fn get(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&T> {
        self.find(hash, eq).map(|i| unsafe { self.value(i) })
    }

    pub fn get_mut(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&mut T> {
        let idx = self.find(hash, eq)?;
        Some(unsafe { &mut *self.values.as_ptr().add(idx) })
    }

    /// Removes the element at `index`, shifting its trailing cluster back
    /// by one slot so no tombstone is ever created.
    ///
    /// ## Panics
    /// In debug builds, if the table is empty.
    pub fn remove_at(&mut self, index: usize) -> T {
        debug_assert!(self.capacity > 0);
        let mask = self.mask();
        unsafe {
            let value = self.take_slot(index);
            self.items -= 1;
            let mut t = index;
            loop {
                let j = (t + 1) & mask;
                let j_meta = self.meta(j);
                if j_meta == EMPTY || self.dist_at(j) == 0 {
                    self.set_meta(t, EMPTY);
                    self.set_dist(t, 0);
                    break;
                }
                let moved = self.values.as_ptr().add(j).read();
                self.values.as_ptr().add(t).write(moved);
                self.set_meta(t, j_meta);
                self.set_dist(t, self.dist_at(j) - 1);
                t = j;
            }
            value
        }
    }

    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.find(hash, eq)?;
        Some(self.remove_at(index))
    }

    pub fn clear(&mut self) {
        if self.capacity == 0 {
            return;
        }
        unsafe {
            for i in 0..self.capacity {
                if self.meta(i) != EMPTY {
                    self.values.as_ptr().add(i).drop_in_place();
                }
            }
            self.hashmeta
                .as_ptr()
                .write_bytes(EMPTY, self.capacity + Group::WIDTH);
            self.dist.as_ptr().write_bytes(0, self.capacity);
        }
        self.items = 0;
    }

    /// Visits every element in an unspecified, implementation-defined
    /// order. Short-circuits on [`ControlFlow::Break`] and returns the
    /// number of elements visited, including the one that broke.
    pub fn try_for_each(&self, mut visitor: impl FnMut(&T) -> ControlFlow<()>) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        let mut visited = 0;
        let mut slot = 0usize;
        while slot < self.capacity {
            unsafe {
                let group = Group::load_aligned(self.hashmeta.as_ptr().add(slot));
                for bit in group.match_full() {
                    let idx = slot + bit;
                    if idx >= self.capacity {
                        continue;
                    }
                    visited += 1;
                    if visitor(self.value(idx)).is_break() {
                        return visited;
                    }
                }
            }
            slot += Group::WIDTH;
        }
        visited
    }

    pub fn for_each(&self, mut visitor: impl FnMut(&T)) {
        self.try_for_each(|v| {
            visitor(v);
            ControlFlow::Continue(())
        });
    }

    pub fn iter(&self) -> RawIter<'_, T> {
        RawIter {
            values: self.values,
            hashmeta: self.hashmeta,
            capacity: self.capacity,
            slot: 0,
            remaining: self.items,
            marker: PhantomData,
        }
    }
}

impl<T, A: Allocator + Clone> RawTable<T, A> {
    fn reserve_one(&mut self, hasher: &impl Fn(&T) -> u64) {
        if self.capacity == 0 {
            self.grow_to(8, hasher, Fallibility::Infallible)
                .unwrap_or_else(|_| unreachable!("infallible growth cannot fail"));
        } else if unlikely(self.items + 1 > Self::max_load(self.capacity)) {
            self.grow_to(self.capacity * 2, hasher, Fallibility::Infallible)
                .unwrap_or_else(|_| unreachable!("infallible growth cannot fail"));
        }
    }

    fn max_load(capacity: usize) -> usize {
        (capacity * 7) / 8
    }

    /// Ensures capacity for `additional` more unique insertions, growing
    /// (and panicking, or aborting on allocation failure) if needed.
    /// Returns whether a rehash occurred.
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(&T) -> u64) -> bool {
        self.reserve_capacity(additional, &hasher, Fallibility::Infallible)
            .unwrap_or_else(|_| unreachable!("infallible reserve cannot fail"))
    }

    /// Fallible counterpart of [`RawTable::reserve`].
    pub fn try_reserve(
        &mut self,
        additional: usize,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<bool, TryReserveError> {
        self.reserve_capacity(additional, &hasher, Fallibility::Fallible)
    }

    fn reserve_capacity(
        &mut self,
        additional: usize,
        hasher: &impl Fn(&T) -> u64,
        fallibility: Fallibility,
    ) -> Result<bool, TryReserveError> {
        let required = self
            .items
            .checked_add(additional)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        let buckets = ceil_div(required, 7)
            .checked_mul(8)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        let needed_capacity = next_capacity(buckets);
        if needed_capacity <= self.capacity {
            return Ok(false);
        }
        self.grow_to(needed_capacity, hasher, fallibility)?;
        Ok(true)
    }

    /// Allocates a table of `new_capacity`, moves every element across
    /// (recomputing its hash via `hasher`), then frees the old arrays.
    ///
    /// The old arrays are freed through a [`ScopeGuard`] so that if
    /// `hasher` (or an element's own destructor while unwinding) panics
    /// partway through, the elements not yet moved are dropped and the
    /// old allocation is still released; the elements already moved live
    /// on in `self`, which by that point is itself a fully valid table.
    fn grow_to(
        &mut self,
        new_capacity: usize,
        hasher: &impl Fn(&T) -> u64,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let new_capacity = next_capacity(new_capacity);
        trace!(
            "rehashing robinmap table: {} -> {} buckets ({} items)",
            self.capacity,
            new_capacity,
            self.items
        );
        let layouts = layouts_for::<T>(new_capacity);
        let new_values = self
            .alloc_layout(layouts.values, fallibility)?
            .cast::<T>();
        let new_hashmeta = match self.alloc_layout(layouts.hashmeta, fallibility) {
            Ok(p) => p,
            Err(e) => {
                unsafe {
                    self.alloc.deallocate(new_values.cast(), layouts.values);
                }
                return Err(e);
            }
        };
        let new_dist = match self.alloc_layout(layouts.dist, fallibility) {
            Ok(p) => p,
            Err(e) => {
                unsafe {
                    self.alloc.deallocate(new_values.cast(), layouts.values);
                    self.alloc.deallocate(new_hashmeta, layouts.hashmeta);
                }
                return Err(e);
            }
        };
        unsafe {
            new_hashmeta
                .as_ptr()
                .write_bytes(EMPTY, layouts.hashmeta.size());
            new_dist.as_ptr().write_bytes(0, layouts.dist.size());
        }

        let old_capacity = self.capacity;
        let old_values = self.values;
        let old_hashmeta = self.hashmeta;
        let old_dist = self.dist;

        self.capacity = new_capacity;
        self.values = new_values;
        self.hashmeta = new_hashmeta;
        self.dist = new_dist;
        self.items = 0;

        struct OldArrays<T> {
            capacity: usize,
            values: NonNull<T>,
            hashmeta: NonNull<u8>,
            dist: NonNull<u8>,
            next: usize,
        }

        let old_state = OldArrays {
            capacity: old_capacity,
            values: old_values,
            hashmeta: old_hashmeta,
            dist: old_dist,
            next: 0,
        };
        let alloc = self.alloc.clone();
        let mut guard = ScopeGuard::new(old_state, move |st: &mut OldArrays<T>| {
            if st.capacity == 0 {
                return;
            }
            unsafe {
                for i in st.next..st.capacity {
                    if *st.hashmeta.as_ptr().add(i) != EMPTY {
                        st.values.as_ptr().add(i).drop_in_place();
                    }
                }
                let old_layouts = layouts_for::<T>(st.capacity);
                alloc.deallocate(st.values.cast(), old_layouts.values);
                alloc.deallocate(st.hashmeta, old_layouts.hashmeta);
                alloc.deallocate(st.dist, old_layouts.dist);
            }
        });

        if old_capacity > 0 {
            for i in 0..old_capacity {
                unsafe {
                    if *guard.hashmeta.as_ptr().add(i) == EMPTY {
                        continue;
                    }
                    // Claim slot `i` before reading it out, so a panic in
                    // `hasher` (the value is then owned by this stack
                    // frame and drops normally on unwind) does not also
                    // make the guard try to drop it a second time.
                    guard.next = i + 1;
                    let value = guard.values.as_ptr().add(i).read();
                    let h = hasher(&value);
                    self.insert_unique_inner(h, value);
                }
            }
        }

        Ok(())
    }

    fn alloc_layout(
        &self,
        layout: Layout,
        fallibility: Fallibility,
    ) -> Result<NonNull<u8>, TryReserveError> {
        self_allocate(&self.alloc, layout).map_err(|_| fallibility.alloc_err(layout))
    }

    /// Places `value` starting at `slot` (with the given metadata and
    /// probe distance), performing Robin Hood swaps along the way, and
    /// returns the index `value` itself finally lands at (not
    /// necessarily `slot`: this is only `slot` if no swap was needed, or
    /// the slot of the *first* swap otherwise, since `value` occupies
    /// that slot for good from that point on).
    fn place_unique(&mut self, mut value: T, mut meta: u8, mut d: u8, mut slot: usize) -> usize {
        let mask = self.mask();
        let mut result_index = None;
        loop {
            unsafe {
                if self.meta(slot) == EMPTY {
                    self.set_slot(slot, value, meta, d);
                    self.items += 1;
                    return result_index.unwrap_or(slot);
                }
                if self.dist_at(slot) < d {
                    if result_index.is_none() {
                        result_index = Some(slot);
                    }
                    self.swap_slot(slot, &mut value, &mut meta, &mut d);
                }
            }
            slot = (slot + 1) & mask;
            d = d
                .checked_add(1)
                .unwrap_or_else(|| panic!("probe distance overflow: degenerate hash distribution"));
        }
    }

    fn insert_unique_inner(&mut self, hash: u64, value: T) -> usize {
        let mask = self.mask();
        let (home, meta) = hash_mapping(hash, mask);
        self.place_unique(value, meta, 0, home)
    }

    /// Inserts `value` known not to collide with any existing element
    /// (the caller has already ruled out a duplicate key). Used by
    /// facades that have already resolved absence via a prior lookup.
    pub fn insert_unique(&mut self, hash: u64, value: T, hasher: impl Fn(&T) -> u64) -> usize {
        self.reserve_one(&hasher);
        self.insert_unique_inner(hash, value)
    }

    fn insert_inner(
        &mut self,
        hash: u64,
        mut value: T,
        mut eq: impl FnMut(&T) -> bool,
        replace: bool,
    ) -> InsertResult {
        let mask = self.mask();
        let (home, meta0) = hash_mapping(hash, mask);
        let mut slot = home;
        let mut cur_meta = meta0;
        let mut d: u8 = 0;
        let mut searching = true;
        let mut result_index = None;
        loop {
            unsafe {
                let slot_meta = self.meta(slot);
                if slot_meta == EMPTY {
                    self.set_slot(slot, value, cur_meta, d);
                    self.items += 1;
                    return InsertResult::Inserted(result_index.unwrap_or(slot));
                }
                if searching && slot_meta == cur_meta && eq(self.value(slot)) {
                    return if replace {
                        *self.values.as_ptr().add(slot) = value;
                        InsertResult::Replaced(slot)
                    } else {
                        InsertResult::NotInserted(slot)
                    };
                }
                if self.dist_at(slot) < d {
                    if searching {
                        result_index = Some(slot);
                        searching = false;
                    }
                    self.swap_slot(slot, &mut value, &mut cur_meta, &mut d);
                }
            }
            slot = (slot + 1) & mask;
            d = d
                .checked_add(1)
                .unwrap_or_else(|| panic!("probe distance overflow: degenerate hash distribution"));
        }
    }

    /// Inserts `value`. If an equal element exists, it is replaced when
    /// `replace` is true (returning [`InsertResult::Replaced`], treated
    /// as a successful write by every caller in this crate) or left in
    /// place when false (returning [`InsertResult::NotInserted`] and
    /// dropping `value`).
    pub fn insert(
        &mut self,
        hash: u64,
        value: T,
        eq: impl FnMut(&T) -> bool,
        hasher: impl Fn(&T) -> u64,
        replace: bool,
    ) -> InsertResult {
        self.reserve_one(&hasher);
        self.insert_inner(hash, value, eq, replace)
    }

    pub fn insert_if_absent(
        &mut self,
        hash: u64,
        value: T,
        eq: impl FnMut(&T) -> bool,
        hasher: impl Fn(&T) -> u64,
    ) -> usize {
        match self.insert(hash, value, eq, hasher, false) {
            InsertResult::Inserted(i) | InsertResult::Replaced(i) | InsertResult::NotInserted(i) => i,
        }
    }

    /// Invokes `builder` at most once: never if an equal element already
    /// exists, otherwise exactly once to produce the element that gets
    /// installed (possibly after a Robin Hood swap carries a richer
    /// incumbent further down the probe sequence).
    pub fn compute_if_absent(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(&T) -> bool,
        hasher: impl Fn(&T) -> u64,
        builder: impl FnOnce() -> T,
    ) -> usize {
        self.reserve_one(&hasher);
        let mask = self.mask();
        let (home, meta0) = hash_mapping(hash, mask);
        let mut slot = home;
        let mut d: u8 = 0;
        loop {
            unsafe {
                let slot_meta = self.meta(slot);
                if slot_meta == EMPTY {
                    let value = builder();
                    self.set_slot(slot, value, meta0, d);
                    self.items += 1;
                    return slot;
                }
                if slot_meta == meta0 && eq(self.value(slot)) {
                    return slot;
                }
                if self.dist_at(slot) < d {
                    let value = builder();
                    return self.place_unique(value, meta0, d, slot);
                }
            }
            slot = (slot + 1) & mask;
            d = d
                .checked_add(1)
                .unwrap_or_else(|| panic!("probe distance overflow: degenerate hash distribution"));
        }
    }

    /// If absent, installs `seed`. If present, replaces the current
    /// element with `merge(current, seed)`. `seed` is consumed exactly
    /// once regardless of which branch is taken.
    ///
    /// While `merge` runs, the slot being merged is marked empty (its
    /// element has already been read out by value); if `merge` panics,
    /// the slot stays empty rather than risk a double-drop of a
    /// partially-consumed element. The element is lost, but the table
    /// remains internally consistent.
    pub fn compute_merge(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(&T) -> bool,
        hasher: impl Fn(&T) -> u64,
        seed: T,
        merge: impl FnOnce(T, T) -> T,
    ) -> usize {
        self.reserve_one(&hasher);
        let mask = self.mask();
        let (home, meta0) = hash_mapping(hash, mask);
        let mut slot = home;
        let mut d: u8 = 0;
        let mut seed = Some(seed);
        loop {
            unsafe {
                let slot_meta = self.meta(slot);
                if slot_meta == EMPTY {
                    let value = seed.take().expect("seed consumed more than once");
                    self.set_slot(slot, value, meta0, d);
                    self.items += 1;
                    return slot;
                }
                if slot_meta == meta0 && eq(self.value(slot)) {
                    let current = self.take_slot(slot);
                    self.set_meta(slot, EMPTY);
                    self.set_dist(slot, 0);
                    self.items -= 1;
                    let merged = merge(current, seed.take().expect("seed consumed more than once"));
                    self.values.as_ptr().add(slot).write(merged);
                    self.set_meta(slot, meta0);
                    self.set_dist(slot, d);
                    self.items += 1;
                    return slot;
                }
                if self.dist_at(slot) < d {
                    let value = seed.take().expect("seed consumed more than once");
                    return self.place_unique(value, meta0, d, slot);
                }
            }
            slot = (slot + 1) & mask;
            d = d
                .checked_add(1)
                .unwrap_or_else(|| panic!("probe distance overflow: degenerate hash distribution"));
        }
    }
}

impl<T, A: Allocator> Drop for RawTable<T, A> {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }
        unsafe {
            for i in 0..self.capacity {
                if self.meta(i) != EMPTY {
                    self.values.as_ptr().add(i).drop_in_place();
                }
            }
            let layouts = layouts_for::<T>(self.capacity);
            self.alloc.deallocate(self.values.cast(), layouts.values);
            self.alloc.deallocate(self.hashmeta, layouts.hashmeta);
            self.alloc.deallocate(self.dist, layouts.dist);
        }
    }
}

/// A forward-only cursor over a table's elements. Invalidated by any
/// mutation of the table it borrows from.
pub struct RawIter<'a, T> {
    values: NonNull<T>,
    hashmeta: NonNull<u8>,
    capacity: usize,
    slot: usize,
    remaining: usize,
    marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for RawIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        while self.slot < self.capacity {
            let idx = self.slot;
            self.slot += 1;
            unsafe {
                if *self.hashmeta.as_ptr().add(idx) != EMPTY {
                    self.remaining -= 1;
                    return Some(&*self.values.as_ptr().add(idx));
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> std::iter::FusedIterator for RawIter<'a, T> {}
