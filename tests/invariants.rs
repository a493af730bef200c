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

//! Black-box invariant and boundary tests driven directly against
//! `RawTable`, since its internal arrays are not part of the public
//! surface: every property below is phrased in terms of `len`/`contains`/
//! `find`/`for_each`/`remove` rather than the raw metadata/distance bytes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use robinmap::raw::table::RawTable;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

#[cfg(not(miri))]
const SPAM_CNT: usize = 8192;
#[cfg(miri)]
const SPAM_CNT: usize = 256;

fn hash_of<T: Hash>(v: &T) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    v.hash(&mut hasher);
    hasher.finish()
}

fn eq_i32(target: i32) -> impl FnMut(&i32) -> bool {
    move |v| *v == target
}

fn hasher_i32(v: &i32) -> u64 {
    hash_of(v)
}

/// Turns on `log::trace!` output (e.g. the rehash trace in `grow_to`) under
/// `cargo test -- --nocapture`; harmless no-op otherwise. Safe to call from
/// every test since repeated init attempts after the first are ignored.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// (I1) len() equals the number of elements actually present.
#[test]
fn len_matches_distinct_successful_inserts() {
    init_logging();
    let mut table = RawTable::<i32>::new();
    let mut rng = StdRng::seed_from_u64(1);
    let mut reference = HashSet::new();
    for _ in 0..SPAM_CNT {
        let v = rng.gen_range(0..SPAM_CNT as i32 / 2);
        let inserted = reference.insert(v);
        let result = table.insert(hash_of(&v), v, eq_i32(v), hasher_i32, false);
        assert_eq!(
            matches!(result, robinmap::InsertResult::Inserted(_)),
            inserted
        );
    }
    assert_eq!(table.len(), reference.len());
}

// (I4) lookup returns HIT iff the element was inserted and not since removed.
#[test]
fn insert_then_lookup_roundtrip() {
    init_logging();
    let mut table = RawTable::<i32>::new();
    for v in 0..SPAM_CNT as i32 {
        table.insert(hash_of(&v), v, eq_i32(v), hasher_i32, false);
    }
    for v in 0..SPAM_CNT as i32 {
        assert!(table.contains(hash_of(&v), eq_i32(v)));
    }
    for v in SPAM_CNT as i32..SPAM_CNT as i32 * 2 {
        assert!(!table.contains(hash_of(&v), eq_i32(v)));
    }
}

// (I3 proxy) heavy insert/remove churn must never corrupt probe distances
// enough to break lookups for elements that are still present.
#[test]
fn lookups_stay_correct_under_churn() {
    init_logging();
    let mut table = RawTable::<i32>::new();
    let mut reference = HashSet::new();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..SPAM_CNT {
        let v = rng.gen_range(0..512);
        if rng.gen_bool(0.5) {
            reference.insert(v);
            table.insert(hash_of(&v), v, eq_i32(v), hasher_i32, false);
        } else {
            reference.remove(&v);
            table.remove(hash_of(&v), eq_i32(v));
        }
        for probe in 0..512 {
            assert_eq!(
                table.contains(hash_of(&probe), eq_i32(probe)),
                reference.contains(&probe)
            );
        }
    }
}

// (R1) insert then remove returns to the pre-insert size and contains-state.
#[test]
fn insert_remove_round_trip() {
    init_logging();
    let mut table = RawTable::<i32>::new();
    for v in 0..64 {
        table.insert(hash_of(&v), v, eq_i32(v), hasher_i32, false);
    }
    let size_before = table.len();
    let x = 1000;
    assert!(!table.contains(hash_of(&x), eq_i32(x)));
    table.insert(hash_of(&x), x, eq_i32(x), hasher_i32, false);
    assert!(table.contains(hash_of(&x), eq_i32(x)));
    let removed = table.remove(hash_of(&x), eq_i32(x));
    assert_eq!(removed, Some(x));
    assert!(!table.contains(hash_of(&x), eq_i32(x)));
    assert_eq!(table.len(), size_before);
}

// (R2) insert(x, true) followed by insert(x, true) == the first insertion.
#[test]
fn repeated_replace_is_idempotent() {
    init_logging();
    let mut table = RawTable::<(i32, i32)>::new();
    let eq = |k: i32| move |pair: &(i32, i32)| pair.0 == k;
    let hasher = |pair: &(i32, i32)| hash_of(&pair.0);
    table.insert(hash_of(&5), (5, 1), eq(5), hasher, true);
    table.insert(hash_of(&5), (5, 1), eq(5), hasher, true);
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.get(hash_of(&5), eq(5)),
        Some(&(5, 1))
    );
}

// (R3) for_each visits every live element exactly once.
#[test]
fn for_each_visits_every_live_element_once() {
    init_logging();
    let mut table = RawTable::<i32>::new();
    let mut expected = HashSet::new();
    for v in 0..SPAM_CNT as i32 {
        table.insert(hash_of(&v), v, eq_i32(v), hasher_i32, false);
        expected.insert(v);
    }
    let mut seen = Vec::new();
    table.for_each(|v| seen.push(*v));
    assert_eq!(seen.len(), expected.len());
    let seen_set: HashSet<i32> = seen.into_iter().collect();
    assert_eq!(seen_set, expected);
}

// (B1) operating on an empty table.
#[test]
fn empty_table_boundary_behavior() {
    init_logging();
    let table = RawTable::<i32>::new();
    assert_eq!(table.capacity(), 0);
    assert!(!table.contains(hash_of(&0), eq_i32(0)));
    let mut visited = 0;
    table.for_each(|_| visited += 1);
    assert_eq!(visited, 0);

    let mut table = table;
    assert!(table.remove(hash_of(&0), eq_i32(0)).is_none());
    table.insert(hash_of(&1), 1, eq_i32(1), hasher_i32, false);
    assert!(table.capacity() > 0);
}

// (B2) filling past the 7/8 load factor triggers exactly one rehash to 2N
// and every element survives it.
#[test]
fn load_factor_transition_grows_and_preserves_elements() {
    init_logging();
    let mut table = RawTable::<i32>::new();
    table.insert(hash_of(&0), 0, eq_i32(0), hasher_i32, false);
    let initial_capacity = table.capacity();
    assert_eq!(initial_capacity, 8);

    // max_load(8) == 7; the 7th insert stays within capacity, the 8th must grow.
    for v in 1..7 {
        table.insert(hash_of(&v), v, eq_i32(v), hasher_i32, false);
    }
    assert_eq!(table.capacity(), initial_capacity);
    table.insert(hash_of(&7), 7, eq_i32(7), hasher_i32, false);
    assert_eq!(table.capacity(), initial_capacity * 2);
    for v in 0..8 {
        assert!(table.contains(hash_of(&v), eq_i32(v)));
    }
}

// (B3) removing the last element returns the table to size 0 cleanly.
#[test]
fn removing_last_element_empties_table_cleanly() {
    init_logging();
    let mut table = RawTable::<i32>::new();
    table.insert(hash_of(&42), 42, eq_i32(42), hasher_i32, false);
    assert_eq!(table.len(), 1);
    assert_eq!(table.remove(hash_of(&42), eq_i32(42)), Some(42));
    assert_eq!(table.len(), 0);
    assert!(!table.contains(hash_of(&42), eq_i32(42)));
    // the table must still accept further inserts after being drained.
    table.insert(hash_of(&1), 1, eq_i32(1), hasher_i32, false);
    assert_eq!(table.len(), 1);
}
