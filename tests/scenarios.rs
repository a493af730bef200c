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

//! Named scenarios exercising the `RobinMap`/`RobinSet` facades end to end.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use robinmap::{RobinMap, RobinSet};
use std::cell::Cell;
use std::collections::HashSet;

#[cfg(not(miri))]
const MERGE_ROUND_TRIPS: usize = 4096;
#[cfg(miri)]
const MERGE_ROUND_TRIPS: usize = 128;

#[cfg(not(miri))]
const PARITY_ITERATIONS: usize = 1000;
#[cfg(miri)]
const PARITY_ITERATIONS: usize = 100;

#[cfg(not(miri))]
const REHASH_ELEMENT_COUNT: usize = 4096;
#[cfg(miri)]
const REHASH_ELEMENT_COUNT: usize = 200;

fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| (b'a' + rng.gen_range(0..26)) as char)
        .collect()
}

/// Turns on `log::trace!` output (e.g. the rehash trace in `grow_to`) under
/// `cargo test -- --nocapture`; harmless no-op otherwise. Safe to call from
/// every test since repeated init attempts after the first are ignored.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// S1: set semantics over a literal sequence with repeats.
#[test]
fn set_semantics_over_repeated_sequence() {
    init_logging();
    let sequence = [
        1, 3, 5, 7, 9, 8, 6, 3, 4, 2, 3, 5, 6, 7, 8, 9, 2, 3, 4, 1, 2, 3, 5, 6, 4, 3, 5, 8, 7, 9,
        0, 8, 6,
    ];
    let mut set = RobinSet::new();
    for &v in sequence.iter() {
        set.add(v);
    }
    assert_eq!(set.len(), 10);
    for k in 0..=9 {
        assert!(set.contains(&k), "missing {k}");
    }
}

// S2: last-write-wins map semantics.
#[test]
fn map_last_write_wins() {
    init_logging();
    let pairs = [
        (1, 1),
        (2, 3),
        (3, 5),
        (5, 8),
        (8, 13),
        (13, 21),
        (21, 34),
        (21, 33),
    ];
    let mut map = RobinMap::new();
    for (k, v) in pairs {
        map.insert(k, v);
    }
    assert_eq!(map.len(), 7);
    assert_eq!(map.get(&21), Some(&33));
}

// S3: compute_if_absent invokes its builder exactly once per distinct key.
#[test]
fn compute_if_absent_invoked_once_per_absent_key() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(42);
    let mut map = RobinMap::new();
    let mut distinct = HashSet::new();
    let invocations = Cell::new(0usize);
    for _ in 0..2398 {
        let key = rng.gen_range(0..4796);
        distinct.insert(key);
        let was_new = !map.contains_key(&key);
        let value = *map.compute_if_absent(key, || {
            invocations.set(invocations.get() + 1);
            key * key
        });
        assert_eq!(value, key * key);
        let _ = was_new;
    }
    assert_eq!(invocations.get(), distinct.len());
    for &key in &distinct {
        assert_eq!(map.get(&key), Some(&(key * key)));
    }
}

// S4: merge via x*y + 1, applied once or twice per random key.
#[test]
fn merge_combines_repeated_inserts() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(99);
    let mut map = RobinMap::new();
    let mut expected_twice = HashSet::new();
    let mut expected_once = HashSet::new();
    for _ in 0..MERGE_ROUND_TRIPS {
        let k = rng.gen_range(0..(MERGE_ROUND_TRIPS as i64) / 2);
        let twice = rng.gen_bool(0.5);
        map.merge(k, k + 1, |x, y| x * y + 1);
        if twice {
            map.merge(k, k + 1, |x, y| x * y + 1);
            expected_twice.insert(k);
            expected_once.remove(&k);
        } else if !expected_twice.contains(&k) {
            expected_once.insert(k);
        }
    }
    for &k in &expected_twice {
        assert_eq!(map.get(&k), Some(&((k + 1) * (k + 1) + 1)));
    }
    for &k in &expected_once {
        assert_eq!(map.get(&k), Some(&(k + 1)));
    }
}

// S5: add/remove parity against std::collections::HashSet.
#[test]
fn remove_parity_with_reference_set() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(1234);
    let mut set = RobinSet::new();
    let mut reference = HashSet::new();
    let mut universe = Vec::new();
    for _ in 0..PARITY_ITERATIONS {
        let do_add = universe.is_empty() || rng.gen_bool(0.6);
        if do_add {
            let s = random_string(&mut rng, 10);
            let inserted = set.add(s.clone());
            let ref_inserted = reference.insert(s.clone());
            assert_eq!(inserted, ref_inserted);
            universe.push(s);
        } else {
            let idx = rng.gen_range(0..universe.len());
            let s = universe[idx].clone();
            let removed = set.remove(&s);
            let ref_removed = reference.remove(&s);
            assert_eq!(removed, ref_removed);
        }
        assert_eq!(set.len(), reference.len());
        for s in &universe {
            assert_eq!(set.contains(s.as_str()), reference.contains(s));
        }
    }
}

// S6: for_each produces the same multiset as a reference HashSet after a
// forced rehash.
#[test]
fn rehash_preserves_for_each_contents() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(5);
    let mut set = RobinSet::new();
    let mut reference = HashSet::new();
    for _ in 0..REHASH_ELEMENT_COUNT {
        let v = rng.gen_range(0..(REHASH_ELEMENT_COUNT as i64) * 2);
        set.add(v);
        reference.insert(v);
    }
    assert!(set.capacity() > 8, "scenario requires at least one grow");
    let mut seen = HashSet::new();
    set.for_each(|v| {
        seen.insert(*v);
    });
    assert_eq!(seen, reference);
}
