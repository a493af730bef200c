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

//! The default hasher and the Fibonacci hash-to-slot mapping.

use std::hash::{BuildHasher, Hasher};

const ROTATE: u32 = 5;
const PRIME64: u64 = 0x517CC1B727220A95; // archimedes (obtained from rustc)

/// A fast, non-cryptographic hasher for scalar and string keys. Not suited
/// for untrusted input: it is not resistant to hash-flooding.
#[derive(Debug, Clone, Copy, Default)]
pub struct FxHasher(u64);

impl FxHasher {
    #[inline]
    fn write_word(&mut self, word: u64) {
        self.0 = (self.0.rotate_left(ROTATE) ^ word).wrapping_mul(PRIME64);
    }
}

impl Hasher for FxHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, mut bytes: &[u8]) {
        while bytes.len() >= 8 {
            self.write_word(u64::from_ne_bytes(bytes[..8].try_into().unwrap()));
            bytes = &bytes[8..];
        }
        if bytes.len() >= 4 {
            self.write_word(u32::from_ne_bytes(bytes[..4].try_into().unwrap()) as u64);
            bytes = &bytes[4..];
        }
        if bytes.len() >= 2 {
            self.write_word(u16::from_ne_bytes(bytes[..2].try_into().unwrap()) as u64);
            bytes = &bytes[2..];
        }
        if let Some(&b) = bytes.first() {
            self.write_word(b as u64);
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.write_word(i as u64);
    }
    fn write_u16(&mut self, i: u16) {
        self.write_word(i as u64);
    }
    fn write_u32(&mut self, i: u32) {
        self.write_word(i as u64);
    }
    fn write_u64(&mut self, i: u64) {
        self.write_word(i);
    }
    fn write_u128(&mut self, i: u128) {
        let [a, b]: [u64; 2] = unsafe { core::mem::transmute(i) };
        self.write_word(a);
        self.write_word(b);
    }
    fn write_usize(&mut self, i: usize) {
        self.write_word(i as u64);
    }
}

/// Builds [`FxHasher`]s. This is the default hasher for [`RobinMap`] and
/// [`RobinSet`] when no other `BuildHasher` is supplied.
///
/// [`RobinMap`]: crate::map::RobinMap
/// [`RobinSet`]: crate::set::RobinSet
#[derive(Debug, Clone, Copy, Default)]
pub struct FxBuildHasher;

impl BuildHasher for FxBuildHasher {
    type Hasher = FxHasher;
    fn build_hasher(&self) -> FxHasher {
        FxHasher::default()
    }
}

/// The 64-bit Fibonacci hashing multiplier, `floor(2^64 / phi)`.
const FIB64: u64 = 0x9E3779B97F4A7C15;

/// Maps a user hash to a (slot, metadata byte) pair for a table of capacity
/// `mask + 1` (`mask` must be `capacity - 1`, with capacity a power of two).
///
/// The metadata byte is the top 7 bits of the Fibonacci-mixed hash with the
/// high bit forced set, so it never collides with the `EMPTY` sentinel (0).
#[inline]
pub(crate) fn hash_mapping(hash: u64, mask: usize) -> (usize, u8) {
    let mixed = hash.wrapping_mul(FIB64);
    let slot = (mixed as usize) & mask;
    let meta = ((mixed >> 57) as u8) | 0b1000_0000;
    (slot, meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_always_has_high_bit_set() {
        for h in [0u64, 1, 42, u64::MAX, 0xdead_beef_cafe_babe] {
            let (_, meta) = hash_mapping(h, 15);
            assert_ne!(meta, 0);
            assert_eq!(meta & 0x80, 0x80);
        }
    }

    #[test]
    fn slot_is_within_mask() {
        for h in 0u64..1000 {
            let (slot, _) = hash_mapping(h, 63);
            assert!(slot <= 63);
        }
    }

    #[test]
    fn identical_hashes_map_identically() {
        let a = hash_mapping(123456789, 255);
        let b = hash_mapping(123456789, 255);
        assert_eq!(a, b);
    }
}
