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

//! Scalar (SWAR) group scanning for hosts without SSE2: older x86 builds
//! built without the `sse2` target feature, and every other architecture.
//! NEON could beat this, but it has more involved multi-cycle latencies
//! that need their own tuning pass; this fallback is the portable baseline.

use super::bitmask::Bitmask;
use super::EMPTY;
use core::mem;
use core::ptr;

cfg_if::cfg_if! {
    if #[cfg(any(
        target_pointer_width = "64",
        target_arch = "x86_64",
        target_arch = "aarch64"
    ))] {
        type GroupWord = u64;
    } else {
        type GroupWord = u32;
    }
}

pub type BitmaskWord = GroupWord;
pub const BITMASK_STRIDE: usize = 8;
#[allow(clippy::unnecessary_cast)]
pub const BITMASK_MASK: BitmaskWord = 0x8080_8080_8080_8080_u64 as BitmaskWord;

fn repeat(byte: u8) -> GroupWord {
    GroupWord::from_ne_bytes([byte; Group::WIDTH])
}

/// A group of metadata bytes scanned with the "does a word contain a byte"
/// SWAR trick instead of real SIMD instructions.
#[derive(Clone, Copy)]
pub struct Group(GroupWord);

impl Group {
    pub const WIDTH: usize = mem::size_of::<Self>();

    pub unsafe fn load_unaligned(ptr: *const u8) -> Self {
        Group(ptr::read_unaligned(ptr.cast()))
    }

    pub unsafe fn load_aligned(ptr: *const u8) -> Self {
        Group(ptr::read(ptr.cast()))
    }

    /// Bitmask of lanes that _may_ equal `byte`; see
    /// <https://graphics.stanford.edu/~seander/bithacks.html#ValueInWord>.
    /// False positives are resolved by the caller's equality check on the
    /// stored element.
    pub fn match_byte(self, byte: u8) -> Bitmask {
        let cmp = self.0 ^ repeat(byte);
        Bitmask((cmp.wrapping_sub(repeat(0x01)) & !cmp & repeat(0x80)).to_le())
    }

    /// Bitmask of lanes equal to `EMPTY` (0).
    pub fn match_empty(self) -> Bitmask {
        self.match_byte(EMPTY)
    }

    /// Bitmask of occupied lanes. Every occupied metadata byte has its
    /// high bit forced on, and `EMPTY` is the all-zero byte, so testing
    /// the high bit alone distinguishes the two states.
    pub fn match_full(self) -> Bitmask {
        Bitmask((self.0 & repeat(0x80)).to_le())
    }
}
