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

//! SSE2 vectorized group scanning for hosts that support it.
use super::bitmask::Bitmask;
use super::EMPTY;

#[cfg(target_arch = "x86")]
use core::arch::x86;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64 as x86;
use core::mem;

pub type BitmaskWord = u16;
pub const BITMASK_STRIDE: usize = 1;
pub const BITMASK_MASK: BitmaskWord = 0xffff;

/// A group of metadata bytes that can be scanned in parallel with a single
/// 128-bit SIMD comparison.
#[derive(Clone, Copy)]
pub struct Group(x86::__m128i);

impl Group {
    pub const WIDTH: usize = mem::size_of::<Self>();

    pub unsafe fn load_unaligned(ptr: *const u8) -> Self {
        Group(x86::_mm_loadu_si128(ptr.cast()))
    }

    pub unsafe fn load_aligned(ptr: *const u8) -> Self {
        Group(x86::_mm_load_si128(ptr.cast()))
    }

    /// A bitmask of the lanes equal to `byte`. May false-positive (never
    /// false-negative); callers always re-check equality on the stored
    /// element before trusting a match.
    pub fn match_byte(self, byte: u8) -> Bitmask {
        unsafe {
            let cmp = x86::_mm_cmpeq_epi8(self.0, x86::_mm_set1_epi8(byte as i8));
            Bitmask(x86::_mm_movemask_epi8(cmp) as u16)
        }
    }

    /// A bitmask of the lanes equal to `EMPTY` (0).
    pub fn match_empty(self) -> Bitmask {
        self.match_byte(EMPTY)
    }

    /// A bitmask of the occupied lanes. Every occupied metadata byte has
    /// its high bit forced on and `EMPTY` is the all-zero byte, so the
    /// sign bit extracted by `_mm_movemask_epi8` is exactly this mask.
    pub fn match_full(self) -> Bitmask {
        unsafe { Bitmask(x86::_mm_movemask_epi8(self.0) as u16) }
    }
}
