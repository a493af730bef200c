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

/*
 Below this point everything works through raw pointers. A slot index is
 only ever as good as the table generation it was read under: any mutating
 call invalidates indices and references handed out by a previous call.
*/

pub mod alloc;
pub mod bitmask;
pub mod scopeguard;
pub mod table;
mod util;

/// The metadata sentinel for an unoccupied slot. No occupied slot's
/// metadata byte is ever `0`, since [`crate::hash::hash_mapping`] forces
/// the high bit of every computed metadata byte on.
pub(crate) const EMPTY: u8 = 0;

cfg_if::cfg_if! {
    if #[cfg(all(
        target_feature = "sse2",
        any(target_arch = "x86", target_arch = "x86_64"),
        not(miri)
    ))] {
        mod sse2;
        use sse2 as imp;
    } else {
        mod generic;
        use generic as imp;
    }
}

pub(crate) use imp::Group;
pub(crate) use util::{likely, next_capacity, unlikely};
