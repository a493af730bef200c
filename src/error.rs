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

use crate::raw::alloc::Layout;
use std::fmt;

pub type ReserveResult<T> = Result<T, TryReserveError>;

/// Failure modes for the fallible capacity-management entry points.
///
/// The infallible entry points (`insert`, `reserve`, ...) never return this:
/// they panic on `CapacityOverflow` and call `std::alloc::handle_alloc_error`
/// on `AllocatorError`, exactly like the standard library's own collections.
#[derive(Debug)]
pub enum TryReserveError {
    /// The computed capacity, or a probe distance, would overflow. This
    /// happens only with a pathologically bad hash distribution or with
    /// more elements than a `u8` probe distance can express (256 or more
    /// displaced slots in a single cluster).
    CapacityOverflow,
    /// The allocator could not satisfy a request for the given layout.
    /// The table's prior state is left untouched.
    AllocatorError { layout: Layout },
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow => write!(f, "capacity computation overflowed"),
            Self::AllocatorError { layout } => write!(
                f,
                "the allocator failed to allocate {} bytes with alignment {}",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl std::error::Error for TryReserveError {}

/// Marks whether a capacity-affecting operation is allowed to report
/// failure or must panic/abort instead. Mirrors the `Result`-returning
/// and panicking pairs that the standard library's own collections expose
/// (`try_reserve` vs. `reserve`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fallibility {
    Fallible,
    Infallible,
}

impl Fallibility {
    #[inline]
    pub(crate) fn capacity_overflow(self) -> TryReserveError {
        match self {
            Self::Fallible => TryReserveError::CapacityOverflow,
            Self::Infallible => panic!("capacity overflow"),
        }
    }

    #[inline]
    pub(crate) fn alloc_err(self, layout: Layout) -> TryReserveError {
        match self {
            Self::Fallible => TryReserveError::AllocatorError { layout },
            Self::Infallible => std::alloc::handle_alloc_error(layout),
        }
    }
}
