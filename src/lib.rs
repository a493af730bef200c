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

//! An open-addressed hash table engine using Robin Hood probing and
//! tombstone-free back-shift deletion, with a SIMD-accelerated group scan
//! for the read path.
//!
//! ## Acknowledgements
//!
//! The group scanner, allocator seam and panic-safety scope guard are
//! derived from the hand-rolled SwissTable implementation that this crate's
//! lineage traces back to, released under the AGPL-3.0 License.

#![allow(dead_code)]

pub mod error;
pub mod hash;
pub mod map;
pub mod raw;
pub mod set;

pub use error::TryReserveError;
pub use hash::FxBuildHasher;
pub use map::RobinMap;
pub use raw::table::{InsertResult, RawTable};
pub use set::RobinSet;
