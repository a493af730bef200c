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

use core::ops::{Deref, DerefMut};

/// Runs a closure on drop, unless forgotten first. Used to release a
/// partially built replacement allocation if a user hasher or comparator
/// panics mid-rehash.
///
/// - If you want `dropfn` to run, just let this go out of scope.
/// - If you don't, forget it with [`mem::forget`](core::mem::forget).
pub struct ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    dropfn: F,
    value: T,
}

impl<T, F> ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    pub fn new(value: T, dropfn: F) -> Self {
        ScopeGuard { dropfn, value }
    }
}

impl<T, F> Deref for ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T, F> DerefMut for ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T, F> Drop for ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    fn drop(&mut self) {
        (self.dropfn)(&mut self.value)
    }
}
