use core::{
    alloc::Layout,
    fmt, mem,
    ops::{Bound, Deref, RangeBounds},
    ptr::{self, NonNull},
    slice,
};

use log::{debug, trace, warn};
use num_traits::ToPrimitive;

use crate::{
    config::VecConfig,
    error::{AllocError, VecError},
    traits::{AllocClone, AllocDrop, Allocator},
};

/// Returns the layout of a buffer with room for `slots` values.
fn buffer_layout(slots: u64) -> Result<Layout, AllocError> {
    let slots = slots.to_usize().ok_or(AllocError::CapacityOverflow)?;
    Layout::array::<u64>(slots).map_err(|_| AllocError::CapacityOverflow)
}

/// A contiguous growable array of `u64`, short for 'vector'.
///
/// Capacity is managed by hand: the vector starts with an explicit number of slots and, whenever
/// it is full, grows by a fixed `alloc_step` slots. It never shrinks on its own.
///
/// A `Vector` does not know which allocator its buffer came from, so it is only ever handed out
/// wrapped in an [`Owned`], which pairs it with that allocator.
pub struct Vector {
    buf: Option<NonNull<u64>>,
    // total slots in `buf`
    size: u64,
    // trailing unused slots, len == size - free_cells
    free_cells: u64,
    alloc_step: u32,
}

// SAFETY: a `Vector` exclusively owns its buffer and the buffer only holds plain integers.
unsafe impl Send for Vector {}
unsafe impl Sync for Vector {}

/// A value paired with the allocator its memory was drawn from.
///
/// Dropping an `Owned` returns the memory to that allocator.
pub struct Owned<'alloc, T: AllocDrop, A: Allocator> {
    alloc: &'alloc A,
    inner: T,
}

impl Vector {
    const fn empty(alloc_step: u32) -> Self {
        Self {
            buf: None,
            size: 0,
            free_cells: 0,
            alloc_step,
        }
    }

    /// Constructs a new, empty `Vector` with no capacity.
    ///
    /// Nothing is allocated until the first append.
    pub fn new_in<A: Allocator>(alloc_step: u32, alloc: &A) -> Owned<'_, Vector, A> {
        trace!("vector created: 0 slots, step {alloc_step}");
        Owned {
            alloc,
            inner: Vector::empty(alloc_step),
        }
    }

    /// Constructs a new, empty `Vector` with room for `initial_size` values.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the buffer cannot be allocated. Nothing is held on failure.
    pub fn with_capacity_in<A: Allocator>(
        initial_size: u64,
        alloc_step: u32,
        alloc: &A,
    ) -> Result<Owned<'_, Vector, A>, AllocError> {
        let mut inner = Vector::empty(alloc_step);
        inner.resize_buffer(initial_size, alloc)?;
        inner.free_cells = initial_size;
        trace!("vector created: {initial_size} slots, step {alloc_step}");
        Ok(Owned { alloc, inner })
    }

    /// Constructs a new, empty `Vector` sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the buffer cannot be allocated.
    pub fn with_config_in<'alloc, A: Allocator>(
        config: &VecConfig,
        alloc: &'alloc A,
    ) -> Result<Owned<'alloc, Vector, A>, AllocError> {
        Self::with_capacity_in(config.initial_capacity, config.alloc_step, alloc)
    }

    /// Returns the number of live values.
    #[inline]
    pub fn len(&self) -> u64 {
        self.size - self.free_cells
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total number of slots, live or not.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.size
    }

    /// Returns the number of trailing slots that can be filled without growing.
    #[inline]
    pub fn free_cells(&self) -> u64 {
        self.free_cells
    }

    /// Returns the number of slots added each time the vector grows.
    #[inline]
    pub fn alloc_step(&self) -> u32 {
        self.alloc_step
    }

    /// Returns the live length as an index.
    #[inline]
    fn live(&self) -> usize {
        self.len() as usize
    }

    /// Returns the layout `buf` was allocated with.
    ///
    /// # Safety
    ///
    /// `buf` must be allocated, i.e. `buffer_layout(self.size)` has already succeeded once.
    #[inline]
    unsafe fn current_layout(&self) -> Layout {
        Layout::from_size_align_unchecked(
            self.size as usize * mem::size_of::<u64>(),
            mem::align_of::<u64>(),
        )
    }

    pub fn as_slice(&self) -> &[u64] {
        match self.buf {
            // SAFETY: the first `len` slots are initialized
            Some(buf) => unsafe { slice::from_raw_parts(buf.as_ptr(), self.live()) },
            None => &[],
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u64] {
        match self.buf {
            // SAFETY: the first `len` slots are initialized and `self` is borrowed mutably
            Some(buf) => unsafe { slice::from_raw_parts_mut(buf.as_ptr(), self.live()) },
            None => &mut [],
        }
    }

    pub fn iter(&self) -> slice::Iter<'_, u64> {
        self.as_slice().iter()
    }

    /// Returns the value at `position`, or `None` if it is out of bounds.
    pub fn at(&self, position: u64) -> Option<u64> {
        self.as_slice().get(position.to_usize()?).copied()
    }

    /// Returns `true` if any live value equals `value`.
    pub fn contains(&self, value: u64) -> bool {
        self.as_slice().contains(&value)
    }

    /// Returns the index of the first live value equal to `value`, starting the search at `from`.
    pub fn index_of(&self, value: u64, from: u64) -> Option<u64> {
        let from = from.to_usize()?;
        self.as_slice()
            .get(from..)?
            .iter()
            .position(|&x| x == value)
            .map(|i| (from + i) as u64)
    }

    /// Reallocates `buf` to exactly `new_size` slots. `free_cells` is left for the caller to fix.
    ///
    /// On failure nothing changes.
    fn resize_buffer<A: Allocator>(&mut self, new_size: u64, alloc: &A) -> Result<(), AllocError> {
        let new_buf = match self.buf {
            None if new_size == 0 => None,
            None => Some(alloc.allocate(buffer_layout(new_size)?)?),
            Some(buf) => {
                // SAFETY: `buf` is allocated
                let old_layout = unsafe { self.current_layout() };
                if new_size == 0 {
                    // SAFETY: `buf` came from `alloc` with `old_layout`
                    unsafe { alloc.deallocate(buf.cast(), old_layout) };
                    None
                } else {
                    let new_layout = buffer_layout(new_size)?;
                    // SAFETY: `buf` came from `alloc` with `old_layout`, `new_layout` is valid
                    Some(unsafe { alloc.reallocate(buf.cast(), old_layout, new_layout.size())? })
                }
            }
        };

        self.buf = new_buf.map(NonNull::cast);
        self.size = new_size;
        Ok(())
    }

    /// Grows in whole `alloc_step` increments until at least `needed` slots are free.
    fn grow_for<A: Allocator>(&mut self, needed: u64, alloc: &A) -> Result<(), VecError> {
        if self.free_cells >= needed {
            return Ok(());
        }
        if self.alloc_step == 0 {
            warn!("vector is full at {} slots and cannot grow (step 0)", self.size);
            return Err(VecError::ZeroAllocStep);
        }

        let step = u64::from(self.alloc_step);
        let steps = (needed - self.free_cells).div_ceil(step);
        let additional = steps
            .checked_mul(step)
            .ok_or(AllocError::CapacityOverflow)?;
        let new_size = self
            .size
            .checked_add(additional)
            .ok_or(AllocError::CapacityOverflow)?;

        let old_size = self.size;
        if let Err(err) = self.resize_buffer(new_size, alloc) {
            warn!("vector growth failed: {old_size} -> {new_size} slots: {err}");
            return Err(err.into());
        }
        self.free_cells += additional;
        debug!("vector grew: {old_size} -> {new_size} slots");
        Ok(())
    }
}

impl AllocClone for Vector {
    fn try_clone_in<'alloc, A: Allocator>(
        &self,
        alloc: &'alloc A,
    ) -> Result<Owned<'alloc, Self, A>, AllocError> {
        let mut copy = Owned {
            alloc,
            inner: Vector::empty(self.alloc_step),
        };
        copy.inner.resize_buffer(self.size, alloc)?;
        if let (Some(src), Some(dst)) = (self.buf, copy.inner.buf) {
            // SAFETY: both buffers hold `size` slots, the first `len` of `src` are initialized
            unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), self.live()) };
        }
        copy.inner.free_cells = self.free_cells;
        Ok(copy)
    }
}

impl AllocDrop for Vector {
    unsafe fn drop_in<A: Allocator>(&mut self, alloc: &A) {
        if let Some(buf) = self.buf.take() {
            // SAFETY: the caller guarantees `buf` came from `alloc`, with this layout
            alloc.deallocate(buf.cast(), self.current_layout());
        }
        self.size = 0;
        self.free_cells = 0;
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("len", &self.len())
            .field("capacity", &self.size)
            .field("alloc_step", &self.alloc_step)
            .finish()
    }
}

impl<'alloc, A: Allocator> Owned<'alloc, Vector, A> {
    /// Returns the allocator backing this vector.
    #[inline]
    pub fn allocator(&self) -> &'alloc A {
        self.alloc
    }

    /// Makes an independent copy with the same capacity, step, and contents.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the copy's buffer cannot be allocated.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        self.inner.try_clone_in(self.alloc)
    }

    /// Releases the buffer. The vector stays usable, with no capacity and the same step.
    pub fn clear(&mut self) {
        debug!("vector cleared: {} slots released", self.inner.size);
        // SAFETY: `inner` only ever holds memory drawn from `alloc`
        unsafe { self.inner.drop_in(self.alloc) };
    }

    /// Releases all memory held by the vector.
    pub fn destroy(self) {
        trace!("vector destroyed: {} slots released", self.inner.size);
        drop(self);
    }

    pub fn as_mut_slice(&mut self) -> &mut [u64] {
        self.inner.as_mut_slice()
    }

    /// Appends `value` to the back, growing by `alloc_step` slots first if the vector is full.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the vector had to grow and could not. The vector is left unchanged.
    pub fn append(&mut self, value: u64) -> Result<(), VecError> {
        self.inner.grow_for(1, self.alloc)?;

        let buf = match self.inner.buf {
            Some(buf) => buf,
            None => unreachable!("a vector with free cells has a buffer"),
        };
        // SAFETY: there is at least one free slot at index `len`
        unsafe { buf.as_ptr().add(self.inner.live()).write(value) };
        self.inner.free_cells -= 1;
        Ok(())
    }

    /// Appends every value in `values`, growing in whole `alloc_step` increments as needed.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the vector had to grow and could not. No value is appended in that case.
    pub fn extend_from_slice(&mut self, values: &[u64]) -> Result<(), VecError> {
        if values.is_empty() {
            return Ok(());
        }
        self.inner.grow_for(values.len() as u64, self.alloc)?;

        let buf = match self.inner.buf {
            Some(buf) => buf,
            None => unreachable!("a vector with free cells has a buffer"),
        };
        // SAFETY: there are at least `values.len()` free slots from index `len`
        unsafe {
            ptr::copy_nonoverlapping(
                values.as_ptr(),
                buf.as_ptr().add(self.inner.live()),
                values.len(),
            )
        };
        self.inner.free_cells -= values.len() as u64;
        Ok(())
    }

    /// Removes and returns the last value. Capacity is kept.
    pub fn pop(&mut self) -> Option<u64> {
        let last = self.inner.len().checked_sub(1)?;
        let value = self.inner.at(last)?;
        self.inner.free_cells += 1;
        Some(value)
    }

    /// Removes and returns the value at `position`, shifting everything after it one slot left.
    ///
    /// Capacity is kept: the freed slot joins the free cells at the tail.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `position` is not a live index.
    pub fn remove(&mut self, position: u64) -> Result<u64, VecError> {
        let len = self.inner.len();
        let index = match position.to_usize() {
            Some(index) if position < len => index,
            _ => return Err(VecError::OutOfBounds { position, len }),
        };

        let slots = self.inner.as_mut_slice();
        let value = slots[index];
        slots.copy_within(index + 1.., index);
        self.inner.free_cells += 1;
        Ok(value)
    }

    /// Overwrites the live values in `[start, end]` with `value`.
    ///
    /// `end` is clamped to the last live index, so any `end >= len` fills through the end of the
    /// vector. Nothing happens if `start > len` or `start > end`.
    pub fn fill(&mut self, value: u64, start: u64, end: u64) {
        self.fill_range(value, start..=end);
    }

    /// Overwrites the live values in `range` with `value`, clamping the range to the live length.
    pub fn fill_range<R: RangeBounds<u64>>(&mut self, value: u64, range: R) {
        let len = self.inner.len();
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => match start.checked_add(1) {
                Some(start) => start,
                None => return,
            },
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end.saturating_add(1),
            Bound::Excluded(&end) => end,
            Bound::Unbounded => len,
        }
        .min(len);

        if start < end {
            self.inner.as_mut_slice()[start as usize..end as usize].fill(value);
        }
    }

    /// Ensures at least `additional` free cells with a single reallocation to the exact size.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the buffer cannot be grown. The vector is left unchanged.
    pub fn reserve_exact(&mut self, additional: u64) -> Result<(), VecError> {
        if self.inner.free_cells >= additional {
            return Ok(());
        }

        let len = self.inner.len();
        let new_size = len
            .checked_add(additional)
            .ok_or(AllocError::CapacityOverflow)?;
        let old_size = self.inner.size;
        self.inner.resize_buffer(new_size, self.alloc)?;
        self.inner.free_cells = new_size - len;
        debug!("vector reserved: {old_size} -> {new_size} slots");
        Ok(())
    }

    /// Releases all free cells, so that capacity equals length.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the allocator cannot resize the buffer. The vector is left unchanged.
    pub fn shrink_to_fit(&mut self) -> Result<(), AllocError> {
        if self.inner.free_cells == 0 {
            return Ok(());
        }

        let len = self.inner.len();
        let old_size = self.inner.size;
        self.inner.resize_buffer(len, self.alloc)?;
        self.inner.free_cells = 0;
        debug!("vector shrunk: {old_size} -> {len} slots");
        Ok(())
    }
}

impl<T: AllocDrop, A: Allocator> Deref for Owned<'_, T, A> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: AllocDrop, A: Allocator> Drop for Owned<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: `inner` only ever holds memory drawn from `alloc`
        unsafe { self.inner.drop_in(self.alloc) };
    }
}

impl<A: Allocator> fmt::Debug for Owned<'_, Vector, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.iter()).finish()
    }
}

impl<A: Allocator, B: Allocator> PartialEq<Owned<'_, Vector, B>> for Owned<'_, Vector, A> {
    fn eq(&self, other: &Owned<'_, Vector, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<A: Allocator> Eq for Owned<'_, Vector, A> {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{budget::Budget, heap::Heap};

    fn filled<'a, A: Allocator>(values: &[u64], alloc: &'a A) -> Owned<'a, Vector, A> {
        let mut v = Vector::with_capacity_in(4, 2, alloc).unwrap();
        for &x in values {
            v.append(x).unwrap();
        }
        v
    }

    #[test]
    fn create_is_empty() {
        let v = Vector::with_capacity_in(4, 2, &Heap).unwrap();
        assert_eq!(v.len(), 0);
        assert_eq!(v.capacity(), 4);
        assert_eq!(v.free_cells(), 4);
        assert_eq!(v.alloc_step(), 2);
        assert!(v.is_empty());
        assert_eq!(v.at(0), None);
    }

    #[test]
    fn zero_capacity_grows_on_first_append() {
        let mut v = Vector::with_capacity_in(0, 3, &Heap).unwrap();
        assert_eq!(v.capacity(), 0);
        v.append(9).unwrap();
        assert_eq!(v.capacity(), 3);
        assert_eq!(v.len(), 1);
        assert_eq!(v.at(0), Some(9));

        let mut v = Vector::new_in(1, &Heap);
        v.append(1).unwrap();
        v.append(2).unwrap();
        assert_eq!(v.capacity(), 2);
    }

    #[test]
    fn with_config() {
        let v = Vector::with_config_in(&VecConfig::default(), &Heap).unwrap();
        assert_eq!(v.capacity(), 8);
        assert_eq!(v.alloc_step(), 8);
    }

    #[test]
    fn grows_by_step() {
        let mut v = filled(&[10, 20, 30, 40, 50], &Heap);
        assert_eq!(v.len(), 5);
        assert_eq!(v.capacity(), 6);
        assert_eq!(v.free_cells(), 1);
        assert_eq!(v.at(4), Some(50));
        assert_eq!(v.as_slice(), &[10, 20, 30, 40, 50]);

        v.append(60).unwrap();
        assert_eq!(v.capacity(), 6);
        v.append(70).unwrap();
        assert_eq!(v.capacity(), 8);
    }

    #[test]
    fn failed_growth_leaves_vector_unchanged() {
        // exactly room for the initial 4 slots
        let budget = Budget::new(32);
        let mut v = filled(&[1, 2, 3, 4], &budget);
        assert_eq!(
            v.append(5),
            Err(VecError::Alloc(AllocError::RequestTooLarge))
        );
        assert_eq!(v.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(v.capacity(), 4);
        assert_eq!(v.free_cells(), 0);

        let roomy = Budget::new(48);
        let mut v = filled(&[1, 2, 3, 4], &roomy);
        let _hog = Vector::with_capacity_in(1, 0, &roomy).unwrap();
        assert_eq!(v.append(5), Err(VecError::Alloc(AllocError::OutOfMemory)));
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn zero_step_never_grows() {
        let mut v = Vector::with_capacity_in(2, 0, &Heap).unwrap();
        v.append(1).unwrap();
        v.append(2).unwrap();
        assert_eq!(v.append(3), Err(VecError::ZeroAllocStep));
        assert_eq!(v.as_slice(), &[1, 2]);

        let mut v = Vector::new_in(0, &Heap);
        assert_eq!(v.append(1), Err(VecError::ZeroAllocStep));
    }

    #[test]
    fn remove_shifts_left_and_keeps_capacity() {
        let mut v = filled(&[10, 20, 30, 40, 50], &Heap);
        assert_eq!(v.remove(0), Ok(10));
        assert_eq!(v.as_slice(), &[20, 30, 40, 50]);
        assert_eq!(v.capacity(), 6);
        assert_eq!(v.free_cells(), 2);

        assert_eq!(v.remove(2), Ok(40));
        assert_eq!(v.as_slice(), &[20, 30, 50]);
    }

    #[test]
    fn remove_last_at_full_capacity() {
        let mut v = filled(&[1, 2, 3, 4], &Heap);
        assert_eq!(v.free_cells(), 0);
        assert_eq!(v.remove(3), Ok(4));
        assert_eq!(v.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn remove_out_of_bounds() {
        let mut v = filled(&[1, 2], &Heap);
        assert_eq!(
            v.remove(2),
            Err(VecError::OutOfBounds { position: 2, len: 2 })
        );
        assert_eq!(
            v.remove(u64::MAX),
            Err(VecError::OutOfBounds {
                position: u64::MAX,
                len: 2
            })
        );
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn pop() {
        let mut v = filled(&[1, 2], &Heap);
        assert_eq!(v.pop(), Some(2));
        assert_eq!(v.pop(), Some(1));
        assert_eq!(v.pop(), None);
        assert_eq!(v.capacity(), 4);
    }

    #[test]
    fn try_clone_is_independent() {
        let v = filled(&[1, 2, 3, 4, 5], &Heap);
        let mut copy = v.try_clone().unwrap();
        assert_eq!(copy, v);
        assert_eq!(copy.capacity(), v.capacity());
        assert_eq!(copy.free_cells(), v.free_cells());
        assert_eq!(copy.alloc_step(), v.alloc_step());

        copy.fill(0, 0, 4);
        copy.append(6).unwrap();
        assert_eq!(v.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(copy.as_slice(), &[0, 0, 0, 0, 0, 6]);
    }

    #[test]
    fn try_clone_of_empty() {
        let v = Vector::new_in(4, &Heap);
        let copy = v.try_clone().unwrap();
        assert_eq!(copy.capacity(), 0);
        assert_eq!(copy.alloc_step(), 4);
    }

    #[test]
    fn try_clone_failure() {
        let budget = Budget::new(40);
        let v = filled(&[1, 2, 3], &budget);
        assert_eq!(v.try_clone().err(), Some(AllocError::OutOfMemory));
        assert_eq!(budget.in_use(), 32);
    }

    #[test]
    fn try_clone_in_binds_the_copy_to_its_allocator() {
        let a = Budget::new(1024);
        let b = Budget::new(1024);
        let v = filled(&[1, 2, 3], &a);

        let copy = v.try_clone_in(&b).unwrap();
        assert!(core::ptr::eq(copy.allocator(), &b));
        assert_eq!(copy.as_slice(), &[1, 2, 3]);
        assert_eq!(a.in_use(), 32);
        assert_eq!(b.in_use(), 32);

        drop(copy);
        assert_eq!(b.in_use(), 0);
        assert_eq!(a.in_use(), 32);
        drop(v);
        assert_eq!(a.in_use(), 0);
    }

    #[test]
    fn try_clone_in_failure_holds_nothing() {
        let a = Budget::new(1024);
        let b = Budget::new(16);
        let v = filled(&[1, 2, 3], &a);
        assert_eq!(
            v.try_clone_in(&b).err(),
            Some(AllocError::RequestTooLarge)
        );
        assert_eq!(b.in_use(), 0);
    }

    #[test]
    fn clear_releases_buffer() {
        let budget = Budget::new(1024);
        let mut v = filled(&[1, 2, 3], &budget);
        v.clear();
        assert_eq!(budget.in_use(), 0);
        assert_eq!(v.len(), 0);
        assert_eq!(v.capacity(), 0);
        assert_eq!(v.free_cells(), 0);
        assert_eq!(v.alloc_step(), 2);

        v.append(7).unwrap();
        assert_eq!(v.as_slice(), &[7]);
        assert_eq!(v.capacity(), 2);
    }

    #[test]
    fn destroy_and_drop_release_everything() {
        let budget = Budget::new(1024);
        let v = filled(&[1, 2, 3, 4, 5], &budget);
        let copy = v.try_clone().unwrap();
        assert_eq!(budget.in_use(), 96);
        v.destroy();
        assert_eq!(budget.in_use(), 48);
        drop(copy);
        assert_eq!(budget.in_use(), 0);
    }

    #[test]
    fn search() {
        let v = filled(&[5, 7, 5, 9], &Heap);
        assert!(v.contains(9));
        assert!(!v.contains(1));
        assert_eq!(v.index_of(5, 0), Some(0));
        assert_eq!(v.index_of(5, 1), Some(2));
        assert_eq!(v.index_of(5, 3), None);
        assert_eq!(v.index_of(5, 4), None);
        assert_eq!(v.index_of(5, u64::MAX), None);
    }

    #[test]
    fn search_ignores_free_cells() {
        let mut v = filled(&[1, 2, 3], &Heap);
        v.pop();
        assert!(!v.contains(3));
        assert_eq!(v.index_of(3, 0), None);
    }

    #[test]
    fn fill_inclusive_end() {
        let mut v = filled(&[1, 2, 3, 4], &Heap);
        v.fill(0, 1, 2);
        assert_eq!(v.as_slice(), &[1, 0, 0, 4]);
    }

    #[test]
    fn fill_clamps_end() {
        let mut v = filled(&[1, 2, 3, 4], &Heap);
        v.fill(9, 2, 4);
        assert_eq!(v.as_slice(), &[1, 2, 9, 9]);
        v.fill(8, 0, u64::MAX);
        assert_eq!(v.as_slice(), &[8, 8, 8, 8]);
    }

    #[test]
    fn fill_noops() {
        let mut v = filled(&[1, 2, 3], &Heap);
        v.fill(0, 4, 10);
        v.fill(0, 3, 10);
        v.fill(0, 2, 1);
        assert_eq!(v.as_slice(), &[1, 2, 3]);

        let mut v = Vector::new_in(1, &Heap);
        v.fill(0, 0, 0);
        assert!(v.is_empty());
    }

    #[test]
    fn fill_range_half_open() {
        let mut v = filled(&[1, 2, 3, 4, 5], &Heap);
        v.fill_range(0, 1..3);
        assert_eq!(v.as_slice(), &[1, 0, 0, 4, 5]);
        v.fill_range(7, 3..);
        assert_eq!(v.as_slice(), &[1, 0, 0, 7, 7]);
        v.fill_range(6, ..);
        assert_eq!(v.as_slice(), &[6, 6, 6, 6, 6]);
    }

    #[test]
    fn extend_from_slice_grows_in_steps() {
        let mut v = Vector::with_capacity_in(1, 3, &Heap).unwrap();
        v.extend_from_slice(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(v.as_slice(), &[1, 2, 3, 4, 5]);
        // 1 + 2 * 3
        assert_eq!(v.capacity(), 7);
        v.extend_from_slice(&[]).unwrap();
        assert_eq!(v.len(), 5);
    }

    #[test]
    fn extend_from_slice_is_all_or_nothing() {
        let budget = Budget::new(32);
        let mut v = filled(&[1], &budget);
        assert!(v.extend_from_slice(&[2, 3, 4, 5]).is_err());
        assert_eq!(v.as_slice(), &[1]);
    }

    #[test]
    fn reserve_and_shrink() {
        let budget = Budget::new(1024);
        let mut v = filled(&[1, 2, 3], &budget);
        v.reserve_exact(1).unwrap();
        assert_eq!(v.capacity(), 4);
        v.reserve_exact(10).unwrap();
        assert_eq!(v.capacity(), 13);
        assert_eq!(v.free_cells(), 10);

        v.shrink_to_fit().unwrap();
        assert_eq!(v.capacity(), 3);
        assert_eq!(v.free_cells(), 0);
        assert_eq!(v.as_slice(), &[1, 2, 3]);
        assert_eq!(budget.in_use(), 24);

        v.clear();
        v.shrink_to_fit().unwrap();
        let mut v = Vector::with_capacity_in(4, 1, &budget).unwrap();
        v.shrink_to_fit().unwrap();
        assert_eq!(v.capacity(), 0);
        assert_eq!(budget.in_use(), 0);
    }

    /// Heap allocator whose reallocations can be switched off.
    #[derive(Default)]
    struct Refusing {
        refuse: core::cell::Cell<bool>,
    }

    impl Allocator for Refusing {
        fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
            Heap.allocate(layout)
        }

        unsafe fn reallocate(
            &self,
            ptr: NonNull<u8>,
            old_layout: Layout,
            new_size: usize,
        ) -> Result<NonNull<u8>, AllocError> {
            if self.refuse.get() {
                return Err(AllocError::OutOfMemory);
            }
            Heap.reallocate(ptr, old_layout, new_size)
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            Heap.deallocate(ptr, layout)
        }
    }

    #[test]
    fn failed_reserve_leaves_vector_unchanged() {
        let budget = Budget::new(48);
        let mut v = filled(&[1, 2, 3], &budget);
        assert_eq!(
            v.reserve_exact(4),
            Err(VecError::Alloc(AllocError::RequestTooLarge))
        );
        assert_eq!(v.as_slice(), &[1, 2, 3]);
        assert_eq!(v.capacity(), 4);
        assert_eq!(v.free_cells(), 1);
        assert_eq!(budget.in_use(), 32);

        let _hog = Vector::with_capacity_in(1, 0, &budget).unwrap();
        assert_eq!(
            v.reserve_exact(3),
            Err(VecError::Alloc(AllocError::OutOfMemory))
        );
        assert_eq!(v.as_slice(), &[1, 2, 3]);
        assert_eq!(v.capacity(), 4);
        assert_eq!(v.free_cells(), 1);
    }

    #[test]
    fn failed_shrink_leaves_vector_unchanged() {
        let alloc = Refusing::default();
        let mut v = filled(&[1, 2, 3], &alloc);
        alloc.refuse.set(true);
        assert_eq!(v.shrink_to_fit(), Err(AllocError::OutOfMemory));
        assert_eq!(v.as_slice(), &[1, 2, 3]);
        assert_eq!(v.capacity(), 4);
        assert_eq!(v.free_cells(), 1);

        alloc.refuse.set(false);
        v.shrink_to_fit().unwrap();
        assert_eq!(v.capacity(), 3);
    }

    #[test]
    fn capacity_overflow() {
        assert_eq!(
            Vector::with_capacity_in(u64::MAX, 1, &Heap).err(),
            Some(AllocError::CapacityOverflow)
        );
        let mut v = Vector::new_in(1, &Heap);
        assert_eq!(
            v.reserve_exact(u64::MAX),
            Err(VecError::Alloc(AllocError::CapacityOverflow))
        );
    }

    #[test]
    fn debug_lists_live_values() {
        let v = filled(&[3, 1], &Heap);
        assert_eq!(format!("{v:?}"), "[3, 1]");
        assert_eq!(
            format!("{:?}", &*v),
            "Vector { len: 2, capacity: 4, alloc_step: 2 }"
        );
    }

    #[test]
    fn as_mut_slice() {
        let mut v = filled(&[1, 2, 3], &Heap);
        v.as_mut_slice()[1] = 20;
        assert_eq!(v.iter().copied().collect::<std::vec::Vec<_>>(), [1, 20, 3]);
    }

    proptest! {
        #[test]
        fn append_increments_len(
            initial in 0u64..8,
            step in 1u32..8,
            values in prop::collection::vec(any::<u64>(), 0..64),
        ) {
            let mut v = Vector::with_capacity_in(initial, step, &Heap).unwrap();
            prop_assert_eq!(v.len(), 0);
            for &x in &values {
                let old_len = v.len();
                v.append(x).unwrap();
                prop_assert_eq!(v.len(), old_len + 1);
                prop_assert_eq!(v.at(old_len), Some(x));
                prop_assert!(v.free_cells() <= v.capacity());
            }
            prop_assert_eq!(v.as_slice(), &values[..]);
        }

        #[test]
        fn copy_round_trip(values in prop::collection::vec(any::<u64>(), 0..64)) {
            let v = filled(&values, &Heap);
            let mut copy = v.try_clone().unwrap();
            prop_assert_eq!(copy.len(), v.len());
            for i in 0..v.len() {
                prop_assert_eq!(copy.at(i), v.at(i));
            }
            copy.append(0).unwrap();
            prop_assert_eq!(v.as_slice(), &values[..]);
        }

        #[test]
        fn remove_front_drains(values in prop::collection::vec(any::<u64>(), 0..64)) {
            let budget = Budget::new(1 << 20);
            let mut v = filled(&values, &budget);
            let capacity = v.capacity();
            for &x in &values {
                prop_assert_eq!(v.remove(0), Ok(x));
            }
            prop_assert_eq!(v.len(), 0);
            prop_assert_eq!(v.capacity(), capacity);
            drop(v);
            prop_assert_eq!(budget.in_use(), 0);
        }

        #[test]
        fn contains_agrees_with_index_of(
            values in prop::collection::vec(0u64..16, 0..32),
            x in 0u64..16,
        ) {
            let v = filled(&values, &Heap);
            prop_assert_eq!(v.contains(x), v.index_of(x, 0).is_some());
            prop_assert_eq!(v.index_of(x, 0), values.iter().position(|&y| y == x).map(|i| i as u64));
        }

        #[test]
        fn fill_touches_only_the_range(
            values in prop::collection::vec(any::<u64>(), 1..32),
            a in 0usize..32,
            b in 0usize..32,
            x in any::<u64>(),
        ) {
            let len = values.len();
            let (start, end) = (a.min(b) % len, a.max(b) % len);
            let mut v = filled(&values, &Heap);
            v.fill(x, start as u64, end as u64);
            for (i, &old) in values.iter().enumerate() {
                let expected = if (start..=end).contains(&i) { x } else { old };
                prop_assert_eq!(v.at(i as u64), Some(expected));
            }
        }
    }
}
