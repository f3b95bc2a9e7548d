use core::{alloc::Layout, ptr::NonNull};

use crate::{containers::Owned, error::AllocError};

/// A source of raw memory.
///
/// Containers in this crate never touch the global allocator directly. They are bound to an
/// `Allocator` at construction and return every block to it.
///
/// Zero-sized requests are a contract violation and implementations may panic on them.
pub trait Allocator {
    /// Allocates an uninitialized block that meets the size and alignment of `layout`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no memory meeting the requirements is available.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Resizes a block to `new_size` bytes, keeping its alignment.
    ///
    /// The first `min(old_layout.size(), new_size)` bytes are preserved. On failure the old block
    /// is left allocated and unaltered.
    ///
    /// # Safety
    ///
    /// - `ptr` must have been returned by this allocator with `old_layout` and not yet freed.
    /// - `new_size`, rounded up to `old_layout.align()`, must not exceed `isize::MAX`.
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError>;

    /// Frees a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator with `layout` and not yet freed.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        (**self).reallocate(ptr, old_layout, new_size)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }
}

/// Emulates `Clone` for values whose memory lives in a non-global allocator.
pub trait AllocClone: AllocDrop + Sized {
    /// Makes an independent copy, drawing its memory from `alloc`.
    ///
    /// The copy comes back bound to `alloc`, so its memory is returned there when it is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `alloc` cannot provide the memory. Nothing is held on failure.
    fn try_clone_in<'alloc, A: Allocator>(
        &self,
        alloc: &'alloc A,
    ) -> Result<Owned<'alloc, Self, A>, AllocError>;
}

/// Emulates `Drop` for values whose memory lives in a non-global allocator.
pub trait AllocDrop {
    /// Returns all memory held by `self` to `alloc`, leaving `self` empty but usable.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator every block held by `self` was drawn from.
    unsafe fn drop_in<A: Allocator>(&mut self, alloc: &A);
}
