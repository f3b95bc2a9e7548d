use core::{alloc::Layout, cell::Cell, ptr::NonNull};

use bytesize::ByteSize;
use log::error;

use crate::{error::AllocError, heap::Heap, traits::Allocator};

/// An allocator that caps the number of bytes live at any one time.
///
/// Requests are forwarded to the wrapped allocator as long as they fit in the remaining budget.
/// A request larger than the whole budget fails with [`AllocError::RequestTooLarge`], one that
/// merely exceeds what is left fails with [`AllocError::OutOfMemory`].
///
/// The running total lives in a `Cell`, so a `Budget` cannot be shared between threads.
#[derive(Debug)]
pub struct Budget<A: Allocator = Heap> {
    inner: A,
    limit: usize,
    in_use: Cell<usize>,
}

impl Budget<Heap> {
    /// Constructs a new `Budget` of `limit` bytes over the global heap.
    pub fn new(limit: usize) -> Self {
        Self::with_allocator(Heap, limit)
    }
}

impl<A: Allocator> Budget<A> {
    /// Constructs a new `Budget` of `limit` bytes over `inner`.
    pub fn with_allocator(inner: A, limit: usize) -> Self {
        Self {
            inner,
            limit,
            in_use: Cell::new(0),
        }
    }

    /// Returns the total number of bytes this budget allows.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of bytes currently allocated through this budget.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    /// Returns the number of bytes that can still be allocated.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.in_use.get()
    }

    /// Checks that `requested` more bytes fit, given that `released` bytes are returned first.
    fn admit(&self, requested: usize, released: usize) -> Result<(), AllocError> {
        if requested > self.limit {
            error!(
                "size requested is larger than the budget: {} > {}",
                ByteSize::b(requested as u64).to_string_as(true),
                ByteSize::b(self.limit as u64).to_string_as(true)
            );
            return Err(AllocError::RequestTooLarge);
        }

        let available = self.remaining() + released;
        if requested > available {
            error!(
                "budget exhausted: requested {}, available {}",
                ByteSize::b(requested as u64).to_string_as(true),
                ByteSize::b(available as u64).to_string_as(true)
            );
            return Err(AllocError::OutOfMemory);
        }

        Ok(())
    }
}

impl<A: Allocator> Allocator for Budget<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.admit(layout.size(), 0)?;
        let ptr = self.inner.allocate(layout)?;
        self.in_use.set(self.in_use.get() + layout.size());
        Ok(ptr)
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        self.admit(new_size, old_layout.size())?;
        let new_ptr = self.inner.reallocate(ptr, old_layout, new_size)?;
        self.in_use
            .set(self.in_use.get() - old_layout.size() + new_size);
        Ok(new_ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.deallocate(ptr, layout);
        self.in_use.set(self.in_use.get() - layout.size());
    }
}
