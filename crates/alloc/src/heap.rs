use core::{alloc::Layout, ptr::NonNull};
use std::alloc;

use bytesize::ByteSize;
use log::error;

use crate::{error::AllocError, traits::Allocator};

/// An allocator backed by the global heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Heap;

impl Allocator for Heap {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        assert!(layout.size() != 0, "zero-sized allocations are not supported");

        // SAFETY: layout has non-zero size
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| {
            error!(
                "heap allocation failed: {}",
                ByteSize::b(layout.size() as u64).to_string_as(true)
            );
            AllocError::OutOfMemory
        })
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        assert!(new_size != 0, "zero-sized allocations are not supported");

        let new_ptr = alloc::realloc(ptr.as_ptr(), old_layout, new_size);
        NonNull::new(new_ptr).ok_or_else(|| {
            error!(
                "heap reallocation failed: {} -> {}",
                ByteSize::b(old_layout.size() as u64).to_string_as(true),
                ByteSize::b(new_size as u64).to_string_as(true)
            );
            AllocError::OutOfMemory
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        alloc::dealloc(ptr.as_ptr(), layout);
    }
}
