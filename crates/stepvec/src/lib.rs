//! A growable, contiguous `u64` vector with manual control over its allocation size.
//!
//! A [`Vector`] is created with an explicit initial capacity and a growth step. When it is full,
//! an append grows it by exactly that many slots. Removals never give capacity back, only
//! [`Owned::shrink_to_fit`] does.
//!
//! Memory comes from an [`Allocator`]: [`Heap`] for the global heap, or [`Budget`] to put a
//! ceiling on it.
//!
//! A vector is a single-owner value. Mutation needs `&mut`. To share one between threads, put it
//! behind a lock such as `Mutex`. The vector itself does no synchronization.
//!
//! The [`handle`] module offers the same operations on an `Option` that may not hold a vector
//! at all, for callers that track vectors which can be destroyed.
pub mod handle;

pub use handle::{Handle, HandleError, VectorHandle};
pub use stepvec_alloc::{
    AllocClone, AllocDrop, AllocError, Allocator, Budget, Heap, Owned, VecConfig, VecError,
    Vector,
};
