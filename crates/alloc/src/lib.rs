//! Allocator seam and a `u64` vector that grows in fixed steps.
//!
//! Containers here never use the global allocator implicitly. Each one is created against an
//! [`Allocator`] and wrapped in an [`Owned`] that remembers it, so memory always goes back where
//! it came from.
//!
//! ```
//! use stepvec_alloc::{Heap, Vector};
//!
//! let mut v = Vector::with_capacity_in(4, 2, &Heap).unwrap();
//! for x in [10, 20, 30, 40, 50] {
//!     v.append(x).unwrap();
//! }
//! assert_eq!(v.len(), 5);
//! assert_eq!(v.capacity(), 6);
//! assert_eq!(v.index_of(40, 0), Some(3));
//! ```
pub mod budget;
pub mod config;
pub mod containers;
pub mod error;
pub mod heap;
pub mod traits;

pub use budget::Budget;
pub use config::VecConfig;
pub use containers::{Owned, Vector};
pub use error::{AllocError, VecError};
pub use heap::Heap;
pub use traits::{AllocClone, AllocDrop, Allocator};
