use core::fmt;
use std::error::Error;

/// An error with allocating or reallocating memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The allocator has no memory left that meets the request.
    OutOfMemory,
    /// The request is larger than anything the allocator could ever hand out.
    RequestTooLarge,
    /// The requested slot count cannot be represented as a memory layout.
    CapacityOverflow,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::RequestTooLarge => write!(f, "allocation request too large"),
            Self::CapacityOverflow => write!(f, "capacity overflow"),
        }
    }
}

impl Error for AllocError {}

/// An error from a [`Vector`](crate::containers::Vector) operation.
///
/// A failed operation leaves the vector exactly as it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VecError {
    /// Growing the buffer failed.
    Alloc(AllocError),
    /// The vector is full and its growth step is zero, so it can never grow.
    ZeroAllocStep,
    /// `position` is not a live index.
    OutOfBounds {
        /// The rejected position.
        position: u64,
        /// The logical length at the time of the call.
        len: u64,
    },
}

impl fmt::Display for VecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(err) => write!(f, "vector growth failed: {err}"),
            Self::ZeroAllocStep => write!(f, "vector is full and its alloc step is 0"),
            Self::OutOfBounds { position, len } => {
                write!(f, "position {position} out of bounds for length {len}")
            }
        }
    }
}

impl Error for VecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Alloc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocError> for VecError {
    fn from(err: AllocError) -> Self {
        Self::Alloc(err)
    }
}
