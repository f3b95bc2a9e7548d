//! Vector operations on a handle that may be absent.
//!
//! A [`Handle`] is `None` before a vector is created, after creation failed, and after
//! [`VectorHandle::destroy`]. Every operation accepts an absent handle: queries report
//! `None`/`false`, mutations do nothing or return [`HandleError::Absent`]. Absence is never
//! encoded in the value space.

use core::fmt;
use std::error::Error;

use log::trace;
use stepvec_alloc::{AllocError, Allocator, Heap, Owned, VecError, Vector};

/// A vector that may have been destroyed or never created.
pub type Handle<'alloc, A = Heap> = Option<Owned<'alloc, Vector, A>>;

/// An error from an operation on a [`Handle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleError {
    /// The handle holds no vector.
    Absent,
    /// The vector rejected the operation.
    Vector(VecError),
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "vector handle is absent"),
            Self::Vector(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HandleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Absent => None,
            Self::Vector(err) => Some(err),
        }
    }
}

impl From<VecError> for HandleError {
    fn from(err: VecError) -> Self {
        Self::Vector(err)
    }
}

impl From<AllocError> for HandleError {
    fn from(err: AllocError) -> Self {
        Self::Vector(VecError::Alloc(err))
    }
}

/// Creates a vector with room for `initial_size` values, or an absent handle if allocation fails.
pub fn create<A: Allocator>(initial_size: u64, alloc_step: u32, alloc: &A) -> Handle<'_, A> {
    Vector::with_capacity_in(initial_size, alloc_step, alloc).ok()
}

/// The vector operations, lifted over a possibly absent vector.
pub trait VectorHandle<'alloc, A: Allocator> {
    /// Returns the logical length, or `None` if absent.
    fn length(&self) -> Option<u64>;

    /// Returns the value at `position`, or `None` if absent or out of bounds.
    fn at(&self, position: u64) -> Option<u64>;

    fn remove(&mut self, position: u64) -> Result<u64, HandleError>;

    fn append(&mut self, value: u64) -> Result<(), HandleError>;

    /// Returns `false` if absent.
    fn contains(&self, value: u64) -> bool;

    fn index_of(&self, value: u64, from: u64) -> Option<u64>;

    /// See [`Owned::fill`]. Does nothing if absent.
    fn fill(&mut self, value: u64, start: u64, end: u64);

    /// Releases the buffer but keeps the vector. Does nothing if absent.
    fn clear(&mut self);

    /// Makes an independent copy of the vector.
    fn try_copy(&self) -> Result<Owned<'alloc, Vector, A>, HandleError>;

    /// Releases the vector and leaves the handle absent. Does nothing if already absent.
    fn destroy(&mut self);
}

impl<'alloc, A: Allocator> VectorHandle<'alloc, A> for Handle<'alloc, A> {
    fn length(&self) -> Option<u64> {
        self.as_ref().map(|v| v.len())
    }

    fn at(&self, position: u64) -> Option<u64> {
        self.as_ref()?.at(position)
    }

    fn remove(&mut self, position: u64) -> Result<u64, HandleError> {
        let v = self.as_mut().ok_or(HandleError::Absent)?;
        Ok(v.remove(position)?)
    }

    fn append(&mut self, value: u64) -> Result<(), HandleError> {
        let v = self.as_mut().ok_or(HandleError::Absent)?;
        Ok(v.append(value)?)
    }

    fn contains(&self, value: u64) -> bool {
        self.as_ref().is_some_and(|v| v.contains(value))
    }

    fn index_of(&self, value: u64, from: u64) -> Option<u64> {
        self.as_ref()?.index_of(value, from)
    }

    fn fill(&mut self, value: u64, start: u64, end: u64) {
        if let Some(v) = self.as_mut() {
            v.fill(value, start, end);
        }
    }

    fn clear(&mut self) {
        if let Some(v) = self.as_mut() {
            v.clear();
        }
    }

    fn try_copy(&self) -> Result<Owned<'alloc, Vector, A>, HandleError> {
        let v = self.as_ref().ok_or(HandleError::Absent)?;
        Ok(v.try_clone()?)
    }

    fn destroy(&mut self) {
        match self.take() {
            Some(v) => v.destroy(),
            None => trace!("destroy on an absent vector handle"),
        }
    }
}
