/// Default number of slots allocated up front.
pub const DEFAULT_INITIAL_CAPACITY: u64 = 8;
/// Default number of slots added per growth event.
pub const DEFAULT_ALLOC_STEP: u32 = 8;

/// Sizing parameters for a [`Vector`](crate::containers::Vector).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VecConfig {
    /// The number of slots allocated when the vector is created. May be 0.
    pub initial_capacity: u64,
    /// The number of slots added each time a full vector grows.
    ///
    /// With a step of 0 a vector never grows past its initial capacity.
    pub alloc_step: u32,
}

impl Default for VecConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            alloc_step: DEFAULT_ALLOC_STEP,
        }
    }
}
