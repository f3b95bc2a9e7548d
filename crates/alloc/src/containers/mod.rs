mod vec;

pub use vec::{Owned, Vector};
