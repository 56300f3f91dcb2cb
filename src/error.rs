//! Faults reported by the lookup-style accessors, the bulk constructor and
//! the cursor. Every other map operation is total.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// `from_parallel` received key and value sequences of different length.
    #[error("ERROR: HashMap should receive 2 valid vectors of equal size.")]
    MismatchedInput { keys: usize, values: usize },

    /// `at`, `at_mut`, `bucket_size` or `bucket_index` on an absent key.
    #[error("ERROR: HashMap key not found.")]
    KeyNotFound,

    /// A cursor was dereferenced at the end sentinel.
    #[error("ERROR: Attempting to use HashMap iterator outside of range.")]
    OutOfRange,
}
