//! Error handling for memforge
//!
//! The planner has exactly two failure modes: an id or index outside the
//! bounds declared at construction, and a buffer registration that would
//! exceed the capacity derived from the scratch region. Both are reported
//! through the logger on the failure path and returned to the caller; the
//! caller's remedy is to enlarge the scratch region or register fewer
//! buffers/operators.
//!
//! Error values carry plain integers only, so constructing one performs no
//! heap allocation. That matters because the planner is otherwise
//! allocation-free after construction.

// Re-export thiserror for convenience
pub use thiserror;

/// Unified error type for memforge
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemForgeError {
    /// An id or index outside the bounds declared at construction
    #[error("index {index} is outside range 0 to {bound}")]
    IndexOutOfRange { index: usize, bound: usize },

    /// Registering another buffer would exceed the scratch-derived capacity
    #[error("too many buffers (capacity is {capacity})")]
    CapacityExceeded { capacity: usize },
}

impl MemForgeError {
    /// Whether the caller can recover by enlarging the scratch region.
    ///
    /// `CapacityExceeded` is recoverable in that sense; `IndexOutOfRange`
    /// indicates a caller bug (an id that never fit the declared bounds).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MemForgeError::CapacityExceeded { .. })
    }
}

// Helper type alias for Results using MemForgeError
pub type ForgeResult<T> = std::result::Result<T, MemForgeError>;
