//! memforge - static memory planner for tensor-graph inference
//!
//! Computes a fixed arena offset for every tensor buffer of an inference
//! graph so the whole model can run out of one contiguous region with no
//! dynamic allocator, targeting constrained devices. Buffers alive at the
//! same operator step get disjoint byte ranges, except where a producing
//! operator's data flow proves partial aliasing safe (convolution and
//! in-place add), which lets feature-map chains run in far less memory
//! than the sum of their tensors.
//!
//! The planner borrows a caller-supplied scratch region for all of its
//! own bookkeeping and never allocates after construction.

pub mod error;
pub mod logging;
pub mod planner;
pub mod scratch;

pub use error::{ForgeResult, MemForgeError};
pub use planner::{
    two_level_sort, ConvGeometry, OperatorKind, OperatorRecord, TopologicalPlanner,
    OFFLINE_UNPLANNED,
};
pub use scratch::{max_supported_buffers, per_buffer_bytes, required_scratch_bytes, ScratchArena};
