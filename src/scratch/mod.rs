//! Scratch-region management for the planner
//!
//! The planner targets devices without a dynamic allocator, so every
//! working array it needs is carved out of a single caller-supplied byte
//! region at construction time. Nothing is allocated afterwards and the
//! region is never freed; the client recycles it once the planner is
//! dropped (typically as the downstream tensor arena).
//!
//! # Pattern
//!
//! 1. Size the region up front with [`required_scratch_bytes`]
//! 2. Hand the region to the planner, which bump-carves its arrays
//!    through [`ScratchArena`]
//! 3. The number of buffers that can be planned follows from the region
//!    size; see [`max_supported_buffers`]

pub mod arena;
pub mod layout;

pub use arena::ScratchArena;
pub use layout::{max_supported_buffers, per_buffer_bytes, required_scratch_bytes};
