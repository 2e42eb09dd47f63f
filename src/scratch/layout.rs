//! Scratch-region capacity math
//!
//! Computes how many buffers a given scratch region can plan for, and the
//! inverse: how large a region a given model needs. Keeping this apart
//! from the carver lets clients run pre-flight sizing before committing
//! any memory.

use core::mem::size_of;

use crate::planner::{BufferRequirements, ListEntry, OperatorRecord};

/// Worst-case alignment padding per carved array.
const ARRAY_ALIGN_PAD: usize = 16;

/// Number of distinct arrays the planner carves from the region.
const WORKING_ARRAY_COUNT: usize = 9;

/// Scratch bytes consumed by each planned buffer.
///
/// Covers the requirement record, the consumer/producer flag rows, the
/// two sort-key entries, the id entry, the offset-ordered list node, and
/// the final offset slot.
pub fn per_buffer_bytes(operator_count: usize) -> usize {
    size_of::<BufferRequirements>()
        + 2 * operator_count * size_of::<bool>()
        + 2 * size_of::<u32>()
        + size_of::<usize>()
        + size_of::<ListEntry>()
        + size_of::<usize>()
}

/// Scratch bytes consumed regardless of buffer count: the operator table
/// plus worst-case alignment padding for every carved array.
fn fixed_overhead_bytes(operator_count: usize) -> usize {
    operator_count * size_of::<OperatorRecord>() + WORKING_ARRAY_COUNT * ARRAY_ALIGN_PAD
}

/// The largest buffer count a scratch region of `scratch_len` bytes can
/// plan for with `operator_count` operators. Zero when the region cannot
/// even hold the operator table.
pub fn max_supported_buffers(scratch_len: usize, operator_count: usize) -> usize {
    scratch_len.saturating_sub(fixed_overhead_bytes(operator_count))
        / per_buffer_bytes(operator_count)
}

/// A region size guaranteed to plan for `buffer_count` buffers over
/// `operator_count` operators.
///
/// Conservative: includes worst-case alignment padding, so
/// `max_supported_buffers(required_scratch_bytes(n, ops), ops) >= n`.
///
/// # Example
///
/// ```
/// use memforge::{required_scratch_bytes, TopologicalPlanner};
///
/// let need = required_scratch_bytes(4, 2);
/// let mut scratch = vec![0u8; need];
/// let planner = TopologicalPlanner::new(&mut scratch, 2);
/// assert!(planner.buffer_capacity() >= 4);
/// ```
pub fn required_scratch_bytes(buffer_count: usize, operator_count: usize) -> usize {
    fixed_overhead_bytes(operator_count) + buffer_count * per_buffer_bytes(operator_count)
}
