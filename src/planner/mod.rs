//! Topological memory planner
//!
//! Assigns a fixed arena offset to every tensor buffer of an inference
//! graph so that buffers alive at the same operator step never collide,
//! except where a producing operator's data flow proves partial aliasing
//! safe (convolution and in-place add). The algorithm:
//!
//! - The client registers operators through `add_operator_info()` and
//!   buffers through `add_buffer()` / `add_buffer_pinned()`.
//! - Placement is lazy: the first query triggers
//!   `calculate_offsets_if_needed()`, and it re-runs only after further
//!   registration.
//! - Offline-pinned buffers are placed first, in registration order, at
//!   their fixed offsets.
//! - Online buffers are placed in ascending order of first use, ties
//!   broken by descending last use, walking an offset-ordered list of
//!   already-placed buffers for the lowest gap that fits.
//! - When the candidate is the output of a conv/add whose input is the
//!   neighbour under consideration and the input dies at the step the
//!   candidate is born, the two may share bytes at the policy-computed
//!   displacement.
//!
//! This is not guaranteed to produce the best placement, since that is an
//! NP-complete problem, but in practice it produces a decent one, and
//! identical inputs always produce identical offsets.
//!
//! All working state is carved from a caller-supplied scratch region at
//! construction; the planner performs no heap allocation.

mod ordering;
mod overlap;
mod placement;
mod printer;
mod queries;
mod records;

pub use records::{ConvGeometry, OperatorKind, OperatorRecord, OFFLINE_UNPLANNED};

pub(crate) use records::{BufferRequirements, ListEntry, PlanState, OFFSET_UNASSIGNED};
pub(crate) use records::NO_ENTRY;

pub use ordering::two_level_sort;

use crate::error::{ForgeResult, MemForgeError};
use crate::scratch::{layout, ScratchArena};

/// Static memory planner over a borrowed scratch region.
///
/// The region must outlive the planner and is not touched by anything
/// else while the planner exists; the `&'a mut` borrow enforces exactly
/// the lifetime contract the algorithm needs. Once the planner is
/// dropped, the client may recycle the region; the computed offsets
/// should be copied out first.
///
/// # Example
///
/// ```
/// use memforge::{required_scratch_bytes, OperatorKind, TopologicalPlanner};
///
/// let mut scratch = vec![0u8; required_scratch_bytes(2, 1)];
/// let mut planner = TopologicalPlanner::new(&mut scratch, 1);
///
/// planner.add_operator_info(0, OperatorKind::Mul)?;
/// planner.add_buffer(10, 0, 1, &[true], &[false])?;
/// planner.add_buffer(20, 2, 3, &[false], &[true])?;
///
/// // The live intervals are disjoint, so both buffers share offset 0.
/// assert_eq!(planner.get_offset_for_buffer(0)?, 0);
/// assert_eq!(planner.get_offset_for_buffer(1)?, 0);
/// assert_eq!(planner.get_maximum_memory_size(), 20);
/// # Ok::<(), memforge::MemForgeError>(())
/// ```
pub struct TopologicalPlanner<'a> {
    /// Client-provided facts about each buffer.
    pub(crate) requirements: &'a mut [BufferRequirements],
    /// Flat rows: `buffer * operator_count + op` is true when the buffer
    /// is an input of that operator.
    pub(crate) consumer_flags: &'a mut [bool],
    /// Flat rows, same indexing: true when the buffer is an output.
    pub(crate) producer_flags: &'a mut [bool],
    /// Registered operators, indexed by operator id.
    pub(crate) operators: &'a mut [OperatorRecord],

    // Working arrays for the layout pass.
    pub(crate) created_sorted: &'a mut [u32],
    pub(crate) last_used_sorted: &'a mut [u32],
    pub(crate) ids_sorted: &'a mut [usize],
    pub(crate) entries: &'a mut [ListEntry],

    /// Outcome of the plan: each buffer's offset in the arena.
    pub(crate) buffer_offsets: &'a mut [usize],

    pub(crate) buffer_capacity: usize,
    pub(crate) buffer_count: usize,
    pub(crate) operator_count: usize,

    /// Head of the offset-ordered entry chain; `NO_ENTRY` when empty.
    pub(crate) first_entry_index: i32,
    /// Next unused slot in `entries`.
    pub(crate) next_free_entry: usize,

    pub(crate) plan_state: PlanState,
}

impl<'a> TopologicalPlanner<'a> {
    /// Construct a planner that carves all working state from `scratch`.
    ///
    /// How many buffers can be planned depends on the region size; query
    /// [`buffer_capacity`](Self::buffer_capacity) or pre-size the region
    /// with [`crate::required_scratch_bytes`]. Construction never fails:
    /// a region too small even for the operator table degrades to zero
    /// capacity and logs a warning, and subsequent registrations return
    /// `CapacityExceeded`.
    pub fn new(scratch: &'a mut [u8], operator_count: usize) -> Self {
        let buffer_capacity = layout::max_supported_buffers(scratch.len(), operator_count);
        let mut arena = ScratchArena::new(scratch);

        let requirements = arena
            .alloc_slice(buffer_capacity, BufferRequirements::EMPTY)
            .unwrap_or_default();
        let consumer_flags = arena
            .alloc_slice(buffer_capacity * operator_count, false)
            .unwrap_or_default();
        let producer_flags = arena
            .alloc_slice(buffer_capacity * operator_count, false)
            .unwrap_or_default();
        let created_sorted = arena.alloc_slice(buffer_capacity, 0u32).unwrap_or_default();
        let last_used_sorted = arena.alloc_slice(buffer_capacity, 0u32).unwrap_or_default();
        let ids_sorted = arena.alloc_slice(buffer_capacity, 0usize).unwrap_or_default();
        let entries = arena
            .alloc_slice(buffer_capacity, ListEntry::UNUSED)
            .unwrap_or_default();
        let operators = arena
            .alloc_slice(operator_count, OperatorRecord::default())
            .unwrap_or_default();
        let buffer_offsets = arena
            .alloc_slice(buffer_capacity, OFFSET_UNASSIGNED)
            .unwrap_or_default();

        debug_assert_eq!(requirements.len(), buffer_capacity);

        if operators.len() < operator_count {
            tracing::warn!(
                requested_operators = operator_count,
                "scratch region cannot hold the operator table; planner capacity is zero"
            );
        }
        let operator_count = operators.len();

        Self {
            requirements,
            consumer_flags,
            producer_flags,
            operators,
            created_sorted,
            last_used_sorted,
            ids_sorted,
            entries,
            buffer_offsets,
            buffer_capacity,
            buffer_count: 0,
            operator_count,
            first_entry_index: NO_ENTRY,
            next_free_entry: 0,
            plan_state: PlanState::Fresh,
        }
    }

    /// Record one operator's kind (and geometry, for convolutions).
    ///
    /// # Errors
    /// `IndexOutOfRange` when `operator_id` is not below the operator
    /// count declared at construction.
    pub fn add_operator_info(&mut self, operator_id: usize, kind: OperatorKind) -> ForgeResult<()> {
        if operator_id >= self.operator_count {
            tracing::warn!(
                operator_id,
                operator_count = self.operator_count,
                "operator index larger than declared count"
            );
            return Err(MemForgeError::IndexOutOfRange {
                index: operator_id,
                bound: self.operator_count,
            });
        }
        self.operators[operator_id] = OperatorRecord {
            kind,
            reverse: false,
        };
        self.mark_dirty();
        Ok(())
    }

    /// Record details of a buffer the planner should place.
    ///
    /// `consumers` and `producers` state, per operator id, whether this
    /// buffer is an input or output of that operator; rows shorter than
    /// the operator count leave the remainder false.
    ///
    /// # Errors
    /// `CapacityExceeded` when the scratch-derived capacity is full.
    /// Previously registered state stays valid and queryable.
    pub fn add_buffer(
        &mut self,
        size: usize,
        first_step: u32,
        last_step: u32,
        consumers: &[bool],
        producers: &[bool],
    ) -> ForgeResult<()> {
        self.add_buffer_record(size, first_step, last_step, consumers, producers, OFFLINE_UNPLANNED)
    }

    /// Like [`add_buffer`](Self::add_buffer), but pins the buffer at a
    /// client-chosen arena offset the planner must honour verbatim.
    pub fn add_buffer_pinned(
        &mut self,
        size: usize,
        first_step: u32,
        last_step: u32,
        consumers: &[bool],
        producers: &[bool],
        offline_offset: usize,
    ) -> ForgeResult<()> {
        self.add_buffer_record(size, first_step, last_step, consumers, producers, offline_offset)
    }

    fn add_buffer_record(
        &mut self,
        size: usize,
        first_step: u32,
        last_step: u32,
        consumers: &[bool],
        producers: &[bool],
        offline_offset: usize,
    ) -> ForgeResult<()> {
        if self.buffer_count >= self.buffer_capacity {
            tracing::warn!(
                capacity = self.buffer_capacity,
                "too many buffers for the scratch region"
            );
            return Err(MemForgeError::CapacityExceeded {
                capacity: self.buffer_capacity,
            });
        }

        let id = self.buffer_count;
        self.requirements[id] = BufferRequirements {
            size,
            first_step,
            last_step,
            offline_offset,
        };

        let row = id * self.operator_count;
        let consumer_row = &mut self.consumer_flags[row..row + self.operator_count];
        for (slot, &flag) in consumer_row.iter_mut().zip(consumers) {
            *slot = flag;
        }
        let producer_row = &mut self.producer_flags[row..row + self.operator_count];
        for (slot, &flag) in producer_row.iter_mut().zip(producers) {
            *slot = flag;
        }

        self.buffer_count += 1;
        self.mark_dirty();
        Ok(())
    }

    /// How many buffers the scratch region can hold.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// How many buffers have been registered.
    pub fn get_buffer_count(&self) -> usize {
        self.buffer_count
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.plan_state = PlanState::Dirty;
    }

    pub(crate) fn consumer_flag(&self, buffer: usize, operator: usize) -> bool {
        self.consumer_flags[buffer * self.operator_count + operator]
    }

    pub(crate) fn producer_flag(&self, buffer: usize, operator: usize) -> bool {
        self.producer_flags[buffer * self.operator_count + operator]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scratch::required_scratch_bytes;

    #[test]
    fn test_construction_capacity() {
        let mut scratch = vec![0u8; required_scratch_bytes(4, 2)];
        let planner = TopologicalPlanner::new(&mut scratch, 2);
        assert!(planner.buffer_capacity() >= 4);
        assert_eq!(planner.get_buffer_count(), 0);
    }

    #[test]
    fn test_degraded_construction_never_panics() {
        let mut scratch = [0u8; 4];
        let mut planner = TopologicalPlanner::new(&mut scratch, 2);
        assert_eq!(planner.buffer_capacity(), 0);
        assert!(planner
            .add_buffer(16, 0, 1, &[], &[])
            .is_err());
        assert_eq!(planner.get_maximum_memory_size(), 0);
    }

    #[test]
    fn test_operator_index_checked() {
        let mut scratch = vec![0u8; required_scratch_bytes(2, 1)];
        let mut planner = TopologicalPlanner::new(&mut scratch, 1);
        assert!(planner.add_operator_info(0, OperatorKind::Add).is_ok());
        assert_eq!(
            planner.add_operator_info(1, OperatorKind::Add),
            Err(MemForgeError::IndexOutOfRange { index: 1, bound: 1 })
        );
    }

    #[test]
    fn test_short_flag_rows_leave_remainder_false() {
        let mut scratch = vec![0u8; required_scratch_bytes(1, 3)];
        let mut planner = TopologicalPlanner::new(&mut scratch, 3);
        planner.add_buffer(8, 0, 1, &[true], &[]).unwrap();
        assert!(planner.consumer_flag(0, 0));
        assert!(!planner.consumer_flag(0, 1));
        assert!(!planner.consumer_flag(0, 2));
        assert!(!planner.producer_flag(0, 0));
    }
}
