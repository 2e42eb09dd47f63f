//! Plan queries
//!
//! Every query first brings the plan up to date, so callers never observe
//! offsets from a stale registration state.

use super::records::NO_ENTRY;
use super::TopologicalPlanner;
use crate::error::{ForgeResult, MemForgeError};

impl TopologicalPlanner<'_> {
    /// Where a given buffer should be placed in the memory arena.
    ///
    /// # Errors
    /// `IndexOutOfRange` when `buffer_index` is not below the registered
    /// buffer count.
    pub fn get_offset_for_buffer(&mut self, buffer_index: usize) -> ForgeResult<usize> {
        self.calculate_offsets_if_needed();
        if buffer_index >= self.buffer_count {
            tracing::warn!(
                buffer_index,
                buffer_count = self.buffer_count,
                "buffer index outside registered range"
            );
            return Err(MemForgeError::IndexOutOfRange {
                index: buffer_index,
                bound: self.buffer_count,
            });
        }
        Ok(self.buffer_offsets[buffer_index])
    }

    /// The high-water mark of used memory: the minimum arena size that
    /// holds every placed buffer. Zero when nothing is registered.
    pub fn get_maximum_memory_size(&mut self) -> usize {
        self.calculate_offsets_if_needed();
        if self.buffer_count == 0 {
            return 0;
        }
        let mut max_size = 0;
        let mut entry_index = self.first_entry_index;
        while entry_index != NO_ENTRY {
            let entry = self.entries[entry_index as usize];
            let end = entry.offset + self.requirements[entry.buffer_index].size;
            max_size = max_size.max(end);
            entry_index = entry.next_index;
        }
        max_size
    }

    /// Whether the kernel for `operator_id` must iterate output positions
    /// in reverse natural order. True only when placement admitted an
    /// overlap whose safety depends on it.
    ///
    /// # Errors
    /// `IndexOutOfRange` when `operator_id` is not below the operator
    /// count declared at construction.
    pub fn is_operator_reversed(&mut self, operator_id: usize) -> ForgeResult<bool> {
        self.calculate_offsets_if_needed();
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
        Ok(self.operators[operator_id].reverse)
    }

    /// Debug check for buffers that overlap both in time and in memory.
    ///
    /// O(N²), meant for testing. Every such pair is reported through the
    /// logger and makes this return true, including pairs the overlap
    /// policy deliberately admitted, so an expected self-aliasing plan
    /// surfaces its aliases here for inspection.
    pub fn do_any_buffers_overlap(&mut self) -> bool {
        self.calculate_offsets_if_needed();
        let mut were_overlaps_found = false;
        for a in 0..self.buffer_count {
            let a_requirements = self.requirements[a];
            let a_start = self.buffer_offsets[a];
            let a_end = a_start + a_requirements.size;
            for b in 0..self.buffer_count {
                if a == b {
                    continue;
                }
                let b_requirements = self.requirements[b];
                if !a_requirements
                    .overlaps_in_time(b_requirements.first_step, b_requirements.last_step)
                {
                    continue;
                }
                let b_start = self.buffer_offsets[b];
                let b_end = b_start + b_requirements.size;
                if a_start >= b_end || b_start >= a_end {
                    // No overlap in memory.
                    continue;
                }
                were_overlaps_found = true;
                tracing::warn!(
                    "Overlap: {} ({}=>{}, {}->{}) vs {} ({}=>{}, {}->{})",
                    a,
                    a_requirements.first_step,
                    a_requirements.last_step,
                    a_start,
                    a_end,
                    b,
                    b_requirements.first_step,
                    b_requirements.last_step,
                    b_start,
                    b_end
                );
            }
        }
        were_overlaps_found
    }
}

#[cfg(test)]
mod tests {
    use crate::planner::TopologicalPlanner;
    use crate::scratch::required_scratch_bytes;
    use crate::MemForgeError;

    #[test]
    fn test_offset_query_bounds() {
        let mut scratch = vec![0u8; required_scratch_bytes(1, 1)];
        let mut planner = TopologicalPlanner::new(&mut scratch, 1);
        planner.add_buffer(4, 0, 0, &[], &[]).unwrap();

        assert!(planner.get_offset_for_buffer(0).is_ok());
        assert_eq!(
            planner.get_offset_for_buffer(1),
            Err(MemForgeError::IndexOutOfRange { index: 1, bound: 1 })
        );
    }

    #[test]
    fn test_reverse_query_bounds() {
        let mut scratch = vec![0u8; required_scratch_bytes(1, 2)];
        let mut planner = TopologicalPlanner::new(&mut scratch, 2);
        assert_eq!(planner.is_operator_reversed(0).unwrap(), false);
        assert!(planner.is_operator_reversed(2).is_err());
    }

    #[test]
    fn test_overlap_check_clean_plan() {
        let mut scratch = vec![0u8; required_scratch_bytes(2, 1)];
        let mut planner = TopologicalPlanner::new(&mut scratch, 1);
        planner.add_buffer(16, 0, 2, &[], &[]).unwrap();
        planner.add_buffer(16, 1, 3, &[], &[]).unwrap();
        assert!(!planner.do_any_buffers_overlap());
    }

    #[test]
    fn test_overlap_check_reports_pinned_collision() {
        // Pinned offsets are honoured verbatim even when they collide;
        // the debug check is what surfaces the damage.
        let mut scratch = vec![0u8; required_scratch_bytes(2, 1)];
        let mut planner = TopologicalPlanner::new(&mut scratch, 1);
        planner.add_buffer_pinned(16, 0, 2, &[], &[], 0).unwrap();
        planner.add_buffer_pinned(16, 0, 2, &[], &[], 8).unwrap();
        assert!(planner.do_any_buffers_overlap());
    }
}
