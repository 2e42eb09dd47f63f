//! Placement ordering
//!
//! Pinned buffers come first, in registration order, and are never sorted
//! against each other. Online buffers follow under a two-level ordering:
//! ascending first-use step, ties broken by descending last-use step.
//! Buffers born at the same step with a longer tail get placed first so
//! later shorter-lived buffers can tuck into gaps left beside them.

use super::records::OFFSET_UNASSIGNED;
use super::TopologicalPlanner;

/// Stable in-place sort over three parallel arrays.
///
/// First level: ascending order of `primary`. Second level: for equal
/// `primary`, descending order of `secondary`. Entries equal on both
/// levels keep their input order. The sort allocates nothing and is
/// quadratic in the worst case, which is fine for the buffer counts a
/// scratch region holds.
pub fn two_level_sort(primary: &mut [u32], secondary: &mut [u32], ids: &mut [usize]) {
    debug_assert_eq!(primary.len(), secondary.len());
    debug_assert_eq!(primary.len(), ids.len());

    let len = primary.len();
    let mut any_swapped = true;
    while any_swapped {
        any_swapped = false;
        for i in 1..len {
            let out_of_order = if primary[i - 1] != primary[i] {
                primary[i - 1] > primary[i]
            } else {
                secondary[i - 1] < secondary[i]
            };
            if out_of_order {
                primary.swap(i - 1, i);
                secondary.swap(i - 1, i);
                ids.swap(i - 1, i);
                any_swapped = true;
            }
        }
    }
}

impl TopologicalPlanner<'_> {
    /// Fill the sort arrays for a placement pass.
    ///
    /// Pinned buffers occupy the head in registration order with their
    /// last-use step as both keys (the key only maintains the sort
    /// invariant against online buffers; pinned offsets are fixed and
    /// their offsets are recorded here). Online buffers follow and get
    /// the two-level sort.
    pub(crate) fn partition_for_placement(&mut self) {
        let mut cursor = 0;
        for id in 0..self.buffer_count {
            let requirements = self.requirements[id];
            if requirements.is_pinned() {
                self.created_sorted[cursor] = requirements.last_step;
                self.last_used_sorted[cursor] = requirements.last_step;
                self.ids_sorted[cursor] = id;
                self.buffer_offsets[id] = requirements.offline_offset;
                cursor += 1;
            }
        }
        let pinned_count = cursor;

        for id in 0..self.buffer_count {
            let requirements = self.requirements[id];
            if !requirements.is_pinned() {
                self.created_sorted[cursor] = requirements.first_step;
                self.last_used_sorted[cursor] = requirements.last_step;
                self.ids_sorted[cursor] = id;
                self.buffer_offsets[id] = OFFSET_UNASSIGNED;
                cursor += 1;
            }
        }

        two_level_sort(
            &mut self.created_sorted[pinned_count..cursor],
            &mut self.last_used_sorted[pinned_count..cursor],
            &mut self.ids_sorted[pinned_count..cursor],
        );
    }
}
