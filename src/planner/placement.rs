//! Buffer placement
//!
//! The placer walks buffers in ordering-stage order and keeps every
//! placed buffer in a singly-linked list sorted by ascending arena
//! offset, stored in the arena-carved `entries` array. For each new
//! buffer it scans the time-overlapping neighbours in that list for the
//! lowest admissible offset, then links a new entry in.

use super::records::{ListEntry, PlanState, NO_ENTRY};
use super::TopologicalPlanner;

impl TopologicalPlanner<'_> {
    /// Whether the entry's buffer is live anywhere in `[first_step, last_step]`.
    fn does_entry_overlap_in_time(
        &self,
        entry_index: i32,
        first_step: u32,
        last_step: u32,
    ) -> bool {
        let entry = self.entries[entry_index as usize];
        self.requirements[entry.buffer_index].overlaps_in_time(first_step, last_step)
    }

    /// The first entry strictly after `start` (or from the head when
    /// `start` is `NO_ENTRY`) whose buffer's live interval intersects the
    /// given one. `NO_ENTRY` when there are none.
    fn next_simultaneously_active(&self, start: i32, first_step: u32, last_step: u32) -> i32 {
        let mut candidate = if start == NO_ENTRY {
            self.first_entry_index
        } else {
            self.entries[start as usize].next_index
        };
        while candidate != NO_ENTRY {
            if self.does_entry_overlap_in_time(candidate, first_step, last_step) {
                return candidate;
            }
            candidate = self.entries[candidate as usize].next_index;
        }
        NO_ENTRY
    }

    /// Find and record an offset for one buffer, then link it into the
    /// offset-ordered list.
    fn place_buffer(&mut self, buffer_id: usize) {
        let current = self.requirements[buffer_id];
        let mut candidate_offset = 0usize;

        if current.is_pinned() {
            // Offline planned offsets are constants.
            candidate_offset = current.offline_offset;
        } else {
            let mut prior = NO_ENTRY;
            loop {
                let next =
                    self.next_simultaneously_active(prior, current.first_step, current.last_step);

                if prior != NO_ENTRY {
                    // The gaps tried so far were not usable, so the
                    // candidate must clear this prior buffer, either
                    // fully or by the admitted overlap displacement.
                    let prior_entry = self.entries[prior as usize];
                    let bump =
                        self.offset_after(prior_entry.offset, prior_entry.buffer_index, buffer_id);
                    candidate_offset = candidate_offset.max(bump);
                }

                if next == NO_ENTRY {
                    // End of the list; appending here is always valid.
                    break;
                }

                let next_entry = self.entries[next as usize];
                if next_entry.offset >= candidate_offset {
                    let gap = next_entry.offset - candidate_offset;
                    let wanted = self.wanted_gap(next_entry.buffer_index, buffer_id);
                    if gap >= wanted {
                        // Big enough gap below this neighbour, take it.
                        break;
                    }
                }
                prior = next;
            }
        }

        self.buffer_offsets[buffer_id] = candidate_offset;
        tracing::trace!(
            buffer = buffer_id,
            offset = candidate_offset,
            size = current.size,
            "buffer placed"
        );
        self.insert_entry(buffer_id, candidate_offset);
    }

    /// Link a new entry at the position its offset dictates. Entries with
    /// equal offsets keep insertion order; a strictly smaller offset
    /// becomes the new head.
    fn insert_entry(&mut self, buffer_id: usize, offset: usize) {
        let new_index = self.next_free_entry as i32;
        self.entries[self.next_free_entry] = ListEntry {
            offset,
            buffer_index: buffer_id,
            next_index: NO_ENTRY,
        };
        self.next_free_entry += 1;

        if self.first_entry_index == NO_ENTRY {
            self.first_entry_index = new_index;
            return;
        }
        if self.entries[self.first_entry_index as usize].offset > offset {
            self.entries[new_index as usize].next_index = self.first_entry_index;
            self.first_entry_index = new_index;
            return;
        }

        let mut current = self.first_entry_index as usize;
        loop {
            let next_index = self.entries[current].next_index;
            if next_index == NO_ENTRY {
                // End of the list, append here.
                self.entries[current].next_index = new_index;
                break;
            }
            if self.entries[next_index as usize].offset > offset {
                // Insertion point that retains the offset ordering.
                self.entries[new_index as usize].next_index = next_index;
                self.entries[current].next_index = new_index;
                break;
            }
            current = next_index as usize;
        }
    }

    /// Compute the plan if registration has outdated it. Invoked by every
    /// query, so placement stays lazy and idempotent.
    pub(crate) fn calculate_offsets_if_needed(&mut self) {
        if self.plan_state == PlanState::Clean {
            return;
        }
        if self.buffer_count == 0 {
            self.plan_state = PlanState::Clean;
            return;
        }

        // Reversal decisions belong to this plan, not a previous one.
        for operator in self.operators.iter_mut() {
            operator.reverse = false;
        }

        self.partition_for_placement();

        self.first_entry_index = NO_ENTRY;
        self.next_free_entry = 0;
        for idx in 0..self.buffer_count {
            let buffer_id = self.ids_sorted[idx];
            self.place_buffer(buffer_id);
        }

        self.plan_state = PlanState::Clean;
        tracing::debug!(buffers = self.buffer_count, "memory plan calculated");
    }
}
