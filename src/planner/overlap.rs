//! Overlap admission policy
//!
//! Two time-overlapping buffers normally need disjoint byte ranges. The
//! exception is an operator whose data flow proves partial aliasing safe:
//! the output of an element-wise add may sit exactly on its input, and
//! the output of a convolution may trail its input by a computed lead
//! without any read happening after the overwrite. The admission is
//! pairwise and applies only to the matching producer relationship: the
//! prior buffer must be an input of an operator the candidate is an
//! output of, and the input's last use must be the step that produces the
//! candidate (after that step the input is dead).

use super::records::{ConvGeometry, OperatorKind};
use super::TopologicalPlanner;

impl ConvGeometry {
    /// Forward-padding length: the smallest lead, in bytes, such that an
    /// output laid out that far after the input base can be produced in
    /// natural raster order without overwriting any input element before
    /// its last dependent output has been computed.
    ///
    /// Walks input coordinates in row-major order keeping a cursor one
    /// past the highest output byte any remaining read depends on; each
    /// input element then reserves its own bytes behind the cursor.
    /// Whatever the cursor overshoots the input extent by is the lead.
    pub fn forward_padding_len(&self) -> usize {
        let out_h = i64::from(self.output_height);
        let out_w = i64::from(self.output_width);
        let out_c = i64::from(self.output_channels);
        let in_c = i64::from(self.input_channels);
        let pad = i64::from(self.padding);
        let stride_h = i64::from(self.stride_height).max(1);
        let stride_w = i64::from(self.stride_width).max(1);

        let mut end: i64 = 0;
        for ih in 0..i64::from(self.input_height) {
            // Highest output row reading input row ih.
            let child_h = ((ih + pad) / stride_h).clamp(0, (out_h - 1).max(0));
            for iw in 0..i64::from(self.input_width) {
                let child_w = ((iw + pad) / stride_w).clamp(0, (out_w - 1).max(0));
                // One past the last dependent output element, so the
                // write never lands on bytes still to be read.
                let last_dependent_end = (child_h * out_w + child_w + 1) * out_c;
                end = end.max(last_dependent_end);
                end += in_c;
            }
        }

        let input_len =
            i64::from(self.input_height) * i64::from(self.input_width) * in_c;
        (end - input_len).max(0) as usize
    }
}

impl TopologicalPlanner<'_> {
    /// The operator under which `current` may alias `prior`, if any:
    /// `prior` is an input of an admitted-kind operator that produces
    /// `current`, and `prior`'s last read is `current`'s first write.
    /// The first matching operator id wins.
    pub(crate) fn overlap_admitted_operator(
        &self,
        prior_id: usize,
        current_id: usize,
    ) -> Option<usize> {
        let prior = self.requirements[prior_id];
        let current = self.requirements[current_id];
        if prior.last_step != current.first_step {
            return None;
        }
        (0..self.operator_count).find(|&op| {
            self.producer_flag(current_id, op)
                && self.operators[op].kind.admits_overlap()
                && self.consumer_flag(prior_id, op)
        })
    }

    /// Displacement of the admitted output above the input base. Zero for
    /// in-place add; for convolution the forward-padding length
    /// reconciled against the two buffer sizes, floored at zero.
    pub(crate) fn admitted_displacement(
        &self,
        operator_id: usize,
        prior_id: usize,
        current_id: usize,
    ) -> usize {
        match self.operators[operator_id].kind {
            OperatorKind::Add => 0,
            OperatorKind::Conv2d(geometry) => {
                let lead = geometry.forward_padding_len() as i64;
                let prior_size = self.requirements[prior_id].size as i64;
                let current_size = self.requirements[current_id].size as i64;
                (lead + prior_size - current_size).max(0) as usize
            }
            // Non-admitted kinds never reach here.
            _ => self.requirements[prior_id].size,
        }
    }

    /// Lowest admissible offset for `current` directly against the
    /// already-placed `prior`. Defaults to stacking past the prior; under
    /// admission the displacement may be smaller, in which case a
    /// positive conv displacement flips the operator to reversed
    /// iteration so outputs are written last-to-first.
    pub(crate) fn offset_after(
        &mut self,
        prior_offset: usize,
        prior_id: usize,
        current_id: usize,
    ) -> usize {
        if let Some(op) = self.overlap_admitted_operator(prior_id, current_id) {
            let displacement = self.admitted_displacement(op, prior_id, current_id);
            // A displacement past the prior's extent yields no benefit
            // over plain disjoint stacking.
            if displacement < self.requirements[prior_id].size {
                if displacement > 0 {
                    self.operators[op].reverse = true;
                }
                return prior_offset + displacement;
            }
        }
        prior_offset + self.requirements[prior_id].size
    }

    /// Gap the candidate needs below the next offset-ordered neighbour.
    /// Normally its full size; when the neighbour is the input of the
    /// operator producing the candidate, the candidate may tuck below it
    /// keeping only the admitted lead, and natural-order iteration stays
    /// read-safe (no reversal on this path).
    pub(crate) fn wanted_gap(&self, next_id: usize, current_id: usize) -> usize {
        let wanted_size = self.requirements[current_id].size;
        match self.overlap_admitted_operator(next_id, current_id) {
            Some(op) => match self.operators[op].kind {
                OperatorKind::Add => 0,
                OperatorKind::Conv2d(geometry) => geometry.forward_padding_len(),
                _ => wanted_size,
            },
            None => wanted_size,
        }
    }
}
