//! Core record types for the planner
//!
//! Everything here is `Copy` plain data so it can live inside the
//! arena-carved working arrays. Linked structure is expressed with array
//! indices and `-1` sentinels rather than pointers, which keeps the
//! planner state trivially relocatable as a byte image.

/// Sentinel: the planner chooses this buffer's offset.
pub const OFFLINE_UNPLANNED: usize = usize::MAX;

/// Sentinel: no offset assigned yet.
pub const OFFSET_UNASSIGNED: usize = usize::MAX;

/// End-of-list sentinel for the offset-ordered entry chain.
pub(crate) const NO_ENTRY: i32 = -1;

/// Geometry of a convolution, as the planner needs it: enough to decide
/// how far an in-place output must trail its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvGeometry {
    pub input_height: u32,
    pub input_width: u32,
    pub input_channels: u32,
    pub filter_height: u32,
    pub filter_width: u32,
    pub output_height: u32,
    pub output_width: u32,
    pub output_channels: u32,
    pub stride_height: u32,
    pub stride_width: u32,
    pub padding: u32,
}

/// Operator kind tag. `Other` carries no parameters and admits no
/// overlap; new kinds extend the overlap policy, never the placer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorKind {
    /// Convolution; output may partially alias the input.
    Conv2d(ConvGeometry),
    /// Element-wise add; output may fully alias the input.
    Add,
    /// Element-wise multiply.
    Mul,
    /// Anything the policy knows nothing about.
    #[default]
    Other,
}

impl OperatorKind {
    /// Whether this kind is in the overlap-admitted set.
    pub(crate) fn admits_overlap(&self) -> bool {
        matches!(self, OperatorKind::Conv2d(_) | OperatorKind::Add)
    }
}

/// One registered operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorRecord {
    pub kind: OperatorKind,
    /// Set during placement when an admitted overlap requires the kernel
    /// to iterate output positions last-to-first.
    pub reverse: bool,
}

/// Client-provided facts about one buffer. Consumer/producer relations
/// live in flat flag rows beside this, one slot per operator.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BufferRequirements {
    pub size: usize,
    pub first_step: u32,
    pub last_step: u32,
    pub offline_offset: usize,
}

impl BufferRequirements {
    pub(crate) const EMPTY: Self = Self {
        size: 0,
        first_step: 0,
        last_step: 0,
        offline_offset: OFFLINE_UNPLANNED,
    };

    /// Whether this buffer is live anywhere inside `[first_step, last_step]`.
    pub(crate) fn overlaps_in_time(&self, first_step: u32, last_step: u32) -> bool {
        self.first_step <= last_step && first_step <= self.last_step
    }

    pub(crate) fn is_pinned(&self) -> bool {
        self.offline_offset != OFFLINE_UNPLANNED
    }
}

/// Node of the offset-ordered placement list, held in an arena-carved
/// array. `next_index == NO_ENTRY` terminates the chain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ListEntry {
    pub offset: usize,
    pub buffer_index: usize,
    pub next_index: i32,
}

impl ListEntry {
    pub(crate) const UNUSED: Self = Self {
        offset: 0,
        buffer_index: 0,
        next_index: NO_ENTRY,
    };
}

/// Plan freshness. Registration dirties the plan; every query cleans it
/// through `calculate_offsets_if_needed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlanState {
    /// Nothing registered since construction.
    Fresh,
    /// Registration happened after the last placement.
    Dirty,
    /// Offsets reflect everything registered.
    Clean,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_overlap() {
        let req = BufferRequirements {
            size: 8,
            first_step: 2,
            last_step: 5,
            offline_offset: OFFLINE_UNPLANNED,
        };
        assert!(req.overlaps_in_time(5, 9));
        assert!(req.overlaps_in_time(0, 2));
        assert!(req.overlaps_in_time(3, 4));
        assert!(!req.overlaps_in_time(6, 9));
        assert!(!req.overlaps_in_time(0, 1));
    }

    #[test]
    fn test_admitted_kinds() {
        let geometry = ConvGeometry {
            input_height: 1,
            input_width: 1,
            input_channels: 1,
            filter_height: 1,
            filter_width: 1,
            output_height: 1,
            output_width: 1,
            output_channels: 1,
            stride_height: 1,
            stride_width: 1,
            padding: 0,
        };
        assert!(OperatorKind::Conv2d(geometry).admits_overlap());
        assert!(OperatorKind::Add.admits_overlap());
        assert!(!OperatorKind::Mul.admits_overlap());
        assert!(!OperatorKind::Other.admits_overlap());
    }
}
