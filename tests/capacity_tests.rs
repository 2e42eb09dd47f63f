//! Scratch-region capacity and sizing tests

use memforge::{
    max_supported_buffers, required_scratch_bytes, MemForgeError, OperatorKind,
    TopologicalPlanner,
};

#[test]
fn test_small_scratch_rejects_second_buffer() {
    // A region sized for exactly one buffer.
    let mut scratch = vec![0u8; required_scratch_bytes(1, 1)];
    let mut planner = TopologicalPlanner::new(&mut scratch, 1);
    assert_eq!(planner.buffer_capacity(), 1);

    planner.add_operator_info(0, OperatorKind::Mul).unwrap();
    planner
        .add_buffer(100, 0, 1, &[true], &[false])
        .unwrap();

    let err = planner
        .add_buffer(50, 2, 3, &[false], &[true])
        .unwrap_err();
    assert_eq!(err, MemForgeError::CapacityExceeded { capacity: 1 });
    assert!(err.is_recoverable());

    // Previously-added state stays valid and queryable.
    assert_eq!(planner.get_buffer_count(), 1);
    assert_eq!(planner.get_offset_for_buffer(0).unwrap(), 0);
    assert_eq!(planner.get_maximum_memory_size(), 100);
}

#[test]
fn test_layout_roundtrip_guarantee() {
    for operators in [1, 4, 16] {
        for buffers in [1, 8, 64] {
            let bytes = required_scratch_bytes(buffers, operators);
            assert!(max_supported_buffers(bytes, operators) >= buffers);

            let mut scratch = vec![0u8; bytes];
            let mut planner = TopologicalPlanner::new(&mut scratch, operators);
            for step in 0..buffers as u32 {
                planner
                    .add_buffer(16, step, step + 1, &[], &[])
                    .unwrap();
            }
        }
    }
}

#[test]
fn test_capacity_scales_with_region() {
    let one = required_scratch_bytes(1, 2);
    let eight = required_scratch_bytes(8, 2);
    assert!(eight > one);

    let mut scratch = vec![0u8; eight];
    let planner = TopologicalPlanner::new(&mut scratch, 2);
    assert!(planner.buffer_capacity() >= 8);
}

#[test]
fn test_zero_capacity_region() {
    let mut scratch = [0u8; 16];
    let mut planner = TopologicalPlanner::new(&mut scratch, 1);
    assert_eq!(planner.buffer_capacity(), 0);
    assert_eq!(
        planner.add_buffer(1, 0, 1, &[], &[]),
        Err(MemForgeError::CapacityExceeded { capacity: 0 })
    );
    assert_eq!(planner.get_maximum_memory_size(), 0);
    assert!(!planner.do_any_buffers_overlap());
}

#[test]
fn test_planner_can_fill_to_capacity() {
    let mut scratch = vec![0u8; required_scratch_bytes(3, 1)];
    let mut planner = TopologicalPlanner::new(&mut scratch, 1);
    let capacity = planner.buffer_capacity();
    assert!(capacity >= 3);

    for step in 0..capacity as u32 {
        planner.add_buffer(8, step, step + 1, &[], &[]).unwrap();
    }
    assert!(planner.add_buffer(8, 0, 1, &[], &[]).is_err());
    assert_eq!(planner.get_buffer_count(), capacity);
}
