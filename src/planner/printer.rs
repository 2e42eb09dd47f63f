//! ASCII memory-map printer
//!
//! Renders the plan as one line per operator step: 80 columns spanning
//! the arena, `.` for free bytes, the buffer's ordinal character where it
//! is resident, `!` where more than one buffer claims the same column,
//! and the step's total live memory at the end of the line. Output goes
//! through the logger.

use super::records::OFFSET_UNASSIGNED;
use super::TopologicalPlanner;

const LINE_WIDTH: usize = 80;

/// Character identifying a numbered buffer in the chart.
fn ordinal_character(index: usize) -> u8 {
    match index {
        0..=9 => b'0' + index as u8,
        10..=35 => b'a' + (index as u8 - 10),
        36..=61 => b'A' + (index as u8 - 36),
        _ => b'*',
    }
}

impl TopologicalPlanner<'_> {
    /// Log a per-buffer summary followed by the time x memory chart.
    pub fn print_memory_plan(&mut self) {
        self.calculate_offsets_if_needed();

        for id in 0..self.buffer_count {
            let requirements = self.requirements[id];
            tracing::info!(
                "{} (id={}): size={}, offset={}, first_used={} last_used={}",
                ordinal_character(id) as char,
                id,
                requirements.size,
                self.buffer_offsets[id],
                requirements.first_step,
                requirements.last_step
            );
        }

        let mut max_size = LINE_WIDTH;
        let mut max_time = 0;
        for id in 0..self.buffer_count {
            let requirements = self.requirements[id];
            let offset = self.buffer_offsets[id];
            if offset == OFFSET_UNASSIGNED {
                continue;
            }
            max_size = max_size.max(offset + requirements.size);
            max_time = max_time.max(requirements.last_step);
        }

        let mut line = [b'.'; LINE_WIDTH];
        for step in 0..=max_time {
            line.fill(b'.');
            let mut memory_use = 0;
            for id in 0..self.buffer_count {
                let requirements = self.requirements[id];
                if step < requirements.first_step || step > requirements.last_step {
                    continue;
                }
                let offset = self.buffer_offsets[id];
                if offset == OFFSET_UNASSIGNED {
                    continue;
                }
                memory_use += requirements.size;
                let line_start = offset * LINE_WIDTH / max_size;
                let line_end = (offset + requirements.size) * LINE_WIDTH / max_size;
                for cell in line[line_start..line_end].iter_mut() {
                    *cell = if *cell == b'.' {
                        ordinal_character(id)
                    } else {
                        b'!'
                    };
                }
            }
            tracing::info!(
                "{:2}: {} ({}k)",
                step,
                core::str::from_utf8(&line).unwrap_or(""),
                (memory_use + 1023) / 1024
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::TopologicalPlanner;
    use crate::scratch::required_scratch_bytes;

    #[test]
    fn test_ordinal_character_ranges() {
        assert_eq!(ordinal_character(0), b'0');
        assert_eq!(ordinal_character(9), b'9');
        assert_eq!(ordinal_character(10), b'a');
        assert_eq!(ordinal_character(35), b'z');
        assert_eq!(ordinal_character(36), b'A');
        assert_eq!(ordinal_character(61), b'Z');
        assert_eq!(ordinal_character(62), b'*');
        assert_eq!(ordinal_character(500), b'*');
    }

    #[test]
    fn test_print_handles_empty_and_populated_plans() {
        let mut scratch = vec![0u8; required_scratch_bytes(2, 1)];
        let mut planner = TopologicalPlanner::new(&mut scratch, 1);
        planner.print_memory_plan();

        planner.add_buffer(64, 0, 1, &[], &[]).unwrap();
        planner.add_buffer(32, 1, 2, &[], &[]).unwrap();
        planner.print_memory_plan();
    }
}
