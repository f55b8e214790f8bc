use defmt::debug;

use generic::collaborators::{Block, Planner};
use generic::step_plan::should_queue;

use crate::motion::engine::with_engine;

/// Protocol side of the block buffer.
pub struct BlockPlanner {
    // end point of the last queued line, machine mm
    position: [f64; 3],
}

impl BlockPlanner {
    pub fn new(position: [f64; 3]) -> Self {
        BlockPlanner { position }
    }
}

impl Planner for BlockPlanner {
    fn try_push(&mut self, block: Block) -> Result<(), Block> {
        if !should_queue(self.position, &block) {
            debug!("[PLANNER] zero length line skipped");
            return Ok(());
        }
        with_engine(|e| e.push(block)).unwrap_or(Err(block))?;
        if let Block::Line { target, .. } = block {
            self.position = target;
        }
        Ok(())
    }

    fn blocks_available(&self) -> bool {
        with_engine(|e| e.is_busy()).unwrap_or(false)
    }

    fn reset_block_buffer(&mut self) {
        with_engine(|e| e.clear_queue());
    }

    fn set_position(&mut self, position: [f64; 3]) {
        self.position = position;
    }
}
