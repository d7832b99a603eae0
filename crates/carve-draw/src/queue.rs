//! Per-world draw-operation queue, pumped once per tick.

use std::time::Duration;

use carve_map::Map;

use crate::op::{DrawOpError, DrawOpKind, DrawOperation};
use crate::undo::UndoState;

/// What a finished operation leaves behind for the caller.
pub struct CompletedDraw {
    pub kind: DrawOpKind,
    pub blocks_processed: u64,
    pub blocks_updated: u64,
    pub elapsed: Duration,
    pub undo: UndoState,
}

/// Registered operations awaiting batches. The per-tick budget is split
/// evenly across everything pending, so one huge sphere never starves a
/// short line queued after it.
#[derive(Default)]
pub struct DrawQueue {
    ops: Vec<DrawOperation>,
    completed: Vec<CompletedDraw>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation for batch execution. It must have begun.
    pub fn queue(&mut self, op: DrawOperation) -> Result<(), DrawOpError> {
        if !op.has_begun() {
            return Err(DrawOpError::NotBegun);
        }
        log::debug!(
            target: "draw",
            "queued {} over {} cells (estimate {})",
            op.kind(),
            op.bounds().volume(),
            op.blocks_total_estimate()
        );
        self.ops.push(op);
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.ops.len()
    }

    /// Run one batch round writing at most `per_tick_budget` blocks in
    /// total. The budget splits evenly across pending operations; when more
    /// ops are pending than the budget covers, the unserved ones move to
    /// the front for the next tick. Returns how many blocks were written.
    pub fn run_batches(&mut self, map: &mut Map, per_tick_budget: usize) -> usize {
        if self.ops.is_empty() || per_tick_budget == 0 {
            return 0;
        }
        let share = (per_tick_budget / self.ops.len()).max(1);
        let mut budget_left = per_tick_budget;
        let mut written = 0;
        let mut served = Vec::with_capacity(self.ops.len());
        let mut unserved = Vec::new();
        for mut op in self.ops.drain(..) {
            let allow = share.min(budget_left);
            if allow == 0 {
                unserved.push(op);
                continue;
            }
            let n = op.draw_batch(map, allow);
            budget_left -= n;
            written += n;
            if op.is_done() {
                let elapsed = op
                    .start_time()
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::ZERO);
                log::info!(
                    target: "draw",
                    "{} finished: {} visited, {} changed in {:?}",
                    op.kind(),
                    op.blocks_processed(),
                    op.blocks_updated(),
                    elapsed
                );
                self.completed.push(CompletedDraw {
                    kind: op.kind(),
                    blocks_processed: op.blocks_processed(),
                    blocks_updated: op.blocks_updated(),
                    elapsed,
                    undo: op.take_undo(),
                });
            } else {
                served.push(op);
            }
        }
        unserved.extend(served);
        self.ops = unserved;
        written
    }

    /// Drain results of operations that finished since the last call.
    pub fn take_completed(&mut self) -> Vec<CompletedDraw> {
        std::mem::take(&mut self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::SolidBrush;
    use crate::op::BeginHooks;
    use carve_geom::Vec3I;
    use carve_map::Block;

    fn begun_line(map: &Map, a: Vec3I, b: Vec3I, id: u8) -> DrawOperation {
        let mut op = DrawOperation::line(Box::new(SolidBrush::new(Block::new(id))));
        assert!(op.prepare(map, &[a, b]).unwrap());
        assert!(op.begin(&mut BeginHooks::new()).unwrap());
        op
    }

    #[test]
    fn queue_rejects_unbegun_operations() {
        let map = Map::new(8, 8, 8);
        let mut queue = DrawQueue::new();
        let mut op = DrawOperation::line(Box::new(SolidBrush::new(Block::new(1))));
        op.prepare(&map, &[Vec3I::ZERO, Vec3I::new(2, 0, 0)]).unwrap();
        assert!(matches!(queue.queue(op), Err(DrawOpError::NotBegun)));
    }

    #[test]
    fn budget_is_shared_and_ops_retire_when_done() {
        let mut map = Map::new(32, 32, 32);
        let mut queue = DrawQueue::new();
        queue
            .queue(begun_line(&map, Vec3I::new(0, 0, 0), Vec3I::new(9, 0, 0), 1))
            .unwrap();
        queue
            .queue(begun_line(&map, Vec3I::new(0, 5, 0), Vec3I::new(9, 5, 0), 2))
            .unwrap();
        assert_eq!(queue.pending(), 2);

        let mut ticks = 0;
        while queue.pending() > 0 {
            let written = queue.run_batches(&mut map, 4);
            assert!(written <= 4);
            ticks += 1;
            assert!(ticks < 100, "queue failed to drain");
        }
        // Both 10-cell lines landed in full.
        assert_eq!(map.count_non_air(), 20);
        let done = queue.take_completed();
        assert_eq!(done.len(), 2);
        assert!(done.iter().all(|c| c.blocks_updated == 10));
        // Ten changed cells per op means ten journal entries each.
        assert!(done.iter().all(|c| c.undo.len() == 10));
        assert!(queue.take_completed().is_empty());
    }

    #[test]
    fn oversubscribed_tick_never_exceeds_total_budget() {
        let mut map = Map::new(32, 32, 32);
        let mut queue = DrawQueue::new();
        // Four 4-cell lines but only 2 writes per tick: every tick must
        // stay under the cap, and every op must still retire eventually.
        for (i, id) in (1u8..=4).enumerate() {
            let y = i as i32;
            queue
                .queue(begun_line(&map, Vec3I::new(0, y, 0), Vec3I::new(3, y, 0), id))
                .unwrap();
        }
        let mut ticks = 0;
        while queue.pending() > 0 {
            assert!(queue.run_batches(&mut map, 2) <= 2);
            ticks += 1;
            assert!(ticks < 100, "queue failed to drain");
        }
        assert_eq!(map.count_non_air(), 16);
        assert_eq!(queue.take_completed().len(), 4);
    }
}
