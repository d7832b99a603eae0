//! Per-player undo/redo stacks of journal generations.

use crate::undo::UndoState;

/// Owns the undo history for one player session. Each completed draw
/// pushes one journal generation; undoing pops it and the replay's own
/// journal becomes the redo generation.
pub struct Player {
    pub name: String,
    undo_stack: Vec<UndoState>,
    redo_stack: Vec<UndoState>,
    max_depth: usize,
}

impl Player {
    pub fn new(name: impl Into<String>, max_depth: usize) -> Self {
        Self {
            name: name.into(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record a finished draw's journal. A fresh action invalidates any
    /// redo history, same as every editor.
    pub fn record_draw(&mut self, journal: UndoState) {
        if journal.is_empty() {
            return;
        }
        self.redo_stack.clear();
        self.undo_stack.push(journal);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the newest undo generation for replay; None when exhausted.
    pub fn undo_begin(&mut self) -> Option<UndoState> {
        self.undo_stack.pop()
    }

    /// Store the journal produced while undoing, enabling redo.
    pub fn record_undo(&mut self, journal: UndoState) {
        if !journal.is_empty() {
            self.redo_stack.push(journal);
        }
    }

    /// Pop the newest redo generation for replay; None when exhausted.
    pub fn redo_begin(&mut self) -> Option<UndoState> {
        self.redo_stack.pop()
    }

    /// Store the journal produced while redoing, re-enabling undo without
    /// clearing the remaining redo history.
    pub fn record_redo(&mut self, journal: UndoState) {
        if !journal.is_empty() {
            self.undo_stack.push(journal);
            if self.undo_stack.len() > self.max_depth {
                self.undo_stack.remove(0);
            }
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_geom::Vec3I;
    use carve_map::Block;

    fn journal_of(n: usize) -> UndoState {
        let mut j = UndoState::new();
        for i in 0..n {
            j.append(Vec3I::new(i as i32, 0, 0), Block::new(1));
        }
        j
    }

    #[test]
    fn depth_limit_discards_oldest_generation() {
        let mut p = Player::new("alice", 2);
        p.record_draw(journal_of(1));
        p.record_draw(journal_of(2));
        p.record_draw(journal_of(3));
        assert_eq!(p.undo_depth(), 2);
        assert_eq!(p.undo_begin().unwrap().len(), 3);
        assert_eq!(p.undo_begin().unwrap().len(), 2);
        assert!(p.undo_begin().is_none());
    }

    #[test]
    fn new_draw_clears_redo_history() {
        let mut p = Player::new("bob", 8);
        p.record_draw(journal_of(4));
        let generation = p.undo_begin().unwrap();
        p.record_undo(generation);
        assert_eq!(p.redo_depth(), 1);
        p.record_draw(journal_of(1));
        assert_eq!(p.redo_depth(), 0);
    }

    #[test]
    fn empty_journals_are_not_recorded() {
        let mut p = Player::new("carol", 4);
        p.record_draw(UndoState::new());
        assert_eq!(p.undo_depth(), 0);
    }
}
