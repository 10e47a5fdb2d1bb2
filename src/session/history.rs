//! Undo/redo history over whole-document snapshots.

use crate::script::model::ScriptRoot;

/// Maximum number of undo entries retained; the oldest are evicted first.
pub const HISTORY_CAPACITY: usize = 50;

/// Bounded double-stack undo/redo history.
///
/// Holds the last committed snapshot plus an undo stack of older states
/// and a redo stack of states superseded by undo. Snapshot granularity is
/// the whole document; selection and other view state are not part of a
/// snapshot. Owned by one editing session and reset at document load.
#[derive(Debug, Clone)]
pub struct EditorHistory {
    current: ScriptRoot,
    undo_stack: Vec<ScriptRoot>,
    redo_stack: Vec<ScriptRoot>,
}

impl EditorHistory {
    /// Creates a history anchored at the given initial state.
    pub fn new(initial: ScriptRoot) -> Self {
        Self {
            current: initial,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Commits a new document state.
    ///
    /// A state equal to the current snapshot is suppressed (focus changes
    /// and other non-content mutations commit nothing). Otherwise the old
    /// current state moves onto the undo stack (evicting the oldest entry
    /// past capacity) and the redo stack is cleared. Returns whether a
    /// snapshot was taken.
    pub fn commit(&mut self, new_state: ScriptRoot) -> bool {
        if new_state == self.current {
            return false;
        }
        self.undo_stack.push(std::mem::replace(&mut self.current, new_state));
        if self.undo_stack.len() > HISTORY_CAPACITY {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        true
    }

    /// Steps back one snapshot. Returns the restored state for the caller
    /// to apply, or `None` when the undo stack is empty (a no-op, not an
    /// error).
    pub fn undo(&mut self) -> Option<ScriptRoot> {
        let restored = self.undo_stack.pop()?;
        self.redo_stack
            .push(std::mem::replace(&mut self.current, restored));
        Some(self.current.clone())
    }

    /// Steps forward one snapshot undone earlier. Returns the restored
    /// state, or `None` when the redo stack is empty.
    pub fn redo(&mut self) -> Option<ScriptRoot> {
        let restored = self.redo_stack.pop()?;
        self.undo_stack
            .push(std::mem::replace(&mut self.current, restored));
        Some(self.current.clone())
    }

    /// True when an undo step is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// True when a redo step is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of retained undo entries.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of retained redo entries.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The last committed snapshot.
    pub fn current(&self) -> &ScriptRoot {
        &self.current
    }

    /// Drops both stacks and re-anchors at a new initial state. Used at
    /// session/document load.
    pub fn reset(&mut self, initial: ScriptRoot) {
        self.current = initial;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::model::Scene;

    fn state_with_location(location: &str) -> ScriptRoot {
        let mut root = ScriptRoot::new();
        root.scene_order.push("s-1".to_string());
        root.scenes
            .insert("s-1".to_string(), Scene::new().with_location(location));
        root.renumber();
        root
    }

    #[test]
    fn test_commit_undo_redo() {
        let mut history = EditorHistory::new(state_with_location("a"));
        assert!(history.commit(state_with_location("b")));
        assert!(history.commit(state_with_location("c")));

        let restored = history.undo().unwrap();
        assert_eq!(restored.scenes["s-1"].location, "b");
        let restored = history.undo().unwrap();
        assert_eq!(restored.scenes["s-1"].location, "a");
        assert!(history.undo().is_none());

        let restored = history.redo().unwrap();
        assert_eq!(restored.scenes["s-1"].location, "b");
        let restored = history.redo().unwrap();
        assert_eq!(restored.scenes["s-1"].location, "c");
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_redundant_commit_is_suppressed() {
        let mut history = EditorHistory::new(state_with_location("a"));
        assert!(!history.commit(state_with_location("a")));
        assert_eq!(history.undo_depth(), 0);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_commit_clears_redo_stack() {
        let mut history = EditorHistory::new(state_with_location("a"));
        history.commit(state_with_location("b"));
        history.undo().unwrap();
        assert!(history.can_redo());

        history.commit(state_with_location("c"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        // 60 commits from an initial state: 50 older states retained, the
        // earliest ten (initial plus commits 1-9) evicted.
        let mut history = EditorHistory::new(state_with_location("state-0"));
        for i in 1..=60 {
            history.commit(state_with_location(&format!("state-{}", i)));
        }
        assert_eq!(history.undo_depth(), HISTORY_CAPACITY);

        let mut last = None;
        while let Some(state) = history.undo() {
            last = Some(state);
        }
        // Undo bottoms out at the oldest retained state, not the original.
        assert_eq!(last.unwrap().scenes["s-1"].location, "state-10");
    }

    #[test]
    fn test_reset_drops_stacks() {
        let mut history = EditorHistory::new(state_with_location("a"));
        history.commit(state_with_location("b"));
        history.undo().unwrap();

        history.reset(state_with_location("fresh"));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.current().scenes["s-1"].location, "fresh");
    }
}
