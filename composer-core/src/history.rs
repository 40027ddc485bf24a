//! Bounded undo/redo history of document snapshots.
//!
//! ## Usage
//!
//! ```text
//! 1. commit(state)         -> present moves to past, future is cleared
//! 2. commit_silent(state)  -> present is replaced, no undo step is created
//! 3. undo() / redo()       -> present rotates between past and future
//! ```
//!
//! Snapshots are owned values. Callers hand over a clone of their live model,
//! so later edits to the model never reach a stored snapshot.

use std::collections::VecDeque;

/// Maximum number of undo steps kept by default.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// How a new state enters the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// A discrete edit: creates an undo step.
    #[default]
    Checkpoint,
    /// A transient update (e.g. mid-drag): replaces `present` only.
    Silent,
}

/// Counts describing the current history stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryInfo {
    /// Whether undo is available.
    pub can_undo: bool,
    /// Whether redo is available.
    pub can_redo: bool,
    /// Number of undo steps.
    pub past_count: usize,
    /// Number of redo steps.
    pub future_count: usize,
}

/// Past/present/future snapshot stacks with a bounded past.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    present: T,
    future: VecDeque<T>,
    max_depth: usize,
    /// `present` as it was before the first of a run of silent commits.
    silent_base: Option<T>,
}

impl<T: Clone> History<T> {
    /// Start a history at `initial` with the default depth.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self::with_max_depth(initial, DEFAULT_MAX_DEPTH)
    }

    /// Start a history keeping at most `max_depth` undo steps.
    #[must_use]
    pub fn with_max_depth(initial: T, max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            max_depth,
            silent_base: None,
        }
    }

    /// The current state.
    #[must_use]
    pub fn present(&self) -> &T {
        &self.present
    }

    /// The state the next undo step will restore to: `present`, or the state
    /// before a pending run of silent commits.
    #[must_use]
    pub fn checkpoint(&self) -> &T {
        self.silent_base.as_ref().unwrap_or(&self.present)
    }

    /// Whether silent commits are waiting for a checkpoint.
    #[must_use]
    pub const fn has_pending_silent(&self) -> bool {
        self.silent_base.is_some()
    }

    /// Record `state` as a new undo step.
    ///
    /// If silent commits preceded this one, the step restores the state from
    /// before the first of them.
    pub fn commit(&mut self, state: T) {
        let previous = std::mem::replace(&mut self.present, state);
        let base = self.silent_base.take().unwrap_or(previous);
        self.push_past(base);
        self.future.clear();
    }

    /// Replace `present` without touching `past` or `future`.
    pub fn commit_silent(&mut self, state: T) {
        let previous = std::mem::replace(&mut self.present, state);
        if self.silent_base.is_none() {
            self.silent_base = Some(previous);
        }
    }

    /// Commit with an explicit mode.
    pub fn commit_with(&mut self, state: T, mode: CommitMode) {
        match mode {
            CommitMode::Checkpoint => self.commit(state),
            CommitMode::Silent => self.commit_silent(state),
        }
    }

    /// Step back. Returns the restored state, or `None` if there is no past.
    pub fn undo(&mut self) -> Option<&T> {
        let previous = self.past.pop_back()?;
        self.silent_base = None;
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        Some(&self.present)
    }

    /// Step forward. Returns the restored state, or `None` if there is no future.
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.future.pop_front()?;
        self.silent_base = None;
        let current = std::mem::replace(&mut self.present, next);
        self.push_past(current);
        Some(&self.present)
    }

    /// Whether there is a step to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether there is a step to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo steps.
    #[must_use]
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of redo steps.
    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Maximum number of undo steps retained.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Summary of the stacks.
    #[must_use]
    pub fn info(&self) -> HistoryInfo {
        HistoryInfo {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            past_count: self.past.len(),
            future_count: self.future.len(),
        }
    }

    /// Drop all undo and redo steps, keeping `present`.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.silent_base = None;
    }

    /// Start over from `state` with empty stacks.
    pub fn reset(&mut self, state: T) {
        self.clear();
        self.present = state;
    }

    fn push_past(&mut self, state: T) {
        if self.max_depth == 0 {
            return;
        }
        self.past.push_back(state);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_is_empty() {
        let history = History::new(0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(*history.present(), 0);
        assert_eq!(history.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_commit_then_undo_redo() {
        let mut history = History::new(0);
        history.commit(1);
        history.commit(2);
        assert_eq!(history.past_len(), 2);

        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.future_len(), 1);
        assert_eq!(history.undo(), Some(&0));
        assert_eq!(history.undo(), None);
        assert_eq!(*history.present(), 0);

        assert_eq!(history.redo(), Some(&1));
        assert_eq!(history.redo(), Some(&2));
        assert_eq!(history.redo(), None);
        assert_eq!(*history.present(), 2);
    }

    #[test]
    fn test_commit_clears_future() {
        let mut history = History::new(0);
        history.commit(1);
        history.undo();
        assert!(history.can_redo());
        history.commit(5);
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(&0));
    }

    #[test]
    fn test_past_is_bounded() {
        let mut history = History::with_max_depth(0, 50);
        for i in 1..=60 {
            history.commit(i);
            assert!(history.past_len() <= 50);
        }
        assert_eq!(history.past_len(), 50);

        let mut oldest = *history.present();
        while let Some(state) = history.undo() {
            oldest = *state;
        }
        // States 0..=9 were discarded.
        assert_eq!(oldest, 10);
    }

    #[test]
    fn test_zero_depth_keeps_no_undo_steps() {
        let mut history = History::with_max_depth("a", 0);
        history.commit("b");
        assert!(!history.can_undo());
        assert_eq!(*history.present(), "b");
    }

    #[test]
    fn test_silent_commits_collapse_into_one_step() {
        let mut history = History::new(0);
        history.commit(1);
        for i in 100..110 {
            history.commit_silent(i);
        }
        assert_eq!(history.past_len(), 1);
        assert_eq!(*history.present(), 109);

        history.commit(2);
        assert_eq!(history.past_len(), 2);
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), Some(&0));
    }

    #[test]
    fn test_silent_commit_keeps_future() {
        let mut history = History::new(0);
        history.commit(1);
        history.undo();
        history.commit_with(7, CommitMode::Silent);
        assert!(history.can_redo());
        assert_eq!(history.redo(), Some(&1));
    }

    #[test]
    fn test_undo_drops_pending_silent_base() {
        let mut history = History::new(0);
        history.commit(1);
        history.commit_silent(50);
        history.undo();
        assert_eq!(*history.present(), 0);
        history.commit(3);
        // The step restores 0, not the abandoned silent base.
        assert_eq!(history.undo(), Some(&0));
    }

    #[test]
    fn test_info_and_clear() {
        let mut history = History::new(0);
        history.commit(1);
        history.commit(2);
        history.undo();
        assert_eq!(
            history.info(),
            HistoryInfo {
                can_undo: true,
                can_redo: true,
                past_count: 1,
                future_count: 1,
            }
        );
        history.clear();
        assert_eq!(*history.present(), 1);
        assert!(!history.can_undo() && !history.can_redo());

        history.reset(9);
        assert_eq!(*history.present(), 9);
    }

    #[test]
    fn test_checkpoint_tracks_silent_base() {
        let mut history = History::new(0);
        history.commit(1);
        assert_eq!(*history.checkpoint(), 1);
        assert!(!history.has_pending_silent());

        history.commit_silent(5);
        history.commit_silent(6);
        assert!(history.has_pending_silent());
        assert_eq!(*history.checkpoint(), 1);
        assert_eq!(*history.present(), 6);

        history.commit(6);
        assert!(!history.has_pending_silent());
        assert_eq!(history.undo(), Some(&1));
    }
}
