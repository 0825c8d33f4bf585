// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded undo/redo stacks with coalescing of edit runs.
//!
//! Entries hold the document as it was before an edit. [`Dom`] clones
//! share every untouched node, so a checkpoint costs one `Vec` of `Rc`s
//! rather than a deep copy of the tree.

use std::collections::VecDeque;

use log::debug;

use crate::command_error::CommandError;
use crate::dom::{Dom, NodeId};
use crate::selection::Selection;

/// One checkpoint: a document and the selection that went with it.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub dom: Dom,
    pub selection: Option<Selection>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Typing,
    Deleting,
}

/// Identifies a run of edits that share one undo entry: the same kind of
/// edit in the same block, with no selection change in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditRun {
    pub kind: EditKind,
    pub target: NodeId,
}

#[derive(Clone, Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_depth: usize,
    coalesce: bool,
    current_run: Option<EditRun>,
}

impl History {
    pub fn new(max_depth: usize, coalesce: bool) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth,
            coalesce,
            current_run: None,
        }
    }

    /// Record the state from before an edit. Always clears the redo stack.
    ///
    /// If `run` continues the current run, nothing is pushed: the entry on
    /// top of the undo stack already holds the state from before the run
    /// started, so undo reverts the whole run at once. Discrete commands
    /// pass `None` and always open a new entry.
    ///
    /// Returns whether a new entry was pushed.
    pub fn record_checkpoint(
        &mut self,
        before: HistoryEntry,
        run: Option<EditRun>,
    ) -> bool {
        self.redo_stack.clear();
        if self.max_depth == 0 {
            self.current_run = None;
            return false;
        }
        if self.coalesce
            && run.is_some()
            && run == self.current_run
            && !self.undo_stack.is_empty()
        {
            debug!("Coalescing edit into current undo entry ({run:?})");
            return false;
        }

        self.undo_stack.push_back(before);
        Self::trim(&mut self.undo_stack, self.max_depth);
        self.current_run = if self.coalesce { run } else { None };
        debug!("Recorded checkpoint, undo depth {}", self.undo_stack.len());
        true
    }

    /// End the current run, so the next edit opens a new entry. Called
    /// whenever the selection moves.
    pub fn break_run(&mut self) {
        self.current_run = None;
    }

    /// Pop the most recent checkpoint. `current` is kept for redo.
    pub fn undo(
        &mut self,
        current: HistoryEntry,
    ) -> Result<HistoryEntry, CommandError> {
        let entry = self
            .undo_stack
            .pop_back()
            .ok_or(CommandError::NothingToUndo)?;
        self.redo_stack.push_back(current);
        Self::trim(&mut self.redo_stack, self.max_depth);
        self.current_run = None;
        Ok(entry)
    }

    /// Pop the most recently undone state. `current` is kept for undo.
    pub fn redo(
        &mut self,
        current: HistoryEntry,
    ) -> Result<HistoryEntry, CommandError> {
        let entry = self
            .redo_stack
            .pop_back()
            .ok_or(CommandError::NothingToRedo)?;
        self.undo_stack.push_back(current);
        Self::trim(&mut self.undo_stack, self.max_depth);
        self.current_run = None;
        Ok(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_run = None;
    }

    fn trim(stack: &mut VecDeque<HistoryEntry>, max_depth: usize) {
        while stack.len() > max_depth {
            stack.pop_front();
            debug!("History full, dropped oldest entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomNode;

    fn entry(text: &str) -> HistoryEntry {
        let mut dom = Dom::new();
        let p = dom.children(dom.root())[0];
        dom.append_node(p, DomNode::new_text(text)).unwrap();
        HistoryEntry {
            dom,
            selection: None,
        }
    }

    fn typing(target: NodeId) -> Option<EditRun> {
        Some(EditRun {
            kind: EditKind::Typing,
            target,
        })
    }

    #[test]
    fn undo_on_empty_history_reports_nothing_to_undo() {
        let mut history = History::new(10, true);
        assert_eq!(history.undo(entry("a")), Err(CommandError::NothingToUndo));
        assert_eq!(history.redo(entry("a")), Err(CommandError::NothingToRedo));
    }

    #[test]
    fn undo_then_redo_swaps_states() {
        let mut history = History::new(10, true);
        history.record_checkpoint(entry("before"), None);
        let restored = history.undo(entry("after")).unwrap();
        assert_eq!(restored, entry("before"));
        assert!(history.can_redo());
        let redone = history.redo(entry("before")).unwrap();
        assert_eq!(redone, entry("after"));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn new_checkpoint_clears_redo() {
        let mut history = History::new(10, true);
        history.record_checkpoint(entry("a"), None);
        history.undo(entry("b")).unwrap();
        history.record_checkpoint(entry("a"), None);
        assert!(!history.can_redo());
    }

    #[test]
    fn oldest_entries_are_dropped_beyond_max_depth() {
        let mut history = History::new(2, true);
        history.record_checkpoint(entry("1"), None);
        history.record_checkpoint(entry("2"), None);
        history.record_checkpoint(entry("3"), None);
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.undo(entry("4")).unwrap(), entry("3"));
        assert_eq!(history.undo(entry("3")).unwrap(), entry("2"));
        assert!(!history.can_undo());
    }

    #[test]
    fn same_run_keeps_the_first_entry() {
        let mut history = History::new(10, true);
        let target = NodeId(1);
        assert!(history.record_checkpoint(entry(""), typing(target)));
        assert!(!history.record_checkpoint(entry("H"), typing(target)));
        assert!(!history.record_checkpoint(entry("He"), typing(target)));
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.undo(entry("Hel")).unwrap(), entry(""));
    }

    #[test]
    fn breaking_the_run_opens_a_new_entry() {
        let mut history = History::new(10, true);
        let target = NodeId(1);
        history.record_checkpoint(entry(""), typing(target));
        history.break_run();
        assert!(history.record_checkpoint(entry("a"), typing(target)));
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn different_kind_or_target_opens_a_new_entry() {
        let mut history = History::new(10, true);
        history.record_checkpoint(entry(""), typing(NodeId(1)));
        assert!(history.record_checkpoint(entry("a"), typing(NodeId(2))));
        assert!(history.record_checkpoint(
            entry("ab"),
            Some(EditRun {
                kind: EditKind::Deleting,
                target: NodeId(2)
            })
        ));
        assert_eq!(history.undo_depth(), 3);
    }

    #[test]
    fn coalescing_can_be_disabled() {
        let mut history = History::new(10, false);
        history.record_checkpoint(entry(""), typing(NodeId(1)));
        history.record_checkpoint(entry("a"), typing(NodeId(1)));
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn zero_depth_disables_history() {
        let mut history = History::new(0, true);
        assert!(!history.record_checkpoint(entry("a"), None));
        assert!(!history.can_undo());
    }
}
