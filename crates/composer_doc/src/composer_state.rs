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

//! The state a command operates on, and the helpers shared by all
//! commands for resolving the selection and putting it back afterwards.
//!
//! Re-anchoring policy: before a structural edit every selection end is
//! recorded as a (text block, offset) pair. Blocks that are replaced during
//! the edit are mapped to their successors, and each end is restored at the
//! same offset in its block. At a boundary between two leaves the end of a
//! preceding text run wins (see [`Dom::point_at_block_offset`]); offsets
//! beyond a block that lost content clamp to its end.

use std::collections::HashMap;

use crate::command_error::CommandError;
use crate::dom::{Dom, DomNode, FormatSet, NodeId};
use crate::history::{EditKind, EditRun};
use crate::selection::{DomPoint, Selection, SelectionRange};

#[derive(Clone, Debug, PartialEq)]
pub struct ComposerState {
    pub dom: Dom,
    pub selection: Option<Selection>,
    /// Formats toggled at a collapsed caret. They flip the formats of the
    /// next inserted text relative to the run the caret sits in.
    pub pending_formats: FormatSet,
}

/// What a successful command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Edit {
    pub(crate) document_changed: bool,
    pub(crate) run: Option<EditRun>,
}

impl Edit {
    pub(crate) fn unchanged() -> Self {
        Self {
            document_changed: false,
            run: None,
        }
    }

    pub(crate) fn structural() -> Self {
        Self {
            document_changed: true,
            run: None,
        }
    }

    pub(crate) fn in_run(kind: EditKind, target: NodeId) -> Self {
        Self {
            document_changed: true,
            run: Some(EditRun { kind, target }),
        }
    }
}

/// Selection ends recorded as block offsets.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Anchors {
    anchor: (NodeId, usize),
    focus: (NodeId, usize),
}

impl ComposerState {
    pub fn new() -> Self {
        Self::from_dom(Dom::new())
    }

    /// A state for `dom` with the caret at the start of the document.
    pub fn from_dom(dom: Dom) -> Self {
        let selection = dom.point_at_document_offset(0).map(Selection::caret);
        Self {
            dom,
            selection,
            pending_formats: FormatSet::new(),
        }
    }

    /// Rebuild the arena without freed slots, carrying the selection over
    /// to the new IDs.
    pub(crate) fn compact(&mut self) {
        let remap = self.dom.compact();
        let moved = |point: DomPoint| {
            remap.get(&point.node).map(|n| DomPoint::new(*n, point.offset))
        };
        self.selection = self.selection.and_then(|s| {
            Some(Selection::new(moved(s.anchor)?, moved(s.focus)?))
        });
    }

    /// The selection with its ends in document order.
    pub(crate) fn range(&self) -> Result<SelectionRange, CommandError> {
        let selection = self.selection.ok_or(CommandError::NoSelection)?;
        selection.normalized(&self.dom).ok_or_else(|| {
            CommandError::InvalidSelection(String::from(
                "the selection points outside the document",
            ))
        })
    }

    pub(crate) fn is_backward(&self) -> bool {
        match (self.selection, self.range()) {
            (Some(selection), Ok(range)) => {
                selection.anchor != range.start
            }
            _ => false,
        }
    }

    /// Set the selection to `start..end`, keeping the direction of the
    /// current selection.
    pub(crate) fn select_range(&mut self, start: DomPoint, end: DomPoint) {
        self.selection = Some(if self.is_backward() {
            Selection::new(end, start)
        } else {
            Selection::new(start, end)
        });
    }

    pub(crate) fn set_caret(&mut self, point: DomPoint) {
        self.selection = Some(Selection::caret(point));
    }

    pub(crate) fn capture_anchors(&self) -> Option<Anchors> {
        let selection = self.selection?;
        Some(Anchors {
            anchor: self.dom.offset_in_block(selection.anchor)?,
            focus: self.dom.offset_in_block(selection.focus)?,
        })
    }

    /// Put the selection back after a structural edit. `replaced` maps
    /// blocks that no longer exist to the blocks that took their content.
    pub(crate) fn restore_anchors(
        &mut self,
        anchors: Option<Anchors>,
        replaced: &HashMap<NodeId, NodeId>,
    ) {
        let Some(anchors) = anchors else {
            return;
        };
        let anchor = self.resolve_anchor(anchors.anchor, replaced);
        let focus = self.resolve_anchor(anchors.focus, replaced);
        self.selection = match (anchor, focus) {
            (Some(anchor), Some(focus)) => Some(Selection::new(anchor, focus)),
            _ => self.end_of_document().map(Selection::caret),
        };
    }

    fn resolve_anchor(
        &self,
        (block, offset): (NodeId, usize),
        replaced: &HashMap<NodeId, NodeId>,
    ) -> Option<DomPoint> {
        let mut block = block;
        // Replacements may chain when a block is converted twice.
        while let Some(next) = replaced.get(&block) {
            if *next == block {
                break;
            }
            block = *next;
        }
        if !self.dom.node(block).is_some_and(DomNode::is_text_block) {
            return None;
        }
        Some(self.dom.point_at_block_offset(block, offset))
    }

    pub(crate) fn end_of_document(&self) -> Option<DomPoint> {
        let last = *self.dom.text_blocks().last()?;
        Some(self.dom.point_at_block_offset(last, self.dom.block_len(last)))
    }

    /// Whether `point` lies in a code block.
    pub(crate) fn in_code_block(&self, point: DomPoint) -> bool {
        self.dom
            .text_block_of(point.node)
            .is_some_and(|b| matches!(self.dom.node(b), Some(DomNode::CodeBlock)))
    }

    /// The link enclosing `point`, if any.
    pub(crate) fn link_at(&self, point: DomPoint) -> Option<NodeId> {
        self.dom
            .closest(point.node, |n| matches!(n, DomNode::Link { .. }))
    }

    /// Formats of the text run the caret at `point` continues: the run it
    /// sits in, or else the nearest text run before it in the same block.
    pub(crate) fn caret_run_formats(&self, point: DomPoint) -> FormatSet {
        if let Some(DomNode::Text { formats, .. }) = self.dom.node(point.node) {
            return formats.clone();
        }
        let Some((block, offset)) = self.dom.offset_in_block(point) else {
            return FormatSet::new();
        };
        let mut pos = 0;
        let mut found = FormatSet::new();
        for leaf in self.dom.block_leaves(block) {
            if pos >= offset {
                break;
            }
            if let Some(node) = self.dom.node(leaf) {
                if let DomNode::Text { formats, .. } = node {
                    found = formats.clone();
                }
                pos += node.leaf_len();
            }
        }
        found
    }

    /// Formats the next typed text gets at `point`.
    pub(crate) fn typed_formats(&self, point: DomPoint) -> FormatSet {
        let run = self.caret_run_formats(point);
        run.symmetric_difference(&self.pending_formats)
            .copied()
            .collect()
    }

    /// Remove lists left without items, then make sure the document still
    /// has a block to type in.
    pub(crate) fn tidy_structure(&mut self) -> Result<(), CommandError> {
        loop {
            let empty_list = self.dom.iter().into_iter().find(|id| {
                matches!(self.dom.node(*id), Some(DomNode::List(_)))
                    && self.dom.children(*id).is_empty()
            });
            match empty_list {
                Some(list) => {
                    self.dom.remove(list)?;
                }
                None => break,
            }
        }
        let root = self.dom.root();
        if self.dom.children(root).is_empty() {
            self.dom.append_node(root, DomNode::Paragraph)?;
        }
        Ok(())
    }

    /// Merge adjacent lists of the same type among the children of `parent`.
    pub(crate) fn merge_adjacent_lists(
        &mut self,
        parent: NodeId,
    ) -> Result<(), CommandError> {
        let mut i = 0;
        while i + 1 < self.dom.children(parent).len() {
            let children = self.dom.children(parent);
            let (left, right) = (children[i], children[i + 1]);
            match (self.dom.node(left), self.dom.node(right)) {
                (Some(DomNode::List(a)), Some(DomNode::List(b))) if a == b => {
                    self.dom.merge_adjacent(left, right)?;
                }
                _ => i += 1,
            }
        }
        Ok(())
    }
}

impl Default for ComposerState {
    fn default() -> Self {
        Self::new()
    }
}
