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

//! Moving the selection. Any change of selection ends the current typing
//! run and drops pending formats.

use super::ComposerModel;
use crate::command_error::CommandError;
use crate::composer_update::ComposerUpdate;
use crate::selection::{DomPoint, Selection};

impl ComposerModel {
    /// Select from `anchor` to `focus`. Both must be valid positions in the
    /// current document.
    pub fn select(
        &mut self,
        anchor: DomPoint,
        focus: DomPoint,
    ) -> Result<ComposerUpdate, CommandError> {
        let selection = Selection::new(anchor, focus);
        if selection.normalized(&self.state.dom).is_none() {
            return Err(CommandError::InvalidSelection(format!(
                "{}:{} to {}:{} is not a position in the document",
                anchor.node, anchor.offset, focus.node, focus.offset
            )));
        }
        Ok(self.set_selection(Some(selection)))
    }

    /// Select by document offsets, where consecutive text blocks are one
    /// position apart. Offsets past the end clamp to the end.
    pub fn select_offsets(
        &mut self,
        start: usize,
        end: usize,
    ) -> Result<ComposerUpdate, CommandError> {
        let dom = &self.state.dom;
        let (Some(anchor), Some(focus)) = (
            dom.point_at_document_offset(start),
            dom.point_at_document_offset(end),
        ) else {
            return Err(CommandError::InvalidSelection(String::from(
                "the document has no text blocks",
            )));
        };
        self.select(anchor, focus)
    }

    pub fn select_all(&mut self) -> Result<ComposerUpdate, CommandError> {
        let end = self.state.dom.character_count() + 1;
        self.select_offsets(0, end)
    }

    /// Drop the selection, e.g. when the editor loses focus. Commands fail
    /// with [`CommandError::NoSelection`] until a new one is set.
    pub fn clear_selection(&mut self) -> ComposerUpdate {
        self.set_selection(None)
    }

    /// Document offsets of the selection, start first.
    pub fn get_selection_offsets(&self) -> Option<(usize, usize)> {
        let range = self.state.selection?.normalized(&self.state.dom)?;
        Some((
            self.state.dom.document_offset(range.start)?,
            self.state.dom.document_offset(range.end)?,
        ))
    }

    fn set_selection(&mut self, selection: Option<Selection>) -> ComposerUpdate {
        if selection != self.state.selection {
            self.history.break_run();
            self.state.pending_formats.clear();
        }
        self.state.selection = selection;
        ComposerUpdate::select(selection, self.compute_menu_state())
    }
}
