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

//! Undo / Redo over whole-document snapshots.
//!
//! Before each edit the document and selection are recorded in the
//! [`History`](crate::History). Undo puts the recorded pair back and keeps
//! the current one for redo.

use log::debug;

use super::ComposerModel;
use crate::command_error::CommandError;
use crate::composer_update::ComposerUpdate;
use crate::history::HistoryEntry;

impl ComposerModel {
    /// Undo the last edit, or the last run of typing.
    pub fn undo(&mut self) -> Result<ComposerUpdate, CommandError> {
        let entry = self.history.undo(self.current_entry())?;
        debug!("Undo, {} entries left", self.history.undo_depth());
        self.restore(entry);
        Ok(self.create_update_replace_all())
    }

    /// Redo the last undone edit.
    pub fn redo(&mut self) -> Result<ComposerUpdate, CommandError> {
        let entry = self.history.redo(self.current_entry())?;
        debug!("Redo, {} entries left", self.history.redo_depth());
        self.restore(entry);
        Ok(self.create_update_replace_all())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn current_entry(&self) -> HistoryEntry {
        HistoryEntry {
            dom: self.state.dom.clone(),
            selection: self.state.selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::command::Command;
    use crate::command_error::CommandError;
    use crate::config::ComposerConfig;
    use crate::dom::{Alignment, HeadingLevel, InlineFormatType, ListType};
    use crate::ComposerModel;

    fn new_model() -> ComposerModel {
        ComposerModel::new()
    }

    fn model_with_text(text: &str) -> ComposerModel {
        let mut model = new_model();
        model.replace_text(text).unwrap();
        model
    }

    fn html(model: &ComposerModel) -> String {
        model.get_content_as_html()
    }

    #[test]
    fn undo_on_a_fresh_model_fails() {
        let mut model = new_model();
        assert_eq!(model.undo(), Err(CommandError::NothingToUndo));
        assert_eq!(model.redo(), Err(CommandError::NothingToRedo));
    }

    #[test]
    fn undo_restores_the_heading_change() {
        let mut model = model_with_text("Title");
        model.heading(HeadingLevel::H2).unwrap();
        assert_eq!(html(&model), "<h2>Title</h2>");
        model.undo().unwrap();
        assert_eq!(html(&model), "<p>Title</p>");
        model.redo().unwrap();
        assert_eq!(html(&model), "<h2>Title</h2>");
    }

    #[test]
    fn undo_restores_tree_and_selection_exactly() {
        let commands = vec![
            Command::ToggleInlineFormat(InlineFormatType::Italic),
            Command::SetBlockType(crate::BlockType::Quote),
            Command::InsertList(ListType::Ordered),
            Command::AlignBlock(Alignment::Right),
            Command::InsertLink {
                url: String::from("https://example.org"),
            },
            Command::ReplaceText(String::from("new\ntext")),
            Command::Enter,
            Command::Backspace,
            Command::Delete,
        ];
        for command in commands {
            let mut model = model_with_text("hello\nworld");
            model.select_offsets(2, 8).unwrap();
            let before = model.state().clone();
            model.dispatch(command.clone()).unwrap();
            model.undo().unwrap();
            assert_eq!(model.state().dom, before.dom, "{}", command.as_ref());
            assert_eq!(
                model.state().selection,
                before.selection,
                "{}",
                command.as_ref()
            );
        }
    }

    #[test]
    fn dispatching_undo_and_redo_uses_the_history() {
        let mut model = model_with_text("a");
        model.dispatch(Command::Undo).unwrap();
        assert_eq!(html(&model), "");
        model.dispatch(Command::Redo).unwrap();
        assert_eq!(html(&model), "<p>a</p>");
    }

    #[test]
    fn typing_a_word_is_one_undo_step() {
        let mut model = new_model();
        for c in ["h", "e", "l", "l", "o"] {
            model.replace_text(c).unwrap();
        }
        assert_eq!(model.history.undo_depth(), 1);
        model.undo().unwrap();
        assert_eq!(html(&model), "");
    }

    #[test]
    fn typing_in_another_block_starts_a_new_step() {
        let mut model = model_with_text("a");
        model.enter().unwrap();
        model.replace_text("b").unwrap();
        model.replace_text("c").unwrap();
        model.undo().unwrap();
        assert_eq!(model.get_content_as_plain_text(), "a\n");
    }

    #[test]
    fn deleting_after_typing_starts_a_new_step() {
        let mut model = model_with_text("abc");
        model.backspace().unwrap();
        model.backspace().unwrap();
        assert_eq!(model.history.undo_depth(), 2);
        model.undo().unwrap();
        assert_eq!(html(&model), "<p>abc</p>");
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut model = model_with_text("a");
        model.undo().unwrap();
        assert!(model.can_redo());
        model.replace_text("b").unwrap();
        assert!(!model.can_redo());
    }

    #[test]
    fn history_depth_is_bounded() {
        let mut model = ComposerModel::with_config(ComposerConfig {
            max_history_depth: 2,
            ..ComposerConfig::default()
        });
        model.replace_text("a").unwrap();
        model.enter().unwrap();
        model.enter().unwrap();
        model.enter().unwrap();
        model.undo().unwrap();
        model.undo().unwrap();
        assert_eq!(model.undo(), Err(CommandError::NothingToUndo));
        assert_eq!(model.get_content_as_plain_text(), "a\n");
    }

    #[test]
    fn coalescing_can_be_turned_off() {
        let mut model = ComposerModel::with_config(ComposerConfig {
            coalesce_typing: false,
            ..ComposerConfig::default()
        });
        model.replace_text("a").unwrap();
        model.replace_text("b").unwrap();
        assert_eq!(model.history.undo_depth(), 2);
    }

    #[test]
    fn undo_drops_pending_formats() {
        let mut model = model_with_text("a");
        model.replace_text("b").unwrap();
        model.select_offsets(2, 2).unwrap();
        model.bold().unwrap();
        model.undo().unwrap();
        assert!(model.state().pending_formats.is_empty());
    }
}
