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

//! The command set and the pure reducer that applies it.
//!
//! [`apply`] never touches its input: it clones the state, edits the clone
//! and hands it back. A command that fails leaves nothing behind, which is
//! what makes every command atomic.

use log::trace;
use strum_macros::AsRefStr;

use crate::command_error::CommandError;
use crate::composer_state::ComposerState;
use crate::dom::{Alignment, HeadingLevel, InlineFormatType, ListType};
use crate::history::EditRun;

/// Target of [`Command::SetBlockType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Heading(HeadingLevel),
    Quote,
    CodeBlock,
}

#[derive(Clone, Debug, PartialEq, Eq, AsRefStr)]
pub enum Command {
    ToggleInlineFormat(InlineFormatType),
    SetBlockType(BlockType),
    /// Wrap the selected blocks in a list, or unwrap them if they already
    /// are items of a list of this type.
    InsertList(ListType),
    InsertImage {
        src: String,
        alt_text: String,
        max_width: u32,
    },
    InsertLink {
        url: String,
    },
    InsertLinkWithText {
        url: String,
        text: String,
    },
    RemoveLink,
    AlignBlock(Alignment),
    /// Replace the selection with `text`. Newlines split blocks.
    ReplaceText(String),
    Enter,
    Backspace,
    Delete,
    Undo,
    Redo,
}

/// The result of applying a command.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    pub state: ComposerState,
    pub document_changed: bool,
    /// Set for typing and deleting, so consecutive edits can share one undo
    /// entry.
    pub run: Option<EditRun>,
}

/// Apply `command` to `state`.
///
/// History lives outside the state, so `Undo` and `Redo` always fail here
/// with [`CommandError::NothingToUndo`] and [`CommandError::NothingToRedo`].
/// [`crate::ComposerModel::dispatch`] routes them to its history instead.
pub fn apply(
    state: &ComposerState,
    command: &Command,
) -> Result<Applied, CommandError> {
    trace!("Applying {}", command.as_ref());
    let mut next = state.clone();
    let edit = match command {
        Command::ToggleInlineFormat(format) => {
            next.toggle_inline_format(*format)?
        }
        Command::SetBlockType(block_type) => next.set_block_type(*block_type)?,
        Command::InsertList(list_type) => next.insert_list(*list_type)?,
        Command::InsertImage {
            src,
            alt_text,
            max_width,
        } => next.insert_image(src, alt_text, *max_width)?,
        Command::InsertLink { url } => next.insert_link(url)?,
        Command::InsertLinkWithText { url, text } => {
            next.insert_link_with_text(url, text)?
        }
        Command::RemoveLink => next.remove_link()?,
        Command::AlignBlock(alignment) => next.align_block(*alignment)?,
        Command::ReplaceText(text) => next.replace_text(text)?,
        Command::Enter => next.enter()?,
        Command::Backspace => next.backspace()?,
        Command::Delete => next.delete()?,
        Command::Undo => return Err(CommandError::NothingToUndo),
        Command::Redo => return Err(CommandError::NothingToRedo),
    };
    if edit.document_changed {
        next.tidy_structure()?;
    }
    Ok(Applied {
        state: next,
        document_changed: edit.document_changed,
        run: edit.run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Dom, DomNode, ToHtml};
    use crate::selection::{DomPoint, Selection};

    fn hello_state() -> ComposerState {
        let mut dom = Dom::new();
        let p = dom.children(dom.root())[0];
        let t = dom.append_node(p, DomNode::new_text("Hello")).unwrap();
        let mut state = ComposerState::from_dom(dom);
        state.selection =
            Some(Selection::new(DomPoint::new(t, 0), DomPoint::new(t, 5)));
        state
    }

    #[test]
    fn apply_leaves_the_input_untouched() {
        let state = hello_state();
        let before = state.clone();
        let applied = apply(
            &state,
            &Command::ToggleInlineFormat(InlineFormatType::Bold),
        )
        .unwrap();
        assert_eq!(state, before);
        assert!(applied.document_changed);
        assert_eq!(applied.state.dom.to_html(), "<p><strong>Hello</strong></p>");
    }

    #[test]
    fn failed_commands_return_only_the_error() {
        let state = hello_state();
        let result = apply(
            &state,
            &Command::InsertLink {
                url: String::from("javascript:alert(1)"),
            },
        );
        assert!(matches!(result, Err(CommandError::InvalidUrl(_))));
    }

    #[test]
    fn history_commands_need_a_history() {
        let state = hello_state();
        assert_eq!(
            apply(&state, &Command::Undo),
            Err(CommandError::NothingToUndo)
        );
        assert_eq!(
            apply(&state, &Command::Redo),
            Err(CommandError::NothingToRedo)
        );
    }

    #[test]
    fn commands_without_selection_fail() {
        let mut state = hello_state();
        state.selection = None;
        for command in [
            Command::ToggleInlineFormat(InlineFormatType::Italic),
            Command::SetBlockType(BlockType::Quote),
            Command::InsertList(ListType::Ordered),
            Command::AlignBlock(Alignment::Center),
            Command::ReplaceText(String::from("x")),
            Command::Enter,
            Command::Backspace,
            Command::Delete,
            Command::RemoveLink,
        ] {
            assert_eq!(
                apply(&state, &command),
                Err(CommandError::NoSelection),
                "{}",
                command.as_ref()
            );
        }
    }

    #[test]
    fn command_names_are_variant_names() {
        assert_eq!(Command::Enter.as_ref(), "Enter");
        assert_eq!(
            Command::InsertList(ListType::Ordered).as_ref(),
            "InsertList"
        );
    }
}
