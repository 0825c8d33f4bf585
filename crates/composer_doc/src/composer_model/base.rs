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

use log::{debug, warn};

use crate::command::{self, Command};
use crate::command_error::CommandError;
use crate::composer_state::ComposerState;
use crate::composer_update::{ComposerUpdate, MenuState, MenuStateUpdate};
use crate::config::ComposerConfig;
use crate::dom::{serialize, Dom};
use crate::history::{History, HistoryEntry};
use crate::selection::Selection;

/// Notified with the serialized document after every edit that changes it.
/// Hosts use it to keep a hidden form field in sync.
pub trait ContentListener {
    fn on_content_changed(&self, html: &str);
}

impl<F> ContentListener for F
where
    F: Fn(&str),
{
    fn on_content_changed(&self, html: &str) {
        self(html)
    }
}

/// One editing session over one document.
pub struct ComposerModel {
    pub(crate) state: ComposerState,
    pub(crate) history: History,
    pub(crate) config: ComposerConfig,

    /// Bumped whenever an upload starts or is cancelled. Only the upload
    /// holding the current generation may insert its image.
    pub(crate) upload_generation: u64,
    pub(crate) pending_upload: Option<u64>,

    pub(crate) listener: Option<Box<dyn ContentListener>>,
    /// Markup last reported to the listener.
    pub(crate) last_html: String,
}

impl ComposerModel {
    pub fn new() -> Self {
        Self::with_config(ComposerConfig::default())
    }

    pub fn with_config(config: ComposerConfig) -> Self {
        let state = ComposerState::new();
        let last_html = serialize(&state.dom);
        Self {
            state,
            history: History::new(
                config.max_history_depth,
                config.coalesce_typing,
            ),
            config,
            upload_generation: 0,
            pending_upload: None,
            listener: None,
            last_html,
        }
    }

    /// Create a model pre-populated with HTML content.
    pub fn from_html(html: &str) -> Self {
        let mut model = Self::new();
        model.set_content_from_html(html);
        model
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    pub fn dom(&self) -> &Dom {
        &self.state.dom
    }

    pub fn selection(&self) -> Option<Selection> {
        self.state.selection
    }

    pub fn set_content_listener(
        &mut self,
        listener: impl ContentListener + 'static,
    ) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_content_listener(&mut self) {
        self.listener = None;
    }

    /// Run one command. On success the document, selection and history
    /// move forward together; on failure none of them change.
    pub fn dispatch(
        &mut self,
        command: Command,
    ) -> Result<ComposerUpdate, CommandError> {
        match command {
            Command::Undo => return self.undo(),
            Command::Redo => return self.redo(),
            _ => {}
        }

        let applied = command::apply(&self.state, &command).map_err(|e| {
            warn!("Rejected {}: {e}", command.as_ref());
            e
        })?;

        if !applied.document_changed {
            self.state = applied.state;
            self.history.break_run();
            return Ok(self.create_update_menu_state());
        }

        let before = HistoryEntry {
            dom: self.state.dom.clone(),
            selection: self.state.selection,
        };
        self.history.record_checkpoint(before, applied.run);
        self.state = applied.state;
        if self.state.dom.needs_compaction() {
            self.state.compact();
            // The run's target ID is stale now.
            self.history.break_run();
        }
        debug!(
            "Applied {}, {} nodes in document",
            command.as_ref(),
            self.state.dom.node_count()
        );

        #[cfg(feature = "assert-invariants")]
        self.state.dom.explicitly_assert_invariants();

        Ok(self.create_update_replace_all())
    }

    /// Install `state` as the current state without recording history.
    pub(crate) fn restore(&mut self, entry: HistoryEntry) {
        self.state = ComposerState {
            dom: entry.dom,
            selection: entry.selection,
            pending_formats: Default::default(),
        };
    }

    pub(crate) fn create_update_replace_all(&mut self) -> ComposerUpdate {
        let html = serialize(&self.state.dom);
        if html != self.last_html {
            if let Some(listener) = &self.listener {
                listener.on_content_changed(&html);
            }
            self.last_html = html.clone();
        }
        ComposerUpdate::replace_all(
            html,
            self.state.selection,
            self.compute_menu_state(),
        )
    }

    pub(crate) fn create_update_menu_state(&self) -> ComposerUpdate {
        ComposerUpdate::update_menu_state(self.compute_menu_state())
    }

    pub(crate) fn compute_menu_state(&self) -> MenuState {
        MenuState::Update(MenuStateUpdate {
            action_states: self.action_states(),
        })
    }
}

impl Default for ComposerModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::composer_update::TextUpdate;
    use crate::dom::InlineFormatType;

    #[test]
    fn new_model_is_an_empty_document() {
        let model = ComposerModel::new();
        assert_eq!(model.get_content_as_html(), "");
        assert!(model.selection().is_some());
        assert!(!model.history.can_undo());
    }

    #[test]
    fn dispatch_returns_the_new_markup() {
        let mut model = ComposerModel::new();
        let update = model
            .dispatch(Command::ReplaceText(String::from("Hi")))
            .unwrap();
        match update.text_update {
            TextUpdate::ReplaceAll(r) => {
                assert_eq!(r.replacement_html, "<p>Hi</p>");
                assert_eq!(r.selection, model.selection());
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn commands_that_change_nothing_only_update_the_menu() {
        let mut model = ComposerModel::new();
        let update = model
            .dispatch(Command::ToggleInlineFormat(InlineFormatType::Bold))
            .unwrap();
        assert_eq!(update.text_update, TextUpdate::Keep);
        assert!(matches!(update.menu_state, MenuState::Update(_)));
        assert!(!model.history.can_undo());
    }

    #[test]
    fn rejected_commands_change_nothing() {
        let mut model = ComposerModel::new();
        model.replace_text("abc").unwrap();
        let before = model.state.clone();
        let depth = model.history.undo_depth();
        let result = model.dispatch(Command::InsertLink {
            url: String::from("https://example.org"),
        });
        assert!(matches!(result, Err(CommandError::InvalidSelection(_))));
        assert_eq!(model.state, before);
        assert_eq!(model.history.undo_depth(), depth);
    }

    #[test]
    fn long_sessions_keep_the_arena_compact() {
        let mut model = ComposerModel::new();
        model.replace_text("ab").unwrap();
        for _ in 0..400 {
            model.enter().unwrap();
            model.backspace().unwrap();
            assert!(!model.state.dom.needs_compaction());
        }
        assert_eq!(model.get_content_as_html(), "<p>ab</p>");

        model.replace_text("c").unwrap();
        assert_eq!(model.get_content_as_html(), "<p>abc</p>");
        model.undo().unwrap();
        assert_eq!(model.get_content_as_html(), "<p>ab</p>");
    }

    #[test]
    fn listener_hears_every_content_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut model = ComposerModel::new();
        model.set_content_listener(move |html: &str| {
            sink.borrow_mut().push(html.to_owned())
        });
        model.replace_text("a").unwrap();
        model.bold().unwrap();
        model.replace_text("b").unwrap();
        model.undo().unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                String::from("<p>a</p>"),
                String::from("<p>a<strong>b</strong></p>"),
                String::from("<p>a</p>"),
            ]
        );
    }
}
