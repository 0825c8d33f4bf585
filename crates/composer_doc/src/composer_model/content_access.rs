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

//! Content access: loading markup and reading the document back as
//! markup, plain text, an excerpt or a debug tree.

use super::ComposerModel;
use crate::composer_state::ComposerState;
use crate::composer_update::ComposerUpdate;
use crate::dom::{
    excerpt, parse, parse_lenient, serialize, Dom, HtmlParseError, ToPlainText,
    ToTree,
};
use crate::history::HistoryEntry;

impl ComposerModel {
    /// Replace the document with parsed `html`, recovering from malformed
    /// markup. History is cleared and the caret goes to the start.
    pub fn set_content_from_html(&mut self, html: &str) -> ComposerUpdate {
        self.load(parse_lenient(html))
    }

    /// Like [`Self::set_content_from_html`], but refuses markup the parser
    /// had to repair. The model is unchanged on error.
    pub fn set_content_from_html_strict(
        &mut self,
        html: &str,
    ) -> Result<ComposerUpdate, HtmlParseError> {
        let dom = parse(html)?;
        Ok(self.load(dom))
    }

    fn load(&mut self, dom: Dom) -> ComposerUpdate {
        self.state = ComposerState::from_dom(dom);
        self.history.clear();
        self.create_update_replace_all()
    }

    /// Empty the document. Unlike loading content this can be undone.
    pub fn clear(&mut self) -> ComposerUpdate {
        if self.state.dom == Dom::new() {
            self.state.pending_formats.clear();
            return self.create_update_menu_state();
        }
        let before = HistoryEntry {
            dom: self.state.dom.clone(),
            selection: self.state.selection,
        };
        self.history.record_checkpoint(before, None);
        self.state = ComposerState::new();
        self.create_update_replace_all()
    }

    pub fn get_content_as_html(&self) -> String {
        serialize(&self.state.dom)
    }

    pub fn get_content_as_plain_text(&self) -> String {
        self.state.dom.to_plain_text()
    }

    /// Plain text shortened to the configured excerpt length.
    pub fn get_excerpt(&self) -> String {
        excerpt(
            &self.get_content_as_plain_text(),
            self.config.excerpt_length,
        )
    }

    pub fn character_count(&self) -> usize {
        self.state.dom.character_count()
    }

    pub fn to_tree(&self) -> String {
        self.state.dom.to_tree()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::config::ComposerConfig;

    #[test]
    fn loading_html_resets_history_and_caret() {
        let mut model = ComposerModel::new();
        model.replace_text("draft").unwrap();
        model.set_content_from_html("<h1>Hi</h1><p>there</p>");
        assert_eq!(model.get_content_as_html(), "<h1>Hi</h1><p>there</p>");
        assert!(!model.history.can_undo());
        assert_eq!(model.get_selection_offsets(), Some((0, 0)));
    }

    #[test]
    fn strict_loading_refuses_broken_markup() {
        let mut model = ComposerModel::from_html("<p>keep</p>");
        assert!(model
            .set_content_from_html_strict("<p><strong>a<em>b</strong>c</em></p>")
            .is_err());
        assert_eq!(model.get_content_as_html(), "<p>keep</p>");
    }

    #[test]
    fn clear_can_be_undone() {
        let mut model = ComposerModel::from_html("<p>text</p>");
        model.clear();
        assert_eq!(model.get_content_as_html(), "");
        model.undo().unwrap();
        assert_eq!(model.get_content_as_html(), "<p>text</p>");
    }

    #[test]
    fn clearing_an_empty_document_adds_no_undo_step() {
        let mut model = ComposerModel::new();
        model.clear();
        assert!(!model.can_undo());

        model.replace_text("x").unwrap();
        model.clear();
        model.clear();
        model.undo().unwrap();
        assert_eq!(model.get_content_as_html(), "<p>x</p>");
        model.undo().unwrap();
        assert_eq!(model.get_content_as_html(), "");
        assert!(!model.can_undo());
    }

    #[test]
    fn plain_text_joins_blocks() {
        let model = ComposerModel::from_html(
            "<h2>Title</h2><ul><li>one</li><li>two</li></ul>",
        );
        assert_eq!(model.get_content_as_plain_text(), "Title\none\ntwo");
        assert_eq!(model.character_count(), 13);
    }

    #[test]
    fn excerpt_uses_the_configured_length() {
        let mut model = ComposerModel::with_config(ComposerConfig {
            excerpt_length: 12,
            ..ComposerConfig::default()
        });
        model.set_content_from_html("<p>The quick brown fox</p>");
        assert_eq!(model.get_excerpt(), "The quick\u{2026}");
    }

    #[test]
    fn tree_shows_the_structure() {
        let model = ComposerModel::from_html("<p>a<strong>b</strong></p>");
        assert_eq!(
            model.to_tree(),
            indoc! {r#"
                root
                └>p
                  ├>"a"
                  └>strong "b"
            "#}
        );
    }
}
