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

//! Inline images and the upload flow that produces them.
//!
//! An upload is started with [`ComposerModel::begin_image_upload`], which
//! hands out a ticket carrying a generation number. Starting another upload
//! or cancelling bumps the generation, so a response that arrives for an
//! older ticket is refused instead of inserting an image the user no
//! longer expects.

use log::{debug, warn};
use thiserror::Error;

use super::links::check_url;
use super::ComposerModel;
use crate::command::Command;
use crate::command_error::CommandError;
use crate::composer_state::{ComposerState, Edit};
use crate::composer_update::ComposerUpdate;
use crate::config::DEFAULT_IMAGE_MAX_WIDTH;
use crate::dom::DomNode;
use crate::selection::DomPoint;

pub(crate) const IMAGE_SCHEMES: &[&str] = &["http", "https", "blob"];

/// Identifies one upload started by [`ComposerModel::begin_image_upload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Why an upload did not produce an image URL, as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UploadError {
    pub message: String,
}

impl UploadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ComposerState {
    pub(crate) fn insert_image(
        &mut self,
        src: &str,
        alt_text: &str,
        max_width: u32,
    ) -> Result<Edit, CommandError> {
        check_url(src, IMAGE_SCHEMES)?;
        let range = self.range()?;
        for point in [range.start, range.end] {
            if self.in_code_block(point) {
                return Err(CommandError::InvalidSelection(String::from(
                    "code blocks cannot hold images",
                )));
            }
            if self.link_interior(point).is_some() {
                return Err(CommandError::InvalidSelection(String::from(
                    "links cannot hold images",
                )));
            }
        }

        let caret = if range.is_collapsed() {
            range.start
        } else {
            self.delete_range(range)?
        };
        let max_width = if max_width == 0 {
            DEFAULT_IMAGE_MAX_WIDTH
        } else {
            max_width
        };
        let (block, index) = self.dom.split_inline_at(caret)?;
        let image = self.dom.insert_node(
            block,
            index,
            DomNode::new_image(src.trim(), alt_text, max_width),
        )?;
        self.set_caret(DomPoint::new(image, 1));
        Ok(Edit::structural())
    }
}

impl ComposerModel {
    /// Insert an image at the selection. Without a `max_width` the
    /// configured default applies.
    pub fn insert_image(
        &mut self,
        src: &str,
        alt_text: &str,
        max_width: Option<u32>,
    ) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::InsertImage {
            src: src.to_owned(),
            alt_text: alt_text.to_owned(),
            max_width: max_width.unwrap_or(self.config.default_image_max_width),
        })
    }

    /// Start an upload. Any upload still in flight becomes stale.
    pub fn begin_image_upload(&mut self) -> UploadTicket {
        self.upload_generation += 1;
        self.pending_upload = Some(self.upload_generation);
        debug!("Started image upload {}", self.upload_generation);
        UploadTicket {
            generation: self.upload_generation,
        }
    }

    /// Abandon the upload in flight, if any.
    pub fn cancel_image_upload(&mut self) {
        if let Some(generation) = self.pending_upload.take() {
            debug!("Cancelled image upload {generation}");
        }
        self.upload_generation += 1;
    }

    pub fn has_pending_upload(&self) -> bool {
        self.pending_upload.is_some()
    }

    /// Finish the upload identified by `ticket`. A successful upload inserts
    /// the image at the current selection; a failed one leaves the document
    /// alone and reports the failure in the update.
    pub fn complete_image_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, UploadError>,
        alt_text: &str,
        max_width: Option<u32>,
    ) -> Result<ComposerUpdate, CommandError> {
        if self.pending_upload != Some(ticket.generation) {
            warn!(
                "Ignoring result of upload {}, current upload is {}",
                ticket.generation, self.upload_generation
            );
            return Err(CommandError::StaleUpload {
                generation: ticket.generation,
                current: self.upload_generation,
            });
        }
        self.pending_upload = None;
        match result {
            Ok(src) => self.insert_image(&src, alt_text, max_width),
            Err(e) => {
                warn!("Image upload {} failed: {e}", ticket.generation);
                Ok(ComposerUpdate::upload_failed(e.message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer_update::TextUpdate;

    fn model_with_text(text: &str) -> ComposerModel {
        let mut model = ComposerModel::new();
        model.replace_text(text).unwrap();
        model
    }

    fn html(model: &ComposerModel) -> String {
        model.get_content_as_html()
    }

    #[test]
    fn image_is_inserted_at_the_caret() {
        let mut model = model_with_text("ab");
        model.select_offsets(1, 1).unwrap();
        model
            .insert_image("https://cdn.example/cat.png", "A cat", Some(320))
            .unwrap();
        assert_eq!(
            html(&model),
            "<p>a<img src=\"https://cdn.example/cat.png\" alt=\"A cat\" style=\"max-width: 320px;\" />b</p>"
        );
        assert_eq!(model.get_selection_offsets(), Some((2, 2)));
    }

    #[test]
    fn missing_width_uses_the_configured_default() {
        let mut model = ComposerModel::new();
        model.insert_image("/media/1.png", "", None).unwrap();
        assert_eq!(
            html(&model),
            "<p><img src=\"/media/1.png\" alt=\"\" style=\"max-width: 800px;\" /></p>"
        );
    }

    #[test]
    fn alt_text_is_escaped() {
        let mut model = ComposerModel::new();
        model
            .insert_image("/a.png", "say \"hi\" <now>", Some(10))
            .unwrap();
        assert_eq!(
            html(&model),
            "<p><img src=\"/a.png\" alt=\"say &quot;hi&quot; &lt;now&gt;\" style=\"max-width: 10px;\" /></p>"
        );
    }

    #[test]
    fn image_in_code_block_is_rejected() {
        let mut model = model_with_text("code");
        model.code_block().unwrap();
        let before = model.state().clone();
        assert!(matches!(
            model.insert_image("/a.png", "", None),
            Err(CommandError::InvalidSelection(_))
        ));
        assert_eq!(model.state(), &before);
    }

    #[test]
    fn image_inside_a_link_is_rejected() {
        let mut model = model_with_text("link");
        model.select_offsets(0, 4).unwrap();
        model.insert_link("https://example.org").unwrap();
        model.select_offsets(2, 2).unwrap();
        assert!(matches!(
            model.insert_image("/a.png", "", None),
            Err(CommandError::InvalidSelection(_))
        ));
    }

    #[test]
    fn script_sources_are_rejected() {
        let mut model = ComposerModel::new();
        assert!(matches!(
            model.insert_image("javascript:alert(1)", "", None),
            Err(CommandError::InvalidUrl(_))
        ));
    }

    #[test]
    fn typing_after_an_image_continues_the_paragraph() {
        let mut model = model_with_text("a");
        model.insert_image("/a.png", "", Some(5)).unwrap();
        model.replace_text("b").unwrap();
        assert_eq!(
            html(&model),
            "<p>a<img src=\"/a.png\" alt=\"\" style=\"max-width: 5px;\" />b</p>"
        );
    }

    #[test]
    fn completed_upload_inserts_the_image() {
        let mut model = ComposerModel::new();
        let ticket = model.begin_image_upload();
        assert!(model.has_pending_upload());
        model
            .complete_image_upload(
                ticket,
                Ok(String::from("https://cdn.example/1.png")),
                "one",
                Some(100),
            )
            .unwrap();
        assert!(!model.has_pending_upload());
        assert!(html(&model).contains("src=\"https://cdn.example/1.png\""));
    }

    #[test]
    fn superseded_upload_is_stale() {
        let mut model = ComposerModel::new();
        let first = model.begin_image_upload();
        let second = model.begin_image_upload();
        assert_eq!(
            model.complete_image_upload(
                first,
                Ok(String::from("/first.png")),
                "",
                None
            ),
            Err(CommandError::StaleUpload {
                generation: first.generation(),
                current: second.generation()
            })
        );
        assert_eq!(html(&model), "");
        model
            .complete_image_upload(second, Ok(String::from("/second.png")), "", None)
            .unwrap();
        assert!(html(&model).contains("/second.png"));
    }

    #[test]
    fn cancelled_upload_is_stale() {
        let mut model = ComposerModel::new();
        let ticket = model.begin_image_upload();
        model.cancel_image_upload();
        assert!(matches!(
            model.complete_image_upload(ticket, Ok(String::from("/x.png")), "", None),
            Err(CommandError::StaleUpload { .. })
        ));
    }

    #[test]
    fn failed_upload_is_reported_without_editing() {
        let mut model = model_with_text("text");
        let depth = model.history.undo_depth();
        let ticket = model.begin_image_upload();
        let update = model
            .complete_image_upload(ticket, Err(UploadError::new("too large")), "", None)
            .unwrap();
        assert_eq!(update.upload_failure.as_deref(), Some("too large"));
        assert_eq!(update.text_update, TextUpdate::Keep);
        assert_eq!(html(&model), "<p>text</p>");
        assert_eq!(model.history.undo_depth(), depth);
    }

    #[test]
    fn a_ticket_is_only_good_once() {
        let mut model = ComposerModel::new();
        let ticket = model.begin_image_upload();
        model
            .complete_image_upload(ticket, Ok(String::from("/x.png")), "", None)
            .unwrap();
        assert!(model
            .complete_image_upload(ticket, Ok(String::from("/x.png")), "", None)
            .is_err());
    }
}
