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

//! Inline formatting: bold, italic, underline, strikethrough, inline code.
//!
//! With a range selected, every text run in the range has the format flag
//! flipped, runs being split at the selection ends first. With a collapsed
//! caret the format is toggled in the pending set and applies to the next
//! typed text.

use log::debug;

use super::ComposerModel;
use crate::command::Command;
use crate::command_error::CommandError;
use crate::composer_state::{ComposerState, Edit};
use crate::composer_update::ComposerUpdate;
use crate::dom::{DomNode, InlineFormatType, NodeId};
use crate::selection::DomPoint;

impl ComposerState {
    pub(crate) fn toggle_inline_format(
        &mut self,
        format: InlineFormatType,
    ) -> Result<Edit, CommandError> {
        let range = self.range()?;
        if range.is_collapsed() {
            if self.in_code_block(range.start) {
                return Err(CommandError::InvalidSelection(String::from(
                    "code blocks cannot hold formatted text",
                )));
            }
            if !self.pending_formats.remove(&format) {
                self.pending_formats.insert(format);
            }
            return Ok(Edit::unchanged());
        }

        let spans: Vec<_> = self
            .dom
            .leaf_spans(range.start, range.end)
            .into_iter()
            .filter(|s| !s.is_empty())
            .filter(|s| {
                matches!(self.dom.node(s.leaf), Some(DomNode::Text { .. }))
            })
            .filter(|s| !self.in_code_block(DomPoint::new(s.leaf, 0)))
            .collect();
        if spans.is_empty() {
            debug!("No text to format in the selection");
            return Ok(Edit::unchanged());
        }

        let mut touched: Vec<NodeId> = Vec::with_capacity(spans.len());
        for span in spans {
            let len = self.dom.node(span.leaf).map_or(0, DomNode::leaf_len);
            if span.end < len {
                self.dom.split_text(span.leaf, span.end)?;
            }
            let run = if span.start > 0 {
                self.dom.split_text(span.leaf, span.start)?
            } else {
                span.leaf
            };
            let mut formats = match self.dom.node(run) {
                Some(DomNode::Text { formats, .. }) => formats.clone(),
                _ => continue,
            };
            if !formats.remove(&format) {
                formats.insert(format);
            }
            self.dom.set_formats(run, formats)?;
            touched.push(run);
        }

        if let (Some(first), Some(last)) = (touched.first(), touched.last()) {
            let last_len = self.dom.node(*last).map_or(0, DomNode::leaf_len);
            self.select_range(
                DomPoint::new(*first, 0),
                DomPoint::new(*last, last_len),
            );
        }
        Ok(Edit::structural())
    }
}

impl ComposerModel {
    pub fn toggle_inline_format(
        &mut self,
        format: InlineFormatType,
    ) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::ToggleInlineFormat(format))
    }

    pub fn bold(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.toggle_inline_format(InlineFormatType::Bold)
    }

    pub fn italic(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.toggle_inline_format(InlineFormatType::Italic)
    }

    pub fn underline(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.toggle_inline_format(InlineFormatType::Underline)
    }

    pub fn strike_through(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.toggle_inline_format(InlineFormatType::StrikeThrough)
    }

    pub fn inline_code(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.toggle_inline_format(InlineFormatType::InlineCode)
    }
}
