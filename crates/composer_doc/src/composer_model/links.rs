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

//! Link operations: set, insert with text, and remove hyperlinks.
//!
//! Links never nest and hold only text and line breaks. Like the text they
//! cover they do not grow when the user types at their edges.

use std::collections::HashMap;

use url::Url;

use super::ComposerModel;
use crate::command::Command;
use crate::command_error::CommandError;
use crate::composer_state::{ComposerState, Edit};
use crate::composer_update::ComposerUpdate;
use crate::dom::{DomNode, NodeId};
use crate::selection::DomPoint;

pub(crate) const LINK_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Accept absolute URLs with one of `schemes`, and relative references.
pub(crate) fn check_url(url: &str, schemes: &[&str]) -> Result<(), CommandError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CommandError::InvalidUrl(url.to_owned()));
    }
    match Url::parse(trimmed) {
        Ok(parsed) if schemes.contains(&parsed.scheme()) => Ok(()),
        Ok(_) => Err(CommandError::InvalidUrl(url.to_owned())),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(()),
        Err(_) => Err(CommandError::InvalidUrl(url.to_owned())),
    }
}

impl ComposerState {
    /// The link `point` lies strictly inside of, not at one of its edges.
    pub(crate) fn link_interior(&self, point: DomPoint) -> Option<NodeId> {
        let link = self.link_at(point)?;
        let (_, at) = self.dom.offset_in_block(point)?;
        let (_, start) = self.dom.offset_in_block(DomPoint::new(link, 0))?;
        let end = start
            + self
                .dom
                .block_leaves(link)
                .iter()
                .filter_map(|l| self.dom.node(*l))
                .map(DomNode::leaf_len)
                .sum::<usize>();
        (at > start && at < end).then_some(link)
    }

    pub(crate) fn insert_link(&mut self, url: &str) -> Result<Edit, CommandError> {
        check_url(url, LINK_SCHEMES)?;
        let range = self.range()?;
        if range.is_collapsed() {
            return Err(CommandError::InvalidSelection(String::from(
                "select the text to turn into a link",
            )));
        }
        let blocks = self.dom.text_blocks_between(range.start, range.end);
        if blocks
            .iter()
            .any(|b| matches!(self.dom.node(*b), Some(DomNode::CodeBlock)))
        {
            return Err(CommandError::InvalidSelection(String::from(
                "code blocks cannot hold links",
            )));
        }

        let spans: Vec<_> = self
            .dom
            .leaf_spans(range.start, range.end)
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if spans.is_empty() {
            return Err(CommandError::InvalidSelection(String::from(
                "the selection holds no text",
            )));
        }
        for span in &spans {
            if self.link_at(DomPoint::new(span.leaf, 0)).is_some() {
                return Err(CommandError::StructuralViolation(String::from(
                    "links cannot be nested",
                )));
            }
            if matches!(self.dom.node(span.leaf), Some(DomNode::Image(_))) {
                return Err(CommandError::StructuralViolation(String::from(
                    "links cannot hold images",
                )));
            }
        }

        // Split at the end first: it only adds nodes after the start point,
        // which stays valid. The first node past the end marks the boundary
        // since splitting at the start may shift indices.
        let (end_block, end_index) = self.dom.split_inline_at(range.end)?;
        let first_excluded = self.dom.children(end_block).get(end_index).copied();
        let (start_block, start_index) = self.dom.split_inline_at(range.start)?;

        let mut links = Vec::new();
        for block in blocks {
            let lo = if block == start_block { start_index } else { 0 };
            let hi = if block == end_block {
                match first_excluded {
                    Some(next) => self.dom.index_in_parent(next).unwrap_or(0),
                    None => self.dom.children(block).len(),
                }
            } else {
                self.inline_end(block)
            };
            if lo < hi {
                links.push(self.dom.wrap_children(
                    block,
                    lo..hi,
                    DomNode::new_link(url.trim()),
                )?);
            }
        }

        let (Some(first), Some(last)) = (links.first(), links.last()) else {
            return Err(CommandError::InvalidSelection(String::from(
                "the selection holds no text",
            )));
        };
        let last_len = self.dom.children(*last).len();
        self.select_range(DomPoint::new(*first, 0), DomPoint::new(*last, last_len));
        Ok(Edit::structural())
    }

    /// Child index where the nested lists of a list item begin, or the
    /// child count for other blocks.
    fn inline_end(&self, block: NodeId) -> usize {
        let children = self.dom.children(block);
        children
            .iter()
            .position(|c| matches!(self.dom.node(*c), Some(DomNode::List(_))))
            .unwrap_or(children.len())
    }

    pub(crate) fn insert_link_with_text(
        &mut self,
        url: &str,
        text: &str,
    ) -> Result<Edit, CommandError> {
        check_url(url, LINK_SCHEMES)?;
        if text.is_empty() {
            return Err(CommandError::InvalidSelection(String::from(
                "the link text is empty",
            )));
        }
        let range = self.range()?;
        for point in [range.start, range.end] {
            if self.in_code_block(point) {
                return Err(CommandError::InvalidSelection(String::from(
                    "code blocks cannot hold links",
                )));
            }
            if self.link_interior(point).is_some() {
                return Err(CommandError::StructuralViolation(String::from(
                    "links cannot be nested",
                )));
            }
        }

        let caret = if range.is_collapsed() {
            range.start
        } else {
            self.delete_range(range)?
        };
        let (block, index) = self.dom.split_inline_at(caret)?;
        let link = self
            .dom
            .insert_node(block, index, DomNode::new_link(url.trim()))?;
        self.dom.append_node(link, DomNode::new_text(text))?;
        self.set_caret(DomPoint::new(block, index + 1));
        self.pending_formats.clear();
        Ok(Edit::structural())
    }

    pub(crate) fn remove_link(&mut self) -> Result<Edit, CommandError> {
        let range = self.range()?;
        let mut links: Vec<NodeId> = Vec::new();
        if range.is_collapsed() {
            links.extend(self.link_at(range.start));
        } else {
            for span in self.dom.leaf_spans(range.start, range.end) {
                if span.is_empty() {
                    continue;
                }
                if let Some(link) = self.link_at(DomPoint::new(span.leaf, 0)) {
                    if !links.contains(&link) {
                        links.push(link);
                    }
                }
            }
        }
        if links.is_empty() {
            return Ok(Edit::unchanged());
        }

        let anchors = self.capture_anchors();
        for link in links {
            self.dom.unwrap_node(link)?;
        }
        self.restore_anchors(anchors, &HashMap::new());
        Ok(Edit::structural())
    }
}

impl ComposerModel {
    /// Turn the selected text into a link to `url`.
    pub fn insert_link(&mut self, url: &str) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::InsertLink {
            url: url.to_owned(),
        })
    }

    /// Replace the selection with `text` linking to `url`.
    pub fn insert_link_with_text(
        &mut self,
        url: &str,
        text: &str,
    ) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::InsertLinkWithText {
            url: url.to_owned(),
            text: text.to_owned(),
        })
    }

    /// Remove the links touched by the selection, or the link around the
    /// caret.
    pub fn remove_link(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::RemoveLink)
    }
}
