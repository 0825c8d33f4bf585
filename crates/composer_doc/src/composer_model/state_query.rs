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

//! Toolbar state derived from the selection.

use std::collections::HashMap;

use strum::IntoEnumIterator;

use super::ComposerModel;
use crate::composer_action::{ActionState, ComposerAction};
use crate::composer_state::ComposerState;
use crate::dom::{Alignment, DomNode, FormatSet, HeadingLevel, InlineFormatType, ListType, NodeId};
use crate::selection::{DomPoint, SelectionRange};

impl ComposerState {
    /// Formats the selection has: those shared by every selected text run,
    /// or those typed text would get at a collapsed caret.
    pub(crate) fn active_formats(&self, range: SelectionRange) -> FormatSet {
        if range.is_collapsed() {
            return self.typed_formats(range.start);
        }
        let mut shared: Option<FormatSet> = None;
        for span in self.dom.leaf_spans(range.start, range.end) {
            if span.is_empty() {
                continue;
            }
            if let Some(DomNode::Text { formats, .. }) = self.dom.node(span.leaf) {
                shared = Some(match shared {
                    Some(acc) => acc.intersection(formats).copied().collect(),
                    None => formats.clone(),
                });
            }
        }
        shared.unwrap_or_else(|| self.typed_formats(range.start))
    }

    /// The link the selection starts in or covers.
    pub(crate) fn selected_link(&self, range: SelectionRange) -> Option<NodeId> {
        self.link_at(range.start).or_else(|| {
            self.dom
                .leaf_spans(range.start, range.end)
                .into_iter()
                .filter(|s| !s.is_empty())
                .find_map(|s| self.link_at(DomPoint::new(s.leaf, 0)))
        })
    }
}

impl ComposerModel {
    /// The state of every toolbar control for the current selection.
    pub fn action_states(&self) -> HashMap<ComposerAction, ActionState> {
        let mut states = HashMap::new();
        states.insert(ComposerAction::Undo, enabled_if(self.history.can_undo()));
        states.insert(ComposerAction::Redo, enabled_if(self.history.can_redo()));

        let state = &self.state;
        let Ok(range) = state.range() else {
            for action in ComposerAction::iter() {
                states.entry(action).or_insert(ActionState::Disabled);
            }
            return states;
        };
        let dom = &state.dom;
        let blocks = dom.text_blocks_between(range.start, range.end);
        let all = |pred: &dyn Fn(NodeId) -> bool| {
            !blocks.is_empty() && blocks.iter().all(|b| pred(*b))
        };
        let in_code = blocks
            .iter()
            .any(|b| matches!(dom.node(*b), Some(DomNode::CodeBlock)));

        let formats = state.active_formats(range);
        for format in InlineFormatType::iter() {
            let action_state = if in_code {
                ActionState::Disabled
            } else {
                reversed_if(formats.contains(&format))
            };
            states.insert(ComposerAction::from_format(format), action_state);
        }

        let is_kind = |kind: DomNode| move |b: NodeId| dom.node(b) == Some(&kind);
        states.insert(
            ComposerAction::Paragraph,
            reversed_if(all(&is_kind(DomNode::Paragraph))),
        );
        for level in [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3] {
            states.insert(
                ComposerAction::from_heading(level),
                reversed_if(all(&is_kind(DomNode::Heading(level)))),
            );
        }
        states.insert(ComposerAction::Quote, reversed_if(all(&is_kind(DomNode::Quote))));
        states.insert(
            ComposerAction::CodeBlock,
            reversed_if(all(&is_kind(DomNode::CodeBlock))),
        );
        for (action, list_type) in [
            (ComposerAction::OrderedList, ListType::Ordered),
            (ComposerAction::UnorderedList, ListType::Unordered),
        ] {
            states.insert(
                action,
                reversed_if(all(&|b: NodeId| {
                    state.list_type_of_item(b) == Some(list_type)
                })),
            );
        }
        for alignment in Alignment::iter() {
            states.insert(
                ComposerAction::from_alignment(alignment),
                reversed_if(all(&|b: NodeId| {
                    dom.align(b).unwrap_or(Alignment::Left) == alignment
                })),
            );
        }

        let link_state = if in_code {
            ActionState::Disabled
        } else {
            reversed_if(state.selected_link(range).is_some())
        };
        states.insert(ComposerAction::Link, link_state);

        let image_blocked = in_code
            || state.link_interior(range.start).is_some()
            || state.link_interior(range.end).is_some();
        states.insert(ComposerAction::Image, enabled_if(!image_blocked));
        states
    }

    /// URL of the link at the selection, for prefilling a link dialog.
    pub fn link_at_selection(&self) -> Option<String> {
        let range = self.state.range().ok()?;
        let link = self.state.selected_link(range)?;
        match self.state.dom.node(link) {
            Some(DomNode::Link { url }) => Some(url.clone()),
            _ => None,
        }
    }
}

fn enabled_if(condition: bool) -> ActionState {
    if condition {
        ActionState::Enabled
    } else {
        ActionState::Disabled
    }
}

fn reversed_if(condition: bool) -> ActionState {
    if condition {
        ActionState::Reversed
    } else {
        ActionState::Enabled
    }
}
