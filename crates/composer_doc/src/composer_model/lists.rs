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

//! Ordered and unordered lists.
//!
//! `insert_list` is a toggle. When every selected block is already an item
//! of a list of the requested type the items are taken out of the list;
//! otherwise every selected block ends up in a list of that type.

use std::collections::HashMap;

use super::ComposerModel;
use crate::command::Command;
use crate::command_error::CommandError;
use crate::composer_state::{ComposerState, Edit};
use crate::composer_update::ComposerUpdate;
use crate::dom::{DomNode, ListType, NodeId};

impl ComposerState {
    pub(crate) fn insert_list(
        &mut self,
        list_type: ListType,
    ) -> Result<Edit, CommandError> {
        let blocks = self.selected_blocks()?;
        let anchors = self.capture_anchors();
        let mut replaced = HashMap::new();

        let all_in_list = blocks
            .iter()
            .all(|b| self.list_type_of_item(*b) == Some(list_type));

        if all_in_list {
            for item in blocks {
                if self.is_nested_item(item) {
                    self.outdent_item(item)?;
                } else {
                    let paragraph = self.extract_item(item)?;
                    replaced.insert(item, paragraph);
                }
            }
        } else {
            for block in blocks {
                match self.dom.node(block).cloned() {
                    Some(DomNode::ListItem) => {
                        let list = self.parent_of(block)?;
                        if self.dom.node(list) != Some(&DomNode::List(list_type))
                        {
                            self.dom.replace_node(list, DomNode::List(list_type))?;
                        }
                    }
                    Some(DomNode::CodeBlock) => {
                        self.code_to_inline(block, DomNode::Paragraph)?;
                        let item = self.wrap_in_list(block, list_type)?;
                        replaced.insert(block, item);
                    }
                    Some(_) => {
                        let item = self.wrap_in_list(block, list_type)?;
                        replaced.insert(block, item);
                    }
                    None => {}
                }
            }
            let root = self.dom.root();
            self.merge_adjacent_lists(root)?;
        }

        self.restore_anchors(anchors, &replaced);
        Ok(Edit::structural())
    }

    pub(crate) fn list_type_of_item(&self, block: NodeId) -> Option<ListType> {
        if !matches!(self.dom.node(block), Some(DomNode::ListItem)) {
            return None;
        }
        match self.dom.node(self.dom.parent(block)?) {
            Some(DomNode::List(list_type)) => Some(*list_type),
            _ => None,
        }
    }

    pub(crate) fn is_nested_item(&self, item: NodeId) -> bool {
        self.dom
            .parent(item)
            .and_then(|list| self.dom.parent(list))
            .is_some_and(|p| matches!(self.dom.node(p), Some(DomNode::ListItem)))
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Result<NodeId, CommandError> {
        self.dom.parent(id).ok_or_else(|| {
            CommandError::StructuralViolation(format!("node {id} has no parent"))
        })
    }

    fn index_of(&self, id: NodeId) -> Result<usize, CommandError> {
        self.dom.index_in_parent(id).ok_or_else(|| {
            CommandError::StructuralViolation(format!("node {id} has no parent"))
        })
    }

    /// Move a top-level block into a list item. The item joins the list
    /// right before the block if it has the same type, or a new list.
    fn wrap_in_list(
        &mut self,
        block: NodeId,
        list_type: ListType,
    ) -> Result<NodeId, CommandError> {
        let parent = self.parent_of(block)?;
        let index = self.index_of(block)?;
        let list = match self.dom.prev_sibling(block) {
            Some(prev) if self.dom.node(prev) == Some(&DomNode::List(list_type)) => {
                prev
            }
            _ => self
                .dom
                .insert_node(parent, index, DomNode::List(list_type))?,
        };
        let item = self.dom.append_node(list, DomNode::ListItem)?;
        self.dom.set_align(item, self.dom.align(block))?;
        for (i, child) in self.dom.children(block).to_vec().into_iter().enumerate()
        {
            self.dom.move_node(child, item, i)?;
        }
        self.dom.remove(block)?;
        Ok(item)
    }

    /// Take a top-level list item out of its list as a paragraph. Items
    /// after it stay in a list below the paragraph and the item's own
    /// nested lists move up to the top level.
    pub(crate) fn extract_item(
        &mut self,
        item: NodeId,
    ) -> Result<NodeId, CommandError> {
        let list = self.parent_of(item)?;
        let parent = self.parent_of(list)?;
        let index = self.index_of(item)?;
        if index + 1 < self.dom.children(list).len() {
            self.dom.split_container(list, index + 1)?;
        }

        let list_index = self.index_of(list)?;
        let paragraph =
            self.dom
                .insert_node(parent, list_index + 1, DomNode::Paragraph)?;
        self.dom.set_align(paragraph, self.dom.align(item))?;

        let mut inline_at = 0;
        let mut list_at = list_index + 2;
        for child in self.dom.children(item).to_vec() {
            if matches!(self.dom.node(child), Some(DomNode::List(_))) {
                self.dom.move_node(child, parent, list_at)?;
                list_at += 1;
            } else {
                self.dom.move_node(child, paragraph, inline_at)?;
                inline_at += 1;
            }
        }
        self.dom.remove(item)?;
        if self.dom.children(list).is_empty() {
            self.dom.remove(list)?;
        }
        self.merge_adjacent_lists(parent)?;
        Ok(paragraph)
    }

    /// Move a nested list item one level up, right after the item it was
    /// nested in. Its later siblings become its own nested list.
    pub(crate) fn outdent_item(&mut self, item: NodeId) -> Result<(), CommandError> {
        let list = self.parent_of(item)?;
        let parent_item = self.parent_of(list)?;
        let outer_list = self.parent_of(parent_item)?;
        let index = self.index_of(item)?;

        if index + 1 < self.dom.children(list).len() {
            let tail = self.dom.split_container(list, index + 1)?;
            let at = self.dom.children(item).len();
            self.dom.move_node(tail, item, at)?;
        }
        let at = self.index_of(parent_item)? + 1;
        self.dom.move_node(item, outer_list, at)?;
        if self.dom.children(list).is_empty() {
            self.dom.remove(list)?;
        }
        self.merge_adjacent_lists(item)?;
        Ok(())
    }

    /// Outdent `item` until it is top-level, then take it out of its list.
    pub(crate) fn lift_to_root(
        &mut self,
        item: NodeId,
    ) -> Result<NodeId, CommandError> {
        while self.is_nested_item(item) {
            self.outdent_item(item)?;
        }
        self.extract_item(item)
    }
}

impl ComposerModel {
    pub fn insert_list(
        &mut self,
        list_type: ListType,
    ) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::InsertList(list_type))
    }

    pub fn ordered_list(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.insert_list(ListType::Ordered)
    }

    pub fn unordered_list(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.insert_list(ListType::Unordered)
    }
}
