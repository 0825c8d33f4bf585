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

//! Block types and alignment.

use std::collections::HashMap;

use super::ComposerModel;
use crate::command::{BlockType, Command};
use crate::command_error::CommandError;
use crate::composer_state::{ComposerState, Edit};
use crate::composer_update::ComposerUpdate;
use crate::dom::{Alignment, DomNode, HeadingLevel, NodeId};

impl BlockType {
    pub(crate) fn to_node(self) -> DomNode {
        match self {
            Self::Paragraph => DomNode::Paragraph,
            Self::Heading(level) => DomNode::Heading(level),
            Self::Quote => DomNode::Quote,
            Self::CodeBlock => DomNode::CodeBlock,
        }
    }
}

impl ComposerState {
    /// Text blocks touched by the selection, or an error if there are none.
    pub(crate) fn selected_blocks(&self) -> Result<Vec<NodeId>, CommandError> {
        let range = self.range()?;
        let blocks = self.dom.text_blocks_between(range.start, range.end);
        if blocks.is_empty() {
            return Err(CommandError::InvalidSelection(String::from(
                "the selection does not touch any block",
            )));
        }
        Ok(blocks)
    }

    pub(crate) fn set_block_type(
        &mut self,
        block_type: BlockType,
    ) -> Result<Edit, CommandError> {
        let blocks = self.selected_blocks()?;
        let target = block_type.to_node();
        if target == DomNode::CodeBlock {
            self.check_code_convertible(&blocks)?;
        }
        let anchors = self.capture_anchors();
        let mut replaced = HashMap::new();
        let mut changed = false;

        for block in blocks {
            let mut block = block;
            if matches!(self.dom.node(block), Some(DomNode::ListItem)) {
                let paragraph = self.lift_to_root(block)?;
                replaced.insert(block, paragraph);
                block = paragraph;
                changed = true;
            }
            let Some(current) = self.dom.node(block).cloned() else {
                continue;
            };
            if current == target {
                continue;
            }
            changed = true;
            match (&current, &target) {
                (_, DomNode::CodeBlock) => self.inline_to_code(block)?,
                (DomNode::CodeBlock, _) => {
                    self.code_to_inline(block, target.clone())?
                }
                _ => self.dom.replace_node(block, target.clone())?,
            }
        }

        if !changed {
            return Ok(Edit::unchanged());
        }
        self.restore_anchors(anchors, &replaced);
        Ok(Edit::structural())
    }

    /// Code blocks hold plain text only, so images and links would be lost.
    fn check_code_convertible(&self, blocks: &[NodeId]) -> Result<(), CommandError> {
        let lossy = blocks.iter().flat_map(|b| self.dom.iter_subtree(*b)).find(|n| {
            matches!(self.dom.node(*n), Some(DomNode::Image(_) | DomNode::Link { .. }))
        });
        match lossy.and_then(|n| self.dom.kind(n)) {
            Some(kind) => Err(CommandError::InvalidSelection(format!(
                "a code block cannot hold {kind}"
            ))),
            None => Ok(()),
        }
    }

    /// Flatten the inline content of `block` into the single run of a code
    /// block. Line breaks become newlines.
    pub(crate) fn inline_to_code(
        &mut self,
        block: NodeId,
    ) -> Result<(), CommandError> {
        let text = self.dom.block_text(block);
        for child in self.dom.children(block).to_vec() {
            self.dom.remove(child)?;
        }
        self.dom.replace_node(block, DomNode::CodeBlock)?;
        self.dom.set_code_text(block, &text)?;
        Ok(())
    }

    /// Turn a code block into `target`, one line break per newline.
    pub(crate) fn code_to_inline(
        &mut self,
        block: NodeId,
        target: DomNode,
    ) -> Result<(), CommandError> {
        let text = self.dom.text_content(block);
        for child in self.dom.children(block).to_vec() {
            self.dom.remove(child)?;
        }
        self.dom.replace_node(block, target)?;
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.dom.append_node(block, DomNode::LineBreak)?;
            }
            if !line.is_empty() {
                self.dom.append_node(block, DomNode::new_text(line))?;
            }
        }
        Ok(())
    }

    pub(crate) fn align_block(
        &mut self,
        alignment: Alignment,
    ) -> Result<Edit, CommandError> {
        let blocks = self.selected_blocks()?;
        let mut changed = false;
        for block in blocks {
            if self.dom.align(block) != Some(alignment) {
                self.dom.set_align(block, Some(alignment))?;
                changed = true;
            }
        }
        Ok(if changed {
            Edit::structural()
        } else {
            Edit::unchanged()
        })
    }
}

impl ComposerModel {
    pub fn set_block_type(
        &mut self,
        block_type: BlockType,
    ) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::SetBlockType(block_type))
    }

    pub fn paragraph(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.set_block_type(BlockType::Paragraph)
    }

    pub fn heading(
        &mut self,
        level: HeadingLevel,
    ) -> Result<ComposerUpdate, CommandError> {
        self.set_block_type(BlockType::Heading(level))
    }

    pub fn quote(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.set_block_type(BlockType::Quote)
    }

    pub fn code_block(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.set_block_type(BlockType::CodeBlock)
    }

    pub fn align_block(
        &mut self,
        alignment: Alignment,
    ) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::AlignBlock(alignment))
    }
}
