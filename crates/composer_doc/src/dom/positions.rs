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

//! Ordering of positions and the mapping between points and offsets.
//!
//! Inside a text block every leaf occupies `leaf_len()` caret positions and
//! the block offset of a point is the number of positions before it. At
//! document level consecutive text blocks are separated by one position.

use std::cmp::Ordering;

use crate::dom::dom_error::DomError;
use crate::dom::{Dom, DomNode, NodeId};
use crate::selection::DomPoint;

/// Sort key of a point: the child-index path of the node followed by the
/// offset. A container point `(c, i)` gets the path of its `i`th child, so
/// it sorts just before that child's content.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PositionKey {
    path: Vec<usize>,
    offset: usize,
}

/// The part `[start, end)` of a leaf covered by a range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafSpan {
    pub leaf: NodeId,
    pub start: usize,
    pub end: usize,
}

impl LeafSpan {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Dom {
    /// Child indices from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Option<Vec<usize>> {
        if !self.contains(id) {
            return None;
        }
        let mut path = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            path.push(self.index_in_parent(cur)?);
            cur = parent;
        }
        if cur != self.root() {
            return None;
        }
        path.reverse();
        Some(path)
    }

    /// Whether `point` addresses a caret position: inside a leaf, or
    /// between the children of a text block or a link.
    pub fn is_valid_point(&self, point: DomPoint) -> bool {
        match self.node(point.node) {
            Some(n) if n.is_leaf() => point.offset <= n.leaf_len(),
            Some(n) if n.is_text_block() || matches!(n, DomNode::Link { .. }) => {
                point.offset <= self.children(point.node).len()
            }
            _ => false,
        }
    }

    pub fn position_key(&self, point: DomPoint) -> Option<PositionKey> {
        let node = self.node(point.node)?;
        let mut path = self.path(point.node)?;
        if node.is_leaf() {
            Some(PositionKey {
                path,
                offset: point.offset,
            })
        } else {
            path.push(point.offset);
            Some(PositionKey { path, offset: 0 })
        }
    }

    pub fn compare_points(&self, a: DomPoint, b: DomPoint) -> Option<Ordering> {
        Some(self.position_key(a)?.cmp(&self.position_key(b)?))
    }

    /// All text blocks in document order.
    pub fn text_blocks(&self) -> Vec<NodeId> {
        self.iter()
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(DomNode::is_text_block))
            .collect()
    }

    /// The text block `id` belongs to (`id` itself if it is one).
    pub fn text_block_of(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, DomNode::is_text_block)
    }

    /// Text blocks from the block holding `start` to the block holding
    /// `end`, inclusive, in document order.
    pub fn text_blocks_between(
        &self,
        start: DomPoint,
        end: DomPoint,
    ) -> Vec<NodeId> {
        let (Some(first), Some(last)) =
            (self.text_block_of(start.node), self.text_block_of(end.node))
        else {
            return Vec::new();
        };
        let blocks = self.text_blocks();
        let (Some(i), Some(j)) = (
            blocks.iter().position(|b| *b == first),
            blocks.iter().position(|b| *b == last),
        ) else {
            return Vec::new();
        };
        if i <= j {
            blocks[i..=j].to_vec()
        } else {
            Vec::new()
        }
    }

    /// Leaves of a text block in order. Nested lists belong to their own
    /// text blocks and are skipped.
    pub fn block_leaves(&self, block: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_block_leaves(block, &mut out);
        out
    }

    fn collect_block_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for c in self.children(id) {
            match self.node(*c) {
                Some(n) if n.is_leaf() => out.push(*c),
                Some(DomNode::Link { .. }) => self.collect_block_leaves(*c, out),
                _ => {}
            }
        }
    }

    /// Number of caret positions in a text block.
    pub fn block_len(&self, block: NodeId) -> usize {
        self.block_leaves(block)
            .iter()
            .filter_map(|l| self.node(*l))
            .map(DomNode::leaf_len)
            .sum()
    }

    /// The text block holding `point` and the offset of `point` in it.
    pub fn offset_in_block(&self, point: DomPoint) -> Option<(NodeId, usize)> {
        let block = self.text_block_of(point.node)?;
        let leaves = self.block_leaves(block);
        let point_node = self.node(point.node)?;

        let mut offset = 0;
        if point_node.is_leaf() {
            for leaf in leaves {
                if leaf == point.node {
                    return Some((block, offset + point.offset));
                }
                offset += self.node(leaf).map_or(0, DomNode::leaf_len);
            }
            None
        } else {
            let key = self.position_key(point)?;
            for leaf in leaves {
                let leaf_key = self.position_key(DomPoint::new(leaf, 0))?;
                if leaf_key < key {
                    offset += self.node(leaf).map_or(0, DomNode::leaf_len);
                }
            }
            Some((block, offset))
        }
    }

    /// The point at `offset` in a text block. At a boundary between two
    /// leaves the end of a preceding text run wins, so typing continues
    /// that run. An empty block yields the container point `(block, 0)`.
    pub fn point_at_block_offset(&self, block: NodeId, offset: usize) -> DomPoint {
        let leaves = self.block_leaves(block);
        let mut pos = 0;
        for leaf in &leaves {
            let Some(node) = self.node(*leaf) else {
                continue;
            };
            let len = node.leaf_len();
            let is_text = matches!(node, DomNode::Text { .. });
            if offset < pos + len || (offset == pos + len && is_text) {
                return DomPoint::new(*leaf, offset.saturating_sub(pos));
            }
            pos += len;
        }
        match leaves.last() {
            Some(last) => DomPoint::new(
                *last,
                self.node(*last).map_or(0, DomNode::leaf_len),
            ),
            None => DomPoint::new(block, 0),
        }
    }

    /// Offset of `point` counted over the whole document, with one position
    /// between consecutive text blocks.
    pub fn document_offset(&self, point: DomPoint) -> Option<usize> {
        let (block, in_block) = self.offset_in_block(point)?;
        let mut offset = 0;
        for b in self.text_blocks() {
            if b == block {
                return Some(offset + in_block);
            }
            offset += self.block_len(b) + 1;
        }
        None
    }

    /// The point at a document-level offset. Offsets past the end clamp to
    /// the end of the last block.
    pub fn point_at_document_offset(&self, offset: usize) -> Option<DomPoint> {
        let blocks = self.text_blocks();
        let mut start = 0;
        for b in &blocks {
            let len = self.block_len(*b);
            if offset <= start + len {
                return Some(self.point_at_block_offset(*b, offset - start));
            }
            start += len + 1;
        }
        let last = blocks.last()?;
        Some(self.point_at_block_offset(*last, self.block_len(*last)))
    }

    /// The parts of every leaf covered by the range `start..end`, in
    /// document order.
    pub fn leaf_spans(&self, start: DomPoint, end: DomPoint) -> Vec<LeafSpan> {
        let (Some(start_key), Some(end_key)) =
            (self.position_key(start), self.position_key(end))
        else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for id in self.iter() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if !node.is_leaf() {
                continue;
            }
            let len = node.leaf_len();
            let Some(head) = self.position_key(DomPoint::new(id, 0)) else {
                continue;
            };
            let Some(tail) = self.position_key(DomPoint::new(id, len)) else {
                continue;
            };

            let lo = if start.node == id {
                start.offset
            } else if start_key <= head {
                0
            } else {
                continue;
            };
            let hi = if end.node == id {
                end.offset
            } else if end_key >= tail && end_key > head {
                len
            } else if end_key >= tail && len == 0 {
                0
            } else {
                continue;
            };
            if lo <= hi {
                out.push(LeafSpan {
                    leaf: id,
                    start: lo,
                    end: hi,
                });
            }
        }
        out
    }

    /// Split the inline content of the enclosing text block at `point`,
    /// breaking text runs and links as needed. Returns the block and the
    /// child index of the boundary. Not valid inside code blocks, whose
    /// single run is edited as a string.
    pub fn split_inline_at(
        &mut self,
        point: DomPoint,
    ) -> Result<(NodeId, usize), DomError> {
        let node = self.lookup(point.node)?.clone();
        let block = self
            .text_block_of(point.node)
            .ok_or(DomError::UnknownNode(point.node))?;

        let (mut parent, mut index) = if node.is_leaf() {
            let parent = self
                .parent(point.node)
                .ok_or(DomError::UnknownNode(point.node))?;
            let idx = self
                .index_in_parent(point.node)
                .ok_or(DomError::UnknownNode(point.node))?;
            let len = node.leaf_len();
            if point.offset > len {
                return Err(DomError::OffsetOutOfRange {
                    node: point.node,
                    offset: point.offset,
                });
            }
            if point.offset == 0 {
                (parent, idx)
            } else if point.offset == len {
                (parent, idx + 1)
            } else {
                self.split_text(point.node, point.offset)?;
                (parent, idx + 1)
            }
        } else {
            (point.node, point.offset)
        };

        while parent != block {
            let outer = self.parent(parent).ok_or(DomError::UnknownNode(parent))?;
            let at = self
                .index_in_parent(parent)
                .ok_or(DomError::UnknownNode(parent))?;
            let len = self.children(parent).len();
            if index == 0 {
                index = at;
            } else if index >= len {
                index = at + 1;
            } else {
                self.split_container(parent, index)?;
                index = at + 1;
            }
            parent = outer;
        }
        Ok((block, index))
    }

    /// Remove every empty text run below `id`.
    pub(crate) fn prune_empty_text(&mut self, id: NodeId) -> Result<(), DomError> {
        let empty: Vec<NodeId> = self
            .iter_subtree(id)
            .into_iter()
            .filter(|n| self.node(*n).is_some_and(DomNode::is_empty_text))
            .collect();
        for n in empty {
            self.remove(n)?;
        }
        Ok(())
    }
}
