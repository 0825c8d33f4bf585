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

use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use crate::dom::dom_error::DomError;
use crate::dom::nodes::{Alignment, DomNode, DomNodeKind, FormatSet, NodeId};

/// Arenas smaller than this are never compacted.
const COMPACTION_MIN_SLOTS: usize = 256;

#[derive(Clone, Debug)]
struct DomEntry {
    node: DomNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    align: Option<Alignment>,
}

/// The document tree.
///
/// Nodes live in an arena indexed by [`NodeId`]. Children are ordered ID
/// lists and the parent link is a plain (non-owning) ID. Every entry sits
/// behind an [`Rc`], so cloning a `Dom` shares all nodes with the original
/// and a mutation only copies the entries it touches. History snapshots
/// rely on this.
///
/// Every structural primitive validates its arguments before touching the
/// arena: an `Err` always means the tree is unchanged.
#[derive(Clone, Debug)]
pub struct Dom {
    entries: Vec<Option<Rc<DomEntry>>>,
    root: NodeId,
}

impl Dom {
    /// A document holding a single empty paragraph.
    pub fn new() -> Self {
        let mut dom = Self::new_empty();
        let root = dom.root;
        let paragraph = dom.alloc(DomNode::Paragraph, Some(root));
        if let Some(entry) = dom.entry_mut(root) {
            entry.children.push(paragraph);
        }
        dom
    }

    /// A document with a root and nothing else. Only the parser starts
    /// from here; it guarantees at least one block before handing it out.
    pub(crate) fn new_empty() -> Self {
        let mut dom = Self {
            entries: Vec::new(),
            root: NodeId(0),
        };
        dom.root = dom.alloc(DomNode::Root, None);
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.entry(id).map(|e| &e.node)
    }

    pub fn lookup(&self, id: NodeId) -> Result<&DomNode, DomError> {
        self.node(id).ok_or(DomError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<DomNodeKind> {
        self.node(id).map(DomNode::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn align(&self, id: NodeId) -> Option<Alignment> {
        self.entry(id).and_then(|e| e.align)
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether slots freed by removals outnumber live nodes enough that
    /// the arena should be rebuilt with [`Dom::compact`].
    pub fn needs_compaction(&self) -> bool {
        self.entries.len() > COMPACTION_MIN_SLOTS
            && self.entries.len() > 4 * self.node_count()
    }

    /// Renumber the live nodes densely in document order, dropping freed
    /// slots. Returns the new ID of every live node.
    pub fn compact(&mut self) -> HashMap<NodeId, NodeId> {
        let order = self.iter();
        let remap: HashMap<NodeId, NodeId> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, NodeId(i as u32)))
            .collect();
        let entries: Vec<Option<Rc<DomEntry>>> = order
            .iter()
            .filter_map(|id| self.entry(*id))
            .map(|entry| {
                Some(Rc::new(DomEntry {
                    node: entry.node.clone(),
                    parent: entry.parent.and_then(|p| remap.get(&p).copied()),
                    children: entry
                        .children
                        .iter()
                        .filter_map(|c| remap.get(c).copied())
                        .collect(),
                    align: entry.align,
                }))
            })
            .collect();
        self.entries = entries;
        self.root = NodeId(0);
        remap
    }

    /// Ancestors of `id`, nearest first. Does not include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// The nearest node, starting at `id` itself, matching `pred`.
    pub fn closest(
        &self,
        id: NodeId,
        pred: impl Fn(&DomNode) -> bool,
    ) -> Option<NodeId> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if self.node(c).is_some_and(&pred) {
                return Some(c);
            }
            cur = self.parent(c);
        }
        None
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Concatenated text below `id`. Line breaks become `'\n'`, images
    /// contribute nothing.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.iter_subtree(id) {
            match self.node(n) {
                Some(DomNode::Text { content, .. }) => out.push_str(content),
                Some(DomNode::LineBreak) => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` first.
    pub fn iter_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for c in self.children(n).iter().rev() {
                stack.push(*c);
            }
        }
        out
    }

    /// Pre-order walk of the whole document.
    pub fn iter(&self) -> Vec<NodeId> {
        self.iter_subtree(self.root)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        idx.checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    // -----------------------------------------------------------------------
    // Structural primitives
    // -----------------------------------------------------------------------

    /// Insert `node` as the `index`th child of `parent`.
    pub fn insert_node(
        &mut self,
        parent: NodeId,
        index: usize,
        node: DomNode,
    ) -> Result<NodeId, DomError> {
        let parent_node = self.lookup(parent)?;
        Self::check_child(parent_node, &node)?;
        let len = self.children(parent).len();
        if index > len {
            return Err(DomError::OffsetOutOfRange {
                node: parent,
                offset: index,
            });
        }
        if matches!(parent_node, DomNode::CodeBlock) && len > 0 {
            return Err(DomError::CodeBlockContent);
        }

        let id = self.alloc(node, Some(parent));
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.insert(index, id);
        }
        Ok(id)
    }

    pub fn append_node(
        &mut self,
        parent: NodeId,
        node: DomNode,
    ) -> Result<NodeId, DomError> {
        let index = self.children(parent).len();
        self.insert_node(parent, index, node)
    }

    /// Detach `id` and drop its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<DomNode, DomError> {
        let node = self.lookup(id)?.clone();
        if id == self.root {
            return Err(DomError::RootOperation("removed"));
        }
        self.detach(id);
        for n in self.iter_subtree(id) {
            if let Some(slot) = self.entries.get_mut(n.index()) {
                *slot = None;
            }
        }
        Ok(node)
    }

    /// Move `id` (with its subtree) so it becomes the `index`th child of
    /// `new_parent`. `index` counts the children of `new_parent` after
    /// `id` has been detached.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        index: usize,
    ) -> Result<(), DomError> {
        let node = self.lookup(id)?;
        let parent_node = self.lookup(new_parent)?;
        if id == self.root {
            return Err(DomError::RootOperation("moved"));
        }
        if id == new_parent || self.is_ancestor_of(id, new_parent) {
            return Err(DomError::Cycle(id));
        }
        Self::check_child(parent_node, node)?;
        let same_parent = self.parent(id) == Some(new_parent);
        let len_after_detach =
            self.children(new_parent).len() - usize::from(same_parent);
        if index > len_after_detach {
            return Err(DomError::OffsetOutOfRange {
                node: new_parent,
                offset: index,
            });
        }
        if matches!(parent_node, DomNode::CodeBlock) && len_after_detach > 0 {
            return Err(DomError::CodeBlockContent);
        }

        self.detach(id);
        if let Some(entry) = self.entry_mut(new_parent) {
            entry.children.insert(index, id);
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = Some(new_parent);
        }
        Ok(())
    }

    /// Split a text node at character `offset`. The original node keeps the
    /// head; the returned node holds the tail and the same formats.
    pub fn split_text(
        &mut self,
        id: NodeId,
        offset: usize,
    ) -> Result<NodeId, DomError> {
        let (content, formats) = match self.lookup(id)? {
            DomNode::Text { content, formats } => {
                (content.clone(), formats.clone())
            }
            other => {
                return Err(DomError::UnexpectedKind {
                    expected: DomNodeKind::Text,
                    found: other.kind(),
                })
            }
        };
        let byte = byte_offset(&content, offset)
            .ok_or(DomError::OffsetOutOfRange { node: id, offset })?;
        let parent = self.parent(id).ok_or(DomError::UnknownNode(id))?;
        let index = self
            .index_in_parent(id)
            .ok_or(DomError::UnknownNode(id))?;
        if matches!(self.node(parent), Some(DomNode::CodeBlock)) {
            return Err(DomError::CodeBlockContent);
        }

        let (head, tail) = content.split_at(byte);
        self.set_text(id, head)?;
        let tail_id = self.alloc(
            DomNode::new_formatted_text(tail, formats),
            Some(parent),
        );
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.insert(index + 1, tail_id);
        }
        Ok(tail_id)
    }

    /// Split a container before child `at`. Children from `at` onwards move
    /// to a new sibling of the same kind (and alignment), which is
    /// returned.
    pub fn split_container(
        &mut self,
        id: NodeId,
        at: usize,
    ) -> Result<NodeId, DomError> {
        let node = self.lookup(id)?.clone();
        if id == self.root {
            return Err(DomError::RootOperation("split"));
        }
        if node.is_leaf() {
            return Err(DomError::UnexpectedKind {
                expected: DomNodeKind::Paragraph,
                found: node.kind(),
            });
        }
        let len = self.children(id).len();
        if at > len {
            return Err(DomError::OffsetOutOfRange {
                node: id,
                offset: at,
            });
        }
        let parent = self.parent(id).ok_or(DomError::UnknownNode(id))?;
        let index = self
            .index_in_parent(id)
            .ok_or(DomError::UnknownNode(id))?;
        let align = self.align(id);

        let new_id = self.alloc(node, Some(parent));
        let moved: Vec<NodeId> = match self.entry_mut(id) {
            Some(entry) => entry.children.split_off(at),
            None => Vec::new(),
        };
        for c in &moved {
            if let Some(entry) = self.entry_mut(*c) {
                entry.parent = Some(new_id);
            }
        }
        if let Some(entry) = self.entry_mut(new_id) {
            entry.children = moved;
            entry.align = align;
        }
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.insert(index + 1, new_id);
        }
        Ok(new_id)
    }

    /// Merge `right` into `left`. The two must be adjacent siblings of
    /// compatible kinds: two text runs with the same formats, two lists of
    /// the same type, two code blocks, two links to the same URL, or two
    /// containers where `left` can hold every child of `right`.
    pub fn merge_adjacent(
        &mut self,
        left: NodeId,
        right: NodeId,
    ) -> Result<(), DomError> {
        let left_node = self.lookup(left)?.clone();
        let right_node = self.lookup(right)?.clone();
        if self.next_sibling(left) != Some(right) {
            return Err(DomError::IncompatibleMerge(left, right));
        }

        match (&left_node, &right_node) {
            (
                DomNode::Text {
                    content: lc,
                    formats: lf,
                },
                DomNode::Text {
                    content: rc,
                    formats: rf,
                },
            ) if lf == rf => {
                let merged = format!("{lc}{rc}");
                self.set_text(left, &merged)?;
                self.remove(right)?;
                Ok(())
            }
            (DomNode::CodeBlock, DomNode::CodeBlock) => {
                let lt = self.text_content(left);
                let rt = self.text_content(right);
                let merged = match (lt.is_empty(), rt.is_empty()) {
                    (_, true) => lt,
                    (true, false) => rt,
                    (false, false) => format!("{lt}\n{rt}"),
                };
                self.set_code_text(left, &merged)?;
                self.remove(right)?;
                Ok(())
            }
            (DomNode::CodeBlock, _) | (_, DomNode::CodeBlock) => {
                Err(DomError::IncompatibleMerge(left, right))
            }
            (DomNode::List(a), DomNode::List(b)) if a != b => {
                Err(DomError::IncompatibleMerge(left, right))
            }
            (DomNode::Link { url: a }, DomNode::Link { url: b }) if a != b => {
                Err(DomError::IncompatibleMerge(left, right))
            }
            (l, r) if !l.is_leaf() && !r.is_leaf() => {
                let children = self.children(right).to_vec();
                for c in &children {
                    let child = self.lookup(*c)?;
                    if !l.can_contain(child) {
                        return Err(DomError::IncompatibleMerge(left, right));
                    }
                }
                let mut at = self.children(left).len();
                for c in children {
                    self.move_node(c, left, at)?;
                    at += 1;
                }
                self.remove(right)?;
                Ok(())
            }
            _ => Err(DomError::IncompatibleMerge(left, right)),
        }
    }

    /// Replace the node data of `id`, keeping its identity, children and
    /// position. Fails if the new node may not live where the old one did
    /// or cannot hold the existing children.
    pub fn replace_node(
        &mut self,
        id: NodeId,
        node: DomNode,
    ) -> Result<(), DomError> {
        let old = self.lookup(id)?;
        if id == self.root || matches!(node, DomNode::Root) {
            return Err(DomError::RootOperation("replaced"));
        }
        if old.is_leaf() != node.is_leaf() {
            return Err(DomError::UnexpectedKind {
                expected: old.kind(),
                found: node.kind(),
            });
        }
        if let Some(parent) = self.parent(id) {
            Self::check_child(self.lookup(parent)?, &node)?;
        }
        let children = self.children(id);
        if matches!(node, DomNode::CodeBlock) && children.len() > 1 {
            return Err(DomError::CodeBlockContent);
        }
        for c in children {
            Self::check_child(&node, self.lookup(*c)?)?;
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.node = node;
        }
        Ok(())
    }

    pub fn set_align(
        &mut self,
        id: NodeId,
        align: Option<Alignment>,
    ) -> Result<(), DomError> {
        let node = self.lookup(id)?;
        if !node.is_block() {
            return Err(DomError::UnexpectedKind {
                expected: DomNodeKind::Paragraph,
                found: node.kind(),
            });
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.align = align;
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        match self.entry_mut(id).map(|e| &mut e.node) {
            Some(DomNode::Text { content, .. }) => {
                *content = text.to_owned();
                Ok(())
            }
            Some(other) => Err(DomError::UnexpectedKind {
                expected: DomNodeKind::Text,
                found: other.kind(),
            }),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    pub fn set_formats(
        &mut self,
        id: NodeId,
        new_formats: FormatSet,
    ) -> Result<(), DomError> {
        if let Some(parent) = self.parent(id) {
            if matches!(self.node(parent), Some(DomNode::CodeBlock))
                && !new_formats.is_empty()
            {
                return Err(DomError::CodeBlockContent);
            }
        }
        match self.entry_mut(id).map(|e| &mut e.node) {
            Some(DomNode::Text { formats, .. }) => {
                *formats = new_formats;
                Ok(())
            }
            Some(other) => Err(DomError::UnexpectedKind {
                expected: DomNodeKind::Text,
                found: other.kind(),
            }),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    /// Set the text of a code block, creating or dropping its single run
    /// as needed.
    pub fn set_code_text(
        &mut self,
        block: NodeId,
        text: &str,
    ) -> Result<(), DomError> {
        let node = self.lookup(block)?;
        if !matches!(node, DomNode::CodeBlock) {
            return Err(DomError::UnexpectedKind {
                expected: DomNodeKind::CodeBlock,
                found: node.kind(),
            });
        }
        let run = self.children(block).first().copied();
        match run {
            Some(run) if text.is_empty() => {
                self.remove(run)?;
            }
            Some(run) => self.set_text(run, text)?,
            None if text.is_empty() => {}
            None => {
                self.append_node(block, DomNode::new_text(text))?;
            }
        }
        Ok(())
    }

    /// Insert `wrapper` in place of the children of `parent` in `range` and
    /// move those children into it.
    pub fn wrap_children(
        &mut self,
        parent: NodeId,
        range: Range<usize>,
        wrapper: DomNode,
    ) -> Result<NodeId, DomError> {
        let parent_node = self.lookup(parent)?;
        Self::check_child(parent_node, &wrapper)?;
        let children = self.children(parent);
        if range.start > range.end || range.end > children.len() {
            return Err(DomError::OffsetOutOfRange {
                node: parent,
                offset: range.end,
            });
        }
        let moved: Vec<NodeId> = children[range.clone()].to_vec();
        for c in &moved {
            Self::check_child(&wrapper, self.lookup(*c)?)?;
        }

        let wrapper_id = self.alloc(wrapper, Some(parent));
        if let Some(entry) = self.entry_mut(parent) {
            entry
                .children
                .splice(range, std::iter::once(wrapper_id));
        }
        for c in &moved {
            if let Some(entry) = self.entry_mut(*c) {
                entry.parent = Some(wrapper_id);
            }
        }
        if let Some(entry) = self.entry_mut(wrapper_id) {
            entry.children = moved;
        }
        Ok(wrapper_id)
    }

    /// Replace `id` with its children. Returns the moved children.
    pub fn unwrap_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, DomError> {
        self.lookup(id)?;
        if id == self.root {
            return Err(DomError::RootOperation("unwrapped"));
        }
        let parent = self.parent(id).ok_or(DomError::UnknownNode(id))?;
        let parent_node = self.lookup(parent)?;
        let children = self.children(id).to_vec();
        for c in &children {
            Self::check_child(parent_node, self.lookup(*c)?)?;
        }
        let index = self
            .index_in_parent(id)
            .ok_or(DomError::UnknownNode(id))?;

        for c in &children {
            if let Some(entry) = self.entry_mut(*c) {
                entry.parent = Some(parent);
            }
        }
        if let Some(entry) = self.entry_mut(parent) {
            entry
                .children
                .splice(index..index + 1, children.iter().copied());
        }
        if let Some(slot) = self.entries.get_mut(id.index()) {
            *slot = None;
        }
        Ok(children)
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Verify the structural invariants of the whole tree.
    pub fn check_invariants(&self) -> Result<(), DomError> {
        for id in self.iter() {
            let node = self.lookup(id)?;
            if id != self.root && matches!(node, DomNode::Root) {
                return Err(DomError::RootOperation("duplicated"));
            }
            let children = self.children(id);
            if matches!(node, DomNode::CodeBlock) && children.len() > 1 {
                return Err(DomError::CodeBlockContent);
            }
            for c in children {
                if self.parent(*c) != Some(id) {
                    return Err(DomError::UnknownNode(*c));
                }
                Self::check_child(node, self.lookup(*c)?)?;
            }
        }
        Ok(())
    }

    /// Panic if the invariants do not hold.
    pub fn explicitly_assert_invariants(&self) {
        if let Err(e) = self.check_invariants() {
            panic!("Document invariant violated: {e}\n{self:?}");
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_child(parent: &DomNode, child: &DomNode) -> Result<(), DomError> {
        if parent.can_contain(child) {
            Ok(())
        } else if matches!(parent, DomNode::CodeBlock) {
            Err(DomError::CodeBlockContent)
        } else {
            Err(DomError::InvalidChild {
                parent: parent.kind(),
                child: child.kind(),
            })
        }
    }

    fn entry(&self, id: NodeId) -> Option<&DomEntry> {
        self.entries.get(id.index()).and_then(|e| e.as_deref())
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut DomEntry> {
        self.entries
            .get_mut(id.index())
            .and_then(|e| e.as_mut())
            .map(Rc::make_mut)
    }

    fn alloc(&mut self, node: DomNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.entries.len() as u32);
        self.entries.push(Some(Rc::new(DomEntry {
            node,
            parent,
            children: Vec::new(),
            align: None,
        })));
        id
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(entry) = self.entry_mut(parent) {
                entry.children.retain(|c| *c != id);
            }
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = None;
        }
    }

    fn subtree_eq(&self, id: NodeId, other: &Dom, other_id: NodeId) -> bool {
        let (Some(a), Some(b)) = (self.entry(id), other.entry(other_id)) else {
            return false;
        };
        a.node == b.node
            && a.align == b.align
            && a.children.len() == b.children.len()
            && a.children
                .iter()
                .zip(b.children.iter())
                .all(|(x, y)| self.subtree_eq(*x, other, *y))
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: same nodes, alignment and shape. Node IDs are not
/// compared.
impl PartialEq for Dom {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

/// Byte index of the `offset`th character, or `None` if out of range.
pub(crate) fn byte_offset(s: &str, offset: usize) -> Option<usize> {
    if offset == 0 {
        return Some(0);
    }
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(offset)
}
