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

//! Typing and deleting: replace_text, enter, backspace and delete, plus
//! the range deletion and block joining they share.

use super::ComposerModel;
use crate::command::Command;
use crate::command_error::CommandError;
use crate::composer_state::{ComposerState, Edit};
use crate::composer_update::ComposerUpdate;
use crate::dom::dom_struct::byte_offset;
use crate::dom::{DomNode, NodeId};
use crate::history::EditKind;
use crate::selection::{DomPoint, SelectionRange};

fn invalid_point() -> CommandError {
    CommandError::InvalidSelection(String::from(
        "the selection is not inside a text block",
    ))
}

/// `s` without the characters in `from..to`.
fn remove_chars(s: &str, from: usize, to: usize) -> String {
    s.chars()
        .enumerate()
        .filter(|(i, _)| *i < from || *i >= to)
        .map(|(_, c)| c)
        .collect()
}

impl ComposerState {
    pub(crate) fn replace_text(&mut self, text: &str) -> Result<Edit, CommandError> {
        let range = self.range()?;
        // NUL does not survive a markup round trip.
        let text = text
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\0', "");
        if range.is_collapsed() && text.is_empty() {
            return Ok(Edit::unchanged());
        }

        let mut caret = if range.is_collapsed() {
            range.start
        } else {
            self.delete_range(range)?
        };
        let mut split = false;
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                caret = self.break_block_at(caret)?;
                split = true;
            }
            if !line.is_empty() {
                caret = self.insert_plain(caret, line)?;
            }
        }
        self.set_caret(caret);
        self.pending_formats.clear();

        match self.dom.text_block_of(caret.node) {
            Some(block) if !split => Ok(Edit::in_run(EditKind::Typing, block)),
            _ => Ok(Edit::structural()),
        }
    }

    pub(crate) fn enter(&mut self) -> Result<Edit, CommandError> {
        let range = self.range()?;
        let caret = if range.is_collapsed() {
            range.start
        } else {
            self.delete_range(range)?
        };
        let caret = self.break_block_at(caret)?;
        self.set_caret(caret);
        self.pending_formats.clear();
        Ok(Edit::structural())
    }

    pub(crate) fn backspace(&mut self) -> Result<Edit, CommandError> {
        let range = self.range()?;
        if !range.is_collapsed() {
            return self.delete_selection(range);
        }
        let (block, offset) = self
            .dom
            .offset_in_block(range.start)
            .ok_or_else(invalid_point)?;

        if offset > 0 {
            self.delete_in_block(block, offset - 1, offset)?;
            let caret = self.dom.point_at_block_offset(block, offset - 1);
            self.set_caret(caret);
            return Ok(Edit::in_run(EditKind::Deleting, block));
        }

        if matches!(self.dom.node(block), Some(DomNode::ListItem)) {
            let caret = self.leave_list(block)?;
            self.set_caret(caret);
            return Ok(Edit::structural());
        }

        let blocks = self.dom.text_blocks();
        let previous = blocks
            .iter()
            .position(|b| *b == block)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| blocks.get(i).copied());
        let Some(previous) = previous else {
            return Ok(Edit::unchanged());
        };
        let joint = self.dom.block_len(previous);
        self.join_blocks(previous, block)?;
        let caret = self.dom.point_at_block_offset(previous, joint);
        self.set_caret(caret);
        Ok(Edit::structural())
    }

    pub(crate) fn delete(&mut self) -> Result<Edit, CommandError> {
        let range = self.range()?;
        if !range.is_collapsed() {
            return self.delete_selection(range);
        }
        let (block, offset) = self
            .dom
            .offset_in_block(range.start)
            .ok_or_else(invalid_point)?;

        if offset < self.dom.block_len(block) {
            self.delete_in_block(block, offset, offset + 1)?;
            let caret = self.dom.point_at_block_offset(block, offset);
            self.set_caret(caret);
            return Ok(Edit::in_run(EditKind::Deleting, block));
        }

        let blocks = self.dom.text_blocks();
        let next = blocks
            .iter()
            .position(|b| *b == block)
            .and_then(|i| blocks.get(i + 1).copied());
        let Some(next) = next else {
            return Ok(Edit::unchanged());
        };
        self.join_blocks(block, next)?;
        let caret = self.dom.point_at_block_offset(block, offset);
        self.set_caret(caret);
        Ok(Edit::structural())
    }

    fn delete_selection(
        &mut self,
        range: SelectionRange,
    ) -> Result<Edit, CommandError> {
        let caret = self.delete_range(range)?;
        self.set_caret(caret);
        self.pending_formats.clear();
        match self.dom.text_block_of(caret.node) {
            Some(block) => Ok(Edit::in_run(EditKind::Deleting, block)),
            None => Ok(Edit::structural()),
        }
    }

    /// Delete everything between the ends of `range` and join the blocks
    /// at its ends. Returns the caret position where the range began.
    pub(crate) fn delete_range(
        &mut self,
        range: SelectionRange,
    ) -> Result<DomPoint, CommandError> {
        let (first, from) = self
            .dom
            .offset_in_block(range.start)
            .ok_or_else(invalid_point)?;
        let (last, to) = self
            .dom
            .offset_in_block(range.end)
            .ok_or_else(invalid_point)?;

        if first == last {
            self.delete_in_block(first, from, to)?;
        } else {
            let blocks = self.dom.text_blocks_between(range.start, range.end);
            self.delete_in_block(last, 0, to)?;
            let first_len = self.dom.block_len(first);
            self.delete_in_block(first, from, first_len)?;
            for block in blocks.iter().skip(1) {
                if *block != last {
                    let len = self.dom.block_len(*block);
                    self.delete_in_block(*block, 0, len)?;
                }
            }
            for block in blocks.iter().skip(1) {
                self.join_blocks(first, *block)?;
            }
        }
        Ok(self.dom.point_at_block_offset(first, from))
    }

    /// Remove the content between offsets `from` and `to` of a text block.
    pub(crate) fn delete_in_block(
        &mut self,
        block: NodeId,
        from: usize,
        to: usize,
    ) -> Result<(), CommandError> {
        if from >= to {
            return Ok(());
        }
        if matches!(self.dom.node(block), Some(DomNode::CodeBlock)) {
            let text = remove_chars(&self.dom.text_content(block), from, to);
            self.dom.set_code_text(block, &text)?;
            return Ok(());
        }

        let mut pos = 0;
        for leaf in self.dom.block_leaves(block) {
            let Some(node) = self.dom.node(leaf).cloned() else {
                continue;
            };
            let len = node.leaf_len();
            let (lo, hi) = (from.max(pos), to.min(pos + len));
            if lo < hi {
                match node {
                    DomNode::Text { content, .. } if hi - lo < len => {
                        let kept = remove_chars(&content, lo - pos, hi - pos);
                        self.dom.set_text(leaf, &kept)?;
                    }
                    _ => {
                        self.dom.remove(leaf)?;
                    }
                }
            }
            pos += len;
        }

        let empty_links: Vec<NodeId> = self
            .dom
            .children(block)
            .iter()
            .copied()
            .filter(|c| {
                matches!(self.dom.node(*c), Some(DomNode::Link { .. }))
                    && self.dom.children(*c).is_empty()
            })
            .collect();
        for link in empty_links {
            self.dom.remove(link)?;
        }
        Ok(())
    }

    /// Append the inline content of `second` to `first` and remove
    /// `second`. Lists nested in `second` take its place in its parent
    /// list.
    pub(crate) fn join_blocks(
        &mut self,
        first: NodeId,
        second: NodeId,
    ) -> Result<(), CommandError> {
        let seam = self.inline_children(first).last().copied();
        match (self.dom.node(first), self.dom.node(second)) {
            (Some(DomNode::CodeBlock), _) => {
                let text = format!(
                    "{}{}",
                    self.dom.text_content(first),
                    self.dom.block_text(second)
                );
                self.dom.set_code_text(first, &text)?;
            }
            (_, Some(DomNode::CodeBlock)) => {
                let text = self.dom.text_content(second);
                self.dom.set_code_text(second, "")?;
                let mut at = self.inline_children(first).len();
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        self.dom.insert_node(first, at, DomNode::LineBreak)?;
                        at += 1;
                    }
                    if !line.is_empty() {
                        self.dom.insert_node(first, at, DomNode::new_text(line))?;
                        at += 1;
                    }
                }
            }
            _ => {
                let at = self.inline_children(first).len();
                for (i, child) in
                    self.inline_children(second).into_iter().enumerate()
                {
                    self.dom.move_node(child, first, at + i)?;
                }
            }
        }

        let nested: Vec<NodeId> = self
            .dom
            .children(second)
            .iter()
            .copied()
            .filter(|c| matches!(self.dom.node(*c), Some(DomNode::List(_))))
            .collect();
        if !nested.is_empty() {
            let parent = self.parent_of(second)?;
            let mut at = self.dom.index_in_parent(second).map_or(0, |i| i + 1);
            for list in nested {
                for item in self.dom.children(list).to_vec() {
                    self.dom.move_node(item, parent, at)?;
                    at += 1;
                }
                self.dom.remove(list)?;
            }
        }
        self.dom.remove(second)?;

        if let Some(left) = seam {
            if let Some(right) = self.dom.next_sibling(left) {
                let same_formats = match (self.dom.node(left), self.dom.node(right)) {
                    (
                        Some(DomNode::Text { formats: a, .. }),
                        Some(DomNode::Text { formats: b, .. }),
                    ) => a == b,
                    _ => false,
                };
                if same_formats {
                    self.dom.merge_adjacent(left, right)?;
                }
            }
        }
        Ok(())
    }

    /// Children of a text block that are not nested lists.
    fn inline_children(&self, block: NodeId) -> Vec<NodeId> {
        self.dom
            .children(block)
            .iter()
            .copied()
            .take_while(|c| !matches!(self.dom.node(*c), Some(DomNode::List(_))))
            .collect()
    }

    /// Split the block at `point` the way Enter does, returning the caret
    /// position in the new block.
    fn break_block_at(&mut self, point: DomPoint) -> Result<DomPoint, CommandError> {
        let block = self
            .dom
            .text_block_of(point.node)
            .ok_or_else(invalid_point)?;
        match self.dom.node(block) {
            Some(DomNode::CodeBlock) => self.insert_code_text(block, point, "\n"),
            Some(DomNode::ListItem) if self.dom.block_len(block) == 0 => {
                self.leave_list(block)
            }
            Some(node) => {
                let continues = matches!(node, DomNode::Heading(_) | DomNode::Quote);
                let (_, index) = self.dom.split_inline_at(point)?;
                let new_block = self.dom.split_container(block, index)?;
                self.dom.prune_empty_text(block)?;
                if continues && self.dom.block_len(new_block) == 0 {
                    self.dom.replace_node(new_block, DomNode::Paragraph)?;
                }
                Ok(self.dom.point_at_block_offset(new_block, 0))
            }
            None => Err(invalid_point()),
        }
    }

    /// Move a list item one level out, or out of the list entirely if it
    /// is top-level. Returns the caret at the start of the moved content.
    fn leave_list(&mut self, item: NodeId) -> Result<DomPoint, CommandError> {
        let block = if self.is_nested_item(item) {
            self.outdent_item(item)?;
            item
        } else {
            self.extract_item(item)?
        };
        Ok(self.dom.point_at_block_offset(block, 0))
    }

    fn insert_code_text(
        &mut self,
        block: NodeId,
        point: DomPoint,
        text: &str,
    ) -> Result<DomPoint, CommandError> {
        let (_, offset) = self.dom.offset_in_block(point).ok_or_else(invalid_point)?;
        let mut content = self.dom.text_content(block);
        let at = byte_offset(&content, offset).unwrap_or(content.len());
        content.insert_str(at, text);
        self.dom.set_code_text(block, &content)?;
        Ok(self
            .dom
            .point_at_block_offset(block, offset + text.chars().count()))
    }

    /// Insert `text` (without newlines) at `point` with the typed formats.
    fn insert_plain(&mut self, point: DomPoint, text: &str) -> Result<DomPoint, CommandError> {
        let block = self
            .dom
            .text_block_of(point.node)
            .ok_or_else(invalid_point)?;
        if matches!(self.dom.node(block), Some(DomNode::CodeBlock)) {
            return self.insert_code_text(block, point, text);
        }
        let formats = self.typed_formats(point);
        let count = text.chars().count();

        if let Some(DomNode::Text {
            content,
            formats: run_formats,
        }) = self.dom.node(point.node)
        {
            if *run_formats == formats && !self.at_link_edge(point) {
                let mut content = content.clone();
                let at = byte_offset(&content, point.offset).unwrap_or(content.len());
                content.insert_str(at, text);
                self.dom.set_text(point.node, &content)?;
                return Ok(DomPoint::new(point.node, point.offset + count));
            }
        }

        let (parent, index) = self.insertion_slot(point)?;
        let siblings = self.dom.children(parent);
        let before = index.checked_sub(1).and_then(|i| siblings.get(i)).copied();
        let after = siblings.get(index).copied();

        if let Some(prev) = before {
            if let Some(DomNode::Text { content, formats: f }) = self.dom.node(prev) {
                if *f == formats {
                    let joined = format!("{content}{text}");
                    let len = joined.chars().count();
                    self.dom.set_text(prev, &joined)?;
                    return Ok(DomPoint::new(prev, len));
                }
            }
        }
        if let Some(next) = after {
            if let Some(DomNode::Text { content, formats: f }) = self.dom.node(next) {
                if *f == formats {
                    let joined = format!("{text}{content}");
                    self.dom.set_text(next, &joined)?;
                    return Ok(DomPoint::new(next, count));
                }
            }
        }
        let run = self
            .dom
            .insert_node(parent, index, DomNode::new_formatted_text(text, formats))?;
        Ok(DomPoint::new(run, count))
    }

    /// Whether `point` sits at the first or last position of a link.
    fn at_link_edge(&self, point: DomPoint) -> bool {
        self.link_at(point).is_some() && self.link_interior(point).is_none()
    }

    /// The container and child index where new inline content at `point`
    /// goes. Text runs are split as needed; positions at the edge of a link
    /// resolve to just outside it.
    fn insertion_slot(&mut self, point: DomPoint) -> Result<(NodeId, usize), CommandError> {
        let node = self.dom.lookup(point.node)?.clone();
        let (parent, index) = if node.is_leaf() {
            let parent = self.parent_of(point.node)?;
            let index = self.dom.index_in_parent(point.node).ok_or_else(invalid_point)?;
            if point.offset == 0 {
                (parent, index)
            } else if point.offset >= node.leaf_len() {
                (parent, index + 1)
            } else {
                self.dom.split_text(point.node, point.offset)?;
                (parent, index + 1)
            }
        } else {
            (point.node, point.offset)
        };

        if matches!(self.dom.node(parent), Some(DomNode::Link { .. })) {
            let outer = self.parent_of(parent)?;
            let at = self.dom.index_in_parent(parent).ok_or_else(invalid_point)?;
            if index == 0 {
                return Ok((outer, at));
            }
            if index >= self.dom.children(parent).len() {
                return Ok((outer, at + 1));
            }
        }
        Ok((parent, index))
    }
}

impl ComposerModel {
    /// Replace the selection with `text`, or insert it at the caret.
    pub fn replace_text(&mut self, text: &str) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::ReplaceText(text.to_owned()))
    }

    pub fn enter(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::Enter)
    }

    pub fn backspace(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::Backspace)
    }

    pub fn delete(&mut self) -> Result<ComposerUpdate, CommandError> {
        self.dispatch(Command::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{HeadingLevel, ListType};

    fn new_model() -> ComposerModel {
        ComposerModel::new()
    }

    fn model_with_text(text: &str) -> ComposerModel {
        let mut model = new_model();
        model.replace_text(text).unwrap();
        model
    }

    fn html(model: &ComposerModel) -> String {
        model.get_content_as_html()
    }

    fn plain(model: &ComposerModel) -> String {
        model.get_content_as_plain_text()
    }

    #[test]
    fn typing_into_an_empty_document() {
        let model = model_with_text("hello");
        assert_eq!(html(&model), "<p>hello</p>");
        assert_eq!(model.get_selection_offsets(), Some((5, 5)));
    }

    #[test]
    fn typing_replaces_the_selection() {
        let mut model = model_with_text("hello world");
        model.select_offsets(0, 5).unwrap();
        model.replace_text("goodbye").unwrap();
        assert_eq!(plain(&model), "goodbye world");
        assert_eq!(model.get_selection_offsets(), Some((7, 7)));
    }

    #[test]
    fn typed_text_is_escaped_on_output() {
        let model = model_with_text("a < b & c");
        assert_eq!(html(&model), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn newlines_split_paragraphs() {
        let model = model_with_text("one\ntwo\r\nthree");
        assert_eq!(html(&model), "<p>one</p><p>two</p><p>three</p>");
    }

    #[test]
    fn typing_continues_the_formats_of_the_run() {
        let mut model = model_with_text("ab");
        model.select_offsets(0, 2).unwrap();
        model.bold().unwrap();
        model.select_offsets(2, 2).unwrap();
        model.replace_text("c").unwrap();
        assert_eq!(html(&model), "<p><strong>abc</strong></p>");
    }

    #[test]
    fn enter_splits_the_paragraph() {
        let mut model = model_with_text("helloworld");
        model.select_offsets(5, 5).unwrap();
        model.enter().unwrap();
        assert_eq!(html(&model), "<p>hello</p><p>world</p>");
        assert_eq!(model.get_selection_offsets(), Some((6, 6)));
    }

    #[test]
    fn enter_at_the_end_of_a_heading_starts_a_paragraph() {
        let mut model = model_with_text("Title");
        model.heading(HeadingLevel::H1).unwrap();
        model.enter().unwrap();
        model.replace_text("body").unwrap();
        assert_eq!(html(&model), "<h1>Title</h1><p>body</p>");
    }

    #[test]
    fn enter_in_a_list_adds_an_item() {
        let mut model = model_with_text("a");
        model.unordered_list().unwrap();
        model.enter().unwrap();
        model.replace_text("b").unwrap();
        assert_eq!(html(&model), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn enter_on_an_empty_item_leaves_the_list() {
        let mut model = model_with_text("a");
        model.ordered_list().unwrap();
        model.enter().unwrap();
        model.enter().unwrap();
        model.replace_text("after").unwrap();
        assert_eq!(html(&model), "<ol><li>a</li></ol><p>after</p>");
    }

    #[test]
    fn enter_in_a_code_block_adds_a_newline() {
        let mut model = model_with_text("fn");
        model.code_block().unwrap();
        model.enter().unwrap();
        assert_eq!(html(&model), "<pre><code>fn\n</code></pre>");
        assert_eq!(model.get_selection_offsets(), Some((3, 3)));
    }

    #[test]
    fn backspace_removes_the_previous_character() {
        let mut model = model_with_text("abc");
        model.backspace().unwrap();
        assert_eq!(plain(&model), "ab");
        assert_eq!(model.get_selection_offsets(), Some((2, 2)));
    }

    #[test]
    fn backspace_at_block_start_joins_with_the_previous_block() {
        let mut model = model_with_text("ab\ncd");
        model.select_offsets(3, 3).unwrap();
        model.backspace().unwrap();
        assert_eq!(html(&model), "<p>abcd</p>");
        assert_eq!(model.get_selection_offsets(), Some((2, 2)));
    }

    #[test]
    fn backspace_at_document_start_does_nothing() {
        let mut model = model_with_text("ab");
        model.select_offsets(0, 0).unwrap();
        let depth = model.history.undo_depth();
        model.backspace().unwrap();
        assert_eq!(plain(&model), "ab");
        assert_eq!(model.history.undo_depth(), depth);
    }

    #[test]
    fn backspace_at_item_start_leaves_the_list() {
        let mut model = model_with_text("a\nb");
        model.select_offsets(0, 3).unwrap();
        model.unordered_list().unwrap();
        model.select_offsets(2, 2).unwrap();
        model.backspace().unwrap();
        assert_eq!(html(&model), "<ul><li>a</li></ul><p>b</p>");
    }

    #[test]
    fn backspace_removes_a_line_break() {
        let mut model = ComposerModel::from_html("<p>a<br />b</p>");
        model.select_offsets(2, 2).unwrap();
        model.backspace().unwrap();
        assert_eq!(html(&model), "<p>ab</p>");
    }

    #[test]
    fn delete_removes_the_next_character() {
        let mut model = model_with_text("abc");
        model.select_offsets(0, 0).unwrap();
        model.delete().unwrap();
        assert_eq!(plain(&model), "bc");
        assert_eq!(model.get_selection_offsets(), Some((0, 0)));
    }

    #[test]
    fn delete_at_block_end_pulls_up_the_next_block() {
        let mut model = model_with_text("ab\ncd");
        model.select_offsets(2, 2).unwrap();
        model.delete().unwrap();
        assert_eq!(html(&model), "<p>abcd</p>");
    }

    #[test]
    fn deleting_across_blocks_joins_the_ends() {
        let mut model = model_with_text("one\ntwo\nthree");
        model.select_offsets(2, 10).unwrap();
        model.delete().unwrap();
        assert_eq!(html(&model), "<p>onree</p>");
        assert_eq!(model.get_selection_offsets(), Some((2, 2)));
    }

    #[test]
    fn deleting_everything_leaves_an_empty_paragraph() {
        let mut model = model_with_text("one\ntwo");
        model.select_offsets(0, 7).unwrap();
        model.backspace().unwrap();
        assert_eq!(html(&model), "");
        assert_eq!(model.dom().text_blocks().len(), 1);
    }

    #[test]
    fn deleting_into_a_list_keeps_the_later_items() {
        let mut model = model_with_text("p\na\nb");
        model.select_offsets(2, 5).unwrap();
        model.unordered_list().unwrap();
        model.select_offsets(1, 2).unwrap();
        model.delete().unwrap();
        assert_eq!(html(&model), "<p>pa</p><ul><li>b</li></ul>");
    }

    #[test]
    fn deleting_a_whole_link_drops_it() {
        let mut model = model_with_text("ab");
        model.select_offsets(0, 1).unwrap();
        model.insert_link("https://example.org").unwrap();
        model.select_offsets(0, 1).unwrap();
        model.delete().unwrap();
        assert_eq!(html(&model), "<p>b</p>");
    }

    #[test]
    fn joining_a_code_block_flattens_the_second_block() {
        let mut model = model_with_text("x\ny");
        model.select_offsets(0, 0).unwrap();
        model.code_block().unwrap();
        model.select_offsets(1, 1).unwrap();
        model.delete().unwrap();
        assert_eq!(html(&model), "<pre><code>xy</code></pre>");
    }

    #[test]
    fn list_enter_keeps_list_type() {
        let mut model = model_with_text("1");
        model.insert_list(ListType::Ordered).unwrap();
        model.enter().unwrap();
        model.replace_text("2").unwrap();
        assert_eq!(html(&model), "<ol><li>1</li><li>2</li></ol>");
    }
}
