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

//! Plain text views of a document: the full text and a short excerpt.

use crate::dom::{Dom, DomNode, NodeId};

const ELLIPSIS: char = '\u{2026}';

pub trait ToPlainText {
    fn to_plain_text(&self) -> String;
}

impl ToPlainText for Dom {
    /// Text blocks joined by `'\n'`. Line breaks also become `'\n'`, images
    /// are skipped.
    fn to_plain_text(&self) -> String {
        self.text_blocks()
            .into_iter()
            .map(|block| self.block_text(block))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Dom {
    /// The text of one text block, without the text of nested lists.
    pub fn block_text(&self, block: NodeId) -> String {
        let mut out = String::new();
        for leaf in self.block_leaves(block) {
            match self.node(leaf) {
                Some(DomNode::Text { content, .. }) => out.push_str(content),
                Some(DomNode::LineBreak) => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    /// Number of characters of plain text, line breaks included.
    pub fn character_count(&self) -> usize {
        self.to_plain_text().chars().count()
    }
}

/// Collapse whitespace in `text` and cut it to at most `max_chars`
/// characters. A cut happens at the last word boundary before the limit
/// and ends with an ellipsis, which counts towards the limit.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    if max_chars == 0 {
        return String::new();
    }

    let budget = max_chars - 1;
    let head: String = collapsed.chars().take(budget).collect();
    let next_is_space = collapsed.chars().nth(budget) == Some(' ');
    let cut = if next_is_space {
        head.as_str()
    } else {
        match head.rfind(' ') {
            Some(space) => &head[..space],
            None => head.as_str(),
        }
    };
    let mut out = cut.trim_end().to_owned();
    out.push(ELLIPSIS);
    out
}
