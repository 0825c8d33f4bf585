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

//! Serialization of a [`Dom`] to markup.
//!
//! The output is deterministic: inline format tags always nest in the
//! canonical order of [`InlineFormatType`] (strong, em, u, s, code) and
//! adjacent runs share the tags they have in common. Links are always the
//! outermost inline element, so formats are closed before a link opens and
//! reopened inside it.
//!
//! Paragraphs without any content are dropped; every other empty container
//! still emits its tags. All text, alt text and URLs are escaped.

use crate::dom::{Alignment, Dom, DomNode, InlineFormatType, NodeId};

pub trait ToHtml {
    fn to_html(&self) -> String;
}

impl ToHtml for Dom {
    fn to_html(&self) -> String {
        serialize(self)
    }
}

/// Render the whole document.
pub fn serialize(dom: &Dom) -> String {
    let mut writer = HtmlWriter {
        dom,
        out: String::new(),
    };
    for child in dom.children(dom.root()) {
        writer.block(*child);
    }
    writer.out
}

struct HtmlWriter<'a> {
    dom: &'a Dom,
    out: String,
}

impl HtmlWriter<'_> {
    fn block(&mut self, id: NodeId) {
        let dom = self.dom;
        let Some(node) = dom.node(id) else {
            return;
        };
        let align = dom.align(id);
        match node {
            DomNode::Paragraph => {
                if self.has_content(id) {
                    self.open("p", align);
                    self.inline_children(id);
                    self.out.push_str("</p>");
                }
            }
            DomNode::Heading(level) => {
                self.open(level.tag(), align);
                self.inline_children(id);
                self.close(level.tag());
            }
            DomNode::Quote => {
                self.open("blockquote", align);
                self.inline_children(id);
                self.out.push_str("</blockquote>");
            }
            DomNode::CodeBlock => {
                self.open("pre", align);
                self.out.push_str("<code>");
                let text = dom.text_content(id);
                self.out.push_str(&html_escape::encode_text(&text));
                self.out.push_str("</code></pre>");
            }
            DomNode::List(list_type) => {
                self.open(list_type.tag(), align);
                for item in dom.children(id) {
                    self.block(*item);
                }
                self.close(list_type.tag());
            }
            DomNode::ListItem => {
                self.open("li", align);
                let children = dom.children(id);
                let inline_end = children
                    .iter()
                    .position(|c| matches!(dom.node(*c), Some(DomNode::List(_))))
                    .unwrap_or(children.len());
                self.inline_run(&children[..inline_end]);
                for nested in &children[inline_end..] {
                    if matches!(dom.node(*nested), Some(DomNode::List(_))) {
                        self.block(*nested);
                    } else {
                        self.inline_run(std::slice::from_ref(nested));
                    }
                }
                self.out.push_str("</li>");
            }
            // Inline nodes never sit at block level in a valid tree.
            _ => self.inline_run(std::slice::from_ref(&id)),
        }
    }

    fn inline_children(&mut self, id: NodeId) {
        let dom = self.dom;
        self.inline_run(dom.children(id));
    }

    /// Emit a sequence of sibling inline nodes, sharing format tags between
    /// neighbouring runs.
    fn inline_run(&mut self, ids: &[NodeId]) {
        let dom = self.dom;
        let mut open: Vec<InlineFormatType> = Vec::new();
        for id in ids {
            match dom.node(*id) {
                Some(DomNode::Text { content, formats }) => {
                    if content.is_empty() {
                        continue;
                    }
                    let wanted: Vec<InlineFormatType> =
                        formats.iter().copied().collect();
                    self.switch_formats(&mut open, &wanted);
                    self.out.push_str(&html_escape::encode_text(content));
                }
                Some(DomNode::LineBreak) => self.out.push_str("<br />"),
                Some(DomNode::Image(image)) => {
                    self.out.push_str(&format!(
                        "<img src=\"{}\" alt=\"{}\" style=\"max-width: {}px;\" />",
                        html_escape::encode_double_quoted_attribute(&image.src),
                        html_escape::encode_double_quoted_attribute(
                            &image.alt_text
                        ),
                        image.max_width,
                    ));
                }
                Some(DomNode::Link { url }) => {
                    self.switch_formats(&mut open, &[]);
                    self.out.push_str(&format!(
                        "<a href=\"{}\">",
                        html_escape::encode_double_quoted_attribute(url)
                    ));
                    self.inline_children(*id);
                    self.out.push_str("</a>");
                }
                Some(_) => self.block(*id),
                None => {}
            }
        }
        self.switch_formats(&mut open, &[]);
    }

    /// Close open tags down to the longest common prefix with `wanted`,
    /// then open the rest of `wanted`.
    fn switch_formats(
        &mut self,
        open: &mut Vec<InlineFormatType>,
        wanted: &[InlineFormatType],
    ) {
        let common = open
            .iter()
            .zip(wanted.iter())
            .take_while(|(a, b)| a == b)
            .count();
        while open.len() > common {
            if let Some(format) = open.pop() {
                self.close(format.tag());
            }
        }
        for format in &wanted[common..] {
            self.out.push('<');
            self.out.push_str(format.tag());
            self.out.push('>');
            open.push(*format);
        }
    }

    fn open(&mut self, tag: &str, align: Option<Alignment>) {
        self.out.push('<');
        self.out.push_str(tag);
        if let Some(align) = align {
            self.out
                .push_str(&format!(" style=\"text-align: {align};\""));
        }
        self.out.push('>');
    }

    fn close(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn has_content(&self, id: NodeId) -> bool {
        self.dom.iter_subtree(id).into_iter().any(|n| {
            matches!(
                self.dom.node(n),
                Some(DomNode::LineBreak | DomNode::Image(_) | DomNode::Link { .. })
            ) || self
                .dom
                .node(n)
                .is_some_and(|node| node.leaf_len() > 0)
        })
    }
}
