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

//! Debug rendering of a document as an indented tree.

use crate::dom::{Dom, DomNode, NodeId};

pub trait ToTree {
    fn to_tree(&self) -> String;
}

impl ToTree for Dom {
    fn to_tree(&self) -> String {
        let mut out = String::from("root\n");
        let children = self.children(self.root());
        for (i, child) in children.iter().enumerate() {
            self.tree_line(*child, "", i + 1 == children.len(), &mut out);
        }
        out
    }
}

impl Dom {
    fn tree_line(&self, id: NodeId, prefix: &str, last: bool, out: &mut String) {
        out.push_str(prefix);
        out.push_str(if last { "\u{2514}>" } else { "\u{251c}>" });
        out.push_str(&self.tree_label(id));
        out.push('\n');

        let child_prefix =
            format!("{prefix}{}", if last { "  " } else { "\u{2502} " });
        let children = self.children(id);
        for (i, child) in children.iter().enumerate() {
            self.tree_line(*child, &child_prefix, i + 1 == children.len(), out);
        }
    }

    fn tree_label(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::from("?");
        };
        let mut label = match node {
            DomNode::Root => String::from("root"),
            DomNode::Paragraph => String::from("p"),
            DomNode::Heading(level) => level.tag().to_owned(),
            DomNode::Quote => String::from("blockquote"),
            DomNode::CodeBlock => String::from("codeblock"),
            DomNode::List(list_type) => list_type.tag().to_owned(),
            DomNode::ListItem => String::from("li"),
            DomNode::Image(image) => {
                format!("img \"{}\" {}px", image.src, image.max_width)
            }
            DomNode::Link { url } => format!("a \"{url}\""),
            DomNode::Text { content, formats } => {
                if formats.is_empty() {
                    format!("{content:?}")
                } else {
                    let names: Vec<&str> =
                        formats.iter().map(|f| f.tag()).collect();
                    format!("{} {content:?}", names.join(","))
                }
            }
            DomNode::LineBreak => String::from("br"),
        };
        if let Some(align) = self.align(id) {
            label.push_str(&format!(" [{align}]"));
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::dom::{Alignment, FormatSet, InlineFormatType, ListType};

    #[test]
    fn renders_nested_structure() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.children(root)[0];
        dom.set_align(p, Some(Alignment::Right)).unwrap();
        dom.append_node(p, DomNode::new_text("one")).unwrap();
        let bold: FormatSet = [InlineFormatType::Bold, InlineFormatType::Italic]
            .into_iter()
            .collect();
        dom.append_node(p, DomNode::new_formatted_text("two", bold))
            .unwrap();
        let list = dom
            .append_node(root, DomNode::List(ListType::Unordered))
            .unwrap();
        let item = dom.append_node(list, DomNode::ListItem).unwrap();
        dom.append_node(item, DomNode::LineBreak).unwrap();

        assert_eq!(
            dom.to_tree(),
            indoc! {r#"
                root
                ├>p [right]
                │ ├>"one"
                │ └>strong,em "two"
                └>ul
                  └>li
                    └>br
            "#}
        );
    }
}
