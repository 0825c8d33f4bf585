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

//! Node types held by the [`Dom`](crate::dom::Dom) arena.

use std::collections::BTreeSet;
use std::fmt;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Stable identifier of a node inside one [`Dom`](crate::dom::Dom).
///
/// Identifiers are never reused within a document, so a handle held by the
/// selection stays valid (or becomes unknown) but never points at a
/// different node. Snapshots restored by undo/redo carry their own IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inline text formats.
///
/// The declaration order is the canonical nesting order used by the
/// serializer: the first variant becomes the outermost tag.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum InlineFormatType {
    Bold,
    Italic,
    Underline,
    #[strum(serialize = "strikethrough")]
    StrikeThrough,
    #[strum(serialize = "code")]
    InlineCode,
}

impl InlineFormatType {
    /// The tag emitted for this format.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::Underline => "u",
            Self::StrikeThrough => "s",
            Self::InlineCode => "code",
        }
    }

    /// Map an inline tag name to a format. Accepts the legacy synonyms
    /// (`b`, `i`, `del`, `strike`) as well as the canonical tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "strong" | "b" => Some(Self::Bold),
            "em" | "i" => Some(Self::Italic),
            "u" => Some(Self::Underline),
            "s" | "del" | "strike" => Some(Self::StrikeThrough),
            "code" => Some(Self::InlineCode),
            _ => None,
        }
    }
}

/// A set of inline formats. Iteration follows the canonical nesting order.
pub type FormatSet = BTreeSet<InlineFormatType>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ListType {
    Ordered,
    Unordered,
}

impl ListType {
    pub fn from_ordered(ordered: bool) -> Self {
        if ordered {
            Self::Ordered
        } else {
            Self::Unordered
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ordered => "ol",
            Self::Unordered => "ul",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            _ => None,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
        }
    }
}

/// Horizontal alignment of a block container.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageNode {
    pub src: String,
    pub alt_text: String,
    pub max_width: u32,
}

/// One node of the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomNode {
    Root,
    Paragraph,
    Heading(HeadingLevel),
    Quote,
    /// Holds at most one unformatted [`DomNode::Text`] child.
    CodeBlock,
    List(ListType),
    ListItem,
    Image(ImageNode),
    Link { url: String },
    Text { content: String, formats: FormatSet },
    LineBreak,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum DomNodeKind {
    Root,
    Paragraph,
    Heading,
    Quote,
    CodeBlock,
    List,
    ListItem,
    Image,
    Link,
    Text,
    LineBreak,
}

impl DomNode {
    pub fn new_text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            formats: FormatSet::new(),
        }
    }

    pub fn new_formatted_text(
        content: impl Into<String>,
        formats: FormatSet,
    ) -> Self {
        Self::Text {
            content: content.into(),
            formats,
        }
    }

    pub fn new_link(url: impl Into<String>) -> Self {
        Self::Link { url: url.into() }
    }

    pub fn new_image(
        src: impl Into<String>,
        alt_text: impl Into<String>,
        max_width: u32,
    ) -> Self {
        Self::Image(ImageNode {
            src: src.into(),
            alt_text: alt_text.into(),
            max_width,
        })
    }

    pub fn kind(&self) -> DomNodeKind {
        match self {
            Self::Root => DomNodeKind::Root,
            Self::Paragraph => DomNodeKind::Paragraph,
            Self::Heading(_) => DomNodeKind::Heading,
            Self::Quote => DomNodeKind::Quote,
            Self::CodeBlock => DomNodeKind::CodeBlock,
            Self::List(_) => DomNodeKind::List,
            Self::ListItem => DomNodeKind::ListItem,
            Self::Image(_) => DomNodeKind::Image,
            Self::Link { .. } => DomNodeKind::Link,
            Self::Text { .. } => DomNodeKind::Text,
            Self::LineBreak => DomNodeKind::LineBreak,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Paragraph
                | Self::Heading(_)
                | Self::Quote
                | Self::CodeBlock
                | Self::List(_)
                | Self::ListItem
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Self::Text { .. } | Self::LineBreak | Self::Link { .. } | Self::Image(_)
        )
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Text { .. } | Self::LineBreak | Self::Image(_))
    }

    /// Blocks whose children are inline content, i.e. the blocks a caret
    /// can sit in.
    pub fn is_text_block(&self) -> bool {
        matches!(
            self,
            Self::Paragraph
                | Self::Heading(_)
                | Self::Quote
                | Self::CodeBlock
                | Self::ListItem
        )
    }

    /// Length of a leaf in caret positions. Text counts characters; line
    /// breaks and images count as one.
    pub fn leaf_len(&self) -> usize {
        match self {
            Self::Text { content, .. } => content.chars().count(),
            Self::LineBreak | Self::Image(_) => 1,
            _ => 0,
        }
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text { content, .. } if content.is_empty())
    }

    /// Whether `child` may be a direct child of this node.
    pub fn can_contain(&self, child: &DomNode) -> bool {
        match self {
            Self::Root => matches!(
                child,
                Self::Paragraph
                    | Self::Heading(_)
                    | Self::Quote
                    | Self::CodeBlock
                    | Self::List(_)
            ),
            Self::Paragraph | Self::Heading(_) | Self::Quote => {
                child.is_inline()
            }
            Self::CodeBlock => matches!(
                child,
                Self::Text { formats, .. } if formats.is_empty()
            ),
            Self::List(_) => matches!(child, Self::ListItem),
            Self::ListItem => child.is_inline() || matches!(child, Self::List(_)),
            Self::Link { .. } => {
                matches!(child, Self::Text { .. } | Self::LineBreak)
            }
            Self::Image(_) | Self::Text { .. } | Self::LineBreak => false,
        }
    }
}
