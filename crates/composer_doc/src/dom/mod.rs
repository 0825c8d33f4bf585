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

//! The document tree: node types, the arena holding them and the
//! conversions to and from markup.

pub mod dom_error;
pub mod dom_struct;
pub mod nodes;
pub mod parser;
pub mod positions;
pub mod to_html;
pub mod to_plain_text;
pub mod to_tree;

pub use dom_error::DomError;
pub use dom_struct::Dom;
pub use nodes::{
    Alignment, DomNode, DomNodeKind, FormatSet, HeadingLevel, ImageNode,
    InlineFormatType, ListType, NodeId,
};
pub use positions::{LeafSpan, PositionKey};
pub use to_html::ToHtml;
pub use to_plain_text::ToPlainText;
pub use to_tree::ToTree;
pub use parser::{parse, parse_lenient, HtmlParseError};
pub use to_html::serialize;
pub use to_plain_text::excerpt;
