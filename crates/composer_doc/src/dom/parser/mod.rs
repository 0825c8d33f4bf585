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

//! Building a [`Dom`](crate::dom::Dom) from markup.
//!
//! html5ever tokenizes and tree-builds the input into a [`PaDom`], a flat
//! handle-based tree owned by the sink. [`parse`] then converts the `PaDom`
//! into a document, applying the same structural rules as the editing
//! primitives.

use thiserror::Error;

#[cfg(feature = "sys")]
mod padom_creator;
#[cfg(feature = "sys")]
mod panode_container;
mod parse;

#[cfg(feature = "sys")]
pub(crate) use padom_creator::PaDomCreator;
#[cfg(feature = "sys")]
pub(crate) use panode_container::PaNodeContainer;
pub use parse::{parse, parse_lenient};

/// The markup could not be read without recovery. `parse_errors` lists the
/// messages reported by the tokenizer and tree builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid markup: {}", parse_errors.join("; "))]
pub struct HtmlParseError {
    pub parse_errors: Vec<String>,
}

#[cfg(feature = "sys")]
pub(crate) use sys::*;

#[cfg(feature = "sys")]
mod sys {
    use html5ever::{LocalName, Namespace, QualName};

    use super::PaNodeContainer;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) struct PaDomHandle(pub(crate) usize);

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) struct PaNodeText {
        pub(crate) content: String,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum PaDomNode {
        Container(PaNodeContainer),
        Document(PaNodeContainer),
        Text(PaNodeText),
        /// Comments and processing instructions. Never converted.
        Comment,
    }

    impl PaDomNode {
        pub(crate) fn children(&self) -> &[PaDomHandle] {
            match self {
                Self::Container(c) | Self::Document(c) => &c.children,
                Self::Text(_) | Self::Comment => &[],
            }
        }

        pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<PaDomHandle>> {
            match self {
                Self::Container(c) | Self::Document(c) => Some(&mut c.children),
                Self::Text(_) | Self::Comment => None,
            }
        }
    }

    /// Arena of parse nodes. Nodes detached by the tree builder stay in the
    /// arena but are unreachable from the document node.
    #[derive(Clone, Debug, PartialEq)]
    pub(crate) struct PaDom {
        pub(crate) nodes: Vec<PaDomNode>,
        pub(crate) document_handle: PaDomHandle,
        /// Returned as the element name of nodes that have none.
        anonymous: QualName,
    }

    impl PaDom {
        pub(crate) fn new() -> Self {
            let document = PaDomNode::Document(PaNodeContainer {
                name: paqual_name("#document"),
                attrs: Vec::new(),
                children: Vec::new(),
            });
            Self {
                nodes: vec![document],
                document_handle: PaDomHandle(0),
                anonymous: paqual_name(""),
            }
        }

        pub(crate) fn document_handle(&self) -> &PaDomHandle {
            &self.document_handle
        }

        pub(crate) fn get_document(&self) -> &PaDomNode {
            self.get_node(&self.document_handle)
        }

        pub(crate) fn add_node(&mut self, node: PaDomNode) -> PaDomHandle {
            self.nodes.push(node);
            PaDomHandle(self.nodes.len() - 1)
        }

        /// Handles only ever come from `add_node`, so they are in range.
        pub(crate) fn get_node(&self, handle: &PaDomHandle) -> &PaDomNode {
            &self.nodes[handle.0]
        }

        pub(crate) fn get_mut_node(
            &mut self,
            handle: &PaDomHandle,
        ) -> &mut PaDomNode {
            &mut self.nodes[handle.0]
        }

        pub(crate) fn name(&self, handle: &PaDomHandle) -> &QualName {
            match self.get_node(handle) {
                PaDomNode::Container(c) | PaDomNode::Document(c) => &c.name,
                PaDomNode::Text(_) | PaDomNode::Comment => &self.anonymous,
            }
        }

        /// The node whose children include `child`, if it is attached.
        pub(crate) fn parent_of(
            &self,
            child: &PaDomHandle,
        ) -> Option<PaDomHandle> {
            self.nodes
                .iter()
                .position(|n| n.children().contains(child))
                .map(PaDomHandle)
        }
    }

    impl Default for PaDom {
        fn default() -> Self {
            Self::new()
        }
    }

    /// The tree state kept by the sink while html5ever runs. When parsing
    /// reported errors it is handed out as the error value, recovered tree
    /// included.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct PaDomCreationError {
        pub(crate) dom: PaDom,
        pub(crate) parse_errors: Vec<String>,
    }

    impl PaDomCreationError {
        pub(crate) fn new() -> Self {
            Self::default()
        }
    }

    pub(crate) fn paqual_name(name: &str) -> QualName {
        QualName::new(
            None,
            Namespace::from("http://www.w3.org/1999/xhtml"),
            LocalName::from(name),
        )
    }
}
