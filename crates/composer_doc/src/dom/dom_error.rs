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

use thiserror::Error;

use crate::dom::nodes::{DomNodeKind, NodeId};

/// Failures of the low-level tree primitives. A primitive that returns an
/// error has not modified the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0} is not part of this document")]
    UnknownNode(NodeId),

    #[error("a {child} node cannot be placed inside a {parent} node")]
    InvalidChild {
        parent: DomNodeKind,
        child: DomNodeKind,
    },

    #[error("offset {offset} is out of range for node {node}")]
    OffsetOutOfRange { node: NodeId, offset: usize },

    #[error("the root node cannot be {0}")]
    RootOperation(&'static str),

    #[error("{0} and {1} cannot be merged")]
    IncompatibleMerge(NodeId, NodeId),

    #[error("code blocks hold a single text run")]
    CodeBlockContent,

    #[error("node {0} cannot be moved into its own subtree")]
    Cycle(NodeId),

    #[error("expected a {expected} node, found {found}")]
    UnexpectedKind {
        expected: DomNodeKind,
        found: DomNodeKind,
    },
}
