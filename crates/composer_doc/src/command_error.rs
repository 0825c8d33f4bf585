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

use crate::dom::DomError;

/// Why a command was rejected. A rejected command leaves the document,
/// the selection and the history exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("the command needs a selection and there is none")]
    NoSelection,

    #[error("the edit would break the document structure: {0}")]
    StructuralViolation(String),

    #[error("the command cannot be used here: {0}")]
    InvalidSelection(String),

    #[error("there is nothing to undo")]
    NothingToUndo,

    #[error("there is nothing to redo")]
    NothingToRedo,

    #[error("upload {generation} was superseded by upload {current}")]
    StaleUpload { generation: u64, current: u64 },

    #[error("the URL {0:?} is not allowed")]
    InvalidUrl(String),
}

impl From<DomError> for CommandError {
    fn from(e: DomError) -> Self {
        Self::StructuralViolation(e.to_string())
    }
}
