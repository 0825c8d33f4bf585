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

//! Document model, editing commands and markup serializer for the post
//! composer.
//!
//! A [`ComposerModel`] owns the document tree, the selection and the undo
//! history. Every edit is a [`Command`] applied by the pure reducer
//! [`apply`]; the model records history around it and reports what changed
//! as a [`ComposerUpdate`].

mod command;
mod command_error;
mod composer_action;
mod composer_model;
mod composer_state;
mod composer_update;
mod config;
pub mod dom;
mod history;
mod selection;

pub use crate::command::{apply, Applied, BlockType, Command};
pub use crate::command_error::CommandError;
pub use crate::composer_action::{ActionState, ComposerAction};
pub use crate::composer_model::{
    ComposerModel, ContentListener, UploadError, UploadTicket,
};
pub use crate::composer_state::ComposerState;
pub use crate::composer_update::{
    ComposerUpdate, MenuState, MenuStateUpdate, ReplaceAll, TextUpdate,
};
pub use crate::config::{ComposerConfig, DEFAULT_IMAGE_MAX_WIDTH};
pub use crate::dom::{
    excerpt, parse, parse_lenient, serialize, Alignment, Dom, DomError,
    DomNode, DomNodeKind, FormatSet, HeadingLevel, HtmlParseError, ImageNode,
    InlineFormatType, ListType, NodeId, ToHtml, ToPlainText, ToTree,
};
pub use crate::history::{EditKind, EditRun, History, HistoryEntry};
pub use crate::selection::{DomPoint, Selection, SelectionRange};
