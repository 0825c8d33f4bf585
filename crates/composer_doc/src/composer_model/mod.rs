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

//! The editing session: a [`ComposerState`](crate::ComposerState) plus the
//! history, configuration and upload bookkeeping that go with it.
//!
//! Each command family lives in its own file. Those files extend
//! [`crate::ComposerState`] with the pure edit and [`ComposerModel`] with
//! the public entry point that runs it through
//! [`ComposerModel::dispatch`].

mod base;
mod blocks;
mod content_access;
mod formatting;
mod images;
mod links;
mod lists;
mod selection;
mod state_query;
mod text_ops;
mod undo_redo;

pub use base::{ComposerModel, ContentListener};
pub use images::{UploadError, UploadTicket};
pub(crate) use images::IMAGE_SCHEMES;
pub(crate) use links::{check_url, LINK_SCHEMES};
