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

use std::collections::HashMap;

use crate::composer_action::{ActionState, ComposerAction};
use crate::selection::Selection;

/// What the host has to do after a model call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposerUpdate {
    pub text_update: TextUpdate,
    pub menu_state: MenuState,
    /// Set when an image upload came back with an error. The document is
    /// unchanged in that case.
    pub upload_failure: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextUpdate {
    /// The rendered content is unchanged.
    Keep,
    ReplaceAll(ReplaceAll),
    /// Only the selection moved.
    Select(Option<Selection>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplaceAll {
    pub replacement_html: String,
    pub selection: Option<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuState {
    Keep,
    Update(MenuStateUpdate),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuStateUpdate {
    pub action_states: HashMap<ComposerAction, ActionState>,
}

impl ComposerUpdate {
    pub fn keep() -> Self {
        Self {
            text_update: TextUpdate::Keep,
            menu_state: MenuState::Keep,
            upload_failure: None,
        }
    }

    pub fn update_menu_state(menu_state: MenuState) -> Self {
        Self {
            text_update: TextUpdate::Keep,
            menu_state,
            upload_failure: None,
        }
    }

    pub fn replace_all(
        replacement_html: String,
        selection: Option<Selection>,
        menu_state: MenuState,
    ) -> Self {
        Self {
            text_update: TextUpdate::ReplaceAll(ReplaceAll {
                replacement_html,
                selection,
            }),
            menu_state,
            upload_failure: None,
        }
    }

    pub fn select(selection: Option<Selection>, menu_state: MenuState) -> Self {
        Self {
            text_update: TextUpdate::Select(selection),
            menu_state,
            upload_failure: None,
        }
    }

    pub fn upload_failed(message: String) -> Self {
        Self {
            upload_failure: Some(message),
            ..Self::keep()
        }
    }
}
