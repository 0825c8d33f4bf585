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

use serde::Deserialize;

/// Width cap given to images that do not specify one.
pub const DEFAULT_IMAGE_MAX_WIDTH: u32 = 800;

/// Tunables of an editing session. Hosts usually load this from their own
/// settings file; every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Maximum number of undo (and redo) entries. The oldest entry is
    /// dropped once exceeded. 0 disables history.
    pub max_history_depth: usize,
    /// Merge consecutive typing or deleting in one block into a single
    /// undo entry.
    pub coalesce_typing: bool,
    pub default_image_max_width: u32,
    /// Length limit of the post excerpt, in characters.
    pub excerpt_length: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_history_depth: 100,
            coalesce_typing: true,
            default_image_max_width: DEFAULT_IMAGE_MAX_WIDTH,
            excerpt_length: 200,
        }
    }
}
