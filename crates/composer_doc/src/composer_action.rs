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

use strum_macros::{AsRefStr, Display, EnumIter};

use crate::dom::{Alignment, HeadingLevel, InlineFormatType};

/// The toolbar controls whose state the model reports.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ComposerAction {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    InlineCode,
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Quote,
    CodeBlock,
    OrderedList,
    UnorderedList,
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    Link,
    Image,
    Undo,
    Redo,
}

impl ComposerAction {
    pub fn from_format(format: InlineFormatType) -> Self {
        match format {
            InlineFormatType::Bold => Self::Bold,
            InlineFormatType::Italic => Self::Italic,
            InlineFormatType::Underline => Self::Underline,
            InlineFormatType::StrikeThrough => Self::StrikeThrough,
            InlineFormatType::InlineCode => Self::InlineCode,
        }
    }

    pub fn from_heading(level: HeadingLevel) -> Self {
        match level {
            HeadingLevel::H1 => Self::Heading1,
            HeadingLevel::H2 => Self::Heading2,
            HeadingLevel::H3 => Self::Heading3,
        }
    }

    pub fn from_alignment(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Left => Self::AlignLeft,
            Alignment::Center => Self::AlignCenter,
            Alignment::Right => Self::AlignRight,
            Alignment::Justify => Self::AlignJustify,
        }
    }
}

/// How a toolbar control should be shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionState {
    Enabled,
    /// The format or block type is active at the selection; pressing the
    /// control turns it off.
    Reversed,
    Disabled,
}
