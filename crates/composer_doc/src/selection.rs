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

//! Caret and range positions within a [`Dom`].

use std::cmp::Ordering;

use crate::dom::{Dom, NodeId};

/// A position in the document.
///
/// For a leaf (text run, line break, image) `offset` counts characters into
/// its content, where line breaks and images have a length of one. For a
/// container `offset` is a child index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DomPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// An anchor and a focus. The anchor is where the selection started, so it
/// may come after the focus in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: DomPoint,
    pub focus: DomPoint,
}

/// A selection with its ends put in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: DomPoint,
    pub end: DomPoint,
}

impl Selection {
    pub fn new(anchor: DomPoint, focus: DomPoint) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(point: DomPoint) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Order the two ends. Returns `None` if either end does not denote a
    /// valid position in `dom`.
    pub fn normalized(&self, dom: &Dom) -> Option<SelectionRange> {
        if !dom.is_valid_point(self.anchor) || !dom.is_valid_point(self.focus)
        {
            return None;
        }
        match dom.compare_points(self.anchor, self.focus)? {
            Ordering::Greater => Some(SelectionRange {
                start: self.focus,
                end: self.anchor,
            }),
            _ => Some(SelectionRange {
                start: self.anchor,
                end: self.focus,
            }),
        }
    }
}

impl SelectionRange {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

impl From<SelectionRange> for Selection {
    fn from(range: SelectionRange) -> Self {
        Self::new(range.start, range.end)
    }
}
