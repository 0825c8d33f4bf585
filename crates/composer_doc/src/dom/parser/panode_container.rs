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

use html5ever::QualName;
use regex::Regex;

use super::PaDomHandle;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaNodeContainer {
    pub(crate) name: QualName,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<PaDomHandle>,
}

impl PaNodeContainer {
    pub(crate) fn tag(&self) -> &str {
        self.name.local.as_ref()
    }

    pub(crate) fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _v)| n == name)
            .map(|(_n, v)| v.as_str())
    }

    /// The value of one declaration in the `style` attribute.
    pub(crate) fn style_value(&self, property: &str) -> Option<String> {
        let style = self.get_attr("style")?;
        let re = Regex::new(&format!(
            r"(?i)(?:^|;)\s*{}\s*:\s*([^;]+?)\s*(?:;|$)",
            regex::escape(property)
        ))
        .ok()?;
        re.captures(style)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
    }

    /// `max-width` in pixels, if the style sets one.
    pub(crate) fn max_width_px(&self) -> Option<u32> {
        let value = self.style_value("max-width")?;
        value.strip_suffix("px").unwrap_or(&value).trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_style(style: &str) -> PaNodeContainer {
        PaNodeContainer {
            name: QualName::new(None, "p".into(), "p".into()),
            attrs: vec![("style".into(), style.into())],
            children: Vec::new(),
        }
    }

    #[test]
    fn style_values_are_found_among_declarations() {
        let node = node_with_style("color: red; text-align:Center;");
        assert_eq!(node.style_value("text-align").as_deref(), Some("center"));
        assert_eq!(node.style_value("color").as_deref(), Some("red"));
        assert_eq!(node.style_value("align"), None);
    }

    #[test]
    fn style_value_without_trailing_semicolon() {
        let node = node_with_style("max-width: 640px");
        assert_eq!(node.max_width_px(), Some(640));
    }

    #[test]
    fn unparseable_width_is_ignored() {
        let node = node_with_style("max-width: 50%;");
        assert_eq!(node.max_width_px(), None);
    }
}
