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

use super::{
    paqual_name, PaDom, PaDomCreationError, PaDomHandle, PaDomNode,
    PaNodeContainer, PaNodeText,
};
use html5ever::interface::NextParserState;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_fragment, Attribute, QualName};
use std::cell::{Ref, RefCell};

pub(crate) type DomCreationResult = Result<PaDom, PaDomCreationError>;

pub(crate) struct PaDomCreator {
    state: RefCell<PaDomCreationError>,
}

impl PaDomCreator {
    pub fn parse(html: &str) -> DomCreationResult {
        parse_fragment(
            PaDomCreator::default(),
            Default::default(),
            paqual_name(""),
            vec![],
        )
        .from_utf8()
        .one(html.as_bytes())
    }
}

impl Default for PaDomCreator {
    fn default() -> Self {
        Self {
            state: RefCell::new(PaDomCreationError::new()),
        }
    }
}

/// Insert `child` into `children` at `index`, merging text into a text
/// sibling directly before it.
fn insert_child(
    dom: &mut PaDom,
    parent: &PaDomHandle,
    index: usize,
    child: NodeOrText<PaDomHandle>,
) {
    let handle = match child {
        NodeOrText::AppendNode(handle) => handle,
        NodeOrText::AppendText(tendril) => {
            let previous = index
                .checked_sub(1)
                .and_then(|i| dom.get_node(parent).children().get(i).cloned());
            if let Some(previous) = previous {
                if let PaDomNode::Text(text) = dom.get_mut_node(&previous) {
                    text.content += tendril.as_ref();
                    return;
                }
            }
            dom.add_node(PaDomNode::Text(PaNodeText {
                content: tendril.as_ref().to_owned(),
            }))
        }
    };
    if let Some(children) = dom.get_mut_node(parent).children_mut() {
        let index = index.min(children.len());
        children.insert(index, handle);
    }
}

fn detach(dom: &mut PaDom, target: &PaDomHandle) {
    if let Some(parent) = dom.parent_of(target) {
        if let Some(children) = dom.get_mut_node(&parent).children_mut() {
            children.retain(|c| c != target);
        }
    }
}

impl TreeSink for PaDomCreator {
    type Handle = PaDomHandle;
    type Output = DomCreationResult;
    type ElemName<'a> = Ref<'a, QualName>;

    fn finish(self) -> Self::Output {
        let state = self.state.into_inner();
        if state.parse_errors.is_empty() {
            Ok(state.dom)
        } else {
            Err(state)
        }
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        self.state.borrow_mut().parse_errors.push(String::from(msg));
    }

    fn get_document(&self) -> Self::Handle {
        self.state.borrow().dom.document_handle().clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::map(self.state.borrow(), |state| state.dom.name(target))
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| (a.name.local.as_ref().to_owned(), a.value.as_ref().to_owned()))
            .collect();
        self.state
            .borrow_mut()
            .dom
            .add_node(PaDomNode::Container(PaNodeContainer {
                name,
                attrs,
                children: Vec::new(),
            }))
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.state.borrow_mut().dom.add_node(PaDomNode::Comment)
    }

    fn create_pi(
        &self,
        _target: StrTendril,
        _data: StrTendril,
    ) -> Self::Handle {
        self.state.borrow_mut().dom.add_node(PaDomNode::Comment)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let dom = &mut self.state.borrow_mut().dom;
        let index = dom.get_node(parent).children().len();
        insert_child(dom, parent, index, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.state.borrow().dom.parent_of(element).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // Fragments have no doctype
    }

    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    fn pop(&self, _node: &Self::Handle) {}

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(
        &self,
        sibling: &Self::Handle,
        new_node: NodeOrText<Self::Handle>,
    ) {
        let dom = &mut self.state.borrow_mut().dom;
        let Some(parent) = dom.parent_of(sibling) else {
            return;
        };
        if let NodeOrText::AppendNode(node) = &new_node {
            detach(dom, node);
        }
        let index = dom
            .get_node(&parent)
            .children()
            .iter()
            .position(|c| c == sibling)
            .unwrap_or(0);
        insert_child(dom, &parent, index, new_node);
    }

    fn add_attrs_if_missing(
        &self,
        target: &Self::Handle,
        attrs: Vec<Attribute>,
    ) {
        let dom = &mut self.state.borrow_mut().dom;
        if let PaDomNode::Container(node) = dom.get_mut_node(target) {
            let to_add: Vec<(String, String)> = attrs
                .iter()
                .filter_map(|attr| {
                    let attr_name = attr.name.local.as_ref();
                    if node.attrs.iter().any(|(name, _)| name == attr_name) {
                        None
                    } else {
                        Some((
                            attr_name.to_owned(),
                            attr.value.as_ref().to_owned(),
                        ))
                    }
                })
                .collect();
            node.attrs.extend(to_add);
        }
    }

    fn associate_with_form(
        &self,
        _target: &Self::Handle,
        _form: &Self::Handle,
        _nodes: (&Self::Handle, Option<&Self::Handle>),
    ) {
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        detach(&mut self.state.borrow_mut().dom, target);
    }

    fn reparent_children(
        &self,
        node: &Self::Handle,
        new_parent: &Self::Handle,
    ) {
        let dom = &mut self.state.borrow_mut().dom;
        let moved = match dom.get_mut_node(node).children_mut() {
            Some(children) => std::mem::take(children),
            None => return,
        };
        if let Some(children) = dom.get_mut_node(new_parent).children_mut() {
            children.extend(moved);
        }
    }

    fn is_mathml_annotation_xml_integration_point(
        &self,
        _handle: &Self::Handle,
    ) -> bool {
        false
    }

    fn set_current_line(&self, _line_number: u64) {}

    fn complete_script(&self, _node: &Self::Handle) -> NextParserState {
        NextParserState::Continue
    }

    fn allow_declarative_shadow_roots(
        &self,
        _intended_parent: &Self::Handle,
    ) -> bool {
        false
    }

    fn attach_declarative_shadow(
        &self,
        _location: &Self::Handle,
        _template: &Self::Handle,
        _attrs: Vec<Attribute>,
    ) -> Result<(), String> {
        Err(String::from("shadow roots are not supported"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn names(dom: &PaDom, handle: &PaDomHandle) -> String {
        match dom.get_node(handle) {
            PaDomNode::Text(t) => format!("{:?}", t.content),
            PaDomNode::Comment => String::from("#comment"),
            PaDomNode::Container(c) | PaDomNode::Document(c) => {
                let children: Vec<String> =
                    c.children.iter().map(|ch| names(dom, ch)).collect();
                format!("{}({})", c.tag(), children.join(","))
            }
        }
    }

    fn parse(input: &str) -> String {
        let dom = PaDomCreator::parse(input).unwrap();
        names(&dom, dom.document_handle())
    }

    #[test]
    fn parsing_an_empty_string_creates_an_empty_dom() {
        assert_eq!(parse(""), "#document(html())");
    }

    #[test]
    fn parsing_nested_structures_produces_them() {
        assert_eq!(
            parse("A<em>B<strong>C</strong>D</em>E"),
            "#document(html(\"A\",em(\"B\",strong(\"C\"),\"D\"),\"E\"))"
        );
    }

    #[test]
    fn parsing_tags_with_attributes_preserves_them() {
        let dom = PaDomCreator::parse("<a href=\"/x\">t</a>").unwrap();
        let html = &dom.get_document().children()[0];
        let link = &dom.get_node(html).children()[0];
        let PaDomNode::Container(link) = dom.get_node(link) else {
            panic!("expected an element");
        };
        assert_eq!(link.get_attr("href"), Some("/x"));
    }

    #[test]
    fn escaped_entities_are_decoded_into_one_text_node() {
        assert_eq!(
            parse("a&lt;b&gt;c&amp;"),
            "#document(html(\"a<b>c&\"))"
        );
    }

    #[test]
    fn comments_are_kept_as_inert_nodes() {
        assert_eq!(parse("a<!-- x -->b"), "#document(html(\"a\",#comment,\"b\"))");
    }

    #[test]
    fn misnested_formatting_is_recovered_without_panicking() {
        let result = PaDomCreator::parse("<strong>a<em>b</strong>c</em>");
        let dom = match result {
            Ok(dom) => dom,
            Err(e) => e.dom,
        };
        assert!(!dom.get_document().children().is_empty());
    }
}
