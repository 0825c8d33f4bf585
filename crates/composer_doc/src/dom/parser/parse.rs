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

use crate::dom::parser::HtmlParseError;
use crate::dom::Dom;

/// Build a document from markup. Fails if html5ever had to recover from
/// malformed input.
pub fn parse(html: &str) -> Result<Dom, HtmlParseError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "sys")] {
            sys::HtmlParser::default().parse(html)
        } else {
            let _ = html;
            Err(HtmlParseError {
                parse_errors: vec![String::from("no markup parser is enabled")],
            })
        }
    }
}

/// Build a document from markup, accepting whatever html5ever recovered
/// from malformed input. Never fails; at worst the result is an empty
/// document.
pub fn parse_lenient(html: &str) -> Dom {
    cfg_if::cfg_if! {
        if #[cfg(feature = "sys")] {
            sys::HtmlParser::default().parse_lenient(html)
        } else {
            log::warn!("no markup parser is enabled, ignoring {} bytes", html.len());
            Dom::new()
        }
    }
}

#[cfg(feature = "sys")]
mod sys {
    use std::str::FromStr;

    use super::*;
    use crate::composer_model::{check_url, IMAGE_SCHEMES, LINK_SCHEMES};
    use crate::config::DEFAULT_IMAGE_MAX_WIDTH;
    use crate::dom::parser::{
        PaDom, PaDomCreator, PaDomHandle, PaDomNode, PaNodeContainer,
    };
    use crate::dom::{
        Alignment, DomError, DomNode, FormatSet, HeadingLevel,
        InlineFormatType, ListType, NodeId,
    };

    /// Converts a [`PaDom`] into a [`Dom`].
    ///
    /// Block-level markup maps onto block nodes. Inline content that turns
    /// up where only blocks may live is gathered into an implicit paragraph
    /// (or list item, inside a list). Tags outside the supported set are
    /// transparent: their content is converted as if the tag were absent.
    pub(super) struct HtmlParser {
        /// Formats applied to text at the current depth.
        formats: FormatSet,
        /// URL of the enclosing `<a>`, if any. Nested links are flattened.
        link_url: Option<String>,
        /// The link node currently receiving text, while it is still the
        /// last child of its block.
        open_link: Option<NodeId>,
    }

    impl HtmlParser {
        pub(super) fn default() -> Self {
            Self {
                formats: FormatSet::new(),
                link_url: None,
                open_link: None,
            }
        }

        pub(super) fn parse(&mut self, html: &str) -> Result<Dom, HtmlParseError> {
            let padom = PaDomCreator::parse(html).map_err(|e| HtmlParseError {
                parse_errors: e.parse_errors,
            })?;
            self.padom_to_dom(&padom).map_err(|e| HtmlParseError {
                parse_errors: vec![e.to_string()],
            })
        }

        pub(super) fn parse_lenient(&mut self, html: &str) -> Dom {
            let padom = match PaDomCreator::parse(html) {
                Ok(padom) => padom,
                Err(e) => {
                    log::warn!(
                        "Recovered from {} markup error(s): {}",
                        e.parse_errors.len(),
                        e.parse_errors.join("; ")
                    );
                    e.dom
                }
            };
            match self.padom_to_dom(&padom) {
                Ok(dom) => dom,
                Err(e) => {
                    log::warn!("Discarding unconvertible markup: {e}");
                    Dom::new()
                }
            }
        }

        fn padom_to_dom(&mut self, padom: &PaDom) -> Result<Dom, DomError> {
            let mut dom = Dom::new_empty();
            let root = dom.root();
            // The fragment parser puts everything under a single `html`
            // element.
            for top in padom.get_document().children() {
                match padom.get_node(top) {
                    PaDomNode::Container(html) => {
                        let mut implicit = None;
                        self.convert_blocks(
                            padom,
                            &html.children,
                            &mut dom,
                            root,
                            &mut implicit,
                        )?;
                    }
                    PaDomNode::Text(_)
                    | PaDomNode::Document(_)
                    | PaDomNode::Comment => {}
                }
            }
            if dom.children(root).is_empty() {
                dom.append_node(root, DomNode::Paragraph)?;
            }
            Ok(dom)
        }

        /// Convert `children` into blocks appended to `parent`, which is
        /// either the root or a list.
        fn convert_blocks(
            &mut self,
            padom: &PaDom,
            children: &[PaDomHandle],
            dom: &mut Dom,
            parent: NodeId,
            implicit: &mut Option<NodeId>,
        ) -> Result<(), DomError> {
            let in_list = matches!(dom.node(parent), Some(DomNode::List(_)));
            for handle in children {
                match padom.get_node(handle) {
                    PaDomNode::Text(text) => {
                        if implicit.is_none() && text.content.trim().is_empty()
                        {
                            continue;
                        }
                        let block = self.implicit_block(dom, parent, implicit)?;
                        self.append_text(dom, block, &text.content)?;
                    }
                    PaDomNode::Container(element) => {
                        if in_list && element.tag() == "li" {
                            *implicit = None;
                            self.convert_list_item(padom, element, dom, parent)?;
                            continue;
                        }
                        if in_list {
                            if is_transparent_block(element.tag()) {
                                self.convert_blocks(
                                    padom,
                                    &element.children,
                                    dom,
                                    parent,
                                    implicit,
                                )?;
                            } else {
                                let item =
                                    self.implicit_block(dom, parent, implicit)?;
                                self.convert_inline_element(
                                    padom, element, dom, item,
                                )?;
                            }
                            continue;
                        }
                        self.convert_block_element(
                            padom, element, dom, parent, implicit,
                        )?;
                    }
                    PaDomNode::Document(_) | PaDomNode::Comment => {}
                }
            }
            Ok(())
        }

        fn convert_block_element(
            &mut self,
            padom: &PaDom,
            element: &PaNodeContainer,
            dom: &mut Dom,
            parent: NodeId,
            implicit: &mut Option<NodeId>,
        ) -> Result<(), DomError> {
            let tag = element.tag();
            let block_node = match tag {
                "p" => Some(DomNode::Paragraph),
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    let level = tag[1..].parse::<u8>().unwrap_or(3).min(3);
                    Some(DomNode::Heading(
                        HeadingLevel::from_level(level).unwrap_or(HeadingLevel::H3),
                    ))
                }
                "blockquote" => Some(DomNode::Quote),
                "pre" => Some(DomNode::CodeBlock),
                "ul" => Some(DomNode::List(ListType::Unordered)),
                "ol" => Some(DomNode::List(ListType::Ordered)),
                "li" => Some(DomNode::ListItem),
                _ => None,
            };

            let Some(block_node) = block_node else {
                if is_transparent_block(tag) {
                    *implicit = None;
                    self.convert_blocks(
                        padom,
                        &element.children,
                        dom,
                        parent,
                        implicit,
                    )?;
                    *implicit = None;
                    return Ok(());
                }
                let block = self.implicit_block(dom, parent, implicit)?;
                return self.convert_inline_element(padom, element, dom, block);
            };

            *implicit = None;
            // A list item outside a list becomes a paragraph.
            let block_node = match block_node {
                DomNode::ListItem => DomNode::Paragraph,
                other => other,
            };
            let block = dom.append_node(parent, block_node.clone())?;
            if let Some(align) = alignment_of(element) {
                dom.set_align(block, Some(align))?;
            }

            match block_node {
                DomNode::CodeBlock => {
                    let text = code_text(padom, &element.children);
                    dom.set_code_text(block, &text)?;
                }
                DomNode::List(_) => {
                    let mut implicit_item = None;
                    self.convert_blocks(
                        padom,
                        &element.children,
                        dom,
                        block,
                        &mut implicit_item,
                    )?;
                }
                _ => {
                    self.convert_inline_children(
                        padom,
                        &element.children,
                        dom,
                        block,
                    )?;
                }
            }
            Ok(())
        }

        fn convert_list_item(
            &mut self,
            padom: &PaDom,
            element: &PaNodeContainer,
            dom: &mut Dom,
            list: NodeId,
        ) -> Result<(), DomError> {
            let item = dom.append_node(list, DomNode::ListItem)?;
            if let Some(align) = alignment_of(element) {
                dom.set_align(item, Some(align))?;
            }
            self.convert_inline_children(padom, &element.children, dom, item)
        }

        /// Convert inline markup into the children of the text block `block`.
        fn convert_inline_children(
            &mut self,
            padom: &PaDom,
            children: &[PaDomHandle],
            dom: &mut Dom,
            block: NodeId,
        ) -> Result<(), DomError> {
            for handle in children {
                match padom.get_node(handle) {
                    PaDomNode::Text(text) => {
                        self.append_text(dom, block, &text.content)?
                    }
                    PaDomNode::Container(element) => {
                        self.convert_inline_element(padom, element, dom, block)?
                    }
                    PaDomNode::Document(_) | PaDomNode::Comment => {}
                }
            }
            self.open_link = None;
            Ok(())
        }

        fn convert_inline_element(
            &mut self,
            padom: &PaDom,
            element: &PaNodeContainer,
            dom: &mut Dom,
            block: NodeId,
        ) -> Result<(), DomError> {
            let tag = element.tag();
            if let Some(format) = InlineFormatType::from_tag(tag) {
                let saved = self.formats.clone();
                self.formats.insert(format);
                let result = self.convert_inline_nested(padom, element, dom, block);
                self.formats = saved;
                return result;
            }
            match tag {
                "br" => self.append_inline(dom, block, DomNode::LineBreak),
                "img" => {
                    let src = element.get_attr("src").unwrap_or_default();
                    if check_url(src, IMAGE_SCHEMES).is_err() {
                        log::warn!("Dropping image with disallowed source {src:?}");
                        return Ok(());
                    }
                    let alt = element.get_attr("alt").unwrap_or_default();
                    let width =
                        element.max_width_px().unwrap_or(DEFAULT_IMAGE_MAX_WIDTH);
                    self.append_inline(
                        dom,
                        block,
                        DomNode::new_image(src, alt, width),
                    )
                }
                "a" if self.link_url.is_none() => {
                    let href = element.get_attr("href").unwrap_or_default();
                    if check_url(href, LINK_SCHEMES).is_err() {
                        log::warn!("Unlinking text with disallowed target {href:?}");
                        return self.convert_inline_nested(padom, element, dom, block);
                    }
                    self.link_url = Some(href.to_owned());
                    self.open_link = None;
                    let result =
                        self.convert_inline_nested(padom, element, dom, block);
                    self.link_url = None;
                    self.open_link = None;
                    result
                }
                "ul" | "ol" if matches!(dom.node(block), Some(DomNode::ListItem)) => {
                    let list_type = ListType::from_ordered(tag == "ol");
                    let list = dom.append_node(block, DomNode::List(list_type))?;
                    for handle in &element.children {
                        match padom.get_node(handle) {
                            PaDomNode::Container(child) if child.tag() == "li" => {
                                self.convert_list_item(padom, child, dom, list)?;
                            }
                            PaDomNode::Text(text) if text.content.trim().is_empty() => {}
                            PaDomNode::Container(_) | PaDomNode::Text(_) => {
                                let item = dom.append_node(list, DomNode::ListItem)?;
                                self.convert_inline_children(
                                    padom,
                                    std::slice::from_ref(handle),
                                    dom,
                                    item,
                                )?;
                            }
                            PaDomNode::Document(_) | PaDomNode::Comment => {}
                        }
                    }
                    Ok(())
                }
                "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
                | "blockquote" | "pre" | "li" | "ul" | "ol" => {
                    if !dom.children(block).is_empty() {
                        self.append_inline(dom, block, DomNode::LineBreak)?;
                    }
                    self.convert_inline_nested(padom, element, dom, block)
                }
                _ => self.convert_inline_nested(padom, element, dom, block),
            }
        }

        /// Like `convert_inline_children`, but keeps the open link so that a
        /// link's text continues in the same node.
        fn convert_inline_nested(
            &mut self,
            padom: &PaDom,
            element: &PaNodeContainer,
            dom: &mut Dom,
            block: NodeId,
        ) -> Result<(), DomError> {
            for handle in &element.children {
                match padom.get_node(handle) {
                    PaDomNode::Text(text) => {
                        self.append_text(dom, block, &text.content)?
                    }
                    PaDomNode::Container(child) => {
                        self.convert_inline_element(padom, child, dom, block)?
                    }
                    PaDomNode::Document(_) | PaDomNode::Comment => {}
                }
            }
            Ok(())
        }

        /// The implicit block collecting stray inline content under
        /// `parent`, created on first use.
        fn implicit_block(
            &mut self,
            dom: &mut Dom,
            parent: NodeId,
            implicit: &mut Option<NodeId>,
        ) -> Result<NodeId, DomError> {
            if let Some(block) = *implicit {
                return Ok(block);
            }
            let block = match dom.node(parent) {
                Some(DomNode::ListItem) => parent,
                Some(DomNode::List(_)) => {
                    dom.append_node(parent, DomNode::ListItem)?
                }
                _ => dom.append_node(parent, DomNode::Paragraph)?,
            };
            self.open_link = None;
            *implicit = Some(block);
            Ok(block)
        }

        fn append_text(
            &mut self,
            dom: &mut Dom,
            block: NodeId,
            text: &str,
        ) -> Result<(), DomError> {
            if text.is_empty() {
                return Ok(());
            }
            if matches!(dom.node(block), Some(DomNode::CodeBlock)) {
                let merged = format!("{}{text}", dom.text_content(block));
                return dom.set_code_text(block, &merged);
            }
            let node = DomNode::new_formatted_text(text, self.formats.clone());
            self.append_inline(dom, block, node)
        }

        /// Append an inline node to `block`, routing text and line breaks
        /// into the enclosing link and merging adjacent text with equal
        /// formats.
        fn append_inline(
            &mut self,
            dom: &mut Dom,
            block: NodeId,
            node: DomNode,
        ) -> Result<(), DomError> {
            let linkable = matches!(node, DomNode::Text { .. } | DomNode::LineBreak);
            let target = match (&self.link_url, linkable) {
                (Some(url), true) => {
                    let reusable = self.open_link.filter(|l| {
                        dom.children(block).last() == Some(l)
                    });
                    match reusable {
                        Some(link) => link,
                        None => {
                            let link = dom
                                .append_node(block, DomNode::new_link(url.clone()))?;
                            self.open_link = Some(link);
                            link
                        }
                    }
                }
                _ => block,
            };

            if let DomNode::Text { content, formats } = &node {
                if let Some(last) = dom.children(target).last().copied() {
                    if let Some(DomNode::Text {
                        content: prev,
                        formats: prev_formats,
                    }) = dom.node(last)
                    {
                        if prev_formats == formats {
                            let merged = format!("{prev}{content}");
                            return dom.set_text(last, &merged);
                        }
                    }
                }
            }
            dom.append_node(target, node)?;
            Ok(())
        }
    }

    /// Tags without their own block node whose children are treated as
    /// blocks of the enclosing container.
    fn is_transparent_block(tag: &str) -> bool {
        matches!(
            tag,
            "div" | "section" | "article" | "main" | "body" | "html" | "header"
                | "footer"
        )
    }

    fn alignment_of(element: &PaNodeContainer) -> Option<Alignment> {
        element
            .style_value("text-align")
            .and_then(|v| Alignment::from_str(&v).ok())
    }

    /// Text of a `pre` element: all descendant text, `br` as `'\n'`.
    fn code_text(padom: &PaDom, children: &[PaDomHandle]) -> String {
        let mut out = String::new();
        for handle in children {
            match padom.get_node(handle) {
                PaDomNode::Text(text) => out.push_str(&text.content),
                PaDomNode::Container(element) if element.tag() == "br" => {
                    out.push('\n')
                }
                PaDomNode::Container(element) => {
                    out.push_str(&code_text(padom, &element.children))
                }
                PaDomNode::Document(_) | PaDomNode::Comment => {}
            }
        }
        out
    }

    #[cfg(test)]
    mod test {
        use indoc::indoc;
        use speculoos::{assert_that, AssertionFailure, Spec};

        use super::*;
        use crate::dom::{ToHtml, ToPlainText, ToTree};

        trait Roundtrips<T> {
            fn roundtrips(&self);
        }

        impl<T> Roundtrips<T> for Spec<'_, T>
        where
            T: AsRef<str>,
        {
            fn roundtrips(&self) {
                let subject = self.subject.as_ref();
                let dom = parse(subject).unwrap();

                // After parsing all our invariants should be satisfied
                dom.explicitly_assert_invariants();

                let output = dom.to_html();
                if output != subject {
                    AssertionFailure::from_spec(self)
                        .with_expected(String::from(subject))
                        .with_actual(output)
                        .fail();
                }
            }
        }

        fn html_of(input: &str) -> String {
            parse_lenient(input).to_html()
        }

        #[test]
        fn parse_paragraph() {
            assert_that!("<p>some text</p>").roundtrips();
        }

        #[test]
        fn parse_formatting_in_canonical_order() {
            assert_that!("<p><strong><em><u><s><code>x</code></s></u></em></strong></p>")
                .roundtrips();
            assert_that!("<p><strong>a<em>b</em></strong>c</p>").roundtrips();
        }

        #[test]
        fn parse_headings() {
            assert_that!("<h1>a</h1><h2>b</h2><h3>c</h3>").roundtrips();
        }

        #[test]
        fn parse_quote_and_code_block() {
            assert_that!("<blockquote>q<br />r</blockquote>").roundtrips();
            assert_that!("<pre><code>a &lt; b\n  c</code></pre>").roundtrips();
        }

        #[test]
        fn parse_lists() {
            assert_that!("<ul><li>a</li><li>b</li></ul>").roundtrips();
            assert_that!("<ol><li>a<ul><li>b</li></ul></li></ol>").roundtrips();
            assert_that!("<ol><li></li></ol>").roundtrips();
        }

        #[test]
        fn parse_links_and_images() {
            assert_that!("<p><a href=\"https://x.com\">click here</a></p>").roundtrips();
            assert_that!(
                "<p><a href=\"/x\"><strong>b</strong></a> and <img src=\"/a.png\" alt=\"cat\" style=\"max-width: 320px;\" /></p>"
            )
            .roundtrips();
        }

        #[test]
        fn parse_alignment() {
            assert_that!("<p style=\"text-align: center;\">a</p>").roundtrips();
            assert_that!("<ul><li style=\"text-align: right;\">a</li></ul>")
                .roundtrips();
        }

        #[test]
        fn parse_escaped_text() {
            assert_that!("<p>&lt;script&gt;alert(1)&lt;/script&gt; &amp;</p>")
                .roundtrips();
        }

        #[test]
        fn empty_input_gives_one_empty_paragraph() {
            let dom = parse("").unwrap();
            assert_eq!(
                dom.to_tree(),
                indoc! {"
                    root
                    └>p
                "}
            );
        }

        #[test]
        fn stray_inline_content_is_wrapped_in_a_paragraph() {
            assert_eq!(html_of("foo<strong>bar</strong>"), "<p>foo<strong>bar</strong></p>");
            assert_eq!(html_of("<p>a</p>b"), "<p>a</p><p>b</p>");
        }

        #[test]
        fn legacy_tags_are_synonyms() {
            assert_eq!(
                html_of("<p><b>a</b><i>b</i><del>c</del><strike>d</strike></p>"),
                "<p><strong>a</strong><em>b</em><s>cd</s></p>"
            );
        }

        #[test]
        fn deep_headings_clamp_to_h3() {
            assert_eq!(html_of("<h5>x</h5>"), "<h3>x</h3>");
        }

        #[test]
        fn format_order_is_canonicalized() {
            assert_eq!(
                html_of("<p><em><strong>x</strong></em></p>"),
                "<p><strong><em>x</em></strong></p>"
            );
        }

        #[test]
        fn paragraphs_inside_list_items_are_transparent() {
            assert_eq!(
                html_of("<ul><li><p>a</p><p>b</p></li></ul>"),
                "<ul><li>a<br />b</li></ul>"
            );
        }

        #[test]
        fn whitespace_between_blocks_is_ignored() {
            assert_eq!(
                html_of("<p>a</p>\n  <ul>\n <li>b</li>\n</ul>"),
                "<p>a</p><ul><li>b</li></ul>"
            );
        }

        #[test]
        fn image_without_width_gets_the_default() {
            assert_eq!(
                html_of("<p><img src=\"/a.png\" alt=\"\"></p>"),
                "<p><img src=\"/a.png\" alt=\"\" style=\"max-width: 800px;\" /></p>"
            );
        }

        #[test]
        fn disallowed_urls_are_stripped() {
            assert_eq!(
                html_of("<p><a href=\"javascript:alert(1)\">x</a><img src=\"javascript:alert(2)\" alt=\"\"></p>"),
                "<p>x</p>"
            );
            assert_eq!(
                html_of("<p><a href=\"data:text/html,hi\"><em>y</em></a> or <a href=\"mailto:a@b.c\">z</a></p>"),
                "<p><em>y</em> or <a href=\"mailto:a@b.c\">z</a></p>"
            );
        }

        #[test]
        fn malformed_markup_fails_strict_parse_but_recovers_leniently() {
            let input = "<p><strong>a<em>b</strong>c</em></p>";
            assert!(parse(input).is_err());
            assert_eq!(parse_lenient(input).to_plain_text(), "abc");
        }
    }
}
