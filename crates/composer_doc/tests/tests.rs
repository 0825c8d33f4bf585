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

use composer_doc::{
    apply, parse_lenient, serialize, BlockType, Command, CommandError,
    ComposerModel, ComposerState, HeadingLevel, InlineFormatType, ListType,
    TextUpdate, ToHtml, UploadError,
};

fn model_with_text(text: &str) -> ComposerModel {
    let mut model = ComposerModel::new();
    model.replace_text(text).unwrap();
    model
}

fn html(model: &ComposerModel) -> String {
    model.get_content_as_html()
}

#[test]
fn can_instantiate_a_model_and_call_methods() {
    let mut model = model_with_text("foo");
    model.select_offsets(1, 2).unwrap();

    let update = model.bold().unwrap();

    if let TextUpdate::ReplaceAll(r) = update.text_update {
        assert_eq!(r.replacement_html, "<p>f<strong>o</strong>o</p>");
    } else {
        panic!("Expected to receive a ReplaceAll response");
    }
    assert_eq!(model.get_selection_offsets(), Some((1, 2)));
}

#[test]
fn bold_toggles_on_and_off() {
    let mut model = model_with_text("Hello");
    model.select_offsets(0, 5).unwrap();
    model.bold().unwrap();
    assert_eq!(html(&model), "<p><strong>Hello</strong></p>");
    model.bold().unwrap();
    assert_eq!(html(&model), "<p>Hello</p>");
}

#[test]
fn heading_is_undone_back_to_a_paragraph() {
    let mut model = model_with_text("Title");
    model.heading(HeadingLevel::H2).unwrap();
    assert_eq!(html(&model), "<h2>Title</h2>");
    assert_eq!(model.get_selection_offsets(), Some((5, 5)));
    model.undo().unwrap();
    assert_eq!(html(&model), "<p>Title</p>");
}

#[test]
fn link_cannot_be_nested_in_a_link() {
    let mut model = model_with_text("click here");
    model.select_offsets(0, 10).unwrap();
    model.insert_link("https://x.com").unwrap();
    assert_eq!(html(&model), "<p><a href=\"https://x.com\">click here</a></p>");

    let before = model.state().clone();
    let result = model.insert_link("https://y.com");
    assert!(matches!(result, Err(CommandError::StructuralViolation(_))));
    assert_eq!(model.state(), &before);
}

#[test]
fn image_is_refused_inside_a_code_block() {
    let mut model = model_with_text("let x = 1;");
    model.code_block().unwrap();
    model.select_offsets(4, 4).unwrap();
    let result = model.insert_image("/img/a.png", "cat", Some(800));
    assert!(matches!(result, Err(CommandError::InvalidSelection(_))));
    assert_eq!(html(&model), "<pre><code>let x = 1;</code></pre>");
}

#[test]
fn list_toggle_returns_to_the_original_document() {
    let mut model = model_with_text("one\ntwo");
    model.select_offsets(0, 7).unwrap();
    let before = html(&model);
    model.insert_list(ListType::Unordered).unwrap();
    assert_eq!(html(&model), "<ul><li>one</li><li>two</li></ul>");
    model.insert_list(ListType::Unordered).unwrap();
    assert_eq!(html(&model), before);
}

#[test]
fn undo_and_redo_walk_through_history() {
    let mut model = model_with_text("abc");
    model.select_offsets(0, 3).unwrap();
    model.italic().unwrap();
    model.quote().unwrap();
    assert_eq!(html(&model), "<blockquote><em>abc</em></blockquote>");

    model.undo().unwrap();
    assert_eq!(html(&model), "<p><em>abc</em></p>");
    model.undo().unwrap();
    assert_eq!(html(&model), "<p>abc</p>");
    model.redo().unwrap();
    assert_eq!(html(&model), "<p><em>abc</em></p>");
    model.redo().unwrap();
    assert_eq!(html(&model), "<blockquote><em>abc</em></blockquote>");
    assert_eq!(model.redo(), Err(CommandError::NothingToRedo));
}

#[test]
fn fresh_model_has_nothing_to_undo() {
    let mut model = ComposerModel::new();
    assert_eq!(model.undo(), Err(CommandError::NothingToUndo));
}

#[test]
fn commands_without_a_selection_fail() {
    let mut model = model_with_text("abc");
    model.clear_selection();
    assert_eq!(model.bold(), Err(CommandError::NoSelection));
    assert_eq!(model.unordered_list(), Err(CommandError::NoSelection));
    assert_eq!(html(&model), "<p>abc</p>");
}

#[test]
fn user_text_is_escaped() {
    let mut model = model_with_text("<script>alert(\"x\")</script> & co");
    model.select_offsets(0, 0).unwrap();
    model.insert_link_with_text("https://a.b/?q=1&r=2", "<b>").unwrap();
    assert_eq!(
        html(&model),
        "<p><a href=\"https://a.b/?q=1&amp;r=2\">&lt;b&gt;</a>\
         &lt;script&gt;alert(\"x\")&lt;/script&gt; &amp; co</p>"
    );
}

#[test]
fn serialization_is_stable_across_a_reparse() {
    let inputs = [
        "<p><em><strong>x</strong></em> y</p>",
        "<h2 style=\"text-align: center;\">t</h2><p></p><ul><li>a<ol><li>b</li></ol></li></ul>",
        "<blockquote>q<br />r</blockquote><pre><code>a &lt; b</code></pre>",
        "<p><a href=\"https://x.com\"><strong>l</strong>ink</a><img src=\"/i.png\" alt=\"i\" /></p>",
    ];
    for input in inputs {
        let first = serialize(&parse_lenient(input));
        let second = serialize(&parse_lenient(&first));
        assert_eq!(first, second, "unstable output for {input}");
    }
}

#[test]
fn typed_nul_characters_do_not_break_a_reparse() {
    let mut model = model_with_text("a\u{0}b");
    assert_eq!(html(&model), "<p>ab</p>");
    let first = html(&model);
    assert_eq!(serialize(&parse_lenient(&first)), first);

    let before = model.state().clone();
    model.replace_text("\u{0}").unwrap();
    assert_eq!(model.state(), &before);
}

#[test]
fn formats_nest_in_canonical_order() {
    let dom = parse_lenient("<p><code><s><u><em><strong>x</strong></em></u></s></code></p>");
    assert_eq!(
        dom.to_html(),
        "<p><strong><em><u><s><code>x</code></s></u></em></strong></p>"
    );
}

#[test]
fn apply_does_not_touch_its_input() {
    let state = ComposerState::new();
    let applied =
        apply(&state, &Command::ReplaceText(String::from("hi"))).unwrap();
    assert!(applied.document_changed);
    assert_eq!(applied.state.dom.to_html(), "<p>hi</p>");
    assert_eq!(state, ComposerState::new());

    let bold = apply(
        &applied.state,
        &Command::ToggleInlineFormat(InlineFormatType::Bold),
    )
    .unwrap();
    assert!(!bold.document_changed);
    assert!(bold.state.pending_formats.contains(&InlineFormatType::Bold));
}

#[test]
fn apply_reports_block_changes_and_rejections() {
    let state = apply(&ComposerState::new(), &Command::ReplaceText("x".into()))
        .unwrap()
        .state;
    let quoted = apply(&state, &Command::SetBlockType(BlockType::Quote)).unwrap();
    assert_eq!(quoted.state.dom.to_html(), "<blockquote>x</blockquote>");
    assert_eq!(
        apply(&quoted.state, &Command::Undo).map(|a| a.document_changed),
        Err(CommandError::NothingToUndo)
    );
}

#[test]
fn stale_upload_response_is_refused() {
    let mut model = model_with_text("post");
    let old = model.begin_image_upload();
    let new = model.begin_image_upload();
    let result =
        model.complete_image_upload(old, Ok(String::from("/old.png")), "", None);
    assert!(matches!(result, Err(CommandError::StaleUpload { .. })));
    assert_eq!(html(&model), "<p>post</p>");

    let update = model
        .complete_image_upload(new, Err(UploadError::new("offline")), "", None)
        .unwrap();
    assert_eq!(update.upload_failure.as_deref(), Some("offline"));
    assert!(!model.has_pending_upload());
}

#[test]
fn content_round_trips_through_the_model() {
    let source = "<h1>News</h1><p>Read <a href=\"https://x.com\">this</a>.</p>";
    let model = ComposerModel::from_html(source);
    assert_eq!(html(&model), source);
    assert_eq!(model.get_content_as_plain_text(), "News\nRead this.");
    assert!(!model.can_undo());
}
