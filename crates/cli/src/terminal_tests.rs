// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::render;

#[yare::parameterized(
    tags = { r#"<span class="msg">hi</span>"#, "hi" },
    entities = { "a &lt;b&gt; &amp;amp; &quot;c&quot; &#39;d&#39;", r#"a <b> &amp; "c" 'd'"# },
    emote = { r#"lol <img src="/e/k.png" height="28px" title="kappa" />"#, "lol :kappa:" },
    untitled_img = { r#"<img src="/x.png" />x"#, "x" },
    plain = { "no markup", "no markup" },
)]
fn strips_markup(html: &str, expected: &str) {
    assert_eq!(strip_html(html), expected);
}

#[test]
fn rendered_chat_line_reads_naturally() {
    let html = r#"<span><span class="name" style="color:red">ann</span><b>:</b> <span class="msg">hey</span></span>"#;
    assert_eq!(strip_html(html), "ann: hey");
    assert_eq!(strip_html(render::PURGE_NOTICE), "Chat has been purged by a moderator.");
}

#[yare::parameterized(
    quit = { "\\quit", UiEvent::Quit },
    users = { "\\users", UiEvent::RequestUsers },
    join = { "\\join alice", UiEvent::Join { name: "alice".into() } },
    color = { "\\color #ff0000", UiEvent::SetColor("#ff0000".into()) },
    stamps_on = { "\\timestamps on", UiEvent::SetTimestamps(true) },
    stamps_off = { "\\timestamps off\r\n", UiEvent::SetTimestamps(false) },
    chat = { "hello there", UiEvent::Send("hello there".into()) },
    server_command = { "/me waves", UiEvent::Send("/me waves".into()) },
)]
fn single_event_lines(line: &str, expected: UiEvent) {
    assert_eq!(parse_line(line).ok(), Some(vec![expected]));
}

#[test]
fn trailing_tab_requests_completion() -> anyhow::Result<()> {
    let events = parse_line("hey @b\t")?;
    assert_eq!(
        events,
        vec![
            UiEvent::ContentChanged { text: "hey @b".into(), caret: 6 },
            UiEvent::KeyDown { key: Key::Tab, ctrl: false },
        ]
    );
    Ok(())
}

#[yare::parameterized(
    unknown = { "\\dance" },
    missing_arg = { "\\color" },
    bad_toggle = { "\\timestamps maybe" },
    extra_arg = { "\\quit now" },
)]
fn bad_commands_print_usage(line: &str) {
    crate::assert_err_contains!(parse_line(line), "commands:");
}

#[test]
fn terminal_ui_prints_plain_text() {
    let mut ui = TerminalUi::new(Vec::new(), "http://chat.example/");
    ui.append_message(r#"<span class="notice">hi &amp; bye</span>"#);
    ui.set_playing(Some("Movie"), None);
    ui.show_notice("");
    ui.show_notice("careful");
    ui.open_url("/help");
    ui.show_suggestions(&[
        SuggestionItem { name: "ann".into(), selected: false, image: None },
        SuggestionItem { name: "bob".into(), selected: true, image: None },
    ]);
    ui.set_compose("hey @bob ", 9);
    ui.connection_changed(ConnectionState::Closed);

    let out = String::from_utf8(ui.into_inner()).unwrap_or_default();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "hi & bye",
            "* now playing: Movie",
            "! careful",
            "* see http://chat.example/help",
            "? ann [bob]",
            "> hey @bob ",
            "* connection closed",
        ]
    );
}
