// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text rendering of session state
//!
//! Snippets arrive as HTML from the backend and are untrusted. They are
//! reduced to plain text here: script and style blocks are dropped, every
//! tag is stripped, entities are decoded, and only the highlight tags
//! (`mark`, `b`, `strong`, `em`) survive as styled spans.

use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

use crate::session::{DocumentDetail, DocumentState, SearchState, Session, SuggestState};

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
});
static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)[^>]*>").expect("valid regex"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex"));

const HIGHLIGHT_TAGS: &[&str] = &["mark", "b", "strong", "em"];

/// A run of snippet text, highlighted or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub highlight: bool,
}

/// Split snippet HTML into plain-text spans
pub fn snippet_spans(html: &str) -> Vec<Span> {
    let cleaned = SCRIPT_BLOCK.replace_all(html, "");
    let mut spans: Vec<Span> = Vec::new();
    let mut depth = 0usize;
    let mut cursor = 0;

    let push = |spans: &mut Vec<Span>, raw: &str, highlight: bool| {
        if raw.is_empty() {
            return;
        }
        let text = decode_entities(raw);
        match spans.last_mut() {
            Some(last) if last.highlight == highlight => last.text.push_str(&text),
            _ => spans.push(Span { text, highlight }),
        }
    };

    for caps in TAG.captures_iter(&cleaned) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        push(&mut spans, &cleaned[cursor..whole.start], depth > 0);
        cursor = whole.end;

        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        if name == "br" {
            push(&mut spans, " ", depth > 0);
        } else if HIGHLIGHT_TAGS.contains(&name.as_str()) {
            if closing {
                depth = depth.saturating_sub(1);
            } else if !caps[0].ends_with("/>") {
                depth += 1;
            }
        }
    }
    push(&mut spans, &cleaned[cursor..], depth > 0);
    spans
}

/// Snippet HTML as terminal text
pub fn snippet(html: &str, use_color: bool) -> String {
    snippet_spans(html)
        .into_iter()
        .map(|span| {
            if span.highlight && use_color {
                span.text.yellow().bold().to_string()
            } else {
                span.text
            }
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = match body {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => body
                    .strip_prefix("#x")
                    .or_else(|| body.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| body.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

pub fn suggestions(state: &SuggestState, use_color: bool) -> String {
    let active = state.cursor().index();
    let mut out = String::new();
    for (idx, suggestion) in state.list().iter().enumerate() {
        if idx as i64 == active {
            let marker = if use_color {
                ">".blue().to_string()
            } else {
                ">".to_string()
            };
            let _ = writeln!(out, "{} {}", marker, suggestion);
        } else {
            let _ = writeln!(out, "  {}", suggestion);
        }
    }
    out
}

pub fn results(state: &SearchState, use_color: bool) -> String {
    let mut out = String::new();
    if state.is_loading() {
        out.push_str("Fetching results...\n");
    }
    if let Some(error) = state.error() {
        let line = if use_color {
            error.red().to_string()
        } else {
            error.to_string()
        };
        let _ = writeln!(out, "{}", line);
    }
    if state.results().is_empty() {
        return out;
    }

    let secs = state.elapsed_display().unwrap_or_default();
    let count = state.results().len().to_string();
    let count = if use_color { count.cyan().to_string() } else { count };
    let _ = writeln!(out, "{} result(s) fetched in {} sec\n", count, secs);

    for item in state.results() {
        let id = if use_color {
            item.id.bold().to_string()
        } else {
            item.id.clone()
        };
        let _ = writeln!(out, "Document ID: {} | Score: {}", id, item.score);
        let _ = writeln!(out, "  {}", snippet(&item.snippet_html, use_color));
    }
    out
}

pub fn overlay(state: &DocumentState) -> String {
    match state.detail() {
        Some(_) if !state.is_open() => String::new(),
        Some(DocumentDetail::Loaded { id, content }) => format!("Document {}\n\n{}\n", id, content),
        Some(DocumentDetail::Failed { error }) => format!("Document\n\n{}\n", error),
        None => String::new(),
    }
}

/// Everything a terminal front end would draw for the session
pub fn session(session: &Session, use_color: bool) -> String {
    let mut out = String::new();
    if session.suggestions().is_visible() {
        out.push_str(&suggestions(session.suggestions(), use_color));
    }
    out.push_str(&results(session.search(), use_color));
    if session.document().is_loading() {
        out.push_str("Loading document...\n");
    }
    out.push_str(&overlay(session.document()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_tags_become_highlight_spans() {
        let spans = snippet_spans("...the <mark>quick</mark> fox...");
        assert_eq!(
            spans,
            vec![
                Span {
                    text: "...the ".into(),
                    highlight: false
                },
                Span {
                    text: "quick".into(),
                    highlight: true
                },
                Span {
                    text: " fox...".into(),
                    highlight: false
                },
            ]
        );
    }

    #[test]
    fn scripts_and_unknown_tags_are_removed() {
        let html = r#"<p onclick="x()">safe</p><script>alert(1)</script><img src=x onerror=y>"#;
        assert_eq!(snippet(html, false), "safe");
    }

    #[test]
    fn entities_are_decoded_after_tags_are_stripped() {
        assert_eq!(snippet("a &lt;b&gt; &amp; &#65;&#x42; &bogus;", false), "a <b> & AB &bogus;");
    }

    #[test]
    fn unbalanced_close_does_not_underflow() {
        let spans = snippet_spans("</b>plain<b>bold");
        assert_eq!(spans.len(), 2);
        assert!(!spans[0].highlight);
        assert!(spans[1].highlight);
    }

    #[test]
    fn placeholder_passes_through() {
        assert_eq!(
            snippet(crate::session::SNIPPET_PLACEHOLDER, false),
            "Snippet not available"
        );
    }
}
