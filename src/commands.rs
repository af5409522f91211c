// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot commands: a single suggest, search or open against the backend
//!
//! These drive a [`Session`] directly instead of going through the
//! controller. The debounce is skipped: a suggestion ticket is fired as soon
//! as it is issued.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::collections::VecDeque;
use tokio::time::Instant;
use tracing::info;

use shahquery::backend::Backend;
use shahquery::errors::suggestions;
use shahquery::render;
use shahquery::session::{Effect, Event, Session, SessionSettings};

use crate::cli::OutputFormat;

/// How results reach stdout
#[derive(Debug, Clone, Copy)]
pub struct Output<'a> {
    pub format: OutputFormat,
    pub compact: bool,
    pub use_color: bool,
    pub backend_url: &'a str,
}

impl Output<'_> {
    fn json<T: Serialize>(&self, value: &T) -> Result<String> {
        let text = if self.compact {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        };
        text.context("serializing output")
    }

    fn emit(&self, text: &str) {
        if text.ends_with('\n') || text.is_empty() {
            print!("{}", text);
        } else {
            println!("{}", text);
        }
    }

    fn hint_if_unreachable(&self, unreachable: bool) {
        if unreachable {
            eprintln!("{}", suggestions::backend_unreachable(self.backend_url));
        }
    }
}

/// True when a completion carries a failure that never reached the backend
fn is_transport_failure(event: &Event) -> bool {
    match event {
        Event::SuggestionsLoaded { result: Err(err), .. }
        | Event::SearchCompleted { result: Err(err), .. }
        | Event::DocumentLoaded { result: Err(err), .. } => err.is_transport(),
        _ => false,
    }
}

/// Run effects to completion, feeding each result back in
///
/// Returns whether any request failed to reach the backend.
async fn run_effects<B: Backend>(session: &mut Session, backend: &B, effects: Vec<Effect>) -> bool {
    let mut unreachable = false;
    let mut queue: VecDeque<Effect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Fetch(fetch) => {
                let event = fetch.run(backend).await;
                unreachable |= is_transport_failure(&event);
                queue.extend(session.handle(event, Instant::now()));
            }
            Effect::ArmSuggestTimer(ticket) => {
                let event = Event::TimerFired {
                    generation: ticket.generation,
                };
                queue.extend(session.handle(event, Instant::now()));
            }
            Effect::CancelSuggestTimer => {}
        }
    }
    unreachable
}

pub async fn suggest<B: Backend>(
    backend: &B,
    settings: SessionSettings,
    query: &str,
    out: Output<'_>,
) -> Result<()> {
    let mut session = Session::new(settings);
    let effects = session.handle(Event::QueryChanged(query.to_string()), Instant::now());
    let unreachable = run_effects(&mut session, backend, effects).await;

    let list = session.suggestions().list();
    match out.format {
        OutputFormat::Json => out.emit(&out.json(&json!({
            "query": query,
            "suggestions": list,
        }))?),
        OutputFormat::Text => out.emit(&render::suggestions(session.suggestions(), out.use_color)),
    }
    out.hint_if_unreachable(unreachable);
    Ok(())
}

pub async fn search<B: Backend>(backend: &B, query: &str, out: Output<'_>) -> Result<()> {
    let mut session = Session::new(SessionSettings::default());
    session.handle(Event::QueryChanged(query.to_string()), Instant::now());
    let effects = session.handle(Event::Submit, Instant::now());
    if effects.is_empty() {
        info!("blank query, nothing to search");
    }
    let unreachable = run_effects(&mut session, backend, effects).await;

    let state = session.search();
    match out.format {
        OutputFormat::Json => out.emit(&out.json(&json!({
            "query": query,
            "results": state.results(),
            "error": state.error(),
            "fetch_elapsed_seconds": state.elapsed_display(),
        }))?),
        OutputFormat::Text => out.emit(&render::results(state, out.use_color)),
    }
    out.hint_if_unreachable(unreachable);
    Ok(())
}

pub async fn open<B: Backend>(backend: &B, doc_id: &str, out: Output<'_>) -> Result<()> {
    let mut session = Session::new(SessionSettings::default());
    let effects = session.handle(Event::ResultSelected(doc_id.to_string()), Instant::now());
    let unreachable = run_effects(&mut session, backend, effects).await;

    let document = session.document();
    match out.format {
        OutputFormat::Json => out.emit(&out.json(&document.detail())?),
        OutputFormat::Text => out.emit(&render::overlay(document)),
    }
    out.hint_if_unreachable(unreachable);
    Ok(())
}
