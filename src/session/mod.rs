// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interaction state for one search session
//!
//! [`Session`] is a plain state record. Every input, whether a keystroke, a
//! pointer press, a timer wake-up or a finished request, arrives as an
//! [`Event`] and is applied by [`Session::handle`], which returns the
//! [`Effect`]s the runtime must carry out. Nothing in here waits or spawns;
//! see [`crate::controller`] for the async side.

pub mod dismissal;
pub mod document;
pub mod navigator;
pub mod search;
pub mod suggest;

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::backend::{Backend, Document, SearchResponse};
use crate::errors::BackendError;
use crate::timer::TimerTicket;

pub use dismissal::{Layout, Point, PointerHub, PointerSubscription, Region};
pub use document::{DocumentDetail, DocumentState, ModalTarget, DOCUMENT_ERROR_MESSAGE};
pub use navigator::{Cursor, Key};
pub use search::{ResultItem, SearchState, SNIPPET_PLACEHOLDER, TRANSPORT_ERROR_MESSAGE};
pub use suggest::{StalePolicy, SuggestState};

/// Tunables for the suggestion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Quiet period before a suggestion fetch
    pub debounce: Duration,
    /// Shortest query (in characters) that asks for suggestions
    pub min_query_len: usize,
    pub stale_policy: StalePolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_query_len: 2,
            stale_policy: StalePolicy::Discard,
        }
    }
}

/// Everything that can happen to a session
#[derive(Debug)]
pub enum Event {
    QueryChanged(String),
    Focus,
    Key(Key),
    SuggestionClicked(usize),
    PointerPressed(Point),
    Layout(Layout),
    Submit,
    ResultSelected(String),
    ModalClicked(ModalTarget),
    TimerFired {
        generation: u64,
    },
    SuggestionsLoaded {
        seq: u64,
        query: String,
        result: Result<Vec<String>, BackendError>,
    },
    SearchCompleted {
        query: String,
        started: Instant,
        finished: Instant,
        result: Result<SearchResponse, BackendError>,
    },
    DocumentLoaded {
        doc_id: String,
        result: Result<Document, BackendError>,
    },
}

/// Work the runtime performs on behalf of the session
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ArmSuggestTimer(TimerTicket),
    CancelSuggestTimer,
    Fetch(Fetch),
}

/// A backend request whose completion re-enters the session as an [`Event`]
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    Suggestions { seq: u64, query: String },
    Search { query: String, started: Instant },
    Document { doc_id: String },
}

impl Fetch {
    pub async fn run<B: Backend>(self, backend: &B) -> Event {
        match self {
            Fetch::Suggestions { seq, query } => {
                let result = backend.suggest(&query).await;
                Event::SuggestionsLoaded { seq, query, result }
            }
            Fetch::Search { query, started } => {
                let result = backend.search(&query).await;
                Event::SearchCompleted {
                    query,
                    started,
                    finished: Instant::now(),
                    result,
                }
            }
            Fetch::Document { doc_id } => {
                let result = backend.document(&doc_id).await;
                Event::DocumentLoaded { doc_id, result }
            }
        }
    }
}

/// Serializable view of the whole session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub query: String,
    pub suggestions: Vec<String>,
    pub suggestions_visible: bool,
    pub active_index: i64,
    pub active_suggestion: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub results: Vec<ResultItem>,
    pub fetch_elapsed_seconds: Option<String>,
    pub doc_loading: bool,
    pub document: Option<DocumentDetail>,
    pub modal_open: bool,
}

#[derive(Debug, Default)]
pub struct Session {
    settings: SessionSettings,
    query: String,
    layout: Layout,
    suggest: SuggestState,
    search: SearchState,
    document: DocumentState,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn suggestions(&self) -> &SuggestState {
        &self.suggest
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    /// Apply one event; `now` stamps the start of any search it submits.
    pub fn handle(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        debug!(?event, "session event");
        match event {
            Event::QueryChanged(text) => {
                if text == self.query {
                    return Vec::new();
                }
                self.query = text;
                vec![self.query_changed()]
            }
            Event::Focus => {
                if self.query.chars().count() >= self.settings.min_query_len {
                    self.suggest.show();
                }
                Vec::new()
            }
            Event::Key(key) => self.key(key),
            Event::SuggestionClicked(index) => {
                if !self.suggest.is_visible() {
                    return Vec::new();
                }
                match self.suggest.list().get(index).cloned() {
                    Some(suggestion) => self.accept(suggestion),
                    None => Vec::new(),
                }
            }
            Event::PointerPressed(point) => {
                if self.suggest.is_visible() && self.layout.is_outside(point, true) {
                    debug!(x = point.x, y = point.y, "press outside, hiding suggestions");
                    self.suggest.hide();
                }
                Vec::new()
            }
            Event::Layout(layout) => {
                self.layout = layout;
                Vec::new()
            }
            Event::Submit => self.submit(now),
            Event::ResultSelected(doc_id) => {
                self.document.begin();
                vec![Effect::Fetch(Fetch::Document { doc_id })]
            }
            Event::ModalClicked(target) => {
                self.document.click(target);
                Vec::new()
            }
            Event::TimerFired { generation } => match self.suggest.timer_fired(generation) {
                Some(seq) => vec![Effect::Fetch(Fetch::Suggestions {
                    seq,
                    query: self.query.clone(),
                })],
                None => Vec::new(),
            },
            Event::SuggestionsLoaded { seq, query, result } => {
                self.suggest
                    .loaded(seq, &query, result, self.settings.stale_policy);
                Vec::new()
            }
            Event::SearchCompleted {
                query,
                started,
                finished,
                result,
            } => {
                let elapsed = finished.saturating_duration_since(started);
                self.search.finish(&query, elapsed, result);
                Vec::new()
            }
            Event::DocumentLoaded { doc_id, result } => {
                self.document.finish(&doc_id, result);
                Vec::new()
            }
        }
    }

    fn query_changed(&mut self) -> Effect {
        self.suggest.query_changed(
            &self.query,
            self.settings.min_query_len,
            self.settings.debounce,
        )
    }

    fn key(&mut self, key: Key) -> Vec<Effect> {
        if key == Key::Escape {
            if self.document.is_open() {
                self.document.close();
            } else {
                self.suggest.hide();
            }
            return Vec::new();
        }
        if !self.suggest.is_visible() {
            return Vec::new();
        }

        let len = self.suggest.list().len();
        match key {
            Key::ArrowDown => self.suggest.cursor_mut().down(len),
            Key::ArrowUp => self.suggest.cursor_mut().up(len),
            Key::Enter => {
                if let Some(suggestion) = self.suggest.active().map(str::to_owned) {
                    return self.accept(suggestion);
                }
            }
            Key::Escape => {}
        }
        Vec::new()
    }

    fn accept(&mut self, suggestion: String) -> Vec<Effect> {
        debug!(%suggestion, "suggestion accepted");
        self.suggest.accept(&suggestion);
        self.query = suggestion;
        vec![self.query_changed()]
    }

    fn submit(&mut self, now: Instant) -> Vec<Effect> {
        if self.query.trim().is_empty() {
            return Vec::new();
        }
        self.suggest.hide();
        self.search.begin();
        vec![Effect::Fetch(Fetch::Search {
            query: self.query.clone(),
            started: now,
        })]
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            query: self.query.clone(),
            suggestions: self.suggest.list().to_vec(),
            suggestions_visible: self.suggest.is_visible(),
            active_index: self.suggest.cursor().index(),
            active_suggestion: self.suggest.active().map(str::to_owned),
            loading: self.search.is_loading(),
            error: self.search.error().map(str::to_owned),
            results: self.search.results().to_vec(),
            fetch_elapsed_seconds: self.search.elapsed_display(),
            doc_loading: self.document.is_loading(),
            document: self.document.detail().cloned(),
            modal_open: self.document.is_open(),
        }
    }
}
