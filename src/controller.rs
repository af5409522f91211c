// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async runtime around a [`Session`]
//!
//! The controller is the only writer of its session. Timers and backend
//! requests run as spawned tasks that never touch state; they post a
//! completion [`Event`] to the controller's inbox, and the controller applies
//! it on its own turn. Dropping the controller aborts every outstanding
//! task and deregisters its pointer listener.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::debug;

use crate::backend::Backend;
use crate::session::{Effect, Event, PointerHub, PointerSubscription, Session, SessionSettings};
use crate::timer::ArmedSleep;

pub struct Controller<B: Backend> {
    session: Session,
    backend: Arc<B>,
    tx: UnboundedSender<Event>,
    inbox: UnboundedReceiver<Event>,
    debounce: ArmedSleep,
    requests: JoinSet<()>,
    /// Fetches spawned whose completion event has not been applied yet
    outstanding: usize,
    pointer: PointerSubscription,
}

impl<B: Backend> Controller<B> {
    /// Build a controller and register its pointer listener with `hub`
    pub fn mount(backend: Arc<B>, settings: SessionSettings, hub: &PointerHub) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        Self {
            session: Session::new(settings),
            backend,
            tx,
            inbox,
            debounce: ArmedSleep::new(),
            requests: JoinSet::new(),
            outstanding: 0,
            pointer: hub.subscribe(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Requests started but not yet applied
    pub fn in_flight(&self) -> usize {
        self.outstanding
    }

    /// True while a debounce or a request can still produce an event
    pub fn is_busy(&self) -> bool {
        self.session.suggestions().timer_pending() || self.outstanding > 0
    }

    /// Apply one event and start whatever work it asks for
    pub fn dispatch(&mut self, event: Event) {
        while self.requests.try_join_next().is_some() {}
        if is_completion(&event) {
            self.outstanding = self.outstanding.saturating_sub(1);
        }

        let effects = self.session.handle(event, Instant::now());
        for effect in effects {
            self.perform(effect);
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::ArmSuggestTimer(ticket) => {
                let tx = self.tx.clone();
                self.debounce.arm(ticket.delay, move || {
                    let _ = tx.send(Event::TimerFired {
                        generation: ticket.generation,
                    });
                });
            }
            Effect::CancelSuggestTimer => self.debounce.disarm(),
            Effect::Fetch(fetch) => {
                debug!(?fetch, "request started");
                let backend = Arc::clone(&self.backend);
                let tx = self.tx.clone();
                self.outstanding += 1;
                self.requests.spawn(async move {
                    let event = fetch.run(backend.as_ref()).await;
                    let _ = tx.send(event);
                });
            }
        }
    }

    /// Wait for the next timer, completion or pointer press
    pub async fn next_event(&mut self) -> Option<Event> {
        tokio::select! {
            Some(event) = self.inbox.recv() => Some(event),
            Some(point) = self.pointer.recv() => Some(Event::PointerPressed(point)),
            else => None,
        }
    }

    /// Apply every event that is already waiting, without blocking
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let event = match self.inbox.try_recv() {
                Ok(event) => event,
                Err(_) => match self.pointer.try_recv() {
                    Some(point) => Event::PointerPressed(point),
                    None => break,
                },
            };
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    /// Keep applying events until no timer or request is outstanding
    pub async fn settle(&mut self) {
        while self.is_busy() {
            match self.next_event().await {
                Some(event) => self.dispatch(event),
                None => break,
            }
        }
        self.drain();
    }
}

fn is_completion(event: &Event) -> bool {
    matches!(
        event,
        Event::SuggestionsLoaded { .. } | Event::SearchCompleted { .. } | Event::DocumentLoaded { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Document, RawResult, SearchResponse};
    use crate::errors::{BackendError, Result};
    use crate::session::{
        DocumentDetail, Key, Layout, ModalTarget, Point, Region, StalePolicy,
        DOCUMENT_ERROR_MESSAGE, SNIPPET_PLACEHOLDER, TRANSPORT_ERROR_MESSAGE,
    };
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory backend with scripted answers and per-query latency
    #[derive(Default)]
    struct ScriptedBackend {
        suggestions: HashMap<String, (u64, Vec<String>)>,
        search: Option<SearchResponse>,
        documents: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn suggest_after(mut self, query: &str, delay_ms: u64, list: &[&str]) -> Self {
            self.suggestions.insert(
                query.to_string(),
                (delay_ms, list.iter().map(|s| s.to_string()).collect()),
            );
            self
        }

        fn search_with(mut self, response: SearchResponse) -> Self {
            self.search = Some(response);
            self
        }

        fn with_document(mut self, id: &str, content: &str) -> Self {
            self.documents.insert(id.to_string(), content.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls").clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().expect("calls").push(call);
        }
    }

    impl Backend for ScriptedBackend {
        async fn suggest(&self, query: &str) -> Result<Vec<String>> {
            self.record(format!("suggest:{query}"));
            let (delay, list) = self
                .suggestions
                .get(query)
                .cloned()
                .unwrap_or((10, Vec::new()));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(list)
        }

        async fn search(&self, query: &str) -> Result<SearchResponse> {
            self.record(format!("search:{query}"));
            tokio::time::sleep(Duration::from_millis(40)).await;
            self.search.clone().ok_or(BackendError::Timeout {
                endpoint: "/search",
                timeout_ms: 40,
            })
        }

        async fn document(&self, doc_id: &str) -> Result<Document> {
            self.record(format!("document:{doc_id}"));
            tokio::time::sleep(Duration::from_millis(20)).await;
            match self.documents.get(doc_id) {
                Some(content) => Ok(Document {
                    doc_id: doc_id.to_string(),
                    content: content.clone(),
                }),
                None => Err(BackendError::Status {
                    endpoint: "/document",
                    status: 404,
                    body: String::new(),
                }),
            }
        }
    }

    fn mount(backend: ScriptedBackend) -> (Controller<ScriptedBackend>, Arc<ScriptedBackend>) {
        mount_with(backend, SessionSettings::default())
    }

    fn mount_with(
        backend: ScriptedBackend,
        settings: SessionSettings,
    ) -> (Controller<ScriptedBackend>, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let controller = Controller::mount(Arc::clone(&backend), settings, &PointerHub::new());
        (controller, backend)
    }

    async fn advance(controller: &mut Controller<ScriptedBackend>, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        controller.drain();
    }

    fn type_text(controller: &mut Controller<ScriptedBackend>, text: &str) {
        controller.dispatch(Event::QueryChanged(text.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn keystroke_burst_issues_one_fetch_with_final_value() {
        let (mut ctl, backend) = mount(ScriptedBackend::default().suggest_after(
            "cats",
            10,
            &["cats", "catsup"],
        ));

        for text in ["ca", "cat", "cats"] {
            type_text(&mut ctl, text);
            advance(&mut ctl, 100).await;
        }
        assert!(backend.calls().is_empty());

        advance(&mut ctl, 500).await;
        advance(&mut ctl, 20).await;

        assert_eq!(backend.calls(), vec!["suggest:cats"]);
        let snap = ctl.session().snapshot();
        assert_eq!(snap.suggestions, vec!["cats", "catsup"]);
        assert!(snap.suggestions_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn shortening_the_query_cancels_the_pending_fetch() {
        let (mut ctl, backend) = mount(ScriptedBackend::default());
        type_text(&mut ctl, "ca");
        advance(&mut ctl, 200).await;
        type_text(&mut ctl, "c");
        advance(&mut ctl, 1_000).await;

        assert!(backend.calls().is_empty());
        assert!(!ctl.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stale_response_is_dropped() {
        let (mut ctl, _backend) = mount(
            ScriptedBackend::default()
                .suggest_after("ca", 900, &["car"])
                .suggest_after("cat", 10, &["cat", "catalog"]),
        );

        type_text(&mut ctl, "ca");
        advance(&mut ctl, 510).await;
        type_text(&mut ctl, "cat");
        advance(&mut ctl, 510).await;
        advance(&mut ctl, 20).await;
        assert_eq!(
            ctl.session().suggestions().list(),
            ["cat".to_string(), "catalog".to_string()].as_slice()
        );

        ctl.settle().await;
        assert_eq!(
            ctl.session().suggestions().list(),
            ["cat".to_string(), "catalog".to_string()].as_slice()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn apply_policy_lets_the_stale_response_win() {
        let settings = SessionSettings {
            stale_policy: StalePolicy::Apply,
            ..SessionSettings::default()
        };
        let (mut ctl, _backend) = mount_with(
            ScriptedBackend::default()
                .suggest_after("ca", 900, &["car"])
                .suggest_after("cat", 10, &["cat", "catalog"]),
            settings,
        );

        type_text(&mut ctl, "ca");
        advance(&mut ctl, 510).await;
        type_text(&mut ctl, "cat");
        ctl.settle().await;
        assert_eq!(ctl.session().suggestions().list(), ["car".to_string()].as_slice());
    }

    #[tokio::test(start_paused = true)]
    async fn navigate_and_accept_with_keyboard() {
        let (mut ctl, backend) =
            mount(ScriptedBackend::default().suggest_after("ca", 10, &["cat", "car"]));
        type_text(&mut ctl, "ca");
        ctl.settle().await;

        ctl.dispatch(Event::Key(Key::ArrowDown));
        ctl.dispatch(Event::Key(Key::ArrowDown));
        ctl.dispatch(Event::Key(Key::ArrowDown));
        assert_eq!(ctl.session().suggestions().cursor().index(), 1);

        ctl.dispatch(Event::Key(Key::Enter));
        ctl.settle().await;

        let snap = ctl.session().snapshot();
        assert_eq!(snap.query, "car");
        assert!(snap.suggestions.is_empty());
        assert!(!snap.suggestions_visible);
        assert_eq!(backend.calls(), vec!["suggest:ca"]);
        assert!(!snap.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn search_maps_results_and_snippets() {
        let response = SearchResponse {
            results: vec![
                RawResult {
                    doc_id: "d1".into(),
                    score: 0.9,
                },
                RawResult {
                    doc_id: "d2".into(),
                    score: 0.5,
                },
            ],
            snippets: HashMap::from([("d1".to_string(), "<b>hi</b>".to_string())]),
            error: None,
        };
        let (mut ctl, backend) = mount(ScriptedBackend::default().search_with(response));
        type_text(&mut ctl, "hi");
        ctl.dispatch(Event::Submit);
        assert!(ctl.session().search().is_loading());

        advance(&mut ctl, 50).await;
        let snap = ctl.session().snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.error, None);
        assert_eq!(snap.results.len(), 2);
        assert_eq!(snap.results[0].snippet_html, "<b>hi</b>");
        assert_eq!(snap.results[1].snippet_html, SNIPPET_PLACEHOLDER);
        assert_eq!(snap.fetch_elapsed_seconds.as_deref(), Some("0.04000"));
        assert_eq!(backend.calls(), vec!["search:hi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn search_transport_failure_surfaces_generic_message() {
        let (mut ctl, _backend) = mount(ScriptedBackend::default());
        type_text(&mut ctl, "cats");
        ctl.dispatch(Event::Submit);
        ctl.settle().await;

        let snap = ctl.session().snapshot();
        assert_eq!(snap.error.as_deref(), Some(TRANSPORT_ERROR_MESSAGE));
        assert!(snap.results.is_empty());
        assert!(!snap.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_submit_never_reaches_backend() {
        let (mut ctl, backend) = mount(ScriptedBackend::default());
        type_text(&mut ctl, "   ");
        ctl.dispatch(Event::Submit);
        ctl.settle().await;
        assert!(backend.calls().iter().all(|c| !c.starts_with("search:")));
        assert_eq!(ctl.session().search().error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn document_overlay_lifecycle() {
        let (mut ctl, backend) = mount(ScriptedBackend::default().with_document("d1", "full text"));
        ctl.dispatch(Event::ResultSelected("d1".into()));
        assert!(ctl.session().document().is_loading());
        ctl.settle().await;

        let snap = ctl.session().snapshot();
        assert!(snap.modal_open);
        assert!(!snap.doc_loading);
        assert_eq!(
            snap.document,
            Some(DocumentDetail::Loaded {
                id: "d1".into(),
                content: "full text".into(),
            })
        );

        ctl.dispatch(Event::ModalClicked(ModalTarget::Content));
        assert!(ctl.session().document().is_open());
        ctl.dispatch(Event::ModalClicked(ModalTarget::Background));
        assert!(!ctl.session().document().is_open());

        ctl.dispatch(Event::ResultSelected("nope".into()));
        ctl.settle().await;
        let snap = ctl.session().snapshot();
        assert!(snap.modal_open);
        assert_eq!(
            snap.document,
            Some(DocumentDetail::Failed {
                error: DOCUMENT_ERROR_MESSAGE.into(),
            })
        );
        assert_eq!(backend.calls(), vec!["document:d1", "document:nope"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pointer_presses_reach_the_mounted_controller_once() {
        let hub = PointerHub::new();
        let backend = Arc::new(ScriptedBackend::default().suggest_after("ca", 10, &["cat"]));
        let mut ctl = Controller::mount(Arc::clone(&backend), SessionSettings::default(), &hub);
        assert_eq!(hub.listener_count(), 1);

        ctl.dispatch(Event::Layout(Layout {
            input: Some(Region::new(0.0, 0.0, 100.0, 20.0)),
            panel: Some(Region::new(0.0, 20.0, 100.0, 60.0)),
        }));
        type_text(&mut ctl, "ca");
        ctl.settle().await;
        assert!(ctl.session().suggestions().is_visible());

        assert_eq!(hub.press(Point::new(10.0, 30.0)), 1);
        ctl.drain();
        assert!(ctl.session().suggestions().is_visible());

        hub.press(Point::new(400.0, 400.0));
        ctl.drain();
        assert!(!ctl.session().suggestions().is_visible());

        drop(ctl);
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_aborts_outstanding_requests() {
        let backend = Arc::new(ScriptedBackend::default().suggest_after("ca", 5_000, &["cat"]));
        let mut ctl =
            Controller::mount(Arc::clone(&backend), SessionSettings::default(), &PointerHub::new());
        type_text(&mut ctl, "ca");
        advance(&mut ctl, 600).await;
        assert_eq!(ctl.in_flight(), 1);

        drop(ctl);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(Arc::strong_count(&backend), 1);
    }
}
