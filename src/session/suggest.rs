// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suggestion engine: when to fetch, what to show.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::navigator::Cursor;
use super::Effect;
use crate::errors::BackendError;
use crate::timer::Debounce;

/// What to do with a suggestion response that is no longer the newest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Drop responses overtaken by a newer fetch or a clear
    #[default]
    Discard,
    /// Apply every response in arrival order; an old one can clobber a newer list
    Apply,
}

/// Suggestion list, panel visibility and the keyboard cursor
#[derive(Debug, Default)]
pub struct SuggestState {
    list: Vec<String>,
    shown: bool,
    last_accepted: String,
    cursor: Cursor,
    timer: Debounce<()>,
    latest_seq: u64,
}

impl SuggestState {
    pub fn list(&self) -> &[String] {
        &self.list
    }

    /// The panel is on screen only with something in it
    pub fn is_visible(&self) -> bool {
        self.shown && !self.list.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn active(&self) -> Option<&str> {
        self.cursor.pick(&self.list)
    }

    pub fn last_accepted(&self) -> &str {
        &self.last_accepted
    }

    pub fn timer_pending(&self) -> bool {
        self.timer.is_pending()
    }

    fn wants_fetch(&self, query: &str, min_len: usize) -> bool {
        query.chars().count() >= min_len && query != self.last_accepted
    }

    /// React to a new query: arm the debounce or clear immediately
    pub(crate) fn query_changed(&mut self, query: &str, min_len: usize, delay: Duration) -> Effect {
        if self.wants_fetch(query, min_len) {
            Effect::ArmSuggestTimer(self.timer.schedule(delay, ()))
        } else {
            self.clear();
            self.timer.cancel();
            Effect::CancelSuggestTimer
        }
    }

    /// Debounce elapsed; returns the sequence number for the fetch to issue
    pub(crate) fn timer_fired(&mut self, generation: u64) -> Option<u64> {
        self.timer.fire(generation)?;
        self.latest_seq += 1;
        Some(self.latest_seq)
    }

    pub(crate) fn loaded(
        &mut self,
        seq: u64,
        query: &str,
        result: Result<Vec<String>, BackendError>,
        policy: StalePolicy,
    ) {
        if policy == StalePolicy::Discard && seq != self.latest_seq {
            debug!(seq, latest = self.latest_seq, query, "dropping stale suggestions");
            return;
        }
        match result {
            Ok(list) => {
                debug!(query, count = list.len(), "suggestions loaded");
                self.list = list;
                self.shown = true;
            }
            Err(err) => warn!(query, error = %err, "Error fetching suggestions"),
        }
    }

    pub(crate) fn accept(&mut self, suggestion: &str) {
        self.last_accepted = suggestion.to_string();
        self.clear();
    }

    pub(crate) fn show(&mut self) {
        self.shown = true;
    }

    pub(crate) fn hide(&mut self) {
        self.shown = false;
    }

    pub(crate) fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    fn clear(&mut self) {
        self.list.clear();
        self.shown = false;
        // anything still in flight is now older than the cleared state
        self.latest_seq += 1;
    }
}
