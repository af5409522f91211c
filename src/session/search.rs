// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search executor: one query in, a scored result set or an error out.

use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::backend::SearchResponse;
use crate::errors::BackendError;

/// Shown for results the backend sent no snippet for
pub const SNIPPET_PLACEHOLDER: &str = "Snippet not available";

/// Shown for any search that failed before a response arrived
pub const TRANSPORT_ERROR_MESSAGE: &str = "Error fetching results.";

/// One row of the result list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultItem {
    pub id: String,
    pub score: f64,
    pub snippet_html: String,
}

/// Result list, error line, loading flag and timing
#[derive(Debug, Default)]
pub struct SearchState {
    results: Vec<ResultItem>,
    error: Option<String>,
    loading: bool,
    elapsed: Option<Duration>,
}

impl SearchState {
    pub fn results(&self) -> &[ResultItem] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Round-trip time in seconds with five decimals, e.g. `0.04213`
    pub fn elapsed_display(&self) -> Option<String> {
        self.elapsed.map(format_elapsed)
    }

    pub(crate) fn begin(&mut self) {
        self.error = None;
        self.results.clear();
        self.elapsed = None;
        self.loading = true;
    }

    pub(crate) fn finish(
        &mut self,
        query: &str,
        elapsed: Duration,
        result: Result<SearchResponse, BackendError>,
    ) {
        match result {
            Ok(SearchResponse {
                error: Some(message),
                ..
            }) => {
                self.elapsed = Some(elapsed);
                info!(query, %message, "search refused");
                self.error = Some(message);
                self.results.clear();
            }
            Ok(response) => {
                self.elapsed = Some(elapsed);
                self.results = map_results(response);
                info!(
                    query,
                    hits = self.results.len(),
                    secs = %format_elapsed(elapsed),
                    "search finished"
                );
            }
            Err(err) => {
                warn!(query, error = %err, "search failed");
                self.error = Some(TRANSPORT_ERROR_MESSAGE.to_string());
                self.results.clear();
            }
        }
        self.loading = false;
    }
}

/// Pair every raw hit with its snippet, keeping backend order
pub fn map_results(response: SearchResponse) -> Vec<ResultItem> {
    let SearchResponse {
        results, snippets, ..
    } = response;

    results
        .into_iter()
        .map(|raw| {
            let snippet_html = snippets
                .get(&raw.doc_id)
                .cloned()
                .unwrap_or_else(|| SNIPPET_PLACEHOLDER.to_string());
            ResultItem {
                id: raw.doc_id,
                score: raw.score,
                snippet_html,
            }
        })
        .collect()
}

pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.5}", elapsed.as_secs_f64())
}
