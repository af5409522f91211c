// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend contract: the three GET endpoints the controller talks to.
//!
//! `/suggest`, `/search` and `/document` are the only suspension points of
//! the controller. Everything behind them (ranking, tokenization, storage)
//! belongs to the backend service.

pub mod http;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::future::Future;

use crate::errors::Result;

pub use http::HttpBackend;

pub const SUGGEST_ENDPOINT: &str = "/suggest";
pub const SEARCH_ENDPOINT: &str = "/search";
pub const DOCUMENT_ENDPOINT: &str = "/document";

/// Default backend origin
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Body of a `/suggest` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
}

/// One raw hit from `/search`
///
/// Older backends send bare document ids; those decode with a zero score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawResultWire")]
pub struct RawResult {
    pub doc_id: String,
    pub score: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResultWire {
    Scored {
        doc_id: String,
        #[serde(default)]
        score: f64,
    },
    Bare(String),
}

impl From<RawResultWire> for RawResult {
    fn from(wire: RawResultWire) -> Self {
        match wire {
            RawResultWire::Scored { doc_id, score } => Self { doc_id, score },
            RawResultWire::Bare(doc_id) => Self { doc_id, score: 0.0 },
        }
    }
}

/// Body of a `/search` response
///
/// `error` set means the backend understood the request but refused the
/// query; `results` and `snippets` are then ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<RawResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub snippets: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    /// Domain-level refusal carried by an otherwise well-formed response
    pub fn domain_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Body of a `/document` response, either shape
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentResponse {
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A fully fetched document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub doc_id: String,
    pub content: String,
}

/// The search service as seen by the controller
///
/// Implementations must be cheap to share: the controller wraps them in an
/// `Arc` and calls them from spawned tasks.
pub trait Backend: Send + Sync + 'static {
    fn suggest(&self, query: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn search(&self, query: &str) -> impl Future<Output = Result<SearchResponse>> + Send;

    fn document(&self, doc_id: &str) -> impl Future<Output = Result<Document>> + Send;
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_null_suggestions_decode_as_empty() {
        let absent: SuggestResponse = serde_json::from_str("{}").expect("decode");
        assert!(absent.suggestions.is_empty());

        let null: SuggestResponse =
            serde_json::from_str(r#"{"suggestions": null}"#).expect("decode");
        assert!(null.suggestions.is_empty());
    }

    #[test]
    fn search_response_keeps_result_order_and_snippets() {
        let body = r#"{
            "results": [{"doc_id": "d2", "score": 0.5}, {"doc_id": "d1", "score": 0.9}],
            "snippets": {"d1": "<b>hi</b>"}
        }"#;
        let resp: SearchResponse = serde_json::from_str(body).expect("decode");
        let ids: Vec<&str> = resp.results.iter().map(|r| r.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["d2", "d1"]);
        assert_eq!(resp.snippets.get("d1").map(String::as_str), Some("<b>hi</b>"));
        assert!(resp.error.is_none());
    }

    #[test]
    fn bare_document_ids_decode_with_zero_score() {
        let resp: SearchResponse =
            serde_json::from_str(r#"{"results": ["12", "40"], "snippets": {}}"#).expect("decode");
        assert_eq!(
            resp.results,
            vec![
                RawResult { doc_id: "12".into(), score: 0.0 },
                RawResult { doc_id: "40".into(), score: 0.0 },
            ]
        );
    }

    #[test]
    fn error_only_search_body_is_a_domain_error() {
        let resp: SearchResponse =
            serde_json::from_str(r#"{"error": "bad syntax"}"#).expect("decode");
        assert_eq!(resp, SearchResponse::domain_error("bad syntax"));
    }

    #[test]
    fn document_response_accepts_error_shape() {
        let resp: DocumentResponse =
            serde_json::from_str(r#"{"error": "Document not found"}"#).expect("decode");
        assert_eq!(resp.error.as_deref(), Some("Document not found"));
        assert!(resp.content.is_none());
    }
}
