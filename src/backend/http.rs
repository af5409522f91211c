// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of [`Backend`] on top of reqwest.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::{
    Backend, Document, DocumentResponse, SearchResponse, SuggestResponse, DOCUMENT_ENDPOINT,
    SEARCH_ENDPOINT, SUGGEST_ENDPOINT,
};
use crate::errors::{BackendError, Result};

/// Backend reached over plain HTTP GET requests
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Create a client for the given origin
    ///
    /// Without a timeout a hung request stays pending.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|_| BackendError::InvalidUrl(base_url.to_string()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| BackendError::Transport {
            endpoint: "client",
            source,
        })?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, ?params, "GET");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|source| self.transport_error(endpoint, source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| self.transport_error(endpoint, source))?;
        Ok((status, body))
    }

    fn transport_error(&self, endpoint: &'static str, source: reqwest::Error) -> BackendError {
        match self.timeout {
            Some(timeout) if source.is_timeout() => BackendError::Timeout {
                endpoint,
                timeout_ms: timeout.as_millis() as u64,
            },
            _ => BackendError::Transport { endpoint, source },
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(endpoint: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| BackendError::Decode { endpoint, source })
}

fn status_error(endpoint: &'static str, status: StatusCode, body: String) -> BackendError {
    BackendError::Status {
        endpoint,
        status: status.as_u16(),
        body,
    }
}

impl Backend for HttpBackend {
    async fn suggest(&self, query: &str) -> Result<Vec<String>> {
        let (status, body) = self.get(SUGGEST_ENDPOINT, &[("query", query)]).await?;
        if !status.is_success() {
            return Err(status_error(SUGGEST_ENDPOINT, status, body));
        }
        let parsed: SuggestResponse = decode(SUGGEST_ENDPOINT, &body)?;
        Ok(parsed.suggestions)
    }

    async fn search(&self, query: &str) -> Result<SearchResponse> {
        let (status, body) = self.get(SEARCH_ENDPOINT, &[("query", query)]).await?;
        if status.is_success() {
            return decode(SEARCH_ENDPOINT, &body);
        }

        // A 4xx that still explains itself is a refused query, not an outage.
        match serde_json::from_str::<SearchResponse>(&body) {
            Ok(parsed) if parsed.error.is_some() => Ok(parsed),
            _ => Err(status_error(SEARCH_ENDPOINT, status, body)),
        }
    }

    async fn document(&self, doc_id: &str) -> Result<Document> {
        let (status, body) = self.get(DOCUMENT_ENDPOINT, &[("doc_id", doc_id)]).await?;
        if !status.is_success() {
            return Err(status_error(DOCUMENT_ENDPOINT, status, body));
        }

        let parsed: DocumentResponse = decode(DOCUMENT_ENDPOINT, &body)?;
        if let Some(message) = parsed.error {
            return Err(BackendError::Rejected {
                endpoint: DOCUMENT_ENDPOINT,
                message,
            });
        }
        let content = parsed.content.ok_or_else(|| BackendError::Rejected {
            endpoint: DOCUMENT_ENDPOINT,
            message: "response has no content".to_string(),
        })?;

        Ok(Document {
            doc_id: parsed.doc_id.unwrap_or_else(|| doc_id.to_string()),
            content,
        })
    }
}
