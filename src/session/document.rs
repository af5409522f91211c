// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document viewer and its overlay.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::Document;
use crate::errors::BackendError;

/// Overlay body shown when a document cannot be fetched
pub const DOCUMENT_ERROR_MESSAGE: &str = "Error loading document";

/// What the overlay shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocumentDetail {
    Loaded { id: String, content: String },
    Failed { error: String },
}

/// Clickable parts of the overlay, innermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalTarget {
    CloseButton,
    Content,
    Background,
}

impl ModalTarget {
    /// Elements a click on `self` bubbles through, target first
    fn bubble_path(self) -> &'static [ModalTarget] {
        match self {
            ModalTarget::CloseButton => &[
                ModalTarget::CloseButton,
                ModalTarget::Content,
                ModalTarget::Background,
            ],
            ModalTarget::Content => &[ModalTarget::Content, ModalTarget::Background],
            ModalTarget::Background => &[ModalTarget::Background],
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentState {
    detail: Option<DocumentDetail>,
    loading: bool,
    open: bool,
}

impl DocumentState {
    pub fn detail(&self) -> Option<&DocumentDetail> {
        self.detail.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Overlay is drawn only with something to show
    pub fn is_open(&self) -> bool {
        self.open && self.detail.is_some()
    }

    pub(crate) fn begin(&mut self) {
        self.loading = true;
    }

    pub(crate) fn finish(&mut self, doc_id: &str, result: Result<Document, BackendError>) {
        self.detail = Some(match result {
            Ok(doc) => {
                debug!(doc_id, bytes = doc.content.len(), "document loaded");
                DocumentDetail::Loaded {
                    id: doc.doc_id,
                    content: doc.content,
                }
            }
            Err(err) => {
                warn!(doc_id, error = %err, "Error fetching document");
                DocumentDetail::Failed {
                    error: DOCUMENT_ERROR_MESSAGE.to_string(),
                }
            }
        });
        self.open = true;
        self.loading = false;
    }

    /// Dispatch a click along its bubble path; the content area stops it.
    pub(crate) fn click(&mut self, target: ModalTarget) {
        if !self.is_open() {
            return;
        }
        for node in target.bubble_path() {
            match node {
                ModalTarget::CloseButton | ModalTarget::Background => self.open = false,
                ModalTarget::Content => break,
            }
        }
    }

    pub(crate) fn close(&mut self) {
        self.open = false;
    }
}
