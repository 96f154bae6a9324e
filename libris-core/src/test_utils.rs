#![allow(clippy::missing_panics_doc)]
//! In-memory collaborators for exercising the pipeline without any network or disk access
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::corpus::{EmbeddedChunk, EmbeddedDocument};
use crate::errors::EmbedError;
use crate::ingest_traits::{
    DocumentEmbedder, DocumentSource, PdfText, ProgressReporter, ReferenceLibrary, TokenCounter,
};
use crate::list_query::ListQuery;
use crate::record::{Attachment, CatalogRecord, Creator};

/// A record with a pdf attachment, a title, a creator and a date
pub fn numbered_record(index: usize) -> CatalogRecord {
    CatalogRecord::builder()
        .key(format!("KEY{index:05}"))
        .title(format!("Paper number {index}"))
        .creators(vec![Creator::new("Doe", "Jane")])
        .date("2021")
        .attachments(vec![Attachment::pdf(format!("PDF{index:05}"))])
        .build()
        .expect("valid record")
}

/// A single `list_top_items` call as received by [`FakeLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListCall {
    pub limit: usize,
    pub start: usize,
}

/// Reference library backed by a vector of records.
///
/// Every record with a pdf attachment resolves to `/pdfs/{key}.pdf` unless overridden.
#[derive(Debug, Clone, Default)]
pub struct FakeLibrary {
    records: Vec<CatalogRecord>,
    pdf_overrides: HashMap<String, Option<PathBuf>>,
    reported_total: Option<usize>,
    failing_starts: HashSet<usize>,
    failing_count: bool,
    list_calls: Arc<Mutex<Vec<ListCall>>>,
    resolved: Arc<Mutex<Vec<String>>>,
}

impl FakeLibrary {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// A library with `count` records built by [`numbered_record`]
    pub fn numbered(count: usize) -> Self {
        Self::new((0..count).map(numbered_record).collect())
    }

    /// Resolve the record with `key` to `path` instead of the default location
    #[must_use]
    pub fn with_pdf(mut self, key: impl Into<String>, path: Option<PathBuf>) -> Self {
        self.pdf_overrides.insert(key.into(), path);
        self
    }

    /// Report a different library size than the number of records
    #[must_use]
    pub fn with_reported_total(mut self, total: usize) -> Self {
        self.reported_total = Some(total);
        self
    }

    /// Fail listings that start at `start`
    #[must_use]
    pub fn failing_listing_at(mut self, start: usize) -> Self {
        self.failing_starts.insert(start);
        self
    }

    #[must_use]
    pub fn failing_count(mut self) -> Self {
        self.failing_count = true;
        self
    }

    pub fn list_calls(&self) -> Vec<ListCall> {
        self.list_calls.lock().unwrap().clone()
    }

    /// Keys of the records a pdf was resolved for, in order
    pub fn resolved_keys(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReferenceLibrary for FakeLibrary {
    async fn list_top_items(
        &self,
        _query: &ListQuery,
        limit: usize,
        start: usize,
    ) -> Result<Vec<CatalogRecord>> {
        self.list_calls
            .lock()
            .unwrap()
            .push(ListCall { limit, start });

        if self.failing_starts.contains(&start) {
            anyhow::bail!("Listing failed at offset {start}");
        }

        Ok(self
            .records
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_items(&self) -> Result<usize> {
        if self.failing_count {
            anyhow::bail!("Could not count items");
        }
        Ok(self.reported_total.unwrap_or(self.records.len()))
    }

    async fn resolve_pdf(&self, record: &CatalogRecord) -> Result<Option<PathBuf>> {
        self.resolved.lock().unwrap().push(record.key.clone());

        if let Some(path) = self.pdf_overrides.get(&record.key) {
            return Ok(path.clone());
        }

        Ok(record
            .pdf_attachment()
            .map(|_| PathBuf::from(format!("/pdfs/{}.pdf", record.key))))
    }
}

/// Failures a [`ScriptedEmbedder`] can be told to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    RateLimited,
    Provider,
    Unclassified,
}

impl ScriptedFailure {
    fn into_error(self, name: &str) -> EmbedError {
        match self {
            ScriptedFailure::RateLimited => {
                EmbedError::rate_limited(format!("rate limited on {name}"))
            }
            ScriptedFailure::Provider => EmbedError::provider(format!("provider failed on {name}")),
            ScriptedFailure::Unclassified => {
                EmbedError::unclassified(format!("unexpected failure on {name}"))
            }
        }
    }
}

/// Embedder that succeeds unless told otherwise.
///
/// Failures are queued per document name and consumed one call at a time, so a document can fail
/// on the first run and succeed on the next.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEmbedder {
    failures: Arc<Mutex<HashMap<String, VecDeque<ScriptedFailure>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next embedding of `name`
    pub fn fail_next(&self, name: impl Into<String>, failure: ScriptedFailure) {
        self.failures
            .lock()
            .unwrap()
            .entry(name.into())
            .or_default()
            .push_back(failure);
    }

    /// Document names embedding was attempted for, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentEmbedder for ScriptedEmbedder {
    async fn embed_document(
        &self,
        source: DocumentSource,
    ) -> Result<EmbeddedDocument, EmbedError> {
        self.calls.lock().unwrap().push(source.name.clone());

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(&source.name)
            .and_then(VecDeque::pop_front);

        if let Some(failure) = failure {
            return Err(failure.into_error(&source.name));
        }

        Ok(EmbeddedDocument {
            chunks: vec![EmbeddedChunk {
                text: format!("Text of {}", source.name),
                vector: vec![1.0, 0.0],
            }],
            name: source.name,
            citation: source.citation,
            path: source.path,
            embed_model: "scripted".to_string(),
        })
    }
}

/// Collects every reported message
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressReporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Pretends every pdf has the same number of pages and a short text
#[derive(Debug, Clone)]
pub struct FixedPagesPdf {
    pub pages: usize,
}

impl Default for FixedPagesPdf {
    fn default() -> Self {
        Self { pages: 10 }
    }
}

impl PdfText for FixedPagesPdf {
    fn extract_text(&self, path: &Path) -> Result<String> {
        Ok(format!("The full text of {}", path.display()))
    }

    fn page_count(&self, _path: &Path) -> Result<usize> {
        Ok(self.pages)
    }
}

/// Counts whitespace separated words
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count_tokens(&self, text: &str, _model: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }
}
