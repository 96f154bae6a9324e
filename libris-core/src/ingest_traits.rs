//! Traits at the seams of the ingestion pipeline
//!
//! The pipeline only talks to its collaborators through these traits: the reference library it
//! paginates, the engine that embeds documents and answers questions, pdf and token utilities,
//! checkpoint storage and progress reporting. Bring your own implementation by implementing the
//! trait.
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::corpus::{EmbeddedCorpus, EmbeddedDocument};
use crate::errors::{CheckpointError, EmbedError};
use crate::list_query::ListQuery;
use crate::record::CatalogRecord;

/// All traits are easily mockable under tests
#[cfg(feature = "test-utils")]
#[doc(hidden)]
use mockall::automock;

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// A remote, page limited reference library
pub trait ReferenceLibrary: Send + Sync + Debug {
    /// Lists at most `limit` top level items starting at offset `start`
    async fn list_top_items(
        &self,
        query: &ListQuery,
        limit: usize,
        start: usize,
    ) -> Result<Vec<CatalogRecord>>;

    /// Total number of top level items in the library
    async fn count_items(&self) -> Result<usize>;

    /// Resolves a local path to the pdf of a record, fetching it if needed
    ///
    /// `Ok(None)` when the record has no pdf.
    async fn resolve_pdf(&self, record: &CatalogRecord) -> Result<Option<PathBuf>>;

    fn name(&self) -> &'static str {
        let name = std::any::type_name::<Self>();
        name.split("::").last().unwrap_or(name)
    }
}

/// What to embed and under which name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    pub path: PathBuf,
    /// Document name in the corpus
    pub name: String,
    pub citation: String,
}

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// Turns a pdf into an embedded document
pub trait DocumentEmbedder: Send + Sync + Debug {
    async fn embed_document(&self, source: DocumentSource)
    -> Result<EmbeddedDocument, EmbedError>;

    fn name(&self) -> &'static str {
        let name = std::any::type_name::<Self>();
        name.split("::").last().unwrap_or(name)
    }
}

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// Answers questions against an embedded corpus, citing the documents it used
pub trait Answerer: Send + Sync + Debug {
    async fn answer(&self, corpus: &EmbeddedCorpus, question: &str) -> Result<String>;
}

#[cfg_attr(feature = "test-utils", automock)]
/// Text and page counts of pdf files
pub trait PdfText: Send + Sync + Debug {
    fn extract_text(&self, path: &Path) -> Result<String>;

    fn page_count(&self, path: &Path) -> Result<usize>;
}

#[cfg_attr(feature = "test-utils", automock)]
/// Counts tokens as a given model would see them
pub trait TokenCounter: Send + Sync + Debug {
    fn count_tokens(&self, text: &str, model: &str) -> Result<usize>;
}

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// Durable storage of embedded corpora
pub trait CheckpointStore: Send + Sync + Debug {
    /// Loads the corpus at `location`.
    ///
    /// Returns a fresh corpus for `model` when nothing is stored there yet. A restored corpus is
    /// reconfigured with `model` and the default answer prompt.
    async fn load(&self, location: &Path, model: &str) -> Result<EmbeddedCorpus, CheckpointError>;

    /// Whether a corpus was ever saved at `location`
    async fn exists(&self, location: &Path) -> Result<bool, CheckpointError>;

    /// Overwrites whatever is stored at `location` with `corpus`
    async fn save(&self, location: &Path, corpus: &EmbeddedCorpus) -> Result<(), CheckpointError>;
}

#[cfg_attr(feature = "test-utils", automock)]
/// Receives human readable progress messages
pub trait ProgressReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Use a closure as a progress reporter
impl<F> ProgressReporter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message);
    }
}

#[async_trait]
impl<T: ReferenceLibrary + ?Sized> ReferenceLibrary for Arc<T> {
    async fn list_top_items(
        &self,
        query: &ListQuery,
        limit: usize,
        start: usize,
    ) -> Result<Vec<CatalogRecord>> {
        (**self).list_top_items(query, limit, start).await
    }

    async fn count_items(&self) -> Result<usize> {
        (**self).count_items().await
    }

    async fn resolve_pdf(&self, record: &CatalogRecord) -> Result<Option<PathBuf>> {
        (**self).resolve_pdf(record).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
