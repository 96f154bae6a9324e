//! `IngestPaper` is the unit the ingestion pipeline operates on.
//!
//! Papers are produced by the paginator for a single run and consumed exactly once by the
//! embedding driver. They are never persisted on their own; only the embedded result ends up in a
//! checkpoint.
use std::{fmt::Debug, path::PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::record::CatalogRecord;

#[derive(Clone, Serialize, Deserialize, PartialEq, Builder)]
#[builder(setter(into), build_fn(error = "anyhow::Error"))]
pub struct IngestPaper {
    /// Human readable citation key, see [`crate::citation::citation_key`]
    pub citation_key: String,
    #[builder(default)]
    pub title: String,
    /// Local path of the resolved pdf
    pub pdf: PathBuf,
    #[builder(default)]
    pub num_pages: usize,
    /// Identifier in the source library; doubles as the document name in the corpus
    pub source_key: String,
    /// The record this paper was derived from
    #[builder(default)]
    pub record: CatalogRecord,
}

impl IngestPaper {
    pub fn builder() -> IngestPaperBuilder {
        IngestPaperBuilder::default()
    }

    /// Name under which the paper is stored in an embedded corpus.
    pub fn document_name(&self) -> &str {
        &self.source_key
    }
}

impl Debug for IngestPaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPaper")
            .field("citation_key", &self.citation_key)
            .field("title", &self.title)
            .field("pdf", &self.pdf)
            .field("num_pages", &self.num_pages)
            .field("source_key", &self.source_key)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for IngestPaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {} pages)",
            self.title,
            self.citation_key,
            self.num_pages
        )
    }
}
