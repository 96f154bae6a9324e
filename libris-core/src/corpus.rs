//! The embedded corpus accumulates embedded documents between runs.
//!
//! Document names are unique and double as the de-duplication key of the pipeline: once a name
//! is present, the paper behind it is considered seen and is never embedded again.
use std::{collections::BTreeMap, fmt::Debug, path::PathBuf};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Embedding, prompt::default_answer_template};

/// Current version of the serialized corpus
pub const CORPUS_FORMAT_VERSION: u32 = 1;

/// An embedded corpus.
///
/// Carries the model identifier and the answer prompt template it is queried with, plus all
/// documents embedded so far keyed by document name.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedCorpus {
    pub format_version: u32,
    model: String,
    prompt_template: String,
    documents: BTreeMap<String, EmbeddedDocument>,
}

impl EmbeddedCorpus {
    /// Creates an empty corpus using the default answer prompt
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_prompt_template(model, default_answer_template())
    }

    pub fn with_prompt_template(
        model: impl Into<String>,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            format_version: CORPUS_FORMAT_VERSION,
            model: model.into(),
            prompt_template: prompt_template.into(),
            documents: BTreeMap::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    /// Replaces the model and prompt, keeping all embedded documents.
    ///
    /// Used when a corpus is restored from a checkpoint; the current configuration wins over
    /// whatever was stored.
    pub fn reconfigure(&mut self, model: impl Into<String>, prompt_template: impl Into<String>) {
        self.model = model.into();
        self.prompt_template = prompt_template.into();
    }

    /// Whether a document with this name has been embedded
    pub fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    /// Adds a document under its name.
    ///
    /// Returns `false` and leaves the corpus untouched when the name is already present.
    pub fn insert(&mut self, document: EmbeddedDocument) -> bool {
        if self.contains(&document.name) {
            return false;
        }

        self.documents.insert(document.name.clone(), document);
        true
    }

    pub fn get(&self, name: &str) -> Option<&EmbeddedDocument> {
        self.documents.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<EmbeddedDocument> {
        self.documents.remove(name)
    }

    pub fn document_names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn documents(&self) -> impl Iterator<Item = &EmbeddedDocument> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Debug for EmbeddedCorpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedCorpus")
            .field("model", &self.model)
            .field("documents", &self.document_names().join(","))
            .finish()
    }
}

/// A single embedded paper.
///
/// The pipeline treats this as opaque; only the engine that produced it needs to understand the
/// chunks.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedDocument {
    pub name: String,
    pub citation: String,
    pub path: PathBuf,
    /// Embedding model that produced the vectors
    pub embed_model: String,
    pub chunks: Vec<EmbeddedChunk>,
}

impl Debug for EmbeddedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedDocument")
            .field("name", &self.name)
            .field("citation", &self.citation)
            .field("path", &self.path)
            .field("embed_model", &self.embed_model)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    pub text: String,
    pub vector: Embedding,
}
