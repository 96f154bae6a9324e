//! Top level entry point tying the pipeline together
use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use derive_builder::Builder;

use libris_core::{
    Answerer, CheckpointError, CheckpointStore, DocumentEmbedder, EmbeddedCorpus, IngestError,
    ListQuery, PdfText, ProgressReporter, ReferenceLibrary, TokenCounter,
    checkpoint::checkpoint_location,
};

use crate::{
    checkpoint::FileCheckpointStore,
    driver::{DEFAULT_BACKOFF, EmbeddingDriver, IngestReport, default_query},
    reporters::TracingReporter,
};

/// Opens the corpus for a model, embeds papers into it and answers questions against it.
///
/// The checkpoint location is derived from the model and the data directory, see
/// [`checkpoint_location`].
#[derive(Builder, Clone)]
#[builder(build_fn(error = "anyhow::Error"))]
pub struct PipelineController {
    #[builder(setter(custom))]
    library: Arc<dyn ReferenceLibrary>,
    #[builder(setter(custom))]
    embedder: Arc<dyn DocumentEmbedder>,
    #[builder(setter(custom))]
    answerer: Arc<dyn Answerer>,
    #[builder(setter(custom))]
    pdf_text: Arc<dyn PdfText>,
    #[builder(setter(custom))]
    token_counter: Arc<dyn TokenCounter>,
    #[builder(setter(custom), default = "Arc::new(FileCheckpointStore::new())")]
    checkpoints: Arc<dyn CheckpointStore>,
    #[builder(setter(custom), default = "Arc::new(TracingReporter)")]
    reporter: Arc<dyn ProgressReporter>,
    /// Model used for answering, also names the checkpoint
    #[builder(setter(into))]
    model: String,
    #[builder(setter(into))]
    data_dir: PathBuf,
    #[builder(default = "DEFAULT_BACKOFF")]
    backoff: Duration,
    #[builder(default = "default_query()")]
    query: ListQuery,
}

impl std::fmt::Debug for PipelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineController")
            .field("library", &self.library.name())
            .field("embedder", &self.embedder.name())
            .field("model", &self.model)
            .field("data_dir", &self.data_dir)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl PipelineControllerBuilder {
    pub fn library(&mut self, library: impl ReferenceLibrary + 'static) -> &mut Self {
        self.library = Some(Arc::new(library));
        self
    }

    pub fn embedder(&mut self, embedder: impl DocumentEmbedder + 'static) -> &mut Self {
        self.embedder = Some(Arc::new(embedder));
        self
    }

    pub fn answerer(&mut self, answerer: impl Answerer + 'static) -> &mut Self {
        self.answerer = Some(Arc::new(answerer));
        self
    }

    /// Use one engine for both embedding and answering
    pub fn engine<E>(&mut self, engine: E) -> &mut Self
    where
        E: DocumentEmbedder + Answerer + 'static,
    {
        let engine = Arc::new(engine);
        self.embedder = Some(Arc::clone(&engine) as Arc<dyn DocumentEmbedder>);
        self.answerer = Some(engine as Arc<dyn Answerer>);
        self
    }

    pub fn pdf_text(&mut self, pdf_text: impl PdfText + 'static) -> &mut Self {
        self.pdf_text = Some(Arc::new(pdf_text));
        self
    }

    pub fn token_counter(&mut self, token_counter: impl TokenCounter + 'static) -> &mut Self {
        self.token_counter = Some(Arc::new(token_counter));
        self
    }

    pub fn checkpoints(&mut self, checkpoints: impl CheckpointStore + 'static) -> &mut Self {
        self.checkpoints = Some(Arc::new(checkpoints));
        self
    }

    pub fn reporter(&mut self, reporter: impl ProgressReporter + 'static) -> &mut Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }
}

impl PipelineController {
    pub fn builder() -> PipelineControllerBuilder {
        PipelineControllerBuilder::default()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Where the corpus of the configured model is checkpointed
    pub fn checkpoint_location(&self) -> PathBuf {
        checkpoint_location(&self.data_dir, &self.model)
    }

    /// Number of top level items in the library
    ///
    /// # Errors
    ///
    /// Errors if the library cannot be reached
    pub async fn library_size(&self) -> Result<usize> {
        self.library.count_items().await
    }

    /// Loads the corpus from its checkpoint, or starts a fresh one
    ///
    /// # Errors
    ///
    /// Errors if a checkpoint exists but cannot be read
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    pub async fn open(&self) -> Result<EmbeddedCorpus, CheckpointError> {
        let location = self.checkpoint_location();
        let restored = self.checkpoints.exists(&location).await?;
        let corpus = self.checkpoints.load(&location, &self.model).await?;

        if restored {
            self.reporter.report(&format!(
                "Loaded previously saved corpus state with {} documents",
                corpus.len()
            ));
        } else {
            self.reporter
                .report("No previously saved corpus state found. Starting fresh");
        }

        Ok(corpus)
    }

    /// Embeds up to `count` papers starting at `start` into the corpus.
    ///
    /// # Errors
    ///
    /// Errors without touching the corpus when `start` lies beyond the library size
    pub async fn embed(
        &self,
        corpus: &mut EmbeddedCorpus,
        count: usize,
        start: usize,
    ) -> Result<IngestReport, IngestError> {
        self.driver()?.ingest(corpus, count, start).await
    }

    /// Answers a question against the corpus
    ///
    /// # Errors
    ///
    /// Errors if the answering engine fails
    #[tracing::instrument(skip_all)]
    pub async fn ask(&self, corpus: &EmbeddedCorpus, question: &str) -> Result<String> {
        self.answerer.answer(corpus, question).await
    }

    fn driver(&self) -> Result<EmbeddingDriver, IngestError> {
        EmbeddingDriver::builder()
            .library_arc(Arc::clone(&self.library))
            .embedder_arc(Arc::clone(&self.embedder))
            .pdf_text_arc(Arc::clone(&self.pdf_text))
            .token_counter_arc(Arc::clone(&self.token_counter))
            .checkpoints_arc(Arc::clone(&self.checkpoints))
            .reporter_arc(Arc::clone(&self.reporter))
            .checkpoint_location(self.checkpoint_location())
            .backoff(self.backoff)
            .query(self.query.clone())
            .build()
            .map_err(IngestError::InvalidQuery)
    }
}
