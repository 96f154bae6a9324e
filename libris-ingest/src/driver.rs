//! The embedding driver runs the per paper loop of an ingestion run.
//!
//! For every paper the paginator yields, in order:
//!
//! 1. Papers already in the corpus are skipped.
//! 2. The input token count is estimated and reported. A failed estimate is reported and does
//!    not hold up the paper.
//! 3. The paper is embedded.
//! 4. On success the document is inserted and the whole corpus is saved to the checkpoint
//!    location right away.
//!
//! A rate limited paper pauses the run for the configured backoff and is left for a future run.
//! Provider errors, unexpected errors and failed checkpoint saves end the run, keeping
//! everything embedded so far.
use std::{path::PathBuf, sync::Arc, time::Duration};

use derive_builder::Builder;
use futures_util::StreamExt as _;

use libris_core::{
    CheckpointStore, DocumentEmbedder, DocumentSource, EmbedError, EmbeddedCorpus, IngestError,
    IngestPaper, ListQuery, PdfText, ProgressReporter, ReferenceLibrary, SortDirection,
    TokenCounter,
};

use crate::{Paginator, reporters::TracingReporter};

/// Default pause after a rate limited paper
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(60);

/// Why an ingestion run stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum StopReason {
    /// Every requested paper was seen
    #[default]
    Completed,
    ProviderError,
    Unclassified,
    CheckpointFailed,
}

/// Summary of a single ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Papers yielded by the paginator
    pub papers: usize,
    pub embedded: usize,
    /// Papers that were already in the corpus
    pub skipped: usize,
    pub rate_limited: usize,
    pub stop: StopReason,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Completed
    }
}

/// Listing order used when no query is configured: most recently added first
pub fn default_query() -> ListQuery {
    ListQuery {
        sort: Some("dateAdded".to_string()),
        direction: Some(SortDirection::Desc),
        ..Default::default()
    }
}

#[derive(Builder, Clone)]
#[builder(build_fn(error = "anyhow::Error", validate = "Self::validate"))]
pub struct EmbeddingDriver {
    #[builder(setter(custom))]
    library: Arc<dyn ReferenceLibrary>,
    #[builder(setter(custom))]
    embedder: Arc<dyn DocumentEmbedder>,
    #[builder(setter(custom))]
    pdf_text: Arc<dyn PdfText>,
    #[builder(setter(custom))]
    token_counter: Arc<dyn TokenCounter>,
    #[builder(setter(custom))]
    checkpoints: Arc<dyn CheckpointStore>,
    #[builder(setter(custom), default = "Arc::new(TracingReporter)")]
    reporter: Arc<dyn ProgressReporter>,
    /// Where the corpus is saved after every embedded paper
    #[builder(setter(into))]
    checkpoint_location: PathBuf,
    #[builder(default = "DEFAULT_BACKOFF")]
    backoff: Duration,
    #[builder(default = "default_query()")]
    query: ListQuery,
    /// Model to count tokens for; the corpus model when not set
    #[builder(setter(into, strip_option), default)]
    token_model: Option<String>,
}

impl std::fmt::Debug for EmbeddingDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingDriver")
            .field("library", &self.library.name())
            .field("embedder", &self.embedder.name())
            .field("checkpoint_location", &self.checkpoint_location)
            .field("backoff", &self.backoff)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl EmbeddingDriverBuilder {
    pub fn library(&mut self, library: impl ReferenceLibrary + 'static) -> &mut Self {
        self.library = Some(Arc::new(library));
        self
    }

    pub fn library_arc(&mut self, library: Arc<dyn ReferenceLibrary>) -> &mut Self {
        self.library = Some(library);
        self
    }

    pub fn embedder(&mut self, embedder: impl DocumentEmbedder + 'static) -> &mut Self {
        self.embedder = Some(Arc::new(embedder));
        self
    }

    pub fn embedder_arc(&mut self, embedder: Arc<dyn DocumentEmbedder>) -> &mut Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn pdf_text(&mut self, pdf_text: impl PdfText + 'static) -> &mut Self {
        self.pdf_text = Some(Arc::new(pdf_text));
        self
    }

    pub fn pdf_text_arc(&mut self, pdf_text: Arc<dyn PdfText>) -> &mut Self {
        self.pdf_text = Some(pdf_text);
        self
    }

    pub fn token_counter(&mut self, token_counter: impl TokenCounter + 'static) -> &mut Self {
        self.token_counter = Some(Arc::new(token_counter));
        self
    }

    pub fn token_counter_arc(&mut self, token_counter: Arc<dyn TokenCounter>) -> &mut Self {
        self.token_counter = Some(token_counter);
        self
    }

    pub fn checkpoints(&mut self, checkpoints: impl CheckpointStore + 'static) -> &mut Self {
        self.checkpoints = Some(Arc::new(checkpoints));
        self
    }

    pub fn checkpoints_arc(&mut self, checkpoints: Arc<dyn CheckpointStore>) -> &mut Self {
        self.checkpoints = Some(checkpoints);
        self
    }

    pub fn reporter(&mut self, reporter: impl ProgressReporter + 'static) -> &mut Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    pub fn reporter_arc(&mut self, reporter: Arc<dyn ProgressReporter>) -> &mut Self {
        self.reporter = Some(reporter);
        self
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let Some(query) = &self.query {
            query.validate()?;
        }
        Ok(())
    }
}

impl EmbeddingDriver {
    pub fn builder() -> EmbeddingDriverBuilder {
        EmbeddingDriverBuilder::default()
    }

    pub fn checkpoint_location(&self) -> &std::path::Path {
        &self.checkpoint_location
    }

    /// Embeds up to `count` papers starting at listing offset `start` into `corpus`.
    ///
    /// # Errors
    ///
    /// Errors before touching the corpus if the library size cannot be determined or `start` lies
    /// beyond it. Failures while embedding do not error; they end the run and are reflected in
    /// the returned report.
    #[tracing::instrument(skip_all, fields(count = count, start = start, model = corpus.model()))]
    pub async fn ingest(
        &self,
        corpus: &mut EmbeddedCorpus,
        count: usize,
        start: usize,
    ) -> Result<IngestReport, IngestError> {
        self.check_start(start).await?;

        let paginator = Paginator::builder()
            .library_arc(Arc::clone(&self.library))
            .pdf_text_arc(Arc::clone(&self.pdf_text))
            .reporter(Arc::clone(&self.reporter))
            .query(self.query.clone())
            .total(count)
            .start(start)
            .build()
            .map_err(IngestError::InvalidQuery)?;

        Ok(self.run(corpus, paginator).await)
    }

    /// Refuses a start offset beyond the current library size
    async fn check_start(&self, start: usize) -> Result<usize, IngestError> {
        let size = self
            .library
            .count_items()
            .await
            .map_err(IngestError::LibrarySize)?;

        if start > size {
            let err = IngestError::StartOffsetOutOfRange { start, size };
            self.reporter.report(&err.to_string());
            return Err(err);
        }

        Ok(size)
    }

    async fn run(&self, corpus: &mut EmbeddedCorpus, paginator: Paginator) -> IngestReport {
        let mut report = IngestReport::default();
        let mut papers = paginator.into_stream();

        while let Some(item) = papers.next().await {
            let paper = match item {
                Ok(paper) => paper,
                Err(err) => {
                    self.reporter.report(&format!("Unexpected error: {err:#}"));
                    report.stop = StopReason::Unclassified;
                    break;
                }
            };
            report.papers += 1;
            let position = report.papers;

            if corpus.contains(paper.document_name()) {
                self.reporter.report(&format!(
                    "Skipping already processed paper {position}: {}",
                    paper.title
                ));
                report.skipped += 1;
                continue;
            }

            self.reporter
                .report(&format!("Processing paper {position}: {}", paper.title));
            self.estimate_tokens(&paper, corpus.model());

            match self.embedder.embed_document(source_of(&paper)).await {
                Ok(document) => {
                    tracing::debug!(document = ?document, "Embedded paper");
                    let name = document.name.clone();
                    if name != paper.document_name() || !corpus.insert(document) {
                        self.reporter.report(&format!(
                            "Unexpected error: embedded document '{name}' does not belong to \
                             paper {position} ({})",
                            paper.document_name()
                        ));
                        report.stop = StopReason::Unclassified;
                        break;
                    }

                    if let Err(err) = self
                        .checkpoints
                        .save(&self.checkpoint_location, corpus)
                        .await
                    {
                        self.reporter
                            .report(&format!("Failed to save checkpoint: {err}"));
                        report.stop = StopReason::CheckpointFailed;
                        break;
                    }

                    report.embedded += 1;
                    self.reporter.report(&format!(
                        "Saved checkpoint after processing paper {position}."
                    ));
                }
                Err(EmbedError::RateLimited(err)) => {
                    self.reporter.report(&format!(
                        "Rate limit exceeded: {err}. Waiting {}s before continuing...",
                        self.backoff.as_secs()
                    ));
                    report.rate_limited += 1;
                    tokio::time::sleep(self.backoff).await;
                }
                Err(EmbedError::ProviderError(err)) => {
                    self.reporter.report(&format!("Embedding provider error: {err}"));
                    report.stop = StopReason::ProviderError;
                    break;
                }
                Err(EmbedError::Unclassified(err)) => {
                    self.reporter.report(&format!("Unexpected error: {err}"));
                    report.stop = StopReason::Unclassified;
                    break;
                }
            }
        }

        tracing::info!(
            papers = report.papers,
            embedded = report.embedded,
            skipped = report.skipped,
            rate_limited = report.rate_limited,
            stop = %report.stop,
            "Ingestion run finished"
        );
        report
    }

    fn estimate_tokens(&self, paper: &IngestPaper, corpus_model: &str) {
        let model = self.token_model.as_deref().unwrap_or(corpus_model);
        let estimate = self
            .pdf_text
            .extract_text(&paper.pdf)
            .and_then(|text| self.token_counter.count_tokens(&text, model));

        match estimate {
            Ok(tokens) => {
                tracing::debug!(tokens, pdf = %paper.pdf.display(), "Estimated input tokens");
                self.reporter
                    .report(&format!("Paper contains {tokens} input tokens"));
            }
            Err(err) => {
                self.reporter.report(&format!(
                    "Could not estimate the input tokens of '{}': {err:#}",
                    paper.title
                ));
            }
        }
    }
}

fn source_of(paper: &IngestPaper) -> DocumentSource {
    DocumentSource {
        path: paper.pdf.clone(),
        name: paper.document_name().to_string(),
        citation: paper.citation_key.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{FileCheckpointStore, MemoryCheckpointStore};
    use libris_core::{EmbeddedDocument, MockTokenCounter};
    use libris_core::test_utils::{
        CollectingReporter, FakeLibrary, FixedPagesPdf, ListCall, ScriptedEmbedder,
        ScriptedFailure, WordCounter,
    };
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    struct Harness {
        library: FakeLibrary,
        embedder: ScriptedEmbedder,
        reporter: CollectingReporter,
        checkpoints: MemoryCheckpointStore,
        location: PathBuf,
    }

    impl Harness {
        fn new(library: FakeLibrary) -> Self {
            Self {
                library,
                embedder: ScriptedEmbedder::new(),
                reporter: CollectingReporter::new(),
                checkpoints: MemoryCheckpointStore::new(),
                location: PathBuf::from("paper_qa_gpt_4o_mini.json"),
            }
        }

        fn driver(&self) -> EmbeddingDriver {
            EmbeddingDriver::builder()
                .library(self.library.clone())
                .embedder(self.embedder.clone())
                .pdf_text(FixedPagesPdf::default())
                .token_counter(WordCounter)
                .checkpoints(self.checkpoints.clone())
                .reporter(self.reporter.clone())
                .checkpoint_location(&self.location)
                .build()
                .unwrap()
        }

        async fn stored_names(&self) -> Vec<String> {
            self.checkpoints
                .load(&self.location, "gpt-4o-mini")
                .await
                .unwrap()
                .document_names()
                .map(str::to_string)
                .collect()
        }
    }

    fn names(corpus: &EmbeddedCorpus) -> Vec<&str> {
        corpus.document_names().collect()
    }

    #[test_log::test(tokio::test)]
    async fn test_embeds_and_checkpoints_every_paper() {
        let harness = Harness::new(FakeLibrary::numbered(3));
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let report = harness.driver().ingest(&mut corpus, 3, 0).await.unwrap();

        assert_eq!(
            report,
            IngestReport {
                papers: 3,
                embedded: 3,
                ..Default::default()
            }
        );
        assert_eq!(names(&corpus), vec!["KEY00000", "KEY00001", "KEY00002"]);
        assert_eq!(harness.stored_names().await, names(&corpus));

        let messages = harness.reporter.messages();
        assert_eq!(messages[0], "Processing paper 1: Paper number 0");
        assert!(messages[1].starts_with("Paper contains "));
        assert_eq!(messages[2], "Saved checkpoint after processing paper 1.");
    }

    #[test_log::test(tokio::test)]
    async fn test_second_identical_run_is_idempotent() {
        let harness = Harness::new(FakeLibrary::numbered(5));
        let driver = harness.driver();
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        driver.ingest(&mut corpus, 5, 0).await.unwrap();
        let calls_after_first_run = harness.embedder.calls().len();
        let report = driver.ingest(&mut corpus, 5, 0).await.unwrap();

        assert_eq!(harness.embedder.calls().len(), calls_after_first_run);
        assert_eq!(corpus.len(), 5);
        assert_eq!(report.skipped, 5);
        assert_eq!(report.embedded, 0);
        assert!(
            harness
                .reporter
                .messages()
                .contains(&"Skipping already processed paper 2: Paper number 1".to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_provider_error_keeps_earlier_papers() {
        let harness = Harness::new(FakeLibrary::numbered(5));
        harness
            .embedder
            .fail_next("KEY00002", ScriptedFailure::Provider);
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let report = harness.driver().ingest(&mut corpus, 5, 0).await.unwrap();

        assert_eq!(report.stop, StopReason::ProviderError);
        assert_eq!(names(&corpus), vec!["KEY00000", "KEY00001"]);
        assert_eq!(harness.stored_names().await, vec!["KEY00000", "KEY00001"]);
        assert_eq!(
            harness.embedder.calls(),
            vec!["KEY00000", "KEY00001", "KEY00002"]
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_partial_failure_is_durable_on_disk() {
        let dir = TempDir::new().unwrap();
        let location = dir.child("paper_qa_gpt_4o_mini.json");
        let embedder = ScriptedEmbedder::new();
        embedder.fail_next("KEY00002", ScriptedFailure::Provider);

        let driver = EmbeddingDriver::builder()
            .library(FakeLibrary::numbered(5))
            .embedder(embedder)
            .pdf_text(FixedPagesPdf::default())
            .token_counter(WordCounter)
            .checkpoints(FileCheckpointStore::new())
            .reporter(CollectingReporter::new())
            .checkpoint_location(&location)
            .build()
            .unwrap();
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        driver.ingest(&mut corpus, 5, 0).await.unwrap();

        let on_disk = FileCheckpointStore::new()
            .load(&location, "gpt-4o-mini")
            .await
            .unwrap();
        assert_eq!(names(&on_disk), vec!["KEY00000", "KEY00001"]);
        assert_eq!(names(&corpus), names(&on_disk));
    }

    #[test_log::test(tokio::test)]
    async fn test_unclassified_error_aborts() {
        let harness = Harness::new(FakeLibrary::numbered(3));
        harness
            .embedder
            .fail_next("KEY00000", ScriptedFailure::Unclassified);
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let report = harness.driver().ingest(&mut corpus, 3, 0).await.unwrap();

        assert_eq!(report.stop, StopReason::Unclassified);
        assert!(corpus.is_empty());
        assert_eq!(harness.embedder.calls(), vec!["KEY00000"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_document_under_another_name_aborts() {
        let harness = Harness::new(FakeLibrary::numbered(3));
        let mut embedder = libris_core::MockDocumentEmbedder::new();
        embedder.expect_embed_document().times(1).returning(|source| {
            Ok(EmbeddedDocument {
                name: "SOMETHING_ELSE".to_string(),
                citation: source.citation,
                path: source.path,
                embed_model: "text-embedding-3-small".to_string(),
                chunks: Vec::new(),
            })
        });
        let driver = EmbeddingDriver::builder()
            .library(harness.library.clone())
            .embedder(embedder)
            .pdf_text(FixedPagesPdf::default())
            .token_counter(WordCounter)
            .checkpoints(harness.checkpoints.clone())
            .reporter(harness.reporter.clone())
            .checkpoint_location(&harness.location)
            .build()
            .unwrap();
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let report = driver.ingest(&mut corpus, 3, 0).await.unwrap();

        assert_eq!(report.stop, StopReason::Unclassified);
        assert_eq!(report.embedded, 0);
        assert!(corpus.is_empty());
        assert!(!harness.checkpoints.contains(&harness.location).await);
        assert!(harness.reporter.messages().contains(
            &"Unexpected error: embedded document 'SOMETHING_ELSE' does not belong to paper 1 \
              (KEY00000)"
                .to_string()
        ));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_rate_limit_pauses_and_continues() {
        let harness = Harness::new(FakeLibrary::numbered(3));
        harness
            .embedder
            .fail_next("KEY00001", ScriptedFailure::RateLimited);
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let started = tokio::time::Instant::now();
        let report = harness.driver().ingest(&mut corpus, 3, 0).await.unwrap();

        assert!(started.elapsed() >= DEFAULT_BACKOFF);
        assert_eq!(report.rate_limited, 1);
        assert!(report.is_complete());
        assert_eq!(names(&corpus), vec!["KEY00000", "KEY00002"]);
        assert_eq!(
            harness.embedder.calls(),
            vec!["KEY00000", "KEY00001", "KEY00002"]
        );
        assert!(
            harness
                .reporter
                .messages()
                .iter()
                .any(|m| m.starts_with("Rate limit exceeded")
                    && m.ends_with("Waiting 60s before continuing..."))
        );
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_rate_limited_paper_is_embedded_on_the_next_run() {
        let harness = Harness::new(FakeLibrary::numbered(3));
        harness
            .embedder
            .fail_next("KEY00001", ScriptedFailure::RateLimited);
        let driver = harness.driver();
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        driver.ingest(&mut corpus, 3, 0).await.unwrap();
        let report = driver.ingest(&mut corpus, 3, 0).await.unwrap();

        assert_eq!(report.embedded, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(corpus.len(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_start_beyond_library_size_is_refused() {
        let harness = Harness::new(FakeLibrary::numbered(10));
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");
        let before = corpus.clone();

        let err = harness
            .driver()
            .ingest(&mut corpus, 5, 11)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::StartOffsetOutOfRange { start: 11, size: 10 }
        ));
        assert_eq!(corpus, before);
        assert!(harness.library.list_calls().is_empty());
        assert_eq!(
            harness.reporter.messages(),
            vec!["Starting position (11) cannot be larger than the library size (10)"]
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_start_equal_to_library_size_is_accepted() {
        let harness = Harness::new(FakeLibrary::numbered(10));
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let report = harness.driver().ingest(&mut corpus, 5, 10).await.unwrap();

        assert_eq!(report, IngestReport::default());
        assert_eq!(harness.library.list_calls(), vec![ListCall { limit: 5, start: 10 }]);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_count_is_an_error() {
        let harness = Harness::new(FakeLibrary::numbered(10).failing_count());
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let err = harness
            .driver()
            .ingest(&mut corpus, 5, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::LibrarySize(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_listing_failure_aborts_as_unclassified() {
        let harness = Harness::new(FakeLibrary::numbered(150).failing_listing_at(100));
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let report = harness.driver().ingest(&mut corpus, 150, 0).await.unwrap();

        assert_eq!(report.stop, StopReason::Unclassified);
        assert_eq!(corpus.len(), 100);
        assert_eq!(harness.stored_names().await.len(), 100);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_token_estimate_does_not_gate_embedding() {
        let harness = Harness::new(FakeLibrary::numbered(1));
        let mut token_counter = MockTokenCounter::new();
        token_counter
            .expect_count_tokens()
            .returning(|_, _| Err(anyhow::anyhow!("no tokenizer")));

        let driver = EmbeddingDriver::builder()
            .library(harness.library.clone())
            .embedder(harness.embedder.clone())
            .pdf_text(FixedPagesPdf::default())
            .token_counter(token_counter)
            .checkpoints(harness.checkpoints.clone())
            .reporter(harness.reporter.clone())
            .checkpoint_location(&harness.location)
            .build()
            .unwrap();
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let report = driver.ingest(&mut corpus, 1, 0).await.unwrap();

        assert_eq!(report.embedded, 1);
        assert!(
            harness.reporter.messages()[1]
                .starts_with("Could not estimate the input tokens of 'Paper number 0'")
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_counts_tokens_for_the_configured_model() {
        let harness = Harness::new(FakeLibrary::numbered(1));
        let mut token_counter = MockTokenCounter::new();
        token_counter
            .expect_count_tokens()
            .withf(|_, model| model == "gpt-4o")
            .times(1)
            .returning(|_, _| Ok(42));

        let driver = EmbeddingDriver::builder()
            .library(harness.library.clone())
            .embedder(harness.embedder.clone())
            .pdf_text(FixedPagesPdf::default())
            .token_counter(token_counter)
            .checkpoints(harness.checkpoints.clone())
            .reporter(harness.reporter.clone())
            .checkpoint_location(&harness.location)
            .token_model("gpt-4o")
            .build()
            .unwrap();
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        driver.ingest(&mut corpus, 1, 0).await.unwrap();

        assert!(
            harness
                .reporter
                .messages()
                .contains(&"Paper contains 42 input tokens".to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_checkpoint_save_aborts() {
        let harness = Harness::new(FakeLibrary::numbered(3));
        let mut checkpoints = libris_core::MockCheckpointStore::new();
        checkpoints.expect_save().times(1).returning(|location, _| {
            Err(libris_core::CheckpointError::Io {
                path: location.to_path_buf(),
                source: std::io::Error::other("disk full"),
            })
        });

        let driver = EmbeddingDriver::builder()
            .library(harness.library.clone())
            .embedder(harness.embedder.clone())
            .pdf_text(FixedPagesPdf::default())
            .token_counter(WordCounter)
            .checkpoints(checkpoints)
            .reporter(harness.reporter.clone())
            .checkpoint_location(&harness.location)
            .build()
            .unwrap();
        let mut corpus = EmbeddedCorpus::new("gpt-4o-mini");

        let report = driver.ingest(&mut corpus, 3, 0).await.unwrap();

        assert_eq!(report.stop, StopReason::CheckpointFailed);
        assert_eq!(report.embedded, 0);
        assert_eq!(harness.embedder.calls(), vec!["KEY00000"]);
    }
}
