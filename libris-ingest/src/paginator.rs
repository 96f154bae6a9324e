//! Walks a page limited reference library listing and yields papers lazily.
//!
//! Pages are requested at most [`MAX_PAGE_SIZE`] items at a time. The offset of the next page
//! always advances by the number of items *requested*, regardless of how many records survived
//! filtering, so that the listing window is exactly `start..start + total`.
use std::{
    collections::{HashSet, VecDeque},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context as _, Result};
use derive_builder::Builder;
use futures_util::stream;

use libris_core::{
    CatalogRecord, IngestPaper, ListQuery, PaperStream, PdfText, ProgressReporter,
    ReferenceLibrary, citation::citation_key,
};

/// Largest page the listing api accepts
pub const MAX_PAGE_SIZE: usize = 100;

/// Lazily paginates a [`ReferenceLibrary`] into a stream of [`IngestPaper`]s.
///
/// Records without a pdf, and records whose source key or pdf path was already yielded in this
/// run, are skipped and reported. Pdf resolution and page counting happen once per candidate and
/// are never retried; a failure skips the record.
///
/// # Example
///
/// ```no_run
/// # use libris_core::test_utils::{FakeLibrary, FixedPagesPdf};
/// # use libris_ingest::Paginator;
/// # use futures_util::TryStreamExt as _;
/// # async fn run() -> anyhow::Result<()> {
/// let papers: Vec<_> = Paginator::builder()
///     .library(FakeLibrary::numbered(250))
///     .pdf_text(FixedPagesPdf::default())
///     .total(30)
///     .start(120)
///     .build()?
///     .into_stream()
///     .try_collect()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Clone)]
#[builder(build_fn(error = "anyhow::Error", validate = "Self::validate"))]
pub struct Paginator {
    #[builder(setter(custom))]
    library: Arc<dyn ReferenceLibrary>,
    #[builder(setter(custom))]
    pdf_text: Arc<dyn PdfText>,
    /// Number of listing slots to walk
    total: usize,
    /// Offset of the first listing slot
    #[builder(default)]
    start: usize,
    #[builder(default)]
    query: ListQuery,
    #[builder(default = "MAX_PAGE_SIZE")]
    page_size: usize,
    #[builder(setter(custom), default)]
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl std::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("library", &self.library.name())
            .field("total", &self.total)
            .field("start", &self.start)
            .field("query", &self.query)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl PaginatorBuilder {
    pub fn library(&mut self, library: impl ReferenceLibrary + 'static) -> &mut Self {
        self.library = Some(Arc::new(library));
        self
    }

    pub fn library_arc(&mut self, library: Arc<dyn ReferenceLibrary>) -> &mut Self {
        self.library = Some(library);
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

    /// Also report skipped records to this reporter
    pub fn reporter(&mut self, reporter: Arc<dyn ProgressReporter>) -> &mut Self {
        self.reporter = Some(Some(reporter));
        self
    }

    fn validate(&self) -> Result<()> {
        if let Some(page_size) = self.page_size {
            if page_size == 0 || page_size > MAX_PAGE_SIZE {
                anyhow::bail!("Page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}");
            }
        }
        if let Some(query) = &self.query {
            query.validate()?;
        }
        Ok(())
    }
}

impl Paginator {
    pub fn builder() -> PaginatorBuilder {
        PaginatorBuilder::default()
    }

    /// Turns the paginator into a lazy stream of papers.
    ///
    /// Nothing is requested until the stream is polled. A failed page request ends the stream
    /// with an error item.
    pub fn into_stream(self) -> PaperStream {
        let cursor = Cursor {
            remaining: self.total,
            offset: self.start,
            paginator: self,
            page: VecDeque::new(),
            exhausted: false,
            seen_keys: HashSet::new(),
            seen_pdfs: HashSet::new(),
        };

        let stream = stream::unfold(cursor, |mut cursor| async move {
            let item = cursor.next_paper().await?;
            Some((item, cursor))
        });

        PaperStream::from_stream(stream)
    }
}

/// Pagination state of a single run
struct Cursor {
    paginator: Paginator,
    /// Listing slots not yet requested
    remaining: usize,
    offset: usize,
    page: VecDeque<CatalogRecord>,
    exhausted: bool,
    seen_keys: HashSet<String>,
    seen_pdfs: HashSet<PathBuf>,
}

impl Cursor {
    async fn next_paper(&mut self) -> Option<Result<IngestPaper>> {
        loop {
            if let Some(record) = self.page.pop_front() {
                match self.admit(record).await {
                    Some(paper) => return Some(Ok(paper)),
                    None => continue,
                }
            }

            if self.exhausted || self.remaining == 0 {
                return None;
            }

            if let Err(err) = self.fetch_page().await {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }

    #[tracing::instrument(skip(self), fields(library = self.paginator.library.name()))]
    async fn fetch_page(&mut self) -> Result<()> {
        let limit = self.paginator.page_size.min(self.remaining);
        let start = self.offset;
        tracing::info!(limit, offset = start, "Requesting a page of up to {limit} papers");

        let records = self
            .paginator
            .library
            .list_top_items(&self.paginator.query, limit, start)
            .await
            .with_context(|| format!("Failed to list items at offset {start}"))?;

        if records.is_empty() {
            tracing::debug!(offset = start, "Empty page, listing is exhausted");
            self.exhausted = true;
            return Ok(());
        }

        self.page.extend(records);
        self.offset += limit;
        self.remaining -= limit;
        Ok(())
    }

    /// Turns a record into a paper, or `None` if it has to be skipped
    async fn admit(&mut self, record: CatalogRecord) -> Option<IngestPaper> {
        let title = record.display_title().to_string();

        if self.seen_keys.contains(&record.key) {
            self.skip(&format!("Skipping paper '{title}' as it was already listed."));
            return None;
        }

        let pdf = match self.paginator.library.resolve_pdf(&record).await {
            Ok(Some(pdf)) => pdf,
            Ok(None) => {
                self.skip(&format!("Skipping paper '{title}' as it has no associated PDF."));
                return None;
            }
            Err(err) => {
                tracing::warn!(key = %record.key, error = ?err, "Failed to resolve pdf");
                self.skip(&format!("Skipping paper '{title}' as it has no associated PDF."));
                return None;
            }
        };

        if self.seen_pdfs.contains(&pdf) {
            self.skip(&format!("Skipping paper '{title}' as its PDF was already listed."));
            return None;
        }

        let num_pages = match self.paginator.pdf_text.page_count(&pdf) {
            Ok(num_pages) => num_pages,
            Err(err) => {
                tracing::warn!(pdf = %pdf.display(), error = ?err, "Failed to count pages");
                self.skip(&format!("Skipping paper '{title}' as its PDF is unreadable."));
                return None;
            }
        };

        let paper = IngestPaper::builder()
            .citation_key(citation_key(&record))
            .title(title)
            .pdf(pdf.clone())
            .num_pages(num_pages)
            .source_key(record.key.clone())
            .record(record)
            .build();

        match paper {
            Ok(paper) => {
                self.seen_keys.insert(paper.source_key.clone());
                self.seen_pdfs.insert(pdf);
                Some(paper)
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to build paper");
                None
            }
        }
    }

    fn skip(&self, message: &str) {
        tracing::debug!("{message}");
        if let Some(reporter) = &self.paginator.reporter {
            reporter.report(message);
        }
    }
}
