//! # Libris
//!
//! Libris embeds the papers of a reference library into a corpus you can ask questions against.
//! Ingestion is resumable: the corpus is checkpointed after every embedded paper, papers that are
//! already in the corpus are skipped, and a rate limited paper is simply picked up again on the
//! next run.
//!
//! ## Example
//!
//! ```no_run
//! # use anyhow::Result;
//! # use libris::{ingest::PipelineController, integrations};
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let zotero = integrations::zotero::Zotero::builder()
//!     .library_id("1234567")
//!     .api_key("zotero-api-key")
//!     .storage_dir("data/pdfs")
//!     .build()?;
//! let openai = integrations::openai::OpenAI::builder()
//!     .api_key("openai-api-key")
//!     .build()?;
//!
//! let controller = PipelineController::builder()
//!     .library(zotero)
//!     .engine(openai)
//!     .pdf_text(integrations::pdf::LopdfText)
//!     .token_counter(integrations::tiktoken::TikToken::default())
//!     .model("gpt-4o-mini")
//!     .data_dir("data/processed")
//!     .build()?;
//!
//! let mut corpus = controller.open().await?;
//! let report = controller.embed(&mut corpus, 20, 0).await?;
//! println!("Embedded {} papers", report.embedded);
//!
//! println!("{}", controller.ask(&corpus, "What is attention?").await?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! The `cli` feature, enabled by default, pulls in the Zotero, `OpenAI` and tiktoken
//! integrations plus the `libris` binary. Disable default features and pick the integrations you
//! need to use libris as a library only.

#[doc(inline)]
pub use libris_core::prompt;
#[doc(inline)]
pub use libris_core::type_aliases::*;
#[doc(inline)]
pub use libris_core::{
    Attachment, CatalogRecord, Creator, DocumentSource, EmbeddedChunk, EmbeddedCorpus,
    EmbeddedDocument, IngestPaper, ListQuery, PaperStream, QuickSearchMode, SortDirection,
    checkpoint, citation, errors, util,
};

pub use async_trait::async_trait;

/// Traits at the seams of the pipeline, implement them to bring your own collaborators
pub mod traits {
    #[doc(inline)]
    pub use libris_core::ingest_traits::*;
}

/// Integrations with the Zotero web api, `OpenAI`, lopdf and tiktoken
pub mod integrations {
    #[doc(inline)]
    pub use libris_integrations::*;
}

/// Paginating, embedding and checkpointing a library
pub mod ingest {
    #[doc(inline)]
    pub use libris_ingest::*;
}

#[doc(hidden)]
#[cfg(feature = "test-utils")]
pub mod test_utils {
    pub use libris_core::test_utils::*;
}
