// show feature flags in the generated documentation
// https://doc.rust-lang.org/rustdoc/unstable-features.html#extensions-to-the-doc-attribute
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod checkpoint;
pub mod reporters;

mod controller;
mod driver;
mod paginator;

pub use controller::{PipelineController, PipelineControllerBuilder};
pub use driver::{
    DEFAULT_BACKOFF, EmbeddingDriver, EmbeddingDriverBuilder, IngestReport, StopReason,
    default_query,
};
pub use paginator::{MAX_PAGE_SIZE, Paginator, PaginatorBuilder};
