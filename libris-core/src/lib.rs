#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod checkpoint;
pub mod citation;
mod corpus;
pub mod errors;
pub mod ingest_traits;
mod list_query;
mod paper;
mod paper_stream;
pub mod prompt;
mod record;
pub mod type_aliases;

pub use type_aliases::*;

/// All traits are available from the root
pub use crate::ingest_traits::*;

pub use crate::corpus::*;
pub use crate::errors::{CheckpointError, EmbedError, IngestError};
pub use crate::list_query::*;
pub use crate::paper::*;
pub use crate::paper_stream::PaperStream;
pub use crate::record::*;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub mod util;
