//! Error taxonomy of the ingestion pipeline
use std::path::PathBuf;

use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a failed embedding call.
///
/// The driver reacts differently to each variant: a rate limited call is paused on and skipped,
/// the other two abort the run.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Rate limited by the embedding provider: {0}")]
    RateLimited(BoxedError),

    #[error("Embedding provider error: {0}")]
    ProviderError(BoxedError),

    #[error("Unexpected error while embedding: {0}")]
    Unclassified(BoxedError),
}

impl EmbedError {
    pub fn rate_limited(err: impl Into<BoxedError>) -> Self {
        EmbedError::RateLimited(err.into())
    }

    pub fn provider(err: impl Into<BoxedError>) -> Self {
        EmbedError::ProviderError(err.into())
    }

    pub fn unclassified(err: impl Into<BoxedError>) -> Self {
        EmbedError::Unclassified(err.into())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, EmbedError::RateLimited(_))
    }
}

impl From<anyhow::Error> for EmbedError {
    fn from(err: anyhow::Error) -> Self {
        EmbedError::Unclassified(err.into())
    }
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Failed to access checkpoint at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize checkpoint at {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Checkpoint at {} has unsupported format version {version}", path.display())]
    UnsupportedVersion { path: PathBuf, version: u32 },
}

/// Errors that stop an ingestion request before any work is done
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Starting position ({start}) cannot be larger than the library size ({size})")]
    StartOffsetOutOfRange { start: usize, size: usize },

    #[error("Failed to determine the library size: {0}")]
    LibrarySize(anyhow::Error),

    #[error("Invalid listing query: {0}")]
    InvalidQuery(anyhow::Error),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_classify() {
        assert!(EmbedError::rate_limited("slow down").is_rate_limited());
        assert!(!EmbedError::provider("bad request").is_rate_limited());
        assert!(matches!(
            EmbedError::from(anyhow::anyhow!("boom")),
            EmbedError::Unclassified(_)
        ));
    }

    #[test]
    fn test_validation_message() {
        let err = IngestError::StartOffsetOutOfRange {
            start: 300,
            size: 250,
        };
        assert_eq!(
            err.to_string(),
            "Starting position (300) cannot be larger than the library size (250)"
        );
    }

    #[test]
    fn test_checkpoint_errors_name_the_path() {
        let err = CheckpointError::UnsupportedVersion {
            path: PathBuf::from("data/processed/paper_qa_gpt_4o_mini.json"),
            version: 7,
        };
        assert_eq!(
            err.to_string(),
            "Checkpoint at data/processed/paper_qa_gpt_4o_mini.json \
             has unsupported format version 7"
        );

        let err = CheckpointError::Io {
            path: PathBuf::from("data/processed/paper_qa_gpt_4o.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to access checkpoint at data/processed/paper_qa_gpt_4o.json: denied"
        );
    }
}
