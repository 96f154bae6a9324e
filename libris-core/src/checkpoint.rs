//! Where checkpoints live on disk.
//!
//! There is one checkpoint per model identifier. The file name is derived from the model id, and
//! must stay stable across releases: a different name means the next run silently starts a fresh
//! corpus instead of resuming.
use std::path::{Path, PathBuf};

const CHECKPOINT_PREFIX: &str = "paper_qa_";
const CHECKPOINT_EXTENSION: &str = "json";

/// Lower-cases the model id and replaces spaces and hyphens with underscores
///
/// # Example
///
/// ```
/// # use libris_core::checkpoint::normalize_model_id;
/// assert_eq!(normalize_model_id("GPT-4o mini"), "gpt_4o_mini");
/// ```
pub fn normalize_model_id(model: &str) -> String {
    model.to_lowercase().replace([' ', '-'], "_")
}

/// File name of the checkpoint for a model, e.g. `paper_qa_gpt_4o_mini.json`
pub fn checkpoint_file_name(model: &str) -> String {
    format!(
        "{CHECKPOINT_PREFIX}{}.{CHECKPOINT_EXTENSION}",
        normalize_model_id(model)
    )
}

/// Full checkpoint location for a model inside `data_dir`
pub fn checkpoint_location(data_dir: impl AsRef<Path>, model: &str) -> PathBuf {
    data_dir.as_ref().join(checkpoint_file_name(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("gpt-4o-mini", "paper_qa_gpt_4o_mini.json" ; "hyphens")]
    #[test_case("GPT 4 Turbo", "paper_qa_gpt_4_turbo.json" ; "spaces and casing")]
    #[test_case("gpt-3.5-turbo", "paper_qa_gpt_3.5_turbo.json" ; "dots are kept")]
    fn test_checkpoint_file_name(model: &str, expected: &str) {
        assert_eq!(checkpoint_file_name(model), expected);
    }

    #[test]
    fn test_checkpoint_location_joins_data_dir() {
        assert_eq!(
            checkpoint_location("data/processed", "gpt-4o-mini"),
            PathBuf::from("data/processed/paper_qa_gpt_4o_mini.json")
        );
    }
}
