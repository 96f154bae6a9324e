//! Checkpoint stores for embedded corpora
//!
//! [`FileCheckpointStore`] is what the pipeline uses in practice, [`MemoryCheckpointStore`] keeps
//! everything in memory and is handy for experimentation and testing.
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt as _, sync::RwLock};

use libris_core::{
    CORPUS_FORMAT_VERSION, CheckpointError, CheckpointStore, EmbeddedCorpus,
    prompt::default_answer_template,
};

/// Stores each corpus as pretty printed json.
///
/// Saving writes to a sibling temporary file first and renames it over the target, so a reader
/// either sees the previous checkpoint or the new one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCheckpointStore;

impl FileCheckpointStore {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CheckpointError {
    CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn temporary_location(location: &Path) -> PathBuf {
    let mut file_name = location
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    file_name.push(".tmp");
    location.with_file_name(file_name)
}

/// Restores a corpus and applies the current configuration to it
fn restore(
    location: &Path,
    bytes: &[u8],
    model: &str,
) -> Result<EmbeddedCorpus, CheckpointError> {
    let mut corpus: EmbeddedCorpus =
        serde_json::from_slice(bytes).map_err(|source| CheckpointError::Serialize {
            path: location.to_path_buf(),
            source,
        })?;

    if corpus.format_version != CORPUS_FORMAT_VERSION {
        return Err(CheckpointError::UnsupportedVersion {
            path: location.to_path_buf(),
            version: corpus.format_version,
        });
    }

    corpus.reconfigure(model, default_answer_template());
    Ok(corpus)
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    #[tracing::instrument(skip_all, fields(location = %location.display()))]
    async fn load(&self, location: &Path, model: &str) -> Result<EmbeddedCorpus, CheckpointError> {
        match fs_err::tokio::read(location).await {
            Ok(bytes) => {
                let corpus = restore(location, &bytes, model)?;
                tracing::debug!(documents = corpus.len(), "Restored checkpoint");
                Ok(corpus)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("No checkpoint found");
                Ok(EmbeddedCorpus::new(model))
            }
            Err(err) => Err(io_error(location, err)),
        }
    }

    async fn exists(&self, location: &Path) -> Result<bool, CheckpointError> {
        tokio::fs::try_exists(location)
            .await
            .map_err(|err| io_error(location, err))
    }

    #[tracing::instrument(
        skip_all,
        fields(location = %location.display(), documents = corpus.len())
    )]
    async fn save(&self, location: &Path, corpus: &EmbeddedCorpus) -> Result<(), CheckpointError> {
        let bytes =
            serde_json::to_vec_pretty(corpus).map_err(|source| CheckpointError::Serialize {
                path: location.to_path_buf(),
                source,
            })?;

        if let Some(parent) = location.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::tokio::create_dir_all(parent)
                .await
                .map_err(|err| io_error(location, err))?;
        }

        let temporary = temporary_location(location);
        let mut file = fs_err::tokio::File::create(&temporary)
            .await
            .map_err(|err| io_error(&temporary, err))?;
        file.write_all(&bytes)
            .await
            .map_err(|err| io_error(&temporary, err))?;
        file.sync_all()
            .await
            .map_err(|err| io_error(&temporary, err))?;
        drop(file);

        fs_err::tokio::rename(&temporary, location)
            .await
            .map_err(|err| io_error(location, err))?;

        tracing::debug!("Saved checkpoint");
        Ok(())
    }
}

/// Keeps serialized corpora in memory, keyed by location.
///
/// Corpora go through the same json round trip as on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    data: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything was ever saved at `location`
    pub async fn contains(&self, location: impl AsRef<Path>) -> bool {
        self.data.read().await.contains_key(location.as_ref())
    }

    /// Number of stored checkpoints
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, location: &Path, model: &str) -> Result<EmbeddedCorpus, CheckpointError> {
        match self.data.read().await.get(location) {
            Some(bytes) => restore(location, bytes, model),
            None => Ok(EmbeddedCorpus::new(model)),
        }
    }

    async fn exists(&self, location: &Path) -> Result<bool, CheckpointError> {
        Ok(self.contains(location).await)
    }

    async fn save(&self, location: &Path, corpus: &EmbeddedCorpus) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec(corpus).map_err(|source| CheckpointError::Serialize {
            path: location.to_path_buf(),
            source,
        })?;

        self.data
            .write()
            .await
            .insert(location.to_path_buf(), bytes);
        Ok(())
    }
}
