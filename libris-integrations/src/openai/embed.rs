use anyhow::Context as _;
use async_trait::async_trait;
use text_splitter::{ChunkConfig, TextSplitter};

use libris_core::{
    DocumentEmbedder, DocumentSource, EmbedError, EmbeddedChunk, EmbeddedDocument,
};

use super::{OpenAI, classify_openai_error};

#[async_trait]
impl DocumentEmbedder for OpenAI {
    #[tracing::instrument(skip_all, fields(document = %source.name))]
    async fn embed_document(
        &self,
        source: DocumentSource,
    ) -> Result<EmbeddedDocument, EmbedError> {
        let text = self
            .pdf_text
            .extract_text(&source.path)
            .with_context(|| format!("Failed to read {}", source.path.display()))?;
        if text.trim().is_empty() {
            return Err(EmbedError::unclassified(format!(
                "No text could be extracted from {}",
                source.path.display()
            )));
        }

        let config = ChunkConfig::new(self.chunk_size)
            .with_overlap(self.chunk_overlap)
            .map_err(EmbedError::unclassified)?;
        let texts = TextSplitter::new(config)
            .chunks(&text)
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(
                self.embed_texts(batch)
                    .await
                    .map_err(classify_openai_error)?,
            );
        }

        tracing::debug!(chunks = texts.len(), "Embedded document");

        Ok(EmbeddedDocument {
            name: source.name,
            citation: source.citation,
            path: source.path,
            embed_model: self.embed_model.clone(),
            chunks: texts
                .into_iter()
                .zip(vectors)
                .map(|(text, vector)| EmbeddedChunk { text, vector })
                .collect(),
        })
    }
}
