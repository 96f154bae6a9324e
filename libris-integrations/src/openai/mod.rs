//! `OpenAI` as embedding and answering engine.
//!
//! Papers are split into character bounded chunks and embedded through the embeddings endpoint.
//! Questions are answered by ranking the stored chunks against the embedded question and sending
//! the best ones, rendered into the corpus prompt, to the chat completions endpoint.
//!
//! The client never retries on its own. Rate limits are surfaced as
//! [`EmbedError::RateLimited`] so the ingestion driver decides when to try again.
use std::{sync::Arc, time::Duration};

use async_openai::error::OpenAIError;
use derive_builder::Builder;
use libris_core::{EmbedError, Embeddings, PdfText};
use secrecy::{ExposeSecret as _, SecretString};

use crate::pdf::LopdfText;

mod answer;
mod embed;

pub use async_openai::config::OpenAIConfig;

pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";
/// Characters per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 3000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
/// Chunks per embeddings request
pub const DEFAULT_BATCH_SIZE: usize = 32;
/// Chunks sent along with a question
pub const DEFAULT_CONTEXT_CHUNKS: usize = 5;

const INSUFFICIENT_QUOTA: &str = "insufficient_quota";
const RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";
/// Error types openai uses for request and token rate limits
const RATE_LIMIT_TYPES: [&str; 2] = ["requests", "tokens"];

/// Embeds papers and answers questions with `OpenAI`
///
/// # Example
///
/// ```no_run
/// # use libris_integrations::openai::OpenAI;
/// // Uses the OPENAI_API_KEY environment variable
/// let openai = OpenAI::builder().build().unwrap();
///
/// let openai = OpenAI::builder()
///     .api_key("my-api-key")
///     .embed_model("text-embedding-3-large")
///     .chunk_size(2000)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(error = "anyhow::Error", validate = "Self::validate"))]
pub struct OpenAI {
    #[builder(
        setter(custom),
        default = "Arc::new(without_retries(async_openai::Client::new()))"
    )]
    client: Arc<async_openai::Client<OpenAIConfig>>,
    #[builder(setter(into), default = "DEFAULT_EMBED_MODEL.to_string()")]
    embed_model: String,
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    chunk_size: usize,
    #[builder(default = "DEFAULT_CHUNK_OVERLAP")]
    chunk_overlap: usize,
    #[builder(default = "DEFAULT_BATCH_SIZE")]
    batch_size: usize,
    #[builder(default = "DEFAULT_CONTEXT_CHUNKS")]
    context_chunks: usize,
    #[builder(setter(custom), default = "Arc::new(LopdfText)")]
    pdf_text: Arc<dyn PdfText>,
}

impl OpenAI {
    pub fn builder() -> OpenAIBuilder {
        OpenAIBuilder::default()
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    /// Embeds `input` in a single request, in input order
    async fn embed_texts(&self, input: &[String]) -> Result<Embeddings, OpenAIError> {
        let request = async_openai::types::CreateEmbeddingRequestArgs::default()
            .model(&self.embed_model)
            .input(input.to_vec())
            .build()?;

        tracing::debug!(
            num_chunks = input.len(),
            model = %self.embed_model,
            "[Embed] Request to openai"
        );
        let mut response = self.client.embeddings().create(request).await?;

        if response.data.len() != input.len() {
            return Err(OpenAIError::InvalidArgument(format!(
                "Expected {} embeddings, got {}",
                input.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|embedding| embedding.index);
        Ok(response
            .data
            .into_iter()
            .map(|embedding| embedding.embedding)
            .collect())
    }
}

impl OpenAIBuilder {
    /// Sets the client. Its internal retries are disabled.
    pub fn client(&mut self, client: async_openai::Client<OpenAIConfig>) -> &mut Self {
        self.client = Some(Arc::new(without_retries(client)));
        self
    }

    /// Uses the default client configuration with an explicit api key
    pub fn api_key(&mut self, api_key: impl Into<SecretString>) -> &mut Self {
        let config = OpenAIConfig::new().with_api_key(api_key.into().expose_secret());
        self.client(async_openai::Client::with_config(config))
    }

    pub fn pdf_text(&mut self, pdf_text: impl PdfText + 'static) -> &mut Self {
        self.pdf_text = Some(Arc::new(pdf_text));
        self
    }

    fn validate(&self) -> anyhow::Result<()> {
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        let chunk_overlap = self.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP);

        if chunk_size == 0 {
            anyhow::bail!("Chunk size must be larger than 0");
        }
        if chunk_overlap >= chunk_size {
            anyhow::bail!(
                "Chunk overlap ({chunk_overlap}) must be smaller than the chunk size ({chunk_size})"
            );
        }
        if self.batch_size == Some(0) {
            anyhow::bail!("Batch size must be larger than 0");
        }
        if self.context_chunks == Some(0) {
            anyhow::bail!("At least one context chunk is needed to answer questions");
        }
        Ok(())
    }
}

fn without_retries(
    client: async_openai::Client<OpenAIConfig>,
) -> async_openai::Client<OpenAIConfig> {
    client.with_backoff(
        backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build(),
    )
}

/// Classifies an openai error for the ingestion driver
///
/// Rate limits are retried on a later pass, an exhausted quota or any other failure reported by
/// the api aborts the run, failures on our side are unclassified.
pub fn classify_openai_error(err: OpenAIError) -> EmbedError {
    match err {
        OpenAIError::ApiError(api_error) => {
            let code = api_error.code.as_deref();
            let kind = api_error.r#type.as_deref();

            if code == Some(INSUFFICIENT_QUOTA) || kind == Some(INSUFFICIENT_QUOTA) {
                tracing::error!("OpenAI quota exhausted: {:?}", api_error);
                EmbedError::provider(OpenAIError::ApiError(api_error))
            } else if code == Some(RATE_LIMIT_EXCEEDED)
                || kind.is_some_and(|kind| RATE_LIMIT_TYPES.contains(&kind))
            {
                tracing::warn!("OpenAI rate limit: {:?}", api_error);
                EmbedError::rate_limited(OpenAIError::ApiError(api_error))
            } else {
                tracing::error!("OpenAI API Error: {:?}", api_error);
                EmbedError::provider(OpenAIError::ApiError(api_error))
            }
        }
        OpenAIError::Reqwest(e) => {
            if e.status().is_some_and(|status| status.as_u16() == 429)
                && !e.to_string().contains("quota")
            {
                EmbedError::rate_limited(e)
            } else {
                tracing::error!("OpenAI request failed: {:?}", e);
                EmbedError::provider(e)
            }
        }
        OpenAIError::JSONDeserialize(e) => {
            tracing::error!("OpenAI response could not be deserialized: {:?}", e);
            EmbedError::provider(e)
        }
        other => EmbedError::unclassified(other),
    }
}
