use anyhow::{Context as _, Result};
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use itertools::Itertools as _;

use libris_core::{
    Answerer, EmbeddedChunk, EmbeddedCorpus, EmbeddedDocument, prompt::Prompt,
    util::cosine_similarity,
};

use super::OpenAI;

impl OpenAI {
    /// The chunks closest to `question`, best first
    fn rank_chunks<'a>(
        &self,
        corpus: &'a EmbeddedCorpus,
        question: &[f32],
    ) -> Vec<(&'a EmbeddedDocument, &'a EmbeddedChunk)> {
        corpus
            .documents()
            .flat_map(|document| document.chunks.iter().map(move |chunk| (document, chunk)))
            .map(|(document, chunk)| {
                (cosine_similarity(question, &chunk.vector), document, chunk)
            })
            .sorted_by(|a, b| b.0.total_cmp(&a.0))
            .take(self.context_chunks)
            .map(|(_, document, chunk)| (document, chunk))
            .collect()
    }
}

#[async_trait]
impl Answerer for OpenAI {
    #[tracing::instrument(skip_all, fields(model = %corpus.model()))]
    async fn answer(&self, corpus: &EmbeddedCorpus, question: &str) -> Result<String> {
        let question_vector = self
            .embed_texts(&[question.to_string()])
            .await
            .context("Failed to embed the question")?
            .pop()
            .context("No embedding returned for the question")?;

        let ranked = self.rank_chunks(corpus, &question_vector);
        tracing::debug!(chunks = ranked.len(), "Ranked context");

        let context = ranked
            .iter()
            .map(|(document, chunk)| format!("{}: {}", document.citation, chunk.text))
            .join("\n\n");

        let prompt = Prompt::from(corpus.prompt_template())
            .with_context_value("question", question)
            .with_context_value("context", context)
            .render()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(corpus.model())
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Chat completion failed")?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Chat completion returned no answer")?;

        let references = ranked
            .iter()
            .map(|(document, _)| document.citation.as_str())
            .unique()
            .enumerate()
            .map(|(i, citation)| format!("{}. {citation}", i + 1))
            .collect::<Vec<_>>();

        if references.is_empty() {
            return Ok(answer);
        }

        Ok(format!(
            "{}\n\nReferences\n\n{}",
            answer.trim(),
            references.join("\n")
        ))
    }
}
