//! Prompts for answering questions against a corpus
//!
//! Prompts use [tera] under the hood, so templates are jinja style. The answer template of a
//! corpus gets two variables: `question` and `context`.
//!
//! # Example
//!
//! ```
//! # use libris_core::prompt::Prompt;
//! let prompt = Prompt::from("hello {{ world }}").with_context_value("world", "libris");
//!
//! assert_eq!(prompt.render().unwrap(), "hello libris");
//! ```
use anyhow::{Context as _, Result};

/// The answer prompt every fresh or restored corpus is configured with
pub fn default_answer_template() -> &'static str {
    indoc::indoc! {"
    Answer the question '{{ question }}'
    Use the context below if helpful.
    Context: {{ context }}

    Include all relevant academic papers and documents in your answer.
    If the information is insufficient or ambiguous, provide a brief explanation of what additional information would be necessary to fully answer the question.
    Evaluate the relevance of each source in relation to the question.
    Do not include a separate references section within the body of the text.
    Use Harvard style for references when referencing sources.
    "}
}

/// A template plus the context it is rendered with.
#[derive(Clone, Debug)]
pub struct Prompt {
    template: String,
    context: Option<tera::Context>,
}

impl Prompt {
    /// Adds anything that implements [`Into<tera::Context>`] to the prompt
    #[must_use]
    pub fn with_context(mut self, new_context: impl Into<tera::Context>) -> Self {
        let context = self.context.get_or_insert_with(tera::Context::default);
        context.extend(new_context.into());

        self
    }

    /// Adds a key-value pair to the context of the prompt
    #[must_use]
    pub fn with_context_value(mut self, key: &str, value: impl Into<tera::Value>) -> Self {
        let context = self.context.get_or_insert_with(tera::Context::default);
        context.insert(key, &value.into());
        self
    }

    /// Renders the prompt
    ///
    /// If no context is provided, the template is returned as is.
    ///
    /// # Errors
    ///
    /// Errors if the template is invalid or references variables missing from the context
    pub fn render(&self) -> Result<String> {
        let Some(context) = &self.context else {
            return Ok(self.template.clone());
        };

        tera::Tera::one_off(&self.template, context, false).context("Failed to render prompt")
    }
}

impl From<&str> for Prompt {
    fn from(template: &str) -> Self {
        Prompt {
            template: template.to_string(),
            context: None,
        }
    }
}

impl From<String> for Prompt {
    fn from(template: String) -> Self {
        Prompt {
            template,
            context: None,
        }
    }
}
