//! Token counting with tiktoken-rs
//!
//! Intended for openai models. Counts are exact for the tokenizer the model maps to, but only an
//! estimate of what the provider bills.
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use anyhow::Result;
use libris_core::TokenCounter;
use tiktoken_rs::{CoreBPE, get_bpe_from_model};

/// A tiktoken based [`TokenCounter`]. Tokenizers are built on first use per model and reused.
///
/// # Example
///
/// ```no_run
/// # use libris_core::TokenCounter as _;
/// # use libris_integrations::tiktoken::TikToken;
/// let tokenizer = TikToken::default();
/// let count = tokenizer.count_tokens("hello world", "gpt-4o-mini").unwrap();
///
/// assert_eq!(count, 2);
/// ```
#[derive(Clone, Default)]
pub struct TikToken {
    bpes: Arc<RwLock<HashMap<String, Arc<CoreBPE>>>>,
}

impl std::fmt::Debug for TikToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TikToken").finish()
    }
}

impl TikToken {
    fn bpe(&self, model: &str) -> Result<Arc<CoreBPE>> {
        if let Some(bpe) = self
            .bpes
            .read()
            .map_err(|_| anyhow::anyhow!("Tokenizer cache is poisoned"))?
            .get(model)
        {
            return Ok(Arc::clone(bpe));
        }

        let bpe = Arc::new(get_bpe_from_model(model)?);
        self.bpes
            .write()
            .map_err(|_| anyhow::anyhow!("Tokenizer cache is poisoned"))?
            .insert(model.to_string(), Arc::clone(&bpe));

        Ok(bpe)
    }
}

impl TokenCounter for TikToken {
    fn count_tokens(&self, text: &str, model: &str) -> Result<usize> {
        Ok(self.bpe(model)?.encode_with_special_tokens(text).len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_tokens() {
        let tokenizer = TikToken::default();

        assert_eq!(tokenizer.count_tokens("hello world", "gpt-4o-mini").unwrap(), 2);
        assert_eq!(tokenizer.count_tokens("", "gpt-4o-mini").unwrap(), 0);
    }

    #[test]
    fn test_tokenizer_is_cached_per_model() {
        let tokenizer = TikToken::default();

        tokenizer.count_tokens("hello", "gpt-4o-mini").unwrap();
        tokenizer.count_tokens("hello", "gpt-4o-mini").unwrap();
        tokenizer.count_tokens("hello", "gpt-3.5-turbo").unwrap();

        assert_eq!(tokenizer.bpes.read().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_model_is_an_error() {
        assert!(
            TikToken::default()
                .count_tokens("hello", "definitely-not-a-model")
                .is_err()
        );
    }
}
