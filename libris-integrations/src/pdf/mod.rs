//! Pdf text extraction with lopdf
use std::path::Path;

use anyhow::{Context as _, Result};
use itertools::Itertools as _;
use libris_core::PdfText;
use lopdf::Document;
use tracing::{debug, instrument};

/// Extracts the text of a pdf, page by page, with lines of a paragraph joined together
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfText;

impl LopdfText {
    fn load(path: &Path) -> Result<Document> {
        match Document::load(path) {
            Ok(doc) => Ok(doc),
            Err(e) if e.to_string().to_lowercase().contains("encrypted") => Err(anyhow::anyhow!(
                "PDF is encrypted and cannot be processed: {}",
                path.display()
            )),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to load PDF file: {}", path.display()))
            }
        }
    }
}

impl PdfText for LopdfText {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn extract_text(&self, path: &Path) -> Result<String> {
        let doc = Self::load(path)?;

        let page_numbers = doc.get_pages().keys().copied().sorted().collect::<Vec<_>>();
        if page_numbers.is_empty() {
            anyhow::bail!("PDF contains no pages: {}", path.display());
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in page_numbers {
            let text = doc.extract_text(&[page_number]).with_context(|| {
                format!(
                    "Failed to extract text from page {page_number} of PDF: {}",
                    path.display()
                )
            })?;

            let text = join_paragraph_lines(&text);
            debug!(page = page_number, text_length = text.len(), "Extracted page");
            if !text.is_empty() {
                pages.push(text);
            }
        }

        Ok(pages.join("\n\n"))
    }

    fn page_count(&self, path: &Path) -> Result<usize> {
        Ok(Self::load(path)?.get_pages().len())
    }
}

/// Joins the lines of each paragraph with a space and keeps a blank line between paragraphs
fn join_paragraph_lines(text: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs.join("\n\n")
}
