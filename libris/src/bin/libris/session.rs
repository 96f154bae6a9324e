//! The interactive session: embed papers on request, then answer questions until `exit`.
use std::io::{BufRead, Write};

use anyhow::Result;

use libris::{
    EmbeddedCorpus, errors::IngestError,
    ingest::{IngestReport, PipelineController},
};

const EXIT: &str = "exit";

/// Human readable summary of an ingestion run
pub fn summary(report: &IngestReport) -> String {
    format!(
        "Embedded {} papers, skipped {} already embedded and {} rate limited out of {} listed ({})",
        report.embedded, report.skipped, report.rate_limited, report.papers, report.stop
    )
}

pub struct Session<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Runs until the operator types `exit` or the input ends
    pub async fn run(
        mut self,
        controller: &PipelineController,
        mut corpus: EmbeddedCorpus,
    ) -> Result<()> {
        loop {
            let Some(embed) = self.confirm("Do you want to embed further papers? (y/n): ")? else {
                return Ok(());
            };
            if !embed {
                return self.answer_questions(controller, &corpus).await;
            }

            let size = match controller.library_size().await {
                Ok(size) => size,
                Err(err) => {
                    writeln!(self.output, "Failed to determine the library size: {err:#}")?;
                    continue;
                }
            };
            let Some(count) = self.non_negative_integer(&format!(
                "How many papers would you like to embed? ({size} papers in Zotero library): "
            ))?
            else {
                return Ok(());
            };
            let Some(start) = self.non_negative_integer(
                "What position would you like to start from in your Zotero library?: ",
            )?
            else {
                return Ok(());
            };

            match controller.embed(&mut corpus, count, start).await {
                Ok(report) => writeln!(self.output, "{}", summary(&report))?,
                // Already reported by the driver
                Err(IngestError::StartOffsetOutOfRange { .. }) => {}
                Err(err) => writeln!(self.output, "{err}")?,
            }
        }
    }

    async fn answer_questions(
        &mut self,
        controller: &PipelineController,
        corpus: &EmbeddedCorpus,
    ) -> Result<()> {
        while let Some(question) = self.prompt("Paper QA Query: ")? {
            let question = question.trim();
            if question.eq_ignore_ascii_case(EXIT) {
                writeln!(self.output, "Exiting...")?;
                break;
            }
            if question.is_empty() {
                continue;
            }

            match controller.ask(corpus, question).await {
                Ok(answer) => writeln!(self.output, "Response: {answer}")?,
                Err(err) => writeln!(self.output, "Failed to answer: {err:#}")?,
            }
        }

        Ok(())
    }

    /// `None` when the input has ended
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn confirm(&mut self, prompt: &str) -> Result<Option<bool>> {
        while let Some(response) = self.prompt(prompt)? {
            match response.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "Invalid input. Please enter 'y' or 'n'.")?,
            }
        }
        Ok(None)
    }

    fn non_negative_integer(&mut self, prompt: &str) -> Result<Option<usize>> {
        while let Some(response) = self.prompt(prompt)? {
            match response.trim().parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(
                    self.output,
                    "Invalid input. Please enter a positive integer."
                )?,
            }
        }
        Ok(None)
    }
}
