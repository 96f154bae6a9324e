//! Operator binary: embed papers from a Zotero library and ask questions against them.
//!
//! Configuration comes from flags or the environment, a `.env` file in the working directory is
//! loaded first. Without a subcommand an interactive session is started.
use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use secrecy::{ExposeSecret as _, SecretString};
use tracing_subscriber::EnvFilter;

use libris::{
    ingest::{PipelineController, reporters::ConsoleReporter},
    integrations::{
        openai::OpenAI,
        pdf::LopdfText,
        tiktoken::TikToken,
        zotero::{LibraryType, Zotero},
    },
};

mod session;

#[derive(Debug, Parser)]
#[command(name = "libris", version, about)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Embed papers from the library into the corpus
    Embed {
        /// Number of library slots to walk
        #[arg(long)]
        count: NonZeroUsize,
        /// Offset in the library to start from
        #[arg(long, default_value_t = 0)]
        start: usize,
    },
    /// Ask a question against the embedded corpus
    Ask { question: String },
}

#[derive(Debug, Args)]
struct Config {
    #[arg(long, env = "ZOTERO_USER_ID")]
    zotero_user_id: String,
    #[arg(long, env = "ZOTERO_LIBRARY_TYPE", default_value = "user")]
    zotero_library_type: LibraryType,
    #[arg(long, env = "ZOTERO_API_KEY", hide_env_values = true, value_parser = secret)]
    zotero_api_key: SecretString,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, value_parser = secret)]
    openai_api_key: SecretString,
    /// Model answering questions, also names the checkpoint
    #[arg(long, env = "LIBRIS_MODEL", default_value = "gpt-4o-mini")]
    model: String,
    #[arg(long, env = "LIBRIS_EMBED_MODEL", default_value = "text-embedding-3-small")]
    embed_model: String,
    /// Where checkpoints are stored
    #[arg(long, env = "LIBRIS_DATA_DIR", default_value = "data/processed")]
    data_dir: PathBuf,
    /// Where downloaded pdfs are stored
    #[arg(long, env = "LIBRIS_PDF_DIR", default_value = "data/pdfs")]
    pdf_dir: PathBuf,
    /// Seconds to wait after a rate limited paper
    #[arg(long, env = "LIBRIS_BACKOFF_SECS", default_value_t = 60)]
    backoff_secs: u64,
}

fn secret(value: &str) -> Result<SecretString, std::convert::Infallible> {
    Ok(SecretString::from(value.to_string()))
}

impl Config {
    fn controller(&self) -> Result<PipelineController> {
        let zotero = Zotero::builder()
            .library_id(&self.zotero_user_id)
            .library_type(self.zotero_library_type)
            .api_key(self.zotero_api_key.expose_secret())
            .storage_dir(&self.pdf_dir)
            .build()
            .context("Failed to configure Zotero")?;

        let openai = OpenAI::builder()
            .api_key(self.openai_api_key.clone())
            .embed_model(&self.embed_model)
            .build()
            .context("Failed to configure OpenAI")?;

        PipelineController::builder()
            .library(zotero)
            .engine(openai)
            .pdf_text(LopdfText)
            .token_counter(TikToken::default())
            .reporter(ConsoleReporter)
            .model(&self.model)
            .data_dir(&self.data_dir)
            .backoff(Duration::from_secs(self.backoff_secs))
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let controller = cli.config.controller()?;
    let mut corpus = controller.open().await?;

    match cli.command {
        Some(Command::Embed { count, start }) => {
            let report = controller.embed(&mut corpus, count.get(), start).await?;
            println!("{}", session::summary(&report));
        }
        Some(Command::Ask { question }) => {
            println!("{}", controller.ask(&corpus, &question).await?);
        }
        None => {
            let stdin = std::io::stdin();
            session::Session::new(stdin.lock(), std::io::stdout())
                .run(&controller, corpus)
                .await?;
        }
    }

    Ok(())
}
