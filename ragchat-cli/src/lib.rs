//! # ragchat-cli
//!
//! The `ragchat` command: ingest text files into a persistent vector
//! index, then chat with them.
//!
//! ```text
//! ragchat ingest docs/*.md            # replace the index
//! ragchat ingest --append notes.txt   # add to it
//! ragchat chat -k 3 --score-threshold 0.3
//! ragchat check                       # ping both endpoints
//! ```
//!
//! Endpoints and keys come from the environment (a `.env` file is read
//! first): `AZURE_INFERENCE_ENDPOINT`, `AZURE_INFERENCE_CREDENTIAL` and
//! `AZURE_TSUZUMI_MODEL` for the chat model, and `AZURE_OPENAI_ENDPOINT`,
//! `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_EMBEDDING_MODEL` and
//! `AZURE_OPENAI_EMBEDDING_VERSION` for embeddings.

pub mod cli;
pub mod commands;
pub mod display;
pub mod settings;

use anyhow::Result;

pub use cli::{Cli, Command};

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ingest(args) => commands::ingest::run(args).await,
        Command::Chat(args) => commands::chat::run(args).await,
        Command::Check(args) => commands::check::run(args).await,
    }
}
