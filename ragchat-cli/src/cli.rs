//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ragchat_retrieval::config::DEFAULT_INDEX_PATH;
use ragchat_telemetry::LogFormat;

use crate::settings::{EmbeddingSettings, GenerationSettings};

/// Chat with your documents.
#[derive(Debug, Parser)]
#[command(name = "ragchat", version, about, propagate_version = true)]
pub struct Cli {
    /// Log line format (`pretty` or `json`); levels come from RUST_LOG.
    #[arg(long, global = true, env = "RAGCHAT_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split, embed and index text files
    Ingest(IngestArgs),
    /// Start an interactive chat over the indexed documents
    Chat(ChatArgs),
    /// Verify that both model endpoints answer
    Check(CheckArgs),
}

#[derive(Debug, Clone, Args)]
pub struct IndexArgs {
    /// Directory of the persisted vector index
    #[arg(long, env = "RAGCHAT_INDEX_PATH", default_value = DEFAULT_INDEX_PATH)]
    pub index_path: PathBuf,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Text or Markdown files to ingest
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Add to the existing index instead of replacing it
    #[arg(long)]
    pub append: bool,

    /// Maximum characters per chunk
    #[arg(long, default_value_t = 500)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = 100)]
    pub chunk_overlap: usize,

    /// Texts per embedding request
    #[arg(long, default_value_t = 16)]
    pub embed_batch_size: usize,

    #[command(flatten)]
    pub index: IndexArgs,

    #[command(flatten)]
    pub embedding: EmbeddingSettings,
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Minimum relevance score (0 to 1) for a document to be used
    #[arg(long, default_value_t = 0.3)]
    pub score_threshold: f32,

    /// Maximum number of documents retrieved per question
    #[arg(short = 'k', long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..=10))]
    pub top_k: u16,

    /// Number of messages kept as conversation history
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(5..=50))]
    pub message_limit: u16,

    /// Abort the turn when a follow-up cannot be rewritten, instead of
    /// searching with the raw question
    #[arg(long)]
    pub strict_contextualize: bool,

    #[command(flatten)]
    pub index: IndexArgs,

    #[command(flatten)]
    pub embedding: EmbeddingSettings,

    #[command(flatten)]
    pub generation: GenerationSettings,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub embedding: EmbeddingSettings,

    #[command(flatten)]
    pub generation: GenerationSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("ragchat").chain(args.iter().copied()))
    }

    #[test]
    fn ingest_defaults() {
        let cli = parse(&["ingest", "a.txt", "b.md"]).unwrap();
        let Command::Ingest(args) = cli.command else { panic!("expected ingest") };
        assert_eq!(args.files.len(), 2);
        assert!(!args.append);
        assert_eq!((args.chunk_size, args.chunk_overlap, args.embed_batch_size), (500, 100, 16));
    }

    #[test]
    fn ingest_requires_files() {
        assert!(parse(&["ingest"]).is_err());
    }

    #[test]
    fn chat_limits_are_enforced() {
        assert!(parse(&["chat", "-k", "11"]).is_err());
        assert!(parse(&["chat", "--message-limit", "4"]).is_err());

        let cli = parse(&["chat", "-k", "5", "--score-threshold", "0.2"]).unwrap();
        let Command::Chat(args) = cli.command else { panic!("expected chat") };
        assert_eq!(args.top_k, 5);
        assert_eq!(args.message_limit, 10);
        assert!(!args.strict_contextualize);
    }

    #[test]
    fn log_format_is_global() {
        let cli = parse(&["check", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
