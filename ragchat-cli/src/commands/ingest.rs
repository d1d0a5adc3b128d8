//! `ragchat ingest`: split files, embed them, and persist the index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use ragchat_retrieval::{
    Chunk, EmbeddingProvider, FixedSizeSplitter, IngestionPipeline, RagConfig, TextSplitter,
    VectorIndex,
};
use tracing::{error, info, warn};

use crate::cli::IngestArgs;

/// File extensions read as plain text.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Options of one ingest run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Index location and embedding batch size.
    pub rag: RagConfig,
    pub append: bool,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// What an ingest run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub chunks: usize,
    pub entries: usize,
}

impl TryFrom<&IngestArgs> for IngestOptions {
    type Error = anyhow::Error;

    fn try_from(args: &IngestArgs) -> Result<Self> {
        let rag = RagConfig::builder()
            .index_path(&args.index.index_path)
            .embed_batch_size(args.embed_batch_size)
            .build()?;
        Ok(Self {
            rag,
            append: args.append,
            chunk_size: args.chunk_size,
            chunk_overlap: args.chunk_overlap,
        })
    }
}

pub async fn run(args: IngestArgs) -> Result<()> {
    let options = IngestOptions::try_from(&args)?;
    let embedder = args.embedding.build().context("embedding endpoint is not configured")?;
    let report = ingest_files(embedder, &args.files, &options).await?;
    println!(
        "Indexed {} chunk(s) from {} file(s); the index now holds {} entries.",
        report.chunks, report.files, report.entries
    );
    Ok(())
}

/// Read, split, and embed `files` one file per batch, then save the index.
///
/// The index is saved only once every file has been embedded. A failing
/// file stops the run and leaves the index on disk as it was.
pub async fn ingest_files(
    embedder: Arc<dyn EmbeddingProvider>,
    files: &[PathBuf],
    options: &IngestOptions,
) -> Result<IngestReport> {
    let index_path = &options.rag.index_path;
    let splitter = FixedSizeSplitter::new(options.chunk_size, options.chunk_overlap)?;
    let mut pipeline = IngestionPipeline::from_config(embedder, &options.rag);
    if options.append {
        if let Some(existing) = load_existing(index_path)? {
            pipeline = pipeline.with_index(existing);
        }
    }

    let mut report = IngestReport { files: 0, chunks: 0, entries: 0 };
    for file in files {
        let chunks = read_chunks(file, &splitter)?;
        if chunks.is_empty() {
            warn!(file = %file.display(), "no text found; skipping");
            continue;
        }

        let count = chunks.len();
        let index = pipeline.ingest(chunks).await.map_err(|e| {
            error!(file = %file.display(), error = %e, "ingestion stopped; index left unchanged");
            anyhow::Error::new(e).context(format!("failed to ingest {}", file.display()))
        })?;
        info!(file = %file.display(), chunks = count, entries = index.len(), "file ingested");
        report.files += 1;
        report.chunks += count;
    }

    let Some(index) = pipeline.index() else {
        bail!("no text could be read from the given files");
    };
    report.entries = index.len();
    pipeline
        .save(index_path)
        .with_context(|| format!("failed to save index to {}", index_path.display()))?;
    info!(path = %index_path.display(), entries = report.entries, "index saved");
    Ok(report)
}

fn load_existing(path: &Path) -> Result<Option<VectorIndex>> {
    match VectorIndex::load(path) {
        Ok(index) => {
            info!(path = %path.display(), entries = index.len(), "appending to existing index");
            Ok(Some(index))
        }
        Err(e) if e.is_missing_index() => {
            warn!(path = %path.display(), "no index to append to; creating a new one");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Split one file into chunks whose source is the file path.
pub fn read_chunks(path: &Path, splitter: &dyn TextSplitter) -> Result<Vec<Chunk>> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    if !extension.as_deref().is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e)) {
        bail!(
            "unsupported file type: {} (expected one of {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(splitter.split(&text, Some(&path.display().to_string())))
}
