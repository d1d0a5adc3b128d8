use std::path::PathBuf;
use std::sync::Arc;

use ragchat_cli::commands::ingest::{IngestOptions, ingest_files};
use ragchat_retrieval::{HashingEmbedder, RagConfig, Retriever, VectorIndex};

fn options(index_path: PathBuf, append: bool) -> IngestOptions {
    let rag = RagConfig::builder().index_path(index_path).build().unwrap();
    IngestOptions { rag, append, chunk_size: 500, chunk_overlap: 100 }
}

#[tokio::test]
async fn ingest_replaces_by_default_and_appends_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let france = dir.path().join("france.md");
    let japan = dir.path().join("japan.txt");
    std::fs::write(&france, "Paris is the capital of France.").unwrap();
    std::fs::write(&japan, "Tokyo is the capital of Japan.").unwrap();
    let index_path = dir.path().join("vector_store");
    let embedder = Arc::new(HashingEmbedder::new(128));

    let report =
        ingest_files(embedder.clone(), &[france.clone()], &options(index_path.clone(), false))
            .await
            .unwrap();
    assert_eq!((report.files, report.chunks, report.entries), (1, 1, 1));

    let report = ingest_files(embedder.clone(), &[japan.clone()], &options(index_path.clone(), true))
        .await
        .unwrap();
    assert_eq!(report.entries, 2);

    let report = ingest_files(embedder.clone(), &[japan], &options(index_path.clone(), false))
        .await
        .unwrap();
    assert_eq!(report.entries, 1);

    let index = VectorIndex::load(&index_path).unwrap();
    assert_eq!(index.len(), 1);
    let config = RagConfig::builder().score_threshold(0.2).build().unwrap();
    let docs = Retriever::new(embedder, &config)
        .retrieve(Some(&index), "What is the capital of Japan?")
        .await
        .unwrap();
    assert_eq!(docs[0].source(), Some(dir.path().join("japan.txt").display().to_string().as_str()));
}

#[tokio::test]
async fn append_without_existing_index_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "Rust has ownership and borrowing.").unwrap();

    let report = ingest_files(
        Arc::new(HashingEmbedder::new(64)),
        &[notes],
        &options(dir.path().join("missing_store"), true),
    )
    .await
    .unwrap();
    assert_eq!(report.entries, 1);
}

#[tokio::test]
async fn blank_files_alone_are_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let blank = dir.path().join("blank.txt");
    std::fs::write(&blank, "   \n").unwrap();
    let index_path = dir.path().join("vector_store");

    let result =
        ingest_files(Arc::new(HashingEmbedder::new(64)), &[blank], &options(index_path.clone(), false))
            .await;
    assert!(result.is_err());
    assert!(VectorIndex::load(&index_path).is_err());
}

#[tokio::test]
async fn failed_run_leaves_saved_index_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let france = dir.path().join("france.md");
    let japan = dir.path().join("japan.txt");
    let symbols = dir.path().join("symbols.txt");
    std::fs::write(&france, "Paris is the capital of France.").unwrap();
    std::fs::write(&japan, "Tokyo is the capital of Japan.").unwrap();
    // Non-blank, but without a single word for the embedder.
    std::fs::write(&symbols, "?! -- ...").unwrap();
    let index_path = dir.path().join("vector_store");
    let embedder = Arc::new(HashingEmbedder::new(64));

    ingest_files(embedder.clone(), &[france.clone()], &options(index_path.clone(), false))
        .await
        .unwrap();

    for append in [false, true] {
        let result = ingest_files(
            embedder.clone(),
            &[japan.clone(), symbols.clone()],
            &options(index_path.clone(), append),
        )
        .await;
        assert!(result.unwrap_err().to_string().contains("symbols.txt"));

        let index = VectorIndex::load(&index_path).unwrap();
        let sources: Vec<_> = index.iter().map(|(_, chunk, _)| chunk.source.clone()).collect();
        assert_eq!(sources, vec![Some(france.display().to_string())]);
    }
}
