//! Property tests for the vector index laws: exact persistence, additive
//! merge, and threshold monotonicity of retrieval.

use std::sync::Arc;

use proptest::prelude::*;
use ragchat_retrieval::{
    Chunk, EmbeddedChunk, HashingEmbedder, RagConfig, Retriever, VectorIndex,
};

const DIM: usize = 16;

/// Generate a non-zero embedding of the given dimension.
fn arb_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim)
        .prop_filter("non-zero embedding", |v| v.iter().any(|x| x.abs() > 1e-3))
}

/// Generate an embedded chunk, sometimes without a source.
fn arb_embedded_chunk(dim: usize) -> impl Strategy<Value = EmbeddedChunk> {
    ("[a-z ]{1,30}", proptest::option::of("[a-z]{3,8}"), arb_embedding(dim)).prop_map(
        |(text, source, vector)| {
            let mut chunk = Chunk::new(text);
            chunk.source = source;
            EmbeddedChunk::new(chunk, vector)
        },
    )
}

fn arb_batch(dim: usize) -> impl Strategy<Value = Vec<EmbeddedChunk>> {
    proptest::collection::vec(arb_embedded_chunk(dim), 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Saving then loading yields the same index and identical search
    /// results (ids, scores, order) for any query.
    #[test]
    fn save_load_round_trip_preserves_search(
        first in arb_batch(DIM),
        second in arb_batch(DIM),
        query in arb_embedding(DIM),
        k in 1usize..30,
    ) {
        let mut index = VectorIndex::create(first).unwrap();
        index.merge(second).unwrap();

        let dir = tempfile::tempdir().unwrap();
        index.save(dir.path()).unwrap();
        let loaded = VectorIndex::load(dir.path()).unwrap();

        prop_assert_eq!(&loaded, &index);
        prop_assert_eq!(loaded.search(&query, k).unwrap(), index.search(&query, k).unwrap());
    }

    /// Merging B into an index built from A finds exactly what a fresh
    /// index over A ++ B finds.
    #[test]
    fn merge_matches_fresh_create(
        a in arb_batch(DIM),
        b in arb_batch(DIM),
        query in arb_embedding(DIM),
        k in 1usize..30,
    ) {
        let mut merged = VectorIndex::create(a.clone()).unwrap();
        merged.merge(b.clone()).unwrap();

        let mut all = a;
        all.extend(b);
        let total = all.len();
        let fresh = VectorIndex::create(all).unwrap();

        prop_assert_eq!(merged.len(), total);
        let k = k.min(total);
        prop_assert_eq!(merged.search(&query, k).unwrap(), fresh.search(&query, k).unwrap());
    }

    /// Search results are bounded by k and ordered by descending score.
    #[test]
    fn search_is_bounded_and_ordered(
        batch in arb_batch(DIM),
        query in arb_embedding(DIM),
        k in 1usize..30,
    ) {
        let count = batch.len();
        let index = VectorIndex::create(batch).unwrap();
        let results = index.search(&query, k).unwrap();

        prop_assert_eq!(results.len(), k.min(count));
        for window in results.windows(2) {
            prop_assert!(window[0].score >= window[1].score);
            if window[0].score == window[1].score {
                prop_assert!(window[0].id < window[1].id);
            }
        }
        for result in &results {
            prop_assert!((0.0..=1.0).contains(&result.score));
        }
    }

    /// Raising the score threshold never grows the retrieved set.
    #[test]
    fn raising_threshold_never_adds_results(
        texts in proptest::collection::vec("[a-e]{1,3}( [a-e]{1,3}){0,4}", 1..10),
        query in "[a-e]{1,3}( [a-e]{1,3}){0,3}",
        low in 0.0f32..=1.0,
        high in 0.0f32..=1.0,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (loose, strict) = rt.block_on(async {
            let embedder = Arc::new(HashingEmbedder::new(DIM));
            let mut embedded = Vec::new();
            for text in &texts {
                let vector = ragchat_retrieval::EmbeddingProvider::embed(embedder.as_ref(), text)
                    .await
                    .unwrap();
                embedded.push(EmbeddedChunk::new(Chunk::new(text.clone()), vector));
            }
            let index = VectorIndex::create(embedded).unwrap();

            let retrieve = |threshold: f32| {
                let config = RagConfig::builder().top_k(5).score_threshold(threshold).build().unwrap();
                Retriever::new(embedder.clone(), &config)
            };
            let loose = retrieve(low).retrieve(Some(&index), &query).await.unwrap();
            let strict = retrieve(high).retrieve(Some(&index), &query).await.unwrap();
            (loose, strict)
        });

        prop_assert!(strict.len() <= loose.len());
        prop_assert!(strict.iter().all(|d| loose.contains(d)));
    }
}
