//! Persistent, mergeable vector index with brute-force similarity search.
//!
//! [`VectorIndex`] keeps its entries in insertion order. Every entry gets a
//! sequential [`DocumentId`] when it is inserted, and entries are never
//! mutated or removed afterwards. Growing the index with
//! [`merge`](VectorIndex::merge) only touches the new batch.
//!
//! On disk an index is a directory holding two files:
//!
//! - `index.json` - format version, dimensionality, the SHA-256 of the
//!   vectors file, and the ordered `(id, chunk)` entries
//! - `index.vectors` - the raw little-endian `f32` vectors in entry order
//!
//! Vectors are stored as raw bits so that `load(save(index)) == index` holds exactly.
//! The digest ties the two files together: a manifest is only accepted next
//! to the vectors file it was written with.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::document::{Chunk, DocumentId, EmbeddedChunk, RetrievedDocument};
use crate::embedding::validate_vector;
use crate::error::{RagError, Result};

const MANIFEST_FILE: &str = "index.json";
const VECTORS_FILE: &str = "index.vectors";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    id: DocumentId,
    chunk: Chunk,
    vector: Vec<f32>,
    norm: f32,
}

impl Entry {
    fn new(id: DocumentId, chunk: Chunk, vector: Vec<f32>) -> Self {
        let norm = l2_norm(&vector);
        Self { id, chunk, vector, norm }
    }
}

/// An append-only nearest-neighbor index over embedded chunks.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_retrieval::{Chunk, EmbeddedChunk, VectorIndex};
///
/// let mut index = VectorIndex::create(vec![EmbeddedChunk::new(Chunk::new("a"), vec![1.0, 0.0])])?;
/// index.merge(vec![EmbeddedChunk::new(Chunk::new("b"), vec![0.0, 1.0])])?;
/// let hits = index.search(&[1.0, 0.0], 1)?;
/// assert_eq!(hits[0].chunk.text, "a");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimensions: usize,
    next_id: u64,
    entries: Vec<Entry>,
}

impl VectorIndex {
    /// Build a fresh index from a non-empty batch.
    ///
    /// The dimensionality of the index is taken from the first vector.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyInput`] if `chunks` is empty
    /// - [`RagError::DimensionMismatch`] if the vectors disagree on length
    /// - [`RagError::Embedding`] if a vector is non-finite or zero
    pub fn create(chunks: Vec<EmbeddedChunk>) -> Result<Self> {
        let dimensions = chunks.first().map(|c| c.vector.len()).ok_or(RagError::EmptyInput)?;
        if dimensions == 0 {
            return Err(RagError::embedding("index", "vectors must have at least one dimension"));
        }
        let mut index = Self { dimensions, next_id: 0, entries: Vec::with_capacity(chunks.len()) };
        index.merge(chunks)?;
        info!(entries = index.len(), dimensions, "created vector index");
        Ok(index)
    }

    /// Append a batch of embedded chunks.
    ///
    /// Existing entries are left untouched and the cost is linear in the
    /// batch size. The whole batch is validated before anything is
    /// appended, so on error the index is unchanged.
    ///
    /// # Errors
    ///
    /// - [`RagError::DimensionMismatch`] if any vector length differs from the index
    /// - [`RagError::Embedding`] if a vector is non-finite or zero
    pub fn merge(&mut self, chunks: Vec<EmbeddedChunk>) -> Result<()> {
        for embedded in &chunks {
            if embedded.vector.len() != self.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: embedded.vector.len(),
                });
            }
            validate_vector("index", &embedded.vector, self.dimensions)?;
        }

        let added = chunks.len();
        self.entries.reserve(added);
        for EmbeddedChunk { chunk, vector } in chunks {
            let id = DocumentId(self.next_id);
            self.next_id += 1;
            self.entries.push(Entry::new(id, chunk, vector));
        }
        debug!(added, total = self.entries.len(), "merged batch into vector index");
        Ok(())
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality shared by every vector in the index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Look up an entry by id.
    pub fn get(&self, id: DocumentId) -> Option<(&Chunk, &[f32])> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|pos| (&self.entries[pos].chunk, self.entries[pos].vector.as_slice()))
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (DocumentId, &Chunk, &[f32])> {
        self.entries.iter().map(|e| (e.id, &e.chunk, e.vector.as_slice()))
    }

    /// Return up to `k` entries closest to `query`, by descending score.
    ///
    /// Equal scores keep insertion order (earlier entries first).
    ///
    /// # Errors
    ///
    /// - [`RagError::IndexEmpty`] if the index holds zero entries
    /// - [`RagError::DimensionMismatch`] if `query` has the wrong length
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
        if self.entries.is_empty() {
            return Err(RagError::IndexEmpty);
        }
        if query.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, relevance(entry, query, query_norm)))
            .collect();

        // Score descending, then position ascending: a total order, so the
        // partial selection below is deterministic.
        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let entry = &self.entries[pos];
                RetrievedDocument { id: entry.id, chunk: entry.chunk.clone(), score }
            })
            .collect())
    }

    /// Persist the index into the directory `location`.
    ///
    /// Both files are written to temporary names first and renamed into
    /// place, vectors before manifest. A crash between the two renames
    /// leaves a pair whose digests disagree, which [`load`](VectorIndex::load)
    /// rejects instead of pairing chunks with the wrong vectors.
    pub fn save(&self, location: impl AsRef<Path>) -> Result<()> {
        let dir = location.as_ref();
        fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;

        let vector_bytes: Vec<u8> = self
            .entries
            .iter()
            .flat_map(|e| e.vector.iter().flat_map(|v| v.to_le_bytes()))
            .collect();
        let manifest = ManifestRef {
            version: FORMAT_VERSION,
            dimensions: self.dimensions,
            next_id: self.next_id,
            vectors_sha256: sha256_hex(&vector_bytes),
            entries: self
                .entries
                .iter()
                .map(|e| EntryRef { id: e.id, chunk: &e.chunk })
                .collect(),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

        write_atomically(&dir.join(VECTORS_FILE), &vector_bytes)?;
        write_atomically(&dir.join(MANIFEST_FILE), &manifest_bytes)?;

        info!(path = %dir.display(), entries = self.len(), "saved vector index");
        Ok(())
    }

    /// Load an index previously written by [`save`](VectorIndex::save).
    ///
    /// # Errors
    ///
    /// - [`RagError::IndexNotFound`] if `location` holds no index
    /// - [`RagError::CorruptIndex`] if the two files disagree or fail validation
    pub fn load(location: impl AsRef<Path>) -> Result<Self> {
        let dir = location.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(RagError::IndexNotFound { location: Some(dir.to_path_buf()) });
        }

        let manifest_bytes =
            fs::read(&manifest_path).map_err(|source| io_error(&manifest_path, source))?;
        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)?;
        let corrupt =
            |message: String| RagError::CorruptIndex { path: dir.to_path_buf(), message };

        if manifest.version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {}", manifest.version)));
        }
        if manifest.dimensions == 0 {
            return Err(corrupt("dimensions must be non-zero".to_string()));
        }

        let vectors_path = dir.join(VECTORS_FILE);
        let vector_bytes =
            fs::read(&vectors_path).map_err(|source| io_error(&vectors_path, source))?;
        let row_bytes = manifest.dimensions * std::mem::size_of::<f32>();
        let expected = manifest.entries.len() * row_bytes;
        if vector_bytes.len() != expected {
            return Err(corrupt(format!(
                "expected {expected} bytes of vectors for {} entries, found {}",
                manifest.entries.len(),
                vector_bytes.len()
            )));
        }
        if sha256_hex(&vector_bytes) != manifest.vectors_sha256 {
            return Err(corrupt("vectors file does not match the manifest digest".to_string()));
        }

        let mut entries = Vec::with_capacity(manifest.entries.len());
        let mut previous: Option<DocumentId> = None;
        for (record, row) in manifest.entries.into_iter().zip(vector_bytes.chunks_exact(row_bytes))
        {
            if previous.is_some_and(|p| p >= record.id) || record.id.0 >= manifest.next_id {
                return Err(corrupt(format!("entry id {} is out of order", record.id)));
            }
            previous = Some(record.id);
            let vector = row
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            entries.push(Entry::new(record.id, record.chunk, vector));
        }

        info!(path = %dir.display(), entries = entries.len(), "loaded vector index");
        Ok(Self { dimensions: manifest.dimensions, next_id: manifest.next_id, entries })
    }
}

#[derive(Serialize)]
struct ManifestRef<'a> {
    version: u32,
    dimensions: usize,
    next_id: u64,
    vectors_sha256: String,
    entries: Vec<EntryRef<'a>>,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    id: DocumentId,
    chunk: &'a Chunk,
}

#[derive(Deserialize)]
struct Manifest {
    version: u32,
    dimensions: usize,
    next_id: u64,
    vectors_sha256: String,
    entries: Vec<EntryRecord>,
}

#[derive(Deserialize)]
struct EntryRecord {
    id: DocumentId,
    chunk: Chunk,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Map cosine similarity onto `[0, 1]` as the euclidean relevance of unit
/// vectors: `1 - d / sqrt(2)` where `d = sqrt(2 - 2 cos)`.
///
/// `d` is the plain L2 distance. Stores that report squared L2 distance
/// score the same pair as `1 - d² / sqrt(2)`, so thresholds tuned against
/// them do not carry over one-to-one.
fn relevance(entry: &Entry, query: &[f32], query_norm: f32) -> f32 {
    if entry.norm == 0.0 || query_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = entry.vector.iter().zip(query).map(|(a, b)| a * b).sum();
    let cosine = (dot / (entry.norm * query_norm)).clamp(-1.0, 1.0);
    let distance = (2.0 - 2.0 * cosine).max(0.0).sqrt();
    (1.0 - distance / std::f32::consts::SQRT_2).clamp(0.0, 1.0)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> RagError {
    RagError::Io { path: path.to_path_buf(), source }
}
