use anyhow::Result;
use parking_lot::RwLock;

use crate::models::KbEntry;

/// A stored vector entry
#[derive(Debug, Clone)]
struct VectorEntry {
    id: u64,
    entry: KbEntry,
    embedding: Vec<f32>,
}

/// In-memory vector collection with cosine similarity search.
pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    dim: usize,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: u64,
    pub entry: KbEntry,
    pub score: f32,
}

impl VectorStore {
    /// Create an empty collection accepting vectors of exactly `dim` dimensions.
    pub fn new(dim: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            dim,
        }
    }

    /// Insert a point, replacing any existing point with the same id.
    pub fn upsert(&self, id: u64, entry: KbEntry, embedding: Vec<f32>) -> Result<()> {
        if embedding.len() != self.dim {
            anyhow::bail!(
                "Vector dimension mismatch: expected {}, got {}",
                self.dim,
                embedding.len()
            );
        }

        let mut entries = self.entries.write();
        let point = VectorEntry {
            id,
            entry,
            embedding,
        };
        match entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = point,
            None => entries.push(point),
        }
        Ok(())
    }

    /// Search by cosine similarity against a query embedding.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<VectorHit> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(score, e)| VectorHit {
                id: e.id,
                entry: e.entry.clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.entries
            .read()
            .iter()
            .map(|e| e.id + 1)
            .max()
            .unwrap_or(0)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
