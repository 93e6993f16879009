//! Seeded math knowledge base.
//!
//! Questions are encoded with [`encoder::MathFeatureEncoder`] and kept in an
//! in-memory [`vector::VectorStore`]. Lookups return only hits whose cosine
//! similarity clears the configured threshold.

pub mod encoder;
pub mod vector;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::KnowledgeConfig;
use crate::models::{KbDataset, KbEntry, KbMatch};
use encoder::MathFeatureEncoder;
use vector::VectorStore;

const SEED_DATASET: &str = include_str!("../../data/math_dataset.json");

pub struct KnowledgeBase {
    encoder: MathFeatureEncoder,
    store: VectorStore,
    similarity_threshold: f32,
    top_k: usize,
}

impl KnowledgeBase {
    /// Build the collection and load the seed questions, plus the configured
    /// dataset file when one is set.
    pub fn new(config: &KnowledgeConfig) -> Result<Self> {
        let encoder = MathFeatureEncoder::new();
        let kb = Self {
            store: VectorStore::new(encoder.dim()),
            encoder,
            similarity_threshold: config.similarity_threshold,
            top_k: config.top_k,
        };

        let seeds: KbDataset =
            serde_json::from_str(SEED_DATASET).context("Failed to parse seed dataset")?;
        let loaded = kb.add_entries(seeds.questions)?;
        tracing::info!("Loaded {loaded} seed math questions into knowledge base");

        if let Some(path) = &config.dataset_path {
            let extra = load_dataset(path)?;
            let loaded = kb.add_entries(extra.questions)?;
            tracing::info!("Loaded {loaded} math questions from {}", path.display());
        }

        Ok(kb)
    }

    /// Encode and store entries, returning how many were added.
    pub fn add_entries(&self, entries: Vec<KbEntry>) -> Result<usize> {
        let mut next_id = self.store.next_id();
        let count = entries.len();
        for entry in entries {
            let embedding = self.encoder.encode(&entry.question);
            self.store.upsert(next_id, entry, embedding)?;
            next_id += 1;
        }
        Ok(count)
    }

    /// Nearest stored questions with similarity >= the threshold, best first.
    pub fn search_similar(&self, query: &str) -> Vec<KbMatch> {
        let query_vector = self.encoder.encode(query);
        let matches: Vec<KbMatch> = self
            .store
            .search(&query_vector, self.top_k)
            .into_iter()
            .filter(|hit| hit.score >= self.similarity_threshold)
            .inspect(|hit| tracing::debug!("KB entry {} matched ({:.3})", hit.id, hit.score))
            .map(|hit| KbMatch {
                question: hit.entry.question,
                solution: hit.entry.solution,
                similarity_score: hit.score,
                topic: hit.entry.topic,
            })
            .collect();

        tracing::debug!(
            "Knowledge base lookup found {} matches above {}",
            matches.len(),
            self.similarity_threshold
        );
        matches
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

fn load_dataset(path: &Path) -> Result<KbDataset> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse dataset {}", path.display()))
}
