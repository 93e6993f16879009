use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{FeedbackReceipt, FeedbackRecord, FeedbackRequest, FeedbackStats, Sentiment};

const POSITIVE_WORDS: &[&str] = &[
    "correct", "right", "great", "good", "helpful", "clear", "thanks", "thank", "excellent",
    "perfect", "awesome", "love", "useful",
];
const NEGATIVE_WORDS: &[&str] = &[
    "wrong", "incorrect", "error", "mistake", "bad", "confusing", "unclear", "useless",
    "missing", "poor", "hate", "broken",
];
const NEGATIONS: &[&str] = &["not", "isn't", "wasn't", "never", "no", "don't", "didn't"];

/// Records human feedback on solutions. Nothing is learned from it; records
/// are kept for review and aggregate statistics.
pub struct FeedbackAgent {
    records: RwLock<Vec<FeedbackRecord>>,
    persist_path: Option<PathBuf>,
    /// Serializes writers of the shared temp file.
    persist_lock: Mutex<()>,
}

impl FeedbackAgent {
    /// Memory-only store.
    pub fn in_memory() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            persist_path: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Store backed by a JSON file, loading any records already in it.
    pub fn open(path: PathBuf) -> Result<Self> {
        let records = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read feedback file {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse feedback file {}", path.display()))?
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Vec::new()
        };

        Ok(Self {
            records: RwLock::new(records),
            persist_path: Some(path),
            persist_lock: Mutex::new(()),
        })
    }

    pub fn process_feedback(&self, req: FeedbackRequest) -> FeedbackReceipt {
        let sentiment = classify_sentiment(&req.feedback);
        let record = FeedbackRecord {
            id: Uuid::new_v4(),
            question: req.question,
            original_solution: req.original_solution,
            feedback: req.feedback,
            improved_solution: req.improved_solution.filter(|s| !s.trim().is_empty()),
            sentiment,
            created_at: Utc::now(),
        };
        let feedback_id = record.id;
        let has_improvement = record.improved_solution.is_some();

        self.records.write().push(record);
        self.persist();

        tracing::info!("Recorded {sentiment:?} feedback {feedback_id}");

        let message = match (sentiment, has_improvement) {
            (_, true) => "Thank you! Your improved solution has been recorded for review.",
            (Sentiment::Positive, false) => "Thank you for the positive feedback!",
            (Sentiment::Negative, false) => {
                "Thank you for reporting this. The solution has been flagged for review."
            }
            (Sentiment::Neutral, false) => "Thank you for your feedback.",
        };

        FeedbackReceipt {
            status: "feedback_recorded".to_string(),
            feedback_id,
            sentiment,
            message: message.to_string(),
        }
    }

    pub fn stats(&self) -> FeedbackStats {
        let records = self.records.read();
        let mut stats = FeedbackStats {
            total_feedback: records.len(),
            ..FeedbackStats::default()
        };
        let mut by_source = BTreeMap::new();

        for record in records.iter() {
            match record.sentiment {
                Sentiment::Positive => stats.positive += 1,
                Sentiment::Negative => stats.negative += 1,
                Sentiment::Neutral => stats.neutral += 1,
            }
            if record.improved_solution.is_some() {
                stats.improvements_suggested += 1;
            }
            let source = record
                .original_solution
                .get("source")
                .and_then(|s| s.as_str())
                .unwrap_or("unknown");
            *by_source.entry(source.to_string()).or_insert(0) += 1;
        }

        if stats.total_feedback > 0 {
            stats.satisfaction_rate = stats.positive as f32 / stats.total_feedback as f32;
        }
        stats.by_source = by_source;
        stats
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Persist all records (atomic write via temp file + rename).
    fn persist(&self) {
        let Some(path) = &self.persist_path else {
            return;
        };
        let _guard = self.persist_lock.lock();
        let records = self.records.read();
        let result = serde_json::to_string_pretty(&*records)
            .context("Failed to serialize feedback")
            .and_then(|data| {
                let tmp_path = path.with_extension("json.tmp");
                std::fs::write(&tmp_path, data)?;
                std::fs::rename(&tmp_path, path)?;
                Ok(())
            });
        if let Err(e) = result {
            tracing::warn!("Failed to persist feedback to {}: {e:#}", path.display());
        }
    }
}

/// Keyword sentiment. A positive word directly after a negation counts as
/// negative ("not helpful").
pub fn classify_sentiment(feedback: &str) -> Sentiment {
    let lower = feedback.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();

    let mut positive = 0usize;
    let mut negative = 0usize;
    for (i, word) in words.iter().enumerate() {
        let negated = i > 0 && NEGATIONS.contains(&words[i - 1]);
        if POSITIVE_WORDS.contains(word) {
            if negated {
                negative += 1;
            } else {
                positive += 1;
            }
        } else if NEGATIVE_WORDS.contains(word) {
            if negated {
                positive += 1;
            } else {
                negative += 1;
            }
        }
    }

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}
