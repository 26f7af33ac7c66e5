//! Section-level sentiment scoring.
//!
//! A section is split into sentences, the sentences are grouped into chunks,
//! and each chunk is classified independently. The section score is the mean
//! of the chunk distributions over the chunks that were classified
//! successfully; a failing chunk is skipped and does not count toward the mean.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ClassScores, ClassifierError, SectionSentiment, SentimentClassifier};

/// Allowed deviation of a chunk distribution's sum from one.
const DISTRIBUTION_TOLERANCE: f64 = 1e-3;

/// Bounds on how much of a section is sent to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringLimits {
    /// Consecutive sentences per chunk.
    pub chunk_sentences: usize,
    /// Chunks scored per section; later chunks are ignored.
    pub max_chunks: usize,
    /// Characters of each chunk passed to the classifier.
    pub max_chunk_chars: usize,
}

impl Default for ScoringLimits {
    fn default() -> Self {
        Self {
            chunk_sentences: 5,
            max_chunks: 40,
            max_chunk_chars: 512,
        }
    }
}

/// Scores transcript sections with a [`SentimentClassifier`].
#[derive(Clone)]
pub struct SentimentScorer {
    classifier: Arc<dyn SentimentClassifier>,
    limits: ScoringLimits,
}

impl SentimentScorer {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, limits: ScoringLimits) -> Self {
        Self { classifier, limits }
    }

    /// Scores one section of text.
    ///
    /// Blank text yields [`SectionSentiment::not_available`] without calling
    /// the classifier. Text whose chunks all fail classification yields zero
    /// scores labelled neutral.
    pub async fn score(&self, text: &str) -> SectionSentiment {
        if text.trim().is_empty() {
            return SectionSentiment::not_available();
        }

        let sentences = split_sentences(text);
        let chunks = chunk_sentences(&sentences, self.limits.chunk_sentences);

        let mut sum = ClassScores::zero();
        let mut scored = 0usize;
        for (index, chunk) in chunks.iter().take(self.limits.max_chunks).enumerate() {
            let input = truncate_chars(chunk, self.limits.max_chunk_chars);
            let outcome = self
                .classifier
                .classify(input)
                .await
                .and_then(validate_distribution);
            match outcome {
                Ok(distribution) => {
                    sum += distribution;
                    scored += 1;
                }
                Err(e) => {
                    debug!(chunk = index, error = %e, "Skipping chunk that failed classification");
                }
            }
        }

        let scores = if scored == 0 {
            ClassScores::zero()
        } else {
            sum.divided_by(scored as f64)
        };

        debug!(
            chunks = chunks.len(),
            scored,
            positive = scores.positive,
            neutral = scores.neutral,
            negative = scores.negative,
            "Scored section"
        );

        SectionSentiment {
            label: scores.dominant_label(),
            scores,
        }
    }
}

/// Splits text into sentences.
///
/// A sentence ends at `.`, `!` or `?` immediately followed by whitespace.
/// Surrounding whitespace is trimmed and empty fragments are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(_, next)) = chars.peek() {
            if next.is_whitespace() {
                let end = i + c.len_utf8();
                push_trimmed(&mut sentences, &text[start..end]);
                start = end;
            }
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, fragment: &'a str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        sentences.push(fragment);
    }
}

/// Groups consecutive sentences into chunks of `size`, joined by a space.
/// The last chunk may be shorter.
pub fn chunk_sentences(sentences: &[&str], size: usize) -> Vec<String> {
    sentences
        .chunks(size.max(1))
        .map(|group| group.join(" "))
        .collect()
}

/// Returns at most the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Accepts a classifier output only if it is a probability distribution.
fn validate_distribution(scores: ClassScores) -> Result<ClassScores, ClassifierError> {
    let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    let valid = in_range(scores.positive)
        && in_range(scores.neutral)
        && in_range(scores.negative)
        && (scores.total() - 1.0).abs() <= DISTRIBUTION_TOLERANCE;

    if valid {
        Ok(scores)
    } else {
        Err(ClassifierError::InvalidDistribution {
            positive: scores.positive,
            neutral: scores.neutral,
            negative: scores.negative,
        })
    }
}
