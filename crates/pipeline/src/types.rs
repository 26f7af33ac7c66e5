//! Shared value types for the earnings-call sentiment domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (class scores are non-negative and, when
//! derived from text, sum to one) and participate in domain computations.
//! Their serialized shapes are the artifact formats read by API consumers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{QuarterId, TranscriptName};

// ---------------------------------------------------------------------------
// Sentiment classes
// ---------------------------------------------------------------------------

/// Dominant sentiment class of a transcript section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    /// The section had no text to score.
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::NotAvailable => "N/A",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// Per-class scores for the fixed class set `{positive, neutral, negative}`.
///
/// Produced by the sentiment classifier for one chunk (a probability
/// distribution) and by the scorer for one section (the mean of the chunk
/// distributions, or all zeros when nothing was scored).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl ClassScores {
    /// Creates a score triple.
    pub fn new(positive: f64, neutral: f64, negative: f64) -> Self {
        Self {
            positive,
            neutral,
            negative,
        }
    }

    /// All three scores zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Sum of the three scores, added in `positive, neutral, negative` order.
    pub fn total(&self) -> f64 {
        self.positive + self.neutral + self.negative
    }

    /// Returns `true` if every score is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.positive == 0.0 && self.neutral == 0.0 && self.negative == 0.0
    }

    /// Divides every score by `divisor`.
    pub fn divided_by(self, divisor: f64) -> Self {
        Self {
            positive: self.positive / divisor,
            neutral: self.neutral / divisor,
            negative: self.negative / divisor,
        }
    }

    /// The class with the highest score.
    ///
    /// Ties resolve by the precedence positive > neutral > negative. All-zero
    /// scores (nothing could be scored) resolve to [`SentimentLabel::Neutral`].
    pub fn dominant_label(&self) -> SentimentLabel {
        if self.is_zero() {
            return SentimentLabel::Neutral;
        }

        let mut best = (SentimentLabel::Positive, self.positive);
        for candidate in [
            (SentimentLabel::Neutral, self.neutral),
            (SentimentLabel::Negative, self.negative),
        ] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    }
}

impl std::ops::Add for ClassScores {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            positive: self.positive + rhs.positive,
            neutral: self.neutral + rhs.neutral,
            negative: self.negative + rhs.negative,
        }
    }
}

impl std::ops::AddAssign for ClassScores {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

// ---------------------------------------------------------------------------
// Transcript sections
// ---------------------------------------------------------------------------

/// The two parts of an earnings call transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Prepared management remarks.
    Management,
    /// The question-and-answer portion.
    Qa,
}

impl Section {
    /// Both sections, in display order.
    pub const ALL: [Section; 2] = [Section::Management, Section::Qa];
}

/// Cleaned section texts for one transcript.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranscriptSections {
    pub management: String,
    pub qa: String,
}

impl TranscriptSections {
    /// Returns the text of one section.
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Management => &self.management,
            Section::Qa => &self.qa,
        }
    }

    /// Both sections joined by a blank line; the shape of the `_cleaned` file.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.management, self.qa)
    }
}

/// A transcript as retrieved from its source, before any cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTranscript {
    pub name: TranscriptName,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Sentiment records
// ---------------------------------------------------------------------------

/// Scorer output for one section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionSentiment {
    pub label: SentimentLabel,
    pub scores: ClassScores,
}

impl SectionSentiment {
    /// Result for a section without text.
    pub fn not_available() -> Self {
        Self {
            label: SentimentLabel::NotAvailable,
            scores: ClassScores::zero(),
        }
    }
}

/// Sentiment of both sections of one transcript.
///
/// This is the element type of the `sentiment_results.json` artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub file: TranscriptName,
    pub quarter: QuarterId,
    pub management_sentiment: SentimentLabel,
    pub management_scores: ClassScores,
    pub qa_sentiment: SentimentLabel,
    pub qa_scores: ClassScores,
}

impl SentimentRecord {
    /// Builds a record from the two section results.
    pub fn new(
        file: TranscriptName,
        quarter: QuarterId,
        management: SectionSentiment,
        qa: SectionSentiment,
    ) -> Self {
        Self {
            file,
            quarter,
            management_sentiment: management.label,
            management_scores: management.scores,
            qa_sentiment: qa.label,
            qa_scores: qa.scores,
        }
    }

    /// Raw scores of one section.
    pub fn scores(&self, section: Section) -> &ClassScores {
        match section {
            Section::Management => &self.management_scores,
            Section::Qa => &self.qa_scores,
        }
    }
}

/// Stable-sorts records chronologically by quarter.
///
/// Records whose quarter does not resolve keep their relative order ahead of
/// every resolved quarter.
pub fn sort_chronologically(records: &mut [SentimentRecord]) {
    records.sort_by_key(|r| r.quarter.sort_key());
}

// ---------------------------------------------------------------------------
// Quarterly shift
// ---------------------------------------------------------------------------

/// Per-quarter sentiment time series for one section.
///
/// All five vectors always have the same length and are index-aligned:
/// `quarters[i]` describes `positive[i]`, `neutral[i]`, `negative[i]` and
/// `net_sentiment[i]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuarterlyShiftSeries {
    pub quarters: Vec<QuarterId>,
    pub positive: Vec<f64>,
    pub neutral: Vec<f64>,
    pub negative: Vec<f64>,
    pub net_sentiment: Vec<f64>,
}

impl QuarterlyShiftSeries {
    /// Number of quarters in the series.
    pub fn len(&self) -> usize {
        self.quarters.len()
    }

    /// Returns `true` if the series holds no quarters.
    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }
}

/// The `quarterly_shift.json` artifact.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuarterlyShift {
    pub management: QuarterlyShiftSeries,
    pub qa: QuarterlyShiftSeries,
}

impl QuarterlyShift {
    /// Series of one section.
    pub fn series(&self, section: Section) -> &QuarterlyShiftSeries {
        match section {
            Section::Management => &self.management,
            Section::Qa => &self.qa,
        }
    }
}

// ---------------------------------------------------------------------------
// Strategic focuses
// ---------------------------------------------------------------------------

/// One strategic theme management emphasised on a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategicFocus {
    pub theme: String,
    pub summary: String,
}

/// The `strategic_focuses.json` artifact: focuses keyed by upper-cased
/// transcript name.
pub type StrategicFocuses = BTreeMap<String, Vec<StrategicFocus>>;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_label_picks_highest_class() {
        assert_eq!(
            ClassScores::new(0.1, 0.2, 0.7).dominant_label(),
            SentimentLabel::Negative
        );
        assert_eq!(
            ClassScores::new(0.2, 0.7, 0.1).dominant_label(),
            SentimentLabel::Neutral
        );
    }

    #[test]
    fn dominant_label_ties_prefer_positive_then_neutral() {
        assert_eq!(
            ClassScores::new(0.4, 0.4, 0.2).dominant_label(),
            SentimentLabel::Positive
        );
        assert_eq!(
            ClassScores::new(0.2, 0.4, 0.4).dominant_label(),
            SentimentLabel::Neutral
        );
    }

    #[test]
    fn dominant_label_of_all_zero_is_neutral() {
        assert_eq!(ClassScores::zero().dominant_label(), SentimentLabel::Neutral);
    }

    #[test]
    fn not_available_label_serializes_as_na() {
        let json = serde_json::to_string(&SentimentLabel::NotAvailable).unwrap();
        assert_eq!(json, "\"N/A\"");
        let json = serde_json::to_string(&SentimentLabel::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
    }

    #[test]
    fn sentiment_record_uses_artifact_field_names() {
        let record = SentimentRecord::new(
            TranscriptName::new("nvda-q1-2024").unwrap(),
            QuarterId::new("Q1_2024"),
            SectionSentiment {
                label: SentimentLabel::Positive,
                scores: ClassScores::new(0.6, 0.3, 0.1),
            },
            SectionSentiment::not_available(),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["file"], "nvda-q1-2024");
        assert_eq!(value["quarter"], "Q1_2024");
        assert_eq!(value["management_sentiment"], "positive");
        assert_eq!(value["management_scores"]["neutral"], 0.3);
        assert_eq!(value["qa_sentiment"], "N/A");
        assert_eq!(value["qa_scores"]["negative"], 0.0);
    }

    #[test]
    fn chronological_sort_is_stable_for_unresolved_quarters() {
        let record = |file: &str, quarter: &str| {
            SentimentRecord::new(
                TranscriptName::new(file).unwrap(),
                QuarterId::new(quarter),
                SectionSentiment::not_available(),
                SectionSentiment::not_available(),
            )
        };
        let mut records = vec![
            record("c", "Q3_2024"),
            record("a", "Unknown"),
            record("d", "Q1_2024"),
            record("b", "2023"),
        ];
        sort_chronologically(&mut records);
        let files: Vec<_> = records.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(files, vec!["a", "b", "d", "c"]);
    }
}
