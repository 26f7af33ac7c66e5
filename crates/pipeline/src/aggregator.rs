//! Quarterly sentiment shift aggregation.
//!
//! Turns the ordered sentiment records into one [`QuarterlyShiftSeries`] per
//! section. Proportions are normalized by each record's score total, while net
//! sentiment is the difference of the *raw* positive and negative scores.
//! Input order is preserved; ordering is the caller's responsibility.

use crate::{ClassScores, QuarterId, QuarterlyShift, QuarterlyShiftSeries, Section, SentimentRecord};

/// Substituted for a zero score total so empty sections normalize to zero.
pub const ZERO_TOTAL_EPSILON: f64 = 1e-6;

/// Builds both section series from records already in chronological order.
pub fn aggregate(records: &[SentimentRecord]) -> QuarterlyShift {
    QuarterlyShift {
        management: build_series(records, Section::Management),
        qa: build_series(records, Section::Qa),
    }
}

/// Builds the series for one section, one entry per record, in input order.
pub fn build_series(records: &[SentimentRecord], section: Section) -> QuarterlyShiftSeries {
    let mut series = QuarterlyShiftSeries {
        quarters: Vec::with_capacity(records.len()),
        positive: Vec::with_capacity(records.len()),
        neutral: Vec::with_capacity(records.len()),
        negative: Vec::with_capacity(records.len()),
        net_sentiment: Vec::with_capacity(records.len()),
    };
    for record in records {
        push_quarter(&mut series, &record.quarter, record.scores(section));
    }
    series
}

fn push_quarter(series: &mut QuarterlyShiftSeries, quarter: &QuarterId, raw: &ClassScores) {
    let total = match raw.total() {
        t if t == 0.0 => ZERO_TOTAL_EPSILON,
        t => t,
    };

    series.quarters.push(quarter.clone());
    series.positive.push(raw.positive / total);
    series.neutral.push(raw.neutral / total);
    series.negative.push(raw.negative / total);
    series.net_sentiment.push(raw.positive - raw.negative);
}
