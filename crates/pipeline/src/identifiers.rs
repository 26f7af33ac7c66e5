//! Newtype domain identifiers.
//!
//! Run ids, transcript names and quarter labels each get their own type, so a
//! [`TranscriptName`] cannot be passed where a [`QuarterId`] is expected.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Non-empty string newtypes with `new`, `as_str` and `Display`.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// UUID-backed identifiers (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline execution run (one accepted trigger).
///
/// Generated fresh for every accepted trigger; attached to every span and
/// log event of the run so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-backed identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// Base name of one earnings call transcript, without directory or extension
    /// (e.g. `"nvidia-nvda-q2-2025-earnings-call-transcript"`).
    ///
    /// Every artifact derived from a transcript is keyed by this name.
    TranscriptName
}

impl TranscriptName {
    /// Returns `true` if the name is usable as a single path component.
    ///
    /// Names containing separators, parent references or control characters
    /// are rejected by the stores.
    pub fn is_plain(&self) -> bool {
        is_plain_file_name(&self.0)
    }
}

/// Returns `true` if `name` is a bare file name: non-empty, no path separators,
/// not `.` or `..`, and no control characters.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

// ---------------------------------------------------------------------------
// Quarter identifiers
// ---------------------------------------------------------------------------

static QUARTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)q([1-4])-([0-9]{4})").expect("literal pattern compiles"));
static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("literal pattern compiles"));

/// A fiscal-period identifier such as `"Q2_2024"`.
///
/// Used as the aggregation key across the pipeline. Identifiers that could not
/// be resolved to a quarter keep whatever label was derived (a bare year, or
/// `"Unknown"`) and sort before every resolved quarter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuarterId(String);

impl QuarterId {
    /// Label used when neither a quarter nor a year can be found.
    pub const UNKNOWN: &'static str = "Unknown";

    /// Wraps an already-normalized label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Derives the quarter from a transcript base name.
    ///
    /// The first case-insensitive `q<1-4>-<yyyy>` occurrence yields
    /// `Q<n>_<yyyy>`; failing that, the first run of four digits yields the
    /// bare year; failing that, [`QuarterId::UNKNOWN`].
    pub fn from_file_stem(stem: &str) -> Self {
        if let Some(caps) = QUARTER_PATTERN.captures(stem) {
            return Self(format!("Q{}_{}", &caps[1], &caps[2]));
        }
        match YEAR_PATTERN.find(stem) {
            Some(year) => Self(year.as_str().to_string()),
            None => Self(Self::UNKNOWN.to_string()),
        }
    }

    /// Returns the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Chronological sort key `(year, quarter)`.
    ///
    /// Only `Q<n>_<yyyy>` labels resolve; everything else maps to `(0, 0)`.
    pub fn sort_key(&self) -> (u32, u32) {
        let parsed = self
            .0
            .strip_prefix('Q')
            .and_then(|rest| rest.split_once('_'))
            .and_then(|(quarter, year)| {
                let quarter = quarter.parse::<u32>().ok()?;
                let year = year.parse::<u32>().ok()?;
                (1000..=9999).contains(&year).then_some((year, quarter))
            });
        parsed.unwrap_or((0, 0))
    }
}

impl std::fmt::Display for QuarterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_is_parsed_from_motley_fool_slug() {
        let q = QuarterId::from_file_stem("nvidia-nvda-q2-2025-earnings-call-transcript");
        assert_eq!(q.as_str(), "Q2_2025");
        assert_eq!(q.sort_key(), (2025, 2));
    }

    #[test]
    fn quarter_match_is_case_insensitive() {
        assert_eq!(QuarterId::from_file_stem("NVDA_Q4-2023").as_str(), "Q4_2023");
    }

    #[test]
    fn quarter_pattern_wins_over_an_earlier_year() {
        assert_eq!(
            QuarterId::from_file_stem("fy2025-nvidia-q3-2024-call").as_str(),
            "Q3_2024"
        );
        assert_eq!(
            QuarterId::from_file_stem("q1-2023-vs-q2-2024").as_str(),
            "Q1_2023"
        );
    }

    #[test]
    fn quarter_out_of_range_falls_back_to_year() {
        let q = QuarterId::from_file_stem("call-q5-2024-notes");
        assert_eq!(q.as_str(), "2024");
        assert_eq!(q.sort_key(), (0, 0));
    }

    #[test]
    fn quarter_without_digits_is_unknown() {
        let q = QuarterId::from_file_stem("transcript");
        assert_eq!(q.as_str(), QuarterId::UNKNOWN);
        assert_eq!(q.sort_key(), (0, 0));
    }

    #[test]
    fn sort_key_orders_by_year_then_quarter() {
        let mut quarters = vec![
            QuarterId::new("Q1_2025"),
            QuarterId::new("Q4_2024"),
            QuarterId::new("Q2_2024"),
        ];
        quarters.sort_by_key(QuarterId::sort_key);
        let labels: Vec<_> = quarters.iter().map(QuarterId::as_str).collect();
        assert_eq!(labels, vec!["Q2_2024", "Q4_2024", "Q1_2025"]);
    }

    #[test]
    fn plain_file_names_reject_traversal() {
        assert!(is_plain_file_name("q1-2024_qa.txt"));
        assert!(!is_plain_file_name("../secret.txt"));
        assert!(!is_plain_file_name("dir/file.txt"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }
}
