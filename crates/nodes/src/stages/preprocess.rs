//! Transcript cleanup and section splitting.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use pipeline::{ArtifactStore, Stage, StageError, StageKind, TranscriptSections};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("literal pattern compiles")
}

static QA_MARKER: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)Questions & Answers:"));

/// Removal rules applied in order; each pair is (pattern, replacement).
static CLEANUP_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (regex(r"Image source:.*?[\r\n]+"), ""),
        (regex(r"(?is)Contents:.*?(Prepared Remarks|Questions and Answers)"), ""),
        (regex(r"(?is)Call Participants.*?Prepared Remarks:"), "Prepared Remarks:"),
        (regex(r"Duration:.*"), ""),
        (regex(r"More .*analysis.*"), ""),
        (regex(r"(?m)^\s*--.*$"), ""),
        (regex(r"\[.*?\]"), ""),
        (regex(r"\(.*?\)"), ""),
        (regex(r"(?i)\d{1,2}:\d{2}\s*(a\.m\.|p\.m\.)?\s*ET"), ""),
    ]
});

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| regex(r"\n{2,}"));
static RUNS_OF_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| regex(r"\s{2,}"));
static CALL_PARTICIPANTS_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?is)call participants?:.*"));
static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"[^a-zA-Z0-9.,;:!?'\-\n ]+"));

/// Company-specific cleanup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessRules {
    /// Speakers whose first appearance marks the end of the operator intro.
    pub executive_names: Vec<String>,
    /// Literal terms (tickers and the like) removed everywhere.
    pub strip_terms: Vec<String>,
}

impl Default for PreprocessRules {
    fn default() -> Self {
        Self {
            executive_names: vec![
                "Colette Kress".to_string(),
                "Jensen Huang".to_string(),
                "Simona Jankowski".to_string(),
            ],
            strip_terms: vec!["NVDA".to_string()],
        }
    }
}

/// Splits a raw transcript into management and Q&A sections and cleans both.
#[derive(Debug, Clone, Default)]
pub struct TranscriptCleaner {
    rules: PreprocessRules,
}

impl TranscriptCleaner {
    pub fn new(rules: PreprocessRules) -> Self {
        Self { rules }
    }

    pub fn process(&self, raw: &str) -> TranscriptSections {
        let (management, qa) = split_sections(raw);
        TranscriptSections {
            management: normalize(&self.trim_operator_intro(&self.clean(management))),
            qa: normalize(&strip_participants_footer(&self.clean(qa))),
        }
    }

    fn clean(&self, text: &str) -> String {
        let mut text = text.to_string();
        for (pattern, replacement) in CLEANUP_RULES.iter() {
            text = pattern.replace_all(&text, *replacement).into_owned();
        }
        for term in &self.rules.strip_terms {
            text = text.replace(term.as_str(), "");
        }
        let text = BLANK_LINES.replace_all(&text, "\n");
        RUNS_OF_WHITESPACE
            .replace_all(&text, " ")
            .trim()
            .to_string()
    }

    /// Drops everything before the first named executive speaks.
    fn trim_operator_intro(&self, text: &str) -> String {
        let first = self
            .rules
            .executive_names
            .iter()
            .filter_map(|name| text.find(name.as_str()))
            .min();
        match first {
            Some(index) => text[index..].to_string(),
            None => text.to_string(),
        }
    }
}

/// Splits at the first Q&A marker; without a marker everything is management.
pub fn split_sections(text: &str) -> (&str, &str) {
    match QA_MARKER.find(text) {
        Some(m) => (&text[..m.start()], &text[m.start()..]),
        None => (text, ""),
    }
}

fn strip_participants_footer(text: &str) -> String {
    CALL_PARTICIPANTS_FOOTER
        .replace(text, "")
        .trim()
        .to_string()
}

fn normalize(text: &str) -> String {
    let text = DISALLOWED_CHARS.replace_all(text, " ");
    RUNS_OF_WHITESPACE
        .replace_all(&text, " ")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------

/// Turns every raw transcript into cleaned section texts.
pub struct PreprocessStage {
    artifacts: Arc<dyn ArtifactStore>,
    cleaner: TranscriptCleaner,
}

impl PreprocessStage {
    pub fn new(artifacts: Arc<dyn ArtifactStore>, cleaner: TranscriptCleaner) -> Self {
        Self { artifacts, cleaner }
    }
}

#[async_trait]
impl Stage for PreprocessStage {
    fn kind(&self) -> StageKind {
        StageKind::Preprocess
    }

    async fn run(&self) -> Result<(), StageError> {
        let names = self.artifacts.list_raw_transcripts().await?;
        if names.is_empty() {
            warn!("No raw transcripts to preprocess");
        }

        for name in &names {
            let raw = self.artifacts.read_raw_transcript(name).await?;
            let sections = self.cleaner.process(&raw);
            if sections.qa.is_empty() {
                debug!(transcript = %name, "No Q&A section found");
            }
            self.artifacts.write_sections(name, &sections).await?;
        }

        info!(transcripts = names.len(), "Preprocessed transcripts");
        Ok(())
    }
}
