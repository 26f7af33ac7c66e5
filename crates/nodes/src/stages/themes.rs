//! Per-transcript summaries and strategic focus extraction.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use pipeline::{
    ArtifactStore, ChatMessage, LlmProvider, Stage, StageError, StageKind, StrategicFocus,
    StrategicFocuses, TranscriptName,
};
use regex::Regex;
use tracing::{info, warn};

/// Characters of transcript text sent to the summarizer.
pub const SUMMARY_INPUT_CHARS: usize = 12_000;

/// Characters of an unparseable reply kept in the fallback focus.
pub const PARSE_ERROR_EXCERPT_CHARS: usize = 600;

/// Theme recorded when the model reply cannot be read as a focus list.
pub const PARSE_ERROR_THEME: &str = "Parse Error";

static JSON_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<json>(.*?)</json>").expect("literal pattern compiles"));
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[\]}])").expect("literal pattern compiles"));

/// Summarizes each transcript and extracts its strategic focuses.
pub struct ThemeStage {
    llm: Arc<dyn LlmProvider>,
    artifacts: Arc<dyn ArtifactStore>,
    company: String,
}

impl ThemeStage {
    pub fn new(llm: Arc<dyn LlmProvider>, artifacts: Arc<dyn ArtifactStore>, company: String) -> Self {
        Self {
            llm,
            artifacts,
            company,
        }
    }

    async fn summarize(&self, text: &str) -> Result<String, StageError> {
        let prompt = format!(
            "Summarize the key strategic and business points of {}'s earnings call below \
             in under 400 words, focusing on growth drivers, initiatives, and major themes.\n\n{}",
            self.company,
            head_chars(text, SUMMARY_INPUT_CHARS)
        );
        let reply = self.llm.chat(&[ChatMessage::user(prompt)]).await?;
        Ok(reply.trim().to_string())
    }

    async fn extract(&self, summary: &str, label: &str) -> Result<Vec<StrategicFocus>, StageError> {
        let prompt = format!(
            "You are an expert financial analyst reviewing {company}'s {label} earnings call.\n\n\
             Identify exactly 3-5 key strategic focuses or initiatives that management emphasized.\n\
             Each item must have:\n\
             - \"theme\": 2-8 words\n\
             - \"summary\": one concise paragraph (max 3 sentences) explaining its significance.\n\n\
             Respond only with a JSON array of objects inside <json> tags.\n\
             Do not include markdown, commentary, or explanations.\n\n\
             Example:\n\
             <json>\n\
             [{{\"theme\": \"AI Infrastructure Expansion\", \"summary\": \"Management emphasized \
             accelerating the build-out of large GPU clusters.\"}}]\n\
             </json>\n\n{summary}",
            company = self.company,
        );
        let reply = self.llm.chat(&[ChatMessage::user(prompt)]).await?;
        Ok(parse_focuses(&reply))
    }
}

#[async_trait]
impl Stage for ThemeStage {
    fn kind(&self) -> StageKind {
        StageKind::Themes
    }

    async fn run(&self) -> Result<(), StageError> {
        let names = self.artifacts.list_processed().await?;
        let mut focuses = StrategicFocuses::new();

        for name in &names {
            let sections = self.artifacts.read_sections(name).await?;
            let summary = self.summarize(&sections.combined()).await?;
            self.artifacts.write_transcript_summary(name, &summary).await?;

            let label = focus_key(name);
            let items = self.extract(&summary, &label).await?;
            if items.iter().any(|f| f.theme == PARSE_ERROR_THEME) {
                warn!(transcript = %name, "Could not parse strategic focuses from model reply");
            }
            focuses.insert(label, items);
        }

        self.artifacts.write_strategic_focuses(&focuses).await?;
        info!(transcripts = focuses.len(), "Wrote strategic focuses");
        Ok(())
    }
}

/// Key of a transcript in the focuses artifact.
pub fn focus_key(name: &TranscriptName) -> String {
    name.as_str().to_uppercase()
}

/// Reads a focus list out of a model reply.
///
/// The list is taken from inside `<json>` tags when present. A reply that
/// still does not parse is retried from its outermost brackets with trailing
/// commas removed; failing that, the result is a single
/// [`PARSE_ERROR_THEME`] entry holding the start of the reply.
pub fn parse_focuses(reply: &str) -> Vec<StrategicFocus> {
    let content = JSON_TAGS
        .captures(reply)
        .and_then(|c| c.get(1))
        .map_or(reply, |m| m.as_str())
        .trim();

    if let Ok(items) = serde_json::from_str::<Vec<StrategicFocus>>(content) {
        return items;
    }

    if let Some(items) = outermost_array(content)
        .map(|array| TRAILING_COMMA.replace_all(array, "$1"))
        .and_then(|array| serde_json::from_str::<Vec<StrategicFocus>>(&array).ok())
    {
        return items;
    }

    vec![StrategicFocus {
        theme: PARSE_ERROR_THEME.to_string(),
        summary: head_chars(content, PARSE_ERROR_EXCERPT_CHARS).to_string(),
    }]
}

fn outermost_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
