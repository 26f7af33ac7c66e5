use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nodes::{PipelineExecutor, PipelineStages, PreprocessRules, StageDependencies, TriggerError};
use pipeline::{
    ArtifactStore, ChatMessage, ClassScores, ClassifierError, FetchError, LlmError, LlmProvider,
    MemoryArtifactStore, MemoryStatusStore, PipelineStatus, RawTranscript, RunState,
    ScoringLimits, SentimentClassifier, SentimentLabel, SentimentScorer, Stage, StageError,
    StageKind, StatusStore, TranscriptFetcher, TranscriptName,
};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Scripted stages
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
    /// Waits for the shared gate before succeeding.
    Gated,
}

struct ScriptedStage {
    kind: StageKind,
    behavior: Behavior,
    log: Arc<Mutex<Vec<StageKind>>>,
    gate: Arc<Notify>,
}

#[async_trait]
impl Stage for ScriptedStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self) -> Result<(), StageError> {
        self.log.lock().unwrap().push(self.kind);
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(StageError::NoInput {
                what: "scripted failure".to_string(),
            }),
            Behavior::Panic => panic!("scripted panic"),
            Behavior::Gated => {
                self.gate.notified().await;
                Ok(())
            }
        }
    }
}

struct Script {
    log: Arc<Mutex<Vec<StageKind>>>,
    gate: Arc<Notify>,
    status: Arc<MemoryStatusStore>,
    executor: Arc<PipelineExecutor>,
}

fn script(special: Option<(StageKind, Behavior)>) -> Script {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gate = Arc::new(Notify::new());
    let make = |kind: StageKind| -> Arc<dyn Stage> {
        let behavior = match special {
            Some((k, b)) if k == kind => b,
            _ => Behavior::Succeed,
        };
        Arc::new(ScriptedStage {
            kind,
            behavior,
            log: Arc::clone(&log),
            gate: Arc::clone(&gate),
        })
    };
    let stages = PipelineStages {
        fetch: make(StageKind::Fetch),
        preprocess: make(StageKind::Preprocess),
        score: make(StageKind::Score),
        themes: make(StageKind::Themes),
        aggregate: make(StageKind::Aggregate),
        summarize: make(StageKind::Summarize),
    };
    let status = Arc::new(MemoryStatusStore::new());
    let executor = Arc::new(PipelineExecutor::new(stages, status.clone()));
    Script {
        log,
        gate,
        status,
        executor,
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_run_visits_every_stage_in_order_and_ends_done() {
    let s = script(None);

    let ticket = s.executor.trigger().await.unwrap();
    let run_id = ticket.run_id;
    let report = ticket.wait().await.unwrap();

    assert_eq!(report.run_id, run_id);
    assert!(!s.executor.is_running());
    assert_eq!(report.stages, StageKind::ORDER.to_vec());
    assert_eq!(*s.log.lock().unwrap(), StageKind::ORDER.to_vec());
    let status = s.status.get().await.unwrap();
    assert_eq!(status.state, RunState::Done);
    assert_eq!(status.message, PipelineStatus::COMPLETED_MESSAGE);
}

#[tokio::test]
async fn failing_stage_stops_the_run_with_error_status() {
    let s = script(Some((StageKind::Score, Behavior::Fail)));

    let err = s.executor.trigger().await.unwrap().wait().await.unwrap_err();

    assert_eq!(err.stage(), Some(StageKind::Score));
    assert_eq!(
        *s.log.lock().unwrap(),
        vec![StageKind::Fetch, StageKind::Preprocess, StageKind::Score]
    );
    let status = s.status.get().await.unwrap();
    assert_eq!(status.state, RunState::Error);
    assert!(status.message.starts_with("Pipeline failed: "));
    assert!(status.message.contains("scripted failure"));
}

#[tokio::test]
async fn panicking_stage_is_reported_as_error() {
    let s = script(Some((StageKind::Themes, Behavior::Panic)));

    let ticket = s.executor.trigger().await.unwrap();
    let err = ticket.wait().await.unwrap_err();

    assert_eq!(err.stage(), Some(StageKind::Themes));
    let status = s.status.get().await.unwrap();
    assert_eq!(status.state, RunState::Error);
    assert!(status.message.contains("scripted panic"));
    assert!(!s.executor.is_running());
}

#[tokio::test]
async fn trigger_records_running_before_returning() {
    let s = script(Some((StageKind::Fetch, Behavior::Gated)));

    let ticket = s.executor.trigger().await.unwrap();

    assert_eq!(s.status.get().await.unwrap().state, RunState::Running);
    assert!(s.executor.is_running());

    s.gate.notify_one();
    ticket.wait().await.unwrap();
    assert_eq!(s.status.get().await.unwrap().state, RunState::Done);
}

#[tokio::test]
async fn second_trigger_is_rejected_while_a_run_is_in_flight() {
    let s = script(Some((StageKind::Aggregate, Behavior::Gated)));

    let ticket = s.executor.trigger().await.unwrap();
    let before = s.status.get().await.unwrap();

    let second = s.executor.trigger().await;
    assert!(matches!(second, Err(TriggerError::AlreadyRunning)));
    assert_eq!(s.status.get().await.unwrap().state, before.state);

    s.gate.notify_one();
    ticket.wait().await.unwrap();

    // The slot is free again once the run ends.
    let again = s.executor.trigger().await.unwrap();
    s.gate.notify_one();
    again.wait().await.unwrap();
    assert_eq!(s.log.lock().unwrap().len(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_triggers_admit_exactly_one_run() {
    let s = script(Some((StageKind::Summarize, Behavior::Gated)));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let executor = Arc::clone(&s.executor);
        tasks.spawn(async move { executor.trigger().await });
    }

    let mut tickets = Vec::new();
    let mut rejected = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(ticket) => tickets.push(ticket),
            Err(TriggerError::AlreadyRunning) => rejected += 1,
            Err(e) => panic!("unexpected trigger error: {e}"),
        }
    }
    assert_eq!(tickets.len(), 1);
    assert_eq!(rejected, 15);

    s.gate.notify_one();
    for ticket in tickets {
        ticket.wait().await.unwrap();
    }
}

#[tokio::test]
async fn status_reads_during_a_run_are_always_well_formed() {
    let s = script(Some((StageKind::Score, Behavior::Gated)));
    let ticket = s.executor.trigger().await.unwrap();

    for _ in 0..50 {
        let status = s.status.get().await.unwrap();
        assert!(matches!(status.state, RunState::Running | RunState::Done));
        assert!(!status.message.is_empty());
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    s.gate.notify_one();
    ticket.wait().await.unwrap();
}

// ---------------------------------------------------------------------------
// Full run over in-memory stores
// ---------------------------------------------------------------------------

struct FixedFetcher(Vec<RawTranscript>);

#[async_trait]
impl TranscriptFetcher for FixedFetcher {
    async fn fetch_latest(&self) -> Result<Vec<RawTranscript>, FetchError> {
        Ok(self.0.clone())
    }
}

/// Positive for text mentioning growth, negative otherwise.
struct KeywordClassifier;

#[async_trait]
impl SentimentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassScores, ClassifierError> {
        if text.contains("growth") {
            Ok(ClassScores::new(0.8, 0.15, 0.05))
        } else {
            Ok(ClassScores::new(0.1, 0.2, 0.7))
        }
    }
}

/// Answers focus prompts with a JSON list and everything else with prose.
struct CannedLlm;

#[async_trait]
impl LlmProvider for CannedLlm {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        if last.contains("<json>") {
            Ok("<json>[{\"theme\": \"Data Center\", \"summary\": \"Demand.\"}]</json>".to_string())
        } else {
            Ok("  A steady quarter.  ".to_string())
        }
    }
}

fn transcript(name: &str, text: &str) -> RawTranscript {
    RawTranscript {
        name: TranscriptName::new(name).unwrap(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn full_run_produces_every_artifact() {
    let artifacts = Arc::new(MemoryArtifactStore::new());
    let status = Arc::new(MemoryStatusStore::new());
    let fetcher = FixedFetcher(vec![
        transcript(
            "nvda-q2-2024",
            "Jensen Huang: Record growth this quarter. Questions & Answers: Analyst: Costs rose?",
        ),
        transcript(
            "nvda-q1-2024",
            "Colette Kress: Supply was tight. Questions & Answers: Analyst: Any growth?",
        ),
    ]);
    let deps = StageDependencies {
        artifacts: artifacts.clone(),
        fetcher: Arc::new(fetcher),
        scorer: SentimentScorer::new(Arc::new(KeywordClassifier), ScoringLimits::default()),
        llm: Arc::new(CannedLlm),
        preprocess: PreprocessRules::default(),
        company: "NVIDIA".to_string(),
        score_concurrency: 2,
    };
    let executor = Arc::new(PipelineExecutor::new(
        PipelineStages::standard(deps),
        status.clone(),
    ));

    executor.trigger().await.unwrap().wait().await.unwrap();

    assert_eq!(status.get().await.unwrap().state, RunState::Done);

    let records = artifacts.read_sentiment_results().await.unwrap();
    let quarters: Vec<_> = records.iter().map(|r| r.quarter.as_str()).collect();
    assert_eq!(quarters, vec!["Q1_2024", "Q2_2024"]);
    assert_eq!(records[0].management_sentiment, SentimentLabel::Negative);
    assert_eq!(records[0].qa_sentiment, SentimentLabel::Positive);
    assert_eq!(records[1].management_sentiment, SentimentLabel::Positive);

    let shift = artifacts.read_quarterly_shift().await.unwrap();
    assert_eq!(shift.management.len(), 2);
    assert!((shift.management.net_sentiment[1] - 0.75).abs() < 1e-9);

    let focuses = artifacts.read_strategic_focuses().await.unwrap();
    assert_eq!(
        focuses.keys().collect::<Vec<_>>(),
        vec!["NVDA-Q1-2024", "NVDA-Q2-2024"]
    );
    assert_eq!(focuses["NVDA-Q1-2024"][0].theme, "Data Center");

    let name = TranscriptName::new("nvda-q1-2024").unwrap();
    assert_eq!(
        artifacts.transcript_summary(&name).await.as_deref(),
        Some("A steady quarter.")
    );
    assert_eq!(
        artifacts.read_shift_summary().await.unwrap(),
        "A steady quarter."
    );
}

#[tokio::test]
async fn run_without_any_transcripts_fails_at_score() {
    let artifacts = Arc::new(MemoryArtifactStore::new());
    let status = Arc::new(MemoryStatusStore::new());
    let deps = StageDependencies {
        artifacts: artifacts.clone(),
        fetcher: Arc::new(FixedFetcher(Vec::new())),
        scorer: SentimentScorer::new(Arc::new(KeywordClassifier), ScoringLimits::default()),
        llm: Arc::new(CannedLlm),
        preprocess: PreprocessRules::default(),
        company: "NVIDIA".to_string(),
        score_concurrency: 1,
    };
    let executor = Arc::new(PipelineExecutor::new(
        PipelineStages::standard(deps),
        status.clone(),
    ));

    let err = executor.trigger().await.unwrap().wait().await.unwrap_err();

    assert_eq!(err.stage(), Some(StageKind::Score));
    assert_eq!(status.get().await.unwrap().state, RunState::Error);
    assert!(artifacts.read_quarterly_shift().await.unwrap_err().is_not_found());
}
