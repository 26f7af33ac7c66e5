//! Earnings Pulse filesystem persistence.
//!
//! Implements [`pipeline::StatusStore`] and [`pipeline::ArtifactStore`] over
//! plain files under one data directory.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Paths, file formats and atomic replacement live here.
//! The [`pipeline`] crate sees only the port traits and [`pipeline::StoreError`].
//!
//! ## Layout
//!
//! | Artifact | Path under the data directory |
//! |----------|-------------------------------|
//! | raw transcripts | `transcripts/<name>.txt` |
//! | sections | `processed_transcripts/<name>_{prepared,qa,cleaned}.txt` |
//! | sentiment results | `sentiment_results.json` |
//! | strategic focuses | `strategic_focuses.json` |
//! | quarterly shift | `quarterly_shift.json` |
//! | transcript summaries | `summaries/<name>_summary.txt` |
//! | shift summary | `summaries/quarterly_shift_summary.txt` |
//! | status | `pipeline_status.json` |
//! | status owner lock | `pipeline_status.json.lock` |
//!
//! Every write goes to a uniquely named temporary file in the target
//! directory and is renamed over the target, so readers see either the old
//! or the new file.

mod atomic;
pub mod artifacts;
pub mod status;

pub use artifacts::FsArtifactStore;
pub use status::{read_status_snapshot, FileStatusStore, STATUS_FILE, STATUS_LOCK_FILE};
