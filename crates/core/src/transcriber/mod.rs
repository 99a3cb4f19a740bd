// crates/core/src/transcriber/mod.rs
//! External transcriber process adapter.
//!
//! The transcription engine is a separate binary. It takes the audio path
//! and a `--output` path, prints `Progress: <pct>%` lines on stdout, and
//! writes a JSON transcript artifact on success. This module builds its
//! argv, supervises the process, and reads the artifact back.

pub mod args;
pub mod artifact;
pub mod runner;

pub use args::{build_args, TranscribeParams};
pub use artifact::{read_artifact, ArtifactError};
pub use runner::{
    parse_progress_line, ProgressFn, TranscribeBackend, TranscribeOutcome, Transcriber,
    TranscriberError,
};
