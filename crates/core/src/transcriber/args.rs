// crates/core/src/transcriber/args.rs
//! Transcription parameters and command-line construction.

use std::ffi::OsString;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Parameters for a transcription job, fixed at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeParams {
    /// Whisper model size (`tiny`, `base`, `small`, `medium`, `large`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Spoken language hint; the transcriber auto-detects when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Run speaker diarization.
    #[serde(default)]
    pub diarize: bool,
    /// Upper bound on distinct speakers; only meaningful with `diarize`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speakers: Option<u32>,
}

fn default_model() -> String {
    "base".to_string()
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            model: default_model(),
            language: None,
            diarize: false,
            max_speakers: None,
        }
    }
}

/// Build the transcriber argv. Argument order is fixed so identical
/// parameters always produce an identical command line.
pub fn build_args(
    audio_path: &Path,
    result_path: &Path,
    params: &TranscribeParams,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        audio_path.as_os_str().to_os_string(),
        "--model".into(),
        params.model.clone().into(),
        "--output".into(),
        result_path.as_os_str().to_os_string(),
    ];
    if let Some(language) = &params.language {
        args.push("--language".into());
        args.push(language.clone().into());
    }
    if params.diarize {
        args.push("--diarize".into());
        if let Some(n) = params.max_speakers {
            args.push("--max-speakers".into());
            args.push(n.to_string().into());
        }
    }
    args
}
