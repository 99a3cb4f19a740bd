// crates/core/src/transcriber/artifact.rs
//! Reads the JSON result file the transcriber leaves behind.

use std::path::{Path, PathBuf};

use thiserror::Error;
use wavescribe_types::TranscriptArtifact;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("transcriber wrote no result file at {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read result file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("result file {} is not valid transcript JSON: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and parse the artifact at `path`. A missing file is distinguished
/// from an unreadable or malformed one so failures can say which it was.
pub async fn read_artifact(path: &Path) -> Result<TranscriptArtifact, ArtifactError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArtifactError::Missing(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    serde_json::from_str(&raw).map_err(|e| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })
}
