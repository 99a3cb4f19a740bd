// crates/server/src/config.rs
//! Server configuration from environment variables.
//!
//! Every knob has a default so the server starts with no setup. The hosted
//! summarization backend stays dormant until `OPENAI_API_KEY` is set.

use std::path::PathBuf;
use thiserror::Error;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 47321;

/// Default capacity of the pending-job queue.
const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default number of job workers.
const DEFAULT_WORKER_COUNT: usize = 1;

/// Default transcriber binary, resolved via PATH.
const DEFAULT_TRANSCRIBER: &str = "wavescribe-transcribe";

/// Default local LLM daemon address.
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a data directory; set WAVESCRIBE_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Root for everything the server persists.
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    /// Per-job scratch directories live under here.
    pub work_dir: PathBuf,
    pub transcriber_bin: PathBuf,
    pub queue_capacity: usize,
    pub worker_count: usize,
    pub ollama_base_url: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = match env_var("WAVESCRIBE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("wavescribe"),
        };

        Ok(Self {
            port: get_port(),
            db_path: data_dir.join("wavescribe.db"),
            work_dir: data_dir.join("jobs"),
            data_dir,
            transcriber_bin: env_var("WAVESCRIBE_TRANSCRIBER")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSCRIBER)),
            queue_capacity: env_parse("WAVESCRIBE_QUEUE_CAPACITY")
                .unwrap_or(DEFAULT_QUEUE_CAPACITY)
                .max(1),
            worker_count: env_parse("WAVESCRIBE_WORKERS")
                .unwrap_or(DEFAULT_WORKER_COUNT)
                .max(1),
            ollama_base_url: env_var("WAVESCRIBE_OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            openai_base_url: env_var("OPENAI_BASE_URL")
                .unwrap_or_else(|| wavescribe_core::llm::openai::DEFAULT_BASE_URL.to_string()),
            openai_api_key: env_var("OPENAI_API_KEY"),
        })
    }
}

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    env_var("WAVESCRIBE_PORT")
        .or_else(|| env_var("PORT"))
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Read an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}
