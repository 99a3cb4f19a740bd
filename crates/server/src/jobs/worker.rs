// crates/server/src/jobs/worker.rs
//! Worker pool that drains the job queue.
//!
//! Workers share one queue receiver behind an async mutex: an idle worker
//! parks in `recv()` holding the lock, hands it back the moment an id
//! arrives, and processes the job while the next worker takes its place.
//! Everything that can go wrong while running a job lands in the job
//! record as a failure; workers never crash the server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use wavescribe_core::{
    read_artifact, ChatMessage, ProgressFn, ProviderRouter, SummarizeParams, TranscribeBackend,
    TranscribeParams,
};
use wavescribe_db::{Database, TranscriptRow};
use wavescribe_types::{JobId, JobKind};

use super::queue::JobReceiver;
use super::record::JobParams;
use super::service::{JobService, StartedJob};

/// System prompt used when a summarization job supplies none.
const DEFAULT_SUMMARY_PROMPT: &str = "You are a meeting assistant. Summarize the transcript \
     into a short overview, key discussion points, and action items. Use the speaker labels \
     as given.";

/// Shared handles a worker needs to run jobs.
#[derive(Clone)]
pub struct WorkerContext {
    pub service: Arc<JobService>,
    pub db: Database,
    pub backend: Arc<dyn TranscribeBackend>,
    pub router: Arc<ProviderRouter>,
    /// Per-job scratch directories live under here.
    pub work_dir: PathBuf,
}

/// Spawn `count` workers draining the shared queue receiver.
pub fn spawn_workers(
    count: usize,
    ctx: WorkerContext,
    rx: JobReceiver,
) -> Vec<JoinHandle<()>> {
    let rx = Arc::new(Mutex::new(rx));
    (0..count)
        .map(|worker_id| {
            let ctx = ctx.clone();
            let rx = Arc::clone(&rx);
            tokio::spawn(worker_loop(worker_id, ctx, rx))
        })
        .collect()
}

async fn worker_loop(worker_id: usize, ctx: WorkerContext, rx: Arc<Mutex<JobReceiver>>) {
    loop {
        // The guard drops at the end of the statement, so the lock is held
        // only while waiting, never while processing.
        let id = rx.lock().await.recv().await;
        match id {
            Some(id) => process_one(&ctx, id).await,
            None => {
                tracing::info!(worker_id, "job queue closed, worker exiting");
                break;
            }
        }
    }
}

async fn process_one(ctx: &WorkerContext, id: JobId) {
    let Some(job) = ctx.service.begin_processing(id) else {
        tracing::debug!(job_id = %id, "job gone or terminated before start, skipping");
        return;
    };

    invalidate_previous(ctx, &job).await;

    match job.params.clone() {
        JobParams::Transcription(params) => run_transcription(ctx, &job, &params).await,
        JobParams::Summarization(params) => run_summarization(ctx, &job, &params).await,
    }
}

/// A rerun makes the earlier results stale the moment work starts. Drop
/// them now so a failed rerun cannot leave them looking current.
async fn invalidate_previous(ctx: &WorkerContext, job: &StartedJob) {
    if job.kind == JobKind::Transcription {
        match ctx.db.clear_transcript(&job.recording_id).await {
            Ok(true) => tracing::info!(job_id = %job.id, "previous transcript invalidated"),
            Ok(false) => {}
            Err(e) => tracing::warn!(job_id = %job.id, "failed to clear previous transcript: {e}"),
        }
    }
    // A summary derives from the transcript, so both job kinds invalidate it.
    match ctx.db.clear_summary(&job.recording_id).await {
        Ok(true) => tracing::info!(job_id = %job.id, "previous summary invalidated"),
        Ok(false) => {}
        Err(e) => tracing::warn!(job_id = %job.id, "failed to clear previous summary: {e}"),
    }
}

async fn run_transcription(ctx: &WorkerContext, job: &StartedJob, params: &TranscribeParams) {
    let recording = match ctx.db.get_recording(&job.recording_id).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            let msg = format!("recording {} no longer exists", job.recording_id);
            ctx.service.fail_job(job.id, msg);
            return;
        }
        Err(e) => {
            ctx.service.fail_job(job.id, format!("failed to load recording: {e}"));
            return;
        }
    };

    let job_dir = ctx.work_dir.join(job.id.to_string());
    if let Err(e) = tokio::fs::create_dir_all(&job_dir).await {
        ctx.service.fail_job(job.id, format!("failed to create work dir: {e}"));
        return;
    }
    let result_path = job_dir.join("result.json");

    let service = Arc::clone(&ctx.service);
    let job_id = job.id;
    let on_progress: ProgressFn = Box::new(move |pct| service.record_progress(job_id, pct));

    let outcome = match ctx
        .backend
        .run(
            Path::new(&recording.audio_path),
            &result_path,
            params,
            job.kill.clone(),
            on_progress,
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            ctx.service.fail_job(job.id, format!("transcriber failed to start: {e}"));
            return;
        }
    };

    if outcome.killed {
        ctx.service.finish_terminated(job.id);
        return;
    }
    if !outcome.success() {
        let code = outcome
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let msg = format!("transcriber exited with {code}: {}", tail(&outcome.output, 500));
        ctx.service.fail_job(job.id, msg);
        return;
    }

    let artifact = match read_artifact(&result_path).await {
        Ok(artifact) => artifact,
        Err(e) => {
            ctx.service.fail_job(job.id, format!("transcriber result unreadable: {e}"));
            return;
        }
    };

    if let Err(e) = ctx
        .db
        .upsert_transcript(
            &job.recording_id,
            artifact.language.as_deref(),
            &artifact.text,
            &artifact.segments,
            &job.id.to_string(),
        )
        .await
    {
        ctx.service.fail_job(job.id, format!("failed to store transcript: {e}"));
        return;
    }

    ctx.service.complete_job(job.id);
}

async fn run_summarization(ctx: &WorkerContext, job: &StartedJob, params: &SummarizeParams) {
    let transcript = match ctx.db.get_transcript(&job.recording_id).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            let msg = "no transcript to summarize; run transcription first".to_string();
            ctx.service.fail_job(job.id, msg);
            return;
        }
        Err(e) => {
            ctx.service.fail_job(job.id, format!("failed to load transcript: {e}"));
            return;
        }
    };

    let messages = build_summary_messages(&transcript, params.prompt.as_deref());

    // There is no child process to signal here, so a terminate request is
    // honored by abandoning the request mid-flight.
    let result = tokio::select! {
        _ = job.kill.cancelled() => {
            ctx.service.finish_terminated(job.id);
            return;
        }
        result = ctx.router.complete(&params.provider, &messages) => result,
    };

    match result {
        Ok(content) => {
            if let Err(e) = ctx
                .db
                .upsert_summary(
                    &job.recording_id,
                    &content,
                    &params.provider.to_string(),
                    &job.id.to_string(),
                )
                .await
            {
                ctx.service.fail_job(job.id, format!("failed to store summary: {e}"));
                return;
            }
            ctx.service.complete_job(job.id);
        }
        Err(e) => ctx.service.fail_job(job.id, e.to_string()),
    }
}

/// Render the transcript for the model, applying manual speaker labels
/// where they exist and falling back to the raw diarization tags.
fn build_summary_messages(transcript: &TranscriptRow, prompt: Option<&str>) -> Vec<ChatMessage> {
    let system = prompt.unwrap_or(DEFAULT_SUMMARY_PROMPT);

    let body = if transcript.segments.is_empty() {
        transcript.text.clone()
    } else {
        transcript
            .segments
            .iter()
            .map(|seg| match seg.speaker.as_deref() {
                Some(raw) => {
                    let label = transcript
                        .speaker_map
                        .as_ref()
                        .and_then(|m| m.get(raw))
                        .map(String::as_str)
                        .unwrap_or(raw);
                    format!("{label}: {}", seg.text)
                }
                None => seg.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    vec![ChatMessage::system(system), ChatMessage::user(body)]
}

/// Last `max` bytes of `s`, trimmed forward to a char boundary.
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wavescribe_types::TranscriptSegment;

    fn segment(speaker: Option<&str>, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start: 0.0,
            end: 1.0,
            speaker: speaker.map(String::from),
            text: text.to_string(),
        }
    }

    fn transcript_row(
        segments: Vec<TranscriptSegment>,
        speaker_map: Option<HashMap<String, String>>,
    ) -> TranscriptRow {
        TranscriptRow {
            recording_id: "rec-1".to_string(),
            language: Some("en".to_string()),
            text: "plain transcript text".to_string(),
            segments,
            speaker_map,
            job_id: None,
            updated_at: 0,
        }
    }

    #[test]
    fn test_summary_messages_apply_speaker_labels() {
        let map = HashMap::from([("SPEAKER_00".to_string(), "Ada".to_string())]);
        let row = transcript_row(
            vec![
                segment(Some("SPEAKER_00"), "hello"),
                segment(Some("SPEAKER_01"), "hi there"),
            ],
            Some(map),
        );

        let messages = build_summary_messages(&row, None);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("meeting assistant"));
        // Mapped speaker gets the label; unmapped keeps the raw tag.
        assert_eq!(messages[1].content, "Ada: hello\nSPEAKER_01: hi there");
    }

    #[test]
    fn test_summary_messages_without_segments_use_plain_text() {
        let row = transcript_row(vec![], None);
        let messages = build_summary_messages(&row, None);
        assert_eq!(messages[1].content, "plain transcript text");
    }

    #[test]
    fn test_summary_messages_custom_prompt() {
        let row = transcript_row(vec![segment(None, "unattributed line")], None);
        let messages = build_summary_messages(&row, Some("Reply in French."));
        assert_eq!(messages[0].content, "Reply in French.");
        assert_eq!(messages[1].content, "unattributed line");
    }

    #[test]
    fn test_tail_cuts_on_char_boundary() {
        assert_eq!(tail("short", 10), "short");
        assert_eq!(tail("abcdef", 3), "def");
        // Multibyte char straddling the cut is dropped, not split.
        let s = "xé"; // 'é' is two bytes
        assert_eq!(tail(s, 1), "");
        assert_eq!(tail(s, 2), "é");
    }
}
