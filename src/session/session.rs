use super::config::{SessionConfig, DEFAULT_INSTRUCTIONS};
use super::cost::{compute_cost, RateConfig};
use super::transcript::record_pairs;
use super::usage::{UsageCollector, UsageSummary};
use crate::db::{SessionRecord, SessionSink};
use crate::pipeline::{MessageItem, PipelineEvent, PipelineSource};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A live voice-agent session: routes pipeline metric events into the usage
/// collector and finalizes usage, costs, and transcript pairs at session end.
///
/// Finalization has two independent triggers: the pipeline's natural close
/// event, and an explicit [`AgentSession::shutdown`] from the host's shutdown
/// hook. Both may fire for the same session; a latch guarantees the
/// finalization body runs at most once.
///
/// The session is a cheap handle; clones share the same underlying state.
#[derive(Clone)]
pub struct AgentSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    /// Session configuration
    config: SessionConfig,

    /// Speech/LLM pipeline collaborator
    pipeline: Arc<dyn PipelineSource>,

    /// Storage collaborator for the terminal writes
    sink: Arc<dyn SessionSink>,

    /// Billing rates, fixed for the process lifetime
    rates: RateConfig,

    /// Running usage totals
    usage: UsageCollector,

    /// When the session started
    started_at: chrono::DateTime<chrono::Utc>,

    /// Whether the session is currently accepting events
    is_running: AtomicBool,

    /// Finalization latch; set exactly once, by whichever trigger wins
    finalized: AtomicBool,

    /// Handle for the pipeline event task
    event_task_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Point-in-time view of a session, for logging and status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub is_running: bool,
    pub finalized: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub usage: UsageSummary,
}

impl AgentSession {
    pub fn new(
        config: SessionConfig,
        pipeline: Arc<dyn PipelineSource>,
        sink: Arc<dyn SessionSink>,
        rates: RateConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                pipeline,
                sink,
                rates,
                usage: UsageCollector::new(),
                started_at: Utc::now(),
                is_running: AtomicBool::new(false),
                finalized: AtomicBool::new(false),
                event_task_handle: Mutex::new(None),
            }),
        }
    }

    /// Start the session: load instructions, speak the greeting, and begin
    /// consuming pipeline events.
    pub async fn start(&self) -> Result<()> {
        let inner = &self.inner;

        if inner.is_running.swap(true, Ordering::SeqCst) {
            warn!("session already started: {}", inner.config.session_id);
            return Ok(());
        }

        info!("starting agent session: {}", inner.config.session_id);

        // Instructions come from the store; any failure falls back to the
        // default so a broken database never blocks a call.
        let instructions = inner.load_instructions().await;
        inner
            .pipeline
            .configure(&instructions)
            .await
            .context("failed to configure pipeline")?;

        if !inner.config.greeting.is_empty() {
            inner
                .pipeline
                .say(&inner.config.greeting)
                .await
                .context("failed to speak greeting")?;
        }

        let mut events = inner
            .pipeline
            .subscribe()
            .await
            .context("failed to subscribe to pipeline events")?;

        // Spawn the event consumer task
        let task_inner = Arc::clone(inner);
        let event_task = tokio::spawn(async move {
            debug!("pipeline event task started");

            while let Some(event) = events.recv().await {
                match event {
                    PipelineEvent::Metrics(metrics) => task_inner.usage.collect(metrics),
                    PipelineEvent::Closed => {
                        info!(
                            "session closed by pipeline: {}",
                            task_inner.config.session_id
                        );
                        task_inner.finalize().await;
                        break;
                    }
                }
            }

            debug!("pipeline event task stopped");
        });

        {
            let mut handle = inner.event_task_handle.lock().await;
            *handle = Some(event_task);
        }

        info!("agent session started: {}", inner.config.session_id);

        Ok(())
    }

    /// Shutdown-hook trigger. Finalizes the session if the pipeline's close
    /// event hasn't already; never blocks on the event task.
    pub async fn shutdown(&self) {
        info!(
            "shutdown requested for session: {}",
            self.inner.config.session_id
        );
        self.inner.finalize().await;
    }

    /// Waits for the pipeline event task to finish, which happens after the
    /// close event (finalization included) or once the pipeline hangs up.
    /// For runners that want to block until the session ends naturally.
    pub async fn closed(&self) {
        let handle = { self.inner.event_task_handle.lock().await.take() };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("pipeline event task panicked: {}", e);
            }
        }
    }

    /// Current session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.inner.config.session_id.clone(),
            is_running: self.inner.is_running.load(Ordering::SeqCst),
            finalized: self.inner.finalized.load(Ordering::SeqCst),
            started_at: self.inner.started_at,
            usage: self.inner.usage.summary(),
        }
    }
}

impl SessionInner {
    /// Runs the one-time finalization: snapshot usage, compute costs, write
    /// the session record, export and pair the transcript.
    ///
    /// Both triggers funnel here; the latch admits exactly one of them. All
    /// storage failures are logged and swallowed: losing one session's
    /// metrics is acceptable, crashing the host is not.
    async fn finalize(&self) {
        if self.finalized.swap(true, Ordering::SeqCst) {
            debug!(
                "ignoring duplicate finalization trigger for session: {}",
                self.config.session_id
            );
            return;
        }
        self.is_running.store(false, Ordering::SeqCst);

        let ended_at = Utc::now();
        let summary = self.usage.summary();
        let costs = compute_cost(&summary, &self.rates);

        info!(
            session_id = %self.config.session_id,
            llm_tokens = summary.llm_tokens(),
            stt_seconds = summary.stt_audio_seconds,
            tts_characters = summary.tts_characters,
            total_cost_usd = costs.total_usd,
            "finalizing session"
        );

        let history = self.pipeline.history().await;

        let record = SessionRecord {
            session_id: self.config.session_id.clone(),
            started_at: self.started_at,
            ended_at,
            usage: summary,
            cost: costs,
        };

        // Terminal writes happen off the event loop: single attempt,
        // bounded wait. If the store is slow we stop waiting and let the
        // write finish (or fail) in the background.
        let sink = Arc::clone(&self.sink);
        let session_id = self.config.session_id.clone();
        let export_dir = self.config.export_dir.clone();

        let write_task = tokio::task::spawn_blocking(move || {
            if let Err(e) = sink.record_session(&record) {
                error!("failed to persist session record for {}: {}", session_id, e);
            }

            if let Some(dir) = export_dir {
                if let Err(e) = export_history(&dir, &session_id, &history) {
                    error!("failed to export transcript for {}: {}", session_id, e);
                }
            }

            record_pairs(sink.as_ref(), &session_id, &history)
        });

        match tokio::time::timeout(self.config.storage_timeout, write_task).await {
            Ok(Ok(pairs)) => {
                info!(
                    "session {} finalized: {} transcript pairs recorded",
                    self.config.session_id, pairs
                );
            }
            Ok(Err(e)) => error!("finalization write task panicked: {}", e),
            Err(_) => warn!(
                "storage write for session {} still running after {:?}; not waiting",
                self.config.session_id, self.config.storage_timeout
            ),
        }
    }

    async fn load_instructions(&self) -> String {
        let sink = Arc::clone(&self.sink);
        let loaded = tokio::task::spawn_blocking(move || sink.latest_instruction()).await;

        match loaded {
            Ok(Ok(Some(context))) => {
                info!("loaded instructions from store");
                context
            }
            Ok(Ok(None)) => {
                warn!("no instructions in store; using default");
                DEFAULT_INSTRUCTIONS.to_string()
            }
            Ok(Err(e)) => {
                error!("failed to load instructions: {}; using default", e);
                DEFAULT_INSTRUCTIONS.to_string()
            }
            Err(e) => {
                error!("instruction load task panicked: {}; using default", e);
                DEFAULT_INSTRUCTIONS.to_string()
            }
        }
    }
}

/// Writes the raw message history to `<dir>/transcript_<session_id>.json`.
fn export_history(dir: &Path, session_id: &str, history: &[MessageItem]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("transcript_{}.json", session_id));
    let json = serde_json::to_string_pretty(history)?;
    std::fs::write(&path, json)?;
    info!("transcript exported to {}", path.display());
    Ok(())
}
