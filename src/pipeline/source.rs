use super::events::{MessageItem, PipelineEvent};
use anyhow::Result;
use tokio::sync::{mpsc, Mutex};

/// Speech/LLM pipeline boundary.
///
/// The session controller only ever sees the pipeline through this trait:
/// an event feed (metric events plus exactly one `Closed`), an ordered
/// message-history snapshot, and the outbound speech path used for the
/// greeting. Vendor SDKs implement this; `ChannelPipeline` is the in-process
/// implementation used by tests and local runs.
#[async_trait::async_trait]
pub trait PipelineSource: Send + Sync {
    /// Apply the agent's instructions before the session starts talking.
    async fn configure(&self, instructions: &str) -> Result<()>;

    /// Subscribe to the pipeline's event feed.
    ///
    /// Returns a channel receiver that will receive pipeline events.
    /// A pipeline has a single consumer; a second subscribe is an error.
    async fn subscribe(&self) -> Result<mpsc::Receiver<PipelineEvent>>;

    /// Ordered snapshot of the session's message history so far.
    ///
    /// Callable at any time during or after the session; each call returns
    /// an independent, replayable copy.
    async fn history(&self) -> Vec<MessageItem>;

    /// Speak a line through the TTS stage.
    async fn say(&self, text: &str) -> Result<()>;
}

/// In-process pipeline backed by a tokio channel.
///
/// Events pushed through [`ChannelPipeline::emit`] reach the session's event
/// task; spoken lines and history pushes accumulate in the history snapshot.
pub struct ChannelPipeline {
    tx: mpsc::Sender<PipelineEvent>,
    rx: Mutex<Option<mpsc::Receiver<PipelineEvent>>>,
    instructions: Mutex<String>,
    history: Mutex<Vec<MessageItem>>,
}

impl ChannelPipeline {
    pub fn new(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            instructions: Mutex::new(String::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Deliver an event to the subscriber.
    pub async fn emit(&self, event: PipelineEvent) -> Result<()> {
        self.tx.send(event).await?;
        Ok(())
    }

    /// Append a turn to the message history.
    pub async fn push_history(&self, item: MessageItem) {
        let mut history = self.history.lock().await;
        history.push(item);
    }

    /// Instructions applied by the last `configure` call.
    pub async fn instructions(&self) -> String {
        self.instructions.lock().await.clone()
    }
}

impl Default for ChannelPipeline {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait::async_trait]
impl PipelineSource for ChannelPipeline {
    async fn configure(&self, instructions: &str) -> Result<()> {
        let mut current = self.instructions.lock().await;
        *current = instructions.to_string();
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<PipelineEvent>> {
        let mut rx = self.rx.lock().await;
        rx.take()
            .ok_or_else(|| anyhow::anyhow!("pipeline event feed already subscribed"))
    }

    async fn history(&self) -> Vec<MessageItem> {
        let history = self.history.lock().await;
        history.clone()
    }

    async fn say(&self, text: &str) -> Result<()> {
        // Spoken lines land in the history like any other agent turn
        self.push_history(MessageItem::agent(text)).await;
        Ok(())
    }
}
