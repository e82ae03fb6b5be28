use serde::Serialize;
use tokio::sync::broadcast;

/// Broadcast after every accepted like so list views (likes, liked-me,
/// mutual) reload themselves. The core only emits; subscriber count and
/// order are not its concern.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSignal {
    pub actor_id: u64,
    pub target_id: u64,
    pub status: String,
    pub refresh_hints: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RefreshBus {
    tx: broadcast::Sender<RefreshSignal>,
}

impl RefreshBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);

        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshSignal> {
        self.tx.subscribe()
    }

    /// Fire-and-forget: emitting with zero subscribers is fine.
    pub fn emit(&self, signal: RefreshSignal) {
        let _ = self.tx.send(signal);
    }
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new(16)
    }
}
