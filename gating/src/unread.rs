use std::sync::Arc;

use tracing::warn;

use crate::store::{KeyValueStore, Scope};

const KEY_PREFIX: &str = "chat_unread_total_v1";

/// Per-user unread chat totals, session-scoped. Read side clamps whatever is
/// in the store; the badge shows `99+` above 99 and nothing at zero.
pub struct UnreadCounters {
    store: Arc<dyn KeyValueStore>,
}

impl UnreadCounters {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(uid: u64) -> String {
        format!("{KEY_PREFIX}:{uid}")
    }

    pub async fn total(&self, uid: u64) -> u64 {
        match self.store.get(Scope::Session, &Self::key(uid)).await {
            Ok(Some(raw)) => raw.trim().parse::<i64>().unwrap_or(0).max(0) as u64,
            Ok(None) => 0,
            Err(e) => {
                warn!("unread total for {uid} unreadable: {e}");
                0
            }
        }
    }

    pub async fn set_total(&self, uid: u64, total: i64) {
        let clamped = total.max(0);

        if let Err(e) = self
            .store
            .set(Scope::Session, &Self::key(uid), &clamped.to_string())
            .await
        {
            warn!("unread total for {uid} not persisted: {e}");
        }
    }

    pub async fn display(&self, uid: u64) -> String {
        match self.total(uid).await {
            0 => String::new(),
            n if n > 99 => "99+".to_string(),
            n => n.to_string(),
        }
    }
}
