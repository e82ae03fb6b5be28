//! Premium ("VIP+") tier resolution.
//!
//! Two sources: a cached flag in the durable store, and the authoritative
//! profile lookup. The remote value, once obtained, supersedes the cache and
//! is written back so later degraded resolutions stay accurate.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::MatchApi;
use crate::store::{KeyValueStore, Scope};

/// Plan codes that count as premium, matched case-insensitively.
pub const PREMIUM_PLAN_CODES: [&str; 3] = ["vip_plus", "vip", "plus"];

pub(crate) const TIER_FLAG_KEY: &str = "vip_plus";

pub struct TierResolver {
    api: Arc<dyn MatchApi>,
    store: Arc<dyn KeyValueStore>,
}

impl TierResolver {
    pub fn new(api: Arc<dyn MatchApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { api, store }
    }

    pub async fn resolve(&self, user_id: Option<u64>) -> bool {
        let Some(uid) = user_id else {
            warn!("no identity for tier check, using cached flag only");
            return self.cached().await;
        };

        let profile = match self.api.fetch_user_profile(uid).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("profile lookup for {uid} failed, falling back to cached flag: {e}");
                return self.cached().await;
            }
        };

        let plan = profile.plan_code.to_lowercase();
        let premium = PREMIUM_PLAN_CODES.contains(&plan.as_str()) || profile.vip_plus;
        debug!("tier for {uid}: plan_code={plan} vip_plus={} -> {premium}", profile.vip_plus);

        let write_back = if premium {
            self.store.set(Scope::Durable, TIER_FLAG_KEY, "vip_plus").await
        } else {
            self.store.remove(Scope::Durable, TIER_FLAG_KEY).await
        };
        if let Err(e) = write_back {
            warn!("tier flag write-back failed: {e}");
        }

        premium
    }

    async fn cached(&self) -> bool {
        match self.store.get(Scope::Durable, TIER_FLAG_KEY).await {
            Ok(Some(raw)) => parse_flag(&raw),
            Ok(None) => false,
            Err(e) => {
                warn!("cached tier flag unreadable: {e}");
                false
            }
        }
    }
}

/// Historical flag values in the wild range from booleans to plan codes;
/// all of them count as set.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "vip_plus" | "vip+" | "vip" | "plus"
    )
}
