//! # Chat Gate
//!
//! State machine around "start a chat": decide whether to interrupt, with
//! what, and for how long.
//!
//! `Idle -> Resolving -> Open(wait, item) -> {Bypassed, Completed}`
//!
//! - Premium tier drops the wait to zero but still sees the insert
//! - A one-shot suppression flag, armed when the user jumps to the upsell
//!   page, lets the next invocation pass straight through
//! - Re-invocation while open overwrites the session, latest caller wins

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::api::{MatchApi, ServerPick};
use crate::chain::{ChainConfig, ContentSourceChain, SelectContext};
use crate::dedup::DedupRegistry;
use crate::item::{PromotionalItem, RawPromotion, coerce_id};
use crate::nav::{Navigator, UPSELL_ROUTE, is_external, resolve_destination};
use crate::store::{KeyValueStore, Scope};
use crate::tier::TierResolver;

/// Wait imposed on non-premium users when the caller does not supply one.
pub const DEFAULT_WAIT_SECONDS: u64 = 15;

const SUPPRESS_KEY_PREFIX: &str = "gate_suppress_once";

/// Per-invocation transient state. Overwritten wholesale on re-invocation,
/// cleared on completion or on navigation to the promotional destination.
#[derive(Debug, Default)]
struct GateSession {
    pending_target: Option<u64>,
    required_wait: u64,
    selected: Option<PromotionalItem>,
    open: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GateOptions {
    /// Acting user, for the authoritative tier check. Without it the check
    /// degrades to the cached flag.
    pub me_id: Option<u64>,
    /// Overrides the non-premium wait.
    pub seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Action proceeds with no interruption.
    NotGated,
    /// Interruption is up; the action waits.
    Opened {
        wait_seconds: u64,
        item: PromotionalItem,
    },
}

pub struct GateController {
    action: &'static str,
    tier: TierResolver,
    chain: ContentSourceChain,
    registry: DedupRegistry,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    session: GateSession,
}

impl GateController {
    /// Gate for the chat action. `pick` is the optional server-driven
    /// selection strategy; without it the chain rotates locally.
    pub fn for_chat(
        api: Arc<dyn MatchApi>,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        pick: Option<Arc<dyn ServerPick>>,
        config: ChainConfig,
    ) -> Self {
        Self {
            action: "chat",
            tier: TierResolver::new(api.clone(), store.clone()),
            chain: ContentSourceChain::new(api, pick, config),
            registry: DedupRegistry::new(),
            store,
            navigator,
            session: GateSession::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.open
    }

    pub fn selected_item(&self) -> Option<&PromotionalItem> {
        self.session.selected.as_ref()
    }

    /// Session-end / logout hook: forget shown items and any open gate.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.session = GateSession::default();
    }

    /// Entry point, called before the chat action executes.
    ///
    /// `target` is the chat counterpart: a bare id, or an object carrying
    /// `id`/`user_id`/`userId`. Anything that does not resolve to a positive
    /// integer aborts with [`GateDecision::NotGated`] and no state change.
    pub async fn open_before(&mut self, target: &Value, options: GateOptions) -> GateDecision {
        if self.consume_suppression().await {
            if let Some(n) = coerce_target(target) {
                info!("suppression armed, {} proceeds directly to {n}", self.action);
                self.session = GateSession {
                    pending_target: Some(n),
                    ..Default::default()
                };
                self.finish().await;
            }
            return GateDecision::NotGated;
        }

        let Some(n) = coerce_target(target) else {
            warn!("invalid {} gate target: {target}", self.action);
            return GateDecision::NotGated;
        };

        // latest caller wins: any earlier open session is overwritten
        self.session = GateSession {
            pending_target: Some(n),
            ..Default::default()
        };

        let premium = self.tier.resolve(options.me_id).await;
        self.session.required_wait = if premium {
            0
        } else {
            options.seconds.unwrap_or(DEFAULT_WAIT_SECONDS)
        };

        let item = self
            .chain
            .select(&self.registry, SelectContext {
                inline: None,
                actor: options.me_id,
                target: Some(n),
            })
            .await
            .unwrap_or_else(|| default_upsell_item().normalize());

        if let Some(id) = item.id {
            self.registry.mark_seen(id);
        }

        info!(
            "{} gate open for {n}: wait={}s item={:?}",
            self.action, self.session.required_wait, item.id
        );

        self.session.selected = Some(item.clone());
        self.session.open = true;

        GateDecision::Opened {
            wait_seconds: self.session.required_wait,
            item,
        }
    }

    /// Wait elapsed, or a premium user skipped. Executes the gated action.
    pub async fn finish(&mut self) {
        let Some(n) = self.session.pending_target else {
            warn!("{} gate finished with no pending target", self.action);
            return;
        };

        self.session = GateSession::default();
        self.navigate(&format!("/chat/{n}"), Vec::new()).await;
    }

    /// User activated the promotional item instead of waiting it out.
    ///
    /// The upsell route arms the suppression flag before navigating, so the
    /// user coming back is not interrupted a second time. Everything else
    /// routes through the generic destination resolution.
    pub async fn see_promotion(&mut self, origin: &str) {
        let Some(item) = self.session.selected.clone() else {
            return;
        };
        self.session.open = false;

        let mut dest = item.destination.clone();
        if dest.is_empty() {
            if let Some(id) = item.id {
                dest = format!("/ad/{id}");
            }
        }
        if dest.is_empty() {
            self.session = GateSession::default();
            return;
        }
        if !is_external(&dest) && !dest.starts_with('/') {
            dest.insert(0, '/');
        }

        if is_external(&dest) {
            self.navigate(&dest, Vec::new()).await;
        } else if dest.starts_with(UPSELL_ROUTE) {
            self.arm_suppression().await;

            let target = self
                .session
                .pending_target
                .map(|n| n.to_string())
                .unwrap_or_default();
            self.navigate(&dest, vec![
                ("from".to_string(), origin.to_string()),
                ("target".to_string(), target),
            ])
            .await;
        } else {
            let (path, query) = resolve_destination(&item, origin);
            self.navigate(&path, query).await;
        }

        self.session = GateSession::default();
    }

    fn suppress_key(&self) -> String {
        format!("{SUPPRESS_KEY_PREFIX}:{}", self.action)
    }

    async fn arm_suppression(&self) {
        if let Err(e) = self.store.set(Scope::Session, &self.suppress_key(), "1").await {
            warn!("suppression flag not armed: {e}");
        }
    }

    /// Read-once: an armed flag is cleared by the check that observes it,
    /// even when the invocation's own target turns out invalid.
    async fn consume_suppression(&self) -> bool {
        let key = self.suppress_key();

        match self.store.get(Scope::Session, &key).await {
            Ok(Some(v)) if v == "1" => {
                if let Err(e) = self.store.remove(Scope::Session, &key).await {
                    warn!("suppression flag not cleared: {e}");
                }
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!("suppression flag unreadable: {e}");
                false
            }
        }
    }

    async fn navigate(&self, path: &str, query: Vec<(String, String)>) {
        if let Err(e) = self.navigator.navigate_to(path, &query).await {
            // redundant-navigation noise must not block the gate
            warn!("navigation to {path} failed: {e}");
        }
    }
}

/// Accepts a bare positive integer (number or numeric string) or an object
/// carrying one under `id`, `user_id` or `userId`.
pub fn coerce_target(value: &Value) -> Option<u64> {
    let candidate = match value {
        Value::Object(map) => map.get("id").or_else(|| map.get("user_id")).or_else(|| map.get("userId"))?,
        other => other,
    };

    coerce_id(candidate).map(u64::from)
}

/// Shown when every content source comes up empty; the gate never opens
/// itemless.
pub(crate) fn default_upsell_item() -> RawPromotion {
    serde_json::from_value(serde_json::json!({
        "id": 1001,
        "title": "Go VIP+ and skip the wait",
        "desc": "Ad-free chats, more exposure, faster matches",
        "img": "https://placehold.co/400x200?text=VIP%2B",
        "destination": UPSELL_ROUTE,
    }))
    .expect("static default item")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{RecordingNavigator, StubApi};

    fn gate_with(api: StubApi) -> (GateController, Arc<MemoryStore>, Arc<RecordingNavigator>) {
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(RecordingNavigator::default());
        let gate = GateController::for_chat(
            Arc::new(api),
            store.clone(),
            nav.clone(),
            None,
            ChainConfig::default(),
        );

        (gate, store, nav)
    }

    fn api_with_ads() -> StubApi {
        StubApi::default()
            .with_ad(1, json!({ "id": 1, "destination": "/boost" }))
            .with_ad(2, json!({ "id": 2, "destination": "/boost" }))
            .with_ad(3, json!({ "id": 3, "destination": "/boost" }))
    }

    #[tokio::test]
    async fn test_invalid_target_is_not_gated() {
        let (mut gate, _, nav) = gate_with(api_with_ads());

        assert_eq!(gate.open_before(&json!("nope"), GateOptions::default()).await, GateDecision::NotGated);
        assert_eq!(gate.open_before(&json!(-2), GateOptions::default()).await, GateDecision::NotGated);
        assert!(!gate.is_open());
        assert!(nav.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_premium_defaults_to_fifteen_seconds() {
        let (mut gate, _, _) = gate_with(api_with_ads());

        let decision = gate.open_before(&json!(7), GateOptions::default()).await;

        match decision {
            GateDecision::Opened { wait_seconds, .. } => assert_eq!(wait_seconds, 15),
            other => panic!("expected opened gate, got {other:?}"),
        }
        assert!(gate.is_open());
    }

    #[tokio::test]
    async fn test_caller_seconds_override() {
        let (mut gate, _, _) = gate_with(api_with_ads());

        let decision = gate
            .open_before(&json!(7), GateOptions {
                seconds: Some(30),
                ..Default::default()
            })
            .await;

        match decision {
            GateDecision::Opened { wait_seconds, .. } => assert_eq!(wait_seconds, 30),
            other => panic!("expected opened gate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_premium_waits_zero_but_still_sees_item() {
        let api = api_with_ads().with_profile(json!({ "plan_code": "vip_plus" }));
        let (mut gate, _, _) = gate_with(api);

        let decision = gate
            .open_before(&json!(7), GateOptions {
                me_id: Some(1),
                seconds: Some(30),
                ..Default::default()
            })
            .await;

        match decision {
            GateDecision::Opened { wait_seconds, item } => {
                assert_eq!(wait_seconds, 0);
                assert!(item.id.is_some());
            }
            other => panic!("expected opened gate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_object_targets_coerce() {
        let (mut gate, _, _) = gate_with(api_with_ads());

        let decision = gate
            .open_before(&json!({ "user_id": "9" }), GateOptions::default())
            .await;

        assert!(matches!(decision, GateDecision::Opened { .. }));
    }

    #[tokio::test]
    async fn test_all_sources_failing_substitutes_default_item() {
        // no ads fetchable at all
        let (mut gate, _, _) = gate_with(StubApi::default());

        let decision = gate.open_before(&json!(7), GateOptions::default()).await;

        match decision {
            GateDecision::Opened { item, .. } => {
                assert_eq!(item.id, Some(1001));
                assert_eq!(item.destination, UPSELL_ROUTE);
            }
            other => panic!("expected opened gate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_finish_navigates_to_chat() {
        let (mut gate, _, nav) = gate_with(api_with_ads());

        gate.open_before(&json!(7), GateOptions::default()).await;
        gate.finish().await;

        assert!(!gate.is_open());
        assert_eq!(nav.calls(), vec![("/chat/7".to_string(), Vec::new())]);
    }

    #[tokio::test]
    async fn test_upsell_jump_arms_suppression_once() {
        let api = StubApi::default().with_ad(1, json!({ "id": 1, "destination": "/vip-plus" }));
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(RecordingNavigator::default());
        let mut gate = GateController::for_chat(
            Arc::new(api),
            store.clone(),
            nav.clone(),
            None,
            ChainConfig {
                limit: 1,
                ..Default::default()
            },
        );

        gate.open_before(&json!(7), GateOptions::default()).await;
        gate.see_promotion("mutual").await;

        assert_eq!(
            store.get(Scope::Session, "gate_suppress_once:chat").await.unwrap(),
            Some("1".to_string())
        );
        let (path, query) = nav.calls().pop().unwrap();
        assert_eq!(path, "/vip-plus");
        assert!(query.contains(&("from".to_string(), "mutual".to_string())));
        assert!(query.contains(&("target".to_string(), "7".to_string())));

        // next invocation passes straight through and clears the flag
        let decision = gate.open_before(&json!(8), GateOptions::default()).await;
        assert_eq!(decision, GateDecision::NotGated);
        assert_eq!(nav.calls().last().unwrap().0, "/chat/8");
        assert_eq!(
            store.get(Scope::Session, "gate_suppress_once:chat").await.unwrap(),
            None
        );

        // third invocation is gated again
        let decision = gate.open_before(&json!(8), GateOptions::default()).await;
        assert!(matches!(decision, GateDecision::Opened { .. }));
    }

    #[tokio::test]
    async fn test_suppression_consumed_even_for_invalid_target() {
        let (mut gate, store, nav) = gate_with(api_with_ads());
        store.set(Scope::Session, "gate_suppress_once:chat", "1").await.unwrap();

        let decision = gate.open_before(&json!(0), GateOptions::default()).await;

        assert_eq!(decision, GateDecision::NotGated);
        assert!(nav.calls().is_empty());
        assert_eq!(
            store.get(Scope::Session, "gate_suppress_once:chat").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_non_upsell_destination_does_not_arm() {
        let api = StubApi::default().with_ad(1, json!({ "id": 1, "destination": "/boost" }));
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(RecordingNavigator::default());
        let mut gate = GateController::for_chat(
            Arc::new(api),
            store.clone(),
            nav.clone(),
            None,
            ChainConfig {
                limit: 1,
                ..Default::default()
            },
        );

        gate.open_before(&json!(7), GateOptions::default()).await;
        gate.see_promotion("recommend").await;

        assert_eq!(
            store.get(Scope::Session, "gate_suppress_once:chat").await.unwrap(),
            None
        );
        // internal destination with a valid id lands on the detail route
        assert_eq!(nav.calls().pop().unwrap().0, "/ad/1");
    }

    #[tokio::test]
    async fn test_navigation_failure_still_closes_gate() {
        let api = api_with_ads();
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(RecordingNavigator::failing());
        let mut gate = GateController::for_chat(
            Arc::new(api),
            store,
            nav,
            None,
            ChainConfig::default(),
        );

        gate.open_before(&json!(7), GateOptions::default()).await;
        gate.finish().await;

        assert!(!gate.is_open());
        assert!(gate.selected_item().is_none());
    }

    #[tokio::test]
    async fn test_reinvocation_overwrites_open_session() {
        let (mut gate, _, nav) = gate_with(api_with_ads());

        gate.open_before(&json!(7), GateOptions::default()).await;
        assert!(gate.is_open());

        gate.open_before(&json!(9), GateOptions::default()).await;
        gate.finish().await;

        // the second target wins
        assert_eq!(nav.calls().pop().unwrap().0, "/chat/9");
    }
}
