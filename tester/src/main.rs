use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gating::{
    ApiError, ChainConfig, GateController, GateOptions, LikeIncentiveController, LikeResult,
    MatchApi, MemoryStore, NavError, Navigator, RawPromotion, RefreshBus, UserProfile,
};
use serde_json::json;

struct CannedApi {
    profiles: HashMap<u64, UserProfile>,
    ads: HashMap<u32, serde_json::Value>,
}

#[async_trait]
impl MatchApi for CannedApi {
    async fn fetch_user_profile(&self, uid: u64) -> Result<UserProfile, ApiError> {
        self.profiles.get(&uid).cloned().ok_or(ApiError::Status(404))
    }

    async fn fetch_promotion_list(&self, _limit: u32) -> Result<Vec<RawPromotion>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_promotion_by_id(&self, id: u32) -> Result<RawPromotion, ApiError> {
        let payload = self.ads.get(&id).ok_or(ApiError::Status(404))?;

        serde_json::from_value(payload.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn submit_like(&self, _liker: u64, likee: u64) -> Result<LikeResult, ApiError> {
        // every third like carries a promotion hint
        let result = if likee % 3 == 0 {
            json!({ "status": "pending", "ad_id": 2, "refresh": ["likes"] })
        } else {
            json!({ "status": "pending", "refresh": ["likes"] })
        };

        serde_json::from_value(result).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

struct PrintingNavigator;

#[async_trait]
impl Navigator for PrintingNavigator {
    async fn navigate_to(&self, path: &str, query: &[(String, String)]) -> Result<(), NavError> {
        println!("  -> navigate {path} {query:?}");

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let api = Arc::new(CannedApi {
        profiles: HashMap::from([(1, UserProfile {
            plan_code: "vip_plus".to_string(),
            vip_plus: true,
        })]),
        ads: HashMap::from([(2, json!({ "id": 2, "title": "Go VIP+", "destination": "/vip-plus" }))]),
    });
    let store = Arc::new(MemoryStore::new());
    let navigator = Arc::new(PrintingNavigator);

    let mut gate = GateController::for_chat(
        api.clone(),
        store.clone(),
        navigator.clone(),
        None,
        ChainConfig {
            limit: 3,
            ..Default::default()
        },
    );

    println!("free user opens the chat gate:");
    let decision = gate.open_before(&json!(42), GateOptions::default()).await;
    println!("  {decision:?}");

    println!("wait elapses:");
    gate.finish().await;

    println!("vip user opens the chat gate:");
    let decision = gate
        .open_before(&json!(42), GateOptions {
            me_id: Some(1),
            ..Default::default()
        })
        .await;
    println!("  {decision:?}");

    println!("user taps the upsell insert:");
    gate.see_promotion("mutual").await;

    println!("returning user opens the gate again (suppressed once):");
    let decision = gate.open_before(&json!(42), GateOptions::default()).await;
    println!("  {decision:?}");

    let bus = RefreshBus::default();
    let mut refreshes = bus.subscribe();
    let mut like = LikeIncentiveController::new(
        api,
        None,
        ChainConfig {
            limit: 3,
            ..Default::default()
        },
        bus,
        false,
    );

    println!("like without a promotion hint:");
    let decision = like.like_then_maybe(1, 2).await.unwrap();
    println!("  opened={} status={}", decision.opened, decision.result.status);

    println!("like with a promotion hint:");
    let decision = like.like_then_maybe(1, 3).await.unwrap();
    println!(
        "  opened={} item={:?}",
        decision.opened,
        decision.item.map(|item| item.title)
    );

    while let Ok(signal) = refreshes.try_recv() {
        println!("refresh broadcast: {signal:?}");
    }
}
