//! Consumed REST surface.
//!
//! The real backend is a flat set of one-line REST wrappers; this trait is
//! the subset the gating core actually calls. The `server` crate implements
//! it over reqwest, tests substitute a stub.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::item::RawPromotion;

/// Profile payload from `user/main/{uid}`. Only the tier-relevant fields are
/// kept; the rest of the display payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub plan_code: String,

    #[serde(default)]
    pub vip_plus: bool,
}

/// Result of submitting a like. The backend decides whether the action
/// warrants a promotion, either inline (`ad`), by id (`ad_id`), or nested
/// (`advert`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeResult {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub ad: Option<RawPromotion>,

    #[serde(default)]
    pub ad_id: Option<Value>,

    #[serde(default)]
    pub advert: Option<RawPromotion>,

    #[serde(default)]
    pub refresh: Vec<String>,
}

#[async_trait]
pub trait MatchApi: Send + Sync {
    async fn fetch_user_profile(&self, uid: u64) -> Result<UserProfile, ApiError>;

    async fn fetch_promotion_list(&self, limit: u32) -> Result<Vec<RawPromotion>, ApiError>;

    async fn fetch_promotion_by_id(&self, id: u32) -> Result<RawPromotion, ApiError>;

    async fn submit_like(&self, liker: u64, likee: u64) -> Result<LikeResult, ApiError>;
}

/// Inputs for a server-driven "new pick" call.
#[derive(Debug, Clone)]
pub struct PickRequest<'a> {
    pub actor: Option<u64>,
    pub target: Option<u64>,
    pub limit: u32,
    /// Ids already shown this session, to be excluded server-side.
    pub exclude: &'a [u32],
}

/// Injected strategy for asking the backend to pick a fresh promotion id.
/// Optional: a chain without one skips straight to local rotation.
#[async_trait]
pub trait ServerPick: Send + Sync {
    async fn pick(&self, request: PickRequest<'_>) -> Result<Option<u32>, ApiError>;
}
