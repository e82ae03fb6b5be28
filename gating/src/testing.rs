//! In-memory capability stubs shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{LikeResult, MatchApi, PickRequest, ServerPick, UserProfile};
use crate::error::{ApiError, NavError};
use crate::item::RawPromotion;
use crate::nav::Navigator;

/// Canned REST backend. Anything not configured answers like a miss: the
/// profile lookup errors, promotion fetches 404, likes fail.
#[derive(Default)]
pub(crate) struct StubApi {
    profile: Option<Value>,
    ads: HashMap<u32, Value>,
    list: Vec<Value>,
    like: Option<Value>,
}

impl StubApi {
    pub(crate) fn with_profile(mut self, profile: Value) -> Self {
        self.profile = Some(profile);
        self
    }

    pub(crate) fn with_ad(mut self, id: u32, payload: Value) -> Self {
        self.ads.insert(id, payload);
        self
    }

    pub(crate) fn with_list(mut self, items: Vec<Value>) -> Self {
        self.list = items;
        self
    }

    pub(crate) fn with_like(mut self, result: Value) -> Self {
        self.like = Some(result);
        self
    }
}

#[async_trait]
impl MatchApi for StubApi {
    async fn fetch_user_profile(&self, _uid: u64) -> Result<UserProfile, ApiError> {
        let payload = self
            .profile
            .clone()
            .ok_or_else(|| ApiError::Transport("profile unreachable".to_string()))?;

        serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_promotion_list(&self, _limit: u32) -> Result<Vec<RawPromotion>, ApiError> {
        self.list
            .iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(|e| ApiError::Decode(e.to_string())))
            .collect()
    }

    async fn fetch_promotion_by_id(&self, id: u32) -> Result<RawPromotion, ApiError> {
        let payload = self.ads.get(&id).ok_or(ApiError::Status(404))?;

        serde_json::from_value(payload.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn submit_like(&self, _liker: u64, _likee: u64) -> Result<LikeResult, ApiError> {
        let payload = self
            .like
            .clone()
            .ok_or_else(|| ApiError::Transport("like unreachable".to_string()))?;

        serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Server pick returning a fixed id, recording the exclusions it was given.
pub(crate) struct FixedPick {
    answer: Option<u32>,
    fail: bool,
    exclusions: Mutex<Vec<u32>>,
}

impl FixedPick {
    pub(crate) fn new(answer: Option<u32>) -> Self {
        Self {
            answer,
            fail: false,
            exclusions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            answer: None,
            fail: true,
            exclusions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn last_exclusions(&self) -> Vec<u32> {
        self.exclusions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServerPick for FixedPick {
    async fn pick(&self, request: PickRequest<'_>) -> Result<Option<u32>, ApiError> {
        *self.exclusions.lock().unwrap() = request.exclude.to_vec();

        if self.fail {
            return Err(ApiError::Status(500));
        }

        Ok(self.answer)
    }
}

/// Records every navigation; optionally fails them all, the way a router
/// rejects a redundant navigation.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    fail: bool,
}

impl RecordingNavigator {
    pub(crate) fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate_to(&self, path: &str, query: &[(String, String)]) -> Result<(), NavError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), query.to_vec()));

        if self.fail {
            return Err(NavError::Redundant(path.to_string()));
        }

        Ok(())
    }
}
