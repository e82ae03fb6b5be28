use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use gating::{GateDecision, GateOptions, PromotionalItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::AppError,
    state::{RouteDirective, State as AppState},
};

#[derive(Deserialize)]
pub struct OpenGateRequest {
    pub me_id: Option<u64>,
    /// Bare id or an object carrying `id`/`user_id`/`userId`.
    pub target: Value,
    pub seconds: Option<u64>,
}

#[derive(Serialize)]
pub struct GateResponse {
    pub gated: bool,
    pub wait_seconds: Option<u64>,
    pub item: Option<PromotionalItem>,
    pub navigate: Option<RouteDirective>,
}

#[derive(Deserialize)]
pub struct SessionRequest {
    pub me_id: Option<u64>,
}

#[derive(Deserialize)]
pub struct SeeRequest {
    pub me_id: Option<u64>,
    pub origin: Option<String>,
}

#[derive(Serialize)]
pub struct NavigateResponse {
    pub navigate: Option<RouteDirective>,
}

#[derive(Deserialize)]
pub struct LikeRequest {
    pub liker_id: u64,
    pub likee_id: u64,
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub opened: bool,
    pub item: Option<PromotionalItem>,
    pub status: String,
    pub refresh: Vec<String>,
}

#[derive(Serialize)]
pub struct UnreadResponse {
    pub total: u64,
    pub display: String,
}

// sessions are keyed by acting user; anonymous callers share slot 0
fn session_key(me_id: Option<u64>) -> u64 {
    me_id.unwrap_or(0)
}

pub async fn open_gate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpenGateRequest>,
) -> Json<GateResponse> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .entry(session_key(request.me_id))
        .or_insert_with(|| state.build_session());

    let decision = session
        .gate
        .open_before(&request.target, GateOptions {
            me_id: request.me_id,
            seconds: request.seconds,
        })
        .await;

    let navigate = session.nav.take();
    Json(match decision {
        GateDecision::NotGated => GateResponse {
            gated: false,
            wait_seconds: None,
            item: None,
            navigate,
        },
        GateDecision::Opened { wait_seconds, item } => GateResponse {
            gated: true,
            wait_seconds: Some(wait_seconds),
            item: Some(item),
            navigate,
        },
    })
}

pub async fn finish_gate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SessionRequest>,
) -> Json<NavigateResponse> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .entry(session_key(request.me_id))
        .or_insert_with(|| state.build_session());

    session.gate.finish().await;

    Json(NavigateResponse {
        navigate: session.nav.take(),
    })
}

pub async fn see_ad_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SeeRequest>,
) -> Json<NavigateResponse> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .entry(session_key(request.me_id))
        .or_insert_with(|| state.build_session());

    let origin = request.origin.as_deref().unwrap_or("mutual");
    session.gate.see_promotion(origin).await;

    Json(NavigateResponse {
        navigate: session.nav.take(),
    })
}

pub async fn like_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LikeRequest>,
) -> Result<Json<LikeResponse>, AppError> {
    if request.liker_id == 0 || request.likee_id == 0 {
        return Err(AppError::MalformedPayload);
    }

    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .entry(request.liker_id)
        .or_insert_with(|| state.build_session());

    let decision = session
        .like
        .like_then_maybe(request.liker_id, request.likee_id)
        .await?;

    Ok(Json(LikeResponse {
        opened: decision.opened,
        item: decision.item,
        status: decision.result.status,
        refresh: decision.result.refresh,
    }))
}

pub async fn unread_handler(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<u64>,
) -> Json<UnreadResponse> {
    Json(UnreadResponse {
        total: state.unread.total(uid).await,
        display: state.unread.display(uid).await,
    })
}

/// Logout / session end: dropping the controllers forgets the shown-item
/// registry and any open gate.
pub async fn reset_session_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SessionRequest>,
) -> Json<Value> {
    state
        .sessions
        .lock()
        .await
        .remove(&session_key(request.me_id));

    Json(serde_json::json!({ "status": "reset" }))
}
