//! # Engagement Gating
//!
//! Decision core for the interruptions shown around "like" and "start chat".
//!
//! Everything transport-shaped lives behind a trait: the profile/promotion
//! REST surface ([`api::MatchApi`]), the key-value store
//! ([`store::KeyValueStore`]), and the router ([`nav::Navigator`]). The
//! `server` crate wires the real reqwest/redis implementations; tests and the
//! `tester` binary run against in-memory stand-ins.
//!
//!
//!
//! # Flow
//!
//! - UI action calls [`gate::GateController::open_before`] (chat) or
//!   [`like::LikeIncentiveController::like_then_maybe`] (like)
//! - Both consult [`tier::TierResolver`] and [`chain::ContentSourceChain`]
//! - The chain consults [`dedup::DedupRegistry`] so one session never repeats
//!   an insert
//! - Result is a decision: proceed silently, or show item X and wait N seconds
//!
//!
//!
//! # Storage Keys
//!
//! Session scope (gone when the browsing session ends):
//! - `gate_suppress_once:<action>`: one-shot bypass armed by the upsell jump
//! - `chat_unread_total_v1:<uid>`: unread badge totals
//!
//! Durable scope (survives restarts):
//! - `vip_plus`: cached tier flag, written back after every successful remote
//!   tier check
//!
//!
//!
//! # Notes
//!
//! - Remote lookups are the only suspension points; between them, state
//!   transitions are plain field writes on `&mut self`
//! - Re-entrant gate invocations overwrite each other, latest caller wins
//! - A failed lookup never crosses its own step: each step degrades to the
//!   next source, the cached flag, or "no item"

pub mod api;
pub mod chain;
pub mod dedup;
pub mod error;
pub mod events;
pub mod gate;
pub mod item;
pub mod like;
pub mod nav;
pub mod store;
pub mod tier;
pub mod unread;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{LikeResult, MatchApi, PickRequest, ServerPick, UserProfile};
pub use chain::{ChainConfig, ContentSourceChain, ListPick, SelectContext};
pub use dedup::DedupRegistry;
pub use error::{ApiError, NavError, StoreError};
pub use events::{RefreshBus, RefreshSignal};
pub use gate::{DEFAULT_WAIT_SECONDS, GateController, GateDecision, GateOptions};
pub use item::{PromotionalItem, RawPromotion};
pub use like::{LikeDecision, LikeIncentiveController};
pub use nav::{FALLBACK_ROUTE, Navigator, UPSELL_ROUTE, resolve_destination};
pub use store::{KeyValueStore, MemoryStore, Scope};
pub use tier::TierResolver;
pub use unread::UnreadCounters;
