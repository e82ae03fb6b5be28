//! Post-like incentive: non-blocking variant of the gate.
//!
//! The like goes through first, a refresh broadcast goes out immediately,
//! and only then does the controller decide whether the result warrants a
//! promotional insert. Unlike the chat gate there is no wait and no
//! suppression; the insert either shows or it does not.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{LikeResult, MatchApi, ServerPick};
use crate::chain::{ChainConfig, ContentSourceChain, SelectContext};
use crate::dedup::DedupRegistry;
use crate::error::ApiError;
use crate::events::{RefreshBus, RefreshSignal};
use crate::item::{PromotionalItem, coerce_id};

#[derive(Debug)]
pub struct LikeDecision {
    /// Whether the insert should be surfaced.
    pub opened: bool,
    pub item: Option<PromotionalItem>,
    pub result: LikeResult,
}

pub struct LikeIncentiveController {
    api: Arc<dyn MatchApi>,
    chain: ContentSourceChain,
    registry: DedupRegistry,
    bus: RefreshBus,
    /// When true, an insert shows whenever any source yields one, even
    /// without a backend hint.
    enforce_always: bool,
}

impl LikeIncentiveController {
    pub fn new(
        api: Arc<dyn MatchApi>,
        pick: Option<Arc<dyn ServerPick>>,
        config: ChainConfig,
        bus: RefreshBus,
        enforce_always: bool,
    ) -> Self {
        Self {
            api: api.clone(),
            chain: ContentSourceChain::new(api, pick, config),
            registry: DedupRegistry::new(),
            bus,
            enforce_always,
        }
    }

    /// Session-end / logout hook.
    pub fn reset(&mut self) {
        self.registry.reset();
    }

    /// Submits the like, then decides whether to surface an insert.
    ///
    /// The submission itself is the primary action: its failure propagates.
    /// Every promotional lookup after it degrades silently.
    pub async fn like_then_maybe(
        &mut self,
        actor: u64,
        target: u64,
    ) -> Result<LikeDecision, ApiError> {
        let result = self.api.submit_like(actor, target).await?;

        // broadcast first so list views reload regardless of the ad outcome
        self.bus.emit(RefreshSignal {
            actor_id: actor,
            target_id: target,
            status: result.status.clone(),
            refresh_hints: result.refresh.clone(),
        });

        let had_hint = result.ad.is_some()
            || result.ad_id.as_ref().and_then(coerce_id).is_some()
            || result
                .advert
                .as_ref()
                .is_some_and(|raw| raw.normalize().id.is_some());

        // the fallback chain is only reachable when the backend asked for a
        // promotion, or the caller opted into unconditional enforcement
        if !self.enforce_always && !had_hint {
            debug!("like by {actor} on {target}: no promotion hint, no insert");
            return Ok(LikeDecision {
                opened: false,
                item: None,
                result,
            });
        }

        let item = match self.hinted_item(&result).await {
            Some(item) => Some(item),
            None => {
                self.chain
                    .select(&self.registry, SelectContext {
                        inline: None,
                        actor: Some(actor),
                        target: Some(target),
                    })
                    .await
            }
        };

        let Some(item) = item else {
            debug!("like by {actor} on {target}: every source empty, no insert");
            return Ok(LikeDecision {
                opened: false,
                item: None,
                result,
            });
        };

        if let Some(id) = item.id {
            self.registry.mark_seen(id);
        }
        info!("like by {actor} on {target}: insert {:?} shown", item.id);

        Ok(LikeDecision {
            opened: true,
            item: Some(item),
            result,
        })
    }

    /// Backend-designated item, in priority order: inline `ad`, flat
    /// `ad_id`, nested `advert` with an id. Fetch failures degrade to the
    /// chain.
    async fn hinted_item(&self, result: &LikeResult) -> Option<PromotionalItem> {
        if let Some(raw) = &result.ad {
            return Some(raw.normalize());
        }

        if let Some(id) = result.ad_id.as_ref().and_then(coerce_id) {
            if let Some(item) = self.fetch_by_id(id).await {
                return Some(item);
            }
        }

        if let Some(id) = result.advert.as_ref().and_then(|raw| raw.normalize().id) {
            return self.fetch_by_id(id).await;
        }

        None
    }

    async fn fetch_by_id(&self, id: u32) -> Option<PromotionalItem> {
        match self.api.fetch_promotion_by_id(id).await {
            Ok(raw) => Some(raw.normalize()),
            Err(e) => {
                debug!("hinted promotion {id} not fetchable: {e}");
                None
            }
        }
    }
}
