//! # Content Source Chain
//!
//! Ordered fallback for picking one promotional item, first hit wins:
//!
//! 1. inline item already attached to the triggering action's result
//! 2. server-driven "new pick", excluding everything already shown
//! 3. local rotation over synthetic ids `[1, limit]`
//! 4. configured static fallback
//!
//! Every remote failure inside a step is swallowed and treated as "no
//! result" for that step. A chain that exhausts all four steps returns
//! `None`, which is a legitimate outcome, not an error.

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::api::{MatchApi, PickRequest, ServerPick};
use crate::dedup::DedupRegistry;
use crate::item::{PromotionalItem, RawPromotion};

#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Upper bound of the synthetic id range for local rotation.
    pub limit: u32,
    /// Lookup attempts before the rotation step gives up.
    pub max_tries: u32,
    /// Disables the rotation step entirely when false.
    pub rotate: bool,
    pub fallback: Option<RawPromotion>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            limit: 2000,
            max_tries: 50,
            rotate: true,
            fallback: None,
        }
    }
}

/// What the triggering call site knows: an inline item if the backend sent
/// one, and who is acting on whom (forwarded to the server pick).
#[derive(Debug, Clone, Default)]
pub struct SelectContext<'a> {
    pub inline: Option<&'a RawPromotion>,
    pub actor: Option<u64>,
    pub target: Option<u64>,
}

pub struct ContentSourceChain {
    api: Arc<dyn MatchApi>,
    pick: Option<Arc<dyn ServerPick>>,
    config: ChainConfig,
    cursor: u32,
}

impl ContentSourceChain {
    pub fn new(
        api: Arc<dyn MatchApi>,
        pick: Option<Arc<dyn ServerPick>>,
        config: ChainConfig,
    ) -> Self {
        Self {
            api,
            pick,
            config,
            cursor: 0,
        }
    }

    pub async fn select(
        &mut self,
        registry: &DedupRegistry,
        context: SelectContext<'_>,
    ) -> Option<PromotionalItem> {
        if let Some(raw) = context.inline {
            return Some(raw.normalize());
        }

        if let Some(item) = self.server_pick(registry, &context).await {
            return Some(item);
        }

        if let Some(item) = self.local_rotate(registry).await {
            return Some(item);
        }

        self.config.fallback.as_ref().map(RawPromotion::normalize)
    }

    async fn server_pick(
        &self,
        registry: &DedupRegistry,
        context: &SelectContext<'_>,
    ) -> Option<PromotionalItem> {
        let pick = self.pick.as_ref()?;
        let exclude = registry.snapshot();

        let request = PickRequest {
            actor: context.actor,
            target: context.target,
            limit: self.config.limit,
            exclude: &exclude,
        };

        match pick.pick(request).await {
            Ok(Some(id)) => self.fetch_by_id(id).await,
            Ok(None) => None,
            Err(e) => {
                debug!("server pick failed: {e}");
                None
            }
        }
    }

    async fn local_rotate(&mut self, registry: &DedupRegistry) -> Option<PromotionalItem> {
        if !self.config.rotate || self.config.limit == 0 {
            return None;
        }

        for _ in 0..self.config.max_tries {
            let guess = self.next_local_id();
            if registry.has_seen(guess) {
                continue;
            }

            if let Some(item) = self.fetch_by_id(guess).await {
                return Some(item);
            }
        }

        None
    }

    /// Monotonic cursor modulo `limit`, plus 0-2 of jitter so the sequence
    /// is not strictly predictable.
    fn next_local_id(&mut self) -> u32 {
        self.cursor = (self.cursor + 1) % self.config.limit;
        let jitter = rand::rng().random_range(0..3);

        1 + ((self.cursor + jitter) % self.config.limit)
    }

    async fn fetch_by_id(&self, id: u32) -> Option<PromotionalItem> {
        match self.api.fetch_promotion_by_id(id).await {
            Ok(raw) => Some(raw.normalize()),
            Err(e) => {
                debug!("promotion {id} not fetchable: {e}");
                None
            }
        }
    }
}

/// Default [`ServerPick`]: pull the promotion list and pick a random entry
/// whose id is not excluded.
pub struct ListPick {
    api: Arc<dyn MatchApi>,
}

impl ListPick {
    pub fn new(api: Arc<dyn MatchApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl ServerPick for ListPick {
    async fn pick(&self, request: PickRequest<'_>) -> Result<Option<u32>, crate::error::ApiError> {
        let pool = self.api.fetch_promotion_list(request.limit).await?;

        let fresh: Vec<u32> = pool
            .iter()
            .filter_map(|raw| raw.normalize().id)
            .filter(|id| !request.exclude.contains(id))
            .collect();

        if fresh.is_empty() {
            return Ok(None);
        }

        let index = rand::rng().random_range(0..fresh.len());
        Ok(Some(fresh[index]))
    }
}
