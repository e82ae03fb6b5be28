use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex};

use async_trait::async_trait;
use gating::{
    ChainConfig, GateController, LikeIncentiveController, ListPick, NavError, Navigator,
    RefreshBus, ServerPick, UnreadCounters,
};
use serde::Serialize;
use tokio::sync::Mutex;

use super::{
    client::RestApi,
    config::Config,
    storage::{RedisStore, init_redis},
};

pub struct State {
    pub config: Config,
    pub api: Arc<RestApi>,
    pub store: Arc<RedisStore>,
    pub bus: RefreshBus,
    pub unread: UnreadCounters,
    pub sessions: Mutex<HashMap<u64, UserSession>>,
}

impl State {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let connection = init_redis(&config.redis_url).await;
        let store = Arc::new(RedisStore::new(connection, config.session_ttl_seconds));
        let api = Arc::new(RestApi::new(config.api_base_url.clone()));

        Arc::new(Self {
            unread: UnreadCounters::new(store.clone()),
            config,
            api,
            store,
            bus: RefreshBus::default(),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// One controller pair per acting user, created on first use. Dropped on
    /// session reset, which is what forgets the shown-item registry.
    pub fn build_session(&self) -> UserSession {
        let nav = Arc::new(RouteSink::default());
        let pick: Arc<dyn ServerPick> = Arc::new(ListPick::new(self.api.clone()));

        UserSession {
            gate: GateController::for_chat(
                self.api.clone(),
                self.store.clone(),
                nav.clone(),
                Some(pick.clone()),
                ChainConfig::default(),
            ),
            like: LikeIncentiveController::new(
                self.api.clone(),
                Some(pick),
                ChainConfig::default(),
                self.bus.clone(),
                self.config.enforce_like_ads,
            ),
            nav,
        }
    }
}

pub struct UserSession {
    pub gate: GateController,
    pub like: LikeIncentiveController,
    pub nav: Arc<RouteSink>,
}

/// Where the frontend should send the user next, echoed back in responses.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDirective {
    pub path: String,
    pub query: Vec<(String, String)>,
}

/// Navigator that buffers the latest directive instead of routing anywhere;
/// handlers drain it into the HTTP response.
#[derive(Default)]
pub struct RouteSink {
    last: SyncMutex<Option<RouteDirective>>,
}

impl RouteSink {
    pub fn take(&self) -> Option<RouteDirective> {
        self.last.lock().unwrap().take()
    }
}

#[async_trait]
impl Navigator for RouteSink {
    async fn navigate_to(&self, path: &str, query: &[(String, String)]) -> Result<(), NavError> {
        *self.last.lock().unwrap() = Some(RouteDirective {
            path: path.to_string(),
            query: query.to_vec(),
        });

        Ok(())
    }
}
