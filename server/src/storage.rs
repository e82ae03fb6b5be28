//! # Redis
//!
//! Backs the two key-value scopes the gating core needs:
//!
//! - Session keys get a TTL and a `sess:` prefix; when it lapses the
//!   suppression flags and unread totals are gone, which is exactly the
//!   "browsing session ended" semantics.
//! - Durable keys (`dur:` prefix) are written plain and survive restarts;
//!   the cached tier flag lives here.

use std::time::Duration;

use async_trait::async_trait;
use gating::{KeyValueStore, Scope, StoreError};
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}

pub struct RedisStore {
    connection: ConnectionManager,
    session_ttl_seconds: u64,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager, session_ttl_seconds: u64) -> Self {
        Self {
            connection,
            session_ttl_seconds,
        }
    }

    fn key(scope: Scope, key: &str) -> String {
        match scope {
            Scope::Session => format!("sess:{key}"),
            Scope::Durable => format!("dur:{key}"),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();

        let value: Option<String> = connection
            .get(Self::key(scope, key))
            .await
            .map_err(backend)?;

        Ok(value)
    }

    async fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let full_key = Self::key(scope, key);

        match scope {
            Scope::Session => {
                let _: () = connection
                    .set_ex(full_key, value, self.session_ttl_seconds)
                    .await
                    .map_err(backend)?;
            }
            Scope::Durable => {
                let _: () = connection.set(full_key, value).await.map_err(backend)?;
            }
        }

        Ok(())
    }

    async fn remove(&self, scope: Scope, key: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let _: () = connection.del(Self::key(scope, key)).await.map_err(backend)?;

        Ok(())
    }
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}
