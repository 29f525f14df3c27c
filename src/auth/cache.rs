use anyhow::Context;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use uuid::Uuid;

use crate::auth::repo_types::PublicUser;

/// Ephemeral user lookups keyed by user id.
///
/// Entries carry no expiry; they are written at login/register and on a
/// verification miss, and removed only by logout.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<PublicUser>>;
    async fn put(&self, user: &PublicUser) -> anyhow::Result<()>;
    async fn evict(&self, user_id: Uuid) -> anyhow::Result<()>;
}

pub fn session_key(user_id: Uuid) -> String {
    format!("user:{}", user_id)
}

#[derive(Clone)]
pub struct RedisSessionCache {
    manager: ConnectionManager,
}

impl RedisSessionCache {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = Client::open(url).context("invalid redis url")?;
        let manager = ConnectionManager::new(client)
            .await
            .context("connect to redis")?;
        tracing::info!("session cache connected");
        Ok(Self { manager })
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<PublicUser>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn
            .get(session_key(user_id))
            .await
            .context("redis GET session")?;
        raw.map(|s| serde_json::from_str(&s).context("decode cached user"))
            .transpose()
    }

    async fn put(&self, user: &PublicUser) -> anyhow::Result<()> {
        let mut conn = self.manager.clone();
        let json = serde_json::to_string(user)?;
        conn.set::<_, _, ()>(session_key(user.id), json)
            .await
            .context("redis SET session")?;
        Ok(())
    }

    async fn evict(&self, user_id: Uuid) -> anyhow::Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(session_key(user_id))
            .await
            .context("redis DEL session")?;
        Ok(())
    }
}
