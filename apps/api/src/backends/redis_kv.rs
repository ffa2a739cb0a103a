use anyhow::Result;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::gateway::{KvApi, KvItem, KvListing};

/// Redis-backed key-value store, listed with incremental `SCAN`. Every key lives under `{namespace}:` so that
/// `flush` only ever touches this application's records.
pub struct RedisKv {
    conn: MultiplexedConnection,
    namespace: String,
}

impl RedisKv {
    pub fn new(conn: MultiplexedConnection, namespace: String) -> Self {
        Self { conn, namespace }
    }

    fn scoped(&self, key: &str) -> String {
        scoped_key(&self.namespace, key)
    }

    async fn matching_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        let mut iter: redis::AsyncIter<String> = conn.scan_match(self.scoped(pattern)).await?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        drop(iter);
        Ok(normalize_keys(keys))
    }
}

/// SCAN may repeat a key across cursor steps.
fn normalize_keys(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys.dedup();
    keys
}

fn scoped_key(namespace: &str, key: &str) -> String {
    format!("{namespace}:{key}")
}

fn unscoped_key<'a>(namespace: &str, key: &'a str) -> &'a str {
    key.strip_prefix(namespace)
        .and_then(|k| k.strip_prefix(':'))
        .unwrap_or(key)
}

#[async_trait]
impl KvApi for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.scoped(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.scoped(key), value).await?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(self.scoped(key)).await?;
        Ok(removed > 0)
    }

    async fn list(&self, pattern: &str, return_values: bool) -> Result<KvListing> {
        let keys = self.matching_keys(pattern).await?;
        let names: Vec<String> = keys
            .iter()
            .map(|k| unscoped_key(&self.namespace, k).to_string())
            .collect();

        if !return_values {
            return Ok(KvListing::Keys(names));
        }
        if keys.is_empty() {
            return Ok(KvListing::Items(Vec::new()));
        }

        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;
        let items = names
            .into_iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|value| KvItem { key, value }))
            .collect();
        Ok(KvListing::Items(items))
    }

    async fn flush(&self) -> Result<bool> {
        let keys = self.matching_keys("*").await?;
        if keys.is_empty() {
            return Ok(true);
        }
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(keys).await?;
        Ok(true)
    }
}
