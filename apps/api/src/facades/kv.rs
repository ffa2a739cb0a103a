use crate::gateway::KvListing;
use crate::store::{Context, Op, StoreError};

const GET: Op = Op::new("kv/get/success", "kv/get/error", "Failed to read key");
const SET: Op = Op::new("kv/set/success", "kv/set/error", "Failed to write key");
const DELETE: Op = Op::new("kv/delete/success", "kv/delete/error", "Failed to delete key");
const LIST: Op = Op::new("kv/list/success", "kv/list/error", "Failed to list keys");
const FLUSH: Op = Op::new("kv/flush/success", "kv/flush/error", "Failed to flush keys");

/// Key-value facade for small persisted records.
#[derive(Clone)]
pub struct KeyValue {
    ctx: Context,
}

impl KeyValue {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let gateway = self.ctx.gateway(GET.error)?;
        let result = gateway.kv().get(key).await;
        self.ctx.settle(GET, result)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let gateway = self.ctx.gateway(SET.error)?;
        let result = gateway.kv().set(key, value).await;
        self.ctx.settle(SET, result)
    }

    pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let gateway = self.ctx.gateway(DELETE.error)?;
        let result = gateway.kv().delete(key).await;
        self.ctx.settle(DELETE, result)
    }

    /// Lists keys matching `pattern`; `return_values` defaults to false.
    pub async fn list(
        &self,
        pattern: &str,
        return_values: Option<bool>,
    ) -> Result<KvListing, StoreError> {
        let gateway = self.ctx.gateway(LIST.error)?;
        let result = gateway
            .kv()
            .list(pattern, return_values.unwrap_or(false))
            .await;
        self.ctx.settle(LIST, result)
    }

    pub async fn flush(&self) -> Result<bool, StoreError> {
        let gateway = self.ctx.gateway(FLUSH.error)?;
        let result = gateway.kv().flush().await;
        self.ctx.settle(FLUSH, result)
    }
}
