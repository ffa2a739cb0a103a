//! Platform Gateway — the capability surface every facade delegates to.
//!
//! The gateway is one handle exposing four capability groups (auth, fs, ai, kv).
//! It may not exist yet when the process starts; facades obtain it through a
//! `GatewayProbe` on every call and fail closed when the probe returns `None`.

use anyhow::Result;
use async_trait::async_trait;

pub mod probe;
pub mod types;

pub use probe::{GatewayProbe, GatewaySlot};
pub use types::*;

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn is_signed_in(&self) -> Result<bool>;
    async fn get_user(&self) -> Result<User>;
    async fn sign_in(&self) -> Result<()>;
    async fn sign_out(&self) -> Result<()>;
}

#[async_trait]
pub trait FsApi: Send + Sync {
    async fn write(&self, path: &str, data: Blob) -> Result<Option<FsItem>>;
    async fn read(&self, path: &str) -> Result<Blob>;
    async fn upload(&self, files: Vec<Blob>) -> Result<FsItem>;
    async fn delete(&self, path: &str) -> Result<()>;
    async fn readdir(&self, path: &str) -> Result<Option<Vec<FsItem>>>;
}

#[async_trait]
pub trait AiApi: Send + Sync {
    async fn chat(
        &self,
        prompt: ChatPrompt,
        image_or_options: Option<ImageOrOptions>,
        test_mode: bool,
        options: Option<ChatOptions>,
    ) -> Result<AiResponse>;

    async fn img2txt(&self, image: ImageSource, test_mode: bool) -> Result<String>;
}

#[async_trait]
pub trait KvApi: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<bool>;
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn list(&self, pattern: &str, return_values: bool) -> Result<KvListing>;
    async fn flush(&self) -> Result<bool>;
}

/// The combined platform handle. Implementors hand out each capability group.
pub trait Gateway: Send + Sync {
    fn auth(&self) -> &dyn AuthApi;
    fn fs(&self) -> &dyn FsApi;
    fn ai(&self) -> &dyn AiApi;
    fn kv(&self) -> &dyn KvApi;
}
