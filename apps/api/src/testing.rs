//! In-memory gateway used by unit tests across the crate.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::gateway::{
    AiApi, AiResponse, AuthApi, Blob, ChatOptions, ChatPrompt, FsApi, FsItem, Gateway,
    GatewayProbe, ImageOrOptions, ImageSource, KvApi, KvItem, KvListing, User,
};
use crate::store::{Context, Store};

/// One observed gateway invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub arg: String,
}

pub struct StubGateway {
    pub signed_in: Mutex<bool>,
    pub user: User,
    pub failure: Mutex<Option<String>>,
    /// Fails only this method (e.g. `"ai.img2txt"`), leaving the rest working.
    pub fail_on: Mutex<Option<&'static str>>,
    pub chat_reply: Mutex<String>,
    pub text_reply: Mutex<String>,
    pub files: Mutex<BTreeMap<String, Blob>>,
    pub kv: Mutex<BTreeMap<String, String>>,
    pub calls: Mutex<Vec<Call>>,
    pub last_options: Mutex<Option<ChatOptions>>,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            signed_in: Mutex::new(false),
            user: stub_user(),
            failure: Mutex::new(None),
            fail_on: Mutex::new(None),
            chat_reply: Mutex::new("{}".to_string()),
            text_reply: Mutex::new("Jane Doe\nSoftware Engineer".to_string()),
            files: Mutex::new(BTreeMap::new()),
            kv: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            last_options: Mutex::new(None),
        }
    }
}

pub fn stub_user() -> User {
    User {
        username: "jdoe".to_string(),
        uuid: "7f0c2a52-1b1e-4d55-9d1c-2f6b1a1f0e11".to_string(),
        email: Some("jdoe@example.com".to_string()),
    }
}

impl StubGateway {
    pub fn signed_in() -> Self {
        let stub = Self::default();
        *stub.signed_in.lock().unwrap() = true;
        stub
    }

    pub fn failing(message: &str) -> Self {
        let stub = Self::default();
        *stub.failure.lock().unwrap() = Some(message.to_string());
        stub
    }

    pub fn failing_on(self, method: &'static str) -> Self {
        *self.fail_on.lock().unwrap() = Some(method);
        self
    }

    pub fn with_chat_reply(self, reply: &str) -> Self {
        *self.chat_reply.lock().unwrap() = reply.to_string();
        self
    }

    pub fn with_text_reply(self, reply: &str) -> Self {
        *self.text_reply.lock().unwrap() = reply.to_string();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn args_of(&self, method: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .map(|c| c.arg)
            .collect()
    }

    fn record(&self, method: &'static str, arg: impl Into<String>) -> Result<()> {
        self.calls.lock().unwrap().push(Call {
            method,
            arg: arg.into(),
        });
        if *self.fail_on.lock().unwrap() == Some(method) {
            return Err(anyhow!("{method} failed"));
        }
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

fn prompt_text(prompt: &ChatPrompt) -> String {
    match prompt {
        ChatPrompt::Text(text) => text.clone(),
        ChatPrompt::Messages(messages) => serde_json::to_string(messages).unwrap_or_default(),
    }
}

fn item_for(path: &str, size: usize) -> FsItem {
    FsItem {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        is_dir: false,
        size: Some(size as u64),
        created: Some(Utc::now()),
        modified: Some(Utc::now()),
    }
}

#[async_trait]
impl AuthApi for StubGateway {
    async fn is_signed_in(&self) -> Result<bool> {
        self.record("auth.is_signed_in", "")?;
        Ok(*self.signed_in.lock().unwrap())
    }

    async fn get_user(&self) -> Result<User> {
        self.record("auth.get_user", "")?;
        Ok(self.user.clone())
    }

    async fn sign_in(&self) -> Result<()> {
        self.record("auth.sign_in", "")?;
        *self.signed_in.lock().unwrap() = true;
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        self.record("auth.sign_out", "")?;
        *self.signed_in.lock().unwrap() = false;
        Ok(())
    }
}

#[async_trait]
impl FsApi for StubGateway {
    async fn write(&self, path: &str, data: Blob) -> Result<Option<FsItem>> {
        self.record("fs.write", path)?;
        let item = item_for(path, data.len());
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(Some(item))
    }

    async fn read(&self, path: &str) -> Result<Blob> {
        self.record("fs.read", path)?;
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("No such file: {path}"))
    }

    async fn upload(&self, files: Vec<Blob>) -> Result<FsItem> {
        self.record("fs.upload", files.len().to_string())?;
        let mut last = None;
        for (i, blob) in files.into_iter().enumerate() {
            let name = blob.name.clone().unwrap_or_else(|| format!("blob-{i}"));
            let path = format!("/uploads/{name}");
            last = Some(item_for(&path, blob.len()));
            self.files.lock().unwrap().insert(path, blob);
        }
        last.ok_or_else(|| anyhow!("Nothing to upload"))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.record("fs.delete", path)?;
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn readdir(&self, path: &str) -> Result<Option<Vec<FsItem>>> {
        self.record("fs.readdir", path)?;
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let items: Vec<FsItem> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p.starts_with(&prefix))
            .map(|(p, b)| item_for(p, b.len()))
            .collect();
        Ok(Some(items))
    }
}

#[async_trait]
impl AiApi for StubGateway {
    async fn chat(
        &self,
        prompt: ChatPrompt,
        image_or_options: Option<ImageOrOptions>,
        _test_mode: bool,
        options: Option<ChatOptions>,
    ) -> Result<AiResponse> {
        self.record("ai.chat", prompt_text(&prompt))?;
        let options = match image_or_options {
            Some(ImageOrOptions::Options(o)) => Some(o),
            _ => options,
        };
        *self.last_options.lock().unwrap() = options;
        Ok(AiResponse::assistant(
            self.chat_reply.lock().unwrap().clone(),
            "stop",
        ))
    }

    async fn img2txt(&self, image: ImageSource, _test_mode: bool) -> Result<String> {
        let arg = match &image {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Blob(blob) => blob.content_type.clone(),
        };
        self.record("ai.img2txt", arg)?;
        Ok(self.text_reply.lock().unwrap().clone())
    }
}

#[async_trait]
impl KvApi for StubGateway {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.record("kv.get", key)?;
        Ok(self.kv.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<bool> {
        self.record("kv.set", key)?;
        self.kv
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.record("kv.delete", key)?;
        Ok(self.kv.lock().unwrap().remove(key).is_some())
    }

    async fn list(&self, pattern: &str, return_values: bool) -> Result<KvListing> {
        self.record("kv.list", format!("{pattern}:{return_values}"))?;
        let prefix = pattern.trim_end_matches('*');
        let kv = self.kv.lock().unwrap();
        let matched = kv.iter().filter(|(k, _)| {
            if pattern.ends_with('*') {
                k.starts_with(prefix)
            } else {
                k.as_str() == pattern
            }
        });
        Ok(if return_values {
            KvListing::Items(
                matched
                    .map(|(k, v)| KvItem {
                        key: k.clone(),
                        value: v.clone(),
                    })
                    .collect(),
            )
        } else {
            KvListing::Keys(matched.map(|(k, _)| k.clone()).collect())
        })
    }

    async fn flush(&self) -> Result<bool> {
        self.record("kv.flush", "")?;
        self.kv.lock().unwrap().clear();
        Ok(true)
    }
}

impl Gateway for StubGateway {
    fn auth(&self) -> &dyn AuthApi {
        self
    }

    fn fs(&self) -> &dyn FsApi {
        self
    }

    fn ai(&self) -> &dyn AiApi {
        self
    }

    fn kv(&self) -> &dyn KvApi {
        self
    }
}

/// Probe that never finds a gateway.
pub struct AbsentProbe;

impl GatewayProbe for AbsentProbe {
    fn current(&self) -> Option<Arc<dyn Gateway>> {
        None
    }
}

/// Context whose probe always returns `stub`.
pub fn context_with(stub: Arc<StubGateway>) -> Context {
    let slot = crate::gateway::GatewaySlot::with(stub);
    Context::new(Store::new(), Arc::new(slot))
}

pub fn context_without_gateway() -> Context {
    Context::new(Store::new(), Arc::new(AbsentProbe))
}
