use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the signed-in account as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A stored file or directory entry. The application keeps only `path` as a lookup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsItem {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// Opaque file payload moved through the storage and inference surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const OCTET_STREAM: &str = "application/octet-stream";

impl Blob {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            name: None,
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Bytes::from(text.into()), "text/plain")
    }

    pub fn octets(data: impl Into<Bytes>) -> Self {
        Self::new(data, OCTET_STREAM)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when the declared type or the leading magic bytes identify a PDF document.
    pub fn is_pdf(&self) -> bool {
        self.content_type == PDF_CONTENT_TYPE || self.has_pdf_magic()
    }

    /// True only when the bytes themselves start with the PDF header.
    pub fn has_pdf_magic(&self) -> bool {
        self.data.starts_with(b"%PDF")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multi-part chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    File { puter_path: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }
}

/// A chat prompt is either a bare string or a full conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatPrompt {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl From<&str> for ChatPrompt {
    fn from(value: &str) -> Self {
        ChatPrompt::Text(value.to_string())
    }
}

impl From<String> for ChatPrompt {
    fn from(value: String) -> Self {
        ChatPrompt::Text(value)
    }
}

impl From<Vec<ChatMessage>> for ChatPrompt {
    fn from(value: Vec<ChatMessage>) -> Self {
        ChatPrompt::Messages(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }
}

/// The second positional chat argument: an image URL to attach, or the options themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOrOptions {
    ImageUrl(String),
    Options(ChatOptions),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub message: ResponseMessage,
    pub finish_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl AiResponse {
    pub fn assistant(content: impl Into<String>, finish_reason: impl Into<String>) -> Self {
        Self {
            message: ResponseMessage {
                content: content.into(),
                role: Role::Assistant.as_str().to_string(),
            },
            finish_reason: finish_reason.into(),
            usage: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Input to image-to-text: a fetchable URL or raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Url(String),
    Blob(Blob),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvItem {
    pub key: String,
    pub value: String,
}

/// `list` returns bare keys unless values were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KvListing {
    Keys(Vec<String>),
    Items(Vec<KvItem>),
}

impl KvListing {
    pub fn len(&self) -> usize {
        match self {
            KvListing::Keys(keys) => keys.len(),
            KvListing::Items(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
