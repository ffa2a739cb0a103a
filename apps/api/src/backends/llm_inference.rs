//! Inference backend — maps gateway chat / image-to-text calls onto the LLM client.
//!
//! PDFs never reach the model for transcription: their text layer is pulled out
//! locally with `pdf-extract`. Other images are sent as vision content blocks.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use tracing::{debug, info};

use crate::gateway::{
    AiApi, AiResponse, Blob, ChatMessage, ChatOptions, ChatPrompt, ContentPart, ImageOrOptions,
    ImageSource, MessageContent, Role, TokenUsage,
};
use crate::llm_client::prompts::{
    IMAGE_TO_TEXT_INSTRUCTION, TEST_MODE_REPLY, TEST_MODE_TRANSCRIPTION,
};
use crate::llm_client::{
    ContentBlockParam, ImageBlockSource, LlmClient, LlmError, LlmRequest, LlmResponse,
    MessageParam,
};

pub struct LlmInference {
    llm: LlmClient,
}

impl LlmInference {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

/// Resolves the overloaded second chat argument into (image URL, options).
fn split_chat_args(
    image_or_options: Option<ImageOrOptions>,
    options: Option<ChatOptions>,
) -> (Option<String>, Option<ChatOptions>) {
    match image_or_options {
        Some(ImageOrOptions::ImageUrl(url)) => (Some(url), options),
        Some(ImageOrOptions::Options(opts)) => (None, Some(opts)),
        None => (None, options),
    }
}

fn url_image(url: &str) -> ContentBlockParam {
    ContentBlockParam::Image {
        source: ImageBlockSource::Url {
            url: url.to_string(),
        },
    }
}

fn inline_image(blob: &Blob) -> ContentBlockParam {
    ContentBlockParam::Image {
        source: ImageBlockSource::Base64 {
            media_type: blob.content_type.clone(),
            data: BASE64.encode(&blob.data),
        },
    }
}

fn content_blocks(content: &MessageContent) -> Vec<ContentBlockParam> {
    match content {
        MessageContent::Text(text) => vec![ContentBlockParam::Text { text: text.clone() }],
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => ContentBlockParam::Text { text: text.clone() },
                ContentPart::ImageUrl { image_url } => url_image(&image_url.url),
                ContentPart::File { puter_path } => ContentBlockParam::Text {
                    text: format!("[attached file: {puter_path}]"),
                },
            })
            .collect(),
    }
}

/// Builds the Messages API request. System messages are lifted into the
/// top-level `system` field; an image URL is attached to the last user turn.
pub(crate) fn build_chat_request(
    prompt: &ChatPrompt,
    image_url: Option<&str>,
    options: Option<&ChatOptions>,
) -> LlmRequest {
    let mut system = Vec::new();
    let mut messages = Vec::new();

    match prompt {
        ChatPrompt::Text(text) => messages.push(MessageParam::user_text(text.clone())),
        ChatPrompt::Messages(list) => {
            for ChatMessage { role, content } in list {
                match role {
                    Role::System => {
                        for block in content_blocks(content) {
                            if let ContentBlockParam::Text { text } = block {
                                system.push(text);
                            }
                        }
                    }
                    Role::User | Role::Assistant => messages.push(MessageParam {
                        role: role.as_str().to_string(),
                        content: content_blocks(content),
                    }),
                }
            }
        }
    }

    if let Some(url) = image_url {
        match messages.iter_mut().rev().find(|m| m.role == "user") {
            Some(message) => message.content.insert(0, url_image(url)),
            None => messages.push(MessageParam {
                role: "user".to_string(),
                content: vec![url_image(url)],
            }),
        }
    }

    let mut request = LlmRequest::new(messages);
    if !system.is_empty() {
        request.system = Some(system.join("\n\n"));
    }
    if let Some(options) = options {
        if let Some(model) = &options.model {
            request.model = model.clone();
        }
        if let Some(max_tokens) = options.max_tokens {
            request.max_tokens = max_tokens;
        }
        request.temperature = options.temperature;
    }
    request
}

fn to_ai_response(response: &LlmResponse) -> AiResponse {
    let usage = &response.usage;
    AiResponse {
        usage: Some(TokenUsage {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            total_tokens: usage.input_tokens + usage.output_tokens,
        }),
        ..AiResponse::assistant(
            response.text().unwrap_or_default(),
            response.stop_reason.as_deref().unwrap_or("stop"),
        )
    }
}

async fn extract_pdf_text(data: Bytes) -> Result<String> {
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&data).map_err(|e| e.to_string())
    })
    .await?
    .map_err(|e| anyhow!("PDF text extraction failed: {e}"))?;
    Ok(text.trim().to_string())
}

#[async_trait]
impl AiApi for LlmInference {
    async fn chat(
        &self,
        prompt: ChatPrompt,
        image_or_options: Option<ImageOrOptions>,
        test_mode: bool,
        options: Option<ChatOptions>,
    ) -> Result<AiResponse> {
        let (image_url, options) = split_chat_args(image_or_options, options);
        if options.as_ref().and_then(|o| o.stream).unwrap_or(false) {
            debug!("Streaming requested; returning the complete reply instead");
        }
        let request = build_chat_request(&prompt, image_url.as_deref(), options.as_ref());

        if test_mode {
            debug!("Chat in test mode, model={} not called", request.model);
            return Ok(AiResponse::assistant(TEST_MODE_REPLY, "stop"));
        }

        let response = self.llm.send(&request).await?;
        Ok(to_ai_response(&response))
    }

    async fn img2txt(&self, image: ImageSource, test_mode: bool) -> Result<String> {
        if test_mode {
            return Ok(TEST_MODE_TRANSCRIPTION.to_string());
        }

        let image_block = match image {
            ImageSource::Blob(blob) if blob.is_pdf() => {
                let text = extract_pdf_text(blob.data).await?;
                info!("Extracted {} characters from PDF", text.len());
                return Ok(text);
            }
            ImageSource::Blob(blob) => inline_image(&blob),
            ImageSource::Url(url) => url_image(&url),
        };

        let request = LlmRequest::new(vec![MessageParam {
            role: "user".to_string(),
            content: vec![
                image_block,
                ContentBlockParam::Text {
                    text: IMAGE_TO_TEXT_INSTRUCTION.to_string(),
                },
            ],
        }]);
        let response = self.llm.send(&request).await?;
        Ok(response.text().ok_or(LlmError::EmptyContent)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::MODEL;

    #[test]
    fn test_text_prompt_becomes_single_user_turn() {
        let request = build_chat_request(&ChatPrompt::from("hello"), None, None);
        assert_eq!(request.model, MODEL);
        assert_eq!(request.messages, vec![MessageParam::user_text("hello")]);
        assert!(request.system.is_none());
    }

    #[test]
    fn test_options_override_model_and_limits() {
        let options = ChatOptions {
            model: Some("claude-haiku-4-5".to_string()),
            max_tokens: Some(512),
            temperature: Some(0.2),
            stream: None,
        };
        let request = build_chat_request(&ChatPrompt::from("hi"), None, Some(&options));
        assert_eq!(request.model, "claude-haiku-4-5");
        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.temperature, Some(0.2));
    }

    #[test]
    fn test_system_messages_are_lifted() {
        let prompt = ChatPrompt::Messages(vec![
            ChatMessage {
                role: Role::System,
                content: MessageContent::Text("be terse".to_string()),
            },
            ChatMessage::user("summarize"),
        ]);
        let request = build_chat_request(&prompt, None, None);
        assert_eq!(request.system.as_deref(), Some("be terse"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
    }

    #[test]
    fn test_image_url_attaches_to_last_user_turn() {
        let request = build_chat_request(
            &ChatPrompt::from("what is this?"),
            Some("https://example.com/cv.png"),
            None,
        );
        let content = &request.messages[0].content;
        assert_eq!(content.len(), 2);
        assert!(matches!(content[0], ContentBlockParam::Image { .. }));
    }

    #[test]
    fn test_split_chat_args() {
        let (url, opts) = split_chat_args(
            Some(ImageOrOptions::Options(ChatOptions::with_model("m"))),
            None,
        );
        assert!(url.is_none());
        assert_eq!(opts.unwrap().model.as_deref(), Some("m"));

        let (url, opts) = split_chat_args(
            Some(ImageOrOptions::ImageUrl("u".to_string())),
            Some(ChatOptions::with_model("n")),
        );
        assert_eq!(url.as_deref(), Some("u"));
        assert_eq!(opts.unwrap().model.as_deref(), Some("n"));
    }

    #[tokio::test]
    async fn test_test_mode_skips_network() {
        let inference = LlmInference::new(LlmClient::new("unused".to_string()).unwrap());

        let reply = inference
            .chat(ChatPrompt::from("hi"), None, true, None)
            .await
            .unwrap();
        assert_eq!(reply.content(), TEST_MODE_REPLY);

        let text = inference
            .img2txt(ImageSource::Url("https://x/y.png".to_string()), true)
            .await
            .unwrap();
        assert_eq!(text, TEST_MODE_TRANSCRIPTION);
    }
}
