//! Inference facade — chat, image-to-text, and the resume `feedback` call.
//!
//! The facade does not interpret responses. `feedback` returns the raw chat reply;
//! parsing into a `Feedback` record happens in the review pipeline.

use crate::gateway::{AiResponse, ChatOptions, ChatPrompt, ImageOrOptions, ImageSource};
use crate::llm_client;
use crate::store::{Context, Op, StoreError};

const CHAT: Op = Op::new("ai/chat/success", "ai/chat/error", "Chat request failed");
const FEEDBACK: Op = Op::new(
    "ai/feedback/success",
    "ai/feedback/error",
    "Feedback request failed",
);
const IMG2TXT: Op = Op::new(
    "ai/img2txt/success",
    "ai/img2txt/error",
    "Image to text conversion failed",
);

/// Model every feedback request is pinned to.
pub const FEEDBACK_MODEL: &str = llm_client::MODEL;

/// Builds the composite prompt sent by `feedback`.
pub fn feedback_prompt(resume_text: &str, message: &str) -> String {
    format!("Here is the resume content:\n\n{resume_text}\n\n{message}")
}

#[derive(Clone)]
pub struct Inference {
    ctx: Context,
}

impl Inference {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub async fn chat(
        &self,
        prompt: impl Into<ChatPrompt>,
        image_or_options: Option<ImageOrOptions>,
        test_mode: bool,
        options: Option<ChatOptions>,
    ) -> Result<AiResponse, StoreError> {
        let gateway = self.ctx.gateway(CHAT.error)?;
        let result = gateway
            .ai()
            .chat(prompt.into(), image_or_options, test_mode, options)
            .await;
        self.ctx.settle(CHAT, result)
    }

    /// Sends `resume_text` and the caller's instruction `message` as one chat prompt.
    pub async fn feedback(
        &self,
        resume_text: &str,
        message: &str,
    ) -> Result<AiResponse, StoreError> {
        let gateway = self.ctx.gateway(FEEDBACK.error)?;
        let prompt = feedback_prompt(resume_text, message);
        let result = gateway
            .ai()
            .chat(
                ChatPrompt::Text(prompt),
                Some(ImageOrOptions::Options(ChatOptions::with_model(
                    FEEDBACK_MODEL,
                ))),
                false,
                None,
            )
            .await;
        self.ctx.settle(FEEDBACK, result)
    }

    pub async fn img2txt(&self, image: ImageSource, test_mode: bool) -> Result<String, StoreError> {
        let gateway = self.ctx.gateway(IMG2TXT.error)?;
        let result = gateway.ai().img2txt(image, test_mode).await;
        self.ctx.settle(IMG2TXT, result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gateway::Blob;
    use crate::testing::{context_with, context_without_gateway, StubGateway};

    const FIXED: &str = r#"{"overallScore": 72}"#;

    #[tokio::test]
    async fn test_feedback_embeds_resume_and_message() {
        let stub = Arc::new(StubGateway::default().with_chat_reply(FIXED));
        let inference = Inference::new(context_with(stub.clone()));

        let response = inference
            .feedback("Jane Doe, Rust engineer", "rate it")
            .await
            .unwrap();

        assert_eq!(response.content(), FIXED);
        let prompts = stub.args_of("ai.chat");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Jane Doe, Rust engineer"));
        assert!(prompts[0].contains("rate it"));
    }

    #[tokio::test]
    async fn test_feedback_pins_model() {
        let stub = Arc::new(StubGateway::default());
        let inference = Inference::new(context_with(stub.clone()));

        inference.feedback("text", "msg").await.unwrap();

        let options = stub.last_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.model.as_deref(), Some(FEEDBACK_MODEL));
    }

    #[test]
    fn test_feedback_prompt_layout() {
        assert_eq!(
            feedback_prompt("RESUME", "MSG"),
            "Here is the resume content:\n\nRESUME\n\nMSG"
        );
    }

    #[tokio::test]
    async fn test_chat_passes_through() {
        let stub = Arc::new(StubGateway::default().with_chat_reply("hi there"));
        let inference = Inference::new(context_with(stub.clone()));

        let response = inference.chat("hello", None, true, None).await.unwrap();

        assert_eq!(response.content(), "hi there");
        assert_eq!(stub.args_of("ai.chat"), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_img2txt_returns_text() {
        let stub = Arc::new(StubGateway::default().with_text_reply("extracted"));
        let inference = Inference::new(context_with(stub));

        let text = inference
            .img2txt(ImageSource::Blob(Blob::octets(&b"%PDF"[..])), false)
            .await
            .unwrap();
        assert_eq!(text, "extracted");
    }

    #[tokio::test]
    async fn test_operations_fail_closed_without_gateway() {
        let ctx = context_without_gateway();
        let inference = Inference::new(ctx.clone());

        let err = inference.feedback("text", "rate it").await.unwrap_err();
        assert_eq!(err.action(), "ai/feedback/error");
        assert!(inference.chat("hi", None, false, None).await.is_err());
        assert!(inference
            .img2txt(ImageSource::Url("https://x/y.png".to_string()), false)
            .await
            .is_err());
        assert!(ctx.store().snapshot().error.is_some());
    }

    #[tokio::test]
    async fn test_chat_failure_is_recorded() {
        let stub = Arc::new(StubGateway::failing("quota exceeded"));
        let ctx = context_with(stub);
        let inference = Inference::new(ctx.clone());

        assert!(inference.chat("hi", None, false, None).await.is_err());
        assert_eq!(
            ctx.store().snapshot().error.as_deref(),
            Some("quota exceeded")
        );
    }
}
