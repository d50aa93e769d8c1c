//! Chat-completion abstraction and the OpenAI implementation.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::config::ChatConfig;
use crate::openai;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A language model that answers a conversation with a single message.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Send `messages` and return the assistant's text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Chat model backed by `POST {base_url}/chat/completions`.
pub struct OpenAIChat {
    config: ChatConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIChat {
    pub fn new(config: &ChatConfig, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("OpenAI API key must not be empty");
        }

        Ok(Self {
            config: config.clone(),
            api_key: api_key.trim().to_string(),
            client: openai::build_client(config.timeout_secs)?,
        })
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = openai::endpoint(&self.config.base_url, "chat/completions");
        let body = self.request_body(messages);

        let json = openai::post_json_with_retry(
            &self.client,
            &url,
            &self.api_key,
            &body,
            self.config.max_retries,
        )
        .await?;

        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
pub fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let choice = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: no choices"))?;

    match choice.pointer("/message/content") {
        Some(serde_json::Value::String(content)) => Ok(content.clone()),
        // Refusals and tool calls come back with a null content
        Some(serde_json::Value::Null) => {
            let refusal = choice
                .pointer("/message/refusal")
                .and_then(|r| r.as_str())
                .unwrap_or("no content");
            bail!("OpenAI returned no answer: {}", refusal)
        }
        _ => bail!("Invalid OpenAI response: missing message content"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let chat = OpenAIChat::new(&ChatConfig::default(), "sk-test").unwrap();
        let body = chat.request_body(&[ChatMessage::user("hi")]);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_parse_first_choice() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Paris." }, "finish_reason": "stop" }
            ]
        });
        assert_eq!(parse_chat_response(&body).unwrap(), "Paris.");
    }

    #[test]
    fn test_parse_refusal() {
        let body = json!({
            "choices": [ { "message": { "role": "assistant", "content": null, "refusal": "cannot help" } } ]
        });
        let err = parse_chat_response(&body).unwrap_err();
        assert!(err.to_string().contains("cannot help"));
    }

    #[test]
    fn test_parse_no_choices() {
        let err = parse_chat_response(&json!({ "choices": [] })).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let value = serde_json::to_value(ChatMessage::user("x")).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "x");
    }
}
