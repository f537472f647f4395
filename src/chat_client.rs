//! Blocking client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::transformer::Transformer;

/// DashScope's OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

pub const DEFAULT_MODEL: &str = "qwen-plus";

/// Connection settings for [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatClientOpts {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ChatClientOpts {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(300),
        }
    }
}

pub struct ChatClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(opts: ChatClientOpts) -> Result<Self> {
        let client = Client::builder()
            .user_agent("scribe-relay")
            .timeout(opts.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: completions_url(&opts.base_url),
            model: opts.model,
            api_key: opts.api_key,
        })
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("response had no message content"))
}

impl Transformer for ChatClient {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
        };

        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .with_context(|| format!("request failed: {}", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("completion failed (bad status): {}", self.endpoint))?
            .json()
            .context("failed to decode completion response")?;

        first_content(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        assert_eq!(
            completions_url("https://example.test/v1/"),
            "https://example.test/v1/chat/completions"
        );
        assert_eq!(
            completions_url(DEFAULT_BASE_URL),
            "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions"
        );
    }

    #[test]
    fn request_serializes_system_then_user() -> anyhow::Result<()> {
        let request = ChatRequest {
            model: "qwen-plus",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "rewrite",
                },
                ChatMessage {
                    role: "user",
                    content: "text",
                },
            ],
        };
        let value = serde_json::to_value(&request)?;
        assert_eq!(value["model"], "qwen-plus");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "text");
        Ok(())
    }

    #[test]
    fn first_content_reads_first_choice() -> anyhow::Result<()> {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"done"}}]}"#,
        )?;
        assert_eq!(first_content(response)?, "done");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#)?;
        assert!(first_content(empty).is_err());

        let null: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#)?;
        assert!(first_content(null).is_err());
        Ok(())
    }
}
