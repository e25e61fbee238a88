//! Anthropic Messages API クライアント
//!
//! `ModelClient` トレイトがモデル呼び出しの境界。
//! 実装はリクエストを JSON で POST し、レスポンスのコンテンツブロックを返すだけで、
//! ツールループの制御には関与しない。

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::config::AiConfig;

use super::error::ModelError;
use super::protocol::{Message, ModelRequest, ModelResponse, ToolDefinition};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// モデル呼び出しの抽象。テストではスクリプト化した実装に差し替える。
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// システムプロンプト・ツール定義（省略可）・メッセージ列でモデルを 1 回呼び出す。
    async fn invoke(
        &self,
        system: &str,
        tools: Option<&[ToolDefinition]>,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<ModelResponse, ModelError>;
}

/// Anthropic Messages API を呼び出す本番クライアント
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl AnthropicClient {
    /// ANTHROPIC_API_KEY 環境変数からクライアントを初期化する。
    pub fn from_env(config: &AiConfig) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY is not set. AI features are disabled.")?;

        if api_key.is_empty() || api_key == "your_anthropic_api_key" {
            anyhow::bail!(
                "ANTHROPIC_API_KEY is not configured. Please set a valid API key in .env"
            );
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn invoke(
        &self,
        system: &str,
        tools: Option<&[ToolDefinition]>,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<ModelResponse, ModelError> {
        let request = ModelRequest {
            model: &self.model,
            max_tokens,
            system,
            tools,
            messages,
        };

        debug!(
            model = %self.model,
            message_count = messages.len(),
            with_tools = tools.is_some(),
            max_tokens = max_tokens,
            "Sending request to Anthropic API"
        );

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.timeout_secs)
                } else {
                    ModelError::Transport(e)
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            401 => Err(ModelError::Auth),
            429 => Err(ModelError::RateLimited),
            s if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(ModelError::Api { status: s, body })
            }
            _ => {
                let parsed: ModelResponse = response
                    .json()
                    .await
                    .map_err(|e| ModelError::Protocol(e.to_string()))?;
                debug!(
                    block_count = parsed.content.len(),
                    tool_use_count = parsed.tool_uses().len(),
                    "Model response received"
                );
                Ok(parsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_config() -> AiConfig {
        AiConfig::default()
    }

    #[test]
    #[serial]
    fn from_env_fails_without_api_key() {
        let original = std::env::var("ANTHROPIC_API_KEY").ok();
        std::env::remove_var("ANTHROPIC_API_KEY");

        let result = AnthropicClient::from_env(&test_config());
        assert!(result.is_err());

        if let Some(key) = original {
            std::env::set_var("ANTHROPIC_API_KEY", key);
        }
    }

    #[test]
    #[serial]
    fn from_env_rejects_placeholder_key() {
        let original = std::env::var("ANTHROPIC_API_KEY").ok();
        std::env::set_var("ANTHROPIC_API_KEY", "your_anthropic_api_key");

        let result = AnthropicClient::from_env(&test_config());
        assert!(result.is_err());

        match original {
            Some(key) => std::env::set_var("ANTHROPIC_API_KEY", key),
            None => std::env::remove_var("ANTHROPIC_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn from_env_succeeds_with_key() {
        let original = std::env::var("ANTHROPIC_API_KEY").ok();
        std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test-key");

        let client = AnthropicClient::from_env(&test_config()).unwrap();
        assert_eq!(client.model, test_config().model);

        match original {
            Some(key) => std::env::set_var("ANTHROPIC_API_KEY", key),
            None => std::env::remove_var("ANTHROPIC_API_KEY"),
        }
    }
}
