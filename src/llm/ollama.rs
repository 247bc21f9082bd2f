//! Ollama 客户端
//!
//! 走本地 Ollama HTTP API：POST `/api/generate`（非流式）拿回 `response`
//! 字段。默认后端，无需任何密钥。

use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};

pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "mistral:latest";

/// Ollama 客户端：持有 host 与 model，query 时单发 prompt
#[derive(Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    model: String,
}

impl OllamaClient {
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            host: host.into(),
            model: model.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// 服务健康探测：GET `/api/tags`，2 秒超时，只看状态码
    pub async fn ping(&self) -> bool {
        self.http
            .get(format!("{}/api/tags", self.host))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn query(&self, prompt: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        let response = self
            .http
            .post(format!("{}/api/generate", self.host))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::Api(format!(
                "Ollama request failed: {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(LlmError::EmptyReply);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
