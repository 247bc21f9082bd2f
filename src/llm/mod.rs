//! LLM 层：客户端抽象与实现（Ollama / OpenAI 兼容 / Mock）

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod retry;
pub mod traits;

use std::sync::Arc;

pub use mock::MockLlmClient;
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL};
pub use openai::OpenAiClient;
pub use retry::{RetryConfig, RetryingLlmClient};
pub use traits::{LlmClient, LlmError};

use crate::config::AppConfig;

/// 按配置选择后端，并统一套上超时重试包装。
/// 选 openai 但没有 OPENAI_API_KEY 时退回 Ollama。
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let use_openai = provider == "openai" && std::env::var("OPENAI_API_KEY").is_ok();

    let inner: Arc<dyn LlmClient> = if use_openai {
        let model = &cfg.llm.openai.model;
        tracing::info!("Using OpenAI LLM ({})", model);
        Arc::new(OpenAiClient::new(
            cfg.llm.openai.base_url.as_deref(),
            model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else if provider == "mock" {
        tracing::warn!("Using Mock LLM, replies are canned echoes");
        Arc::new(MockLlmClient::new())
    } else {
        if provider == "openai" {
            tracing::warn!("OPENAI_API_KEY not set, falling back to Ollama");
        }
        tracing::info!(
            "Using Ollama LLM ({} @ {})",
            cfg.llm.ollama.model,
            cfg.llm.ollama.host
        );
        Arc::new(OllamaClient::new(
            cfg.llm.ollama.host.clone(),
            cfg.llm.ollama.model.clone(),
        ))
    };

    let retry = RetryConfig {
        request_timeout_secs: cfg.llm.timeouts.request_secs,
        max_retries: cfg.llm.retry.max_retries,
        backoff_ms: cfg.llm.retry.backoff_ms,
    };
    Arc::new(RetryingLlmClient::new(inner, retry))
}
