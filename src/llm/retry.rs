//! LLM 调用的超时与重试包装
//!
//! 每次尝试套 tokio 超时，失败后线性退避再试，预算很小（默认一次重试）。
//! 包装器本身也实现 LlmClient，上层拿到的永远是包好的客户端。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::llm::{LlmClient, LlmError};

/// 超时与重试参数
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            max_retries: 1,
            backoff_ms: 500,
        }
    }
}

/// 带超时与重试的 LlmClient 装饰器
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, policy: RetryConfig) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn query(&self, prompt: &str) -> Result<String, LlmError> {
        let attempts = self.policy.max_retries + 1;
        let timeout = Duration::from_secs(self.policy.request_timeout_secs);
        let mut last_error = LlmError::EmptyReply;

        for attempt in 1..=attempts {
            match tokio::time::timeout(timeout, self.inner.query(prompt)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => {
                    warn!(
                        "LLM query via {} failed (attempt {}/{}): {}",
                        self.inner.name(),
                        attempt,
                        attempts,
                        e
                    );
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        "LLM query via {} timed out after {}s (attempt {}/{})",
                        self.inner.name(),
                        self.policy.request_timeout_secs,
                        attempt,
                        attempts
                    );
                    last_error = LlmError::Timeout(self.policy.request_timeout_secs);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(
                    self.policy.backoff_ms * u64::from(attempt),
                ))
                .await;
            }
        }
        Err(last_error)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
