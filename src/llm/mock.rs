//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 三种用法：默认回显 prompt；`with_script` 按序吐预置回复，
//! 脚本耗尽后回落到回显；`failing` 始终返回传输错误，
//! 用于验证降级路径。所有收到的 prompt 都会记录，便于断言。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};

/// Mock 客户端：脚本回复 / 回显 / 恒定失败
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    always_fail: bool,
}

impl MockLlmClient {
    /// 回显模式
    pub fn new() -> Self {
        Self::default()
    }

    /// 按序吐出预置回复，耗尽后回显
    pub fn with_script<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            always_fail: false,
        }
    }

    /// 每次调用都返回传输错误
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    /// 追加一条脚本回复（测试中途补脚本用，比如要先拿到运行期生成的 ID）
    pub fn push_script(&self, reply: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply.into());
        }
    }

    /// 收到过的全部 prompt（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn query(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.always_fail {
            return Err(LlmError::Transport("mock backend is offline".to_string()));
        }
        if let Ok(mut script) = self.script.lock() {
            if let Some(reply) = script.pop_front() {
                return Ok(reply);
            }
        }
        Ok(format!("Mock reply to: {}", prompt))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order_then_echo() {
        let mock = MockLlmClient::with_script(["first", "second"]);
        assert_eq!(mock.query("a").await.unwrap(), "first");
        assert_eq!(mock.query("b").await.unwrap(), "second");
        assert_eq!(mock.query("c").await.unwrap(), "Mock reply to: c");
        assert_eq!(mock.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failing_mock_always_errors() {
        let mock = MockLlmClient::failing();
        match mock.query("anything").await {
            Err(LlmError::Transport(_)) => {}
            other => panic!("Expected transport error, got {:?}", other),
        }
    }
}
