//! LLM 客户端抽象
//!
//! 所有后端（Ollama / OpenAI 兼容 / Mock）实现 LlmClient：单发 prompt，
//! 拿回纯文本。回退问答、规则合成、安全门、整合分析走的都是这一个入口。

use async_trait::async_trait;
use thiserror::Error;

/// LLM 调用错误；编排器在边界处降级（致歉语 / 跳过学习），不向上抛
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider error: {0}")]
    Api(String),

    #[error("provider returned an empty reply")]
    EmptyReply,
}

/// LLM 客户端 trait：prompt 进、文本出
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn query(&self, prompt: &str) -> Result<String, LlmError>;

    /// 后端名，用于日志
    fn name(&self) -> &str {
        "llm"
    }
}
