//! 引擎错误类型
//!
//! 库内部用 `?` 传播，边界处（编排器）吞掉并降级：持久化失败只记日志，
//! LLM 失败换固定致歉语，规则合成失败跳过本次学习。

use thiserror::Error;

use crate::llm::LlmError;

/// 决策引擎运行过程中可能出现的错误（存储、LLM、规则合成）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Rule storage I/O failed: {0}")]
    StorageIo(#[from] std::io::Error),

    #[error("Rule file format error: {0}")]
    StorageFormat(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// 合成流程拒绝了本次规则提案（缺 Condition 行、内容为空或未通过安全门）
    #[error("Rule synthesis rejected: {0}")]
    SynthesisRejected(String),
}
