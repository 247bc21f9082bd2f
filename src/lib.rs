//! Reflex - 神经符号决策引擎
//!
//! 符号规则能接住的查询走规则（可解释、可追责），接不住的回退给 LLM；
//! 用户对每条决策的评分回流成规则统计，差评加纠正文本会让引擎当场
//! 学出或收窄一条规则，周期性地再请 LLM 把冗余规则合并掉。
//!
//! 模块划分：
//! - **agent**: 决策编排器（process / feedback / explain 三调用面）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **engine**: 规则模型、条件/动作文法、匹配与规则簿
//! - **evolution**: 规则合成（Create / Refine + 安全门）与周期性整合
//! - **llm**: LLM 客户端抽象与实现（Ollama / OpenAI 兼容 / Mock）
//! - **memory**: 会话状态（上下文 + 决策历史）与规则持久化

pub mod agent;
pub mod config;
pub mod core;
pub mod engine;
pub mod evolution;
pub mod llm;
pub mod memory;

pub use agent::{DecisionAgent, EngineStats, DEGRADED_SERVICE_REPLY};
