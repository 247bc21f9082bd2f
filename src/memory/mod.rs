//! 记忆层：会话状态（上下文 + 决策历史）与规则持久化

pub mod decision;
pub mod rules_file;
pub mod session;

pub use decision::{Decision, DecisionSource, ReasoningStep};
pub use rules_file::{JsonRuleStorage, NoopRuleStorage, RuleStorage};
pub use session::{Session, SessionContext};
