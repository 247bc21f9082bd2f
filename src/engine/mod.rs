//! 符号决策引擎：规则模型、条件/动作文法、匹配与规则簿

pub mod action;
pub mod book;
pub mod condition;
pub mod matcher;
pub mod rule;

pub use action::{ActionPlan, ActionStep};
pub use book::{BookStats, RuleBook};
pub use condition::{Condition, ConditionError};
pub use matcher::best_match;
pub use rule::Rule;
