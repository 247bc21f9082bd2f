//! 决策审计记录
//!
//! 每次 `process` 产出一条 [`Decision`]，带唯一 ID 存入会话历史，
//! 供用户反馈（按 ID 评分）和 explain（决策溯源）使用。
//! 符号路径额外携带 [`ReasoningStep`]，记下命中的规则当时的样子，
//! 这样即使规则之后被整合删除，explain 仍有据可查。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 答案出处：符号规则命中，或无规则可用时的 LLM 回退
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    SymbolicRule,
    Llm,
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionSource::SymbolicRule => write!(f, "Symbolic Rule"),
            DecisionSource::Llm => write!(f, "LLM Fallback"),
        }
    }
}

/// 符号路径的单步推理记录：哪条规则、当时的条件与动作原文、规则自身置信度
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub rule_id: String,
    pub condition_matched: String,
    pub action_taken: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl ReasoningStep {
    pub fn new(
        rule_id: impl Into<String>,
        condition_matched: impl Into<String>,
        action_taken: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            condition_matched: condition_matched.into(),
            action_taken: action_taken.into(),
            confidence,
            timestamp: Utc::now(),
        }
    }
}

/// 一次完整的决策记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub input_query: String,
    pub output: String,
    /// 符号路径恰好一步；LLM 回退为空
    pub reasoning_steps: Vec<ReasoningStep>,
    /// 符号路径 = 规则置信度 × 历史成功率；LLM 回退用配置的固定低值
    pub final_confidence: f64,
    pub source: DecisionSource,
    pub timestamp: DateTime<Utc>,
    /// 1-5 评分，每条决策只收一次
    pub feedback_rating: Option<u8>,
    pub feedback_text: Option<String>,
}

impl Decision {
    /// 符号规则命中产出的决策
    pub fn from_rule(
        query: impl Into<String>,
        output: impl Into<String>,
        step: ReasoningStep,
        final_confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            input_query: query.into(),
            output: output.into(),
            reasoning_steps: vec![step],
            final_confidence,
            source: DecisionSource::SymbolicRule,
            timestamp: Utc::now(),
            feedback_rating: None,
            feedback_text: None,
        }
    }

    /// LLM 回退产出的决策（无推理步骤）
    pub fn from_llm(
        query: impl Into<String>,
        output: impl Into<String>,
        final_confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            input_query: query.into(),
            output: output.into(),
            reasoning_steps: Vec::new(),
            final_confidence,
            source: DecisionSource::Llm,
            timestamp: Utc::now(),
            feedback_rating: None,
            feedback_text: None,
        }
    }

    /// 是否已收过反馈
    pub fn is_rated(&self) -> bool {
        self.feedback_rating.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_ids_are_unique() {
        let a = Decision::from_llm("q", "a", 0.3);
        let b = Decision::from_llm("q", "a", 0.3);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_rule_decision_carries_one_step() {
        let step = ReasoningStep::new("r1", "hello", "Hello!", 0.9);
        let d = Decision::from_rule("hello there", "Hello!", step, 0.45);
        assert_eq!(d.source, DecisionSource::SymbolicRule);
        assert_eq!(d.reasoning_steps.len(), 1);
        assert_eq!(d.reasoning_steps[0].rule_id, "r1");
        assert!(!d.is_rated());
    }

    #[test]
    fn test_llm_decision_has_no_steps() {
        let d = Decision::from_llm("unknown", "generated", 0.3);
        assert_eq!(d.source, DecisionSource::Llm);
        assert!(d.reasoning_steps.is_empty());
    }
}
