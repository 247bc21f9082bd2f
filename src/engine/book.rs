//! 规则簿：按录入顺序维护全部规则
//!
//! 顺序即持久化顺序，也是同分规则的决胜依据，所以这里只用 Vec，
//! 不做任何重排。录入时跑一遍文法校验，问题只记警告不拒收，
//! 匹配路径对坏条件自会按不命中处理。越界或 NaN 的置信度在录入时
//! 就地钳回 [0, 1]。

use tracing::warn;

use crate::engine::{ActionPlan, Condition, Rule};

/// 规则簿统计，供会话层汇总展示
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookStats {
    pub total_rules: usize,
    /// 历史成功率高于 0.5 的规则数（无反馈的规则恰好是 0.5，不计入）
    pub successful_rules: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RuleBook {
    rules: Vec<Rule>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从持久化层加载的规则构建规则簿，保持原顺序
    pub fn from_rules(mut rules: Vec<Rule>) -> Self {
        for rule in &mut rules {
            lint_rule(rule);
        }
        Self { rules }
    }

    /// 追加一条规则并返回其 ID
    pub fn add(&mut self, mut rule: Rule) -> String {
        lint_rule(&mut rule);
        let id = rule.id.clone();
        self.rules.push(rule);
        id
    }

    pub fn remove(&mut self, id: &str) -> Option<Rule> {
        let pos = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn stats(&self) -> BookStats {
        BookStats {
            total_rules: self.rules.len(),
            successful_rules: self
                .rules
                .iter()
                .filter(|r| r.success_rate() > 0.5)
                .count(),
        }
    }
}

/// 录入校验：条件解析失败或动作没有任何有效步骤时记警告，
/// 越界的置信度就地修正
fn lint_rule(rule: &mut Rule) {
    if let Err(e) = Condition::parse(&rule.condition) {
        warn!("Rule {} has an unmatchable condition: {}", rule.id, e);
    }
    if ActionPlan::parse(&rule.action).steps().is_empty() {
        warn!("Rule {} has an action with no usable steps", rule.id);
    }
    let raw = rule.confidence;
    if rule.normalize_confidence() {
        warn!(
            "Rule {} confidence {} out of range, stored as {}",
            rule.id, raw, rule.confidence
        );
    }
}
