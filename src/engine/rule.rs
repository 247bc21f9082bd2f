//! 规则记录：符号决策的最小单元
//!
//! 条件和动作都以原文字符串存储（文法见 `condition` / `action` 模块），
//! 统计字段随用户反馈更新。序列化即持久化格式，字段一个不少，
//! 成功率等派生值不落盘。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 一条符号规则：条件文法 + 动作文法 + 静态置信度 + 反馈统计
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub condition: String,
    pub action: String,
    /// 静态置信度，始终在 [0, 1] 内
    pub confidence: f64,
    pub success_count: u32,
    pub failure_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl Rule {
    /// 新建规则：分配 UUID，置信度越界时钳制到 [0, 1]
    pub fn new(condition: impl Into<String>, action: impl Into<String>, confidence: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            condition: condition.into(),
            action: action.into(),
            confidence: clamp_confidence(confidence),
            success_count: 0,
            failure_count: 0,
            created_at: now,
            last_used: now,
        }
    }

    /// 越界或 NaN 的置信度拉回 [0, 1]，返回是否发生修正。
    /// 手改规则文件反序列化出来的值会绕开 `new` 的钳制。
    pub fn normalize_confidence(&mut self) -> bool {
        let normalized = clamp_confidence(self.confidence);
        let changed = self.confidence != normalized;
        self.confidence = normalized;
        changed
    }

    /// 历史成功率：无反馈时中性取 0.5，之后为 成功次数 / 总反馈次数
    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + self.failure_count;
        if total == 0 {
            0.5
        } else {
            f64::from(self.success_count) / f64::from(total)
        }
    }

    /// 排序得分 = 静态置信度 × 历史成功率
    pub fn score(&self) -> f64 {
        self.confidence * self.success_rate()
    }

    pub fn record_feedback(&mut self, success: bool) {
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
    }

    pub fn mark_used(&mut self) {
        self.last_used = Utc::now();
    }
}

/// `f64::clamp` 对 NaN 原样放行，这里统一当 0 处理
fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_neutral_without_feedback() {
        let rule = Rule::new("hello", "Hello!", 0.9);
        assert_eq!(rule.success_rate(), 0.5);
        assert!((rule.score() - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_success_rate_reflects_feedback() {
        let mut rule = Rule::new("hello", "Hello!", 0.8);
        rule.record_feedback(true);
        rule.record_feedback(true);
        rule.record_feedback(true);
        rule.record_feedback(false);
        assert!((rule.success_rate() - 0.75).abs() < 1e-9);
        assert!((rule.score() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Rule::new("a", "b", 1.7).confidence, 1.0);
        assert_eq!(Rule::new("a", "b", -0.3).confidence, 0.0);
        assert_eq!(Rule::new("a", "b", f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_normalize_confidence_repairs_bad_values() {
        let mut rule = Rule::new("a", "b", 0.9);
        assert!(!rule.normalize_confidence());
        assert_eq!(rule.confidence, 0.9);

        rule.confidence = 1.7;
        assert!(rule.normalize_confidence());
        assert_eq!(rule.confidence, 1.0);

        rule.confidence = f64::NAN;
        assert!(rule.normalize_confidence());
        assert_eq!(rule.confidence, 0.0);
    }

    #[test]
    fn test_serde_round_trip_preserves_all_fields() {
        let mut rule = Rule::new("movie+recommend", "What genre?", 0.85);
        rule.record_feedback(true);
        rule.record_feedback(false);

        let json = serde_json::to_string(&rule).unwrap();
        let back: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(rule, back);
        // 派生值不落盘
        assert!(!json.contains("success_rate"));
        assert!(!json.contains("score"));
    }
}
