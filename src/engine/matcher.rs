//! 规则匹配：筛出命中规则，按 置信度 × 成功率 取最高分

use crate::engine::{Condition, Rule};
use crate::memory::SessionContext;

/// 返回得分最高的命中规则。同分时保留先录入的那条（严格大于才替换），
/// 条件解析失败的规则直接当作不命中。
pub fn best_match<'a>(rules: &'a [Rule], query: &str, ctx: &SessionContext) -> Option<&'a Rule> {
    let mut best: Option<(&Rule, f64)> = None;
    for rule in rules {
        let Ok(condition) = Condition::parse(&rule.condition) else {
            continue;
        };
        if !condition.matches(query, ctx) {
            continue;
        }
        let score = rule.score();
        let replace = match best {
            Some((_, best_score)) => score > best_score,
            None => true,
        };
        if replace {
            best = Some((rule, score));
        }
    }
    best.map(|(rule, _)| rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_score_wins() {
        let low = Rule::new("hello", "low", 0.5);
        let high = Rule::new("hello", "high", 0.9);
        let rules = vec![low, high];
        let ctx = SessionContext::new();
        let best = best_match(&rules, "hello", &ctx).unwrap();
        assert_eq!(best.action, "high");
    }

    #[test]
    fn test_success_rate_can_flip_the_ranking() {
        let mut confident_but_failing = Rule::new("hello", "a", 0.9);
        confident_but_failing.record_feedback(false);
        confident_but_failing.record_feedback(false);
        // 0.9 × 0.0 = 0.0
        let modest = Rule::new("hello", "b", 0.6);
        // 0.6 × 0.5 = 0.3
        let rules = vec![confident_but_failing, modest];
        let best = best_match(&rules, "hello", &SessionContext::new()).unwrap();
        assert_eq!(best.action, "b");
    }

    #[test]
    fn test_tie_keeps_the_earlier_rule() {
        let first = Rule::new("hello", "first", 0.8);
        let second = Rule::new("hello", "second", 0.8);
        let rules = vec![first, second];
        let best = best_match(&rules, "hello", &SessionContext::new()).unwrap();
        assert_eq!(best.action, "first");
    }

    #[test]
    fn test_no_candidate_returns_none() {
        let rules = vec![Rule::new("goodbye", "bye", 0.9)];
        assert!(best_match(&rules, "hello", &SessionContext::new()).is_none());
    }

    #[test]
    fn test_unparseable_condition_never_matches() {
        let broken = Rule::new("not_a_context_clause;query", "x", 1.0);
        let ok = Rule::new("query", "y", 0.5);
        let rules = vec![broken, ok];
        let best = best_match(&rules, "some query", &SessionContext::new()).unwrap();
        assert_eq!(best.action, "y");
    }
}
