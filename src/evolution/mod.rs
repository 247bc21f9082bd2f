//! 规则演化：反馈驱动的规则合成与周期性整合
//!
//! 两条路径共用同一套严格的应答文法：LLM 的回复里必须出现带标签的行
//! （`Condition:` / `Redundant IDs:` 等），找不到就拒绝并记下原始回复，
//! 绝不做尽力而为的模糊抓取。

pub mod consolidate;
pub mod synthesis;

pub use consolidate::{plan_consolidation, ConsolidationPlan};
pub use synthesis::Synthesizer;

/// 取回复中第一个以 `label` 开头的行（标签比较忽略大小写），返回标签后的内容
fn labeled_line<'a>(response: &'a str, label: &str) -> Option<&'a str> {
    response.lines().find_map(|line| {
        let line = line.trim();
        let head = line.get(..label.len())?;
        if head.eq_ignore_ascii_case(label) {
            line.get(label.len()..)
        } else {
            None
        }
    })
}

/// 去掉首尾空白与包裹引号
fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_line_is_case_insensitive() {
        let reply = "Sure, here you go:\ncondition: movie+recommend\nAction: ignored";
        assert_eq!(labeled_line(reply, "Condition:"), Some(" movie+recommend"));
    }

    #[test]
    fn test_labeled_line_takes_first_match() {
        let reply = "Condition: first\nCondition: second";
        assert_eq!(labeled_line(reply, "Condition:"), Some(" first"));
    }

    #[test]
    fn test_labeled_line_absent() {
        assert_eq!(labeled_line("no labels here", "Condition:"), None);
    }

    #[test]
    fn test_labeled_line_survives_non_ascii() {
        // 行首是多字节字符时不应 panic，只是不匹配
        let reply = "中文开头的一行\nCondition: ok";
        assert_eq!(labeled_line(reply, "Condition:"), Some(" ok"));
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("  \"movie+recommend\"  "), "movie+recommend");
        assert_eq!(strip_quotes("'single'"), "single");
        assert_eq!(strip_quotes("plain"), "plain");
        assert_eq!(strip_quotes("  "), "");
    }
}
