//! 动作文法解析与执行
//!
//! 动作字符串按 `;` 切分为多段，每段要么是指令要么是字面回复：
//!
//! - `set_context:<key>:<value>`：写入会话上下文（key、value 非空，
//!   value 里允许再出现 `:`）
//! - `clear_context:<key>`：删除单个上下文键，键不存在时无事发生
//! - 其余任何段都是字面回复文本
//!
//! 段首（第一个 `:` 之前）等于指令名才算指令，避免把含冒号的普通句子
//! 误判成指令。畸形指令段记警告并跳过，不影响其余段。
//! 所有字面段按原顺序用单个空格拼成最终回复。

use tracing::warn;

use crate::memory::SessionContext;

/// 解析后的单个动作步骤
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionStep {
    Respond(String),
    SetContext { key: String, value: String },
    ClearContext { key: String },
}

/// 解析后的完整动作：一次解析，多次执行
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionPlan {
    steps: Vec<ActionStep>,
}

impl ActionPlan {
    /// 解析动作字符串。畸形指令段在这里记警告并丢弃，
    /// 录入校验和执行路径共用同一份文法。
    pub fn parse(raw: &str) -> Self {
        let mut steps = Vec::new();
        for part in raw.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match parse_step(part) {
                Ok(step) => steps.push(step),
                Err(reason) => warn!("Skipping malformed action part {:?}: {}", part, reason),
            }
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[ActionStep] {
        &self.steps
    }

    /// 依次执行各步骤，指令改写上下文，字面段拼成回复返回
    pub fn run(&self, ctx: &mut SessionContext) -> String {
        let mut fragments: Vec<&str> = Vec::new();
        for step in &self.steps {
            match step {
                ActionStep::Respond(text) => fragments.push(text),
                ActionStep::SetContext { key, value } => ctx.set(key.as_str(), value.as_str()),
                ActionStep::ClearContext { key } => ctx.remove(key),
            }
        }
        fragments.join(" ")
    }
}

fn parse_step(part: &str) -> Result<ActionStep, &'static str> {
    let head = part.split(':').next().unwrap_or(part).trim();
    match head {
        "set_context" => {
            let mut pieces = part.splitn(3, ':');
            pieces.next(); // 指令名
            let key = pieces.next().map(str::trim).unwrap_or_default();
            let value = pieces.next().map(str::trim).unwrap_or_default();
            if key.is_empty() || value.is_empty() {
                return Err("set_context needs `set_context:<key>:<value>`");
            }
            Ok(ActionStep::SetContext {
                key: key.to_string(),
                value: value.to_string(),
            })
        }
        "clear_context" => {
            let mut pieces = part.splitn(2, ':');
            pieces.next();
            let key = pieces.next().map(str::trim).unwrap_or_default();
            if key.is_empty() {
                return Err("clear_context needs `clear_context:<key>`");
            }
            Ok(ActionStep::ClearContext {
                key: key.to_string(),
            })
        }
        _ => Ok(ActionStep::Respond(part.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_single_response() {
        let plan = ActionPlan::parse("Hello! How can I help you today?");
        let mut ctx = SessionContext::new();
        assert_eq!(plan.run(&mut ctx), "Hello! How can I help you today?");
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_literals_join_with_single_space_in_order() {
        let plan = ActionPlan::parse("first part; second part ;third");
        let mut ctx = SessionContext::new();
        assert_eq!(plan.run(&mut ctx), "first part second part third");
    }

    #[test]
    fn test_set_context_directive() {
        let plan = ActionPlan::parse("What genre do you prefer?;set_context:awaiting_genre:true");
        let mut ctx = SessionContext::new();
        let reply = plan.run(&mut ctx);
        assert_eq!(reply, "What genre do you prefer?");
        assert_eq!(ctx.get("awaiting_genre"), Some("true"));
    }

    #[test]
    fn test_set_context_value_may_contain_colons() {
        let plan = ActionPlan::parse("set_context:endpoint:http://localhost:11434");
        let mut ctx = SessionContext::new();
        plan.run(&mut ctx);
        assert_eq!(ctx.get("endpoint"), Some("http://localhost:11434"));
    }

    #[test]
    fn test_clear_context_directive() {
        let mut ctx = SessionContext::new();
        ctx.set("awaiting_genre", "true");
        let plan = ActionPlan::parse("I recommend: Arrival;clear_context:awaiting_genre");
        let reply = plan.run(&mut ctx);
        assert_eq!(reply, "I recommend: Arrival");
        assert_eq!(ctx.get("awaiting_genre"), None);
    }

    #[test]
    fn test_clear_missing_key_is_a_no_op() {
        let plan = ActionPlan::parse("done;clear_context:never_set");
        let mut ctx = SessionContext::new();
        assert_eq!(plan.run(&mut ctx), "done");
    }

    #[test]
    fn test_malformed_directive_is_skipped_not_fatal() {
        let plan = ActionPlan::parse("set_context:only_a_key;still here");
        let mut ctx = SessionContext::new();
        assert_eq!(plan.run(&mut ctx), "still here");
        assert!(ctx.is_empty());

        let plan = ActionPlan::parse("clear_context:;ok");
        assert_eq!(plan.run(&mut SessionContext::new()), "ok");
    }

    #[test]
    fn test_literal_with_colon_is_not_a_directive() {
        let plan = ActionPlan::parse("Note: bring a towel");
        let mut ctx = SessionContext::new();
        assert_eq!(plan.run(&mut ctx), "Note: bring a towel");
    }

    #[test]
    fn test_empty_parts_are_dropped() {
        let plan = ActionPlan::parse(";;hello;;");
        assert_eq!(plan.steps().len(), 1);
    }
}
