//! 周期性规则整合
//!
//! 把全部规则摆给 LLM 看一遍，让它点名冗余规则并给出一条合并后的
//! (condition, action)。应答必须带三个标签行或单独一行 `None found`，
//! 其余一律按畸形应答拒绝（记日志，不动规则簿）。

use tracing::debug;

use crate::core::AgentError;
use crate::engine::Rule;
use crate::evolution::{labeled_line, strip_quotes};
use crate::llm::LlmClient;

/// 整合方案：待删除的规则 ID 与合并后的新规则内容
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsolidationPlan {
    pub remove_ids: Vec<String>,
    pub condition: String,
    pub action: String,
}

/// 请 LLM 审一遍规则簿。Ok(None) 表示明确回答没有冗余；
/// 方案的落实（删旧、加新、持久化）由调用方完成。
pub async fn plan_consolidation(
    llm: &dyn LlmClient,
    rules: &[Rule],
) -> Result<Option<ConsolidationPlan>, AgentError> {
    let roster = rules
        .iter()
        .map(|r| format!("{} | {} | {}", r.id, r.condition, r.action))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "These are the symbolic rules of a conversational decision engine, one per \
         line in the format `id | condition | action`:\n\n\
         {}\n\n\
         If some of these rules are redundant (overlapping conditions with \
         interchangeable actions), reply EXACTLY in the format:\n\
         Redundant IDs: [id1, id2]\n\
         Consolidated Condition: [one condition that covers them]\n\
         Consolidated Action: [one action]\n\n\
         If none are redundant, reply with the single line:\n\
         None found",
        roster
    );

    let response = llm.query(&prompt).await?;
    parse_consolidation_reply(&response)
}

fn parse_consolidation_reply(response: &str) -> Result<Option<ConsolidationPlan>, AgentError> {
    let none_found = response
        .lines()
        .map(str::trim)
        .any(|l| l.eq_ignore_ascii_case("none found"));
    if none_found {
        return Ok(None);
    }

    let ids_raw = labeled_line(response, "Redundant IDs:");
    let condition_raw = labeled_line(response, "Consolidated Condition:");
    let action_raw = labeled_line(response, "Consolidated Action:");

    let (Some(ids_raw), Some(condition_raw), Some(action_raw)) =
        (ids_raw, condition_raw, action_raw)
    else {
        debug!("Malformed consolidation reply: {:?}", response);
        return Err(AgentError::SynthesisRejected(
            "consolidation reply is missing a labeled line".to_string(),
        ));
    };

    let remove_ids: Vec<String> = ids_raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|id| strip_quotes(id).to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let condition = strip_quotes(condition_raw).to_lowercase();
    let action = strip_quotes(action_raw).to_string();

    if remove_ids.is_empty() || condition.is_empty() || action.is_empty() {
        debug!("Unusable consolidation reply: {:?}", response);
        return Err(AgentError::SynthesisRejected(
            "consolidation reply has empty ids, condition or action".to_string(),
        ));
    }

    Ok(Some(ConsolidationPlan {
        remove_ids,
        condition,
        action,
    }))
}
