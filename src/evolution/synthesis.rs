//! 规则合成：从负面反馈学出新规则
//!
//! 两个入口汇到同一条流水线：
//! - Create：LLM 回退答错且用户给了正确回答时，请 LLM 从原查询里提炼
//!   `+` 连接的关键词作为新条件。
//! - Refine：已有规则误命中时，请 LLM 在失败条件的基础上加词，
//!   产出一个严格更具体的条件。
//!
//! 共同的收尾：取回复中第一个 `Condition:` 行（忽略大小写），去引号、
//! 小写化；动作一律用用户给的正确回答，LLM 回复里的 `Action:` 行忽略。
//! 入库前过安全门：再问一次 LLM 这条规则是否有害，只有首词明确回答
//! no 才放行，其余任何回答（包括 "Not sure"）都按拒绝处理。

use std::sync::Arc;

use tracing::debug;

use crate::core::AgentError;
use crate::evolution::{labeled_line, strip_quotes};
use crate::llm::LlmClient;

/// 规则合成器：Create / Refine 的提示词构造、应答解析与安全门
pub struct Synthesizer {
    llm: Arc<dyn LlmClient>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Create 入口：无规则可用且用户纠正了回答，学一条全新规则。
    /// 成功时返回归一化后的条件文本。
    pub async fn create(&self, query: &str, corrected_action: &str) -> Result<String, AgentError> {
        let prompt = format!(
            "Analyze the following user interaction and create a precise, symbolic rule.\n\
             The user's query was: \"{}\"\n\
             The correct response (action) should have been: \"{}\"\n\n\
             Determine a good 'condition' for a new rule. The condition should be a few \
             keywords from the user's query that capture the intent. Use '+' to separate \
             keywords that MUST ALL be present (AND logic).\n\n\
             Respond ONLY with the rule in the format:\n\
             Condition: [your condition keywords]",
            query, corrected_action
        );
        self.synthesize(&prompt, corrected_action).await
    }

    /// Refine 入口：规则误命中，在其条件上加词收窄。
    /// 原规则保留不动，新旧规则此后靠排序竞争。
    pub async fn refine(
        &self,
        failed_condition: &str,
        query: &str,
        corrected_action: &str,
    ) -> Result<String, AgentError> {
        let prompt = format!(
            "A rule in a symbolic decision engine fired on the wrong query and needs a \
             more specific condition.\n\
             The failed rule's condition was: \"{}\"\n\
             The query it wrongly answered was: \"{}\"\n\
             The correct response (action) should have been: \"{}\"\n\n\
             Propose a STRICTLY more specific condition: keep the failed condition's \
             keywords and add new ones taken from the query. Use '+' to separate keywords \
             that MUST ALL be present (AND logic).\n\n\
             Respond ONLY with the rule in the format:\n\
             Condition: [your condition keywords]",
            failed_condition, query, corrected_action
        );
        self.synthesize(&prompt, corrected_action).await
    }

    async fn synthesize(&self, prompt: &str, action: &str) -> Result<String, AgentError> {
        if action.trim().is_empty() {
            return Err(AgentError::SynthesisRejected(
                "corrected action is empty".to_string(),
            ));
        }

        let response = self.llm.query(prompt).await?;
        let Some(raw) = labeled_line(&response, "Condition:") else {
            debug!("Synthesis reply had no Condition line: {:?}", response);
            return Err(AgentError::SynthesisRejected(
                "no Condition line in reply".to_string(),
            ));
        };
        let condition = strip_quotes(raw).to_lowercase();
        if condition.is_empty() {
            debug!("Synthesis reply had an empty Condition line: {:?}", response);
            return Err(AgentError::SynthesisRejected(
                "proposed condition is empty".to_string(),
            ));
        }

        let verdict = self
            .llm
            .query(&safety_prompt(&condition, action))
            .await?;
        if !is_explicit_no(&verdict) {
            debug!("Safety gate verdict was not an explicit no: {:?}", verdict);
            return Err(AgentError::SynthesisRejected(
                "safety gate did not approve the rule".to_string(),
            ));
        }

        Ok(condition)
    }
}

fn safety_prompt(condition: &str, action: &str) -> String {
    format!(
        "You are a safety reviewer for a conversational agent. A new rule is about \
         to be added:\n\
         Condition: \"{}\"\n\
         Action: \"{}\"\n\n\
         Would executing this rule be harmful, unethical, or dangerous? Answer with \
         a single word: YES or NO.",
        condition, action
    )
}

/// 首个非空行的首词（去掉尾随标点、忽略大小写）必须恰好是 "no"。
/// "Not sure" 这类含 no 字样的回答不算。
fn is_explicit_no(reply: &str) -> bool {
    let Some(line) = reply.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return false;
    };
    let Some(word) = line.split_whitespace().next() else {
        return false;
    };
    word.trim_matches(|c: char| c.is_ascii_punctuation())
        .eq_ignore_ascii_case("no")
}
