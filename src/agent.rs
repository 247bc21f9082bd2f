//! 决策编排器
//!
//! 对外只有三个调用面：process（查询进、决策出）、feedback（按决策 ID
//! 评分，驱动规则统计与学习）、explain（决策溯源文本）。会话状态作为
//! 显式参数传入，编排器自身只持有规则簿、存储与 LLM，便于多会话隔离。
//!
//! 错误全部在这里消化：LLM 不可达给固定降级回复，持久化失败只记日志，
//! 合成失败跳过本次学习。三个调用面都不会向调用方抛错。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::RulesSection;
use crate::engine::{best_match, ActionPlan, Rule, RuleBook};
use crate::evolution::{plan_consolidation, Synthesizer};
use crate::llm::LlmClient;
use crate::memory::{Decision, DecisionSource, ReasoningStep, RuleStorage, Session};

/// LLM 不可达或持续出错时，回退路径的固定降级回复
pub const DEGRADED_SERVICE_REPLY: &str =
    "Sorry, I'm having trouble connecting to my reasoning core.";

/// 规则引擎总览统计
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineStats {
    pub total_rules: usize,
    /// 历史成功率高于 0.5 的规则数
    pub successful_rules: usize,
    pub total_decisions: usize,
    pub rule_success_rate: f64,
}

/// 神经符号决策编排器：符号规则优先，LLM 兜底，反馈驱动规则演化
pub struct DecisionAgent {
    book: RuleBook,
    storage: Box<dyn RuleStorage>,
    llm: Arc<dyn LlmClient>,
    synthesizer: Synthesizer,
    rules_cfg: RulesSection,
}

impl DecisionAgent {
    /// 从存储加载规则簿并组装编排器。
    /// 规则文件损坏或读不到时记警告、从空规则簿起步，绝不让进程起不来。
    pub fn new(
        storage: Box<dyn RuleStorage>,
        llm: Arc<dyn LlmClient>,
        rules_cfg: RulesSection,
    ) -> Self {
        let book = match storage.load() {
            Ok(rules) => {
                debug!("Loaded {} rules from storage", rules.len());
                RuleBook::from_rules(rules)
            }
            Err(e) => {
                warn!(
                    "Could not load rules ({}), starting with an empty rule book",
                    e
                );
                RuleBook::new()
            }
        };
        let synthesizer = Synthesizer::new(llm.clone());
        Self {
            book,
            storage,
            llm,
            synthesizer,
            rules_cfg,
        }
    }

    /// 规则簿为空时播种三条演示规则（问候、问类型、按上下文推荐）
    pub fn seed_base_rules(&mut self) {
        if !self.book.is_empty() {
            return;
        }
        info!("No rules found, seeding base rules");
        let confidence = self.rules_cfg.base_confidence;
        self.add_rule("hello hi hey", "Hello! How can I help you today?", confidence);
        self.add_rule(
            "movie recommendation",
            "What genre do you prefer? (sci-fi, horror, comedy, drama, etc.);set_context:awaiting_genre:true",
            confidence,
        );
        self.add_rule(
            "context:awaiting_genre:true;sci-fi|science fiction",
            "I recommend: Interstellar, Blade Runner 2049, Arrival;clear_context:awaiting_genre",
            confidence,
        );
    }

    /// 录入一条规则并立即持久化，返回规则 ID
    pub fn add_rule(
        &mut self,
        condition: impl Into<String>,
        action: impl Into<String>,
        confidence: f64,
    ) -> String {
        let rule = Rule::new(condition, action, confidence);
        info!("Added rule {} -> condition {:?}", rule.id, rule.condition);
        let id = self.book.add(rule);
        self.persist();
        id
    }

    /// 只读视图，按录入顺序
    pub fn rules(&self) -> &[Rule] {
        self.book.rules()
    }

    /// 处理一条用户查询。
    ///
    /// 流程：维护计数（到点先跑整合）→ 规则匹配 → 命中则执行动作，
    /// 未命中则 LLM 回退（回退前后上下文整体清空）→ 决策入会话历史 →
    /// 持久化（带上 last_used 等变更）。
    pub async fn process(&mut self, session: &mut Session, query: &str) -> Decision {
        if session.due_for_maintenance(self.rules_cfg.maintenance_interval) {
            self.run_maintenance().await;
        }

        let matched_id =
            best_match(self.book.rules(), query, &session.context).map(|r| r.id.clone());

        let decision = match matched_id.and_then(|id| self.book.get_mut(&id)) {
            Some(rule) => {
                info!("Matched rule {} for query {:?}", rule.id, query);
                let plan = ActionPlan::parse(&rule.action);
                let step =
                    ReasoningStep::new(&rule.id, &rule.condition, &rule.action, rule.confidence);
                let final_confidence = rule.score();
                rule.mark_used();
                let output = plan.run(&mut session.context);
                Decision::from_rule(query, output, step, final_confidence)
            }
            None => {
                info!("No rule matched for {:?}, falling back to LLM", query);
                let output = match self.llm.query(query).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("LLM fallback failed: {}", e);
                        DEGRADED_SERVICE_REPLY.to_string()
                    }
                };
                // 回退答案不走规则，不能留下半截对话状态
                session.context.clear();
                Decision::from_llm(query, output, self.rules_cfg.fallback_confidence)
            }
        };

        session.push_decision(decision.clone());
        self.persist();
        decision
    }

    /// 处理用户对某条决策的评分。
    ///
    /// 4 星及以上算成功。符号决策更新规则统计，失败且带纠正文本时触发
    /// Refine；LLM 决策失败且带纠正文本时触发 Create。未知决策 ID 和
    /// 重复评分都只记日志。
    pub async fn feedback(
        &mut self,
        session: &mut Session,
        decision_id: &str,
        rating: u8,
        feedback_text: &str,
    ) {
        let Some(decision) = session.find_decision_mut(decision_id) else {
            warn!("Feedback for unknown decision {}, ignoring", decision_id);
            return;
        };
        if decision.is_rated() {
            warn!(
                "Decision {} already has feedback, ignoring repeat rating",
                decision_id
            );
            return;
        }

        decision.feedback_rating = Some(rating);
        decision.feedback_text =
            (!feedback_text.is_empty()).then(|| feedback_text.to_string());

        let success = rating >= 4;
        let query = decision.input_query.clone();
        let source = decision.source.clone();
        let step = decision
            .reasoning_steps
            .first()
            .map(|s| (s.rule_id.clone(), s.condition_matched.clone()));

        match source {
            DecisionSource::SymbolicRule => {
                let Some((rule_id, recorded_condition)) = step else {
                    warn!("Symbolic decision {} has no reasoning step", decision_id);
                    return;
                };
                let failed_condition = match self.book.get_mut(&rule_id) {
                    Some(rule) => {
                        rule.record_feedback(success);
                        info!("Updated rule {} stats, success: {}", rule_id, success);
                        rule.condition.clone()
                    }
                    // 规则可能已被整合删除，改用决策当时记下的条件继续学习
                    None => {
                        warn!("Feedback references rule {} which no longer exists", rule_id);
                        recorded_condition
                    }
                };
                if !success && !feedback_text.is_empty() {
                    self.refine_from_feedback(&failed_condition, &query, feedback_text)
                        .await;
                }
            }
            DecisionSource::Llm => {
                if !success && !feedback_text.is_empty() {
                    self.create_from_feedback(&query, feedback_text).await;
                }
            }
        }

        self.persist();
    }

    /// 决策溯源：符号决策给出规则条件、动作、置信度与成功率；
    /// LLM 决策给固定说明；未知 ID 给固定 "not found"。
    pub fn explain(&self, session: &Session, decision_id: &str) -> String {
        let Some(decision) = session.find_decision(decision_id) else {
            return "Decision not found.".to_string();
        };

        match decision.source {
            DecisionSource::SymbolicRule => {
                let Some(step) = decision.reasoning_steps.first() else {
                    return "Could not generate an explanation.".to_string();
                };
                match self.book.get(&step.rule_id) {
                    Some(rule) => format!(
                        "Source: Symbolic Rule (ID: {})\n\
                         -----------------------------------------\n\
                         When I saw a query matching the condition:\n  '{}'\n\n\
                         I was instructed to perform the action:\n  '{}'\n\n\
                         Rule Confidence: {:.2}\n\
                         Historical Success Rate: {:.2}%\n\
                         Final Confidence Score: {:.2}",
                        rule.id,
                        rule.condition,
                        rule.action,
                        rule.confidence,
                        rule.success_rate() * 100.0,
                        decision.final_confidence
                    ),
                    // 规则可能已被整合删除，退回决策当时的记录
                    None => format!(
                        "Source: Symbolic Rule (ID: {})\n\
                         -----------------------------------------\n\
                         When I saw a query matching the condition:\n  '{}'\n\n\
                         I was instructed to perform the action:\n  '{}'\n\n\
                         Rule Confidence: {:.2}\n\
                         Final Confidence Score: {:.2}\n\
                         (This rule has since been removed from the rule book.)",
                        step.rule_id,
                        step.condition_matched,
                        step.action_taken,
                        step.confidence,
                        decision.final_confidence
                    ),
                }
            }
            DecisionSource::Llm => "Source: LLM Fallback\n\
                 --------------------\n\
                 I didn't have a specific rule for your query.\n\
                 So, I used my general knowledge to generate a response.\n\
                 My confidence in this answer is lower because it's not based on established logic."
                .to_string(),
        }
    }

    pub fn stats(&self, session: &Session) -> EngineStats {
        let book = self.book.stats();
        EngineStats {
            total_rules: book.total_rules,
            successful_rules: book.successful_rules,
            total_decisions: session.decisions.len(),
            rule_success_rate: if book.total_rules > 0 {
                book.successful_rules as f64 / book.total_rules as f64
            } else {
                0.0
            },
        }
    }

    async fn create_from_feedback(&mut self, query: &str, corrected_action: &str) {
        info!("Learning a new rule from feedback on query {:?}", query);
        match self.synthesizer.create(query, corrected_action).await {
            Ok(condition) => {
                let rule = Rule::new(condition, corrected_action, self.rules_cfg.learned_confidence);
                info!("Learned rule {} -> condition {:?}", rule.id, rule.condition);
                self.book.add(rule);
            }
            Err(e) => warn!("Could not learn a rule from feedback: {}", e),
        }
    }

    async fn refine_from_feedback(&mut self, failed_condition: &str, query: &str, corrected_action: &str) {
        info!(
            "Refining condition {:?} after a wrong match on {:?}",
            failed_condition, query
        );
        match self
            .synthesizer
            .refine(failed_condition, query, corrected_action)
            .await
        {
            Ok(condition) => {
                let rule = Rule::new(condition, corrected_action, self.rules_cfg.learned_confidence);
                info!("Refined into rule {} -> condition {:?}", rule.id, rule.condition);
                self.book.add(rule);
            }
            Err(e) => warn!("Could not refine the rule: {}", e),
        }
    }

    /// 每 N 次交互请 LLM 审一遍规则簿，删冗余、加合并规则
    async fn run_maintenance(&mut self) {
        if self.book.len() < self.rules_cfg.min_rules_for_consolidation {
            debug!(
                "Skipping consolidation, only {} rules in the book",
                self.book.len()
            );
            return;
        }
        info!("Running consolidation pass over {} rules", self.book.len());
        match plan_consolidation(self.llm.as_ref(), self.book.rules()).await {
            Ok(Some(plan)) => {
                for id in &plan.remove_ids {
                    if self.book.remove(id).is_some() {
                        info!("Removed redundant rule {}", id);
                    } else {
                        warn!("Consolidation named unknown rule id {}", id);
                    }
                }
                let rule = Rule::new(
                    plan.condition,
                    plan.action,
                    self.rules_cfg.consolidated_confidence,
                );
                info!("Added consolidated rule {} -> condition {:?}", rule.id, rule.condition);
                self.book.add(rule);
                self.persist();
            }
            Ok(None) => debug!("Consolidation found no redundancy"),
            Err(e) => warn!("Consolidation skipped: {}", e),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save(self.book.rules()) {
            tracing::error!("Failed to persist rules: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::memory::NoopRuleStorage;

    fn agent_with_llm(llm: Arc<dyn LlmClient>) -> DecisionAgent {
        DecisionAgent::new(Box::new(NoopRuleStorage), llm, RulesSection::default())
    }

    #[test]
    fn test_seed_base_rules_only_on_empty_book() {
        let mut agent = agent_with_llm(Arc::new(MockLlmClient::new()));
        agent.seed_base_rules();
        assert_eq!(agent.rules().len(), 3);

        // 再播一次不重复
        agent.seed_base_rules();
        assert_eq!(agent.rules().len(), 3);
    }

    #[test]
    fn test_explain_unknown_decision() {
        let agent = agent_with_llm(Arc::new(MockLlmClient::new()));
        let session = Session::new();
        assert_eq!(agent.explain(&session, "nope"), "Decision not found.");
    }

    #[tokio::test]
    async fn test_feedback_on_unknown_decision_is_a_no_op() {
        let mut agent = agent_with_llm(Arc::new(MockLlmClient::new()));
        let mut session = Session::new();
        agent.feedback(&mut session, "missing-id", 1, "correction").await;
        assert!(agent.rules().is_empty());
    }

    #[tokio::test]
    async fn test_stats_reflect_book_and_session() {
        let mut agent = agent_with_llm(Arc::new(MockLlmClient::new()));
        agent.seed_base_rules();
        let mut session = Session::new();
        agent.process(&mut session, "hello there").await;

        let stats = agent.stats(&session);
        assert_eq!(stats.total_rules, 3);
        assert_eq!(stats.total_decisions, 1);
        assert_eq!(stats.successful_rules, 0);
    }
}
