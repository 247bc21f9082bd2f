//! 会话状态：上下文键值对 + 本会话的决策历史
//!
//! 上下文是规则条件里 `context:<key>:<value>` 子句的匹配对象，动作指令
//! `set_context` / `clear_context` 写入它；LLM 回退会整体清空，避免陈旧
//! 状态影响后续对话。决策历史只保留在内存里，反馈和 explain 按 ID 查回。

use std::collections::HashMap;

use crate::memory::Decision;

/// 会话级键值上下文，键和值都按原样存储并精确比较
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    entries: HashMap<String, String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// 删除单个键；键不存在时静默无事发生
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 单个用户的一次会话：上下文 + 决策历史 + 维护计数器
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub context: SessionContext,
    pub decisions: Vec<Decision>,
    interactions_since_maintenance: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_decision(&mut self, decision: Decision) {
        self.decisions.push(decision);
    }

    pub fn find_decision(&self, id: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.id == id)
    }

    pub fn find_decision_mut(&mut self, id: &str) -> Option<&mut Decision> {
        self.decisions.iter_mut().find(|d| d.id == id)
    }

    /// 记一次交互，计数达到 `interval` 时归零并返回 true（该轮先做维护再决策）。
    /// `interval` 为 0 表示永不触发。
    pub fn due_for_maintenance(&mut self, interval: u32) -> bool {
        self.interactions_since_maintenance += 1;
        if interval > 0 && self.interactions_since_maintenance >= interval {
            self.interactions_since_maintenance = 0;
            true
        } else {
            false
        }
    }
}
