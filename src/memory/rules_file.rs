//! 规则持久化
//!
//! 规则簿整体写入单个 JSON 文件（数组，保持录入顺序），先写临时文件
//! 再原子重命名，进程中途被杀也不会留下半截文件。加载失败的处理
//! 留给调用方：编排器的策略是记警告并从空规则簿起步。

use std::path::{Path, PathBuf};

use crate::core::AgentError;
use crate::engine::Rule;

/// 规则持久化抽象；实现必须可跨线程共享
pub trait RuleStorage: Send + Sync {
    fn load(&self) -> Result<Vec<Rule>, AgentError>;
    fn save(&self, rules: &[Rule]) -> Result<(), AgentError>;
}

/// 单文件 JSON 存储
#[derive(Debug)]
pub struct JsonRuleStorage {
    path: PathBuf,
}

impl JsonRuleStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RuleStorage for JsonRuleStorage {
    /// 文件不存在或内容为空白时返回空列表；内容损坏时返回格式错误
    fn load(&self) -> Result<Vec<Rule>, AgentError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rules: Vec<Rule> = serde_json::from_str(&data)?;
        Ok(rules)
    }

    /// 父目录不存在时自动创建；写临时文件后原子重命名
    fn save(&self, rules: &[Rule]) -> Result<(), AgentError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(rules)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// 空实现，纯内存运行（测试或一次性会话）
#[derive(Debug, Default)]
pub struct NoopRuleStorage;

impl RuleStorage for NoopRuleStorage {
    fn load(&self) -> Result<Vec<Rule>, AgentError> {
        Ok(Vec::new())
    }

    fn save(&self, _rules: &[Rule]) -> Result<(), AgentError> {
        Ok(())
    }
}
