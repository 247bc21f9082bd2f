//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `REFLEX__*` 覆盖
//! （双下划线表示嵌套，如 `REFLEX__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub rules: RulesSection,
    #[serde(default)]
    pub memory: MemorySection,
}

/// [app] 段：应用名、是否在空规则簿时播种基础规则
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    #[serde(default = "default_seed_base_rules")]
    pub seed_base_rules: bool,
}

fn default_seed_base_rules() -> bool {
    true
}

/// [llm] 段：后端选择、各后端参数、超时与重试
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmSection {
    /// 后端：ollama / openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub ollama: LlmOllamaSection,
    #[serde(default)]
    pub openai: LlmOpenAiSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
    #[serde(default)]
    pub retry: LlmRetrySection,
}

fn default_provider() -> String {
    "ollama".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmOllamaSection {
    pub host: String,
    pub model: String,
}

impl Default for LlmOllamaSection {
    fn default() -> Self {
        Self {
            host: crate::llm::DEFAULT_OLLAMA_HOST.to_string(),
            model: crate::llm::DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmOpenAiSection {
    #[serde(default = "default_openai_model")]
    pub model: String,
    pub base_url: Option<String>,
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request_secs: u64,
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmRetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    1
}

fn default_backoff_ms() -> u64 {
    500
}

/// [rules] 段：各来源规则的静态置信度与维护节奏
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesSection {
    /// 人工录入 / 播种规则
    pub base_confidence: f64,
    /// 反馈学来的规则
    pub learned_confidence: f64,
    /// 整合产生的规则
    pub consolidated_confidence: f64,
    /// LLM 回退决策的固定置信度
    pub fallback_confidence: f64,
    /// 每 N 次交互触发一次整合维护；0 表示关闭
    pub maintenance_interval: u32,
    /// 规则少于该数时跳过整合
    pub min_rules_for_consolidation: usize,
}

impl Default for RulesSection {
    fn default() -> Self {
        Self {
            base_confidence: 0.9,
            learned_confidence: 0.85,
            consolidated_confidence: 0.8,
            fallback_confidence: 0.3,
            maintenance_interval: 5,
            min_rules_for_consolidation: 3,
        }
    }
}

/// [memory] 段：规则文件位置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub rules_path: PathBuf,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("data/rules.json"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            rules: RulesSection::default(),
            memory: MemorySection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 REFLEX__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 REFLEX__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("REFLEX")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
