//! 条件文法解析与匹配
//!
//! 完整形式：`context:<key>:<value>;<查询子句>`
//!
//! - 上下文子句（可选，`;` 之前）：要求会话上下文里 `key` 的值与 `value`
//!   精确相等（区分大小写）。出现了 `;` 但前半段不是合法的
//!   `context:<key>:<value>`，整条条件按不匹配处理（宁缺毋滥）。
//! - 查询子句：`|` 分隔 OR 组，组内 `+` 连接的词全部命中才算该组命中；
//!   兼容老写法：不含 `+` 和 `|` 时按空白切词，任一词命中即可。
//!   词条匹配为小写化后的子串包含，查询先去首尾空白再比较。
//! - 只有上下文子句没有查询子句时，上下文相符即匹配。
//! - 空条件（或全部词条为空）不匹配任何查询。

use thiserror::Error;

use crate::memory::SessionContext;

/// 条件文法错误，只在上下文子句不合法时出现；
/// 匹配路径把它当作不匹配，录入路径把它记进警告日志
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("clause before ';' must start with `context:`, got {0:?}")]
    MissingContextPrefix(String),

    #[error("context clause needs `context:<key>:<value>`, got {0:?}")]
    MissingContextValue(String),

    #[error("context clause has an empty key or value: {0:?}")]
    EmptyContextField(String),
}

/// 解析后的条件：可选上下文相等断言 + OR 组列表（组内 AND）
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    context: Option<(String, String)>,
    /// 外层 OR，内层 AND，词条已小写化；老写法的每个词独立成组
    groups: Vec<Vec<String>>,
}

impl Condition {
    pub fn parse(raw: &str) -> Result<Self, ConditionError> {
        let raw = raw.trim();
        let (context, query_part) = split_context_clause(raw)?;
        Ok(Self {
            context,
            groups: parse_query_clause(query_part),
        })
    }

    /// 该条件是否命中给定查询与上下文
    pub fn matches(&self, query: &str, ctx: &SessionContext) -> bool {
        if let Some((key, value)) = &self.context {
            if ctx.get(key) != Some(value.as_str()) {
                return false;
            }
        }
        if self.groups.is_empty() {
            // 纯上下文条件：子句通过即命中；完全空的条件不命中
            return self.context.is_some();
        }
        let lowered = query.trim().to_lowercase();
        self.groups
            .iter()
            .any(|group| group.iter().all(|term| lowered.contains(term.as_str())))
    }
}

/// 剥出上下文子句。返回 (上下文断言, 剩余查询子句)。
fn split_context_clause(raw: &str) -> Result<(Option<(String, String)>, &str), ConditionError> {
    if let Some((head, rest)) = raw.split_once(';') {
        let head = head.trim();
        return Ok((Some(parse_context_head(head)?), rest));
    }
    if raw.trim_start().starts_with("context:") {
        // 没有 `;` 的纯上下文条件
        return Ok((Some(parse_context_head(raw.trim())?), ""));
    }
    Ok((None, raw))
}

fn parse_context_head(head: &str) -> Result<(String, String), ConditionError> {
    let Some(body) = head.strip_prefix("context:") else {
        return Err(ConditionError::MissingContextPrefix(head.to_string()));
    };
    let Some((key, value)) = body.split_once(':') else {
        return Err(ConditionError::MissingContextValue(head.to_string()));
    };
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return Err(ConditionError::EmptyContextField(head.to_string()));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_query_clause(part: &str) -> Vec<Vec<String>> {
    let part = part.trim();
    if part.is_empty() {
        return Vec::new();
    }
    if part.contains('|') || part.contains('+') {
        part.split('|')
            .filter_map(|group| {
                let terms: Vec<String> = group
                    .split('+')
                    .map(|term| term.trim().to_lowercase())
                    .filter(|term| !term.is_empty())
                    .collect();
                if terms.is_empty() {
                    None
                } else {
                    Some(terms)
                }
            })
            .collect()
    } else {
        // 老写法：空白切词，各词独立成 OR 组
        part.split_whitespace()
            .map(|term| vec![term.to_lowercase()])
            .collect()
    }
}
