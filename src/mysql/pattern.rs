//! 黑名单（`exclude_tables`）解析
//!
//! 每个逗号分隔的片段可带库名限定：
//! - `tmp_.*`：不限定库，整个片段即表名正则
//! - `shop.tmp_.*`：仅当目标库为 `shop`（大小写不敏感）时生效
//! - `*.tmp_.*` / `.*.tmp_.*`：对任意库生效
//! - `other_db.t`：限定到其它库，对目标库没有约束，直接丢弃
//! - `other_db.*`：`.` 后跟量词，视为不限定库的表名正则；要丢弃其它库请写 `other_db..*`
//!
//! 正则总是整串匹配，`order` 不会排除 `orders`。

use regex::Regex;

use super::error::{CdcError, CdcResult};

/// 内部保留表，黑名单模式下总是排除。
pub const RESERVED_TABLE: &str = "sys_config";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternScope {
    Unscoped,
    AnySchema,
    Schema(String),
}

#[derive(Debug, Clone)]
pub struct ExclusionPattern {
    scope: PatternScope,
    source: String,
    regex: Regex,
}

impl ExclusionPattern {
    fn new(scope: PatternScope, source: &str) -> CdcResult<Self> {
        let regex = full_match_regex(source).map_err(|err| CdcError::PatternCompile {
            segment: source.to_string(),
            source: err,
        })?;
        Ok(Self {
            scope,
            source: source.to_string(),
            regex,
        })
    }

    pub fn reserved() -> CdcResult<Self> {
        Self::new(PatternScope::Unscoped, RESERVED_TABLE)
    }

    pub fn scope(&self) -> &PatternScope {
        &self.scope
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, table: &str) -> bool {
        self.regex.is_match(table)
    }
}

fn full_match_regex(source: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{source})$"))
}

/// 将黑名单字符串编译为作用于 `target_schema` 的排除规则，顺序与输入一致。
pub fn compile(target_schema: &str, raw_directive: &str) -> CdcResult<Vec<ExclusionPattern>> {
    compile_segments(target_schema, raw_directive.split(','))
}

pub fn compile_segments<'a, I>(target_schema: &str, segments: I) -> CdcResult<Vec<ExclusionPattern>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut patterns = Vec::new();
    for raw in segments {
        let segment = raw.trim();
        if segment.is_empty() {
            continue;
        }
        let (scope, source) = match split_qualifier(segment) {
            Some((db, tail)) => {
                let scope = if db == "*" || db == ".*" {
                    PatternScope::AnySchema
                } else if db.eq_ignore_ascii_case(target_schema) {
                    PatternScope::Schema(db.to_string())
                } else {
                    continue;
                };
                (scope, tail)
            }
            None => (PatternScope::Unscoped, segment),
        };
        if source.is_empty() {
            continue;
        }
        patterns.push(ExclusionPattern::new(scope, source)?);
    }
    Ok(patterns)
}

pub fn is_excluded(patterns: &[ExclusionPattern], table: &str) -> bool {
    patterns.iter().any(|p| p.is_match(table))
}

/// 库名与表名之间的分隔点：第一个既未被转义、后面也不是量词的 `.`。
fn split_qualifier(segment: &str) -> Option<(&str, &str)> {
    let bytes = segment.as_bytes();
    let mut escaped = false;
    for (idx, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'.' => {
                let quantified = matches!(bytes.get(idx + 1), Some(b'*' | b'+' | b'?' | b'{'));
                if !quantified {
                    return Some((&segment[..idx], &segment[idx + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}
