use std::fmt;
use std::time::Duration;
use wp_log::{info_data, warn_data};

use super::catalog::CatalogIntrospector;
use super::error::{CdcError, CdcResult};
use super::pattern::{self, ExclusionPattern};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedTableName {
    pub schema: String,
    pub table: String,
}

impl QualifiedTableName {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for QualifiedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// 表选择方式：不过滤 / 白名单 / 黑名单，三者互斥。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    NoFilter,
    Whitelist { patterns: Vec<String> },
    Blacklist { patterns: Vec<String> },
}

impl Directive {
    /// 由原始配置构建；白名单与黑名单同时非空时报 `ConfigurationConflict`。
    pub fn from_raw(table_list: Option<&str>, exclude_tables: Option<&str>) -> CdcResult<Self> {
        let table_list = table_list.filter(|s| !s.trim().is_empty());
        let exclude_tables = exclude_tables.filter(|s| !s.trim().is_empty());
        match (table_list, exclude_tables) {
            (Some(_), Some(_)) => Err(CdcError::ConfigurationConflict),
            (Some(list), None) => Ok(Directive::Whitelist {
                patterns: split_tokens(list),
            }),
            (None, Some(list)) => Ok(Directive::Blacklist {
                patterns: split_tokens(list),
            }),
            (None, None) => Ok(Directive::NoFilter),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Directive::NoFilter => "all",
            Directive::Whitelist { .. } => "whitelist",
            Directive::Blacklist { .. } => "blacklist",
        }
    }
}

fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// 解析结果：白名单/默认路径交给连接器做匹配，黑名单路径是核对过的表名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTableSet {
    Patterns(Vec<String>),
    Tables(Vec<QualifiedTableName>),
}

impl ResolvedTableSet {
    pub fn capture_targets(&self) -> Vec<String> {
        match self {
            ResolvedTableSet::Patterns(p) => p.clone(),
            ResolvedTableSet::Tables(t) => t.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResolvedTableSet::Patterns(p) => p.len(),
            ResolvedTableSet::Tables(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn all_tables(schema: &str) -> ResolvedTableSet {
    ResolvedTableSet::Patterns(vec![format!("{schema}.*")])
}

pub async fn resolve(
    schema: &str,
    directive: &Directive,
    introspector: &dyn CatalogIntrospector,
    timeout: Option<Duration>,
) -> CdcResult<ResolvedTableSet> {
    let resolved = match directive {
        Directive::NoFilter => all_tables(schema),
        Directive::Whitelist { patterns } => resolve_whitelist(schema, patterns),
        Directive::Blacklist { patterns } => {
            let compiled = compile_exclusions(schema, patterns)?;
            let included = resolve_blacklist(schema, &compiled, introspector, timeout).await?;
            if included.is_empty() {
                return Err(CdcError::EmptyResolution {
                    directive: patterns.join(","),
                });
            }
            ResolvedTableSet::Tables(included)
        }
    };
    info_data!(
        "[mysql_cdc] database: {}, mode: {}, capture targets: {}",
        schema,
        directive.mode(),
        resolved.len()
    );
    Ok(resolved)
}

fn resolve_whitelist(schema: &str, patterns: &[String]) -> ResolvedTableSet {
    let tables = patterns
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            if t.contains('.') {
                t.to_string()
            } else {
                format!("{schema}.{t}")
            }
        })
        .collect::<Vec<_>>();
    if tables.is_empty() {
        return all_tables(schema);
    }
    ResolvedTableSet::Patterns(tables)
}

/// 用户规则之后追加保留表规则，匹配路径对两者一视同仁。
pub fn compile_exclusions(schema: &str, patterns: &[String]) -> CdcResult<Vec<ExclusionPattern>> {
    let mut compiled = pattern::compile_segments(schema, patterns.iter().map(String::as_str))?;
    compiled.push(ExclusionPattern::reserved()?);
    Ok(compiled)
}

async fn resolve_blacklist(
    schema: &str,
    exclusions: &[ExclusionPattern],
    introspector: &dyn CatalogIntrospector,
    timeout: Option<Duration>,
) -> CdcResult<Vec<QualifiedTableName>> {
    let tables = introspector.list_tables(schema, timeout).await?;
    let mut included = Vec::new();
    for table in tables {
        if let Some(catalog) = table.catalog.as_deref()
            && !catalog.eq_ignore_ascii_case(schema)
        {
            warn_data!(
                "[mysql_cdc] skip `{}.{}`: not in database `{}`",
                catalog,
                table.name,
                schema
            );
            continue;
        }
        if table.name.trim().is_empty() {
            continue;
        }
        if pattern::is_excluded(exclusions, &table.name) {
            continue;
        }
        included.push(QualifiedTableName::new(schema, table.name));
    }
    Ok(included)
}
