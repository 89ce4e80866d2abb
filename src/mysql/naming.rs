/// 未配置或为空白时使用的 sink 表名前缀。
pub const DEFAULT_SINK_PREFIX: &str = "s";

/// `prefix` 去空白后为空则取 `s`；去掉一个结尾 `_` 后拼接 `_` 与源表名，整体小写。
pub fn build_sink_table_name(prefix: Option<&str>, source_table: &str) -> String {
    let prefix = match prefix.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => DEFAULT_SINK_PREFIX,
    };
    let prefix = prefix.strip_suffix('_').unwrap_or(prefix);
    format!("{prefix}_{source_table}").to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingPolicy {
    pub prefix: Option<String>,
}

impl NamingPolicy {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    pub fn sink_table_name(&self, source_table: &str) -> String {
        build_sink_table_name(self.prefix.as_deref(), source_table)
    }
}
