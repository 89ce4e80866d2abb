use thiserror::Error;

pub type CdcResult<T> = Result<T, CdcError>;
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 捕获启动阶段的错误；任何一种都会中止作业启动，不做重试。
#[derive(Debug, Error)]
pub enum CdcError {
    #[error(
        "参数冲突：`table_list`（白名单）与 `exclude_tables`（黑名单）不可同时配置，请分开使用"
    )]
    ConfigurationConflict,

    #[error("invalid exclude_tables pattern `{segment}`: {source}")]
    PatternCompile {
        segment: String,
        #[source]
        source: regex::Error,
    },

    #[error(
        "黑名单模式下枚举 MySQL 表失败，请确认账号有读取元数据权限（information_schema/SHOW TABLES）：{schema}: {source}"
    )]
    CatalogAccess {
        schema: String,
        #[source]
        source: BoxError,
    },

    #[error("黑名单过滤后无可捕获表，请检查 `exclude_tables`：{directive}")]
    EmptyResolution { directive: String },

    #[error("{0}")]
    InvalidConfig(String),
}

impl CdcError {
    pub fn catalog_access(schema: &str, source: impl Into<BoxError>) -> Self {
        CdcError::CatalogAccess {
            schema: schema.to_string(),
            source: source.into(),
        }
    }
}
