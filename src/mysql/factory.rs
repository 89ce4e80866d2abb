use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use wp_connector_api::{
    ConnectorDef, ConnectorScope, DataSource, ParamMap, SourceDefProvider, SourceFactory,
    SourceHandle, SourceMeta, SourceReason, SourceResult, SourceSvcIns, SourceSpec, Tags,
};
use wp_log::info_data;

use super::catalog::{CatalogIntrospector, MysqlCatalog};
use super::config::MysqlCdcConf;
use super::plan::CapturePlan;

/// 外部流处理框架的边界：拿到解析好的捕获计划后构建真正读取 binlog 的数据源。
#[async_trait]
pub trait CdcSourceBuilder: Send + Sync {
    async fn build_source(&self, plan: CapturePlan) -> anyhow::Result<Box<dyn DataSource>>;
}

pub struct MysqlCdcSourceFactory {
    builder: Arc<dyn CdcSourceBuilder>,
    catalog: Option<Arc<dyn CatalogIntrospector>>,
}

impl MysqlCdcSourceFactory {
    pub fn new(builder: Arc<dyn CdcSourceBuilder>) -> Self {
        Self {
            builder,
            catalog: None,
        }
    }

    /// 替换默认的 `MysqlCatalog`（按配置连接源库）。
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogIntrospector>) -> Self {
        self.catalog = Some(catalog);
        self
    }
}

#[async_trait]
impl SourceFactory for MysqlCdcSourceFactory {
    fn kind(&self) -> &'static str {
        "mysql_cdc"
    }

    fn validate_spec(&self, spec: &SourceSpec) -> SourceResult<()> {
        let conf = conf_from_spec(spec)?;
        conf.check()
            .map_err(|err| SourceReason::Other(err.to_string()))?;
        Ok(())
    }

    async fn build(
        &self,
        spec: &SourceSpec,
        _ctx: &wp_connector_api::SourceBuildCtx,
    ) -> SourceResult<SourceSvcIns> {
        let (source, meta_tags) = self.resolve_source(spec).await?;
        let mut meta = SourceMeta::new(spec.name.clone(), spec.kind.clone());
        meta.tags = meta_tags;
        let handle = SourceHandle::new(source, meta);
        Ok(SourceSvcIns::new().with_sources(vec![handle]))
    }
}

impl SourceDefProvider for MysqlCdcSourceFactory {
    fn source_def(&self) -> ConnectorDef {
        ConnectorDef {
            id: "mysql_cdc_src".into(),
            kind: self.kind().into(),
            scope: ConnectorScope::Source,
            allow_override: vec![
                "endpoint",
                "database",
                "username",
                "table_list",
                "exclude_tables",
                "sink_database",
                "sink_table_prefix",
                "server_time_zone",
                "catalog_timeout_secs",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            default_params: mysql_cdc_source_defaults(),
            origin: Some("wp-cdc-connectors:mysql_cdc_source".into()),
        }
    }
}

fn mysql_cdc_source_defaults() -> ParamMap {
    let mut params = ParamMap::new();
    params.insert("endpoint".into(), json!("mysql://localhost:3306"));
    params.insert("username".into(), json!("root"));
    params.insert("server_time_zone".into(), json!("Asia/Shanghai"));
    params.insert("catalog_timeout_secs".into(), json!(8));
    params
}

impl MysqlCdcSourceFactory {
    async fn resolve_source(&self, spec: &SourceSpec) -> SourceResult<(Box<dyn DataSource>, Tags)> {
        let conf = conf_from_spec(spec)?;
        info_data!(
            "[mysql_cdc] database: {}, sink namespace: {}",
            conf.database,
            conf.sink_namespace()
        );

        let plan = match &self.catalog {
            Some(catalog) => CapturePlan::prepare(&spec.name, &conf, catalog.as_ref()).await,
            None => {
                let catalog = MysqlCatalog::new(conf.get_database_url());
                CapturePlan::prepare(&spec.name, &conf, &catalog).await
            }
        }
        .map_err(|err| SourceReason::Other(err.to_string()))?;

        let mut meta_tags = Tags::new();
        for (key, value) in parse_spec_tags(&spec.tags) {
            meta_tags.set(key, value);
        }
        meta_tags.set("access_source".to_string(), "mysql_cdc".to_string());

        let source = self
            .builder
            .build_source(plan.with_tags(meta_tags.clone()))
            .await
            .map_err(|err| SourceReason::Other(err.to_string()))?;
        Ok((source, meta_tags))
    }
}

fn conf_from_spec(spec: &SourceSpec) -> SourceResult<MysqlCdcConf> {
    let mut conf = MysqlCdcConf::default();
    if let Some(s) = param_str(spec, "endpoint") {
        conf.endpoint = s.to_string();
    }
    conf.database = parse_required_string(spec.params.get("database"), "mysql_cdc.database")?;
    if let Some(s) = param_str(spec, "username") {
        conf.username = s.to_string();
    }
    if let Some(s) = param_str(spec, "password") {
        conf.password = s.to_string();
    }
    conf.table_list = parse_table_tokens(spec.params.get("table_list"), "mysql_cdc.table_list")?;
    conf.exclude_tables =
        parse_table_tokens(spec.params.get("exclude_tables"), "mysql_cdc.exclude_tables")?;
    conf.sink_database = param_str(spec, "sink_database").map(str::to_string);
    conf.sink_table_prefix = param_str(spec, "sink_table_prefix").map(str::to_string);
    if let Some(s) = param_str(spec, "server_time_zone") {
        conf.server_time_zone = s.to_string();
    }
    if let Some(v) = spec.params.get("catalog_timeout_secs") {
        conf.catalog_timeout_secs = v.as_u64().ok_or_else(|| {
            SourceReason::Other("mysql_cdc.catalog_timeout_secs must be a non-negative integer".into())
        })?;
    }
    conf.tags = spec.tags.clone();
    Ok(conf)
}

fn param_str<'a>(spec: &'a SourceSpec, key: &str) -> Option<&'a str> {
    spec.params.get(key).and_then(|v| v.as_str())
}

fn parse_required_string(value: Option<&Value>, field: &str) -> SourceResult<String> {
    if let Some(Value::String(raw)) = value {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
    Err(SourceReason::Other(format!("{field} must not be empty")).into())
}

/// 表清单既可写成逗号分隔字符串，也可写成字符串数组；统一折叠为逗号分隔形式。
fn parse_table_tokens(value: Option<&Value>, field: &str) -> SourceResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Ok(Some(raw.clone())),
        Some(Value::Array(values)) => {
            let mut tokens = Vec::with_capacity(values.len());
            for value in values {
                let Some(raw) = value.as_str() else {
                    return Err(SourceReason::Other(format!("{field} entries must be strings")).into());
                };
                tokens.push(raw);
            }
            Ok(Some(tokens.join(",")))
        }
        Some(_) => Err(SourceReason::Other(format!("{field} must be a string or array")).into()),
    }
}

fn parse_spec_tags(raw_tags: &[String]) -> Vec<(String, String)> {
    let mut tags = Vec::with_capacity(raw_tags.len());
    for raw in raw_tags {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (key, value) = if let Some((k, v)) = trimmed.split_once('=') {
            (k.trim(), v.trim())
        } else {
            (trimmed, "")
        };
        if key.is_empty() {
            continue;
        }
        tags.push((key.to_string(), value.to_string()));
    }
    tags
}
