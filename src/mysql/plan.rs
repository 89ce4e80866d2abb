use wp_connector_api::Tags;

use super::catalog::CatalogIntrospector;
use super::config::MysqlCdcConf;
use super::error::CdcResult;
use super::naming::NamingPolicy;
use super::table_set::{self, ResolvedTableSet};

/// 交给外部 CDC source 构建方的全部信息：捕获目标、连接参数与 sink 命名。
#[derive(Clone)]
pub struct CapturePlan {
    pub name: String,
    pub database: String,
    pub database_url: String,
    pub server_time_zone: String,
    pub targets: ResolvedTableSet,
    pub sink_namespace: String,
    pub naming: NamingPolicy,
    pub tags: Tags,
}

impl CapturePlan {
    pub async fn prepare(
        name: &str,
        conf: &MysqlCdcConf,
        catalog: &dyn CatalogIntrospector,
    ) -> CdcResult<Self> {
        let conf = &conf.clone().normalized();
        conf.check()?;
        let directive = conf.directive()?;
        let targets =
            table_set::resolve(&conf.database, &directive, catalog, conf.catalog_timeout()).await?;
        Ok(Self {
            name: name.to_string(),
            database: conf.database.clone(),
            database_url: conf.get_database_url(),
            server_time_zone: conf.server_time_zone.clone(),
            targets,
            sink_namespace: conf.sink_namespace().to_string(),
            naming: conf.naming_policy(),
            tags: Tags::new(),
        })
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn capture_targets(&self) -> Vec<String> {
        self.targets.capture_targets()
    }

    pub fn sink_table_name(&self, source_table: &str) -> String {
        self.naming.sink_table_name(source_table)
    }

    pub fn job_name(&self) -> String {
        format!("CDC Sink From MySQL Database {}", self.database)
    }
}
