//! wp-cdc-connectors: MySQL CDC 捕获启动
//!
//! 模块划分：
//! - config：作业配置与启动前校验
//! - pattern：黑名单解析与整串匹配
//! - catalog：元数据枚举（INFORMATION_SCHEMA）
//! - table_set：不过滤 / 白名单 / 黑名单三种捕获目标解析
//! - naming：sink 表命名
//! - plan / factory：捕获计划与 Source 工厂

pub mod catalog;
pub mod config;
pub mod error;
mod factory;
pub mod naming;
pub mod pattern;
mod plan;
pub mod table_set;

pub use catalog::{CatalogIntrospector, CatalogTable, MysqlCatalog};
pub use config::MysqlCdcConf;
pub use error::{CdcError, CdcResult};
pub use factory::{CdcSourceBuilder, MysqlCdcSourceFactory};
pub use naming::{NamingPolicy, build_sink_table_name};
pub use plan::CapturePlan;
pub use table_set::{Directive, QualifiedTableName, ResolvedTableSet, resolve};
