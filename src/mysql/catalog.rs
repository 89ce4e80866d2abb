use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::time::Duration;
use wp_log::{error_data, info_data};

use super::error::{CdcError, CdcResult};

/// 元数据中的一行表信息；`catalog` 为驱动报告的所属库，可能缺失。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    pub catalog: Option<String>,
    pub name: String,
}

impl CatalogTable {
    pub fn new(catalog: Option<&str>, name: &str) -> Self {
        Self {
            catalog: catalog.map(str::to_string),
            name: name.to_string(),
        }
    }
}

/// 枚举指定库中可见的表。黑名单模式依赖它做实时解析。
#[async_trait]
pub trait CatalogIntrospector: Send + Sync {
    async fn list_tables(
        &self,
        schema: &str,
        timeout: Option<Duration>,
    ) -> CdcResult<Vec<CatalogTable>>;
}

const LIST_TABLES_SQL: &str = "SELECT TABLE_SCHEMA, TABLE_NAME \
                FROM INFORMATION_SCHEMA.TABLES \
                WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
                ORDER BY TABLE_NAME";

/// 通过 `INFORMATION_SCHEMA.TABLES` 枚举表；每次调用单独建连，用完即关闭。
/// `timeout` 为 `None` 时建连、取连接与查询都不设上限。
pub struct MysqlCatalog {
    database_url: String,
}

impl MysqlCatalog {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    fn connect_options(&self, timeout: Option<Duration>) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.database_url.clone());
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);
        if let Some(limit) = timeout {
            opt.connect_timeout(limit).acquire_timeout(limit);
        }
        opt
    }

    async fn query_tables(
        db: &DatabaseConnection,
        schema: &str,
    ) -> Result<Vec<CatalogTable>, sea_orm::DbErr> {
        let stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            LIST_TABLES_SQL,
            vec![schema.to_string().into()],
        );
        let rows = db.query_all(stmt).await?;
        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let catalog: Option<String> = row.try_get_by_index(0)?;
            let name: Option<String> = row.try_get_by_index(1)?;
            tables.push(CatalogTable {
                catalog,
                name: name.unwrap_or_default(),
            });
        }
        Ok(tables)
    }
}

#[async_trait]
impl CatalogIntrospector for MysqlCatalog {
    async fn list_tables(
        &self,
        schema: &str,
        timeout: Option<Duration>,
    ) -> CdcResult<Vec<CatalogTable>> {
        let db = Database::connect(self.connect_options(timeout))
            .await
            .map_err(|e| CdcError::catalog_access(schema, e))?;

        let queried = match timeout {
            Some(limit) => tokio::time::timeout(limit, Self::query_tables(&db, schema))
                .await
                .map_err(|e| CdcError::catalog_access(schema, e))
                .and_then(|res| res.map_err(|e| CdcError::catalog_access(schema, e))),
            None => Self::query_tables(&db, schema)
                .await
                .map_err(|e| CdcError::catalog_access(schema, e)),
        };

        // 无论查询成败都释放连接
        if let Err(e) = db.close().await {
            error_data!("[mysql_cdc] close catalog connection failed: {}", e);
        }

        let tables = queried?;
        info_data!("[mysql_cdc] catalog `{}` lists {} tables", schema, tables.len());
        Ok(tables)
    }
}
