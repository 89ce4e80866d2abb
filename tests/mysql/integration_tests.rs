#![cfg(feature = "mysql")]
//! Capture-plan tests through the public API. The in-memory catalog tests need no database;
//! the live catalog test expects a local MySQL and is ignored by default.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, Statement};
use std::time::Duration;
use wp_cdc_connectors::mysql::{
    CapturePlan, CatalogIntrospector, CatalogTable, CdcError, CdcResult, Directive, MysqlCatalog,
    MysqlCdcConf, ResolvedTableSet, build_sink_table_name, resolve,
};

const TEST_MYSQL_ENDPOINT: &str = "mysql://localhost:3306";
const TEST_MYSQL_DB: &str = "wp_cdc_test";
const TEST_MYSQL_USER: &str = "root";
const TEST_MYSQL_PASSWORD: &str = "";
const SKIP_ENV: &str = "SKIP_MYSQL_INTEGRATION_TESTS";

struct MemoryCatalog {
    schema: &'static str,
    tables: Vec<&'static str>,
}

#[async_trait]
impl CatalogIntrospector for MemoryCatalog {
    async fn list_tables(
        &self,
        schema: &str,
        _timeout: Option<Duration>,
    ) -> CdcResult<Vec<CatalogTable>> {
        if !schema.eq_ignore_ascii_case(self.schema) {
            return Err(CdcError::catalog_access(schema, "unknown database"));
        }
        Ok(self
            .tables
            .iter()
            .map(|t| CatalogTable::new(Some(self.schema), t))
            .collect())
    }
}

fn shop_catalog() -> MemoryCatalog {
    MemoryCatalog {
        schema: "shop",
        tables: vec!["orders", "tmp_cache", "sys_config"],
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test]
async fn blacklist_end_to_end_from_toml() -> anyhow::Result<()> {
    init_logger();
    let conf = MysqlCdcConf::from_toml_str(
        r#"
        database = "shop"
        exclude_tables = "tmp_.*, other_db.ignored"
        sink_table_prefix = "  ods_  "
        "#,
    )?;
    let plan = CapturePlan::prepare("shop_cdc", &conf, &shop_catalog()).await?;
    assert_eq!(plan.capture_targets(), vec!["shop.orders".to_string()]);
    assert_eq!(plan.sink_table_name("orders"), "ods_orders");
    assert_eq!(plan.sink_namespace, "shop");
    Ok(())
}

#[tokio::test]
async fn whitelist_is_not_checked_against_catalog() -> anyhow::Result<()> {
    init_logger();
    let directive = Directive::from_raw(Some("orders, payments.refunds, ,ghost"), None)?;
    let resolved = resolve("shop", &directive, &shop_catalog(), None).await?;
    assert_eq!(
        resolved,
        ResolvedTableSet::Patterns(vec![
            "shop.orders".into(),
            "payments.refunds".into(),
            "shop.ghost".into()
        ])
    );
    Ok(())
}

#[tokio::test]
async fn any_schema_scope_applies_to_target() -> anyhow::Result<()> {
    let directive = Directive::from_raw(None, Some("*.tmp_.*"))?;
    let resolved = resolve("shop", &directive, &shop_catalog(), None).await?;
    assert_eq!(resolved.capture_targets(), vec!["shop.orders".to_string()]);

    let directive = Directive::from_raw(None, Some(".*.(orders|tmp_.*)"))?;
    let err = resolve("shop", &directive, &shop_catalog(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CdcError::EmptyResolution { .. }));
    Ok(())
}

#[tokio::test]
async fn catalog_error_aborts_resolution() {
    let directive = Directive::from_raw(None, Some("tmp_.*")).unwrap();
    let err = resolve("billing", &directive, &shop_catalog(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CdcError::CatalogAccess { .. }));
}

#[test]
fn sink_names_are_normalized() {
    assert_eq!(build_sink_table_name(None, "user"), "s_user");
    assert_eq!(build_sink_table_name(Some("ODS"), "User"), "ods_user");
}

#[ignore = "requires a running MySQL"]
#[tokio::test]
async fn mysql_catalog_lists_base_tables() -> anyhow::Result<()> {
    if should_skip_integration() {
        eprintln!("⚠️  Skipping MySQL integration test ({} set)", SKIP_ENV);
        return Ok(());
    }
    init_logger();

    let host = TEST_MYSQL_ENDPOINT.trim_start_matches("mysql://");
    let admin = Database::connect(format!("mysql://{TEST_MYSQL_USER}@{host}/")).await?;
    let backend = admin.get_database_backend();
    for sql in [
        format!("CREATE DATABASE IF NOT EXISTS `{TEST_MYSQL_DB}`"),
        format!("CREATE TABLE IF NOT EXISTS `{TEST_MYSQL_DB}`.`orders` (id BIGINT PRIMARY KEY)"),
        format!("CREATE TABLE IF NOT EXISTS `{TEST_MYSQL_DB}`.`tmp_cache` (id BIGINT PRIMARY KEY)"),
        format!("CREATE OR REPLACE VIEW `{TEST_MYSQL_DB}`.`v_orders` AS SELECT id FROM `{TEST_MYSQL_DB}`.`orders`"),
    ] {
        admin.execute(Statement::from_string(backend, sql)).await?;
    }
    admin.close().await?;

    let conf = MysqlCdcConf {
        endpoint: TEST_MYSQL_ENDPOINT.into(),
        database: TEST_MYSQL_DB.into(),
        username: TEST_MYSQL_USER.into(),
        password: TEST_MYSQL_PASSWORD.into(),
        exclude_tables: Some("tmp_.*".into()),
        ..MysqlCdcConf::default()
    };
    let catalog = MysqlCatalog::new(conf.get_database_url());
    let tables = catalog
        .list_tables(TEST_MYSQL_DB, Some(Duration::from_secs(5)))
        .await?;
    let names = tables.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    assert!(names.contains(&"orders"));
    assert!(!names.contains(&"v_orders"));

    let plan = CapturePlan::prepare("it", &conf, &catalog).await?;
    assert!(plan.capture_targets().contains(&format!("{TEST_MYSQL_DB}.orders")));
    assert!(!plan.capture_targets().contains(&format!("{TEST_MYSQL_DB}.tmp_cache")));
    Ok(())
}

fn should_skip_integration() -> bool {
    std::env::var(SKIP_ENV)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
