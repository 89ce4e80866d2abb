// MySQL CDC：默认启用（feature = "mysql" 是默认特性）
#[cfg(feature = "mysql")]
pub mod mysql;
