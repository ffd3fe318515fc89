//! 时间银行共享基础设施
//!
//! 游戏化服务使用的分层配置、PostgreSQL 连接池、基础设施错误以及日志与指标初始化。

pub mod config;
pub mod database;
pub mod error;
pub mod observability;

pub use config::{AppConfig, DatabaseConfig};
pub use database::Database;
pub use error::InfraError;
