//! PostgreSQL 存储实现
//!
//! 一个 `PgStore` 实现全部存储端口，按端口拆分到子模块

mod badge;
mod notification;
mod progress;
mod stats;

use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

/// PostgreSQL 存储
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 执行内置的数据库迁移
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        info!("数据库迁移完成");
        Ok(())
    }
}
