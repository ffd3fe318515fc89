//! PostgreSQL 连接池
//!
//! 游戏化存储适配器只需要一个就绪的 `PgPool`，这里负责按配置建池并在启动时探活。

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument, warn};

use crate::config::DatabaseConfig;
use crate::error::Result;

/// 探活耗时超过该值时告警
const SLOW_PING_THRESHOLD: Duration = Duration::from_millis(500);

/// 数据库连接池
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 按配置建立连接池，建池后立即探活一次
    #[instrument(skip(config), fields(database = %redact_url(&config.url)))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        let database = Self { pool };
        let latency = database.health_check().await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            latency_ms = latency.as_millis() as u64,
            "数据库连接池就绪"
        );
        Ok(database)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 交出连接池所有权，供存储适配器持有
    pub fn into_pool(self) -> PgPool {
        self.pool
    }

    /// 执行一次 `SELECT 1`，返回往返耗时
    pub async fn health_check(&self) -> Result<Duration> {
        let started = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        let latency = started.elapsed();

        if latency > SLOW_PING_THRESHOLD {
            warn!(latency_ms = latency.as_millis() as u64, "数据库探活响应缓慢");
        }
        Ok(latency)
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("数据库连接池已关闭");
    }
}

/// 去掉连接串中的口令，便于写入日志
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}")
        }
        None => url.to_string(),
    }
}
