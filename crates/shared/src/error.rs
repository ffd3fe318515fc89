//! 基础设施错误类型
//!
//! 仅覆盖启动阶段的配置、数据库连接与可观测性初始化错误，
//! 业务错误由各服务自行定义。

use thiserror::Error;

/// 基础设施错误
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("可观测性初始化失败: {0}")]
    Observability(String),
}

/// 基础设施 Result 类型别名
pub type Result<T> = std::result::Result<T, InfraError>;

impl InfraError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Observability(_) => "OBSERVABILITY_ERROR",
        }
    }

    /// 是否为可重试错误
    ///
    /// 数据库连接在容器编排场景下经常晚于服务就绪，允许调用方重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}
