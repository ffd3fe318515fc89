//! 游戏化服务错误类型
//!
//! 定义服务层的业务错误和系统错误，并映射到统一的错误分类

use thiserror::Error;

use crate::requirement::RequirementError;

/// 错误分类
///
/// 调用方（如请求处理层）据此决定响应方式：
/// - `NotFound`: 引用的用户/技能/徽章/进度不存在，不重试
/// - `Validation`: 输入越界或数据格式异常，直接拒绝
/// - `Internal`: 存储层故障，不透明地返回给调用方，由调用方决定是否重试
///
/// 重复发放不属于错误，由仓储层的幂等写入吸收为无操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Internal,
}

/// 游戏化服务错误类型
#[derive(Debug, Error)]
pub enum GamificationError {
    // === 资源不存在 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("徽章不存在: {0}")]
    BadgeNotFound(i64),

    #[error("技能不存在: {0}")]
    SkillNotFound(i64),

    #[error("学习进度不存在: user_id={user_id}, skill_id={skill_id}")]
    ProgressNotFound { user_id: String, skill_id: i64 },

    #[error("用户未持有该徽章: user_id={user_id}, badge_id={badge_id}")]
    UserBadgeNotFound { user_id: String, badge_id: i64 },

    // === 校验错误 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("不支持的排行榜维度: {0}")]
    InvalidDimension(String),

    #[error("徽章条件配置异常: badge_id={badge_id}, {source}")]
    MalformedRequirement {
        badge_id: i64,
        source: RequirementError,
    },

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 游戏化服务 Result 类型别名
pub type Result<T> = std::result::Result<T, GamificationError>;

impl From<validator::ValidationErrors> for GamificationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl GamificationError {
    /// 获取错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_)
            | Self::BadgeNotFound(_)
            | Self::SkillNotFound(_)
            | Self::ProgressNotFound { .. }
            | Self::UserBadgeNotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) | Self::InvalidDimension(_) | Self::MalformedRequirement { .. } => {
                ErrorKind::Validation
            }
            Self::Database(_) | Self::Serialization(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// 检查是否为可重试的错误
    ///
    /// 核心逻辑本身从不重试，此标记供调用方的重试策略使用
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::BadgeNotFound(_) => "BADGE_NOT_FOUND",
            Self::SkillNotFound(_) => "SKILL_NOT_FOUND",
            Self::ProgressNotFound { .. } => "PROGRESS_NOT_FOUND",
            Self::UserBadgeNotFound { .. } => "USER_BADGE_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidDimension(_) => "INVALID_DIMENSION",
            Self::MalformedRequirement { .. } => "MALFORMED_REQUIREMENT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
