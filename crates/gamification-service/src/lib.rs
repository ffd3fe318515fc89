//! 时间银行游戏化服务
//!
//! 技能交换平台的激励核心：徽章、学习进度、里程碑和排行榜。
//!
//! ## 核心功能
//!
//! - **条件评估**：徽章获取条件由可扩展的判定器注册表解析和校验
//! - **徽章发放**：检查用户满足条件的徽章，同一徽章每个用户至多发放一次
//! - **学习进度**：根据会话数和时长计算进度百分比、等级和预计完成时间
//! - **里程碑**：进度跨过 10/25/50/75/100 时一次性达成并通知
//! - **排行榜**：按徽章数、稀有度、会话数、评分、时间币实时排名
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `requirement`: 徽章条件判定器与注册表
//! - `progress`: 进度计算与里程碑状态机
//! - `leaderboard`: 排名算法
//! - `repository`: 存储端口及 PostgreSQL / 内存实现
//! - `notification`: 通知类型与投递
//! - `service`: 业务服务层
//! - `engine`: 对外门面

pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod models;
pub mod notification;
pub mod progress;
pub mod repository;
pub mod requirement;
pub mod service;

pub use engine::{GamificationEngine, GamificationStore, MemoryGamificationEngine, PgGamificationEngine};
pub use error::{ErrorKind, GamificationError, Result};
pub use leaderboard::{LeaderboardRanker, normalize_limit};
pub use models::*;
pub use notification::{
    MemoryNotificationSink, Notification, NotificationBuilder, NotificationKind, NotificationSink,
    TracingNotificationSink,
};
pub use repository::{InsertOutcome, MemoryStore, PgStore};
pub use requirement::{RequirementError, RequirementPredicate, RequirementRegistry, RequirementSet};
pub use service::{AwardService, BadgeQueryService, LeaderboardService, ProgressService, dto};
