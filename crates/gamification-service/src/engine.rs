//! 游戏化引擎门面
//!
//! 把各服务组装在同一套存储之上，对外提供统一的调用入口。
//! 请求处理层只需要持有一个 `GamificationEngine`

use std::sync::Arc;

use tracing::info;

use timebank_shared::config::AppConfig;
use timebank_shared::database::Database;

use crate::error::Result;
use crate::models::{AwardedBadge, Badge, LeaderboardEntry};
use crate::notification::{MemoryNotificationSink, NotificationSink};
use crate::repository::{
    BadgeRepository, MemoryStore, PgStore, ProgressRepository, UserBadgeRepository,
    UserStatsRepository,
};
use crate::requirement::RequirementRegistry;
use crate::service::dto::{ProgressDetail, ProgressSummary, UpdateProgressRequest, UserBadgeDto};
use crate::service::{AwardService, BadgeQueryService, LeaderboardService, ProgressService};

/// 实现全部存储端口的存储
pub trait GamificationStore:
    UserStatsRepository + BadgeRepository + UserBadgeRepository + ProgressRepository
{
}

impl<T> GamificationStore for T where
    T: UserStatsRepository + BadgeRepository + UserBadgeRepository + ProgressRepository
{
}

/// 游戏化引擎
pub struct GamificationEngine<S, N>
where
    S: GamificationStore,
    N: NotificationSink,
{
    awards: AwardService<S, S, S, N>,
    badges: BadgeQueryService<S, S>,
    progress: ProgressService<S, N>,
    leaderboards: LeaderboardService<S>,
}

/// PostgreSQL 存储 + 通知落库
pub type PgGamificationEngine = GamificationEngine<PgStore, PgStore>;

/// 内存存储 + 内存通知（测试和本地开发）
pub type MemoryGamificationEngine = GamificationEngine<MemoryStore, MemoryNotificationSink>;

impl<S, N> GamificationEngine<S, N>
where
    S: GamificationStore,
    N: NotificationSink,
{
    /// 使用默认条件判定器创建引擎
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self::with_registry(store, notifier, Arc::new(RequirementRegistry::with_defaults()))
    }

    /// 使用自定义条件判定器创建引擎
    pub fn with_registry(
        store: Arc<S>,
        notifier: Arc<N>,
        registry: Arc<RequirementRegistry>,
    ) -> Self {
        Self {
            awards: AwardService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                notifier.clone(),
                registry,
            ),
            badges: BadgeQueryService::new(store.clone(), store.clone()),
            progress: ProgressService::new(store.clone(), notifier),
            leaderboards: LeaderboardService::new(store),
        }
    }

    pub fn awards(&self) -> &AwardService<S, S, S, N> {
        &self.awards
    }

    pub fn badges(&self) -> &BadgeQueryService<S, S> {
        &self.badges
    }

    pub fn progress(&self) -> &ProgressService<S, N> {
        &self.progress
    }

    pub fn leaderboards(&self) -> &LeaderboardService<S> {
        &self.leaderboards
    }

    // ==================== 徽章 ====================

    pub async fn check_and_award_badges(&self, user_id: &str) -> Result<Vec<AwardedBadge>> {
        self.awards.check_and_award_badges(user_id).await
    }

    pub async fn list_badges(&self) -> Result<Vec<Badge>> {
        self.badges.list_badges().await
    }

    pub async fn get_badge(&self, badge_id: i64) -> Result<Badge> {
        self.badges.get_badge(badge_id).await
    }

    pub async fn get_user_badges(&self, user_id: &str) -> Result<Vec<UserBadgeDto>> {
        self.badges.get_user_badges(user_id).await
    }

    pub async fn get_user_badges_by_type(
        &self,
        user_id: &str,
        badge_type: &str,
    ) -> Result<Vec<UserBadgeDto>> {
        self.badges.get_user_badges_by_type(user_id, badge_type).await
    }

    pub async fn pin_badge(&self, user_id: &str, badge_id: i64, pinned: bool) -> Result<()> {
        self.badges.pin_badge(user_id, badge_id, pinned).await
    }

    // ==================== 学习进度 ====================

    pub async fn get_progress(&self, user_id: &str, skill_id: i64) -> Result<ProgressDetail> {
        self.progress.get_progress(user_id, skill_id).await
    }

    pub async fn update_progress(
        &self,
        user_id: &str,
        skill_id: i64,
        sessions_completed: i32,
        hours_spent: f64,
    ) -> Result<ProgressDetail> {
        self.progress
            .update_progress(
                user_id,
                skill_id,
                UpdateProgressRequest::new(sessions_completed, hours_spent),
            )
            .await
    }

    pub async fn get_user_progress_summary(&self, user_id: &str) -> Result<ProgressSummary> {
        self.progress.get_user_progress_summary(user_id).await
    }

    // ==================== 排行榜 ====================

    pub async fn get_leaderboard(&self, dimension: &str, limit: i64) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboards.get_leaderboard(dimension, limit).await
    }
}

impl GamificationEngine<PgStore, PgStore> {
    /// 按配置连接数据库并创建引擎
    ///
    /// `database.run_migrations` 为 true 时先执行内置迁移
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let database = Database::connect(&config.database).await?;
        let store = Arc::new(PgStore::new(database.into_pool()));

        if config.database.run_migrations {
            store.migrate().await?;
        }

        info!(
            service = %config.service_name,
            environment = %config.environment,
            "游戏化引擎初始化完成"
        );

        Ok(Self::new(store.clone(), store))
    }
}
