//! 存储端口定义
//!
//! 服务层只依赖这些 trait，便于替换存储实现和 mock 测试。
//! "不存在则插入"类操作必须由存储层原子完成，服务层不做先查后写

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Badge, Milestone, SkillProgress, StatSnapshot, UserBadge};

/// 条件插入的结果
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome<T> {
    /// 本次调用是否真正插入了新记录
    pub created: bool,
    /// 新插入的记录，或已存在的记录
    pub record: T,
}

impl<T> InsertOutcome<T> {
    pub fn created(record: T) -> Self {
        Self {
            created: true,
            record,
        }
    }

    pub fn existing(record: T) -> Self {
        Self {
            created: false,
            record,
        }
    }
}

/// 用户统计仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStatsRepository: Send + Sync {
    /// 用户不存在时返回 `UserNotFound`
    async fn get_user_stats(&self, user_id: &str) -> Result<StatSnapshot>;
    /// 全量快照，顺序稳定（按用户注册顺序）
    async fn list_all_user_stats(&self) -> Result<Vec<StatSnapshot>>;
    /// 给用户余额增加时间币
    async fn credit_balance(&self, user_id: &str, amount: i64) -> Result<()>;
}

/// 徽章目录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    async fn list_badges(&self) -> Result<Vec<Badge>>;
    async fn get_badge(&self, badge_id: i64) -> Result<Option<Badge>>;
}

/// 用户徽章仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserBadgeRepository: Send + Sync {
    async fn has_award(&self, user_id: &str, badge_id: i64) -> Result<bool>;
    /// 原子插入；(user_id, badge_id) 已存在时不写入并返回已有记录
    async fn insert_award_if_absent(
        &self,
        user_id: &str,
        badge_id: i64,
        earned_at: DateTime<Utc>,
    ) -> Result<InsertOutcome<UserBadge>>;
    async fn list_user_badges(&self, user_id: &str) -> Result<Vec<UserBadge>>;
    /// 返回 false 表示用户未持有该徽章
    async fn set_pinned(&self, user_id: &str, badge_id: i64, pinned: bool) -> Result<bool>;
}

/// 学习进度仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn skill_exists(&self, skill_id: i64) -> Result<bool>;
    async fn load_progress(&self, user_id: &str, skill_id: i64) -> Result<Option<SkillProgress>>;
    /// 原子创建进度记录及其里程碑；(user_id, skill_id) 已存在时不写入并返回已有记录
    ///
    /// 两者要么一起落库要么都不落库，`milestones` 的 `skill_progress_id` 由存储回填
    async fn insert_progress_if_absent(
        &self,
        progress: &SkillProgress,
        milestones: &[Milestone],
    ) -> Result<InsertOutcome<SkillProgress>>;
    async fn save_progress(&self, progress: &SkillProgress) -> Result<()>;
    async fn list_user_progress(&self, user_id: &str) -> Result<Vec<SkillProgress>>;
    /// 按阈值升序返回
    async fn load_milestones(&self, skill_progress_id: i64) -> Result<Vec<Milestone>>;
    /// 只执行"未达成 -> 已达成"迁移，返回本次调用是否完成了迁移
    async fn save_milestone(&self, milestone: &Milestone) -> Result<bool>;
}
