//! 服务层数据传输对象

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Badge, BadgeType, Milestone, SkillProgress, UserBadge};
use crate::progress::MilestoneEngine;

/// 学习进度更新请求
///
/// 提交的是累计值而非增量，服务端据此重新计算全部派生字段
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    #[validate(range(min = 0, message = "会话数不能为负数"))]
    pub sessions_completed: i32,
    /// 非有限值由服务层另行拒绝
    #[validate(range(min = 0.0, message = "学习时长不能为负数"))]
    pub hours_spent: f64,
}

impl UpdateProgressRequest {
    pub fn new(sessions_completed: i32, hours_spent: f64) -> Self {
        Self {
            sessions_completed,
            hours_spent,
        }
    }
}

/// 用户徽章（附带徽章定义信息）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBadgeDto {
    pub id: i64,
    pub badge_id: i64,
    pub badge_name: String,
    pub badge_type: BadgeType,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub rarity: i32,
    pub earned_at: DateTime<Utc>,
    pub is_pinned: bool,
}

impl UserBadgeDto {
    pub fn from_parts(user_badge: &UserBadge, badge: &Badge) -> Self {
        Self {
            id: user_badge.id,
            badge_id: badge.id,
            badge_name: badge.name.clone(),
            badge_type: badge.badge_type,
            description: badge.description.clone(),
            icon_url: badge.icon_url.clone(),
            rarity: badge.rarity,
            earned_at: user_badge.earned_at,
            is_pinned: user_badge.is_pinned,
        }
    }
}

/// 学习进度详情（含里程碑）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDetail {
    #[serde(flatten)]
    pub progress: SkillProgress,
    /// 按阈值升序
    pub milestones: Vec<Milestone>,
}

impl ProgressDetail {
    pub fn achieved_count(&self) -> usize {
        self.milestones.iter().filter(|m| m.is_achieved).count()
    }

    /// 阈值最低的未达成里程碑，全部达成时为 None
    pub fn next_milestone(&self) -> Option<&Milestone> {
        MilestoneEngine::next_pending(&self.milestones)
    }
}

/// 用户学习进度汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_skills_learning: usize,
    /// 平均进度，保留两位小数
    pub average_progress: f64,
    pub total_hours_spent: f64,
    pub skill_progresses: Vec<ProgressDetail>,
}
