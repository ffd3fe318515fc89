//! 徽章相关实体定义
//!
//! 包含徽章定义（目录）、用户持有记录以及单次发放结果

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GamificationError;

/// 徽章类型
///
/// 仅用于展示和筛选，不参与资格判定
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum BadgeType {
    /// 成就徽章 - 累计行为达标
    #[default]
    Achievement,
    /// 里程碑徽章 - 关键节点
    Milestone,
    /// 品质徽章 - 评分相关
    Quality,
    /// 特殊徽章 - 运营发放
    Special,
}

impl BadgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Achievement => "achievement",
            Self::Milestone => "milestone",
            Self::Quality => "quality",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeType {
    type Err = GamificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "achievement" => Ok(Self::Achievement),
            "milestone" => Ok(Self::Milestone),
            "quality" => Ok(Self::Quality),
            "special" => Ok(Self::Special),
            other => Err(GamificationError::Validation(format!(
                "未知的徽章类型: {other}"
            ))),
        }
    }
}

/// 徽章定义
///
/// `requirements` 保存原始 JSON 条件，发放时由条件注册表解析
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: i64,
    /// 徽章名称
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 图标 URL
    #[sqlx(default)]
    pub icon_url: Option<String>,
    pub badge_type: BadgeType,
    /// 获取条件，形如 `{"total_sessions": 10, "average_rating": 4.5}`
    pub requirements: Value,
    /// 获得时奖励的时间币
    pub bonus_credits: i64,
    /// 稀有度分值，计入用户的稀有度总分
    pub rarity: i32,
    pub created_at: DateTime<Utc>,
}

impl Badge {
    /// 构建尚未持久化的徽章（id 为 0，由存储层分配）
    pub fn new(name: impl Into<String>, badge_type: BadgeType, requirements: Value) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: None,
            icon_url: None,
            badge_type,
            requirements,
            bonus_credits: 0,
            rarity: 1,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_bonus_credits(mut self, bonus_credits: i64) -> Self {
        self.bonus_credits = bonus_credits;
        self
    }

    pub fn with_rarity(mut self, rarity: i32) -> Self {
        self.rarity = rarity;
        self
    }
}

/// 用户持有的徽章
///
/// 每个 (user_id, badge_id) 至多一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserBadge {
    pub id: i64,
    pub user_id: String,
    pub badge_id: i64,
    /// 获得时间
    pub earned_at: DateTime<Utc>,
    /// 是否置顶展示
    pub is_pinned: bool,
}

/// 单次发放结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardedBadge {
    pub user_badge_id: i64,
    pub user_id: String,
    pub badge_id: i64,
    pub badge_name: String,
    pub badge_type: BadgeType,
    pub bonus_credits: i64,
    /// 奖励时间币是否已入账；入账失败不回滚发放，只在这里体现
    pub bonus_credited: bool,
    pub earned_at: DateTime<Utc>,
}

impl AwardedBadge {
    pub fn new(badge: &Badge, user_badge: &UserBadge, bonus_credited: bool) -> Self {
        Self {
            user_badge_id: user_badge.id,
            user_id: user_badge.user_id.clone(),
            badge_id: badge.id,
            badge_name: badge.name.clone(),
            badge_type: badge.badge_type,
            bonus_credits: badge.bonus_credits,
            bonus_credited,
            earned_at: user_badge.earned_at,
        }
    }
}
