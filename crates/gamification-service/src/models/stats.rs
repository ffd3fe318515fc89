//! 用户统计快照
//!
//! 徽章判定和排行榜计算只读取此快照，不直接访问原始会话数据

use serde::{Deserialize, Serialize};

use crate::error::{GamificationError, Result};

/// 有效评分区间；0 表示尚无评分
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// 某一时刻的用户统计
///
/// 由外部系统维护的累计数据，本服务只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatSnapshot {
    pub user_id: String,
    /// 展示名
    pub username: String,
    /// 作为教学方完成的会话数
    pub sessions_as_teacher: i64,
    /// 作为学习方完成的会话数
    pub sessions_as_student: i64,
    pub average_rating_as_teacher: f64,
    pub average_rating_as_student: f64,
    /// 累计赚取的时间币
    pub credits_earned: f64,
    /// 累计花费的时间币
    pub credits_spent: f64,
    /// 已获得徽章数
    pub badge_count: i64,
    /// 已获得徽章的稀有度总分
    pub badge_rarity: i64,
}

impl StatSnapshot {
    /// 创建全零快照
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            sessions_as_teacher: 0,
            sessions_as_student: 0,
            average_rating_as_teacher: 0.0,
            average_rating_as_student: 0.0,
            credits_earned: 0.0,
            credits_spent: 0.0,
            badge_count: 0,
            badge_rarity: 0,
        }
    }

    pub fn with_sessions(mut self, as_teacher: i64, as_student: i64) -> Self {
        self.sessions_as_teacher = as_teacher;
        self.sessions_as_student = as_student;
        self
    }

    pub fn with_ratings(mut self, as_teacher: f64, as_student: f64) -> Self {
        self.average_rating_as_teacher = as_teacher;
        self.average_rating_as_student = as_student;
        self
    }

    pub fn with_credits(mut self, earned: f64, spent: f64) -> Self {
        self.credits_earned = earned;
        self.credits_spent = spent;
        self
    }

    pub fn with_badges(mut self, count: i64, rarity: i64) -> Self {
        self.badge_count = count;
        self.badge_rarity = rarity;
        self
    }

    /// 教学与学习会话总数
    pub fn total_sessions(&self) -> i64 {
        self.sessions_as_teacher + self.sessions_as_student
    }

    /// 综合评分：教学评分与学习评分的算术平均
    pub fn average_rating(&self) -> f64 {
        (self.average_rating_as_teacher + self.average_rating_as_student) / 2.0
    }

    /// 校验快照数据
    ///
    /// 计数不能为负，评分必须为 0（无评分）或落在 1-5 之间
    pub fn validate(&self) -> Result<()> {
        if self.sessions_as_teacher < 0 || self.sessions_as_student < 0 {
            return Err(GamificationError::Validation(format!(
                "用户 {} 的会话数为负数",
                self.user_id
            )));
        }

        for (field, rating) in [
            ("average_rating_as_teacher", self.average_rating_as_teacher),
            ("average_rating_as_student", self.average_rating_as_student),
        ] {
            if !is_valid_rating(rating) {
                return Err(GamificationError::Validation(format!(
                    "用户 {} 的 {field} 超出范围: {rating}",
                    self.user_id
                )));
            }
        }

        if !self.credits_earned.is_finite() || !self.credits_spent.is_finite() {
            return Err(GamificationError::Validation(format!(
                "用户 {} 的时间币统计无效",
                self.user_id
            )));
        }

        Ok(())
    }
}

fn is_valid_rating(rating: f64) -> bool {
    rating == 0.0 || (MIN_RATING..=MAX_RATING).contains(&rating)
}
