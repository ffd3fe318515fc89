//! 排行榜维度与条目

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::StatSnapshot;
use crate::error::GamificationError;

/// 排行榜维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardDimension {
    /// 徽章数量
    Badges,
    /// 徽章稀有度总分
    Rarity,
    /// 教学与学习会话总数
    Sessions,
    /// 综合评分
    Rating,
    /// 累计赚取的时间币
    Credits,
}

impl LeaderboardDimension {
    pub const ALL: [Self; 5] = [
        Self::Badges,
        Self::Rarity,
        Self::Sessions,
        Self::Rating,
        Self::Credits,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Badges => "badges",
            Self::Rarity => "rarity",
            Self::Sessions => "sessions",
            Self::Rating => "rating",
            Self::Credits => "credits",
        }
    }

    /// 从快照中取出该维度的分值
    pub fn score(&self, snapshot: &StatSnapshot) -> f64 {
        match self {
            Self::Badges => snapshot.badge_count as f64,
            Self::Rarity => snapshot.badge_rarity as f64,
            Self::Sessions => snapshot.total_sessions() as f64,
            Self::Rating => snapshot.average_rating(),
            Self::Credits => snapshot.credits_earned,
        }
    }
}

impl fmt::Display for LeaderboardDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardDimension {
    type Err = GamificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "badges" => Ok(Self::Badges),
            "rarity" => Ok(Self::Rarity),
            "sessions" => Ok(Self::Sessions),
            "rating" => Ok(Self::Rating),
            "credits" => Ok(Self::Credits),
            _ => Err(GamificationError::InvalidDimension(s.to_string())),
        }
    }
}

/// 排行榜条目
///
/// 每次查询时实时计算，不持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 名次，从 1 开始
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub score: f64,
    pub dimension: LeaderboardDimension,
}
