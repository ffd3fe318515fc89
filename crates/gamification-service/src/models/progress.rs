//! 技能学习进度与里程碑

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 技能等级
///
/// 按累计学习时长划分的四个有序等级
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum SkillLevel {
    /// 入门 - 不足 5 小时
    #[default]
    Beginner,
    /// 进阶 - 5 至 20 小时
    Intermediate,
    /// 熟练 - 20 至 50 小时
    Advanced,
    /// 专家 - 50 小时及以上
    Expert,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用户在某项技能上的学习进度
///
/// 每个 (user_id, skill_id) 至多一条记录；所有派生字段都由最近一次
/// 提交的会话数和时长重新计算，不做累加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SkillProgress {
    pub id: i64,
    pub user_id: String,
    pub skill_id: i64,
    pub sessions_completed: i32,
    pub total_hours_spent: f64,
    /// 0-100，保留两位小数
    pub progress_percentage: f64,
    pub current_level: SkillLevel,
    pub last_activity_at: DateTime<Utc>,
    /// 预计完成时间（按每周 10% 的线性外推，仅作参考）
    pub estimated_completion_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 进度里程碑
///
/// 一旦达成，`is_achieved` 不会再被重置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: i64,
    pub skill_progress_id: i64,
    pub title: String,
    pub description: String,
    /// 达成所需的进度百分比
    pub progress_threshold: f64,
    pub is_achieved: bool,
    #[sqlx(default)]
    pub achieved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 默认里程碑：(阈值, 标题, 描述)
pub const DEFAULT_MILESTONES: [(f64, &str, &str); 5] = [
    (10.0, "初次上手", "完成第一次学习"),
    (25.0, "入门", "进度达到 25%"),
    (50.0, "进阶", "进度达到 50%"),
    (75.0, "熟练", "进度达到 75%"),
    (100.0, "精通", "进度达到 100%"),
];

impl Milestone {
    /// 构建尚未持久化的里程碑（id 为 0，由存储层分配）
    pub fn pending(
        skill_progress_id: i64,
        threshold: f64,
        title: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            skill_progress_id,
            title: title.to_string(),
            description: description.to_string(),
            progress_threshold: threshold,
            is_achieved: false,
            achieved_at: None,
            created_at: now,
        }
    }

    /// 为新建的学习进度生成五个默认里程碑
    pub fn defaults_for(skill_progress_id: i64, now: DateTime<Utc>) -> Vec<Self> {
        DEFAULT_MILESTONES
            .iter()
            .map(|(threshold, title, description)| {
                Self::pending(skill_progress_id, *threshold, title, description, now)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(SkillLevel::Beginner < SkillLevel::Intermediate);
        assert!(SkillLevel::Advanced < SkillLevel::Expert);
        assert_eq!(SkillLevel::Advanced.to_string(), "advanced");
    }

    #[test]
    fn test_default_milestones() {
        let now = Utc::now();
        let milestones = Milestone::defaults_for(42, now);

        assert_eq!(milestones.len(), 5);
        let thresholds: Vec<f64> = milestones.iter().map(|m| m.progress_threshold).collect();
        assert_eq!(thresholds, vec![10.0, 25.0, 50.0, 75.0, 100.0]);
        assert!(milestones.iter().all(|m| m.skill_progress_id == 42));
        assert!(milestones.iter().all(|m| !m.is_achieved && m.achieved_at.is_none()));
    }
}
