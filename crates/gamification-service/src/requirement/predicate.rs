//! 条件判定器
//!
//! 每种条件类型对应一个判定器，负责从快照中取出派生值并校验阈值

use crate::models::{MAX_RATING, MIN_RATING, StatSnapshot};

/// 条件判定器 Trait
///
/// 实现必须是纯函数：不做 I/O，相同输入总是得到相同结果
pub trait RequirementPredicate: Send + Sync {
    /// 条件类型名，即 JSON 中的键
    fn kind(&self) -> &'static str;

    /// 兼容的旧键名
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// 判定器描述（用于日志）
    fn description(&self) -> &'static str;

    /// 从快照中取出该条件对应的派生值
    fn measure(&self, snapshot: &StatSnapshot) -> f64;

    /// 校验阈值
    ///
    /// 默认要求阈值为有限的非负数
    fn validate_threshold(&self, threshold: f64) -> Result<(), String> {
        if !threshold.is_finite() {
            return Err("阈值必须是有限数值".to_string());
        }
        if threshold < 0.0 {
            return Err(format!("阈值不能为负数: {threshold}"));
        }
        Ok(())
    }

    fn is_satisfied(&self, snapshot: &StatSnapshot, threshold: f64) -> bool {
        self.measure(snapshot) >= threshold
    }
}

/// 会话总数（教学 + 学习）
#[derive(Debug, Default, Clone, Copy)]
pub struct TotalSessions;

impl RequirementPredicate for TotalSessions {
    fn kind(&self) -> &'static str {
        "total_sessions"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sessions"]
    }

    fn description(&self) -> &'static str {
        "会话总数"
    }

    fn measure(&self, snapshot: &StatSnapshot) -> f64 {
        snapshot.total_sessions() as f64
    }
}

/// 教学会话数
#[derive(Debug, Default, Clone, Copy)]
pub struct TeachingSessions;

impl RequirementPredicate for TeachingSessions {
    fn kind(&self) -> &'static str {
        "teaching_sessions"
    }

    fn description(&self) -> &'static str {
        "教学会话数"
    }

    fn measure(&self, snapshot: &StatSnapshot) -> f64 {
        snapshot.sessions_as_teacher as f64
    }
}

/// 学习会话数
#[derive(Debug, Default, Clone, Copy)]
pub struct LearningSessions;

impl RequirementPredicate for LearningSessions {
    fn kind(&self) -> &'static str {
        "learning_sessions"
    }

    fn description(&self) -> &'static str {
        "学习会话数"
    }

    fn measure(&self, snapshot: &StatSnapshot) -> f64 {
        snapshot.sessions_as_student as f64
    }
}

/// 综合评分（两种角色评分的平均值）
#[derive(Debug, Default, Clone, Copy)]
pub struct AverageRating;

impl RequirementPredicate for AverageRating {
    fn kind(&self) -> &'static str {
        "average_rating"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["rating"]
    }

    fn description(&self) -> &'static str {
        "综合评分"
    }

    fn measure(&self, snapshot: &StatSnapshot) -> f64 {
        snapshot.average_rating()
    }

    fn validate_threshold(&self, threshold: f64) -> Result<(), String> {
        if !(MIN_RATING..=MAX_RATING).contains(&threshold) {
            return Err(format!(
                "评分阈值必须在 {MIN_RATING}-{MAX_RATING} 之间: {threshold}"
            ));
        }
        Ok(())
    }
}

/// 累计赚取的时间币
#[derive(Debug, Default, Clone, Copy)]
pub struct CreditsEarned;

impl RequirementPredicate for CreditsEarned {
    fn kind(&self) -> &'static str {
        "credits_earned"
    }

    fn description(&self) -> &'static str {
        "累计赚取时间币"
    }

    fn measure(&self, snapshot: &StatSnapshot) -> f64 {
        snapshot.credits_earned
    }
}
