//! 进度计算器
//!
//! 每次更新都从调用方提交的会话数和时长重新计算，不依赖历史值

use chrono::{DateTime, Duration, Utc};

use crate::models::SkillLevel;

/// 每次会话贡献的进度百分点
pub const SESSION_WEIGHT: f64 = 20.0;
/// 每小时贡献的进度百分点
pub const HOUR_WEIGHT: f64 = 5.0;
pub const MAX_PERCENTAGE: f64 = 100.0;
/// 预计完成时间的假设速度：每周 10 个百分点
pub const PERCENTAGE_PER_WEEK: f64 = 10.0;

const INTERMEDIATE_HOURS: f64 = 5.0;
const ADVANCED_HOURS: f64 = 20.0;
const EXPERT_HOURS: f64 = 50.0;

/// 一次计算的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedProgress {
    pub percentage: f64,
    pub level: SkillLevel,
    pub estimated_completion_at: DateTime<Utc>,
}

impl ComputedProgress {
    pub fn compute(sessions_completed: i32, hours_spent: f64, last_activity_at: DateTime<Utc>) -> Self {
        let percentage = calculate_percentage(sessions_completed, hours_spent);
        Self {
            percentage,
            level: calculate_level(hours_spent),
            estimated_completion_at: estimate_completion(percentage, last_activity_at),
        }
    }
}

/// `clamp(sessions * 20 + hours * 5, 0, 100)`，保留两位小数
pub fn calculate_percentage(sessions_completed: i32, hours_spent: f64) -> f64 {
    let raw = f64::from(sessions_completed) * SESSION_WEIGHT + hours_spent * HOUR_WEIGHT;
    if raw.is_nan() {
        return 0.0;
    }
    round2(raw.clamp(0.0, MAX_PERCENTAGE))
}

/// 按累计时长划分等级，区间左闭右开
pub fn calculate_level(hours_spent: f64) -> SkillLevel {
    if hours_spent < INTERMEDIATE_HOURS {
        SkillLevel::Beginner
    } else if hours_spent < ADVANCED_HOURS {
        SkillLevel::Intermediate
    } else if hours_spent < EXPERT_HOURS {
        SkillLevel::Advanced
    } else {
        SkillLevel::Expert
    }
}

/// 预计完成时间：`last_activity + ceil((100 - percentage) / 10)` 周
///
/// 这是一个占位估算，假设学习速度恒定为每周 10 个百分点，
/// 没有根据实际学习节奏做任何校正，只能作为展示参考
pub fn estimate_completion(percentage: f64, last_activity_at: DateTime<Utc>) -> DateTime<Utc> {
    let remaining = round2((MAX_PERCENTAGE - percentage).clamp(0.0, MAX_PERCENTAGE));
    let weeks = (remaining / PERCENTAGE_PER_WEEK).ceil() as i64;
    last_activity_at + Duration::weeks(weeks)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
