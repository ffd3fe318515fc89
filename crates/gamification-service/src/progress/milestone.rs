//! 里程碑状态机
//!
//! 每个里程碑只有"未达成 -> 已达成"一个方向的迁移

use chrono::{DateTime, Utc};

use crate::models::Milestone;

/// 里程碑引擎
#[derive(Debug, Default, Clone, Copy)]
pub struct MilestoneEngine;

impl MilestoneEngine {
    /// 按新的进度推进里程碑
    ///
    /// 先按阈值升序排列，再把所有阈值 `<= percentage` 且尚未达成的里程碑
    /// 标记为已达成。返回本次新达成的里程碑（升序）；进度不变或回退时返回空
    pub fn advance(milestones: &mut [Milestone], percentage: f64, now: DateTime<Utc>) -> Vec<Milestone> {
        milestones.sort_by(|a, b| a.progress_threshold.total_cmp(&b.progress_threshold));

        let mut achieved = Vec::new();
        for milestone in milestones.iter_mut() {
            if milestone.is_achieved || milestone.progress_threshold > percentage {
                continue;
            }
            milestone.is_achieved = true;
            milestone.achieved_at = Some(now);
            achieved.push(milestone.clone());
        }
        achieved
    }

    /// 下一个待达成的里程碑
    pub fn next_pending(milestones: &[Milestone]) -> Option<&Milestone> {
        milestones
            .iter()
            .filter(|m| !m.is_achieved)
            .min_by(|a, b| a.progress_threshold.total_cmp(&b.progress_threshold))
    }
}
