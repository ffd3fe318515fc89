//! 学习进度计算与里程碑状态机
//!
//! 两者都是纯计算，持久化和通知由 `service::ProgressService` 负责

pub mod calculator;
pub mod milestone;

pub use calculator::{ComputedProgress, calculate_level, calculate_percentage, estimate_completion};
pub use milestone::MilestoneEngine;
