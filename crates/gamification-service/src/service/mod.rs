//! 业务服务层
//!
//! - `AwardService`: 徽章资格判定与发放
//! - `BadgeQueryService`: 徽章目录、用户徽章查询与置顶
//! - `ProgressService`: 技能学习进度与里程碑
//! - `LeaderboardService`: 排行榜查询

mod award_service;
mod badge_query_service;
pub mod dto;
mod leaderboard_service;
mod progress_service;

pub use award_service::AwardService;
pub use badge_query_service::BadgeQueryService;
pub use leaderboard_service::LeaderboardService;
pub use progress_service::ProgressService;
