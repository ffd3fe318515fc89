//! 数据访问层
//!
//! - `traits`: 存储端口定义
//! - `pg`: PostgreSQL 实现
//! - `memory`: 基于 DashMap 的内存实现

mod memory;
mod pg;
pub mod traits;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use traits::{
    BadgeRepository, InsertOutcome, ProgressRepository, UserBadgeRepository, UserStatsRepository,
};

#[cfg(test)]
pub use traits::{
    MockBadgeRepository, MockProgressRepository, MockUserBadgeRepository,
    MockUserStatsRepository,
};
