//! 领域模型定义

mod badge;
mod leaderboard;
mod progress;
mod stats;

pub use badge::*;
pub use leaderboard::*;
pub use progress::*;
pub use stats::*;
