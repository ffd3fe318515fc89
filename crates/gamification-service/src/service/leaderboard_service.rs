//! 排行榜服务

use std::sync::Arc;

use tracing::{info, instrument, warn};

use timebank_shared::observability::metrics;

use crate::error::Result;
use crate::leaderboard::{LeaderboardRanker, normalize_limit};
use crate::models::{LeaderboardDimension, LeaderboardEntry};
use crate::repository::UserStatsRepository;

/// 排行榜服务
///
/// 每次查询读取全量快照实时计算，允许与并发写入存在短暂不一致
pub struct LeaderboardService<SR>
where
    SR: UserStatsRepository,
{
    stats_repo: Arc<SR>,
}

impl<SR> LeaderboardService<SR>
where
    SR: UserStatsRepository,
{
    pub fn new(stats_repo: Arc<SR>) -> Self {
        Self { stats_repo }
    }

    /// 按维度名查询排行榜
    ///
    /// 维度名不合法时在读取数据前返回 `InvalidDimension`
    #[instrument(skip(self))]
    pub async fn get_leaderboard(&self, dimension: &str, limit: i64) -> Result<Vec<LeaderboardEntry>> {
        let dimension: LeaderboardDimension = dimension.parse()?;
        self.rank(dimension, limit).await
    }

    pub async fn rank(
        &self,
        dimension: LeaderboardDimension,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>> {
        metrics::record_leaderboard_query(dimension.as_str());

        let snapshots = self.stats_repo.list_all_user_stats().await?;
        let total = snapshots.len();

        let valid: Vec<_> = snapshots
            .into_iter()
            .filter(|snapshot| match snapshot.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!(user_id = %snapshot.user_id, error = %e, "用户统计数据异常，不参与排名");
                    false
                }
            })
            .collect();

        let entries = LeaderboardRanker::rank(&valid, dimension, limit);

        info!(
            dimension = %dimension,
            limit = normalize_limit(limit),
            candidates = total,
            returned = entries.len(),
            "排行榜计算完成"
        );

        Ok(entries)
    }
}
