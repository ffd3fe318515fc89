//! 排行榜排名
//!
//! 对一批用户快照按指定维度打分、降序排序并截断

use crate::models::{LeaderboardDimension, LeaderboardEntry, StatSnapshot};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// 规范化返回条数：`<= 0` 取默认值 10，超过 100 取 100
pub fn normalize_limit(limit: i64) -> usize {
    if limit <= 0 {
        DEFAULT_LIMIT
    } else {
        usize::try_from(limit).map_or(MAX_LIMIT, |l| l.min(MAX_LIMIT))
    }
}

/// 排行榜排名器
#[derive(Debug, Default, Clone, Copy)]
pub struct LeaderboardRanker;

impl LeaderboardRanker {
    /// 计算排行榜
    ///
    /// - 分值为 0 或非有限数值的用户不上榜
    /// - 按分值降序；分值相同时保持输入顺序（稳定排序）
    /// - `limit` 按 [`normalize_limit`] 规范化
    pub fn rank<'a, I>(snapshots: I, dimension: LeaderboardDimension, limit: i64) -> Vec<LeaderboardEntry>
    where
        I: IntoIterator<Item = &'a StatSnapshot>,
    {
        let limit = normalize_limit(limit);

        let mut scored: Vec<(f64, &StatSnapshot)> = snapshots
            .into_iter()
            .map(|snapshot| (dimension.score(snapshot), snapshot))
            .filter(|(score, _)| score.is_finite() && *score != 0.0)
            .collect();

        // slice::sort_by 是稳定排序
        scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));
        scored.truncate(limit);

        scored
            .into_iter()
            .enumerate()
            .map(|(index, (score, snapshot))| LeaderboardEntry {
                rank: index + 1,
                user_id: snapshot.user_id.clone(),
                username: snapshot.username.clone(),
                score,
                dimension,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, sessions: i64) -> StatSnapshot {
        StatSnapshot::new(id, format!("name-{id}")).with_sessions(sessions, 0)
    }

    fn ids(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.user_id.as_str()).collect()
    }

    #[test]
    fn test_normalize_limit() {
        assert_eq!(normalize_limit(0), 10);
        assert_eq!(normalize_limit(-7), 10);
        assert_eq!(normalize_limit(1), 1);
        assert_eq!(normalize_limit(100), 100);
        assert_eq!(normalize_limit(500), 100);
        assert_eq!(normalize_limit(i64::MAX), 100);
    }

    #[test]
    fn test_rank_descending_with_ranks() {
        let users = vec![user("a", 3), user("b", 9), user("c", 5)];
        let entries = LeaderboardRanker::rank(&users, LeaderboardDimension::Sessions, 10);

        assert_eq!(ids(&entries), vec!["b", "c", "a"]);
        assert_eq!(entries.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(entries[0].username, "name-b");
        assert_eq!(entries[0].score, 9.0);
        assert!(entries.iter().all(|e| e.dimension == LeaderboardDimension::Sessions));
    }

    #[test]
    fn test_rank_skips_zero_scores() {
        let users = vec![user("a", 0), user("b", 2), user("c", 0)];
        let entries = LeaderboardRanker::rank(&users, LeaderboardDimension::Sessions, 10);

        assert_eq!(ids(&entries), vec!["b"]);
    }

    #[test]
    fn test_rank_skips_non_finite_scores() {
        let users = vec![
            StatSnapshot::new("a", "a").with_credits(f64::NAN, 0.0),
            StatSnapshot::new("b", "b").with_credits(4.0, 0.0),
        ];
        let entries = LeaderboardRanker::rank(&users, LeaderboardDimension::Credits, 10);

        assert_eq!(ids(&entries), vec!["b"]);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let users = vec![user("first", 4), user("second", 4), user("top", 8), user("third", 4)];
        let entries = LeaderboardRanker::rank(&users, LeaderboardDimension::Sessions, 10);

        assert_eq!(ids(&entries), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_rank_limit() {
        let users: Vec<_> = (1..=150).map(|i| user(&format!("u{i}"), i)).collect();

        assert_eq!(LeaderboardRanker::rank(&users, LeaderboardDimension::Sessions, 0).len(), 10);
        assert_eq!(LeaderboardRanker::rank(&users, LeaderboardDimension::Sessions, 500).len(), 100);
        let top3 = LeaderboardRanker::rank(&users, LeaderboardDimension::Sessions, 3);
        assert_eq!(ids(&top3), vec!["u150", "u149", "u148"]);
    }

    #[test]
    fn test_rank_by_rating() {
        let users = vec![
            StatSnapshot::new("a", "a").with_ratings(4.0, 4.0),
            StatSnapshot::new("b", "b").with_ratings(5.0, 4.0),
            StatSnapshot::new("c", "c"),
        ];
        let entries = LeaderboardRanker::rank(&users, LeaderboardDimension::Rating, 10);

        assert_eq!(ids(&entries), vec!["b", "a"]);
        assert_eq!(entries[0].score, 4.5);
    }
}
