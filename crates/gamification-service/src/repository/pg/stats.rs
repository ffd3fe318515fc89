//! 用户统计

use async_trait::async_trait;

use super::PgStore;
use crate::error::{GamificationError, Result};
use crate::models::StatSnapshot;
use crate::repository::traits::UserStatsRepository;

/// 徽章数和稀有度总分由 user_badges 聚合得到
const STATS_SELECT: &str = r#"
    SELECT u.id AS user_id,
           u.username,
           u.total_sessions_as_teacher AS sessions_as_teacher,
           u.total_sessions_as_student AS sessions_as_student,
           u.average_rating_as_teacher,
           u.average_rating_as_student,
           u.total_earned AS credits_earned,
           u.total_spent AS credits_spent,
           COUNT(ub.id) AS badge_count,
           COALESCE(SUM(b.rarity), 0)::BIGINT AS badge_rarity
    FROM users u
    LEFT JOIN user_badges ub ON ub.user_id = u.id
    LEFT JOIN badges b ON b.id = ub.badge_id
"#;

#[async_trait]
impl UserStatsRepository for PgStore {
    async fn get_user_stats(&self, user_id: &str) -> Result<StatSnapshot> {
        let sql = format!("{STATS_SELECT} WHERE u.id = $1 GROUP BY u.id");
        sqlx::query_as::<_, StatSnapshot>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| GamificationError::UserNotFound(user_id.to_string()))
    }

    async fn list_all_user_stats(&self) -> Result<Vec<StatSnapshot>> {
        let sql = format!("{STATS_SELECT} GROUP BY u.id ORDER BY u.created_at, u.id");
        let snapshots = sqlx::query_as::<_, StatSnapshot>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(snapshots)
    }

    async fn credit_balance(&self, user_id: &str, amount: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET credit_balance = credit_balance + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount as f64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GamificationError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }
}
