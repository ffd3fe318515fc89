//! 徽章目录与用户徽章

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PgStore;
use crate::error::Result;
use crate::models::{Badge, UserBadge};
use crate::repository::traits::{BadgeRepository, InsertOutcome, UserBadgeRepository};

#[async_trait]
impl BadgeRepository for PgStore {
    async fn list_badges(&self) -> Result<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>(
            r#"
            SELECT id, name, description, icon_url, badge_type, requirements,
                   bonus_credits, rarity, created_at
            FROM badges
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    async fn get_badge(&self, badge_id: i64) -> Result<Option<Badge>> {
        let badge = sqlx::query_as::<_, Badge>(
            r#"
            SELECT id, name, description, icon_url, badge_type, requirements,
                   bonus_credits, rarity, created_at
            FROM badges
            WHERE id = $1
            "#,
        )
        .bind(badge_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(badge)
    }
}

#[async_trait]
impl UserBadgeRepository for PgStore {
    async fn has_award(&self, user_id: &str, badge_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_badges WHERE user_id = $1 AND badge_id = $2)",
        )
        .bind(user_id)
        .bind(badge_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_award_if_absent(
        &self,
        user_id: &str,
        badge_id: i64,
        earned_at: DateTime<Utc>,
    ) -> Result<InsertOutcome<UserBadge>> {
        // 唯一约束保证并发插入只有一个成功，冲突时 RETURNING 不返回行
        let inserted = sqlx::query_as::<_, UserBadge>(
            r#"
            INSERT INTO user_badges (user_id, badge_id, earned_at, is_pinned)
            VALUES ($1, $2, $3, FALSE)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            RETURNING id, user_id, badge_id, earned_at, is_pinned
            "#,
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(earned_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user_badge) = inserted {
            return Ok(InsertOutcome::created(user_badge));
        }

        let existing = sqlx::query_as::<_, UserBadge>(
            r#"
            SELECT id, user_id, badge_id, earned_at, is_pinned
            FROM user_badges
            WHERE user_id = $1 AND badge_id = $2
            "#,
        )
        .bind(user_id)
        .bind(badge_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(InsertOutcome::existing(existing))
    }

    async fn list_user_badges(&self, user_id: &str) -> Result<Vec<UserBadge>> {
        let badges = sqlx::query_as::<_, UserBadge>(
            r#"
            SELECT id, user_id, badge_id, earned_at, is_pinned
            FROM user_badges
            WHERE user_id = $1
            ORDER BY earned_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    async fn set_pinned(&self, user_id: &str, badge_id: i64, pinned: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE user_badges SET is_pinned = $3 WHERE user_id = $1 AND badge_id = $2",
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(pinned)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
