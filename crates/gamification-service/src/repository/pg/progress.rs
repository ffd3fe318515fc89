//! 学习进度与里程碑

use async_trait::async_trait;

use super::PgStore;
use crate::error::{GamificationError, Result};
use crate::models::{Milestone, SkillProgress};
use crate::repository::traits::{InsertOutcome, ProgressRepository};

const PROGRESS_COLUMNS: &str = "id, user_id, skill_id, sessions_completed, total_hours_spent, \
     progress_percentage, current_level, last_activity_at, estimated_completion_at, \
     created_at, updated_at";

const MILESTONE_COLUMNS: &str =
    "id, skill_progress_id, title, description, progress_threshold, is_achieved, achieved_at, created_at";

#[async_trait]
impl ProgressRepository for PgStore {
    async fn skill_exists(&self, skill_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM skills WHERE id = $1)")
            .bind(skill_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn load_progress(&self, user_id: &str, skill_id: i64) -> Result<Option<SkillProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM skill_progress WHERE user_id = $1 AND skill_id = $2"
        );
        let progress = sqlx::query_as::<_, SkillProgress>(&sql)
            .bind(user_id)
            .bind(skill_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(progress)
    }

    async fn insert_progress_if_absent(
        &self,
        progress: &SkillProgress,
        milestones: &[Milestone],
    ) -> Result<InsertOutcome<SkillProgress>> {
        let progress_sql = format!(
            r#"
            INSERT INTO skill_progress (user_id, skill_id, sessions_completed, total_hours_spent,
                progress_percentage, current_level, last_activity_at, estimated_completion_at,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id, skill_id) DO NOTHING
            RETURNING {PROGRESS_COLUMNS}
            "#
        );
        let milestone_sql = r#"
            INSERT INTO milestones (skill_progress_id, title, description, progress_threshold,
                is_achieved, achieved_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#;

        // 进度与里程碑同一事务提交，并发落败方在冲突等待结束后才能读到完整记录
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query_as::<_, SkillProgress>(&progress_sql)
            .bind(&progress.user_id)
            .bind(progress.skill_id)
            .bind(progress.sessions_completed)
            .bind(progress.total_hours_spent)
            .bind(progress.progress_percentage)
            .bind(progress.current_level)
            .bind(progress.last_activity_at)
            .bind(progress.estimated_completion_at)
            .bind(progress.created_at)
            .bind(progress.updated_at)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(created) = inserted {
            for milestone in milestones {
                sqlx::query(milestone_sql)
                    .bind(created.id)
                    .bind(&milestone.title)
                    .bind(&milestone.description)
                    .bind(milestone.progress_threshold)
                    .bind(milestone.is_achieved)
                    .bind(milestone.achieved_at)
                    .bind(milestone.created_at)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
            return Ok(InsertOutcome::created(created));
        }
        tx.rollback().await?;

        self.load_progress(&progress.user_id, progress.skill_id)
            .await?
            .map(InsertOutcome::existing)
            .ok_or_else(|| {
                GamificationError::Internal(format!(
                    "学习进度插入冲突但读取不到已有记录: user_id={}, skill_id={}",
                    progress.user_id, progress.skill_id
                ))
            })
    }

    async fn save_progress(&self, progress: &SkillProgress) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE skill_progress
            SET sessions_completed = $2,
                total_hours_spent = $3,
                progress_percentage = $4,
                current_level = $5,
                last_activity_at = $6,
                estimated_completion_at = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(progress.id)
        .bind(progress.sessions_completed)
        .bind(progress.total_hours_spent)
        .bind(progress.progress_percentage)
        .bind(progress.current_level)
        .bind(progress.last_activity_at)
        .bind(progress.estimated_completion_at)
        .bind(progress.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GamificationError::ProgressNotFound {
                user_id: progress.user_id.clone(),
                skill_id: progress.skill_id,
            });
        }
        Ok(())
    }

    async fn list_user_progress(&self, user_id: &str) -> Result<Vec<SkillProgress>> {
        let sql = format!("SELECT {PROGRESS_COLUMNS} FROM skill_progress WHERE user_id = $1 ORDER BY id");
        let progresses = sqlx::query_as::<_, SkillProgress>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(progresses)
    }

    async fn load_milestones(&self, skill_progress_id: i64) -> Result<Vec<Milestone>> {
        let sql = format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE skill_progress_id = $1 \
             ORDER BY progress_threshold, id"
        );
        let milestones = sqlx::query_as::<_, Milestone>(&sql)
            .bind(skill_progress_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(milestones)
    }

    async fn save_milestone(&self, milestone: &Milestone) -> Result<bool> {
        if !milestone.is_achieved {
            return Ok(false);
        }

        // 条件更新：并发的两次进度更新只有一个能完成迁移
        let result = sqlx::query(
            r#"
            UPDATE milestones
            SET is_achieved = TRUE, achieved_at = $2
            WHERE id = $1 AND is_achieved = FALSE
            "#,
        )
        .bind(milestone.id)
        .bind(milestone.achieved_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
