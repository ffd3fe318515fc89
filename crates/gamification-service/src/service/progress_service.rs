//! 技能学习进度服务
//!
//! 根据调用方提交的累计会话数和时长重新计算进度，并推进里程碑。
//! 首次提交时原子地创建进度记录和五个默认里程碑；并发的首次提交由
//! `insert_progress_if_absent` 保证只有一条记录，落败方改走更新流程

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use validator::Validate;

use timebank_shared::observability::metrics;

use crate::error::{GamificationError, Result};
use crate::models::{Milestone, SkillProgress};
use crate::notification::{self, NotificationBuilder, NotificationSink};
use crate::progress::{ComputedProgress, MilestoneEngine};
use crate::repository::ProgressRepository;
use crate::service::dto::{ProgressDetail, ProgressSummary, UpdateProgressRequest};

/// 学习进度服务
pub struct ProgressService<PR, NS>
where
    PR: ProgressRepository,
    NS: NotificationSink,
{
    progress_repo: Arc<PR>,
    notifier: Arc<NS>,
}

impl<PR, NS> ProgressService<PR, NS>
where
    PR: ProgressRepository,
    NS: NotificationSink,
{
    pub fn new(progress_repo: Arc<PR>, notifier: Arc<NS>) -> Self {
        Self {
            progress_repo,
            notifier,
        }
    }

    /// 查询单项技能的学习进度
    #[instrument(skip(self), fields(user_id = %user_id, skill_id = skill_id))]
    pub async fn get_progress(&self, user_id: &str, skill_id: i64) -> Result<ProgressDetail> {
        let progress = self
            .progress_repo
            .load_progress(user_id, skill_id)
            .await?
            .ok_or_else(|| GamificationError::ProgressNotFound {
                user_id: user_id.to_string(),
                skill_id,
            })?;

        let milestones = self.progress_repo.load_milestones(progress.id).await?;
        Ok(ProgressDetail {
            progress,
            milestones,
        })
    }

    /// 更新学习进度
    ///
    /// 每次都从提交值重新计算百分比、等级和预计完成时间；
    /// 新建与更新两条路径都会推进里程碑
    #[instrument(skip(self), fields(user_id = %user_id, skill_id = skill_id))]
    pub async fn update_progress(
        &self,
        user_id: &str,
        skill_id: i64,
        request: UpdateProgressRequest,
    ) -> Result<ProgressDetail> {
        request.validate()?;
        // range 校验放行 NaN 和正无穷
        if !request.hours_spent.is_finite() {
            return Err(GamificationError::Validation("学习时长不是有效数值".to_string()));
        }

        let now = Utc::now();
        let computed =
            ComputedProgress::compute(request.sessions_completed, request.hours_spent, now);

        let (progress, created) = match self.progress_repo.load_progress(user_id, skill_id).await? {
            Some(existing) => (self.overwrite(existing, &request, &computed, now).await?, false),
            None => self.create(user_id, skill_id, &request, &computed, now).await?,
        };

        metrics::record_progress_update(created);
        info!(
            progress_id = progress.id,
            created = created,
            percentage = progress.progress_percentage,
            level = %progress.current_level,
            "学习进度已更新"
        );

        let milestones = self.advance_milestones(&progress, now).await?;
        let detail = ProgressDetail {
            progress,
            milestones,
        };
        if let Some(next) = detail.next_milestone() {
            debug!(next_threshold = next.progress_threshold, title = %next.title, "下一个待达成里程碑");
        }
        Ok(detail)
    }

    /// 用户全部技能的进度汇总
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user_progress_summary(&self, user_id: &str) -> Result<ProgressSummary> {
        let progresses = self.progress_repo.list_user_progress(user_id).await?;

        let total = progresses.len();
        let total_hours_spent: f64 = progresses.iter().map(|p| p.total_hours_spent).sum();
        let average_progress = if total == 0 {
            0.0
        } else {
            let sum: f64 = progresses.iter().map(|p| p.progress_percentage).sum();
            ((sum / total as f64) * 100.0).round() / 100.0
        };

        let mut skill_progresses = Vec::with_capacity(total);
        for progress in progresses {
            let milestones = self.progress_repo.load_milestones(progress.id).await?;
            skill_progresses.push(ProgressDetail {
                progress,
                milestones,
            });
        }

        Ok(ProgressSummary {
            total_skills_learning: total,
            average_progress,
            total_hours_spent,
            skill_progresses,
        })
    }

    async fn create(
        &self,
        user_id: &str,
        skill_id: i64,
        request: &UpdateProgressRequest,
        computed: &ComputedProgress,
        now: DateTime<Utc>,
    ) -> Result<(SkillProgress, bool)> {
        if !self.progress_repo.skill_exists(skill_id).await? {
            return Err(GamificationError::SkillNotFound(skill_id));
        }

        let draft = SkillProgress {
            id: 0,
            user_id: user_id.to_string(),
            skill_id,
            sessions_completed: request.sessions_completed,
            total_hours_spent: request.hours_spent,
            progress_percentage: computed.percentage,
            current_level: computed.level,
            last_activity_at: now,
            estimated_completion_at: computed.estimated_completion_at,
            created_at: now,
            updated_at: now,
        };

        let outcome = self
            .progress_repo
            .insert_progress_if_absent(&draft, &Milestone::defaults_for(0, now))
            .await?;
        if !outcome.created {
            debug!("学习进度已由并发请求创建，改为更新");
            let progress = self.overwrite(outcome.record, request, computed, now).await?;
            return Ok((progress, false));
        }

        Ok((outcome.record, true))
    }

    async fn overwrite(
        &self,
        mut progress: SkillProgress,
        request: &UpdateProgressRequest,
        computed: &ComputedProgress,
        now: DateTime<Utc>,
    ) -> Result<SkillProgress> {
        progress.sessions_completed = request.sessions_completed;
        progress.total_hours_spent = request.hours_spent;
        progress.progress_percentage = computed.percentage;
        progress.current_level = computed.level;
        progress.last_activity_at = now;
        progress.estimated_completion_at = computed.estimated_completion_at;
        progress.updated_at = now;

        self.progress_repo.save_progress(&progress).await?;
        Ok(progress)
    }

    /// 推进里程碑，并为本次真正完成迁移的里程碑发送通知
    async fn advance_milestones(
        &self,
        progress: &SkillProgress,
        now: DateTime<Utc>,
    ) -> Result<Vec<Milestone>> {
        let mut milestones = self.progress_repo.load_milestones(progress.id).await?;
        let achieved = MilestoneEngine::advance(&mut milestones, progress.progress_percentage, now);

        for milestone in &achieved {
            if !self.progress_repo.save_milestone(milestone).await? {
                debug!(milestone_id = milestone.id, "里程碑已由并发请求达成");
                continue;
            }

            metrics::record_milestone_achieved(milestone.progress_threshold);
            info!(
                milestone_id = milestone.id,
                threshold = milestone.progress_threshold,
                title = %milestone.title,
                "达成学习里程碑"
            );

            let message =
                NotificationBuilder::milestone_achieved(&progress.user_id, progress.skill_id, milestone);
            notification::deliver(self.notifier.as_ref(), &message).await;
        }

        Ok(milestones)
    }
}
