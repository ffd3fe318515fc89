//! 徽章发放服务
//!
//! 对用户逐个检查徽章目录中尚未持有的徽章，满足条件即发放。
//!
//! ## 幂等保证
//!
//! 同一用户的两次检查可能并发执行（例如两个会话完成事件同时到达）。
//! `has_award` 只是快速过滤，真正的唯一性由存储层的 `insert_award_if_absent`
//! 原子保证：只有实际插入成功的那次调用才会入账奖励并发送通知。
//!
//! ## 失败隔离
//!
//! - 单个徽章条件配置异常：记录告警后跳过，继续检查其余徽章
//! - 奖励入账失败：徽章已发放，不回滚，结果中 `bonus_credited = false`
//! - 通知失败：只记录，不影响结果
//! - 存储读写失败：直接返回错误，由调用方决定是否重试

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use timebank_shared::observability::metrics;

use crate::error::{GamificationError, Result};
use crate::models::{AwardedBadge, Badge, StatSnapshot};
use crate::notification::{self, NotificationBuilder, NotificationSink};
use crate::repository::{BadgeRepository, UserBadgeRepository, UserStatsRepository};
use crate::requirement::RequirementRegistry;

/// 徽章发放服务
pub struct AwardService<SR, BR, UBR, NS>
where
    SR: UserStatsRepository,
    BR: BadgeRepository,
    UBR: UserBadgeRepository,
    NS: NotificationSink,
{
    stats_repo: Arc<SR>,
    badge_repo: Arc<BR>,
    user_badge_repo: Arc<UBR>,
    notifier: Arc<NS>,
    registry: Arc<RequirementRegistry>,
}

impl<SR, BR, UBR, NS> AwardService<SR, BR, UBR, NS>
where
    SR: UserStatsRepository,
    BR: BadgeRepository,
    UBR: UserBadgeRepository,
    NS: NotificationSink,
{
    pub fn new(
        stats_repo: Arc<SR>,
        badge_repo: Arc<BR>,
        user_badge_repo: Arc<UBR>,
        notifier: Arc<NS>,
        registry: Arc<RequirementRegistry>,
    ) -> Self {
        Self {
            stats_repo,
            badge_repo,
            user_badge_repo,
            notifier,
            registry,
        }
    }

    /// 检查并发放用户满足条件的全部徽章
    ///
    /// 返回本次新发放的徽章；已持有或被并发请求抢先发放的徽章不包含在内
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn check_and_award_badges(&self, user_id: &str) -> Result<Vec<AwardedBadge>> {
        let snapshot = self.stats_repo.get_user_stats(user_id).await?;
        snapshot.validate()?;

        let catalog = self.badge_repo.list_badges().await?;
        let mut awarded = Vec::new();
        let mut skipped = 0usize;

        for badge in &catalog {
            match self.evaluate_badge(&snapshot, badge).await {
                Ok(Some(result)) => awarded.push(result),
                Ok(None) => {}
                Err(GamificationError::MalformedRequirement { badge_id, source }) => {
                    skipped += 1;
                    metrics::record_requirement_error(badge_id, source.reason());
                    warn!(
                        badge_id = badge_id,
                        badge_name = %badge.name,
                        error = %source,
                        "徽章获取条件配置异常，跳过"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            catalog_size = catalog.len(),
            awarded = awarded.len(),
            skipped = skipped,
            "徽章资格检查完成"
        );

        Ok(awarded)
    }

    /// 对单个徽章执行判定和发放
    ///
    /// 返回 `Ok(None)` 表示未发放（已持有、不满足条件或并发重复）
    pub async fn evaluate_badge(
        &self,
        snapshot: &StatSnapshot,
        badge: &Badge,
    ) -> Result<Option<AwardedBadge>> {
        let user_id = snapshot.user_id.as_str();

        if self.user_badge_repo.has_award(user_id, badge.id).await? {
            return Ok(None);
        }

        let requirements = self.registry.parse(&badge.requirements).map_err(|source| {
            GamificationError::MalformedRequirement {
                badge_id: badge.id,
                source,
            }
        })?;

        if let Some(unmet) = requirements.first_unmet(snapshot) {
            debug!(
                badge_id = badge.id,
                kind = unmet.kind(),
                threshold = unmet.threshold(),
                "未满足徽章条件"
            );
            return Ok(None);
        }

        let outcome = self
            .user_badge_repo
            .insert_award_if_absent(user_id, badge.id, Utc::now())
            .await?;

        if !outcome.created {
            metrics::record_award_duplicate();
            debug!(badge_id = badge.id, "徽章已由并发请求发放，忽略");
            return Ok(None);
        }

        let bonus_credited = self.credit_bonus(user_id, badge).await;
        metrics::record_badge_awarded(badge.id);

        info!(
            badge_id = badge.id,
            badge_name = %badge.name,
            user_badge_id = outcome.record.id,
            bonus_credits = badge.bonus_credits,
            bonus_credited = bonus_credited,
            "徽章发放成功"
        );

        let message = NotificationBuilder::badge_awarded(user_id, badge);
        notification::deliver(self.notifier.as_ref(), &message).await;

        Ok(Some(AwardedBadge::new(badge, &outcome.record, bonus_credited)))
    }

    /// 入账奖励时间币
    ///
    /// 奖励为 0 时无需入账，视为已完成
    async fn credit_bonus(&self, user_id: &str, badge: &Badge) -> bool {
        if badge.bonus_credits <= 0 {
            return true;
        }

        match self
            .stats_repo
            .credit_balance(user_id, badge.bonus_credits)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(
                    user_id = %user_id,
                    badge_id = badge.id,
                    amount = badge.bonus_credits,
                    error = %e,
                    "奖励时间币入账失败，徽章已发放"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BadgeType, UserBadge};
    use crate::notification::MockNotificationSink;
    use crate::repository::{
        InsertOutcome, MockBadgeRepository, MockUserBadgeRepository, MockUserStatsRepository,
    };
    use serde_json::{Value, json};

    type TestService = AwardService<
        MockUserStatsRepository,
        MockBadgeRepository,
        MockUserBadgeRepository,
        MockNotificationSink,
    >;

    fn badge(id: i64, requirements: Value, bonus_credits: i64) -> Badge {
        let mut badge = Badge::new(format!("badge-{id}"), BadgeType::Achievement, requirements)
            .with_bonus_credits(bonus_credits);
        badge.id = id;
        badge
    }

    fn user_badge(id: i64, user_id: &str, badge_id: i64) -> UserBadge {
        UserBadge {
            id,
            user_id: user_id.to_string(),
            badge_id,
            earned_at: Utc::now(),
            is_pinned: false,
        }
    }

    fn stats_repo(snapshot: StatSnapshot) -> MockUserStatsRepository {
        let mut repo = MockUserStatsRepository::new();
        repo.expect_get_user_stats()
            .returning(move |_| Ok(snapshot.clone()));
        repo
    }

    fn catalog(badges: Vec<Badge>) -> MockBadgeRepository {
        let mut repo = MockBadgeRepository::new();
        repo.expect_list_badges()
            .returning(move || Ok(badges.clone()));
        repo
    }

    fn quiet_notifier() -> MockNotificationSink {
        let mut sink = MockNotificationSink::new();
        sink.expect_notify().returning(|_| Ok(()));
        sink
    }

    fn service(
        stats: MockUserStatsRepository,
        badges: MockBadgeRepository,
        user_badges: MockUserBadgeRepository,
        notifier: MockNotificationSink,
    ) -> TestService {
        AwardService::new(
            Arc::new(stats),
            Arc::new(badges),
            Arc::new(user_badges),
            Arc::new(notifier),
            Arc::new(RequirementRegistry::with_defaults()),
        )
    }

    #[tokio::test]
    async fn test_awards_qualifying_badge() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_sessions(6, 4);
        let mut stats = stats_repo(snapshot);
        stats
            .expect_credit_balance()
            .times(1)
            .returning(|_, amount| {
                assert_eq!(amount, 5);
                Ok(())
            });

        let mut user_badges = MockUserBadgeRepository::new();
        user_badges.expect_has_award().returning(|_, _| Ok(false));
        user_badges
            .expect_insert_award_if_absent()
            .times(1)
            .returning(|user_id, badge_id, _| {
                Ok(InsertOutcome::created(user_badge(100, &user_id.to_string(), badge_id)))
            });

        let mut notifier = MockNotificationSink::new();
        notifier.expect_notify().times(1).returning(|_| Ok(()));

        let service = service(
            stats,
            catalog(vec![badge(1, json!({"total_sessions": 10}), 5)]),
            user_badges,
            notifier,
        );

        let awarded = service.check_and_award_badges("u-1").await.unwrap();

        assert_eq!(awarded.len(), 1);
        assert_eq!(awarded[0].badge_id, 1);
        assert_eq!(awarded[0].user_badge_id, 100);
        assert!(awarded[0].bonus_credited);
    }

    #[tokio::test]
    async fn test_unqualified_badge_is_not_inserted() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_sessions(5, 4);

        let mut user_badges = MockUserBadgeRepository::new();
        user_badges.expect_has_award().returning(|_, _| Ok(false));
        user_badges.expect_insert_award_if_absent().never();

        let service = service(
            stats_repo(snapshot),
            catalog(vec![badge(1, json!({"total_sessions": 10}), 5)]),
            user_badges,
            MockNotificationSink::new(),
        );

        assert!(service.check_and_award_badges("u-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_held_badge_is_skipped() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_sessions(50, 0);

        let mut user_badges = MockUserBadgeRepository::new();
        user_badges.expect_has_award().returning(|_, _| Ok(true));
        user_badges.expect_insert_award_if_absent().never();

        let service = service(
            stats_repo(snapshot),
            catalog(vec![badge(1, json!({"total_sessions": 10}), 5)]),
            user_badges,
            MockNotificationSink::new(),
        );

        assert!(service.check_and_award_badges("u-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_badge_does_not_stop_scan() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_sessions(3, 0);
        let mut stats = stats_repo(snapshot);
        stats.expect_credit_balance().returning(|_, _| Ok(()));

        let mut user_badges = MockUserBadgeRepository::new();
        user_badges.expect_has_award().returning(|_, _| Ok(false));
        user_badges
            .expect_insert_award_if_absent()
            .times(2)
            .returning(|user_id, badge_id, _| {
                Ok(InsertOutcome::created(user_badge(badge_id * 10, &user_id.to_string(), badge_id)))
            });

        let service = service(
            stats,
            catalog(vec![
                badge(1, json!({"teaching_sessions": 1}), 1),
                badge(2, json!({"streak_days": 3}), 1),
                badge(3, json!("{broken"), 1),
                badge(4, json!({"total_sessions": 2}), 1),
            ]),
            user_badges,
            quiet_notifier(),
        );

        let awarded = service.check_and_award_badges("u-1").await.unwrap();
        let ids: Vec<i64> = awarded.iter().map(|a| a.badge_id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_is_silent_noop() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_sessions(10, 0);
        let mut stats = stats_repo(snapshot);
        stats.expect_credit_balance().never();

        let mut user_badges = MockUserBadgeRepository::new();
        user_badges.expect_has_award().returning(|_, _| Ok(false));
        user_badges
            .expect_insert_award_if_absent()
            .returning(|user_id, badge_id, _| {
                Ok(InsertOutcome::existing(user_badge(7, &user_id.to_string(), badge_id)))
            });

        let mut notifier = MockNotificationSink::new();
        notifier.expect_notify().never();

        let service = service(
            stats,
            catalog(vec![badge(1, json!({"total_sessions": 10}), 5)]),
            user_badges,
            notifier,
        );

        assert!(service.check_and_award_badges("u-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credit_failure_keeps_award() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_sessions(10, 0);
        let mut stats = stats_repo(snapshot);
        stats
            .expect_credit_balance()
            .returning(|_, _| Err(GamificationError::Internal("ledger down".to_string())));

        let mut user_badges = MockUserBadgeRepository::new();
        user_badges.expect_has_award().returning(|_, _| Ok(false));
        user_badges
            .expect_insert_award_if_absent()
            .returning(|user_id, badge_id, _| {
                Ok(InsertOutcome::created(user_badge(1, &user_id.to_string(), badge_id)))
            });

        let service = service(
            stats,
            catalog(vec![badge(1, json!({"total_sessions": 10}), 5)]),
            user_badges,
            quiet_notifier(),
        );

        let awarded = service.check_and_award_badges("u-1").await.unwrap();
        assert_eq!(awarded.len(), 1);
        assert!(!awarded[0].bonus_credited);
    }

    #[tokio::test]
    async fn test_notification_failure_is_not_fatal() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_sessions(10, 0);

        let mut user_badges = MockUserBadgeRepository::new();
        user_badges.expect_has_award().returning(|_, _| Ok(false));
        user_badges
            .expect_insert_award_if_absent()
            .returning(|user_id, badge_id, _| {
                Ok(InsertOutcome::created(user_badge(1, &user_id.to_string(), badge_id)))
            });

        let mut notifier = MockNotificationSink::new();
        notifier
            .expect_notify()
            .returning(|_| Err(GamificationError::Internal("push down".to_string())));

        let service = service(
            stats_repo(snapshot),
            catalog(vec![badge(1, json!({"total_sessions": 10}), 0)]),
            user_badges,
            notifier,
        );

        let awarded = service.check_and_award_badges("u-1").await.unwrap();
        assert_eq!(awarded.len(), 1);
        assert!(awarded[0].bonus_credited);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let mut stats = MockUserStatsRepository::new();
        stats
            .expect_get_user_stats()
            .returning(|user_id| Err(GamificationError::UserNotFound(user_id.to_string())));

        let mut badges = MockBadgeRepository::new();
        badges.expect_list_badges().never();

        let service = service(
            stats,
            badges,
            MockUserBadgeRepository::new(),
            MockNotificationSink::new(),
        );

        let err = service.check_and_award_badges("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_ratings(7.0, 4.0);

        let mut badges = MockBadgeRepository::new();
        badges.expect_list_badges().never();

        let service = service(
            stats_repo(snapshot),
            badges,
            MockUserBadgeRepository::new(),
            MockNotificationSink::new(),
        );

        let err = service.check_and_award_badges("u-1").await.unwrap_err();
        assert!(matches!(err, GamificationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_propagated() {
        let snapshot = StatSnapshot::new("u-1", "alice").with_sessions(10, 0);

        let mut user_badges = MockUserBadgeRepository::new();
        user_badges
            .expect_has_award()
            .returning(|_, _| Err(GamificationError::Database(sqlx::Error::PoolTimedOut)));

        let service = service(
            stats_repo(snapshot),
            catalog(vec![badge(1, json!({"total_sessions": 10}), 5)]),
            user_badges,
            MockNotificationSink::new(),
        );

        let err = service.check_and_award_badges("u-1").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
