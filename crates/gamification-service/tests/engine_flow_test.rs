//! 游戏化引擎流程集成测试
//!
//! 基于内存存储验证发放幂等、里程碑、排行榜等完整业务流程（无需外部依赖）

use std::sync::Arc;

use serde_json::json;

use gamification::{
    Badge, BadgeType, GamificationError, LeaderboardDimension, MemoryGamificationEngine,
    MemoryNotificationSink, MemoryStore, NotificationKind, SkillLevel, StatSnapshot,
};

struct Harness {
    engine: Arc<MemoryGamificationEngine>,
    store: Arc<MemoryStore>,
    sink: Arc<MemoryNotificationSink>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(MemoryNotificationSink::new());
    let engine = Arc::new(MemoryGamificationEngine::new(store.clone(), sink.clone()));
    Harness {
        engine,
        store,
        sink,
    }
}

// ==================== 徽章发放 ====================

#[tokio::test]
async fn test_award_threshold_boundary() {
    let h = harness();
    h.store
        .upsert_user(StatSnapshot::new("u-1", "alice").with_sessions(5, 4));
    let badge = h.store.add_badge(
        Badge::new("十次交流", BadgeType::Milestone, json!({"total_sessions": 10}))
            .with_bonus_credits(3),
    );

    let awarded = h.engine.check_and_award_badges("u-1").await.unwrap();
    assert!(awarded.is_empty());

    h.store.update_user_stats("u-1", |s| s.sessions_as_student = 5);
    let awarded = h.engine.check_and_award_badges("u-1").await.unwrap();

    assert_eq!(awarded.len(), 1);
    assert_eq!(awarded[0].badge_id, badge.id);
    assert!(awarded[0].bonus_credited);
    assert_eq!(h.store.credit_balance_of("u-1"), Some(3));
    assert_eq!(h.sink.count_of(NotificationKind::BadgeAwarded), 1);
}

#[tokio::test]
async fn test_repeat_check_is_idempotent() {
    let h = harness();
    h.store
        .upsert_user(StatSnapshot::new("u-1", "alice").with_sessions(10, 0));
    h.store.add_badge(
        Badge::new("导师", BadgeType::Achievement, json!({"teaching_sessions": 10}))
            .with_bonus_credits(5),
    );

    assert_eq!(h.engine.check_and_award_badges("u-1").await.unwrap().len(), 1);
    assert!(h.engine.check_and_award_badges("u-1").await.unwrap().is_empty());

    assert_eq!(h.store.award_count("u-1"), 1);
    assert_eq!(h.store.credit_balance_of("u-1"), Some(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checks_award_exactly_once() {
    let h = harness();
    h.store
        .upsert_user(StatSnapshot::new("u-1", "alice").with_sessions(6, 6));
    h.store.add_badge(
        Badge::new("十次交流", BadgeType::Milestone, json!({"total_sessions": 10}))
            .with_bonus_credits(4),
    );
    h.store.add_badge(
        Badge::new("优质导师", BadgeType::Quality, json!({"teaching_sessions": 5}))
            .with_bonus_credits(6),
    );

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let engine = h.engine.clone();
            tokio::spawn(async move { engine.check_and_award_badges("u-1").await })
        })
        .collect();

    let mut total_awarded = 0;
    for result in futures::future::join_all(tasks).await {
        total_awarded += result.unwrap().unwrap().len();
    }

    assert_eq!(total_awarded, 2);
    assert_eq!(h.store.award_count("u-1"), 2);
    assert_eq!(h.store.credit_balance_of("u-1"), Some(10));
    assert_eq!(h.sink.count_of(NotificationKind::BadgeAwarded), 2);
}

#[tokio::test]
async fn test_malformed_badge_is_skipped() {
    let h = harness();
    h.store
        .upsert_user(StatSnapshot::new("u-1", "alice").with_sessions(3, 3));
    h.store.add_badge(Badge::new("坏数据", BadgeType::Special, json!({"karma": 1})));
    let good = h
        .store
        .add_badge(Badge::new("新人", BadgeType::Achievement, json!({"sessions": 1})));

    let awarded = h.engine.check_and_award_badges("u-1").await.unwrap();

    assert_eq!(awarded.len(), 1);
    assert_eq!(awarded[0].badge_id, good.id);
}

#[tokio::test]
async fn test_award_for_unknown_user() {
    let h = harness();
    let err = h.engine.check_and_award_badges("ghost").await.unwrap_err();
    assert!(matches!(err, GamificationError::UserNotFound(_)));
}

#[tokio::test]
async fn test_user_badges_and_pin() {
    let h = harness();
    h.store.upsert_user(
        StatSnapshot::new("u-1", "alice")
            .with_sessions(4, 0)
            .with_ratings(4.8, 4.6),
    );
    let rated = h
        .store
        .add_badge(Badge::new("好评如潮", BadgeType::Quality, json!({"rating": 4.5})).with_rarity(5));
    h.store
        .add_badge(Badge::new("起步", BadgeType::Achievement, json!({"total_sessions": 1})));

    h.engine.check_and_award_badges("u-1").await.unwrap();

    let all = h.engine.get_user_badges("u-1").await.unwrap();
    assert_eq!(all.len(), 2);

    let quality = h.engine.get_user_badges_by_type("u-1", "quality").await.unwrap();
    assert_eq!(quality.len(), 1);
    assert_eq!(quality[0].badge_id, rated.id);

    h.engine.pin_badge("u-1", rated.id, true).await.unwrap();
    let pinned: Vec<_> = h
        .engine
        .get_user_badges("u-1")
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.is_pinned)
        .collect();
    assert_eq!(pinned.len(), 1);

    let err = h.engine.pin_badge("u-1", 9999, true).await.unwrap_err();
    assert!(err.is_not_found());

    // 徽章聚合反映到统计快照
    let leaderboard = h.engine.get_leaderboard("rarity", 10).await.unwrap();
    assert_eq!(leaderboard[0].score, 6.0);
}

// ==================== 学习进度与里程碑 ====================

#[tokio::test]
async fn test_progress_jump_and_regression() {
    let h = harness();
    h.store.upsert_user(StatSnapshot::new("u-1", "alice"));
    let skill_id = h.store.add_skill("Rust");

    let first = h.engine.update_progress("u-1", skill_id, 0, 0.0).await.unwrap();
    assert_eq!(first.progress.progress_percentage, 0.0);
    assert_eq!(first.milestones.len(), 5);
    assert_eq!(first.achieved_count(), 0);

    let jumped = h.engine.update_progress("u-1", skill_id, 3, 0.0).await.unwrap();
    assert_eq!(jumped.progress.progress_percentage, 60.0);
    let achieved: Vec<f64> = jumped
        .milestones
        .iter()
        .filter(|m| m.is_achieved)
        .map(|m| m.progress_threshold)
        .collect();
    assert_eq!(achieved, vec![10.0, 25.0, 50.0]);
    assert!(jumped.milestones.iter().filter(|m| m.is_achieved).all(|m| m.achieved_at.is_some()));
    assert_eq!(jumped.next_milestone().map(|m| m.progress_threshold), Some(75.0));
    assert_eq!(h.sink.count_of(NotificationKind::MilestoneAchieved), 3);

    let regressed = h.engine.update_progress("u-1", skill_id, 2, 0.0).await.unwrap();
    assert_eq!(regressed.progress.progress_percentage, 40.0);
    assert_eq!(regressed.achieved_count(), 3);
    assert_eq!(h.sink.count_of(NotificationKind::MilestoneAchieved), 3);

    let stored = h.engine.get_progress("u-1", skill_id).await.unwrap();
    assert_eq!(stored.progress.sessions_completed, 2);
    assert_eq!(stored.achieved_count(), 3);
}

#[tokio::test]
async fn test_first_update_achieves_milestones() {
    let h = harness();
    h.store.upsert_user(StatSnapshot::new("u-1", "alice"));
    let skill_id = h.store.add_skill("Go");

    let detail = h.engine.update_progress("u-1", skill_id, 10, 52.0).await.unwrap();

    assert_eq!(detail.progress.progress_percentage, 100.0);
    assert_eq!(detail.progress.current_level, SkillLevel::Expert);
    assert_eq!(detail.achieved_count(), 5);
    assert!(detail.next_milestone().is_none());
    assert_eq!(h.sink.count_of(NotificationKind::MilestoneAchieved), 5);
}

#[tokio::test]
async fn test_very_large_hours_cap_at_expert() {
    let h = harness();
    h.store.upsert_user(StatSnapshot::new("u-1", "alice"));
    let skill_id = h.store.add_skill("Haskell");

    let detail = h.engine.update_progress("u-1", skill_id, 0, 200_000.0).await.unwrap();

    assert_eq!(detail.progress.progress_percentage, 100.0);
    assert_eq!(detail.progress.current_level, SkillLevel::Expert);
    assert_eq!(detail.progress.total_hours_spent, 200_000.0);
    assert_eq!(detail.progress.estimated_completion_at, detail.progress.last_activity_at);
}

#[tokio::test]
async fn test_progress_errors() {
    let h = harness();
    h.store.upsert_user(StatSnapshot::new("u-1", "alice"));

    let err = h.engine.update_progress("u-1", 777, 1, 1.0).await.unwrap_err();
    assert!(matches!(err, GamificationError::SkillNotFound(777)));

    let skill_id = h.store.add_skill("Python");
    let err = h.engine.get_progress("u-1", skill_id).await.unwrap_err();
    assert!(err.is_not_found());

    let err = h.engine.update_progress("u-1", skill_id, -1, 1.0).await.unwrap_err();
    assert!(matches!(err, GamificationError::Validation(_)));
}

#[tokio::test]
async fn test_progress_summary() {
    let h = harness();
    h.store.upsert_user(StatSnapshot::new("u-1", "alice"));
    let rust = h.store.add_skill("Rust");
    let go = h.store.add_skill("Go");

    h.engine.update_progress("u-1", rust, 3, 2.0).await.unwrap(); // 70%
    h.engine.update_progress("u-1", go, 1, 1.0).await.unwrap(); // 25%

    let summary = h.engine.get_user_progress_summary("u-1").await.unwrap();
    assert_eq!(summary.total_skills_learning, 2);
    assert_eq!(summary.average_progress, 47.5);
    assert_eq!(summary.total_hours_spent, 3.0);
    assert_eq!(summary.skill_progresses[0].progress.skill_id, rust);
}

// ==================== 排行榜 ====================

#[tokio::test]
async fn test_leaderboard_limits() {
    let h = harness();
    for i in 1..=150 {
        h.store
            .upsert_user(StatSnapshot::new(format!("u{i}"), format!("user {i}")).with_sessions(i, 1));
    }

    let default = h.engine.get_leaderboard("sessions", 0).await.unwrap();
    assert_eq!(default.len(), 10);
    assert_eq!(default[0].user_id, "u150");
    assert_eq!(default[0].rank, 1);
    assert_eq!(default[0].score, 151.0);
    assert_eq!(default[0].dimension, LeaderboardDimension::Sessions);

    let clamped = h.engine.get_leaderboard("sessions", 500).await.unwrap();
    assert_eq!(clamped.len(), 100);

    let err = h.engine.get_leaderboard("streak", 10).await.unwrap_err();
    assert!(matches!(err, GamificationError::InvalidDimension(_)));
}

#[tokio::test]
async fn test_leaderboard_ties_keep_enumeration_order() {
    let h = harness();
    h.store
        .upsert_user(StatSnapshot::new("zoe", "Zoe").with_credits(20.0, 0.0));
    h.store
        .upsert_user(StatSnapshot::new("adam", "Adam").with_credits(20.0, 0.0));
    h.store
        .upsert_user(StatSnapshot::new("mia", "Mia").with_credits(35.0, 0.0));
    h.store.upsert_user(StatSnapshot::new("idle", "Idle"));

    let board = h.engine.get_leaderboard("credits", 10).await.unwrap();
    let ids: Vec<_> = board.iter().map(|e| e.user_id.as_str()).collect();

    assert_eq!(ids, vec!["mia", "zoe", "adam"]);
    assert_eq!(board[1].username, "Zoe");
}
