//! 内存存储
//!
//! 使用 DashMap 实现全部存储端口，适用于测试和本地开发。
//! 条件插入通过 entry API 在分片锁内完成，与数据库唯一约束语义一致

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::traits::{
    BadgeRepository, InsertOutcome, ProgressRepository, UserBadgeRepository, UserStatsRepository,
};
use crate::error::{GamificationError, Result};
use crate::models::{Badge, Milestone, SkillProgress, StatSnapshot, UserBadge};

#[derive(Debug, Clone)]
struct UserRecord {
    /// 注册顺序，决定全量快照的枚举顺序
    seq: i64,
    stats: StatSnapshot,
    credit_balance: i64,
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, UserRecord>,
    skills: DashMap<i64, String>,
    badges: DashMap<i64, Badge>,
    user_badges: DashMap<(String, i64), UserBadge>,
    progress: DashMap<(String, i64), SkillProgress>,
    milestones: DashMap<i64, Milestone>,
    sequence: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    // ==================== 数据准备 ====================

    /// 添加或覆盖用户统计
    ///
    /// 快照中的徽章数和稀有度会在读取时由已发放记录重新聚合
    pub fn upsert_user(&self, stats: StatSnapshot) {
        let seq = self.next_id();
        self.users
            .entry(stats.user_id.clone())
            .and_modify(|record| record.stats = stats.clone())
            .or_insert_with(|| UserRecord {
                seq,
                stats: stats.clone(),
                credit_balance: 0,
            });
    }

    /// 原地修改用户统计，用户不存在时返回 false
    pub fn update_user_stats(&self, user_id: &str, update: impl FnOnce(&mut StatSnapshot)) -> bool {
        match self.users.get_mut(user_id) {
            Some(mut record) => {
                update(&mut record.stats);
                true
            }
            None => false,
        }
    }

    pub fn add_skill(&self, name: impl Into<String>) -> i64 {
        let id = self.next_id();
        self.skills.insert(id, name.into());
        id
    }

    /// 添加徽章定义，id 为 0 时自动分配
    pub fn add_badge(&self, mut badge: Badge) -> Badge {
        if badge.id == 0 {
            badge.id = self.next_id();
        }
        self.badges.insert(badge.id, badge.clone());
        badge
    }

    pub fn credit_balance_of(&self, user_id: &str) -> Option<i64> {
        self.users.get(user_id).map(|record| record.credit_balance)
    }

    pub fn award_count(&self, user_id: &str) -> usize {
        self.user_badges
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .count()
    }

    // ==================== 内部辅助 ====================

    fn with_badge_aggregates(&self, mut stats: StatSnapshot) -> StatSnapshot {
        let mut count = 0;
        let mut rarity = 0;
        for entry in self.user_badges.iter().filter(|e| e.key().0 == stats.user_id) {
            count += 1;
            if let Some(badge) = self.badges.get(&entry.value().badge_id) {
                rarity += i64::from(badge.rarity);
            }
        }
        stats.badge_count = count;
        stats.badge_rarity = rarity;
        stats
    }
}

#[async_trait]
impl UserStatsRepository for MemoryStore {
    async fn get_user_stats(&self, user_id: &str) -> Result<StatSnapshot> {
        let stats = self
            .users
            .get(user_id)
            .map(|record| record.stats.clone())
            .ok_or_else(|| GamificationError::UserNotFound(user_id.to_string()))?;

        Ok(self.with_badge_aggregates(stats))
    }

    async fn list_all_user_stats(&self) -> Result<Vec<StatSnapshot>> {
        let mut records: Vec<(i64, StatSnapshot)> = self
            .users
            .iter()
            .map(|entry| (entry.seq, entry.stats.clone()))
            .collect();
        records.sort_by_key(|(seq, _)| *seq);

        Ok(records
            .into_iter()
            .map(|(_, stats)| self.with_badge_aggregates(stats))
            .collect())
    }

    async fn credit_balance(&self, user_id: &str, amount: i64) -> Result<()> {
        let mut record = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| GamificationError::UserNotFound(user_id.to_string()))?;
        record.credit_balance += amount;
        Ok(())
    }
}

#[async_trait]
impl BadgeRepository for MemoryStore {
    async fn list_badges(&self) -> Result<Vec<Badge>> {
        let mut badges: Vec<Badge> = self.badges.iter().map(|e| e.value().clone()).collect();
        badges.sort_by_key(|b| b.id);
        Ok(badges)
    }

    async fn get_badge(&self, badge_id: i64) -> Result<Option<Badge>> {
        Ok(self.badges.get(&badge_id).map(|b| b.clone()))
    }
}

#[async_trait]
impl UserBadgeRepository for MemoryStore {
    async fn has_award(&self, user_id: &str, badge_id: i64) -> Result<bool> {
        Ok(self.user_badges.contains_key(&(user_id.to_string(), badge_id)))
    }

    async fn insert_award_if_absent(
        &self,
        user_id: &str,
        badge_id: i64,
        earned_at: DateTime<Utc>,
    ) -> Result<InsertOutcome<UserBadge>> {
        if !self.users.contains_key(user_id) {
            return Err(GamificationError::UserNotFound(user_id.to_string()));
        }

        let outcome = match self.user_badges.entry((user_id.to_string(), badge_id)) {
            Entry::Occupied(existing) => InsertOutcome::existing(existing.get().clone()),
            Entry::Vacant(slot) => {
                let user_badge = UserBadge {
                    id: self.next_id(),
                    user_id: user_id.to_string(),
                    badge_id,
                    earned_at,
                    is_pinned: false,
                };
                slot.insert(user_badge.clone());
                InsertOutcome::created(user_badge)
            }
        };
        Ok(outcome)
    }

    async fn list_user_badges(&self, user_id: &str) -> Result<Vec<UserBadge>> {
        let mut badges: Vec<UserBadge> = self
            .user_badges
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| e.value().clone())
            .collect();
        badges.sort_by(|a, b| b.earned_at.cmp(&a.earned_at).then(b.id.cmp(&a.id)));
        Ok(badges)
    }

    async fn set_pinned(&self, user_id: &str, badge_id: i64, pinned: bool) -> Result<bool> {
        match self.user_badges.get_mut(&(user_id.to_string(), badge_id)) {
            Some(mut user_badge) => {
                user_badge.is_pinned = pinned;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ProgressRepository for MemoryStore {
    async fn skill_exists(&self, skill_id: i64) -> Result<bool> {
        Ok(self.skills.contains_key(&skill_id))
    }

    async fn load_progress(&self, user_id: &str, skill_id: i64) -> Result<Option<SkillProgress>> {
        Ok(self
            .progress
            .get(&(user_id.to_string(), skill_id))
            .map(|p| p.clone()))
    }

    async fn insert_progress_if_absent(
        &self,
        progress: &SkillProgress,
        milestones: &[Milestone],
    ) -> Result<InsertOutcome<SkillProgress>> {
        let key = (progress.user_id.clone(), progress.skill_id);
        let outcome = match self.progress.entry(key) {
            Entry::Occupied(existing) => InsertOutcome::existing(existing.get().clone()),
            Entry::Vacant(slot) => {
                let mut created = progress.clone();
                created.id = self.next_id();
                // 持有分片锁期间先写里程碑，进度记录可见时里程碑必然已就绪
                for milestone in milestones {
                    let mut stored = milestone.clone();
                    stored.id = self.next_id();
                    stored.skill_progress_id = created.id;
                    self.milestones.insert(stored.id, stored);
                }
                slot.insert(created.clone());
                InsertOutcome::created(created)
            }
        };
        Ok(outcome)
    }

    async fn save_progress(&self, progress: &SkillProgress) -> Result<()> {
        let key = (progress.user_id.clone(), progress.skill_id);
        match self.progress.get_mut(&key) {
            Some(mut stored) if stored.id == progress.id => {
                *stored = progress.clone();
                Ok(())
            }
            _ => Err(GamificationError::ProgressNotFound {
                user_id: progress.user_id.clone(),
                skill_id: progress.skill_id,
            }),
        }
    }

    async fn list_user_progress(&self, user_id: &str) -> Result<Vec<SkillProgress>> {
        let mut progresses: Vec<SkillProgress> = self
            .progress
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| e.value().clone())
            .collect();
        progresses.sort_by_key(|p| p.id);
        Ok(progresses)
    }

    async fn load_milestones(&self, skill_progress_id: i64) -> Result<Vec<Milestone>> {
        let mut milestones: Vec<Milestone> = self
            .milestones
            .iter()
            .filter(|e| e.value().skill_progress_id == skill_progress_id)
            .map(|e| e.value().clone())
            .collect();
        milestones.sort_by(|a, b| {
            a.progress_threshold
                .total_cmp(&b.progress_threshold)
                .then(a.id.cmp(&b.id))
        });
        Ok(milestones)
    }

    async fn save_milestone(&self, milestone: &Milestone) -> Result<bool> {
        if !milestone.is_achieved {
            return Ok(false);
        }
        match self.milestones.get_mut(&milestone.id) {
            Some(mut stored) if !stored.is_achieved => {
                stored.is_achieved = true;
                stored.achieved_at = milestone.achieved_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
