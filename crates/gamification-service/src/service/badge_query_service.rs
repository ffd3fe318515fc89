//! 徽章查询服务
//!
//! 徽章目录、用户已获得徽章的查询，以及徽章置顶

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::{GamificationError, Result};
use crate::models::{Badge, BadgeType};
use crate::repository::{BadgeRepository, UserBadgeRepository};
use crate::service::dto::UserBadgeDto;

/// 徽章查询服务
pub struct BadgeQueryService<BR, UBR>
where
    BR: BadgeRepository,
    UBR: UserBadgeRepository,
{
    badge_repo: Arc<BR>,
    user_badge_repo: Arc<UBR>,
}

impl<BR, UBR> BadgeQueryService<BR, UBR>
where
    BR: BadgeRepository,
    UBR: UserBadgeRepository,
{
    pub fn new(badge_repo: Arc<BR>, user_badge_repo: Arc<UBR>) -> Self {
        Self {
            badge_repo,
            user_badge_repo,
        }
    }

    /// 获取全部徽章定义
    pub async fn list_badges(&self) -> Result<Vec<Badge>> {
        self.badge_repo.list_badges().await
    }

    /// 获取徽章定义
    pub async fn get_badge(&self, badge_id: i64) -> Result<Badge> {
        self.badge_repo
            .get_badge(badge_id)
            .await?
            .ok_or(GamificationError::BadgeNotFound(badge_id))
    }

    /// 获取用户已获得的徽章，按获得时间倒序
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user_badges(&self, user_id: &str) -> Result<Vec<UserBadgeDto>> {
        let user_badges = self.user_badge_repo.list_user_badges(user_id).await?;
        if user_badges.is_empty() {
            return Ok(Vec::new());
        }

        let catalog: HashMap<i64, Badge> = self
            .badge_repo
            .list_badges()
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        let dtos = user_badges
            .iter()
            .filter_map(|ub| match catalog.get(&ub.badge_id) {
                Some(badge) => Some(UserBadgeDto::from_parts(ub, badge)),
                None => {
                    warn!(badge_id = ub.badge_id, "用户徽章引用的徽章定义不存在");
                    None
                }
            })
            .collect();

        Ok(dtos)
    }

    /// 按徽章类型筛选用户徽章
    pub async fn get_user_badges_by_type(
        &self,
        user_id: &str,
        badge_type: &str,
    ) -> Result<Vec<UserBadgeDto>> {
        let badge_type: BadgeType = badge_type.parse()?;
        let badges = self.get_user_badges(user_id).await?;

        Ok(badges
            .into_iter()
            .filter(|b| b.badge_type == badge_type)
            .collect())
    }

    /// 设置徽章置顶状态
    ///
    /// 用户未持有该徽章时返回 `UserBadgeNotFound`
    #[instrument(skip(self), fields(user_id = %user_id, badge_id = badge_id))]
    pub async fn pin_badge(&self, user_id: &str, badge_id: i64, pinned: bool) -> Result<()> {
        if !self.user_badge_repo.set_pinned(user_id, badge_id, pinned).await? {
            return Err(GamificationError::UserBadgeNotFound {
                user_id: user_id.to_string(),
                badge_id,
            });
        }

        info!(pinned = pinned, "徽章置顶状态已更新");
        Ok(())
    }
}
