//! 通知类型定义

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::{Badge, Milestone};

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "badge_awarded")]
    BadgeAwarded,
    #[serde(rename = "achievement")]
    MilestoneAchieved,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadgeAwarded => "badge_awarded",
            Self::MilestoneAchieved => "achievement",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 站内通知
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// 通知唯一标识（UUID v7，按时间有序）
    pub notification_id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// 通知携带的业务数据
    pub data: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            notification_id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            kind,
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// 添加业务数据
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// 业务数据转为 JSON 对象（用于持久化）
    pub fn data_json(&self) -> serde_json::Value {
        json!(self.data)
    }
}

/// 通知构建器
pub struct NotificationBuilder;

impl NotificationBuilder {
    /// 徽章获得通知
    pub fn badge_awarded(user_id: impl Into<String>, badge: &Badge) -> Notification {
        let body = if badge.bonus_credits > 0 {
            format!(
                "您已获得「{}」徽章，并获得 {} 个时间币奖励！",
                badge.name, badge.bonus_credits
            )
        } else {
            format!("您已获得「{}」徽章，快去看看吧！", badge.name)
        };

        Notification::new(user_id, NotificationKind::BadgeAwarded, "恭喜获得新徽章！", body)
            .with_data("badge_id", json!(badge.id))
            .with_data("badge_name", json!(badge.name))
            .with_data("badge_type", json!(badge.badge_type))
            .with_data("bonus_credits", json!(badge.bonus_credits))
    }

    /// 里程碑达成通知
    pub fn milestone_achieved(
        user_id: impl Into<String>,
        skill_id: i64,
        milestone: &Milestone,
    ) -> Notification {
        Notification::new(
            user_id,
            NotificationKind::MilestoneAchieved,
            "达成学习里程碑！",
            format!("您已达成「{}」里程碑：{}", milestone.title, milestone.description),
        )
        .with_data("milestone_id", json!(milestone.id))
        .with_data("skill_id", json!(skill_id))
        .with_data("progress_threshold", json!(milestone.progress_threshold))
    }
}
