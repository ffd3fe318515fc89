//! 通知投递接口及内置实现

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

use timebank_shared::observability::metrics;

use super::types::{Notification, NotificationKind};
use crate::error::Result;

/// 通知投递接口
///
/// 实现自行负责超时和重试，返回错误时调用方只记录不回滚
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// 尽力投递
///
/// 失败只记录告警和指标，返回是否投递成功
pub async fn deliver<N>(sink: &N, notification: &Notification) -> bool
where
    N: NotificationSink + ?Sized,
{
    match sink.notify(notification).await {
        Ok(()) => true,
        Err(e) => {
            metrics::record_notification_failure(notification.kind.as_str());
            warn!(
                notification_id = %notification.notification_id,
                user_id = %notification.user_id,
                kind = %notification.kind,
                error = %e,
                "通知发送失败"
            );
            false
        }
    }
}

/// 内存通知收集器（测试和本地开发用）
#[derive(Debug, Default)]
pub struct MemoryNotificationSink {
    delivered: Mutex<Vec<Notification>>,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已投递的全部通知（按投递顺序）
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.delivered.lock().iter().filter(|n| n.kind == kind).count()
    }

    pub fn clear(&self) {
        self.delivered.lock().clear();
    }
}

#[async_trait]
impl NotificationSink for MemoryNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.delivered.lock().push(notification.clone());
        Ok(())
    }
}

/// 仅输出日志的通知实现
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            notification_id = %notification.notification_id,
            user_id = %notification.user_id,
            kind = %notification.kind,
            title = %notification.title,
            "发送通知"
        );
        Ok(())
    }
}
