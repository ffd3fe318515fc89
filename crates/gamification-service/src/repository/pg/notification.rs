//! 站内通知落库

use async_trait::async_trait;

use super::PgStore;
use crate::error::Result;
use crate::notification::{Notification, NotificationSink};

#[async_trait]
impl NotificationSink for PgStore {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, body, data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&notification.notification_id)
        .bind(&notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.data_json())
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
