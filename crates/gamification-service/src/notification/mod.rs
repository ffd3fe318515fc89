//! 通知模块
//!
//! 徽章发放和里程碑达成后向用户发送站内通知。通知失败只记录日志和指标，
//! 不影响已完成的发放或里程碑状态

mod sink;
mod types;

pub use sink::{MemoryNotificationSink, NotificationSink, TracingNotificationSink, deliver};
#[cfg(test)]
pub use sink::MockNotificationSink;
pub use types::{Notification, NotificationBuilder, NotificationKind};
