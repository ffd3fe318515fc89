//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;
use crate::error::{InfraError, Result};

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    server_handle: tokio::task::JoinHandle<()>,
}

impl Drop for MetricsHandle {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| InfraError::Observability(e.to_string()))?;

    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle { server_handle })
}

/// 注册业务指标描述
///
/// 这些描述会出现在 /metrics 端点的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!(
        "gamification_badges_awarded_total",
        "Total number of badges awarded"
    );
    metrics::describe_counter!(
        "gamification_award_duplicates_total",
        "Award attempts skipped because the badge was already held"
    );
    metrics::describe_counter!(
        "gamification_requirement_errors_total",
        "Badges skipped because of malformed requirement data"
    );
    metrics::describe_counter!(
        "gamification_milestones_achieved_total",
        "Total number of milestones achieved"
    );
    metrics::describe_counter!(
        "gamification_progress_updates_total",
        "Total number of skill progress updates"
    );
    metrics::describe_counter!(
        "gamification_leaderboard_queries_total",
        "Total number of leaderboard queries"
    );
    metrics::describe_counter!(
        "gamification_notification_failures_total",
        "Notifications that could not be delivered to the sink"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| InfraError::Observability(e.to_string()))?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 业务指标记录函数
// ============================================================================

/// 记录徽章发放
#[inline]
pub fn record_badge_awarded(badge_id: i64) {
    metrics::counter!(
        "gamification_badges_awarded_total",
        "badge_id" => badge_id.to_string()
    )
    .increment(1);
}

/// 记录重复发放（幂等跳过）
#[inline]
pub fn record_award_duplicate() {
    metrics::counter!("gamification_award_duplicates_total").increment(1);
}

/// 记录徽章条件数据异常
#[inline]
pub fn record_requirement_error(badge_id: i64, reason: &str) {
    metrics::counter!(
        "gamification_requirement_errors_total",
        "badge_id" => badge_id.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 记录里程碑达成
#[inline]
pub fn record_milestone_achieved(threshold: f64) {
    metrics::counter!(
        "gamification_milestones_achieved_total",
        "threshold" => format!("{threshold}")
    )
    .increment(1);
}

/// 记录学习进度更新
#[inline]
pub fn record_progress_update(created: bool) {
    metrics::counter!(
        "gamification_progress_updates_total",
        "created" => created.to_string()
    )
    .increment(1);
}

/// 记录排行榜查询
#[inline]
pub fn record_leaderboard_query(dimension: &str) {
    metrics::counter!(
        "gamification_leaderboard_queries_total",
        "dimension" => dimension.to_string()
    )
    .increment(1);
}

/// 记录通知投递失败
#[inline]
pub fn record_notification_failure(kind: &str) {
    metrics::counter!(
        "gamification_notification_failures_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}
