use crate::infra::AppState;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use field_reports::error::AppError;
use field_reports::reports::domain::TenantId;
use field_reports::reports::runner::{RunOptions, RunSummary, SkipBuckets};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/cron/send-daily-summaries", get(send_daily_summaries))
        .route("/test/dry-run", post(dry_run))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "field-reports-api",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok"
    }))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct CronParams {
    /// Restrict the run to tenants configured with exactly this zone string,
    /// so the scheduler can fire once per tenant-local evening.
    pub(crate) tz: Option<String>,
    #[serde(default)]
    pub(crate) force: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RunResponse {
    pub(crate) success: bool,
    pub(crate) date: NaiveDate,
    pub(crate) tenants: usize,
    pub(crate) sent: u32,
    pub(crate) failed: u32,
    pub(crate) skipped: SkipBuckets,
}

impl From<RunSummary> for RunResponse {
    fn from(summary: RunSummary) -> Self {
        Self {
            success: summary.success,
            date: summary.date,
            tenants: summary.tenants,
            sent: summary.sent,
            failed: summary.failed,
            skipped: summary.skipped,
        }
    }
}

pub(crate) async fn send_daily_summaries(
    Query(params): Query<CronParams>,
    Extension(state): Extension<AppState>,
) -> Result<Json<RunResponse>, AppError> {
    let options = RunOptions {
        tz_filter: params.tz,
        force: params.force,
        ..RunOptions::default()
    };

    let summary = state.runner().run(&options).await?;
    Ok(Json(RunResponse::from(summary)))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DryRunRequest {
    pub(crate) tz: Option<String>,
    #[serde(default)]
    pub(crate) tenants: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SkipReasonBreakdown {
    pub(crate) weekend: Vec<String>,
    pub(crate) no_visits: Vec<String>,
    pub(crate) already_sent: Vec<String>,
    pub(crate) lock_error: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DryRunResponse {
    pub(crate) success: bool,
    pub(crate) date: NaiveDate,
    pub(crate) tenants: usize,
    pub(crate) sent: u32,
    pub(crate) failed: u32,
    pub(crate) would_send: u32,
    pub(crate) skipped: SkipBuckets,
    pub(crate) skip_reasons: SkipReasonBreakdown,
}

impl From<RunSummary> for DryRunResponse {
    fn from(summary: RunSummary) -> Self {
        let skip_reasons = SkipReasonBreakdown {
            weekend: summary.skipped.weekend.clone(),
            no_visits: summary.skipped.no_visits.clone(),
            already_sent: summary.skipped.already_sent.clone(),
            lock_error: summary.skipped.lock_unavailable.clone(),
        };
        Self {
            success: summary.success,
            date: summary.date,
            tenants: summary.tenants,
            sent: summary.sent,
            failed: summary.failed,
            would_send: summary.would_send,
            skipped: summary.skipped,
            skip_reasons,
        }
    }
}

pub(crate) async fn dry_run(
    Extension(state): Extension<AppState>,
    body: Option<Json<DryRunRequest>>,
) -> Result<Json<DryRunResponse>, AppError> {
    let request = body.map(|Json(inner)| inner).unwrap_or_default();
    let tenant_filter = if request.tenants.is_empty() {
        None
    } else {
        Some(request.tenants.into_iter().map(TenantId).collect())
    };

    let options = RunOptions {
        tz_filter: request.tz,
        dry_run: true,
        tenant_filter,
        ..RunOptions::default()
    };

    let summary = state.runner().run(&options).await?;
    Ok(Json(DryRunResponse::from(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemorySendLog, InMemoryTenantDirectory, InMemoryVisitStore};
    use axum::body::Body;
    use axum::http::Request;
    use axum_prometheus::PrometheusMetricLayer;
    use chrono::Utc;
    use field_reports::config::MessagingConfig;
    use field_reports::reports::dispatch::WhatsAppDispatcher;
    use field_reports::reports::domain::{
        Salesman, SalesmanId, Tenant, Visit, VisitChannel,
    };
    use metrics_exporter_prometheus::PrometheusHandle;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, OnceLock};
    use std::time::Duration;
    use tower::util::ServiceExt;

    // The Prometheus recorder is process-global, so all tests share one handle.
    fn metrics_handle() -> Arc<PrometheusHandle> {
        static HANDLE: OnceLock<Arc<PrometheusHandle>> = OnceLock::new();
        HANDLE
            .get_or_init(|| {
                let (_layer, handle) = PrometheusMetricLayer::pair();
                Arc::new(handle)
            })
            .clone()
    }

    fn tenant(id: &str, name: &str) -> Tenant {
        Tenant {
            id: TenantId(id.to_string()),
            name: name.to_string(),
            timezone: "Asia/Kolkata".to_string(),
            // Empty weekend set keeps these tests date-independent.
            weekend_days: Vec::new(),
            currency_symbol: "₹".to_string(),
            currency_code: "INR".to_string(),
            active: true,
        }
    }

    fn state() -> AppState {
        let salesmen = vec![
            Salesman {
                id: SalesmanId("s-1".to_string()),
                tenant_id: TenantId("t-1".to_string()),
                name: "Ravi".to_string(),
                phone: "+91 95376 53927".to_string(),
                active: true,
                is_admin: false,
                deleted: false,
            },
            Salesman {
                id: SalesmanId("a-1".to_string()),
                tenant_id: TenantId("t-1".to_string()),
                name: "Meera".to_string(),
                phone: "+91 90000 00002".to_string(),
                active: true,
                is_admin: true,
                deleted: false,
            },
        ];
        let visits = vec![Visit {
            tenant_id: TenantId("t-1".to_string()),
            salesman_id: SalesmanId("s-1".to_string()),
            salesman_name: "Ravi".to_string(),
            channel: VisitChannel::Personal,
            order_value: Some(125_000),
            created_at: Utc::now(),
            branch: None,
            new_customer: true,
            deleted: false,
        }];

        let messaging = MessagingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "test".to_string(),
            session_id: "test".to_string(),
            send_delay: Duration::from_millis(0),
            request_timeout: Duration::from_millis(200),
        };

        AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: metrics_handle(),
            tenants: Arc::new(InMemoryTenantDirectory::new(vec![tenant("t-1", "Acme Traders")])),
            visits: Arc::new(InMemoryVisitStore::new(salesmen, visits)),
            send_log: Arc::new(InMemorySendLog::default()),
            dispatcher: Arc::new(
                WhatsAppDispatcher::new(messaging).expect("dispatcher builds"),
            ),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    #[tokio::test]
    async fn index_reports_service_and_version() {
        let response = router(state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request builds"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["service"], "field-reports-api");
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_flagged() {
        let app_state = state();
        let response = router(app_state.clone())
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        app_state
            .readiness
            .store(true, std::sync::atomic::Ordering::Release);
        let response = router(app_state)
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cron_with_unmatched_timezone_touches_no_tenants() {
        let response = router(state())
            .oneshot(
                Request::builder()
                    .uri("/cron/send-daily-summaries?tz=Antarctica/Troll&force=false")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["tenants"], 0);
        assert_eq!(body["sent"], 0);
    }

    #[tokio::test]
    async fn dry_run_previews_sends_without_dispatching() {
        let response = router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/test/dry-run")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["tenants"], 1);
        assert_eq!(body["sent"], 0);
        // Ravi's personal report plus the admin team report.
        assert_eq!(body["would_send"], 2);
        assert_eq!(body["skip_reasons"]["lock_error"], json!([]));
    }
}
