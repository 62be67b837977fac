use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::api::AppState;

/// `GET /api/metrics`, Prometheus text format.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Registers help text for every metric the service emits.
pub fn describe_metrics() {
    metrics::describe_counter!("gramguard_http_requests_total", "HTTP requests handled");
    metrics::describe_histogram!(
        "gramguard_http_request_duration_seconds",
        metrics::Unit::Seconds,
        "HTTP request latency"
    );
    metrics::describe_counter!(
        "gramguard_comments_total",
        "Comments stored, labelled by whether bullying was detected"
    );
    metrics::describe_counter!(
        "gramguard_comments_rejected_total",
        "Comment submissions refused by the reputation gate"
    );
    metrics::describe_histogram!(
        "gramguard_bullying_score",
        "Classifier output per stored comment"
    );
    metrics::describe_counter!(
        "gramguard_users_restricted_total",
        "Users whose reputation fell below the restriction threshold"
    );
    metrics::describe_counter!(
        "gramguard_follows_rejected_total",
        "Follow requests refused by the reputation gate"
    );
    metrics::describe_counter!("gramguard_users_registered_total", "Accounts created");
    metrics::describe_counter!("gramguard_posts_created_total", "Posts uploaded");
}

const fn outcome(status: u16) -> &'static str {
    if status >= 500 {
        "error"
    } else if status >= 400 {
        "client_error"
    } else {
        "success"
    }
}

/// One span per request plus a single wide event when it finishes.
/// `user_id` is filled in by the auth middleware for protected routes.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        route = matched_path.clone(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status().as_u16();

        // Route templates keep label cardinality bounded.
        let metrics_path = matched_path.as_deref().unwrap_or("unmatched");

        let labels = [
            ("method", method.clone()),
            ("path", metrics_path.to_string()),
            ("status", status.to_string()),
        ];

        metrics::counter!("gramguard_http_requests_total", &labels).increment(1);
        metrics::histogram!("gramguard_http_request_duration_seconds", &labels)
            .record(start.elapsed().as_secs_f64());

        info!(
            event = "http_request_finished",
            duration_ms = duration_ms,
            status_code = status,
            user_agent = %user_agent,
            outcome = outcome(status),
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(
            "default-src 'none'; img-src 'self'; frame-ancestors 'none'; base-uri 'none'",
        ),
    );

    response
}
