//! HTTP API.
//!
//! All routes live under `/api` and speak JSON. Success bodies carry
//! `{"success": true, "data": ...}`; failures carry
//! `{"success": false, "error": <message>, "code": <error code>}`.
//!
//! Tracker calls are synchronous store work and run on the blocking pool.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::core::alerts::AlertQuery;
use crate::core::period::BudgetPeriod;
use crate::core::provider::{Provider, RequestType};
use crate::core::simulate;
use crate::core::tracker::{UsageRequest, UsageTracker};
use crate::error::{ErrorCategory, Result, SpendError};
use crate::server::auth;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    tracker: Arc<UsageTracker>,
    cron_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(tracker: UsageTracker, cron_secret: Option<String>) -> Self {
        Self {
            tracker: Arc::new(tracker),
            cron_secret: cron_secret.map(Arc::from),
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    /// Run a tracker operation on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&UsageTracker) -> Result<T> + Send + 'static,
    {
        let tracker = Arc::clone(&self.tracker);
        tokio::task::spawn_blocking(move || op(&tracker))
            .await
            .map_err(|e| SpendError::Other(anyhow::anyhow!("blocking task failed: {e}")))?
    }

    fn authorize_cron(&self, headers: &HeaderMap) -> Result<()> {
        if auth::authorize(headers, self.cron_secret.as_deref()) {
            Ok(())
        } else {
            warn!("Rejected cron request with missing or invalid bearer token");
            Err(SpendError::Unauthorized)
        }
    }
}

/// Build the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/usage", post(track_usage_handler))
        .route("/api/track-usage", post(track_usage_handler))
        .route("/api/usage/{provider}", get(usage_report_handler))
        .route(
            "/api/budget/{provider}",
            get(get_budget_handler).put(put_budget_handler),
        )
        .route("/api/alerts", get(alerts_handler))
        .route("/api/alerts/{id}/read", post(mark_alert_read_handler))
        .route("/api/cron/monthly-reset", post(monthly_reset_handler))
        .route("/api/cron/budget-check", post(budget_check_handler))
        .route("/api/openai/chat", post(openai_chat_handler))
        .route("/api/gemini/generate", post(gemini_generate_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

impl IntoResponse for SpendError {
    fn into_response(self) -> Response {
        match self.category() {
            ErrorCategory::Storage | ErrorCategory::Internal | ErrorCategory::Configuration => {
                error!(code = self.error_code(), error = %self, "Request failed");
            }
            _ => {}
        }
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "success": false,
            "error": self.client_message(),
            "code": self.error_code(),
        });
        (status, Json(body)).into_response()
    }
}

fn ok(data: impl serde::Serialize) -> Result<Json<Value>> {
    Ok(Json(json!({ "success": true, "data": data })))
}

/// Parse a JSON object body; an empty body reads as `{}`.
fn parse_object(body: &Bytes) -> Result<serde_json::Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SpendError::InvalidRequest(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(SpendError::InvalidRequest(e.to_string())),
    }
}

fn query_or_invalid<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(q)| q)
        .map_err(|e| SpendError::InvalidRequest(e.body_text()))
}

fn non_empty_str<'a>(body: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[derive(Debug, Default, Deserialize)]
struct PeriodQuery {
    month: Option<String>,
    year: Option<String>,
}

impl PeriodQuery {
    fn resolve(&self, current: BudgetPeriod) -> Result<BudgetPeriod> {
        let year = self
            .year
            .as_deref()
            .map(str::trim)
            .filter(|y| !y.is_empty())
            .map(|y| {
                y.parse::<i32>()
                    .map_err(|_| SpendError::InvalidPeriod(format!("invalid year '{y}'")))
            })
            .transpose()?;
        BudgetPeriod::resolve(self.month.as_deref(), year, current)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertsParams {
    limit: Option<String>,
    unread_only: Option<String>,
    provider: Option<String>,
}

impl AlertsParams {
    fn to_query(&self) -> Result<AlertQuery> {
        let mut query = AlertQuery::default();
        if let Some(raw) = self.limit.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let limit: usize = raw
                .parse()
                .map_err(|_| SpendError::invalid_field("limit", "must be a positive integer"))?;
            query = query.with_limit(limit);
        }
        query.unread_only = self.unread_only.as_deref().is_some_and(is_truthy);
        query.provider = self
            .provider
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Provider::from_cli_name)
            .transpose()?;
        Ok(query)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Liveness plus a best-effort store ping; a failed ping never fails the check.
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let backend = state.tracker.store().backend_name();
    let storage_status = match state.run(|t| t.store().ping()).await {
        Ok(()) => "ok",
        Err(e) => {
            warn!(backend, error = %e, "Storage health check failed");
            "unavailable"
        }
    };
    Json(json!({
        "status": "OK",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "storage": backend,
        "storageStatus": storage_status,
    }))
}

async fn dashboard_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    ok(state.run(UsageTracker::dashboard).await?)
}

/// Build a usage request from a loosely typed JSON body.
fn usage_request_from_body(body: &Bytes) -> Result<UsageRequest> {
    let body = parse_object(body)?;

    let provider = non_empty_str(&body, "provider");
    let model = non_empty_str(&body, "model");
    let tokens = body.get("tokens").filter(|v| !v.is_null());

    let missing: Vec<&str> = [
        ("provider", provider.is_none()),
        ("model", model.is_none()),
        ("tokens", tokens.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(provider), Some(model), Some(tokens)) = (provider, model, tokens) else {
        return Err(SpendError::MissingFields(missing.join(", ")));
    };

    let tokens = token_count(tokens)
        .ok_or_else(|| SpendError::invalid_field("tokens", "must be a non-negative integer"))?;
    let provider = Provider::from_cli_name(provider)?;
    let request_type = body
        .get("requestType")
        .and_then(Value::as_str)
        .map_or(RequestType::Input, RequestType::from_arg_lenient);

    Ok(UsageRequest::new(provider, model, tokens).with_request_type(request_type))
}

/// Non-negative integer, also accepting whole-number floats such as `1000.0`.
///
/// Oversized floats saturate; the tracker rejects them against its bound.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn token_count(value: &Value) -> Option<u64> {
    if let Some(tokens) = value.as_u64() {
        return Some(tokens);
    }
    let float = value.as_f64()?;
    (float >= 0.0 && float.fract() == 0.0).then_some(float as u64)
}

async fn track_usage_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let request = usage_request_from_body(&body)?;
    let tracked = state.run(move |t| t.track_usage(&request)).await?;
    ok(tracked)
}

async fn usage_report_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    query: std::result::Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let provider = Provider::from_cli_name(&provider)?;
    let period = query_or_invalid(query)?.resolve(state.tracker.current_period())?;
    ok(state.run(move |t| t.usage_report(provider, period)).await?)
}

async fn get_budget_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    query: std::result::Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let provider = Provider::from_cli_name(&provider)?;
    let period = query_or_invalid(query)?.resolve(state.tracker.current_period())?;
    ok(state.run(move |t| t.budget_snapshot(provider, period)).await?)
}

/// `budgetLimit` as a JSON number or a numeric string.
fn budget_limit_from_body(body: &Bytes) -> Result<f64> {
    let body = parse_object(body)?;
    let limit = match body.get("budgetLimit") {
        None | Some(Value::Null) => return Err(SpendError::MissingFields("budgetLimit".into())),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    limit.ok_or_else(|| SpendError::invalid_field("budgetLimit", "must be a positive number"))
}

async fn put_budget_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    query: std::result::Result<Query<PeriodQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Value>> {
    let provider = Provider::from_cli_name(&provider)?;
    let period = query_or_invalid(query)?.resolve(state.tracker.current_period())?;
    let limit = budget_limit_from_body(&body)?;
    let record = state
        .run(move |t| t.set_budget(provider, period, limit))
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Budget updated for {provider}"),
        "data": {
            "provider": record.provider,
            "month": record.month,
            "year": record.year,
            "budgetLimit": record.budget_limit,
        },
    })))
}

async fn alerts_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<AlertsParams>, QueryRejection>,
) -> Result<Json<Value>> {
    let query = query_or_invalid(query)?.to_query()?;
    ok(state.run(move |t| t.alerts(&query)).await?)
}

async fn mark_alert_read_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| SpendError::invalid_field("id", "must be an integer"))?;
    state.run(move |t| t.mark_alert_read(id)).await?;
    ok(json!({ "id": id, "isRead": true }))
}

async fn monthly_reset_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    state.authorize_cron(&headers)?;
    let outcomes = state.run(UsageTracker::monthly_reset).await?;
    info!(
        created = outcomes.iter().filter(|o| o.action.is_created()).count(),
        "Monthly reset requested"
    );
    Ok(Json(json!({
        "success": true,
        "message": "Monthly reset completed",
        "data": outcomes,
    })))
}

async fn budget_check_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    state.authorize_cron(&headers)?;
    ok(state.run(UsageTracker::evaluate_all).await?)
}

/// Track the estimated usage of a simulated call and return a canned reply.
async fn simulated_call(state: AppState, provider: Provider, body: Bytes) -> Json<Value> {
    let content = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("content").and_then(Value::as_str).map(str::to_owned));
    let tokens = simulate::estimate_tokens(content.as_deref());
    let request = UsageRequest::new(provider, provider.simulated_model(), tokens);

    if let Err(e) = state.run(move |t| t.track_usage(&request)).await {
        warn!(provider = %provider, error = %e, "Failed to track simulated call");
    }
    Json(simulate::canned_response(provider, chrono::Utc::now()))
}

async fn openai_chat_handler(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    simulated_call(state, Provider::OpenAI, body).await
}

async fn gemini_generate_handler(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    simulated_call(state, Provider::Gemini, body).await
}

async fn not_found_handler() -> SpendError {
    SpendError::RouteNotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::{AlertRecord, AlertSeverity, NewAlert};
    use crate::core::models::{BudgetRecord, NewUsageEvent, ProviderTotals, UsageAggregate};
    use crate::core::pricing::PricingTable;
    use crate::core::tracker::TrackerSettings;
    use crate::storage::UsageStore;
    use crate::test_utils::make_test_tracker;
    use axum::body::Body;
    use chrono::{DateTime, Utc};
    use tracing_test::traced_test;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state(secret: Option<&str>) -> AppState {
        AppState::new(make_test_tracker(), secret.map(str::to_string))
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    /// Store whose every call fails.
    struct DownStore;

    fn down<T>() -> Result<T> {
        Err(SpendError::storage("connect", "database is locked"))
    }

    impl UsageStore for DownStore {
        fn backend_name(&self) -> &'static str {
            "down"
        }
        fn ping(&self) -> Result<()> {
            down()
        }
        fn record_usage(&self, _: &NewUsageEvent) -> Result<i64> {
            down()
        }
        fn monthly_totals(&self, _: Provider, _: BudgetPeriod) -> Result<Vec<UsageAggregate>> {
            down()
        }
        fn provider_totals(&self, _: Provider, _: BudgetPeriod) -> Result<ProviderTotals> {
            down()
        }
        fn set_limit(&self, _: Provider, _: BudgetPeriod, _: f64, _: DateTime<Utc>) -> Result<BudgetRecord> {
            down()
        }
        fn create_budget_if_absent(
            &self,
            _: Provider,
            _: BudgetPeriod,
            _: f64,
            _: DateTime<Utc>,
        ) -> Result<Option<BudgetRecord>> {
            down()
        }
        fn get_budget(&self, _: Provider, _: BudgetPeriod) -> Result<Option<BudgetRecord>> {
            down()
        }
        fn record_alert(&self, _: &NewAlert) -> Result<i64> {
            down()
        }
        fn list_alerts(&self, _: &AlertQuery) -> Result<Vec<AlertRecord>> {
            down()
        }
        fn unread_alert_count(&self) -> Result<u64> {
            down()
        }
        fn last_alert_at(&self, _: Provider, _: AlertSeverity, _: BudgetPeriod) -> Result<Option<DateTime<Utc>>> {
            down()
        }
        fn mark_alert_read(&self, _: i64) -> Result<bool> {
            down()
        }
    }

    fn down_state() -> AppState {
        let tracker = UsageTracker::new(
            Arc::new(DownStore),
            PricingTable::builtin(),
            TrackerSettings::default(),
        );
        AppState::new(tracker, None)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, json) = send(create_router(test_state(None)), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["storage"], "memory");
        assert_eq!(json["storageStatus"], "ok");
    }

    #[tokio::test]
    #[traced_test]
    async fn health_stays_up_when_store_is_down() {
        let (status, json) = send(create_router(down_state()), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["storage"], "down");
        assert_eq!(json["storageStatus"], "unavailable");
        assert!(logs_contain("Storage health check failed"));

        let (status, json) = send(create_router(down_state()), "GET", "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn track_usage_prices_request() {
        let router = create_router(test_state(None));
        let (status, json) = send(
            router,
            "POST",
            "/api/usage",
            Some(r#"{"provider":"openai","model":"gpt-3.5-turbo","tokens":1000}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!((json["data"]["cost"].as_f64().unwrap() - 0.0015).abs() < 1e-12);
        assert_eq!(json["data"]["requestType"], "input");
        assert_eq!(json["data"]["status"], "normal");
    }

    #[tokio::test]
    async fn track_usage_accepts_whole_float_tokens() {
        let router = create_router(test_state(None));
        let (status, json) = send(
            router,
            "POST",
            "/api/usage",
            Some(r#"{"provider":"openai","model":"gpt-3.5-turbo","tokens":1000.0}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["tokens"], 1000);
    }

    #[tokio::test]
    async fn oversized_tokens_are_rejected_and_store_stays_usable() {
        let state = test_state(None);
        for tokens in [
            u64::MAX.to_string(),
            (crate::core::tracker::MAX_TOKENS_PER_REQUEST + 1).to_string(),
            "1e30".to_string(),
        ] {
            let body = format!(r#"{{"provider":"openai","model":"gpt-4","tokens":{tokens}}}"#);
            let (status, json) = send(create_router(state.clone()), "POST", "/api/usage", Some(&body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "tokens: {tokens}");
            assert_eq!(json["code"], "SPW-V002");
        }

        let (status, _) = send(
            create_router(state.clone()),
            "POST",
            "/api/usage",
            Some(r#"{"provider":"openai","model":"gpt-4","tokens":1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, json) = send(create_router(state), "GET", "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"][0]["totalTokens"], 1);
    }

    #[tokio::test]
    async fn track_usage_missing_fields() {
        let router = create_router(test_state(None));
        let (status, json) = send(router, "POST", "/api/track-usage", Some(r#"{"model":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "SPW-V001");
        assert_eq!(json["error"], "Missing required fields: provider, tokens");
    }

    #[tokio::test]
    async fn track_usage_rejects_bad_tokens_and_provider() {
        let state = test_state(None);
        for body in [
            r#"{"provider":"openai","model":"gpt-4","tokens":-5}"#,
            r#"{"provider":"openai","model":"gpt-4","tokens":"ten"}"#,
            r#"{"provider":"openai","model":"gpt-4","tokens":10.5}"#,
            r#"{"provider":"anthropic","model":"x","tokens":5}"#,
            "not json",
        ] {
            let (status, json) = send(create_router(state.clone()), "POST", "/api/usage", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json["success"], false);
        }
    }

    #[tokio::test]
    async fn put_budget_then_read_it_back() {
        let state = test_state(None);
        let (status, json) = send(
            create_router(state.clone()),
            "PUT",
            "/api/budget/gemini",
            Some(r#"{"budgetLimit":"25"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Budget updated for gemini");
        assert!((json["data"]["budgetLimit"].as_f64().unwrap() - 25.0).abs() < f64::EPSILON);

        let (_, json) = send(create_router(state), "GET", "/api/budget/gemini", None).await;
        assert!((json["data"]["budgetLimit"].as_f64().unwrap() - 25.0).abs() < f64::EPSILON);
        assert_eq!(json["data"]["month"], "2026-10");
    }

    #[tokio::test]
    async fn put_budget_rejects_non_positive() {
        let state = test_state(None);
        for body in [r#"{"budgetLimit":0}"#, r#"{"budgetLimit":-1}"#, r#"{}"#, r#"{"budgetLimit":"abc"}"#] {
            let (status, _) = send(create_router(state.clone()), "PUT", "/api/budget/openai", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        }
    }

    #[tokio::test]
    async fn usage_report_rejects_mismatched_year() {
        let router = create_router(test_state(None));
        let (status, json) = send(router, "GET", "/api/usage/openai?month=2026-09&year=2025", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "SPW-V004");
    }

    #[tokio::test]
    async fn usage_report_for_numeric_month() {
        let router = create_router(test_state(None));
        let (status, json) = send(router, "GET", "/api/usage/openai?month=9&year=2026", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["month"], "2026-09");
        assert_eq!(json["data"]["usage"], json!([]));
    }

    #[tokio::test]
    async fn cron_requires_secret_when_configured() {
        let state = test_state(Some("s3cret"));
        let (status, json) = send(create_router(state.clone()), "POST", "/api/cron/monthly-reset", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "SPW-A001");

        let req = Request::builder()
            .method("POST")
            .uri("/api/cron/monthly-reset")
            .header("authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let response = create_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn monthly_reset_is_idempotent() {
        let state = test_state(None);
        let (_, first) = send(create_router(state.clone()), "POST", "/api/cron/monthly-reset", None).await;
        assert_eq!(first["data"][0]["action"], "created");
        let (_, second) = send(create_router(state), "POST", "/api/cron/monthly-reset", None).await;
        assert_eq!(second["data"][0]["action"], "alreadyExists");
        assert_eq!(second["data"][1]["action"], "alreadyExists");
    }

    #[tokio::test]
    async fn mark_unknown_alert_is_404() {
        let router = create_router(test_state(None));
        let (status, json) = send(router, "POST", "/api/alerts/42/read", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "SPW-N001");
    }

    #[tokio::test]
    async fn simulated_chat_tracks_usage() {
        let state = test_state(None);
        let (status, json) = send(
            create_router(state.clone()),
            "POST",
            "/api/openai/chat",
            Some(r#"{"content":"hello there"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["object"], "chat.completion");

        let rows = state.tracker().dashboard().unwrap();
        assert_eq!(rows[0].total_requests, 1);
        assert_eq!(rows[0].total_tokens, 3);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let router = create_router(test_state(None));
        let (status, json) = send(router, "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Endpoint not found");
    }
}
