use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tower_http::request_id::RequestId;

use crate::api::requests::{BalanceQuery, PayoutRunRequest, ProcessorEventCreate};
use crate::api::responses::{
    BalanceResponse, HealthResponse, LivenessResponse, PayoutResponse, PayoutRunAcceptedResponse,
    ProcessorEventResponse, ReadinessResponse,
};
use crate::error::{AppError, Result};
use crate::models::Restaurant;
use crate::repositories::{EventRepository, LedgerRepository, PayoutRepository, RestaurantRepository};
use crate::services::{BalanceCalculator, EventProcessor, LedgerService, PayoutGenerator};

use super::routes::AppState;

/// Reads the `x-request-id` set by `SetRequestIdLayer` back out for `meta.request_id`.
/// Absent when a handler is invoked directly (as tests do), bypassing the router's
/// middleware stack — that's fine, `Meta::request_id` is optional.
fn request_id_of(extension: &Option<Extension<RequestId>>) -> Option<String> {
    extension
        .as_ref()
        .and_then(|Extension(id)| id.header_value().to_str().ok().map(str::to_string))
}

/// `POST /v1/processor/events` (§6). Ingests a processor webhook idempotently; the
/// whole operation runs in one transaction so a crash mid-way leaves no partial state.
pub async fn process_event(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    Json(request): Json<ProcessorEventCreate>,
) -> Result<(StatusCode, Json<ProcessorEventResponse>)> {
    let request_id = request_id_of(&request_id);
    request
        .validate()
        .map_err(|errors| AppError::Validation(format!("{:?}", errors)))?;
    let event_type = request
        .parsed_event_type()
        .map_err(AppError::Validation)?;

    let processor = EventProcessor::new(
        RestaurantRepository::new(state.pool.clone()),
        EventRepository::new(),
        PayoutRepository::new(state.pool.clone()),
        LedgerRepository::new(state.pool.clone()),
    );

    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;
    let result = processor
        .process_event(
            &mut tx,
            &request.event_id,
            event_type,
            request.occurred_at,
            &request.restaurant_id,
            &request.currency,
            request.amount_cents,
            request.fee_cents,
            request.metadata,
        )
        .await;

    let (event, is_new) = match result {
        Ok(ok) => ok,
        Err(e) => return Err(e.reclassify_integrity()),
    };
    tx.commit().await.map_err(AppError::Database)?;

    let status = if is_new { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(ProcessorEventResponse::new(&event, !is_new, request_id))))
}

/// `GET /v1/restaurants/{restaurant_id}/balance` (§4.4). 404s if the restaurant has
/// never been observed by an event.
pub async fn get_balance(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    Query(query): Query<BalanceQuery>,
    request_id: Option<Extension<RequestId>>,
) -> Result<Json<BalanceResponse>> {
    if !Restaurant::is_valid_id(&restaurant_id) {
        return Err(AppError::Validation("restaurant_id must start with res_".to_string()));
    }

    let restaurant_repo = RestaurantRepository::new(state.pool.clone());
    let restaurant = restaurant_repo
        .get_by_id(&restaurant_id)
        .await?
        .ok_or_else(|| AppError::RestaurantNotFound(restaurant_id.clone()))?;

    let calculator = BalanceCalculator::new(LedgerRepository::new(state.pool.clone()));
    let balance = calculator.get_balance(&restaurant.id, &query.currency).await?;

    Ok(Json(BalanceResponse::new(balance, request_id_of(&request_id))))
}

/// `POST /v1/payouts/run` (§6, §4.3 "Batch"). Accepted immediately; the batch itself
/// runs in the background, one transaction per restaurant, matching the original
/// system's fire-and-forget semantics — a failure here is logged, never bubbled to
/// the caller who has already received 202.
pub async fn run_payouts(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    Json(request): Json<PayoutRunRequest>,
) -> Result<(StatusCode, Json<PayoutRunAcceptedResponse>)> {
    request
        .validate()
        .map_err(|errors| AppError::Validation(format!("{:?}", errors)))?;

    let pool = state.pool.clone();
    let currency = request.currency.clone();
    let as_of = request.as_of;
    let min_amount = request.min_amount;

    tokio::spawn(async move {
        let generator = PayoutGenerator::new(
            RestaurantRepository::new(pool.clone()),
            PayoutRepository::new(pool.clone()),
            LedgerRepository::new(pool.clone()),
            LedgerService::new(LedgerRepository::new(pool.clone())),
        );

        match generator.generate_batch(&pool, &currency, as_of, min_amount).await {
            Ok(created) => tracing::info!(currency = %currency, %as_of, created, "payout run completed"),
            Err(e) => tracing::error!(error = %e, currency = %currency, %as_of, "payout run: failed to list active restaurants"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(PayoutRunAcceptedResponse::new(
            &request.currency,
            request.as_of,
            request.min_amount,
            request_id_of(&request_id),
        )),
    ))
}

/// `GET /v1/payouts/{payout_id}` (§6).
pub async fn get_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<i64>,
    request_id: Option<Extension<RequestId>>,
) -> Result<Json<PayoutResponse>> {
    let payout_repo = PayoutRepository::new(state.pool.clone());

    let payout = payout_repo
        .get_by_id(payout_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("payout {} not found", payout_id)))?;
    let items = payout_repo.get_items(payout.id).await?;

    Ok(Json(PayoutResponse::new(&payout, &items, request_id_of(&request_id))))
}

/// `GET /health` — liveness plus a database check, matching the original system's
/// combined health surface.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let checker = state.health_checker.as_ref();
    let aggregated = match checker {
        Some(checker) => checker.check_all().await,
        None => crate::observability::AggregatedHealth::new(
            env!("CARGO_PKG_VERSION").to_string(),
            0,
            vec![],
        ),
    };

    Json(HealthResponse {
        status: format!("{:?}", aggregated.status).to_lowercase(),
        version: aggregated.version,
        uptime_seconds: aggregated.uptime_seconds,
        dependencies: json!(aggregated.dependencies),
    })
}

/// `GET /health/detailed` — same payload as `health_check`, kept as a distinct route
/// for load balancers that probe it separately.
pub async fn detailed_health_check(state: State<AppState>) -> Json<HealthResponse> {
    health_check(state).await
}

/// `GET /ready`.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let ready = match state.health_checker.as_ref() {
        Some(checker) => checker.is_ready().await,
        None => false,
    };
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ReadinessResponse { ready }))
}

/// `GET /live`.
pub async fn liveness_check() -> Json<LivenessResponse> {
    Json(LivenessResponse { alive: true })
}

/// `GET /metrics` — Prometheus text exposition.
pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    match state.metrics_handle.as_ref() {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}

