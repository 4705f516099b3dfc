use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::{Payout, PayoutItem, PayoutStatus, ProcessorEvent};
use crate::services::RestaurantBalance;

/// The success envelope's `meta` block (§6). `request_id` is the `x-request-id`
/// assigned by `SetRequestIdLayer`, threaded in by the handler.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Meta {
    pub fn new(request_id: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id,
        }
    }
}

/// Response body for `POST /v1/processor/events`: the full stored event plus
/// `idempotent`, which distinguishes a re-delivery from a first observation (§4.1/§8).
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorEventResponse {
    pub success: bool,
    pub id: i64,
    pub event_id: String,
    pub event_type: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub restaurant_id: String,
    pub currency: String,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub idempotent: bool,
    pub meta: Meta,
}

impl ProcessorEventResponse {
    pub fn new(event: &ProcessorEvent, idempotent: bool, request_id: Option<String>) -> Self {
        Self {
            success: true,
            id: event.id,
            event_id: event.event_id.clone(),
            event_type: event.event_type.as_str(),
            occurred_at: event.occurred_at,
            restaurant_id: event.restaurant_id.clone(),
            currency: event.currency.clone(),
            amount_cents: event.amount_cents,
            fee_cents: event.fee_cents,
            metadata: event.metadata.clone(),
            created_at: event.created_at,
            idempotent,
            meta: Meta::new(request_id),
        }
    }
}

/// Response body for `GET /v1/restaurants/{restaurant_id}/balance` (§4.4).
#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub success: bool,
    pub restaurant_id: String,
    pub currency: String,
    pub available_cents: i64,
    pub pending_cents: i64,
    pub total_cents: i64,
    pub last_event_at: Option<DateTime<Utc>>,
    pub meta: Meta,
}

impl BalanceResponse {
    pub fn new(balance: RestaurantBalance, request_id: Option<String>) -> Self {
        Self {
            success: true,
            restaurant_id: balance.restaurant_id,
            currency: balance.currency,
            available_cents: balance.available_cents,
            pending_cents: balance.pending_cents,
            total_cents: balance.total_cents,
            last_event_at: balance.last_event_at,
            meta: Meta::new(request_id),
        }
    }
}

/// One line of a payout's net-sales/fees/refunds breakdown (§4.3 step 2e).
#[derive(Debug, Clone, Serialize)]
pub struct PayoutItemResponse {
    pub item_type: &'static str,
    pub amount_cents: i64,
}

impl From<&PayoutItem> for PayoutItemResponse {
    fn from(item: &PayoutItem) -> Self {
        Self {
            item_type: item.item_type.as_str(),
            amount_cents: item.amount_cents,
        }
    }
}

/// Response body for `GET /v1/payouts/{payout_id}` and the materialized-payout echo
/// used internally by the generator.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutResponse {
    pub success: bool,
    pub payout_id: i64,
    pub restaurant_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub as_of: NaiveDate,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub items: Vec<PayoutItemResponse>,
    pub meta: Meta,
}

impl PayoutResponse {
    pub fn new(payout: &Payout, items: &[PayoutItem], request_id: Option<String>) -> Self {
        Self {
            success: true,
            payout_id: payout.id,
            restaurant_id: payout.restaurant_id.clone(),
            amount_cents: payout.amount_cents,
            currency: payout.currency.clone(),
            as_of: payout.as_of,
            status: payout.status.as_str(),
            created_at: payout.created_at,
            paid_at: payout.paid_at,
            failure_reason: payout.failure_reason.clone(),
            items: items.iter().map(PayoutItemResponse::from).collect(),
            meta: Meta::new(request_id),
        }
    }
}

/// Response body for `POST /v1/payouts/run` (§6): the batch job is accepted and runs
/// in the background, so this echoes the request rather than a result.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutRunAcceptedResponse {
    pub success: bool,
    pub message: String,
    pub currency: String,
    pub as_of: NaiveDate,
    pub min_amount: i64,
    pub meta: Meta,
}

impl PayoutRunAcceptedResponse {
    pub fn new(currency: &str, as_of: NaiveDate, min_amount: i64, request_id: Option<String>) -> Self {
        Self {
            success: true,
            message: "payout run accepted".to_string(),
            currency: currency.to_string(),
            as_of,
            min_amount,
            meta: Meta::new(request_id),
        }
    }
}

/// Response body for `GET /health` and `GET /health/detailed`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: Value,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
}
