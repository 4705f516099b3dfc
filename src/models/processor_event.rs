use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// The three webhook observations this system ingests. The string values are the
/// wire/storage representation (`rename_all = "snake_case"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ChargeSucceeded,
    RefundSucceeded,
    PayoutPaid,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ChargeSucceeded => "charge_succeeded",
            EventType::RefundSucceeded => "refund_succeeded",
            EventType::PayoutPaid => "payout_paid",
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charge_succeeded" => Ok(EventType::ChargeSucceeded),
            "refund_succeeded" => Ok(EventType::RefundSucceeded),
            "payout_paid" => Ok(EventType::PayoutPaid),
            other => Err(format!("unknown event_type: {}", other)),
        }
    }
}

/// An append-only record of a single processor webhook. `event_id` is the sole
/// idempotency key — uniqueness is enforced by the schema, never by application code
/// alone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProcessorEvent {
    pub id: i64,
    pub event_id: String,
    pub event_type: EventType,
    pub occurred_at: DateTime<Utc>,
    pub restaurant_id: String,
    pub currency: String,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}
