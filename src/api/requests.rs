use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::EventType;

fn default_currency() -> String {
    "PEN".to_string()
}

fn default_min_amount() -> i64 {
    5_000
}

fn is_valid_restaurant_id(id: &str) -> bool {
    id.starts_with("res_")
}

fn is_valid_currency(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

/// A single field-level validation failure, collected (not short-circuited) so a
/// caller sees every problem with a request at once.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Body of `POST /v1/processor/events` (§6).
///
/// `event_type` is deserialized as a raw string rather than the closed `EventType`
/// enum so that an out-of-enum value is a `422 EVENT_INVALID_TYPE` surfaced by
/// `.validate()`, not an opaque 400 from axum's JSON extractor rejecting before any
/// handler code runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorEventCreate {
    pub event_id: String,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub restaurant_id: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub fee_cents: i64,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl ProcessorEventCreate {
    /// Parses `event_type` against the known enum. Returns the `EVENT_INVALID_TYPE`
    /// validation failure message on a miss.
    pub fn parsed_event_type(&self) -> Result<EventType, String> {
        EventType::from_str(&self.event_type)
    }

    /// Validates the wire constraints from §6: `event_id` length, `event_type`
    /// membership, `restaurant_id` shape, `currency` shape, and non-negative amounts.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.event_id.is_empty() || self.event_id.len() > 50 {
            errors.push(ValidationError {
                field: "event_id".to_string(),
                message: "event_id must be between 1 and 50 characters".to_string(),
            });
        }
        if self.parsed_event_type().is_err() {
            errors.push(ValidationError {
                field: "event_type".to_string(),
                message: format!(
                    "event_type must be one of charge_succeeded, refund_succeeded, payout_paid, got {:?}",
                    self.event_type
                ),
            });
        }
        if !is_valid_restaurant_id(&self.restaurant_id) {
            errors.push(ValidationError {
                field: "restaurant_id".to_string(),
                message: "restaurant_id must start with res_".to_string(),
            });
        }
        if !is_valid_currency(&self.currency) {
            errors.push(ValidationError {
                field: "currency".to_string(),
                message: "currency must be a 3-letter uppercase code".to_string(),
            });
        }
        if self.amount_cents < 0 {
            errors.push(ValidationError {
                field: "amount_cents".to_string(),
                message: "amount_cents must be non-negative".to_string(),
            });
        }
        if self.fee_cents < 0 {
            errors.push(ValidationError {
                field: "fee_cents".to_string(),
                message: "fee_cents must be non-negative".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Query parameters for `GET /v1/restaurants/{restaurant_id}/balance`.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceQuery {
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Body of `POST /v1/payouts/run` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRunRequest {
    #[serde(default = "default_currency")]
    pub currency: String,
    pub as_of: NaiveDate,
    #[serde(default = "default_min_amount")]
    pub min_amount: i64,
}

impl PayoutRunRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !is_valid_currency(&self.currency) {
            errors.push(ValidationError {
                field: "currency".to_string(),
                message: "currency must be a 3-letter uppercase code".to_string(),
            });
        }
        if self.min_amount <= 0 {
            errors.push(ValidationError {
                field: "min_amount".to_string(),
                message: "min_amount must be greater than zero".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_event() -> ProcessorEventCreate {
        ProcessorEventCreate {
            event_id: "e1".to_string(),
            event_type: "charge_succeeded".to_string(),
            occurred_at: Utc::now(),
            restaurant_id: "res_a".to_string(),
            currency: "PEN".to_string(),
            amount_cents: 10_000,
            fee_cents: 250,
            metadata: None,
        }
    }

    #[test]
    fn valid_event_passes() {
        assert!(valid_event().validate().is_ok());
    }

    #[test]
    fn rejects_bad_restaurant_id() {
        let mut e = valid_event();
        e.restaurant_id = "abc".to_string();
        assert!(e.validate().is_err());
    }

    #[test]
    fn rejects_unknown_event_type() {
        let mut e = valid_event();
        e.event_type = "chargeback".to_string();
        let errors = e.validate().unwrap_err();
        assert!(errors.iter().any(|err| err.field == "event_type"));
    }

    #[test]
    fn rejects_negative_amount() {
        let mut e = valid_event();
        e.amount_cents = -1;
        assert!(e.validate().is_err());
    }

    #[test]
    fn rejects_bad_currency() {
        let mut e = valid_event();
        e.currency = "pen".to_string();
        assert!(e.validate().is_err());
    }

    #[test]
    fn zero_amount_is_accepted() {
        let mut e = valid_event();
        e.amount_cents = 0;
        assert!(e.validate().is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let body = json!({
            "event_id": "e1",
            "event_type": "charge_succeeded",
            "occurred_at": "2025-12-17T00:00:00Z",
            "restaurant_id": "res_a",
            "amount_cents": 10000,
        });
        let event: ProcessorEventCreate = serde_json::from_value(body).unwrap();
        assert_eq!(event.currency, "PEN");
        assert_eq!(event.fee_cents, 0);
    }

    #[test]
    fn payout_run_request_rejects_zero_min_amount() {
        let req = PayoutRunRequest {
            currency: "PEN".to_string(),
            as_of: NaiveDate::from_ymd_opt(2025, 12, 27).unwrap(),
            min_amount: 0,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn payout_run_request_defaults_min_amount_to_5000() {
        let body = json!({"as_of": "2025-12-27"});
        let req: PayoutRunRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.min_amount, 5_000);
        assert_eq!(req.currency, "PEN");
    }
}
