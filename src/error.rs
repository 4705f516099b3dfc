use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

/// Application-wide error type. Each variant maps to exactly one error code in the
/// API's error envelope; see `into_response_with_path`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("restaurant not found: {0}")]
    RestaurantNotFound(String),

    #[error("business rule violation: {message}")]
    BusinessRule {
        code: &'static str,
        message: String,
        details: Option<Value>,
    },

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn insufficient_balance(restaurant_id: &str, available_cents: i64, required_cents: i64) -> Self {
        AppError::BusinessRule {
            code: "PAYOUT_INSUFFICIENT_BALANCE",
            message: format!(
                "available balance {} is below the required amount {}",
                available_cents, required_cents
            ),
            details: Some(json!({
                "restaurant_id": restaurant_id,
                "available_cents": available_cents,
                "required_cents": required_cents,
            })),
        }
    }

    pub fn payout_already_pending(restaurant_id: &str, currency: &str) -> Self {
        AppError::BusinessRule {
            code: "PAYOUT_ALREADY_PENDING",
            message: format!(
                "restaurant {} already has a pending payout in {}",
                restaurant_id, currency
            ),
            details: Some(json!({
                "restaurant_id": restaurant_id,
                "currency": currency,
            })),
        }
    }

    /// Reclassifies a foreign-key violation against `restaurants` into
    /// `RestaurantNotFound`, mirroring the original system's integrity-error
    /// middleware: the `restaurant_id` is pulled out of the driver's message instead
    /// of requiring every call site to pre-check existence.
    pub fn reclassify_integrity(self) -> Self {
        let AppError::Database(sqlx::Error::Database(db_err)) = &self else {
            return self;
        };
        let message = db_err.message();
        if !message.contains("foreign key constraint") || !message.contains("restaurants") {
            return self;
        }
        match extract_restaurant_id(message) {
            Some(restaurant_id) => AppError::RestaurantNotFound(restaurant_id),
            None => AppError::Integrity(message.to_string()),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "RESOURCE_NOT_FOUND",
            AppError::RestaurantNotFound(_) => "RESTAURANT_NOT_FOUND",
            AppError::BusinessRule { code, .. } => code,
            AppError::Integrity(_) => "INTEGRITY_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) | AppError::RestaurantNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BusinessRule { .. } | AppError::Integrity(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::BusinessRule { details, .. } => details.clone(),
            _ => None,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) => "a database error occurred".to_string(),
            AppError::Internal(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Renders the error envelope with the request path stamped into `meta`,
    /// per the success/error `meta` shape asymmetry.
    pub fn into_response_with_path(self, path: &str) -> Response {
        if matches!(self, AppError::Database(_) | AppError::Internal(_)) {
            tracing::error!(error = %self, "request failed with internal error");
        } else {
            tracing::warn!(error = %self, "request failed");
        }

        let status = self.status();
        let code = self.code();
        let message = self.public_message();
        let details = self.details();

        let body = json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
                "details": details,
            },
            "meta": {
                "timestamp": Utc::now().to_rfc3339(),
                "path": path,
            }
        });

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with_path("")
    }
}

/// Pulls the first `res_...` token out of a driver error message. Stops at the first
/// character that cannot appear in a restaurant id.
fn extract_restaurant_id(message: &str) -> Option<String> {
    let start = message.find("res_")?;
    let rest = &message[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_restaurant_id_from_message() {
        let message = "insert or update on table \"processor_events\" violates foreign key constraint \"processor_events_restaurant_id_fkey\" on table \"restaurants\": Key (restaurant_id)=(res_abc123) is not present in table \"restaurants\".";
        assert_eq!(extract_restaurant_id(message), Some("res_abc123".to_string()));
    }

    #[test]
    fn extract_restaurant_id_returns_none_without_token() {
        assert_eq!(extract_restaurant_id("no match here"), None);
    }
}
