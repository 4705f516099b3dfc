use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A restaurant on the platform. Created lazily by the first processor event that
/// references it, or by an administrative insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    /// Builds a restaurant record as it is created implicitly by event ingestion:
    /// name defaults to the id itself until an administrative update supplies one.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let now = Utc::now();
        Self {
            name: id.clone(),
            id,
            is_active: true,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Validates the restaurant id shape required at the API boundary: `res_` prefix,
    /// non-empty suffix, 50 characters or fewer.
    pub fn is_valid_id(id: &str) -> bool {
        id.starts_with("res_") && id.len() > 4 && id.len() <= 50
    }
}
