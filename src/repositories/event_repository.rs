use crate::error::{AppError, Result};
use crate::models::{EventType, ProcessorEvent};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Postgres, Transaction};

/// Repository for the append-only `processor_events` table. `event_id` uniqueness is
/// the sole idempotency key (§3); this repository never updates or deletes a row.
pub struct EventRepository;

impl EventRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_by_event_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: &str,
    ) -> Result<Option<ProcessorEvent>> {
        let row = sqlx::query_as::<_, ProcessorEvent>(
            r#"
            SELECT id, event_id, event_type, occurred_at, restaurant_id, currency,
                   amount_cents, fee_cents, metadata, created_at
            FROM processor_events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Inserts a new event, or returns the existing one if a concurrent request raced
    /// us to the unique index on `event_id` (§4.1 step 4): either way the caller
    /// receives `(event, is_new)`.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: &str,
        event_type: EventType,
        occurred_at: DateTime<Utc>,
        restaurant_id: &str,
        currency: &str,
        amount_cents: i64,
        fee_cents: i64,
        metadata: Option<Value>,
    ) -> Result<(ProcessorEvent, bool)> {
        let inserted = sqlx::query_as::<_, ProcessorEvent>(
            r#"
            INSERT INTO processor_events
                (event_id, event_type, occurred_at, restaurant_id, currency, amount_cents, fee_cents, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (event_id) DO NOTHING
            RETURNING id, event_id, event_type, occurred_at, restaurant_id, currency,
                      amount_cents, fee_cents, metadata, created_at
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(occurred_at)
        .bind(restaurant_id)
        .bind(currency)
        .bind(amount_cents)
        .bind(fee_cents)
        .bind(&metadata)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        match inserted {
            Some(event) => Ok((event, true)),
            None => {
                let existing = self.get_by_event_id(tx, event_id).await?.ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "event {} vanished after conflicting insert",
                        event_id
                    ))
                })?;
                Ok((existing, false))
            }
        }
    }
}

impl Default for EventRepository {
    fn default() -> Self {
        Self::new()
    }
}
