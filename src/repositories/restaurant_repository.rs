use crate::error::{AppError, Result};
use crate::models::Restaurant;
use sqlx::{PgPool, Postgres, Transaction};

/// Repository for `Restaurant` rows: the only entity created implicitly (by event
/// ingestion) rather than solely through an explicit insert.
pub struct RestaurantRepository {
    pool: PgPool,
}

impl RestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, restaurant_id: &str) -> Result<Option<Restaurant>> {
        let row = sqlx::query_as::<_, Restaurant>(
            "SELECT id, name, is_active, metadata, created_at, updated_at FROM restaurants WHERE id = $1",
        )
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn list_active_restaurant_ids(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM restaurants WHERE is_active = TRUE",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Get-or-create within an already-open transaction, matching §4.1 step 2: the
    /// insert runs in a savepoint so a concurrent-insert conflict only rolls back the
    /// savepoint, never the caller's outer transaction.
    pub async fn get_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
    ) -> Result<(Restaurant, bool)> {
        if let Some(existing) = self.get_by_id_tx(tx, restaurant_id).await? {
            return Ok((existing, false));
        }

        let mut savepoint = tx.begin().await.map_err(AppError::Database)?;
        let inserted = sqlx::query_as::<_, Restaurant>(
            r#"
            INSERT INTO restaurants (id, name)
            VALUES ($1, $1)
            ON CONFLICT (id) DO NOTHING
            RETURNING id, name, is_active, metadata, created_at, updated_at
            "#,
        )
        .bind(restaurant_id)
        .fetch_optional(&mut *savepoint)
        .await
        .map_err(AppError::Database)?;
        savepoint.commit().await.map_err(AppError::Database)?;

        match inserted {
            Some(restaurant) => {
                tracing::info!(restaurant_id, "created new restaurant");
                Ok((restaurant, true))
            }
            None => {
                tracing::info!(restaurant_id, "restaurant already exists (race condition handled)");
                let restaurant = self
                    .get_by_id_tx(tx, restaurant_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "restaurant {} vanished after conflicting insert",
                            restaurant_id
                        ))
                    })?;
                Ok((restaurant, false))
            }
        }
    }

    async fn get_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant_id: &str,
    ) -> Result<Option<Restaurant>> {
        let row = sqlx::query_as::<_, Restaurant>(
            "SELECT id, name, is_active, metadata, created_at, updated_at FROM restaurants WHERE id = $1",
        )
        .bind(restaurant_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
