//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use cats_core::domain::{Favourite, Session};
use cats_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::HashSet;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Closes every pooled connection. Called once the server has stopped.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SessionRecord {
    session_id: Uuid,
    last_time_used: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> Session {
        Session {
            id: self.session_id,
            last_used: self.last_time_used,
        }
    }
}

#[derive(FromRow)]
struct FavouriteRecord {
    id: i64,
    image_id: String,
    url: String,
    created_at: DateTime<Utc>,
}
impl FavouriteRecord {
    fn to_domain(self) -> Favourite {
        Favourite {
            id: self.id,
            image_id: self.image_id,
            url: self.url,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn touch_session(&self, session_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("UPDATE sessions SET last_time_used = NOW() WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_session(&self, session_id: Uuid) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO sessions (session_id) VALUES ($1)
            ON CONFLICT (session_id) DO UPDATE SET last_time_used = NOW()
            RETURNING session_id, last_time_used
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_favourites(&self, session_id: Uuid) -> PortResult<Vec<Favourite>> {
        let records = sqlx::query_as::<_, FavouriteRecord>(
            r#"
            SELECT id, image_id, url, created_at
            FROM favourites
            WHERE session_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn favourite_image_ids(&self, session_id: Uuid) -> PortResult<HashSet<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT image_id FROM favourites WHERE session_id = $1")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(ids.into_iter().collect())
    }

    async fn find_favourite(&self, session_id: Uuid, image_id: &str) -> PortResult<Option<Favourite>> {
        let record = sqlx::query_as::<_, FavouriteRecord>(
            "SELECT id, image_id, url, created_at FROM favourites WHERE session_id = $1 AND image_id = $2",
        )
        .bind(session_id)
        .bind(image_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert_favourite(&self, session_id: Uuid, image_id: &str, url: &str) -> PortResult<Favourite> {
        let inserted = sqlx::query_as::<_, FavouriteRecord>(
            r#"
            INSERT INTO favourites (session_id, image_id, url)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id, image_id) DO NOTHING
            RETURNING id, image_id, url, created_at
            "#,
        )
        .bind(session_id)
        .bind(image_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = inserted {
            return Ok(record.to_domain());
        }

        // The unique (session_id, image_id) constraint rejected the row.
        match self.find_favourite(session_id, image_id).await? {
            Some(existing) => Err(PortError::Conflict {
                existing_id: existing.id,
            }),
            None => Err(PortError::Unexpected(format!(
                "Favourite {} for session {} vanished during insert",
                image_id, session_id
            ))),
        }
    }

    async fn delete_favourite(&self, session_id: Uuid, favourite_id: i64) -> PortResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>("DELETE FROM favourites WHERE id = $1 AND session_id = $2 RETURNING id")
            .bind(favourite_id)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)
    }
}
