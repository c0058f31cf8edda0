use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_http_errors::ApiError;
use sqlx::migrate::Migrator;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tracing::error;

use crate::models::{Address, Booking, BookingStatus, NewBooking};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("booking request {0} not found")]
    NotFound(i32),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored booking is invalid: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ApiError::not_found(
                "booking_not_found",
                format!("Booking request with ID {id} not found."),
            ),
            other => {
                error!(error = %other, "booking repository failure");
                ApiError::Internal
            }
        }
    }
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: NewBooking) -> RepositoryResult<Booking>;
    async fn list(&self) -> RepositoryResult<Vec<Booking>>;
    async fn set_status(&self, id: i32, status: BookingStatus) -> RepositoryResult<Booking>;
    async fn delete(&self, id: i32) -> RepositoryResult<Booking>;
    /// True when every bundled migration has been applied.
    async fn schema_is_current(&self) -> RepositoryResult<bool>;
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: i32,
    event_time: DateTime<Utc>,
    address: Json<Address>,
    topic: String,
    duration_minutes: i16,
    requested_by: String,
    status: String,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<BookingStatus>()
            .map_err(RepositoryError::Corrupt)?;
        Ok(Booking {
            id: row.id,
            event_time: row.event_time,
            address: row.address.0,
            topic: row.topic,
            duration_minutes: row.duration_minutes,
            requested_by: row.requested_by,
            status,
        })
    }
}

const BOOKING_COLUMNS: &str =
    "id, event_time, address, topic, duration_minutes, requested_by, status";

#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create(&self, booking: NewBooking) -> RepositoryResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "INSERT INTO booking_requests (event_time, address, topic, duration_minutes, requested_by, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.event_time)
        .bind(Json(&booking.address))
        .bind(&booking.topic)
        .bind(booking.duration_minutes)
        .bind(&booking.requested_by)
        .bind(BookingStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        Booking::try_from(row)
    }

    async fn list(&self) -> RepositoryResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking_requests ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn set_status(&self, id: i32, status: BookingStatus) -> RepositoryResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE booking_requests SET status = $1 WHERE id = $2 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound(id))?;
        Booking::try_from(row)
    }

    async fn delete(&self, id: i32) -> RepositoryResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "DELETE FROM booking_requests WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound(id))?;
        Booking::try_from(row)
    }

    async fn schema_is_current(&self) -> RepositoryResult<bool> {
        let Some(latest) = MIGRATOR.iter().map(|migration| migration.version).max() else {
            return Ok(true);
        };

        let table: Option<String> =
            sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations')::text")
                .fetch_one(&self.pool)
                .await?;
        if table.is_none() {
            return Ok(false);
        }

        let applied: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
                .fetch_one(&self.pool)
                .await?;
        Ok(applied == Some(latest))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i32,
    rows: BTreeMap<i32, Booking>,
}

/// Process-local repository for tests and local runs.
#[derive(Clone)]
pub struct InMemoryBookingRepository {
    state: Arc<RwLock<MemoryState>>,
    schema_current: Arc<AtomicBool>,
}

impl Default for InMemoryBookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            schema_current: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_schema_current(&self, current: bool) {
        self.schema_current.store(current, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, booking: NewBooking) -> RepositoryResult<Booking> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.next_id += 1;
        let stored = Booking {
            id: state.next_id,
            event_time: booking.event_time,
            address: booking.address,
            topic: booking.topic,
            duration_minutes: booking.duration_minutes,
            requested_by: booking.requested_by,
            status: BookingStatus::Pending,
        };
        state.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> RepositoryResult<Vec<Booking>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.rows.values().cloned().collect())
    }

    async fn set_status(&self, id: i32, status: BookingStatus) -> RepositoryResult<Booking> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let booking = state
            .rows
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        booking.status = status;
        Ok(booking.clone())
    }

    async fn delete(&self, id: i32) -> RepositoryResult<Booking> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.rows.remove(&id).ok_or(RepositoryError::NotFound(id))
    }

    async fn schema_is_current(&self) -> RepositoryResult<bool> {
        Ok(self.schema_current.load(Ordering::SeqCst))
    }
}
