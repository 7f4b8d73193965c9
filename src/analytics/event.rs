//! Analytics event model and repository.
//!
//! Events are append-only: they are written alongside the mutation they
//! describe (on the same transaction where one exists) and never updated.

use chrono::{DateTime, Utc};
use sqlx::sqlite::Sqlite;
use sqlx::Executor;

use crate::db::parse_sqlite_datetime;
use crate::Result;

/// Event recorded on successful login.
pub const EVENT_USER_LOGIN: &str = "user_login";
/// Event recorded on successful upload.
pub const EVENT_FILE_UPLOAD: &str = "file_upload";
/// Event recorded on file deletion.
pub const EVENT_FILE_DELETED: &str = "file_deleted";
/// Event recorded on file download.
pub const EVENT_FILE_DOWNLOADED: &str = "file_downloaded";

/// A recorded analytics event.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalyticsEvent {
    /// Unique event ID.
    pub id: i64,
    /// Acting user; None for system-generated events.
    pub user_id: Option<i64>,
    /// Free-form event tag ("user_login", "file_upload", ...).
    pub event_type: String,
    /// When the event happened.
    pub timestamp: String,
    /// JSON-serialized payload; schema varies by event type.
    pub details: Option<String>,
}

impl AnalyticsEvent {
    /// Get the timestamp as DateTime<Utc>.
    pub fn timestamp_datetime(&self) -> DateTime<Utc> {
        parse_sqlite_datetime(&self.timestamp)
    }

    /// Parse the details payload as JSON.
    pub fn details_json(&self) -> Option<serde_json::Value> {
        self.details
            .as_deref()
            .and_then(|d| serde_json::from_str(d).ok())
    }
}

/// Data for appending a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Event tag.
    pub event_type: String,
    /// Acting user, if any.
    pub user_id: Option<i64>,
    /// Structured payload.
    pub details: Option<serde_json::Value>,
}

impl NewEvent {
    /// Create a new event with the given type.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            user_id: None,
            details: None,
        }
    }

    /// Attribute the event to a user.
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attach a structured payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Repository for the append-only event log.
///
/// Methods take any SQLite executor so an append can join the caller's
/// transaction.
pub struct EventRepository;

impl EventRepository {
    /// Append an event. Returns the new event id.
    pub async fn record<'e, E>(executor: E, event: &NewEvent) -> Result<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let details = event
            .details
            .as_ref()
            .map(|d| d.to_string());

        let result =
            sqlx::query("INSERT INTO analytics_events (user_id, event_type, details) VALUES (?, ?, ?)")
                .bind(event.user_id)
                .bind(&event.event_type)
                .bind(details)
                .execute(executor)
                .await?;

        Ok(result.last_insert_rowid())
    }

    /// List events newest first, with offset/limit pagination.
    pub async fn list_recent<'e, E>(
        executor: E,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AnalyticsEvent>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let events = sqlx::query_as::<_, AnalyticsEvent>(
            "SELECT id, user_id, event_type, timestamp, details
             FROM analytics_events
             ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(events)
    }

    /// Count events of a given type.
    pub async fn count_by_type<'e, E>(executor: E, event_type: &str) -> Result<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM analytics_events WHERE event_type = ?")
                .bind(event_type)
                .fetch_one(executor)
                .await?;

        Ok(count.0)
    }
}
