//! Read-only analytics aggregations for depot.

use std::str::FromStr;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{User, UserRepository};
use crate::file::FileRepository;
use crate::{DepotError, Result};

use super::event::{AnalyticsEvent, EventRepository, EVENT_FILE_UPLOAD};

/// Calendar bucket size for upload statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPeriod {
    /// One bucket per day.
    Daily,
    /// One bucket per ISO-ish week (year + week number).
    Weekly,
    /// One bucket per month.
    Monthly,
}

impl StatsPeriod {
    /// The SQLite strftime format that names a bucket.
    fn strftime_format(&self) -> &'static str {
        match self {
            StatsPeriod::Daily => "%Y-%m-%d",
            StatsPeriod::Weekly => "%Y-%W",
            StatsPeriod::Monthly => "%Y-%m",
        }
    }
}

impl FromStr for StatsPeriod {
    type Err = DepotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(StatsPeriod::Daily),
            "weekly" => Ok(StatsPeriod::Weekly),
            "monthly" => Ok(StatsPeriod::Monthly),
            other => Err(DepotError::Validation(format!(
                "unknown stats period: {other}"
            ))),
        }
    }
}

/// A single user's usage statistics.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    /// Number of files the user currently stores.
    pub files_uploaded: i64,
    /// Bytes currently stored.
    pub storage_used: f64,
    /// Last login timestamp, if the user ever logged in.
    pub last_login: Option<String>,
}

/// Upload count for one calendar bucket.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UploadBucket {
    /// Bucket label in the period's strftime format.
    pub bucket: String,
    /// Number of uploads in the bucket.
    pub count: i64,
}

/// Storage totals for one content type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TypeStorage {
    /// Client-asserted content type; None where clients sent nothing.
    pub content_type: Option<String>,
    /// Total bytes stored under this type.
    pub total_storage: f64,
    /// Number of files of this type.
    pub file_count: i64,
}

/// Read-only rollups over users, files and the event log.
///
/// Every query tolerates empty data and returns an empty collection,
/// never an error, in that case.
pub struct AnalyticsService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AnalyticsService<'a> {
    /// Create a new AnalyticsService.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Per-user stats: current file count, storage used, last login.
    pub async fn user_stats(&self, user_id: i64) -> Result<UserStats> {
        let user = UserRepository::new(self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| DepotError::NotFound("user".to_string()))?;

        let files_uploaded = FileRepository::count_by_owner(self.pool, user_id).await?;

        Ok(UserStats {
            files_uploaded,
            storage_used: user.total_storage_used,
            last_login: user.last_login,
        })
    }

    /// Upload counts bucketed by calendar period, ascending by bucket.
    ///
    /// Only `file_upload` events count; deletions do not subtract.
    pub async fn upload_stats(&self, period: StatsPeriod) -> Result<Vec<UploadBucket>> {
        let stats = sqlx::query_as::<_, UploadBucket>(
            "SELECT strftime(?, timestamp) AS bucket, COUNT(id) AS count
             FROM analytics_events
             WHERE event_type = ?
             GROUP BY bucket
             ORDER BY bucket ASC",
        )
        .bind(period.strftime_format())
        .bind(EVENT_FILE_UPLOAD)
        .fetch_all(self.pool)
        .await?;

        Ok(stats)
    }

    /// Top users by storage used, descending; ties broken by user id
    /// ascending.
    pub async fn top_users_by_storage(&self, limit: i64) -> Result<Vec<User>> {
        UserRepository::new(self.pool).top_by_storage(limit).await
    }

    /// Storage grouped by content type, descending by total bytes.
    pub async fn storage_by_content_type(&self) -> Result<Vec<TypeStorage>> {
        let stats = sqlx::query_as::<_, TypeStorage>(
            "SELECT content_type,
                    COALESCE(SUM(size), 0) AS total_storage,
                    COUNT(id) AS file_count
             FROM files
             GROUP BY content_type
             ORDER BY total_storage DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(stats)
    }

    /// The admin event log, newest first.
    pub async fn recent_events(&self, offset: i64, limit: i64) -> Result<Vec<AnalyticsEvent>> {
        EventRepository::list_recent(self.pool, offset, limit).await
    }
}
