//! Analytics handlers for the depot Web API.
//!
//! Per-user stats are available to the authenticated user themself;
//! everything else is admin-only.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::analytics::{AnalyticsService, StatsPeriod, TypeStorage, UploadBucket, UserStats};
use crate::web::dto::{
    ApiResponse, EventInfo, LimitQuery, PaginationQuery, PeriodQuery, UserStorageInfo,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AdminUser, AuthUser};

/// GET /api/analytics/me - The authenticated user's own stats.
pub async fn my_stats(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserStats>>, ApiError> {
    let service = AnalyticsService::new(state.db.pool());
    let stats = service.user_stats(claims.sub).await?;

    Ok(Json(ApiResponse::new(stats)))
}

/// GET /api/analytics/uploads - Upload counts per calendar bucket.
pub async fn upload_stats(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ApiResponse<Vec<UploadBucket>>>, ApiError> {
    let period: StatsPeriod = query.period.parse()?;

    let service = AnalyticsService::new(state.db.pool());
    let stats = service.upload_stats(period).await?;

    Ok(Json(ApiResponse::new(stats)))
}

/// GET /api/analytics/top-users - Users by storage used, descending.
pub async fn top_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<UserStorageInfo>>>, ApiError> {
    let limit = query.limit.clamp(1, 100);

    let service = AnalyticsService::new(state.db.pool());
    let users = service.top_users_by_storage(limit).await?;
    let infos = users.iter().map(UserStorageInfo::from).collect();

    Ok(Json(ApiResponse::new(infos)))
}

/// GET /api/analytics/storage-by-type - Storage grouped by content type.
pub async fn storage_by_type(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
) -> Result<Json<ApiResponse<Vec<TypeStorage>>>, ApiError> {
    let service = AnalyticsService::new(state.db.pool());
    let stats = service.storage_by_content_type().await?;

    Ok(Json(ApiResponse::new(stats)))
}

/// GET /api/analytics/events - The admin event log, newest first.
pub async fn events(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<EventInfo>>>, ApiError> {
    let (offset, limit) = pagination.clamped();

    let service = AnalyticsService::new(state.db.pool());
    let events = service.recent_events(offset, limit).await?;
    let infos = events.iter().map(EventInfo::from).collect();

    Ok(Json(ApiResponse::new(infos)))
}
