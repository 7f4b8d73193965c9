//! Analytics module for depot.
//!
//! Append-only event logging plus the read-only aggregations served to
//! users and administrators.

mod event;
mod service;

pub use event::{
    AnalyticsEvent, EventRepository, NewEvent, EVENT_FILE_DELETED, EVENT_FILE_DOWNLOADED,
    EVENT_FILE_UPLOAD, EVENT_USER_LOGIN,
};
pub use service::{AnalyticsService, StatsPeriod, TypeStorage, UploadBucket, UserStats};
