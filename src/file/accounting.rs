//! Storage accounting for depot.
//!
//! The per-user storage counter and the analytics event describing a
//! file mutation are written on the caller's transaction, so counter,
//! event and the triggering File row commit or roll back as one unit.

use serde_json::json;
use sqlx::SqliteConnection;

use crate::analytics::{EventRepository, NewEvent, EVENT_FILE_DELETED, EVENT_FILE_UPLOAD};
use crate::{DepotError, Result};

/// Transactional storage-accounting operations.
pub struct Accounting;

impl Accounting {
    /// Apply a signed delta (bytes) to a user's storage counter.
    ///
    /// Returns the new total. The counter is not clamped; a negative
    /// readback means the books are wrong and surfaces as an internal
    /// fault, rolling the enclosing transaction back.
    pub async fn apply_delta(
        conn: &mut SqliteConnection,
        user_id: i64,
        delta: f64,
    ) -> Result<f64> {
        let result = sqlx::query(
            "UPDATE users SET total_storage_used = total_storage_used + ? WHERE id = ?",
        )
        .bind(delta)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DepotError::NotFound("user".to_string()));
        }

        let total: (f64,) = sqlx::query_as("SELECT total_storage_used FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

        if total.0 < 0.0 {
            return Err(DepotError::AccountingInvariant(format!(
                "storage counter for user {user_id} went negative ({})",
                total.0
            )));
        }

        Ok(total.0)
    }

    /// Record a completed upload: increment the owner's counter and
    /// append the `file_upload` event.
    pub async fn record_upload(
        conn: &mut SqliteConnection,
        owner_id: i64,
        file_id: i64,
        size: f64,
        content_type: Option<&str>,
    ) -> Result<()> {
        Self::apply_delta(conn, owner_id, size).await?;

        let event = NewEvent::new(EVENT_FILE_UPLOAD)
            .with_user(owner_id)
            .with_details(json!({
                "file_id": file_id,
                "size": size,
                "content_type": content_type,
            }));
        EventRepository::record(conn, &event).await?;

        Ok(())
    }

    /// Record a file removal: decrement the owner's counter and append
    /// the `file_deleted` event.
    pub async fn record_removal(
        conn: &mut SqliteConnection,
        owner_id: i64,
        file_id: i64,
        size: f64,
    ) -> Result<()> {
        Self::apply_delta(conn, owner_id, -size).await?;

        let event = NewEvent::new(EVENT_FILE_DELETED)
            .with_user(owner_id)
            .with_details(json!({
                "file_id": file_id,
                "size": size,
            }));
        EventRepository::record(conn, &event).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::EVENT_FILE_DELETED;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("acct", "acct@example.com", "hash"))
            .await
            .unwrap();
        (db, user.id)
    }

    async fn storage_of(db: &Database, user_id: i64) -> f64 {
        UserRepository::new(db.pool())
            .get_by_id(user_id)
            .await
            .unwrap()
            .unwrap()
            .total_storage_used
    }

    #[tokio::test]
    async fn test_apply_positive_delta() {
        let (db, user_id) = setup().await;

        let mut conn = db.pool().acquire().await.unwrap();
        let total = Accounting::apply_delta(&mut conn, user_id, 2048.0)
            .await
            .unwrap();
        assert_eq!(total, 2048.0);
        drop(conn);

        assert_eq!(storage_of(&db, user_id).await, 2048.0);
    }

    #[tokio::test]
    async fn test_apply_negative_delta() {
        let (db, user_id) = setup().await;

        let mut conn = db.pool().acquire().await.unwrap();
        Accounting::apply_delta(&mut conn, user_id, 1000.0)
            .await
            .unwrap();
        let total = Accounting::apply_delta(&mut conn, user_id, -400.0)
            .await
            .unwrap();
        assert_eq!(total, 600.0);
    }

    #[tokio::test]
    async fn test_negative_counter_is_an_invariant_violation() {
        let (db, user_id) = setup().await;

        let mut conn = db.pool().acquire().await.unwrap();
        let result = Accounting::apply_delta(&mut conn, user_id, -1.0).await;

        assert!(matches!(result, Err(DepotError::AccountingInvariant(_))));
    }

    #[tokio::test]
    async fn test_apply_delta_unknown_user() {
        let (db, _user_id) = setup().await;

        let mut conn = db.pool().acquire().await.unwrap();
        let result = Accounting::apply_delta(&mut conn, 9999, 10.0).await;

        assert!(matches!(result, Err(DepotError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_upload_writes_counter_and_event() {
        let (db, user_id) = setup().await;

        let mut tx = db.pool().begin().await.unwrap();
        Accounting::record_upload(&mut tx, user_id, 1, 2048.0, Some("application/pdf"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(storage_of(&db, user_id).await, 2048.0);

        let events = crate::analytics::EventRepository::list_recent(db.pool(), 0, 10)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EVENT_FILE_UPLOAD);
        let details = events[0].details_json().unwrap();
        assert_eq!(details["file_id"], 1);
        assert_eq!(details["content_type"], "application/pdf");
    }

    #[tokio::test]
    async fn test_record_removal_writes_counter_and_event() {
        let (db, user_id) = setup().await;

        let mut tx = db.pool().begin().await.unwrap();
        Accounting::record_upload(&mut tx, user_id, 1, 2048.0, None)
            .await
            .unwrap();
        Accounting::record_removal(&mut tx, user_id, 1, 2048.0)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(storage_of(&db, user_id).await, 0.0);
        assert_eq!(
            crate::analytics::EventRepository::count_by_type(db.pool(), EVENT_FILE_DELETED)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_rollback_undoes_counter_and_event() {
        let (db, user_id) = setup().await;

        {
            let mut tx = db.pool().begin().await.unwrap();
            Accounting::record_upload(&mut tx, user_id, 1, 512.0, None)
                .await
                .unwrap();
            // Dropped without commit
        }

        assert_eq!(storage_of(&db, user_id).await, 0.0);
        assert_eq!(
            crate::analytics::EventRepository::count_by_type(db.pool(), EVENT_FILE_UPLOAD)
                .await
                .unwrap(),
            0
        );
    }
}
