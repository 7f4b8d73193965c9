//! File metadata types and repository for depot.

use chrono::{DateTime, Utc};
use sqlx::sqlite::Sqlite;
use sqlx::Executor;

use crate::db::parse_sqlite_datetime;
use crate::Result;

const FILE_COLUMNS: &str =
    "id, stored_name, uploaded_name, owner_id, content_type, path, size, uploaded_at";

/// Metadata for a stored file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredFile {
    /// Unique file ID.
    pub id: i64,
    /// Opaque on-disk name (UUID.ext); maps 1:1 to one object.
    pub stored_name: String,
    /// Sanitized display name the user uploaded under.
    pub uploaded_name: String,
    /// Owning user.
    pub owner_id: i64,
    /// Client-asserted content type; never trusted for security decisions.
    pub content_type: Option<String>,
    /// Filesystem location of the object.
    pub path: String,
    /// Object size in bytes.
    pub size: f64,
    /// Upload timestamp.
    pub uploaded_at: String,
}

impl StoredFile {
    /// Get the uploaded_at as DateTime<Utc>.
    pub fn uploaded_at_datetime(&self) -> DateTime<Utc> {
        parse_sqlite_datetime(&self.uploaded_at)
    }
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    /// Opaque on-disk name.
    pub stored_name: String,
    /// Sanitized display name.
    pub uploaded_name: String,
    /// Owning user.
    pub owner_id: i64,
    /// Client-asserted content type.
    pub content_type: Option<String>,
    /// Filesystem location.
    pub path: String,
    /// Object size in bytes.
    pub size: f64,
}

impl NewStoredFile {
    /// Create a new record with the required fields.
    pub fn new(
        stored_name: impl Into<String>,
        uploaded_name: impl Into<String>,
        owner_id: i64,
        path: impl Into<String>,
        size: f64,
    ) -> Self {
        Self {
            stored_name: stored_name.into(),
            uploaded_name: uploaded_name.into(),
            owner_id,
            content_type: None,
            path: path.into(),
            size,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Repository for file metadata operations.
///
/// Methods take any SQLite executor so writes can run on a caller's
/// transaction alongside the accounting updates they belong with.
pub struct FileRepository;

impl FileRepository {
    /// Create a new file record.
    pub async fn create<'e, E>(executor: E, file: &NewStoredFile) -> Result<StoredFile>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "INSERT INTO files (stored_name, uploaded_name, owner_id, content_type, path, size)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {FILE_COLUMNS}"
        );
        let created = sqlx::query_as::<_, StoredFile>(&sql)
            .bind(&file.stored_name)
            .bind(&file.uploaded_name)
            .bind(file.owner_id)
            .bind(&file.content_type)
            .bind(&file.path)
            .bind(file.size)
            .fetch_one(executor)
            .await?;

        Ok(created)
    }

    /// Get a file by ID.
    pub async fn get_by_id<'e, E>(executor: E, id: i64) -> Result<Option<StoredFile>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?");
        let file = sqlx::query_as::<_, StoredFile>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(file)
    }

    /// List a user's files, most recent first.
    pub async fn list_by_owner<'e, E>(
        executor: E,
        owner_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<StoredFile>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?
             ORDER BY uploaded_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let files = sqlx::query_as::<_, StoredFile>(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await?;

        Ok(files)
    }

    /// Count a user's files.
    pub async fn count_by_owner<'e, E>(executor: E, owner_id: i64) -> Result<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(executor)
            .await?;

        Ok(count.0)
    }

    /// Delete a file record by ID.
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("uploader", "uploader@example.com", "hash"))
            .await
            .unwrap();
        (db, user.id)
    }

    fn sample_file(owner_id: i64, stored: &str) -> NewStoredFile {
        NewStoredFile::new(
            stored,
            "report.pdf",
            owner_id,
            format!("data/uploads/{stored}"),
            2048.0,
        )
        .with_content_type("application/pdf")
    }

    #[tokio::test]
    async fn test_create_file() {
        let (db, owner_id) = setup().await;

        let file = FileRepository::create(db.pool(), &sample_file(owner_id, "abc.pdf"))
            .await
            .unwrap();

        assert_eq!(file.stored_name, "abc.pdf");
        assert_eq!(file.uploaded_name, "report.pdf");
        assert_eq!(file.owner_id, owner_id);
        assert_eq!(file.content_type, Some("application/pdf".to_string()));
        assert_eq!(file.size, 2048.0);
        assert!(!file.uploaded_at.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (db, owner_id) = setup().await;

        let created = FileRepository::create(db.pool(), &sample_file(owner_id, "x.pdf"))
            .await
            .unwrap();

        let found = FileRepository::get_by_id(db.pool(), created.id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().stored_name, "x.pdf");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (db, _owner_id) = setup().await;

        let found = FileRepository::get_by_id(db.pool(), 9999).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_by_owner_recency_order() {
        let (db, owner_id) = setup().await;

        for stored in ["a.pdf", "b.pdf", "c.pdf"] {
            FileRepository::create(db.pool(), &sample_file(owner_id, stored))
                .await
                .unwrap();
        }

        let files = FileRepository::list_by_owner(db.pool(), owner_id, 0, 10)
            .await
            .unwrap();

        assert_eq!(files.len(), 3);
        // Same-second timestamps fall back to id DESC, so insertion
        // recency still wins.
        assert_eq!(files[0].stored_name, "c.pdf");
        assert_eq!(files[2].stored_name, "a.pdf");
    }

    #[tokio::test]
    async fn test_list_by_owner_pagination() {
        let (db, owner_id) = setup().await;

        for stored in ["a.pdf", "b.pdf", "c.pdf"] {
            FileRepository::create(db.pool(), &sample_file(owner_id, stored))
                .await
                .unwrap();
        }

        let page = FileRepository::list_by_owner(db.pool(), owner_id, 1, 1)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].stored_name, "b.pdf");
    }

    #[tokio::test]
    async fn test_list_by_owner_empty() {
        let (db, owner_id) = setup().await;

        let files = FileRepository::list_by_owner(db.pool(), owner_id, 0, 10)
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_count_by_owner() {
        let (db, owner_id) = setup().await;
        assert_eq!(
            FileRepository::count_by_owner(db.pool(), owner_id)
                .await
                .unwrap(),
            0
        );

        FileRepository::create(db.pool(), &sample_file(owner_id, "a.pdf"))
            .await
            .unwrap();

        assert_eq!(
            FileRepository::count_by_owner(db.pool(), owner_id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, owner_id) = setup().await;

        let file = FileRepository::create(db.pool(), &sample_file(owner_id, "del.pdf"))
            .await
            .unwrap();

        assert!(FileRepository::delete(db.pool(), file.id).await.unwrap());
        assert!(FileRepository::get_by_id(db.pool(), file.id)
            .await
            .unwrap()
            .is_none());
        // Deleting again affects no rows
        assert!(!FileRepository::delete(db.pool(), file.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_stored_name_unique() {
        let (db, owner_id) = setup().await;

        FileRepository::create(db.pool(), &sample_file(owner_id, "dup.pdf"))
            .await
            .unwrap();

        let mut second = sample_file(owner_id, "dup.pdf");
        second.path = "data/uploads/other".to_string();
        let result = FileRepository::create(db.pool(), &second).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_on_transaction_rolls_back() {
        let (db, owner_id) = setup().await;

        {
            let mut tx = db.pool().begin().await.unwrap();
            FileRepository::create(&mut *tx, &sample_file(owner_id, "tx.pdf"))
                .await
                .unwrap();
            // Dropped without commit
        }

        assert_eq!(
            FileRepository::count_by_owner(db.pool(), owner_id)
                .await
                .unwrap(),
            0
        );
    }
}
