//! File records and the metadata store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::db::DbPool;
use crate::{FileboxError, Result};

/// Metadata for one stored file.
///
/// Serializing a record never includes `private_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// External handle.
    pub public_id: String,
    /// Storage key; never exposed to clients.
    #[serde(skip_serializing)]
    pub private_id: String,
    /// Uploader-supplied email.
    #[serde(rename = "email")]
    pub owner_email: String,
    /// Uploader-supplied label.
    pub label: String,
    /// Filename as supplied by the client.
    pub original_filename: String,
    /// Storage extension (with dot), possibly empty.
    pub file_extension: String,
    /// Resolved MIME type.
    pub content_type: String,
    /// Measured size in bytes.
    pub file_size: u64,
    /// When the record was inserted.
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// Name of the stored file under the storage root.
    pub fn stored_name(&self) -> String {
        format!("{}{}", self.private_id, self.file_extension)
    }
}

/// Data for inserting a new file record.
///
/// `created_at` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub public_id: String,
    pub private_id: String,
    pub owner_email: String,
    pub label: String,
    pub original_filename: String,
    pub file_extension: String,
    pub content_type: String,
    pub file_size: u64,
}

/// Persistent table of file records keyed by public identifier.
///
/// Every operation is atomic with respect to concurrent callers. There is
/// deliberately no update operation: records are immutable once inserted.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a record.
    ///
    /// Fails with [`FileboxError::DuplicateIdentifier`] if either identifier
    /// is already in use.
    async fn insert(&self, record: &NewFileRecord) -> Result<FileRecord>;

    /// Look up a record by public identifier.
    ///
    /// Fails with [`FileboxError::NotFound`] if absent.
    async fn get(&self, public_id: &str) -> Result<FileRecord>;

    /// Delete a record by public identifier.
    ///
    /// Fails with [`FileboxError::NotFound`] if absent.
    async fn delete(&self, public_id: &str) -> Result<()>;
}

/// Raw `files` row.
#[derive(Debug, sqlx::FromRow)]
struct FileRow {
    public_id: String,
    private_id: String,
    email: String,
    label: String,
    original_filename: String,
    file_extension: String,
    content_type: String,
    file_size: i64,
    created_at: String,
}

impl TryFrom<FileRow> for FileRecord {
    type Error = FileboxError;

    fn try_from(row: FileRow) -> Result<Self> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                FileboxError::Database(format!(
                    "invalid created_at for {}: {e}",
                    row.public_id
                ))
            })?;
        let file_size = u64::try_from(row.file_size).map_err(|_| {
            FileboxError::Database(format!("negative file_size for {}", row.public_id))
        })?;

        Ok(FileRecord {
            public_id: row.public_id,
            private_id: row.private_id,
            owner_email: row.email,
            label: row.label,
            original_filename: row.original_filename,
            file_extension: row.file_extension,
            content_type: row.content_type,
            file_size,
            created_at,
        })
    }
}

/// SQLite-backed [`MetadataStore`].
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: DbPool,
}

impl FileRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for FileRepository {
    async fn insert(&self, record: &NewFileRecord) -> Result<FileRecord> {
        if record.public_id == record.private_id {
            return Err(FileboxError::DuplicateIdentifier(format!(
                "public and private identifiers are equal: {}",
                record.public_id
            )));
        }

        let file_size = i64::try_from(record.file_size).map_err(|_| {
            FileboxError::InvalidInput(format!("file size {} is too large", record.file_size))
        })?;
        let created_at = Utc::now();

        // The key constraints cover each column alone; the guard also keeps a
        // public id from reusing another row's private id and vice versa.
        // One statement, so the write lock is taken up front.
        let inserted = sqlx::query(
            "INSERT INTO files (public_id, private_id, email, label, original_filename,
                                file_extension, content_type, file_size, created_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?
             WHERE NOT EXISTS (
                 SELECT 1 FROM files
                 WHERE public_id IN (?, ?) OR private_id IN (?, ?)
             )",
        )
        .bind(&record.public_id)
        .bind(&record.private_id)
        .bind(&record.owner_email)
        .bind(&record.label)
        .bind(&record.original_filename)
        .bind(&record.file_extension)
        .bind(&record.content_type)
        .bind(file_size)
        .bind(created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(&record.public_id)
        .bind(&record.private_id)
        .bind(&record.public_id)
        .bind(&record.private_id)
        .execute(&self.pool)
        .await;

        let duplicate = match inserted {
            Ok(result) => result.rows_affected() == 0,
            Err(e) => {
                let unique = e
                    .as_database_error()
                    .map(|db| db.is_unique_violation())
                    .unwrap_or(false);
                if !unique {
                    return Err(e.into());
                }
                true
            }
        };
        if duplicate {
            return Err(FileboxError::DuplicateIdentifier(format!(
                "identifier already in use: {}",
                record.public_id
            )));
        }

        self.get(&record.public_id).await
    }

    async fn get(&self, public_id: &str) -> Result<FileRecord> {
        let row = sqlx::query_as::<_, FileRow>(
            "SELECT public_id, private_id, email, label, original_filename,
                    file_extension, content_type, file_size, created_at
             FROM files WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FileboxError::NotFound(format!("file {public_id}")))?;

        row.try_into()
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM files WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FileboxError::NotFound(format!("file {public_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup_repo() -> (Database, FileRepository) {
        let db = Database::open_in_memory().await.unwrap();
        let repo = FileRepository::new(db.pool().clone());
        (db, repo)
    }

    async fn row_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    fn new_record(public_id: &str, private_id: &str) -> NewFileRecord {
        NewFileRecord {
            public_id: public_id.to_string(),
            private_id: private_id.to_string(),
            owner_email: "owner@example.com".to_string(),
            label: "resume".to_string(),
            original_filename: "resume.pdf".to_string(),
            file_extension: ".pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_size: 1024,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (_db, repo) = setup_repo().await;
        let before = Utc::now();

        let record = repo.insert(&new_record("pub-1", "priv-1")).await.unwrap();

        assert_eq!(record.public_id, "pub-1");
        assert_eq!(record.private_id, "priv-1");
        assert_eq!(record.owner_email, "owner@example.com");
        assert_eq!(record.label, "resume");
        assert_eq!(record.original_filename, "resume.pdf");
        assert_eq!(record.file_extension, ".pdf");
        assert_eq!(record.content_type, "application/pdf");
        assert_eq!(record.file_size, 1024);
        assert!(record.created_at >= before - chrono::Duration::seconds(1));

        let found = repo.get("pub-1").await.unwrap();
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let (_db, repo) = setup_repo().await;

        let result = repo.get("missing").await;
        assert!(matches!(result, Err(FileboxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_duplicate_public_id() {
        let (_db, repo) = setup_repo().await;
        repo.insert(&new_record("pub-1", "priv-1")).await.unwrap();

        let result = repo.insert(&new_record("pub-1", "priv-2")).await;
        assert!(matches!(result, Err(FileboxError::DuplicateIdentifier(_))));
    }

    #[tokio::test]
    async fn test_insert_duplicate_private_id() {
        let (db, repo) = setup_repo().await;
        repo.insert(&new_record("pub-1", "priv-1")).await.unwrap();

        let result = repo.insert(&new_record("pub-2", "priv-1")).await;
        assert!(matches!(result, Err(FileboxError::DuplicateIdentifier(_))));
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_insert_crossed_identifiers() {
        let (_db, repo) = setup_repo().await;
        repo.insert(&new_record("id-a", "id-b")).await.unwrap();

        let result = repo.insert(&new_record("id-b", "id-c")).await;
        assert!(matches!(result, Err(FileboxError::DuplicateIdentifier(_))));

        let result = repo.insert(&new_record("id-c", "id-a")).await;
        assert!(matches!(result, Err(FileboxError::DuplicateIdentifier(_))));
    }

    #[tokio::test]
    async fn test_insert_equal_identifiers() {
        let (_db, repo) = setup_repo().await;

        let result = repo.insert(&new_record("same", "same")).await;
        assert!(matches!(result, Err(FileboxError::DuplicateIdentifier(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_db, repo) = setup_repo().await;
        repo.insert(&new_record("pub-1", "priv-1")).await.unwrap();

        repo.delete("pub-1").await.unwrap();

        assert!(matches!(repo.get("pub-1").await, Err(FileboxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (_db, repo) = setup_repo().await;

        let result = repo.delete("missing").await;
        assert!(matches!(result, Err(FileboxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (_db, repo) = setup_repo().await;
        repo.insert(&new_record("pub-1", "priv-1")).await.unwrap();

        repo.delete("pub-1").await.unwrap();
        let result = repo.delete("pub-1").await;
        assert!(matches!(result, Err(FileboxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_zero_size_and_empty_extension() {
        let (_db, repo) = setup_repo().await;
        let mut record = new_record("pub-1", "priv-1");
        record.file_size = 0;
        record.file_extension = String::new();
        record.content_type = "application/octet-stream".to_string();

        let stored = repo.insert(&record).await.unwrap();
        assert_eq!(stored.file_size, 0);
        assert_eq!(stored.file_extension, "");
        assert_eq!(stored.stored_name(), "priv-1");
    }

    #[test]
    fn test_serialization_hides_private_id() {
        let record = FileRecord {
            public_id: "pub-1".to_string(),
            private_id: "secret-private".to_string(),
            owner_email: "owner@example.com".to_string(),
            label: "label".to_string(),
            original_filename: "a.txt".to_string(),
            file_extension: ".txt".to_string(),
            content_type: "text/plain".to_string(),
            file_size: 3,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["public_id"], "pub-1");
        assert_eq!(json["email"], "owner@example.com");
        assert_eq!(json["file_size"], 3);
        assert!(json.get("private_id").is_none());
        assert!(!json.to_string().contains("secret-private"));
    }

    #[test]
    fn test_stored_name() {
        let record = FileRecord {
            public_id: "p".to_string(),
            private_id: "abc".to_string(),
            owner_email: String::new(),
            label: String::new(),
            original_filename: String::new(),
            file_extension: ".pdf".to_string(),
            content_type: String::new(),
            file_size: 0,
            created_at: Utc::now(),
        };
        assert_eq!(record.stored_name(), "abc.pdf");
    }
}
