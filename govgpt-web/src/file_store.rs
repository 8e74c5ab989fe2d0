//! SQLite-backed file and collection storage

use async_trait::async_trait;
use govgpt_core::{CollectionStore, ErrorContext, FileRecord, FileStore, GovGptError, GovGptResult};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};

use crate::{WebError, WebResult};

const FILE_COLUMNS: &str =
    "id, user_id, hash, filename, path, data, meta, access_control, created_at, updated_at";

pub struct SqliteFileStore {
    pool: SqlitePool,
}

impl SqliteFileStore {
    /// Connect and create the tables if needed.
    ///
    /// `sqlite::memory:` URLs get a single long-lived connection so every
    /// query sees the same database.
    pub async fn new(database_url: &str) -> WebResult<Self> {
        tracing::info!("Connecting to file store: {}", database_url);

        let pool = if database_url.starts_with("sqlite:") && !database_url.contains(":memory:") {
            let db_path = database_url
                .strip_prefix("sqlite://")
                .or_else(|| database_url.strip_prefix("sqlite:"))
                .unwrap_or(database_url);

            if let Some(parent) = std::path::Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    tracing::info!("Creating parent directory: {}", parent.display());
                    std::fs::create_dir_all(parent).map_err(|e| {
                        WebError::Database(format!("Failed to create directory: {}", e))
                    })?;
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true);

            SqlitePool::connect_with(options)
                .await
                .map_err(|e| WebError::Database(format!("Failed to connect to database: {}", e)))?
        } else {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(database_url)
                .await
                .map_err(|e| WebError::Database(format!("Failed to connect to database: {}", e)))?
        };

        Self::create_tables(&pool).await?;
        tracing::debug!("File store tables ready");

        Ok(Self { pool })
    }

    async fn create_tables(pool: &SqlitePool) -> WebResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS file (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                hash TEXT,
                filename TEXT NOT NULL,
                path TEXT,
                data TEXT,
                meta TEXT,
                access_control TEXT,
                created_at INTEGER,
                updated_at INTEGER
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| WebError::Database(format!("Failed to create file table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collection_document (
                id TEXT PRIMARY KEY,
                collection_name TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| {
            WebError::Database(format!("Failed to create collection_document table: {}", e))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_collection_document_name ON collection_document (collection_name)",
        )
        .execute(pool)
        .await
        .map_err(|e| WebError::Database(format!("Failed to create collection index: {}", e)))?;

        Ok(())
    }

    pub async fn insert_file(&self, file: &FileRecord) -> WebResult<()> {
        sqlx::query(
            "INSERT INTO file (id, user_id, hash, filename, path, data, meta, access_control, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&file.id)
        .bind(&file.user_id)
        .bind(&file.hash)
        .bind(&file.filename)
        .bind(&file.path)
        .bind(json_column(&file.data)?)
        .bind(json_column(&file.meta)?)
        .bind(json_column(&file.access_control)?)
        .bind(file.created_at)
        .bind(file.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| WebError::Database(format!("Failed to insert file: {}", e)))?;

        tracing::debug!(file_id = %file.id, user_id = %file.user_id, "Stored file");
        Ok(())
    }

    pub async fn find_file(&self, id: &str) -> WebResult<Option<FileRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM file WHERE id = ?", FILE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| WebError::Database(format!("Failed to get file: {}", e)))?;

        row.as_ref().map(file_from_row).transpose()
    }

    /// Files owned by `user_id`, newest first
    pub async fn files_by_user(&self, user_id: &str) -> WebResult<Vec<FileRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM file WHERE user_id = ? ORDER BY created_at DESC, id",
            FILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WebError::Database(format!("Failed to list files: {}", e)))?;

        rows.iter().map(file_from_row).collect()
    }

    /// Returns whether a row was removed
    pub async fn delete_file(&self, id: &str) -> WebResult<bool> {
        let result = sqlx::query("DELETE FROM file WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| WebError::Database(format!("Failed to delete file: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn add_collection_document(
        &self,
        collection_name: &str,
        content: &str,
    ) -> WebResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO collection_document (id, collection_name, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(collection_name)
        .bind(content)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| WebError::Database(format!("Failed to add collection document: {}", e)))?;

        Ok(id)
    }

    pub async fn collection_documents(&self, names: &[String]) -> WebResult<Vec<String>> {
        let mut documents = Vec::new();
        for name in names {
            let rows = sqlx::query(
                "SELECT content FROM collection_document WHERE collection_name = ? ORDER BY created_at, rowid",
            )
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WebError::Database(format!("Failed to read collection: {}", e)))?;

            for row in rows {
                let content: String = row
                    .try_get("content")
                    .map_err(|e| WebError::Database(format!("Invalid collection row: {}", e)))?;
                documents.push(content);
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl FileStore for SqliteFileStore {
    async fn get_file_by_id(&self, id: &str) -> GovGptResult<Option<FileRecord>> {
        self.find_file(id)
            .await
            .map_err(|e| storage_error("get_file_by_id", e))
    }
}

#[async_trait]
impl CollectionStore for SqliteFileStore {
    async fn get_collection_documents(&self, names: &[String]) -> GovGptResult<Vec<String>> {
        self.collection_documents(names)
            .await
            .map_err(|e| storage_error("get_collection_documents", e))
    }
}

fn storage_error(operation: &str, error: WebError) -> GovGptError {
    GovGptError::Storage {
        message: error.to_string(),
        source: Some(Box::new(error)),
        context: ErrorContext::new("file_store").with_operation(operation),
    }
}

fn json_column(value: &Option<serde_json::Value>) -> WebResult<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(WebError::from)
}

fn parse_json_column(row: &SqliteRow, column: &str) -> WebResult<Option<serde_json::Value>> {
    let raw: Option<String> = row
        .try_get(column)
        .map_err(|e| WebError::Database(format!("Invalid {} column: {}", column, e)))?;
    raw.map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(WebError::from)
}

fn file_from_row(row: &SqliteRow) -> WebResult<FileRecord> {
    let column = |e: sqlx::Error| WebError::Database(format!("Invalid file row: {}", e));

    Ok(FileRecord {
        id: row.try_get("id").map_err(column)?,
        user_id: row.try_get("user_id").map_err(column)?,
        hash: row.try_get("hash").map_err(column)?,
        filename: row.try_get("filename").map_err(column)?,
        path: row.try_get("path").map_err(column)?,
        data: parse_json_column(row, "data")?,
        meta: parse_json_column(row, "meta")?,
        access_control: parse_json_column(row, "access_control")?,
        created_at: row.try_get("created_at").map_err(column)?,
        updated_at: row.try_get("updated_at").map_err(column)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, user_id: &str, created_at: i64) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            user_id: user_id.to_string(),
            hash: None,
            filename: format!("{}.pdf", id),
            path: None,
            data: Some(json!({ "content": format!("text of {}", id) })),
            meta: Some(json!({ "content_type": "application/pdf" })),
            access_control: None,
            created_at: Some(created_at),
            updated_at: Some(created_at),
        }
    }

    #[tokio::test]
    async fn test_file_roundtrip_and_listing() {
        let store = SqliteFileStore::new("sqlite::memory:").await.unwrap();
        store.insert_file(&record("a", "user-1", 100)).await.unwrap();
        store.insert_file(&record("b", "user-1", 200)).await.unwrap();
        store.insert_file(&record("c", "user-2", 300)).await.unwrap();

        let found = store.find_file("a").await.unwrap().unwrap();
        assert_eq!(found.content(), Some("text of a"));
        assert_eq!(found.meta, Some(json!({ "content_type": "application/pdf" })));

        let ids: Vec<String> = store
            .files_by_user("user-1")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert!(store.delete_file("a").await.unwrap());
        assert!(!store.delete_file("a").await.unwrap());
        assert!(store.find_file("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collection_documents_keep_order() {
        let store = SqliteFileStore::new("sqlite::memory:").await.unwrap();
        store.add_collection_document("policies", "first").await.unwrap();
        store.add_collection_document("policies", "second").await.unwrap();
        store.add_collection_document("other", "third").await.unwrap();

        let docs = store
            .get_collection_documents(&["policies".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(docs, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_file_backed_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("govgpt.db");
        let url = format!("sqlite:{}", path.display());

        let store = SqliteFileStore::new(&url).await.unwrap();
        store.insert_file(&record("a", "user-1", 1)).await.unwrap();
        assert!(path.exists());
    }
}
