//! `SQLite` document store, so uploads survive restarts.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::documents::errors::DocumentResult;
use crate::documents::store::{DocumentStore, StoreFuture};

const TABLE: &str = "user_documents";

/// `SQLite` implementation of the document store.
pub struct SqliteDocumentStore {
    conn: Connection,
    table: String,
}

impl SqliteDocumentStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub async fn open(path: &Path) -> DocumentResult<Self> {
        let conn = Connection::open(path).await?;
        Self::init(conn).await
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be created.
    pub async fn open_in_memory() -> DocumentResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> DocumentResult<Self> {
        let table = TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    user_id TEXT PRIMARY KEY,
                    text TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn put<'a>(&'a self, user_id: &'a str, text: String) -> StoreFuture<'a, DocumentResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let user_id = user_id.to_string();
            let updated_at = Utc::now().timestamp_millis();

            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT OR REPLACE INTO {table} (user_id, text, updated_at)
                             VALUES (?1, ?2, ?3)"
                        ),
                        rusqlite::params![user_id, text, updated_at],
                    )?;
                    Ok(())
                })
                .await?;

            Ok(())
        })
    }

    fn get<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, DocumentResult<Option<Arc<str>>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let user_id = user_id.to_string();

            let text: Option<String> = self
                .conn
                .call(move |conn| {
                    let text = conn
                        .query_row(
                            &format!("SELECT text FROM {table} WHERE user_id = ?1"),
                            rusqlite::params![user_id],
                            |row| row.get(0),
                        )
                        .optional()?;
                    Ok(text)
                })
                .await?;

            Ok(text.map(Arc::from))
        })
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
