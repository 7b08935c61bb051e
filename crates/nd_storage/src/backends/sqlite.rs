use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nd_core::{DocumentStore, Error, Result};
use serde_json::Value;
use sqlx::{sqlite::SqlitePool, Row};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    )
    "#,
    // Add future migrations here
];

pub struct SqliteStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteStore {
    pub async fn new() -> Result<Self> {
        Self::new_with_path(Path::new("digests.db")).await
    }

    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
            .await
            .map_err(|e| Error::Storage(format!("failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn upsert(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        let body = serde_json::to_string(&document)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO documents (collection, id, body)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to upsert document: {}", e)))?;

        Ok(())
    }

    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let row = sqlx::query(
            r#"
            SELECT body FROM documents
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to fetch document: {}", e)))?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let rows = sqlx::query(
            r#"
            SELECT id, body FROM documents
            WHERE collection = ?
            ORDER BY id
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to list collection: {}", e)))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.get("body");
            documents.push((row.get("id"), serde_json::from_str(&body)?));
        }
        Ok(documents)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to delete document: {}", e)))?;

        Ok(())
    }
}
