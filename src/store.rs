use anyhow::{Context, Result};
use log::{debug, info, warn};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::config::Provider;
use crate::status::{Status, StatusRecord};

/// Durable table of the last known status per provider.
///
/// Cloning shares the underlying pool: the reconciliation worker holds one
/// handle as the sole writer, the API handlers hold read-only clones. All
/// mutations are single statements, so a reader never observes a row with
/// the old status and the new detail mixed together.
#[derive(Clone)]
pub struct StatusStore {
    pool: SqlitePool,
}

impl StatusStore {
    /// Opens (creating if necessary) the single-file SQLite database and
    /// makes sure the incidents table exists.
    pub async fn open(path: &str) -> Result<Self> {
        info!("Opening status database: {}", path);

        let db_path = std::path::Path::new(path);
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Unable to create data directory {:?}", parent))?;
            }
        }
        if !db_path.exists() {
            debug!("Database file doesn't exist, creating: {}", path);
            std::fs::File::create(db_path)
                .with_context(|| format!("Unable to create database file {}", path))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{}", path))
            .await
            .context("Unable to connect to the status database")?;

        let store = StatusStore { pool };
        store.create_table_if_not_exists().await?;

        info!("Status database ready");
        Ok(store)
    }

    async fn create_table_if_not_exists(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS incidents (
                provider TEXT PRIMARY KEY,
                status   TEXT NOT NULL,
                detail   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Unable to create incidents table")?;

        Ok(())
    }

    /// Seeds one `Unknown` row per configured provider so every provider is
    /// visible from the very first read, even before the first cycle
    /// completes. Existing rows are left untouched.
    pub async fn initialize(&self, providers: &[Provider]) -> Result<()> {
        for provider in providers {
            sqlx::query(
                "INSERT OR IGNORE INTO incidents (provider, status, detail) VALUES (?, ?, ?)",
            )
            .bind(&provider.name)
            .bind(Status::Unknown.as_str())
            .bind("")
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to seed status row for {}", provider.name))?;
        }

        info!("Status table seeded for {} provider(s)", providers.len());
        Ok(())
    }

    /// Records the latest verdict for one provider, last write wins. The
    /// single mutation primitive; only the reconciliation loop calls it.
    pub async fn upsert(&self, provider: &str, status: Status, detail: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO incidents (provider, status, detail)
            VALUES (?, ?, ?)
            ON CONFLICT(provider) DO UPDATE SET
                status = excluded.status,
                detail = excluded.detail
            "#,
        )
        .bind(provider)
        .bind(status.as_str())
        .bind(detail)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to record status for {}", provider))?;

        debug!("Recorded {} = {} ({})", provider, status, detail);
        Ok(())
    }

    /// Point-in-time snapshot of the full table, ordered by provider name.
    pub async fn read_all(&self) -> Result<Vec<StatusRecord>> {
        let rows = sqlx::query("SELECT provider, status, detail FROM incidents ORDER BY provider")
            .fetch_all(&self.pool)
            .await
            .context("Unable to read the status table")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let provider: String = row.get("provider");
            let status: String = row.get("status");
            let status = Status::parse(&status).unwrap_or_else(|| {
                warn!("Unrecognized status {:?} for {}, reading as Unknown", status, provider);
                Status::Unknown
            });

            records.push(StatusRecord {
                provider,
                status,
                detail: row.get("detail"),
            });
        }

        Ok(records)
    }
}
