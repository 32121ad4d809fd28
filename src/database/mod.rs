use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::info;

use crate::models::Record;
use crate::traits::RecordSink;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Create database file if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database file");
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePool::connect(db_url).await?;
        Self::migrated(pool).await
    }

    /// Private in-memory database, mostly useful in tests.
    pub async fn in_memory() -> Result<Self> {
        // Every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    /// A sink writing one run's records, keyed by a fresh run id.
    pub fn sink_for_run(&self) -> SqliteSink {
        SqliteSink {
            database: self.clone(),
            run_id: Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string(),
            persisted: 0,
        }
    }

    pub async fn count_records(&self, run_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM records WHERE run_id = ?")
            .bind(run_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("n"))
    }

    async fn save_records(&self, run_id: &str, start: usize, records: &[Record]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for (offset, record) in records.iter().enumerate() {
            let position = i64::try_from(start + offset)?;
            let result = sqlx::query(
                r"
                INSERT OR IGNORE INTO records
                    (run_id, position, id, name, price, rating, review_count,
                     discount_percent, category, collected_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(run_id)
            .bind(position)
            .bind(&record.id)
            .bind(&record.name)
            .bind(record.price)
            .bind(&record.rating)
            .bind(i64::try_from(record.review_count).unwrap_or(i64::MAX))
            .bind(i64::from(record.discount_percent))
            .bind(&record.category)
            .bind(record.collected_at)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

/// Database-backed sink for one run.
///
/// Rows are keyed by their position in the run, so re-flushing an already
/// persisted prefix inserts nothing.
pub struct SqliteSink {
    database: Database,
    run_id: String,
    persisted: usize,
}

impl SqliteSink {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

#[async_trait]
impl RecordSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn flush(&mut self, records: &[Record]) -> Result<()> {
        let start = self.persisted.min(records.len());
        let inserted = self
            .database
            .save_records(&self.run_id, start, &records[start..])
            .await?;

        self.persisted = records.len();
        info!(run_id = %self.run_id, inserted, "stored records");
        Ok(())
    }
}
