//! SQLite result store.
//!
//! Writes to an `esg_indicators` table, one row per indicator per save.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::error::{ExtractionError, Result};
use crate::traits::store::{RecordFilter, ResultStore, StoredRecord};
use crate::types::result::ExtractionResult;

fn storage_error(e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::Storage(e.to_string().into())
}

/// SQLite-backed result store.
pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    /// Connect and create the schema if missing.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database
    /// - `sqlite://data/esg_data.db?mode=rwc` - File, created if missing
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(storage_error)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(storage_error)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS esg_indicators (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company TEXT NOT NULL,
                year INTEGER NOT NULL,
                indicator TEXT NOT NULL,
                value TEXT,
                numeric_value REAL,
                unit TEXT,
                source_page INTEGER,
                confidence REAL NOT NULL,
                notes TEXT,
                source_text TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_esg_indicators_company_year
                ON esg_indicators(company, year);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: i64,
    company: String,
    year: i64,
    indicator: String,
    value: Option<String>,
    numeric_value: Option<f64>,
    unit: Option<String>,
    source_page: Option<i64>,
    confidence: f64,
    notes: Option<String>,
    source_text: Option<String>,
    created_at: String,
}

impl RecordRow {
    fn into_record(self) -> Result<StoredRecord> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| storage_error(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);
        let year = i32::try_from(self.year)
            .map_err(|e| storage_error(format!("Invalid year {}: {}", self.year, e)))?;

        Ok(StoredRecord {
            id: self.id,
            company: self.company,
            year,
            indicator: self.indicator,
            value: self.value,
            numeric_value: self.numeric_value,
            unit: self.unit,
            source_page: self.source_page,
            confidence: self.confidence,
            notes: self.notes,
            source_text: self.source_text,
            created_at,
        })
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn save(&self, company: &str, year: i32, results: &[ExtractionResult]) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        for result in results {
            let record = StoredRecord::from_result(company, year, result);
            sqlx::query(
                r#"
                INSERT INTO esg_indicators
                    (company, year, indicator, value, numeric_value, unit, source_page,
                     confidence, notes, source_text, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.company)
            .bind(record.year)
            .bind(&record.indicator)
            .bind(&record.value)
            .bind(record.numeric_value)
            .bind(&record.unit)
            .bind(record.source_page)
            .bind(record.confidence)
            .bind(&record.notes)
            .bind(&record.source_text)
            .bind(record.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(results.len())
    }

    async fn records(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, company, year, indicator, value, numeric_value, unit, source_page, \
             confidence, notes, source_text, created_at FROM esg_indicators WHERE 1 = 1",
        );
        if let Some(company) = &filter.company {
            query.push(" AND company = ").push_bind(company.clone());
        }
        if let Some(year) = filter.year {
            query.push(" AND year = ").push_bind(year);
        }
        if let Some(indicator) = &filter.indicator {
            query.push(" AND indicator = ").push_bind(indicator.clone());
        }
        query.push(" ORDER BY id");

        let rows = query
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }
}
