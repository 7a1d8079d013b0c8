//! SQLite HistoryRepository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DomainError, Result};
use crate::geo::{decode_point, encode_point};
use crate::interfaces::{AddRecordRequest, DistanceQuery, HistoryRepository, Record};
use crate::storage::StorageError;
use crate::storage::schema::{Records, CREATE_RECORDS_TABLE};

/// SQLite implementation of HistoryRepository.
pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    /// Create a new SQLite history repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_RECORDS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| DomainError::internal(format!("stored timestamp out of range: {micros}")))
}

/// Lower window bound in stored micros, rounded up so that no record
/// earlier than `from` is admitted.
fn lower_bound_micros(from: &DateTime<Utc>) -> i64 {
    let micros = from.timestamp_micros();
    if from.timestamp_subsec_nanos() % 1_000 != 0 {
        micros.saturating_add(1)
    } else {
        micros
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn add_record(&self, req: AddRecordRequest) -> Result<Record> {
        for point in [&req.a, &req.b] {
            if !point.longitude.is_finite() || !point.latitude.is_finite() {
                return Err(DomainError::invalid_argument(format!(
                    "non-finite coordinate {point}"
                )));
            }
        }

        let micros = req.timestamp.timestamp_micros();

        let query = Query::insert()
            .into_table(Records::Table)
            .columns([Records::UserId, Records::A, Records::B, Records::Timestamp])
            .values_panic([
                req.user_id.into(),
                encode_point(&req.a).into(),
                encode_point(&req.b).into(),
                micros.into(),
            ])
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let id = result.last_insert_rowid();
        debug!(id, user_id = req.user_id, "Record stored");

        Ok(Record {
            id,
            user_id: req.user_id,
            a: req.a,
            b: req.b,
            timestamp: from_micros(micros)?,
        })
    }

    async fn get_distance(&self, query: DistanceQuery) -> Result<f64> {
        let sql = {
            let mut select = Query::select();
            select
                .columns([Records::A, Records::B])
                .from(Records::Table)
                .and_where(Expr::col(Records::UserId).eq(query.user_id));

            if let Some(from) = query.from {
                select.and_where(Expr::col(Records::Timestamp).gte(lower_bound_micros(&from)));
            }
            if let Some(to) = query.to {
                select.and_where(Expr::col(Records::Timestamp).lte(to.timestamp_micros()));
            }

            select
                .order_by(Records::Timestamp, Order::Asc)
                .to_string(SqliteQueryBuilder)
        };

        let mut rows = sqlx::query(&sql).fetch(&self.pool);
        let mut total = 0.0;
        let mut segments = 0u64;

        while let Some(row) = rows.try_next().await.map_err(StorageError::from)? {
            let a: String = row.try_get(0).map_err(StorageError::from)?;
            let b: String = row.try_get(1).map_err(StorageError::from)?;
            total += decode_point(&a)?.distance_to(&decode_point(&b)?);
            segments += 1;
        }

        debug!(user_id = query.user_id, segments, total, "Distance aggregated");
        Ok(total)
    }
}
