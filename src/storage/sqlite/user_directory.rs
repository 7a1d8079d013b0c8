//! SQLite UserDirectory implementation.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::interfaces::{UserDirectory, UserId};
use crate::storage::StorageError;
use crate::storage::schema::{Users, CREATE_USERS_TABLE};

/// SQLite implementation of UserDirectory.
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// Insert users, renaming any whose id already exists.
    pub async fn seed<'a>(&self, users: impl IntoIterator<Item = (UserId, &'a str)>) -> Result<()> {
        for (id, username) in users {
            let query = Query::insert()
                .into_table(Users::Table)
                .columns([Users::Id, Users::Username])
                .values_panic([id.into(), username.into()])
                .on_conflict(
                    OnConflict::column(Users::Id)
                        .update_column(Users::Username)
                        .to_owned(),
                )
                .to_string(SqliteQueryBuilder);

            sqlx::query(&query)
                .execute(&self.pool)
                .await
                .map_err(StorageError::from)?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn resolve(&self, username: &str) -> Result<Option<UserId>> {
        let query = Query::select()
            .column(Users::Id)
            .from(Users::Table)
            .and_where(Expr::col(Users::Username).eq(username))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let id = row
            .map(|row| row.try_get::<UserId, _>(0))
            .transpose()
            .map_err(StorageError::from)?;
        Ok(id)
    }
}
