//! PostgreSQL implementations of the storage traits.
//!
//! Credential and directory queries only ever use bound parameters. The
//! relational store is the one place caller-supplied SQL reaches the
//! database, and it is wrapped in a read-only transaction that is always
//! rolled back.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::{Column, Postgres, Row, TypeInfo, postgres::PgRow};
use uuid::Uuid;

use super::{CredentialStore, RelationalStore, StoreError, UserDirectory};
use crate::db::DbPool;
use crate::models::{
    credential::{CredentialRecord, NewCredentialRecord},
    principal::Principal,
    query::QueryRow,
};

const CREDENTIAL_COLUMNS: &str = "id, secret_hash, display_prefix, label, description, issued_by, \
     elevated, active, expires_at, last_used_at, created_at, updated_at";

/// Credential store backed by the `credentials` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(
        &self,
        credential: NewCredentialRecord,
    ) -> Result<CredentialRecord, StoreError> {
        let sql = format!(
            "INSERT INTO credentials (
                secret_hash, display_prefix, label, description,
                issued_by, elevated, expires_at, active
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, true)
             RETURNING {CREDENTIAL_COLUMNS}"
        );

        sqlx::query_as::<_, CredentialRecord>(&sql)
            .bind(&credential.secret_hash)
            .bind(&credential.display_prefix)
            .bind(&credential.label)
            .bind(&credential.description)
            .bind(&credential.issued_by)
            .bind(credential.elevated)
            .bind(credential.expires_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotConfirmed)
    }

    async fn find_by_hash(
        &self,
        secret_hash: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE secret_hash = $1");

        let record = sqlx::query_as::<_, CredentialRecord>(&sql)
            .bind(secret_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list(&self, issued_by: Option<&str>) -> Result<Vec<CredentialRecord>, StoreError> {
        let sql = format!(
            "SELECT {CREDENTIAL_COLUMNS}
             FROM credentials
             WHERE ($1::TEXT IS NULL OR issued_by = $1)
             ORDER BY created_at DESC, id DESC"
        );

        let records = sqlx::query_as::<_, CredentialRecord>(&sql)
            .bind(issued_by)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn touch_last_used(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE credentials
             SET last_used_at = $2
             WHERE id = $1 AND (last_used_at IS NULL OR last_used_at < $2)",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE credentials SET active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Relational store that runs gateway statements.
#[derive(Debug, Clone)]
pub struct PgRelationalStore {
    pool: DbPool,
    statement_timeout: Duration,
}

impl PgRelationalStore {
    pub fn new(pool: DbPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }
}

#[async_trait]
impl RelationalStore for PgRelationalStore {
    /// The statement goes through the extended protocol, so Postgres refuses
    /// text containing more than one command.
    async fn fetch_rows(&self, statement: &str) -> Result<Vec<QueryRow>, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query(statement)
            .persistent(false)
            .fetch_all(&mut *tx)
            .await?;

        tx.rollback().await?;

        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// User directory backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: DbPool,
}

impl PgUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn lookup(&self, identity: &str) -> Result<Option<Principal>, StoreError> {
        let principal = sqlx::query_as::<_, Principal>(
            "SELECT username, disabled FROM users WHERE username = $1",
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(principal)
    }
}

/// Convert a row of arbitrary shape into a JSON object keyed by column name.
fn row_to_json(row: &PgRow) -> QueryRow {
    let mut map = Map::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name());
        map.insert(column.name().to_string(), value);
    }
    map
}

fn column<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Value {
    let value = match type_name {
        "BOOL" => column::<bool>(row, index).map(Value::from),
        "INT2" => column::<i16>(row, index).map(Value::from),
        "INT4" => column::<i32>(row, index).map(Value::from),
        "INT8" => column::<i64>(row, index).map(Value::from),
        "FLOAT4" => column::<f32>(row, index).map(Value::from),
        "FLOAT8" => column::<f64>(row, index).map(Value::from),
        // Kept as a string so no precision is lost.
        "NUMERIC" => column::<Decimal>(row, index).map(|d| Value::String(d.to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => column::<String>(row, index).map(Value::from),
        "UUID" => column::<Uuid>(row, index).map(|u| Value::String(u.to_string())),
        "TIMESTAMPTZ" => {
            column::<DateTime<Utc>>(row, index).map(|t| Value::String(t.to_rfc3339()))
        }
        "TIMESTAMP" => column::<NaiveDateTime>(row, index)
            .map(|t| Value::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => column::<NaiveDate>(row, index).map(|d| Value::String(d.to_string())),
        "TIME" => column::<NaiveTime>(row, index).map(|t| Value::String(t.to_string())),
        "JSON" | "JSONB" => column::<Value>(row, index),
        "TEXT[]" | "VARCHAR[]" | "NAME[]" => column::<Vec<String>>(row, index).map(Value::from),
        "INT4[]" => column::<Vec<i32>>(row, index).map(Value::from),
        "INT8[]" => column::<Vec<i64>>(row, index).map(Value::from),
        "BOOL[]" => column::<Vec<bool>>(row, index).map(Value::from),
        other => {
            tracing::debug!(column_type = other, "unsupported column type rendered as null");
            None
        }
    };

    value.unwrap_or(Value::Null)
}
