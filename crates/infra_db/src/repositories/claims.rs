//! Claims repository implementation
//!
//! Raw SQL access to the `claims` and `claim_status_history` tables. Rows are
//! plain column structs; mapping onto the domain model happens in
//! [`crate::adapters::claims`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use std::collections::HashMap;

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = r#"
    claim_id, lecturer_id, hours_worked, hourly_rate, amount, currency,
    claim_year, claim_month, status, attachments, notes, submitted_at,
    verified_by, verified_at, version, updated_at
"#;

/// A row of the `claims` table
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ClaimRow {
    pub claim_id: i64,
    pub lecturer_id: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub amount: Decimal,
    pub currency: String,
    pub claim_year: i32,
    pub claim_month: i32,
    pub status: String,
    pub attachments: Json<Vec<String>>,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// A row of the `claim_status_history` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StatusHistoryRow {
    pub claim_id: i64,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor: String,
    pub actor_role: String,
    pub changed_at: DateTime<Utc>,
}

/// Column values for inserting a claim; the id comes from the sequence
#[derive(Debug, Clone)]
pub struct NewClaimRow {
    pub lecturer_id: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub amount: Decimal,
    pub currency: String,
    pub claim_year: i32,
    pub claim_month: i32,
    pub attachments: Vec<String>,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Status-history entry to append; the claim id is supplied by the caller
#[derive(Debug, Clone)]
pub struct NewHistoryRow {
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor: String,
    pub actor_role: String,
    pub changed_at: DateTime<Utc>,
}

/// Repository for the claims tables
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        Ok(self.pool.begin().await?)
    }

    /// Inserts a claim in `Pending` with its first history entry
    pub async fn insert(
        &self,
        claim: &NewClaimRow,
        submitted: &NewHistoryRow,
    ) -> Result<(ClaimRow, Vec<StatusHistoryRow>), DatabaseError> {
        let mut tx = self.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO claims (
                lecturer_id, hours_worked, hourly_rate, amount, currency,
                claim_year, claim_month, status, attachments, notes,
                submitted_at, version, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'Pending', $8, $9, $10, 1, $10)
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row: ClaimRow = sqlx::query_as(&sql)
            .bind(&claim.lecturer_id)
            .bind(claim.hours_worked)
            .bind(claim.hourly_rate)
            .bind(claim.amount)
            .bind(&claim.currency)
            .bind(claim.claim_year)
            .bind(claim.claim_month)
            .bind(Json(&claim.attachments))
            .bind(&claim.notes)
            .bind(claim.submitted_at)
            .fetch_one(&mut *tx)
            .await?;

        Self::append_history(&mut tx, row.claim_id, std::slice::from_ref(submitted)).await?;
        let history = Self::history_for(&mut tx, &[row.claim_id]).await?;
        tx.commit().await?;

        Ok((row, history.into_values().next().unwrap_or_default()))
    }

    /// Reads a claim and its history
    pub async fn fetch(&self, claim_id: i64) -> Result<(ClaimRow, Vec<StatusHistoryRow>), DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM claims WHERE claim_id = $1", CLAIM_COLUMNS);
        let row: ClaimRow = sqlx::query_as(&sql)
            .bind(claim_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))?;

        let mut history = Self::history_for(&mut conn, &[claim_id]).await?;
        Ok((row, history.remove(&claim_id).unwrap_or_default()))
    }

    /// Reads and row-locks a claim inside a transaction
    pub async fn fetch_for_update(
        tx: &mut Transaction<'static, Postgres>,
        claim_id: i64,
    ) -> Result<(ClaimRow, Vec<StatusHistoryRow>), DatabaseError> {
        let sql = format!(
            "SELECT {} FROM claims WHERE claim_id = $1 FOR UPDATE",
            CLAIM_COLUMNS
        );
        let row: ClaimRow = sqlx::query_as(&sql)
            .bind(claim_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))?;

        let mut history = Self::history_for(&mut *tx, &[claim_id]).await?;
        Ok((row, history.remove(&claim_id).unwrap_or_default()))
    }

    /// Writes the mutable columns, guarded by the expected version
    ///
    /// Fails with `VersionConflict` if no row with that version exists.
    pub async fn write_guarded(
        tx: &mut Transaction<'static, Postgres>,
        row: &ClaimRow,
        expected_version: i64,
    ) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE claims SET
                status = $3,
                attachments = $4,
                notes = $5,
                verified_by = $6,
                verified_at = $7,
                updated_at = $8,
                version = version + 1
            WHERE claim_id = $1 AND version = $2
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(row.claim_id)
            .bind(expected_version)
            .bind(&row.status)
            .bind(&row.attachments)
            .bind(&row.notes)
            .bind(&row.verified_by)
            .bind(row.verified_at)
            .bind(row.updated_at)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                DatabaseError::VersionConflict(format!(
                    "claim {} is no longer at version {}",
                    row.claim_id, expected_version
                ))
            })
    }

    /// Appends status-history entries for a claim
    pub async fn append_history(
        conn: &mut PgConnection,
        claim_id: i64,
        entries: &[NewHistoryRow],
    ) -> Result<(), DatabaseError> {
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO claim_status_history (
                    claim_id, from_status, to_status, actor, actor_role, changed_at
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(claim_id)
            .bind(&entry.from_status)
            .bind(&entry.to_status)
            .bind(&entry.actor)
            .bind(&entry.actor_role)
            .bind(entry.changed_at)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Lists claims filtered by status and lecturer, in id order
    pub async fn list(
        &self,
        statuses: Option<Vec<String>>,
        lecturer_id: Option<String>,
    ) -> Result<Vec<(ClaimRow, Vec<StatusHistoryRow>)>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!(
            r#"
            SELECT {} FROM claims
            WHERE ($1::text[] IS NULL OR status = ANY($1))
              AND ($2::text IS NULL OR lecturer_id = $2)
            ORDER BY claim_id
            "#,
            CLAIM_COLUMNS
        );
        let rows: Vec<ClaimRow> = sqlx::query_as(&sql)
            .bind(statuses)
            .bind(lecturer_id)
            .fetch_all(&mut *conn)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.claim_id).collect();
        let mut history = Self::history_for(&mut conn, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let entries = history.remove(&row.claim_id).unwrap_or_default();
                (row, entries)
            })
            .collect())
    }

    async fn history_for(
        conn: &mut PgConnection,
        claim_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<StatusHistoryRow>>, DatabaseError> {
        if claim_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<StatusHistoryRow> = sqlx::query_as(
            r#"
            SELECT claim_id, from_status, to_status, actor, actor_role, changed_at
            FROM claim_status_history
            WHERE claim_id = ANY($1)
            ORDER BY history_id
            "#,
        )
        .bind(claim_ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut grouped: HashMap<i64, Vec<StatusHistoryRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.claim_id).or_default().push(row);
        }
        Ok(grouped)
    }
}
