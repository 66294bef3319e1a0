//! PostgreSQL Claim Store
//!
//! Implements the `ClaimStore` port over [`ClaimsRepository`]. Updates run in
//! a transaction that row-locks the claim, applies the mutator to the mapped
//! domain record, and writes it back guarded by the version it was read at.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimStore;
//! use domain_claims::ClaimStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ClaimStore> = Arc::new(PostgresClaimStore::new(pool));
//! let claim = store.get(ClaimId::new(42)).await?;
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterHealth, CalendarMonth, ClaimId, Currency, DomainPort, HealthCheckResult,
    HealthCheckable, LecturerId, Money, PortError,
};
use domain_claims::store::version_conflict;
use domain_claims::{
    AttachmentHandle, Claim, ClaimMutator, ClaimQuery, ClaimStatus, ClaimStore, NewClaim, Role,
    StatusChange,
};

use crate::error::DatabaseError;
use crate::repositories::claims::{
    ClaimRow, ClaimsRepository, NewClaimRow, NewHistoryRow, StatusHistoryRow,
};

const ADAPTER_ID: &str = "postgres-claim-store";

/// PostgreSQL-backed implementation of the `ClaimStore` port
#[derive(Debug, Clone)]
pub struct PostgresClaimStore {
    repository: ClaimsRepository,
}

impl PostgresClaimStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }
}

impl DomainPort for PostgresClaimStore {}

#[async_trait]
impl HealthCheckable for PostgresClaimStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(self.repository.pool(), ADAPTER_ID).await
    }
}

/// Runs `SELECT 1` against the pool and reports the latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

#[async_trait]
impl ClaimStore for PostgresClaimStore {
    #[instrument(skip(self, claim), fields(lecturer = %claim.lecturer_id))]
    async fn create(&self, claim: NewClaim) -> Result<Claim, PortError> {
        claim.validate()?;
        let (row, submitted) = new_claim_to_rows(&claim);
        let (row, history) = self.repository.insert(&row, &submitted).await?;
        let created = row_to_claim(row, history)?;
        debug!(claim_id = %created.id, "Claim inserted");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: ClaimId) -> Result<Claim, PortError> {
        let (row, history) = self
            .repository
            .fetch(claim_id_to_db(id)?)
            .await
            .map_err(|e| not_found_as_claim(e, id))?;
        Ok(row_to_claim(row, history)?)
    }

    #[instrument(skip(self, mutator))]
    async fn update(
        &self,
        id: ClaimId,
        expected_version: u64,
        mutator: ClaimMutator,
    ) -> Result<Claim, PortError> {
        let db_id = claim_id_to_db(id)?;
        let mut tx = self.repository.begin().await?;

        let (row, history) = ClaimsRepository::fetch_for_update(&mut tx, db_id)
            .await
            .map_err(|e| not_found_as_claim(e, id))?;
        let current = row_to_claim(row, history)?;
        if current.version != expected_version {
            warn!(claim_id = %id, expected_version, found = current.version, "Version conflict");
            return Err(version_conflict(id, expected_version, current.version));
        }

        let previous_history = current.history.len();
        let mut next = current.clone();
        mutator(&mut next);

        let next_row = claim_to_row(&next, &current)?;
        let expected = i64::try_from(expected_version)
            .map_err(|_| PortError::validation_field("version out of range", "version"))?;
        let written = ClaimsRepository::write_guarded(&mut tx, &next_row, expected).await?;

        let appended: Vec<NewHistoryRow> = next
            .history
            .iter()
            .skip(previous_history)
            .map(change_to_row)
            .collect();
        ClaimsRepository::append_history(&mut tx, db_id, &appended).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        let mut stored = row_to_claim(written, Vec::new())?;
        stored.history = next.history;
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn list(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
        let statuses = if query.statuses.is_empty() {
            None
        } else {
            Some(query.statuses.iter().map(|s| s.as_str().to_string()).collect())
        };
        let lecturer = query.lecturer_id.as_ref().map(|l| l.as_str().to_string());

        self.repository
            .list(statuses, lecturer)
            .await?
            .into_iter()
            .map(|(row, history)| row_to_claim(row, history).map_err(PortError::from))
            .collect()
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn not_found_as_claim(error: DatabaseError, id: ClaimId) -> DatabaseError {
    if error.is_not_found() {
        DatabaseError::not_found("Claim", id)
    } else {
        error
    }
}

fn claim_id_to_db(id: ClaimId) -> Result<i64, PortError> {
    i64::try_from(id.value()).map_err(|_| PortError::not_found("Claim", id))
}

/// Splits a new claim into its row and first history entry
pub fn new_claim_to_rows(claim: &NewClaim) -> (NewClaimRow, NewHistoryRow) {
    let row = NewClaimRow {
        lecturer_id: claim.lecturer_id.as_str().to_string(),
        hours_worked: claim.hours_worked,
        hourly_rate: claim.hourly_rate.amount(),
        amount: claim.amount.amount(),
        currency: claim.amount.currency().code().to_string(),
        claim_year: claim.claim_month.year(),
        claim_month: claim.claim_month.month() as i32,
        attachments: claim
            .attachments
            .iter()
            .map(|a| a.as_str().to_string())
            .collect(),
        notes: claim.notes.clone(),
        submitted_at: claim.submitted_at,
    };
    let submitted = NewHistoryRow {
        from_status: None,
        to_status: ClaimStatus::Pending.as_str().to_string(),
        actor: claim.submitted_by.clone(),
        actor_role: claim.submitted_role.as_str().to_string(),
        changed_at: claim.submitted_at,
    };
    (row, submitted)
}

/// Maps a stored row and its history onto the domain claim
pub fn row_to_claim(row: ClaimRow, history: Vec<StatusHistoryRow>) -> Result<Claim, DatabaseError> {
    let id = u64::try_from(row.claim_id)
        .map(ClaimId::new)
        .map_err(|_| DatabaseError::corrupt(format!("negative claim id {}", row.claim_id)))?;
    let lecturer_id = LecturerId::new(row.lecturer_id.as_str())
        .map_err(|e| DatabaseError::corrupt(format!("{}: {}", id, e)))?;
    let currency: Currency = row
        .currency
        .parse()
        .map_err(|e| DatabaseError::corrupt(format!("{}: {}", id, e)))?;
    let month = u32::try_from(row.claim_month)
        .ok()
        .and_then(|m| CalendarMonth::new(row.claim_year, m).ok())
        .ok_or_else(|| {
            DatabaseError::corrupt(format!(
                "{}: invalid claim month {}-{}",
                id, row.claim_year, row.claim_month
            ))
        })?;
    let version = u64::try_from(row.version)
        .map_err(|_| DatabaseError::corrupt(format!("{}: negative version", id)))?;

    Ok(Claim {
        id,
        lecturer_id,
        hours_worked: row.hours_worked,
        hourly_rate: Money::new(row.hourly_rate, currency),
        amount: Money::new(row.amount, currency),
        claim_month: month,
        status: parse_status(&row.status)?,
        attachments: row.attachments.0.into_iter().map(AttachmentHandle::new).collect(),
        notes: row.notes,
        submitted_at: row.submitted_at,
        verified_by: row.verified_by,
        verified_at: row.verified_at,
        version,
        history: history
            .into_iter()
            .map(row_to_change)
            .collect::<Result<_, _>>()?,
        updated_at: row.updated_at,
    })
}

/// Builds the row to write for `next`, keeping the immutable columns of `current`
fn claim_to_row(next: &Claim, current: &Claim) -> Result<ClaimRow, DatabaseError> {
    Ok(ClaimRow {
        claim_id: i64::try_from(current.id.value())
            .map_err(|_| DatabaseError::corrupt(format!("{} out of range", current.id)))?,
        lecturer_id: current.lecturer_id.as_str().to_string(),
        hours_worked: current.hours_worked,
        hourly_rate: current.hourly_rate.amount(),
        amount: current.amount.amount(),
        currency: current.amount.currency().code().to_string(),
        claim_year: current.claim_month.year(),
        claim_month: current.claim_month.month() as i32,
        status: next.status.as_str().to_string(),
        attachments: Json(next.attachments.iter().map(|a| a.as_str().to_string()).collect()),
        notes: next.notes.clone(),
        submitted_at: current.submitted_at,
        verified_by: next.verified_by.clone(),
        verified_at: next.verified_at,
        version: i64::try_from(current.version).unwrap_or(i64::MAX),
        updated_at: next.updated_at,
    })
}

fn row_to_change(row: StatusHistoryRow) -> Result<StatusChange, DatabaseError> {
    Ok(StatusChange {
        from: row.from_status.as_deref().map(parse_status).transpose()?,
        to: parse_status(&row.to_status)?,
        role: row
            .actor_role
            .parse::<Role>()
            .map_err(|e| DatabaseError::corrupt(e.to_string()))?,
        actor: row.actor,
        at: row.changed_at,
    })
}

fn change_to_row(change: &StatusChange) -> NewHistoryRow {
    NewHistoryRow {
        from_status: change.from.map(|s| s.as_str().to_string()),
        to_status: change.to.as_str().to_string(),
        actor: change.actor.clone(),
        actor_role: change.role.as_str().to_string(),
        changed_at: change.at,
    }
}

fn parse_status(value: &str) -> Result<ClaimStatus, DatabaseError> {
    value
        .parse()
        .map_err(|_| DatabaseError::corrupt(format!("unknown claim status '{}'", value)))
}
