//! Claim store port
//!
//! The store owns every claim record. Callers hold ids or cloned snapshots,
//! never live references. Writes use optimistic concurrency: an update names
//! the version the caller last observed and fails with a conflict if the
//! stored record has moved on since.
//!
//! ```rust,ignore
//! let store: Arc<dyn ClaimStore> = match config.store {
//!     StoreKind::Memory => Arc::new(InMemoryClaimStore::new()),
//!     StoreKind::Postgres => Arc::new(PostgresClaimStore::new(pool)),
//! };
//! ```

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, HealthCheckable, LecturerId, PortError};

use crate::claim::{Claim, ClaimStatus, NewClaim};

/// Change applied to a copy of the stored record during an update
pub type ClaimMutator = Box<dyn FnOnce(&mut Claim) + Send>;

/// Query parameters for listing claims
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimQuery {
    /// Match any of these statuses; empty matches all
    pub statuses: Vec<ClaimStatus>,
    /// Filter by lecturer
    pub lecturer_id: Option<LecturerId>,
}

impl ClaimQuery {
    /// All claims
    pub fn all() -> Self {
        Self::default()
    }

    /// Claims in the given status
    pub fn by_status(status: ClaimStatus) -> Self {
        Self {
            statuses: vec![status],
            ..Default::default()
        }
    }

    /// Claims submitted by the given lecturer
    pub fn by_lecturer(lecturer_id: LecturerId) -> Self {
        Self {
            lecturer_id: Some(lecturer_id),
            ..Default::default()
        }
    }

    /// Adds a status to match
    pub fn or_status(mut self, status: ClaimStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    /// Whether a claim satisfies the query
    pub fn matches(&self, claim: &Claim) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&claim.status) {
            return false;
        }
        if let Some(ref lecturer_id) = self.lecturer_id {
            if &claim.lecturer_id != lecturer_id {
                return false;
            }
        }
        true
    }
}

/// Durable collection of claims
#[async_trait]
pub trait ClaimStore: DomainPort + HealthCheckable {
    /// Persists a new claim and assigns the next id
    ///
    /// Ids are unique and strictly increasing in creation order. Fails with
    /// `PortError::Validation` if hours or rate are not positive.
    async fn create(&self, claim: NewClaim) -> Result<Claim, PortError>;

    /// Retrieves a claim, or `PortError::NotFound`
    async fn get(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// Atomic read-modify-write
    ///
    /// Applies `mutator` to a copy of the record and stores it with
    /// `version + 1`, but only if the stored version still equals
    /// `expected_version`; otherwise fails with `PortError::Conflict` and
    /// leaves the record untouched.
    async fn update(
        &self,
        id: ClaimId,
        expected_version: u64,
        mutator: ClaimMutator,
    ) -> Result<Claim, PortError>;

    /// Lists matching claims in insertion (id) order
    async fn list(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError>;
}

/// Builds the conflict error used by every store implementation
pub fn version_conflict(id: ClaimId, expected: u64, actual: u64) -> PortError {
    PortError::conflict(format!(
        "{} was modified concurrently (expected version {}, found {})",
        id, expected, actual
    ))
}
