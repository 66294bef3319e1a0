//! In-memory claim store
//!
//! Backs tests and single-node deployments. All records live in one
//! `BTreeMap` keyed by id, so iteration order is insertion order.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use core_kernel::{ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::claim::{Claim, NewClaim};
use crate::store::{version_conflict, ClaimMutator, ClaimQuery, ClaimStore};

#[derive(Debug)]
struct Inner {
    claims: BTreeMap<ClaimId, Claim>,
    next_id: u64,
}

/// In-memory implementation of [`ClaimStore`]
#[derive(Debug)]
pub struct InMemoryClaimStore {
    inner: RwLock<Inner>,
}

impl InMemoryClaimStore {
    /// Creates an empty store; the first claim gets id 1
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                claims: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of stored claims
    pub async fn len(&self) -> usize {
        self.inner.read().await.claims.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryClaimStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainPort for InMemoryClaimStore {}

#[async_trait]
impl HealthCheckable for InMemoryClaimStore {
    async fn health_check(&self) -> HealthCheckResult {
        let mut result = HealthCheckResult::healthy("memory-claim-store");
        result.message = Some(format!("{} claims held in memory", self.len().await));
        result
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn create(&self, claim: NewClaim) -> Result<Claim, PortError> {
        claim.validate()?;

        let mut inner = self.inner.write().await;
        let id = ClaimId::new(inner.next_id);
        inner.next_id += 1;

        let record = claim.into_claim(id);
        inner.claims.insert(id, record.clone());
        debug!(claim_id = %id, "Claim stored");
        Ok(record)
    }

    async fn get(&self, id: ClaimId) -> Result<Claim, PortError> {
        self.inner
            .read()
            .await
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Claim", id))
    }

    async fn update(
        &self,
        id: ClaimId,
        expected_version: u64,
        mutator: ClaimMutator,
    ) -> Result<Claim, PortError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .claims
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Claim", id))?;

        if stored.version != expected_version {
            return Err(version_conflict(id, expected_version, stored.version));
        }

        let mut next = stored.clone();
        mutator(&mut next);
        // identity and version are owned by the store
        next.id = stored.id;
        next.lecturer_id = stored.lecturer_id.clone();
        next.version = expected_version + 1;

        *stored = next.clone();
        Ok(next)
    }

    async fn list(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
        Ok(self
            .inner
            .read()
            .await
            .claims
            .values()
            .filter(|claim| query.matches(claim))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_kernel::{CalendarMonth, Currency, LecturerId, Money};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::claim::ClaimStatus;
    use crate::role::Role;

    fn draft(lecturer: &str, hours: Decimal) -> NewClaim {
        let rate = Money::new(dec!(100), Currency::ZAR);
        NewClaim {
            lecturer_id: LecturerId::new(lecturer).unwrap(),
            hours_worked: hours,
            hourly_rate: rate,
            amount: rate.multiply(hours).unwrap(),
            claim_month: CalendarMonth::new(2024, 3).unwrap(),
            attachments: vec![],
            notes: None,
            submitted_at: Utc::now(),
            submitted_by: lecturer.to_string(),
            submitted_role: Role::Lecturer,
        }
    }

    #[tokio::test]
    async fn test_ids_increase_in_creation_order() {
        let store = InMemoryClaimStore::new();
        let a = store.create(draft("L1", dec!(1))).await.unwrap();
        let b = store.create(draft("L2", dec!(2))).await.unwrap();
        assert_eq!(a.id, ClaimId::new(1));
        assert_eq!(b.id, ClaimId::new(2));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_hours() {
        let store = InMemoryClaimStore::new();
        let err = store.create(draft("L1", dec!(-1))).await.unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let store = InMemoryClaimStore::new();
        let claim = store.create(draft("L1", dec!(1))).await.unwrap();

        let updated = store
            .update(claim.id, 1, Box::new(|c| c.status = ClaimStatus::Verified))
            .await
            .unwrap();
        assert_eq!(updated.version, 2);

        let err = store
            .update(claim.id, 1, Box::new(|c| c.status = ClaimStatus::Rejected))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.get(claim.id).await.unwrap().status, ClaimStatus::Verified);
    }

    #[tokio::test]
    async fn test_update_cannot_change_identity() {
        let store = InMemoryClaimStore::new();
        let claim = store.create(draft("L1", dec!(1))).await.unwrap();
        let updated = store
            .update(
                claim.id,
                1,
                Box::new(|c| {
                    c.id = ClaimId::new(99);
                    c.lecturer_id = LecturerId::new("intruder").unwrap();
                }),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, claim.id);
        assert_eq!(updated.lecturer_id.as_str(), "L1");
    }

    #[tokio::test]
    async fn test_list_filters_and_keeps_insertion_order() {
        let store = InMemoryClaimStore::new();
        store.create(draft("L2", dec!(1))).await.unwrap();
        store.create(draft("L1", dec!(2))).await.unwrap();
        store.create(draft("L2", dec!(3))).await.unwrap();

        let l2 = store
            .list(ClaimQuery::by_lecturer(LecturerId::new("L2").unwrap()))
            .await
            .unwrap();
        let ids: Vec<u64> = l2.iter().map(|c| c.id.value()).collect();
        assert_eq!(ids, vec![1, 3]);

        let verified = store.list(ClaimQuery::by_status(ClaimStatus::Verified)).await.unwrap();
        assert!(verified.is_empty());
    }

    #[tokio::test]
    async fn test_missing_claim_is_not_found() {
        let store = InMemoryClaimStore::new();
        assert!(store.get(ClaimId::new(5)).await.unwrap_err().is_not_found());
        let err = store.update(ClaimId::new(5), 1, Box::new(|_| {})).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
