//! Test Doubles
//!
//! Port implementations that record or misbehave on purpose.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use core_kernel::{
    AdapterHealth, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};
use domain_claims::{
    Claim, ClaimMutator, ClaimNotification, ClaimQuery, ClaimStatus, ClaimStore, NewClaim,
    NotificationPort,
};

/// Notifier that keeps every notification it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<ClaimNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<ClaimNotification> {
        self.seen.lock().expect("notifier lock poisoned").clone()
    }

    /// Statuses in publication order
    pub fn statuses(&self) -> Vec<ClaimStatus> {
        self.notifications().iter().map(|n| n.status).collect()
    }

    pub fn count_for(&self, id: ClaimId) -> usize {
        self.notifications().iter().filter(|n| n.claim_id == id).count()
    }
}

impl NotificationPort for RecordingNotifier {
    fn notify(&self, notification: ClaimNotification) {
        self.seen.lock().expect("notifier lock poisoned").push(notification);
    }
}

/// Claim store that edits claims behind the caller's back
///
/// The first `list` call returns its snapshot and then bumps the version of
/// the first `conflicts` claims in it through the inner store, as if another
/// reviewer had touched them in the meantime. Writes based on those
/// snapshots fail with a conflict.
pub struct ConflictInjectingStore {
    inner: Arc<dyn ClaimStore>,
    pending_conflicts: AtomicUsize,
    injected: Mutex<Vec<ClaimId>>,
}

impl ConflictInjectingStore {
    pub fn new(inner: Arc<dyn ClaimStore>, conflicts: usize) -> Self {
        Self {
            inner,
            pending_conflicts: AtomicUsize::new(conflicts),
            injected: Mutex::new(Vec::new()),
        }
    }

    /// Claims whose snapshot was made stale
    pub fn injected(&self) -> Vec<ClaimId> {
        self.injected.lock().expect("injected lock poisoned").clone()
    }
}

impl DomainPort for ConflictInjectingStore {}

#[async_trait]
impl HealthCheckable for ConflictInjectingStore {
    async fn health_check(&self) -> HealthCheckResult {
        self.inner.health_check().await
    }
}

#[async_trait]
impl ClaimStore for ConflictInjectingStore {
    async fn create(&self, claim: NewClaim) -> Result<Claim, PortError> {
        self.inner.create(claim).await
    }

    async fn get(&self, id: ClaimId) -> Result<Claim, PortError> {
        self.inner.get(id).await
    }

    async fn update(
        &self,
        id: ClaimId,
        expected_version: u64,
        mutator: ClaimMutator,
    ) -> Result<Claim, PortError> {
        self.inner.update(id, expected_version, mutator).await
    }

    async fn list(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
        let snapshot = self.inner.list(query).await?;
        let conflicts = self.pending_conflicts.swap(0, Ordering::SeqCst);
        for claim in snapshot.iter().take(conflicts) {
            self.inner
                .update(
                    claim.id,
                    claim.version,
                    Box::new(|c| c.notes = Some("edited by another reviewer".to_string())),
                )
                .await?;
            self.injected
                .lock()
                .expect("injected lock poisoned")
                .push(claim.id);
        }
        Ok(snapshot)
    }
}

/// Claim store whose backend is down
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn down() -> PortError {
        PortError::connection("claim database unreachable")
    }
}

impl DomainPort for UnavailableStore {}

#[async_trait]
impl HealthCheckable for UnavailableStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "unavailable-store".to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms: 0,
            message: Some("claim database unreachable".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ClaimStore for UnavailableStore {
    async fn create(&self, _claim: NewClaim) -> Result<Claim, PortError> {
        Err(Self::down())
    }

    async fn get(&self, _id: ClaimId) -> Result<Claim, PortError> {
        Err(Self::down())
    }

    async fn update(
        &self,
        _id: ClaimId,
        _expected_version: u64,
        _mutator: ClaimMutator,
    ) -> Result<Claim, PortError> {
        Err(Self::down())
    }

    async fn list(&self, _query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
        Err(Self::down())
    }
}
