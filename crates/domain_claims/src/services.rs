//! Claims workflow service
//!
//! [`WorkflowService`] is the single entry point used by the HTTP layer. It
//! resolves who may do what, delegates status changes to the
//! [`LifecycleEngine`], reports to the [`InvoiceAggregator`], and publishes a
//! notification after every committed status change.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{CalendarMonth, ClaimId, Currency, HealthCheckResult, LecturerId, Money};

use crate::attachments::{
    AttachmentHandle, AttachmentUploadReport, BlobStore, MemoryBlobStore, RejectedAttachment,
    StoredAttachment, Upload,
};
use crate::claim::{Claim, ClaimStatus};
use crate::error::ClaimError;
use crate::invoice::{InvoiceAggregator, InvoiceReport};
use crate::lecturer::{
    InMemoryLecturerDirectory, Lecturer, LecturerDirectory, RegisterLecturer, UpdateLecturer,
};
use crate::lifecycle::{BatchReport, LifecycleEngine, Submission};
use crate::notification::{ClaimNotification, NoopNotifier, NotificationPort};
use crate::role::{Caller, Capability, Role};
use crate::store::{ClaimQuery, ClaimStore};

/// Deployment settings the workflow needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkflowConfig {
    /// Currency of every rate, amount and invoice
    pub currency: Currency,
}

/// Reviewer decision on a pending claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> ClaimStatus {
        match self {
            Decision::Approve => ClaimStatus::Approved,
            Decision::Reject => ClaimStatus::Rejected,
        }
    }
}

/// A claim submission as received from the caller
#[derive(Debug, Clone)]
pub struct SubmitClaim {
    /// Defaults to the caller's own identity
    pub lecturer_id: Option<LecturerId>,
    pub hours_worked: Decimal,
    /// In the deployment currency
    pub hourly_rate: Decimal,
    /// Defaults to the current month
    pub claim_month: Option<CalendarMonth>,
    pub attachments: Vec<AttachmentHandle>,
    pub notes: Option<String>,
}

impl SubmitClaim {
    pub fn new(hours_worked: Decimal, hourly_rate: Decimal) -> Self {
        Self {
            lecturer_id: None,
            hours_worked,
            hourly_rate,
            claim_month: None,
            attachments: Vec::new(),
            notes: None,
        }
    }

    pub fn for_lecturer(mut self, lecturer_id: LecturerId) -> Self {
        self.lecturer_id = Some(lecturer_id);
        self
    }

    pub fn in_month(mut self, month: CalendarMonth) -> Self {
        self.claim_month = Some(month);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<AttachmentHandle>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Orchestrates the claims workflow
pub struct WorkflowService {
    store: Arc<dyn ClaimStore>,
    lifecycle: LifecycleEngine,
    invoices: InvoiceAggregator,
    blobs: Arc<dyn BlobStore>,
    lecturers: Arc<dyn LecturerDirectory>,
    notifier: Arc<dyn NotificationPort>,
    config: WorkflowConfig,
}

impl WorkflowService {
    /// Creates a service over `store` with in-memory attachments, an
    /// in-memory lecturer directory and no notifications
    pub fn new(store: Arc<dyn ClaimStore>, config: WorkflowConfig) -> Self {
        Self {
            lifecycle: LifecycleEngine::new(store.clone()),
            invoices: InvoiceAggregator::new(store.clone(), config.currency),
            store,
            blobs: Arc::new(MemoryBlobStore::default()),
            lecturers: Arc::new(InMemoryLecturerDirectory::new()),
            notifier: Arc::new(NoopNotifier),
            config,
        }
    }

    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn with_lecturer_directory(mut self, lecturers: Arc<dyn LecturerDirectory>) -> Self {
        self.lecturers = lecturers;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationPort>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Submits a new claim in `Pending`
    ///
    /// # Arguments
    ///
    /// * `caller` - Lecturers submit for themselves; coordinators and
    ///   managers may name another lecturer
    /// * `request` - Hours, rate and optional month, attachments and notes
    ///
    /// # Errors
    ///
    /// `Validation` for hours or a rate that is non-positive, carries more
    /// than four decimal places or exceeds the stored limits.
    /// `PermissionDenied` when the caller may not submit for the named
    /// lecturer.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let caller = Caller::new("L1", Role::Lecturer);
    /// let claim = service.submit(&caller, SubmitClaim::new(dec!(40), dec!(250))).await?;
    /// assert_eq!(claim.status, ClaimStatus::Pending);
    /// ```
    #[instrument(skip(self, request), fields(caller = %caller.identity, role = %caller.role))]
    pub async fn submit(&self, caller: &Caller, request: SubmitClaim) -> Result<Claim, ClaimError> {
        let lecturer_id = match request.lecturer_id {
            Some(id) => id,
            None => caller.lecturer_id()?,
        };
        if !caller.is_lecturer(&lecturer_id) {
            caller.require(Capability::SubmitOnBehalf)?;
        }

        let submission = Submission {
            lecturer_id,
            hours_worked: request.hours_worked,
            hourly_rate: Money::new(request.hourly_rate, self.config.currency),
            claim_month: request.claim_month,
            attachments: request.attachments,
            notes: request.notes,
        };

        let claim = self.lifecycle.submit(caller, submission).await?;
        self.publish(&claim);
        Ok(claim)
    }

    /// Marks a pending claim as checked, ready for final approval
    pub async fn verify(
        &self,
        caller: &Caller,
        id: ClaimId,
        expected_version: Option<u64>,
    ) -> Result<Claim, ClaimError> {
        self.change_status(caller, id, ClaimStatus::Verified, expected_version)
            .await
    }

    pub async fn approve(
        &self,
        caller: &Caller,
        id: ClaimId,
        expected_version: Option<u64>,
    ) -> Result<Claim, ClaimError> {
        self.change_status(caller, id, ClaimStatus::Approved, expected_version)
            .await
    }

    pub async fn reject(
        &self,
        caller: &Caller,
        id: ClaimId,
        expected_version: Option<u64>,
    ) -> Result<Claim, ClaimError> {
        self.change_status(caller, id, ClaimStatus::Rejected, expected_version)
            .await
    }

    /// Applies a reviewer decision to a claim
    pub async fn verify_or_reject(
        &self,
        caller: &Caller,
        id: ClaimId,
        decision: Decision,
        expected_version: Option<u64>,
    ) -> Result<Claim, ClaimError> {
        self.change_status(caller, id, decision.target_status(), expected_version)
            .await
    }

    async fn change_status(
        &self,
        caller: &Caller,
        id: ClaimId,
        to: ClaimStatus,
        expected_version: Option<u64>,
    ) -> Result<Claim, ClaimError> {
        let claim = self
            .lifecycle
            .transition(caller, id, to, expected_version)
            .await?;
        self.publish(&claim);
        Ok(claim)
    }

    /// Approves every currently verified claim
    ///
    /// One notification is published per claim actually approved; failed
    /// claims are reported in the returned [`BatchReport`].
    pub async fn batch_approve(&self, caller: &Caller) -> Result<BatchReport, ClaimError> {
        let report = self.lifecycle.batch_approve(caller).await?;
        for claim in report.approved() {
            self.publish(claim);
        }
        Ok(report)
    }

    /// Claims of one lecturer in submission order
    #[instrument(skip(self), fields(caller = %caller.identity))]
    pub async fn track(
        &self,
        caller: &Caller,
        lecturer_id: &LecturerId,
    ) -> Result<Vec<Claim>, ClaimError> {
        if !caller.is_lecturer(lecturer_id) {
            caller.require(Capability::ViewAllClaims)?;
        }
        Ok(self
            .store
            .list(ClaimQuery::by_lecturer(lecturer_id.clone()))
            .await?)
    }

    /// A single claim
    ///
    /// Lecturers get `NotFound` for claims that are not theirs.
    pub async fn get_claim(&self, caller: &Caller, id: ClaimId) -> Result<Claim, ClaimError> {
        let claim = self.store.get(id).await?;
        if !caller.role.can(Capability::ViewAllClaims) && !caller.is_lecturer(&claim.lecturer_id) {
            return Err(ClaimError::not_found("Claim", id));
        }
        Ok(claim)
    }

    /// Claims awaiting action from the caller's role
    pub async fn review_queue(&self, caller: &Caller) -> Result<Vec<Claim>, ClaimError> {
        let query = match caller.role {
            Role::Coordinator => ClaimQuery::by_status(ClaimStatus::Pending),
            Role::Manager => ClaimQuery::by_status(ClaimStatus::Pending).or_status(ClaimStatus::Verified),
            Role::Hr => ClaimQuery::by_status(ClaimStatus::Verified),
            Role::Lecturer => {
                return Err(ClaimError::permission_denied(caller.role, "view the review queue"))
            }
        };
        Ok(self.store.list(query).await?)
    }

    /// Stores supporting documents
    ///
    /// Each file is checked on its own; rejected files are listed in the
    /// report and do not affect the others. A backend failure aborts the
    /// upload.
    #[instrument(skip(self, uploads), fields(caller = %caller.identity, files = uploads.len()))]
    pub async fn store_attachments(
        &self,
        caller: &Caller,
        uploads: Vec<Upload>,
    ) -> Result<AttachmentUploadReport, ClaimError> {
        caller.require(Capability::UploadAttachments)?;

        let mut report = AttachmentUploadReport::default();
        for upload in uploads {
            match self.blobs.store(&upload).await {
                Ok(handle) => report.accepted.push(StoredAttachment {
                    file_name: upload.file_name,
                    handle,
                }),
                Err(error @ ClaimError::FileRejected { .. }) => {
                    warn!(file = %upload.file_name, error = %error, "Attachment rejected");
                    report.rejected.push(RejectedAttachment {
                        file_name: upload.file_name,
                        error,
                    });
                }
                Err(other) => return Err(other),
            }
        }
        Ok(report)
    }

    /// Invoice report over every approved claim
    pub async fn generate_invoice(&self, caller: &Caller) -> Result<InvoiceReport, ClaimError> {
        caller.require(Capability::GenerateInvoice)?;
        self.invoices.generate().await
    }

    pub async fn register_lecturer(
        &self,
        caller: &Caller,
        request: RegisterLecturer,
    ) -> Result<Lecturer, ClaimError> {
        caller.require(Capability::ManageLecturers)?;
        let lecturer = self.lecturers.register(request).await?;
        info!(lecturer = %lecturer.id, by = %caller.identity, "Lecturer registered");
        Ok(lecturer)
    }

    pub async fn update_lecturer(
        &self,
        caller: &Caller,
        id: &LecturerId,
        changes: UpdateLecturer,
    ) -> Result<Lecturer, ClaimError> {
        caller.require(Capability::ManageLecturers)?;
        let lecturer = self.lecturers.update(id, changes).await?;
        info!(lecturer = %lecturer.id, by = %caller.identity, "Lecturer updated");
        Ok(lecturer)
    }

    pub async fn list_lecturers(&self, caller: &Caller) -> Result<Vec<Lecturer>, ClaimError> {
        caller.require(Capability::ManageLecturers)?;
        Ok(self.lecturers.list().await?)
    }

    /// Health of every adapter behind the service
    pub async fn health(&self) -> Vec<HealthCheckResult> {
        vec![
            self.store.health_check().await,
            self.blobs.health_check().await,
            self.lecturers.health_check().await,
        ]
    }

    fn publish(&self, claim: &Claim) {
        self.notifier.notify(ClaimNotification::for_claim(claim));
    }
}
