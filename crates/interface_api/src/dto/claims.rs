//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_claims::{
    AttachmentHandle, BatchOutcome, BatchReport, Claim, ClaimError, Decision, StatusChange,
    SubmitClaim,
};
use core_kernel::{CalendarMonth, LecturerId};

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitClaimRequest {
    /// Coordinators and managers may submit for another lecturer
    #[validate(length(min = 1, max = 64))]
    pub lecturer_id: Option<String>,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    /// `YYYY-MM`; defaults to the current month
    pub claim_month: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl SubmitClaimRequest {
    pub fn into_command(self) -> Result<SubmitClaim, ClaimError> {
        let mut command = SubmitClaim::new(self.hours_worked, self.hourly_rate)
            .with_attachments(self.attachments.into_iter().map(AttachmentHandle::new).collect());
        if let Some(lecturer_id) = self.lecturer_id {
            command = command.for_lecturer(LecturerId::new(lecturer_id)?);
        }
        if let Some(month) = self.claim_month {
            command = command.in_month(month.parse::<CalendarMonth>()?);
        }
        if let Some(notes) = self.notes {
            command = command.with_notes(notes);
        }
        Ok(command)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    /// Version the reviewer last saw
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Approve,
    Reject,
}

impl From<DecisionKind> for Decision {
    fn from(kind: DecisionKind) -> Self {
        match kind {
            DecisionKind::Approve => Decision::Approve,
            DecisionKind::Reject => Decision::Reject,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: DecisionKind,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListClaimsQuery {
    /// Defaults to the caller
    pub lecturer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    pub from: Option<String>,
    pub to: String,
    pub actor: String,
    pub role: String,
    pub at: DateTime<Utc>,
}

impl From<&StatusChange> for StatusChangeResponse {
    fn from(change: &StatusChange) -> Self {
        Self {
            from: change.from.map(|s| s.to_string()),
            to: change.to.to_string(),
            actor: change.actor.clone(),
            role: change.role.to_string(),
            at: change.at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: u64,
    pub reference: String,
    pub lecturer_id: String,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub amount: Decimal,
    pub currency: String,
    pub claim_month: String,
    pub status: String,
    pub attachments: Vec<String>,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub history: Vec<StatusChangeResponse>,
}

impl From<&Claim> for ClaimResponse {
    fn from(claim: &Claim) -> Self {
        Self {
            id: claim.id.value(),
            reference: claim.id.to_string(),
            lecturer_id: claim.lecturer_id.to_string(),
            hours_worked: claim.hours_worked,
            hourly_rate: claim.hourly_rate.amount(),
            amount: claim.amount.amount(),
            currency: claim.amount.currency().code().to_string(),
            claim_month: claim.claim_month.to_string(),
            status: claim.status.to_string(),
            attachments: claim.attachments.iter().map(|a| a.to_string()).collect(),
            notes: claim.notes.clone(),
            submitted_at: claim.submitted_at,
            verified_by: claim.verified_by.clone(),
            verified_at: claim.verified_at,
            version: claim.version,
            history: claim.history.iter().map(StatusChangeResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchFailureResponse {
    pub claim_id: u64,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BatchApproveResponse {
    pub approved: Vec<ClaimResponse>,
    pub failed: Vec<BatchFailureResponse>,
}

impl From<&BatchReport> for BatchApproveResponse {
    fn from(report: &BatchReport) -> Self {
        let mut approved = Vec::new();
        let mut failed = Vec::new();
        for (id, outcome) in &report.outcomes {
            match outcome {
                BatchOutcome::Approved(claim) => approved.push(ClaimResponse::from(claim)),
                BatchOutcome::Failed(err) => failed.push(BatchFailureResponse {
                    claim_id: id.value(),
                    error: err.code().to_string(),
                    message: err.to_string(),
                }),
            }
        }
        Self { approved, failed }
    }
}
