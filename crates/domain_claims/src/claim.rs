//! Claim aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CalendarMonth, ClaimId, LecturerId, Money, PortError};

use crate::attachments::AttachmentHandle;
use crate::role::Role;

/// Maximum length of the free-text notes on a claim
pub const MAX_NOTES_LEN: usize = 2000;

/// Decimal places accepted on hours and rates
pub const MAX_INPUT_SCALE: u32 = 4;

/// Largest hours value a claim can record (`NUMERIC(12, 4)`)
pub const MAX_HOURS_WORKED: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 4);

/// Largest hourly rate a claim can record (`NUMERIC(14, 4)`)
pub const MAX_HOURLY_RATE: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 4);

fn check_quantity(
    value: Decimal,
    max: Decimal,
    label: &str,
    field: &str,
) -> Result<(), PortError> {
    if value <= Decimal::ZERO {
        return Err(PortError::validation_field(
            format!("{} must be greater than zero", label),
            field,
        ));
    }
    if value.normalize().scale() > MAX_INPUT_SCALE {
        return Err(PortError::validation_field(
            format!("{} must have at most {} decimal places", label, MAX_INPUT_SCALE),
            field,
        ));
    }
    if value > max {
        return Err(PortError::validation_field(
            format!("{} must not exceed {}", label, max),
            field,
        ));
    }
    Ok(())
}

/// Checks hours and rate before the amount is computed
///
/// Both must be positive with at most four decimal places and within the
/// stored columns, so `hourly_rate * hours_worked` is always exact.
pub fn validate_quantities(hours_worked: Decimal, hourly_rate: &Money) -> Result<(), PortError> {
    check_quantity(hours_worked, MAX_HOURS_WORKED, "hours worked", "hours_worked")?;
    check_quantity(hourly_rate.amount(), MAX_HOURLY_RATE, "hourly rate", "hourly_rate")
}

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Submitted, awaiting review
    Pending,
    /// Checked by a coordinator, awaiting final approval
    Verified,
    /// Approved for payment
    Approved,
    /// Rejected
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 4] = [
        ClaimStatus::Pending,
        ClaimStatus::Verified,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Verified => "Verified",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
        }
    }

    /// Approved and Rejected claims never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PortError::validation_field(format!("unknown status '{}'", s), "status"))
    }
}

/// One committed status change, kept on the claim as an audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// `None` for the submission itself
    pub from: Option<ClaimStatus>,
    pub to: ClaimStatus,
    pub actor: String,
    pub role: Role,
    pub at: DateTime<Utc>,
}

/// A monthly work claim submitted by a lecturer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Assigned by the store, immutable
    pub id: ClaimId,
    /// Submitting lecturer, immutable
    pub lecturer_id: LecturerId,
    pub hours_worked: Decimal,
    pub hourly_rate: Money,
    /// `hourly_rate * hours_worked`, fixed at submission
    pub amount: Money,
    pub claim_month: CalendarMonth,
    pub status: ClaimStatus,
    /// Opaque blob handles in upload order
    pub attachments: Vec<AttachmentHandle>,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version, bumped by the store on every update
    pub version: u64,
    pub history: Vec<StatusChange>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Whether the claim has left `Pending`
    pub fn is_reviewed(&self) -> bool {
        self.status != ClaimStatus::Pending
    }

    /// Checks the aggregate invariants
    ///
    /// - `amount == hourly_rate * hours_worked`
    /// - reviewer fields are set iff the claim has left `Pending`
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.hourly_rate.multiply(self.hours_worked).ok() != Some(self.amount) {
            return Err(format!(
                "{}: amount {} does not equal {} x {}",
                self.id, self.amount, self.hourly_rate, self.hours_worked
            ));
        }
        let reviewed_fields = self.verified_by.is_some() && self.verified_at.is_some();
        let no_reviewer_fields = self.verified_by.is_none() && self.verified_at.is_none();
        if self.is_reviewed() && !reviewed_fields {
            return Err(format!("{} is {} but has no reviewer", self.id, self.status));
        }
        if !self.is_reviewed() && !no_reviewer_fields {
            return Err(format!("{} is Pending but has a reviewer", self.id));
        }
        Ok(())
    }
}

/// A validated claim that has not been assigned an id yet
///
/// Built by the lifecycle engine; stores turn it into a [`Claim`] with
/// [`NewClaim::into_claim`] once they have allocated the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClaim {
    pub lecturer_id: LecturerId,
    pub hours_worked: Decimal,
    pub hourly_rate: Money,
    pub amount: Money,
    pub claim_month: CalendarMonth,
    pub attachments: Vec<AttachmentHandle>,
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: String,
    pub submitted_role: Role,
}

impl NewClaim {
    /// Validates the draft before anything is persisted
    pub fn validate(&self) -> Result<(), PortError> {
        validate_quantities(self.hours_worked, &self.hourly_rate)?;
        if self.hourly_rate.multiply(self.hours_worked).ok() != Some(self.amount) {
            return Err(PortError::validation_field(
                "amount must equal hourly rate times hours worked",
                "amount",
            ));
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(PortError::validation_field(
                    format!("notes must be at most {} characters", MAX_NOTES_LEN),
                    "notes",
                ));
            }
        }
        Ok(())
    }

    /// Materializes the stored record for the given id
    pub fn into_claim(self, id: ClaimId) -> Claim {
        let submitted = StatusChange {
            from: None,
            to: ClaimStatus::Pending,
            actor: self.submitted_by,
            role: self.submitted_role,
            at: self.submitted_at,
        };

        Claim {
            id,
            lecturer_id: self.lecturer_id,
            hours_worked: self.hours_worked,
            hourly_rate: self.hourly_rate,
            amount: self.amount,
            claim_month: self.claim_month,
            status: ClaimStatus::Pending,
            attachments: self.attachments,
            notes: self.notes,
            submitted_at: self.submitted_at,
            verified_by: None,
            verified_at: None,
            version: 1,
            history: vec![submitted],
            updated_at: self.submitted_at,
        }
    }
}
