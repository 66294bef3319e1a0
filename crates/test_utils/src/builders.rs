//! Test Data Builders
//!
//! Builders for claims and lecturers with sensible defaults, so tests only
//! spell out the fields they care about.

use chrono::{DateTime, Utc};
use core_kernel::{CalendarMonth, ClaimId, LecturerId, Money};
use domain_claims::lifecycle::apply_transition;
use domain_claims::{
    AttachmentHandle, Caller, Claim, ClaimStatus, NewClaim, RegisterLecturer, Role, SubmitClaim,
};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{CallerFixtures, IdFixtures, MoneyFixtures, TemporalFixtures};

/// Builder for unsaved claims
#[derive(Debug, Clone)]
pub struct NewClaimBuilder {
    lecturer_id: LecturerId,
    hours_worked: Decimal,
    hourly_rate: Money,
    claim_month: CalendarMonth,
    attachments: Vec<AttachmentHandle>,
    notes: Option<String>,
    submitted_at: DateTime<Utc>,
    submitted_by: Option<Caller>,
}

impl Default for NewClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewClaimBuilder {
    /// 40 hours at R250 for L1 in March 2024
    pub fn new() -> Self {
        Self {
            lecturer_id: IdFixtures::lecturer_id("L1"),
            hours_worked: dec!(40),
            hourly_rate: MoneyFixtures::zar_rate(),
            claim_month: TemporalFixtures::march_2024(),
            attachments: Vec::new(),
            notes: None,
            submitted_at: TemporalFixtures::submitted_at(),
            submitted_by: None,
        }
    }

    pub fn for_lecturer(mut self, id: &str) -> Self {
        self.lecturer_id = IdFixtures::lecturer_id(id);
        self
    }

    pub fn hours(mut self, hours: Decimal) -> Self {
        self.hours_worked = hours;
        self
    }

    pub fn rate(mut self, rate: Money) -> Self {
        self.hourly_rate = rate;
        self
    }

    pub fn month(mut self, month: CalendarMonth) -> Self {
        self.claim_month = month;
        self
    }

    pub fn attachment(mut self, handle: &str) -> Self {
        self.attachments.push(AttachmentHandle::new(handle));
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// Defaults to the lecturer themselves
    pub fn submitted_by(mut self, caller: Caller) -> Self {
        self.submitted_by = Some(caller);
        self
    }

    /// Builds the draft with `amount = rate * hours`
    pub fn build(self) -> NewClaim {
        let submitter = self
            .submitted_by
            .unwrap_or_else(|| Caller::new(self.lecturer_id.as_str(), Role::Lecturer));
        NewClaim {
            amount: self
                .hourly_rate
                .multiply(self.hours_worked)
                .expect("builder amounts fit in a Decimal"),
            lecturer_id: self.lecturer_id,
            hours_worked: self.hours_worked,
            hourly_rate: self.hourly_rate,
            claim_month: self.claim_month,
            attachments: self.attachments,
            notes: self.notes,
            submitted_at: self.submitted_at,
            submitted_by: submitter.identity,
            submitted_role: submitter.role,
        }
    }

    /// The matching service command
    pub fn into_command(self) -> SubmitClaim {
        SubmitClaim::new(self.hours_worked, self.hourly_rate.amount())
            .for_lecturer(self.lecturer_id)
            .in_month(self.claim_month)
            .with_attachments(self.attachments)
    }
}

/// Builder for stored claims in any status
///
/// The history is built through the same transition function the lifecycle
/// engine uses, so built claims satisfy [`Claim::check_invariants`].
#[derive(Debug, Clone)]
pub struct ClaimBuilder {
    id: ClaimId,
    draft: NewClaimBuilder,
    path: Vec<(ClaimStatus, Caller)>,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ClaimBuilder {
    /// A pending claim with the given id
    pub fn new(id: u64) -> Self {
        Self {
            id: ClaimId::new(id),
            draft: NewClaimBuilder::new(),
            path: Vec::new(),
        }
    }

    /// Adjusts the underlying draft
    pub fn with(mut self, f: impl FnOnce(NewClaimBuilder) -> NewClaimBuilder) -> Self {
        self.draft = f(self.draft);
        self
    }

    pub fn verified(mut self) -> Self {
        self.path = vec![(ClaimStatus::Verified, CallerFixtures::coordinator())];
        self
    }

    /// Approved directly from `Pending` by the coordinator
    pub fn approved(mut self) -> Self {
        self.path = vec![(ClaimStatus::Approved, CallerFixtures::coordinator())];
        self
    }

    /// Verified by the coordinator, then approved by HR
    pub fn approved_after_verification(mut self) -> Self {
        self.path = vec![
            (ClaimStatus::Verified, CallerFixtures::coordinator()),
            (ClaimStatus::Approved, CallerFixtures::hr()),
        ];
        self
    }

    pub fn rejected(mut self) -> Self {
        self.path = vec![(ClaimStatus::Rejected, CallerFixtures::coordinator())];
        self
    }

    pub fn build(self) -> Claim {
        let mut claim = self.draft.build().into_claim(self.id);
        for (to, caller) in &self.path {
            apply_transition(&mut claim, *to, caller, TemporalFixtures::reviewed_at());
            claim.version += 1;
        }
        claim
    }
}

/// Builder for lecturer registrations with generated contact details
#[derive(Debug, Clone)]
pub struct LecturerBuilder {
    id: LecturerId,
    name: String,
    email: String,
    phone: Option<String>,
}

impl LecturerBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: IdFixtures::lecturer_id(id),
            name: Name().fake(),
            email: SafeEmail().fake(),
            phone: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn build(self) -> RegisterLecturer {
        RegisterLecturer {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
        }
    }
}
