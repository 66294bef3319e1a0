//! Claim lifecycle state machine
//!
//! ```text
//!            ┌──────────► Rejected
//!            │
//! Pending ───┼──────────► Approved
//!            │               ▲
//!            └─► Verified ───┘
//! ```
//!
//! Every legal transition and the roles allowed to request it live in
//! [`TRANSITION_TABLE`]. Nothing else in the crate decides whether a status
//! change is allowed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{CalendarMonth, ClaimId, LecturerId, Money};

use crate::attachments::AttachmentHandle;
use crate::claim::{validate_quantities, Claim, ClaimStatus, NewClaim, StatusChange};
use crate::error::ClaimError;
use crate::role::{Caller, Role};
use crate::store::{ClaimQuery, ClaimStore};

/// A legal status change and the roles that may request it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// `None` is the submission of a new claim
    pub from: Option<ClaimStatus>,
    pub to: ClaimStatus,
    pub roles: &'static [Role],
}

impl TransitionRule {
    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// The permission table
pub const TRANSITION_TABLE: &[TransitionRule] = &[
    TransitionRule {
        from: None,
        to: ClaimStatus::Pending,
        roles: &[Role::Lecturer, Role::Coordinator, Role::Manager],
    },
    TransitionRule {
        from: Some(ClaimStatus::Pending),
        to: ClaimStatus::Verified,
        roles: &[Role::Coordinator, Role::Manager],
    },
    TransitionRule {
        from: Some(ClaimStatus::Pending),
        to: ClaimStatus::Approved,
        roles: &[Role::Coordinator, Role::Manager],
    },
    TransitionRule {
        from: Some(ClaimStatus::Pending),
        to: ClaimStatus::Rejected,
        roles: &[Role::Coordinator, Role::Manager],
    },
    TransitionRule {
        from: Some(ClaimStatus::Verified),
        to: ClaimStatus::Approved,
        roles: &[Role::Manager, Role::Hr],
    },
];

/// Looks up the rule for a status change
pub fn rule_for(from: Option<ClaimStatus>, to: ClaimStatus) -> Option<&'static TransitionRule> {
    TRANSITION_TABLE
        .iter()
        .find(|rule| rule.from == from && rule.to == to)
}

/// Authorizes `role` to move a claim from `from` to `to`
///
/// A change with no rule is an `InvalidTransition` whatever the role; a
/// change with a rule that does not list the role is `PermissionDenied`.
pub fn authorize(
    from: Option<ClaimStatus>,
    to: ClaimStatus,
    role: Role,
) -> Result<&'static TransitionRule, ClaimError> {
    let rule = rule_for(from, to).ok_or_else(|| ClaimError::InvalidTransition {
        from: from.map(|s| s.to_string()).unwrap_or_else(|| "(new)".to_string()),
        to: to.to_string(),
    })?;

    if !rule.permits(role) {
        return Err(ClaimError::permission_denied(
            role,
            format!(
                "move a claim from {} to {}",
                from.map(|s| s.as_str()).unwrap_or("(new)"),
                to
            ),
        ));
    }
    Ok(rule)
}

/// Applies the side effects of a committed transition to a record
///
/// Reviewer fields are written only once: the first time the claim leaves
/// `Pending`.
pub fn apply_transition(claim: &mut Claim, to: ClaimStatus, caller: &Caller, at: DateTime<Utc>) {
    if claim.verified_by.is_none() {
        claim.verified_by = Some(caller.identity.clone());
        claim.verified_at = Some(at);
    }
    claim.history.push(StatusChange {
        from: Some(claim.status),
        to,
        actor: caller.identity.clone(),
        role: caller.role,
        at,
    });
    claim.status = to;
    claim.updated_at = at;
}

/// Inputs of a submission, after the caller's identity has been resolved
#[derive(Debug, Clone)]
pub struct Submission {
    pub lecturer_id: LecturerId,
    pub hours_worked: Decimal,
    pub hourly_rate: Money,
    pub claim_month: Option<CalendarMonth>,
    pub attachments: Vec<AttachmentHandle>,
    pub notes: Option<String>,
}

/// Outcome for one claim of a batch approval
#[derive(Debug)]
pub enum BatchOutcome {
    Approved(Claim),
    Failed(ClaimError),
}

impl BatchOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, BatchOutcome::Approved(_))
    }
}

/// Result of a batch approval, one entry per targeted claim
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(ClaimId, BatchOutcome)>,
}

impl BatchReport {
    pub fn approved(&self) -> impl Iterator<Item = &Claim> {
        self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
            BatchOutcome::Approved(claim) => Some(claim),
            BatchOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (ClaimId, &ClaimError)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            BatchOutcome::Failed(err) => Some((*id, err)),
            BatchOutcome::Approved(_) => None,
        })
    }

    pub fn approved_count(&self) -> usize {
        self.approved().count()
    }

    pub fn conflict_count(&self) -> usize {
        self.failures().filter(|(_, err)| err.is_conflict()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Enforces the transition table against the claim store
#[derive(Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn ClaimStore>,
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self { store }
    }

    /// Builds and validates a new claim without persisting it
    pub fn draft(
        &self,
        caller: &Caller,
        submission: Submission,
        now: DateTime<Utc>,
    ) -> Result<NewClaim, ClaimError> {
        authorize(None, ClaimStatus::Pending, caller.role)?;
        validate_quantities(submission.hours_worked, &submission.hourly_rate)?;

        let draft = NewClaim {
            amount: submission.hourly_rate.multiply(submission.hours_worked)?,
            lecturer_id: submission.lecturer_id,
            hours_worked: submission.hours_worked,
            hourly_rate: submission.hourly_rate,
            claim_month: submission
                .claim_month
                .unwrap_or_else(|| CalendarMonth::of(now)),
            attachments: submission.attachments,
            notes: submission
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            submitted_at: now,
            submitted_by: caller.identity.clone(),
            submitted_role: caller.role,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Creates a claim in `Pending`
    #[instrument(skip(self, submission), fields(caller = %caller.identity, lecturer = %submission.lecturer_id))]
    pub async fn submit(&self, caller: &Caller, submission: Submission) -> Result<Claim, ClaimError> {
        let draft = self.draft(caller, submission, Utc::now())?;
        let claim = self.store.create(draft).await?;
        info!(claim_id = %claim.id, amount = %claim.amount, "Claim submitted");
        Ok(claim)
    }

    /// Moves a claim to `to`
    ///
    /// Reads the current record; when `expected_version` is given it must
    /// match what was read, otherwise the call fails with `Conflict`.
    #[instrument(skip(self), fields(caller = %caller.identity, role = %caller.role))]
    pub async fn transition(
        &self,
        caller: &Caller,
        id: ClaimId,
        to: ClaimStatus,
        expected_version: Option<u64>,
    ) -> Result<Claim, ClaimError> {
        let current = self.store.get(id).await?;
        if let Some(expected) = expected_version {
            if expected != current.version {
                warn!(claim_id = %id, expected, found = current.version, "Stale claim version");
                return Err(ClaimError::Conflict(format!(
                    "{} was modified concurrently (expected version {}, found {})",
                    id, expected, current.version
                )));
            }
        }
        self.transition_from(caller, &current, to).await
    }

    /// Moves a claim to `to`, guarded by the version of `snapshot`
    ///
    /// The table is checked against the snapshot; the store rejects the write
    /// if the record has changed since the snapshot was taken.
    pub async fn transition_from(
        &self,
        caller: &Caller,
        snapshot: &Claim,
        to: ClaimStatus,
    ) -> Result<Claim, ClaimError> {
        authorize(Some(snapshot.status), to, caller.role)?;

        let actor = caller.clone();
        let now = Utc::now();
        let updated = self
            .store
            .update(
                snapshot.id,
                snapshot.version,
                Box::new(move |claim| apply_transition(claim, to, &actor, now)),
            )
            .await?;

        info!(
            claim_id = %updated.id,
            from = %snapshot.status,
            to = %updated.status,
            version = updated.version,
            "Claim status changed"
        );
        Ok(updated)
    }

    /// Approves every claim that is `Verified` at the time of the call
    ///
    /// The caller's permission is checked once up front. Each claim is then
    /// approved independently against the version seen in the snapshot; a
    /// failure on one claim is recorded and the loop carries on.
    #[instrument(skip(self), fields(caller = %caller.identity, role = %caller.role))]
    pub async fn batch_approve(&self, caller: &Caller) -> Result<BatchReport, ClaimError> {
        authorize(Some(ClaimStatus::Verified), ClaimStatus::Approved, caller.role)?;

        let targets = self
            .store
            .list(ClaimQuery::by_status(ClaimStatus::Verified))
            .await?;

        let mut report = BatchReport::default();
        for snapshot in &targets {
            let outcome = match self.transition_from(caller, snapshot, ClaimStatus::Approved).await {
                Ok(claim) => BatchOutcome::Approved(claim),
                Err(err) => {
                    warn!(claim_id = %snapshot.id, error = %err, "Batch approval skipped claim");
                    BatchOutcome::Failed(err)
                }
            };
            report.outcomes.push((snapshot.id, outcome));
        }

        info!(
            targeted = targets.len(),
            approved = report.approved_count(),
            "Batch approval finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_one_rule_per_pair() {
        for (i, a) in TRANSITION_TABLE.iter().enumerate() {
            for b in &TRANSITION_TABLE[i + 1..] {
                assert!(!(a.from == b.from && a.to == b.to), "duplicate rule {:?}", a);
            }
        }
    }

    #[test]
    fn test_nothing_returns_to_pending() {
        for status in ClaimStatus::ALL {
            let err = authorize(Some(status), ClaimStatus::Pending, Role::Manager).unwrap_err();
            assert!(matches!(err, ClaimError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [ClaimStatus::Approved, ClaimStatus::Rejected] {
            for to in ClaimStatus::ALL {
                assert!(rule_for(Some(from), to).is_none());
            }
        }
    }

    #[test]
    fn test_invalid_transition_wins_over_permission() {
        let err = authorize(Some(ClaimStatus::Approved), ClaimStatus::Rejected, Role::Lecturer)
            .unwrap_err();
        assert!(matches!(err, ClaimError::InvalidTransition { .. }));
    }

    #[test]
    fn test_verified_to_approved_is_manager_or_hr_only() {
        assert!(authorize(Some(ClaimStatus::Verified), ClaimStatus::Approved, Role::Manager).is_ok());
        assert!(authorize(Some(ClaimStatus::Verified), ClaimStatus::Approved, Role::Hr).is_ok());
        let err = authorize(Some(ClaimStatus::Verified), ClaimStatus::Approved, Role::Coordinator)
            .unwrap_err();
        assert!(matches!(err, ClaimError::PermissionDenied { .. }));
    }

    #[test]
    fn test_hr_cannot_submit() {
        let err = authorize(None, ClaimStatus::Pending, Role::Hr).unwrap_err();
        assert!(matches!(err, ClaimError::PermissionDenied { .. }));
    }
}
