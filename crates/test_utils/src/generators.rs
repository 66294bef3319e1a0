//! Property-Based Test Generators
//!
//! Proptest strategies for claims data that satisfies domain invariants.

use core_kernel::{CalendarMonth, ClaimId, Currency, LecturerId, Money};
use domain_claims::{ClaimStatus, NewClaim};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::{ClaimBuilder, NewClaimBuilder};

/// Hours worked in a month, 0.25 to 200 in quarter hours
pub fn hours_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=800i64).prop_map(|quarters| Decimal::new(quarters * 25, 2))
}

/// Hourly rates from R50.00 to R1500.00
pub fn rate_strategy() -> impl Strategy<Value = Money> {
    (5_000i64..=150_000i64).prop_map(|cents| Money::new(Decimal::new(cents, 2), Currency::ZAR))
}

/// Months across 2023 to 2025
pub fn claim_month_strategy() -> impl Strategy<Value = CalendarMonth> {
    (2023i32..=2025i32, 1u32..=12u32)
        .prop_map(|(year, month)| CalendarMonth::new(year, month).expect("month in range"))
}

/// Lecturer ids from a small pool so that grouping happens
pub fn lecturer_id_strategy() -> impl Strategy<Value = LecturerId> {
    (1u32..=5u32).prop_map(|n| LecturerId::new(format!("L{}", n)).expect("non-empty id"))
}

pub fn claim_id_strategy() -> impl Strategy<Value = ClaimId> {
    (1u64..1_000_000u64).prop_map(ClaimId::new)
}

pub fn status_strategy() -> impl Strategy<Value = ClaimStatus> {
    prop_oneof![
        Just(ClaimStatus::Pending),
        Just(ClaimStatus::Verified),
        Just(ClaimStatus::Approved),
        Just(ClaimStatus::Rejected),
    ]
}

/// Valid unsaved claims
pub fn new_claim_strategy() -> impl Strategy<Value = NewClaim> {
    (
        lecturer_id_strategy(),
        hours_strategy(),
        rate_strategy(),
        claim_month_strategy(),
    )
        .prop_map(|(lecturer, hours, rate, month)| {
            NewClaimBuilder::new()
                .for_lecturer(lecturer.as_str())
                .hours(hours)
                .rate(rate)
                .month(month)
                .build()
        })
}

/// Stored claims in mixed statuses with ids `1..=n`
pub fn claim_set_strategy(max: usize) -> impl Strategy<Value = Vec<domain_claims::Claim>> {
    prop::collection::vec((new_claim_strategy(), status_strategy()), 0..=max).prop_map(|drafts| {
        drafts
            .into_iter()
            .enumerate()
            .map(|(i, (draft, status))| {
                let builder = ClaimBuilder::new(i as u64 + 1).with(|b| {
                    b.for_lecturer(draft.lecturer_id.as_str())
                        .hours(draft.hours_worked)
                        .rate(draft.hourly_rate)
                        .month(draft.claim_month)
                });
                match status {
                    ClaimStatus::Pending => builder,
                    ClaimStatus::Verified => builder.verified(),
                    ClaimStatus::Approved => builder.approved(),
                    ClaimStatus::Rejected => builder.rejected(),
                }
                .build()
            })
            .collect()
    })
}

/// Strategy for generating valid email addresses
pub fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{5,10}", "[a-z]{3,8}")
        .prop_map(|(local, domain)| format!("{}@{}.ac.za", local, domain))
}
