//! Custom Test Assertions
//!
//! Assertion helpers for claims types with more useful failure messages
//! than plain `assert_eq!`.

use core_kernel::Money;
use domain_claims::{Claim, ClaimStatus, InvoiceReport};

/// Asserts a claim's status, printing its history on failure
pub fn assert_status(claim: &Claim, expected: ClaimStatus) {
    assert_eq!(
        claim.status, expected,
        "{} is {} but expected {}; history: {:?}",
        claim.id, claim.status, expected, claim.history
    );
}

/// Asserts that the history is a connected chain ending in the current status
///
/// The first entry must be the submission (`None -> Pending`) and every
/// later entry must start where the previous one ended.
pub fn assert_history_consistent(claim: &Claim) {
    let first = claim
        .history
        .first()
        .unwrap_or_else(|| panic!("{} has no history", claim.id));
    assert_eq!(first.from, None, "{} history does not start with submission", claim.id);
    assert_eq!(first.to, ClaimStatus::Pending);

    for pair in claim.history.windows(2) {
        assert_eq!(
            pair[1].from,
            Some(pair[0].to),
            "{} history breaks between {:?} and {:?}",
            claim.id,
            pair[0],
            pair[1]
        );
        assert!(pair[1].at >= pair[0].at, "{} history goes back in time", claim.id);
    }

    let last = claim.history.last().map(|c| c.to);
    assert_eq!(last, Some(claim.status), "{} history does not end in its status", claim.id);
}

/// Asserts that an invoice adds up
///
/// - the grand total equals the sum of the line totals
/// - the claim count equals the sum of the line counts
/// - no line is empty
pub fn assert_invoice_reconciles(report: &InvoiceReport) {
    let line_sum = Money::sum(report.currency, report.lines.iter().map(|l| &l.total_amount))
        .unwrap_or_else(|e| panic!("invoice lines do not add up: {}", e));
    assert_eq!(
        line_sum, report.total_payment,
        "invoice total {} does not equal the sum of its lines {}",
        report.total_payment, line_sum
    );

    let count: usize = report.lines.iter().map(|l| l.claim_count).sum();
    assert_eq!(count, report.claim_count, "invoice claim count does not match its lines");
    assert!(
        report.lines.iter().all(|l| l.claim_count > 0),
        "invoice contains an empty line"
    );
}

/// Asserts two amounts are equal in value and currency
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Amount mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::ClaimBuilder;

    #[test]
    fn test_built_claims_have_consistent_history() {
        assert_history_consistent(&ClaimBuilder::new(1).approved_after_verification().build());
        assert_history_consistent(&ClaimBuilder::new(2).rejected().build());
    }

    #[test]
    #[should_panic(expected = "history does not end in its status")]
    fn test_detects_status_drift() {
        let mut claim = ClaimBuilder::new(1).verified().build();
        claim.status = ClaimStatus::Approved;
        assert_history_consistent(&claim);
    }
}
