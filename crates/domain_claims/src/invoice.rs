//! Invoice aggregation
//!
//! Approved claims are grouped by lecturer and calendar month into
//! [`InvoiceLine`]s. The report is derived on demand and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

use core_kernel::{Currency, LecturerId, Money};

use crate::claim::{Claim, ClaimStatus};
use crate::error::ClaimError;
use crate::store::{ClaimQuery, ClaimStore};

/// Payable total for one lecturer in one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub lecturer_id: LecturerId,
    pub month: u32,
    pub year: i32,
    pub total_amount: Money,
    pub claim_count: usize,
}

impl InvoiceLine {
    /// Period as shown on the printed invoice, e.g. `3/2024`
    pub fn period_label(&self) -> String {
        format!("{}/{}", self.month, self.year)
    }
}

/// Invoice report over every approved claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceReport {
    /// Ordered by lecturer, then month, then year
    pub lines: Vec<InvoiceLine>,
    pub total_payment: Money,
    pub claim_count: usize,
    pub currency: Currency,
    pub generated_at: DateTime<Utc>,
}

impl InvoiceReport {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

type LineKey = (LecturerId, u32, i32);

/// Groups approved claims into invoice lines
///
/// Claims that are not `Approved` are ignored. Fails with `Internal` if the
/// line totals do not reconcile with the raw claim amounts or if a claim is
/// held in a currency other than `currency`.
pub fn aggregate(
    claims: &[Claim],
    currency: Currency,
    generated_at: DateTime<Utc>,
) -> Result<InvoiceReport, ClaimError> {
    let approved: Vec<&Claim> = claims
        .iter()
        .filter(|c| c.status == ClaimStatus::Approved)
        .collect();

    let mut groups: BTreeMap<LineKey, (Money, usize)> = BTreeMap::new();
    for claim in &approved {
        let key = (
            claim.lecturer_id.clone(),
            claim.claim_month.month(),
            claim.claim_month.year(),
        );
        let entry = groups.entry(key).or_insert((Money::zero(currency), 0));
        entry.0 = entry.0.checked_add(&claim.amount).map_err(|e| {
            error!(claim_id = %claim.id, error = %e, "Claim amount cannot be invoiced");
            ClaimError::Internal(format!("{}: {}", claim.id, e))
        })?;
        entry.1 += 1;
    }

    let lines: Vec<InvoiceLine> = groups
        .into_iter()
        .map(|((lecturer_id, month, year), (total_amount, claim_count))| InvoiceLine {
            lecturer_id,
            month,
            year,
            total_amount,
            claim_count,
        })
        .collect();

    let total_payment = Money::sum(currency, lines.iter().map(|l| &l.total_amount))
        .map_err(|e| ClaimError::Internal(e.to_string()))?;
    let raw_total = Money::sum(currency, approved.iter().map(|c| &c.amount))
        .map_err(|e| ClaimError::Internal(e.to_string()))?;

    if total_payment != raw_total {
        error!(
            line_total = %total_payment,
            claim_total = %raw_total,
            "Invoice totals do not reconcile"
        );
        return Err(ClaimError::Internal(format!(
            "invoice total {} does not match approved claims total {}",
            total_payment, raw_total
        )));
    }

    Ok(InvoiceReport {
        lines,
        total_payment,
        claim_count: approved.len(),
        currency,
        generated_at,
    })
}

/// Builds invoice reports from the claim store
#[derive(Clone)]
pub struct InvoiceAggregator {
    store: Arc<dyn ClaimStore>,
    currency: Currency,
}

impl InvoiceAggregator {
    pub fn new(store: Arc<dyn ClaimStore>, currency: Currency) -> Self {
        Self { store, currency }
    }

    /// Aggregates the approved claims as they are right now
    #[instrument(skip(self))]
    pub async fn generate(&self) -> Result<InvoiceReport, ClaimError> {
        let approved = self
            .store
            .list(ClaimQuery::by_status(ClaimStatus::Approved))
            .await?;
        let report = aggregate(&approved, self.currency, Utc::now())?;
        info!(
            lines = report.lines.len(),
            claims = report.claim_count,
            total = %report.total_payment,
            "Invoice generated"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CalendarMonth, ClaimId};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::claim::NewClaim;
    use crate::role::Role;

    fn approved(id: u64, lecturer: &str, year: i32, month: u32, hours: Decimal) -> Claim {
        let rate = Money::new(dec!(100), Currency::ZAR);
        let mut claim = NewClaim {
            lecturer_id: LecturerId::new(lecturer).unwrap(),
            hours_worked: hours,
            hourly_rate: rate,
            amount: rate.multiply(hours).unwrap(),
            claim_month: CalendarMonth::new(year, month).unwrap(),
            attachments: vec![],
            notes: None,
            submitted_at: Utc::now(),
            submitted_by: lecturer.to_string(),
            submitted_role: Role::Lecturer,
        }
        .into_claim(ClaimId::new(id));
        claim.status = ClaimStatus::Approved;
        claim
    }

    #[test]
    fn test_lines_ordered_by_lecturer_then_month_then_year() {
        let claims = vec![
            approved(1, "L2", 2024, 1, dec!(1)),
            approved(2, "L1", 2025, 2, dec!(1)),
            approved(3, "L1", 2024, 3, dec!(1)),
            approved(4, "L1", 2024, 2, dec!(1)),
        ];
        let report = aggregate(&claims, Currency::ZAR, Utc::now()).unwrap();
        let keys: Vec<(String, u32, i32)> = report
            .lines
            .iter()
            .map(|l| (l.lecturer_id.to_string(), l.month, l.year))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("L1".to_string(), 2, 2024),
                ("L1".to_string(), 2, 2025),
                ("L1".to_string(), 3, 2024),
                ("L2".to_string(), 1, 2024),
            ]
        );
    }

    #[test]
    fn test_non_approved_claims_are_ignored() {
        let mut pending = approved(1, "L1", 2024, 3, dec!(5));
        pending.status = ClaimStatus::Pending;
        let report = aggregate(&[pending], Currency::ZAR, Utc::now()).unwrap();
        assert!(report.is_empty());
        assert!(report.total_payment.is_zero());
    }

    #[test]
    fn test_foreign_currency_claim_is_internal_error() {
        let mut claim = approved(1, "L1", 2024, 3, dec!(1));
        claim.amount = Money::new(dec!(100), Currency::USD);
        let err = aggregate(&[claim], Currency::ZAR, Utc::now()).unwrap_err();
        assert!(matches!(err, ClaimError::Internal(_)));
    }

    #[test]
    fn test_period_label() {
        let report = aggregate(&[approved(1, "L1", 2024, 3, dec!(1))], Currency::ZAR, Utc::now())
            .unwrap();
        assert_eq!(report.lines[0].period_label(), "3/2024");
    }

    proptest! {
        #[test]
        fn prop_report_reconciles(
            entries in prop::collection::vec((0usize..4, 1u32..=12, 1i64..10_000), 0..40)
        ) {
            let lecturers = ["L1", "L2", "L3", "L4"];
            let claims: Vec<Claim> = entries
                .iter()
                .enumerate()
                .map(|(i, (l, month, cents))| {
                    approved(i as u64 + 1, lecturers[*l], 2024, *month, Decimal::new(*cents, 2))
                })
                .collect();

            let report = aggregate(&claims, Currency::ZAR, Utc::now()).unwrap();

            let raw: Decimal = claims.iter().map(|c| c.amount.amount()).sum();
            prop_assert_eq!(report.total_payment.amount(), raw);
            prop_assert_eq!(report.claim_count, claims.len());
            prop_assert_eq!(
                report.lines.iter().map(|l| l.claim_count).sum::<usize>(),
                claims.len()
            );
            for pair in report.lines.windows(2) {
                let a = (&pair[0].lecturer_id, pair[0].month, pair[0].year);
                let b = (&pair[1].lecturer_id, pair[1].month, pair[1].year);
                prop_assert!(a < b);
            }
        }
    }
}
