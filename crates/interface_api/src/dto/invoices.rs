//! Invoice DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use domain_claims::{InvoiceLine, InvoiceReport};

#[derive(Debug, Serialize)]
pub struct InvoiceLineResponse {
    pub lecturer_id: String,
    pub month: u32,
    pub year: i32,
    pub period: String,
    pub total_amount: Decimal,
    pub claim_count: usize,
}

impl From<&InvoiceLine> for InvoiceLineResponse {
    fn from(line: &InvoiceLine) -> Self {
        Self {
            lecturer_id: line.lecturer_id.to_string(),
            month: line.month,
            year: line.year,
            period: line.period_label(),
            total_amount: line.total_amount.amount(),
            claim_count: line.claim_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub lines: Vec<InvoiceLineResponse>,
    pub total_payment: Decimal,
    pub claim_count: usize,
    pub currency: String,
    pub generated_at: DateTime<Utc>,
}

impl From<&InvoiceReport> for InvoiceResponse {
    fn from(report: &InvoiceReport) -> Self {
        Self {
            lines: report.lines.iter().map(InvoiceLineResponse::from).collect(),
            total_payment: report.total_payment.amount(),
            claim_count: report.claim_count,
            currency: report.currency.code().to_string(),
            generated_at: report.generated_at,
        }
    }
}
