//! Pre-built Test Fixtures
//!
//! Ready-to-use callers, amounts and periods. Values are fixed so tests stay
//! predictable.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{CalendarMonth, Currency, LecturerId, Money};
use domain_claims::{Caller, Role};
use rust_decimal_macros::dec;

/// Fixture for workflow callers
pub struct CallerFixtures;

impl CallerFixtures {
    /// A lecturer whose identity is their lecturer id
    pub fn lecturer(id: &str) -> Caller {
        Caller::new(id, Role::Lecturer)
    }

    pub fn coordinator() -> Caller {
        Caller::new("pc.naidoo", Role::Coordinator)
    }

    pub fn manager() -> Caller {
        Caller::new("am.vanwyk", Role::Manager)
    }

    pub fn hr() -> Caller {
        Caller::new("hr.dlamini", Role::Hr)
    }

    /// Every role, one caller each
    pub fn all() -> Vec<Caller> {
        vec![
            Self::lecturer("L1"),
            Self::coordinator(),
            Self::manager(),
            Self::hr(),
        ]
    }
}

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard hourly rate
    pub fn zar_rate() -> Money {
        Money::new(dec!(250.00), Currency::ZAR)
    }

    /// Rate for senior lecturers
    pub fn zar_senior_rate() -> Money {
        Money::new(dec!(450.00), Currency::ZAR)
    }

    pub fn zar_zero() -> Money {
        Money::zero(Currency::ZAR)
    }

    /// A foreign amount for currency mismatch tests
    pub fn usd_rate() -> Money {
        Money::new(dec!(25.00), Currency::USD)
    }
}

/// Fixture for claim periods and instants
pub struct TemporalFixtures;

impl TemporalFixtures {
    pub fn march_2024() -> CalendarMonth {
        CalendarMonth::new(2024, 3).expect("valid month")
    }

    pub fn april_2024() -> CalendarMonth {
        CalendarMonth::new(2024, 4).expect("valid month")
    }

    /// Fixed submission instant (1 April 2024, 09:00 UTC)
    pub fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
    }

    /// Fixed review instant, two days after submission
    pub fn reviewed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 3, 14, 30, 0).unwrap()
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn lecturer_id(id: &str) -> LecturerId {
        LecturerId::new(id).expect("valid lecturer id")
    }

    /// Ids `L1..=Ln`
    pub fn lecturer_ids(n: usize) -> Vec<LecturerId> {
        (1..=n).map(|i| Self::lecturer_id(&format!("L{}", i))).collect()
    }
}
