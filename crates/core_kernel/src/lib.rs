//! Core Kernel - Foundational types for the lecturer claims system
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money types with precise decimal arithmetic
//! - Calendar months for claim periods
//! - Strongly-typed identifiers
//! - Port error and health-check abstractions for adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{CalendarMonth, TemporalError};
pub use identifiers::{ClaimId, LecturerId};
pub use ports::{PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable};
pub use error::CoreError;
