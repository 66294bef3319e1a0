//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! lecturer claims test suite.
//!
//! # Modules
//!
//! - `fixtures`: Callers, rates and months used across tests
//! - `builders`: Builder patterns for claims and lecturers
//! - `doubles`: Notification recorder and fault-injecting claim stores
//! - `database`: PostgreSQL test container management
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod assertions;
pub mod builders;
pub mod database;
pub mod doubles;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use doubles::*;
pub use fixtures::*;
pub use generators::*;
