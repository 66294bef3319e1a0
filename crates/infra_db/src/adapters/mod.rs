//! Domain Adapters
//!
//! PostgreSQL implementations of the claims domain ports. Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimStore;
//! use domain_claims::ClaimStore;
//!
//! let store = PostgresClaimStore::new(pool);
//! let pending = store.list(ClaimQuery::by_status(ClaimStatus::Pending)).await?;
//! ```

pub mod claims;
pub mod lecturers;

pub use claims::PostgresClaimStore;
pub use lecturers::PostgresLecturerDirectory;
