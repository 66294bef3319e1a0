//! Infrastructure Layer
//!
//! Durable adapters for the claims domain ports:
//!
//! - [`PostgresClaimStore`] and [`PostgresLecturerDirectory`] on PostgreSQL
//!   via SQLx
//! - [`FileSystemBlobStore`] for supporting documents on local disk
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresClaimStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresClaimStore::new(pool);
//! ```

pub mod adapters;
pub mod blob;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PostgresClaimStore, PostgresLecturerDirectory};
pub use blob::FileSystemBlobStore;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
