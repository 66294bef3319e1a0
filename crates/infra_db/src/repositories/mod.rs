//! Repository implementations
//!
//! Repositories encapsulate the SQL for one aggregate and return plain row
//! structs. Queries are built at runtime with `sqlx::query_as`, so the crate
//! compiles without a live database.

pub mod claims;
pub mod lecturers;

pub use claims::ClaimsRepository;
pub use lecturers::LecturersRepository;
